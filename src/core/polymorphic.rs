use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A member that may arrive as one object, a list of objects, or a bare string
/// referencing the object elsewhere.
///
/// Proofs, JSON-LD contexts and credential types all come in these shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Polymorphic<T> {
    Single(T),
    Many(Vec<T>),
    Reference(String),
}

impl<T> Polymorphic<T> {
    /// Iterate over the typed entries. A reference yields nothing.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            Self::Single(t) => std::slice::from_ref(t).iter(),
            Self::Many(ts) => ts.iter(),
            Self::Reference(_) => <&[T]>::default().iter(),
        }
    }

    pub fn reference(&self) -> Option<&str> {
        match self {
            Self::Reference(r) => Some(r),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(_) | Self::Reference(_) => false,
            Self::Many(ts) => ts.is_empty(),
        }
    }
}

impl<T> From<T> for Polymorphic<T> {
    fn from(t: T) -> Self {
        Self::Single(t)
    }
}

impl<T> From<Vec<T>> for Polymorphic<T> {
    fn from(ts: Vec<T>) -> Self {
        Self::Many(ts)
    }
}

impl<'a, T> IntoIterator for &'a Polymorphic<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Serialize> Serialize for Polymorphic<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Single(t) => t.serialize(serializer),
            Self::Many(ts) => ts.serialize(serializer),
            Self::Reference(r) => r.serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Polymorphic<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Arrays are dispatched first so a sequence is never read positionally
        // into the fields of `T`.
        let value = Value::deserialize(deserializer)?;
        if let Value::Array(items) = value {
            return items
                .into_iter()
                .map(serde_json::from_value)
                .collect::<Result<Vec<T>, _>>()
                .map(Self::Many)
                .map_err(serde::de::Error::custom);
        }

        match serde_json::from_value::<T>(value.clone()) {
            Ok(t) => Ok(Self::Single(t)),
            Err(e) => match value {
                Value::String(r) => Ok(Self::Reference(r)),
                _ => Err(serde::de::Error::custom(format!(
                    "unrecognized entity, expected an object, an array or a string: {e}"
                ))),
            },
        }
    }
}
