use std::borrow::Cow;
use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The value of this keyword MUST be one of the six primitive types
/// ("null", "boolean", "object", "array", "number", or "string"), or "integer"
/// which matches any number with a zero fractional part.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

/// A range bound. Numeric bounds may be written as JSON numbers or strings,
/// date bounds are always strings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Bound {
    Number(f64),
    Text(String),
}

impl From<f64> for Bound {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for Bound {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// The value or the filter itself cannot be interpreted.
    #[error("{0}")]
    Format(String),
    /// The value was understood and rejected by the filter.
    #[error("{0}")]
    Unsatisfied(String),
}

/// Operand of a range comparison, produced once per operand from the filter format.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparable {
    Number(f64),
    Date(DateTime<FixedOffset>),
}

impl Comparable {
    /// Coerce a credential value according to the filter `format`.
    pub fn from_value(value: &Value, format: Option<&str>) -> Result<Self, FilterError> {
        match value {
            Value::String(s) => Self::from_text(s, format),
            Value::Number(n) if !is_date_format(format) => n
                .as_f64()
                .map(Self::Number)
                .ok_or_else(|| FilterError::Format(format!("{n} is not a comparable number"))),
            other => Err(FilterError::Format(format!(
                "{other} cannot be compared as {}",
                format.unwrap_or("number")
            ))),
        }
    }

    pub fn from_bound(bound: &Bound, format: Option<&str>) -> Result<Self, FilterError> {
        match bound {
            Bound::Text(s) => Self::from_text(s, format),
            Bound::Number(n) if !is_date_format(format) => Ok(Self::Number(*n)),
            Bound::Number(n) => Err(FilterError::Format(format!("{n} is not a date"))),
        }
    }

    fn from_text(s: &str, format: Option<&str>) -> Result<Self, FilterError> {
        if is_date_format(format) {
            return parse_date(s).map(Self::Date);
        }
        s.trim()
            .parse::<f64>()
            .map(Self::Number)
            .map_err(|_| FilterError::Format(format!("{s} is not a number")))
    }

    fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

fn is_date_format(format: Option<&str>) -> bool {
    matches!(format, Some("date") | Some("date-time"))
}

/// RFC 3339 timestamps, or calendar dates taken at midnight UTC.
fn parse_date(s: &str) -> Result<DateTime<FixedOffset>, FilterError> {
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Ok(date);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc().fixed_offset())
        .ok_or_else(|| FilterError::Format(format!("{s} is not a date")))
}

/// String form of scalars, as used by `pattern` and the length keywords.
fn scalar_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s)),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        _ => None,
    }
}

/// A Filter is a JSON Schema descriptor used to evaluate the value returned from
/// the JsonPath expressions of a constraints field.
///
/// Every keyword present must hold for the value to pass.
///
/// For more information, see the field constraints filter property:
///
/// - [https://identity.foundation/presentation-exchange/spec/v2.0.0/#input-descriptor-object](https://identity.foundation/presentation-exchange/spec/v2.0.0/#input-descriptor-object)
///
/// - [https://json-schema.org/understanding-json-schema](https://json-schema.org/understanding-json-schema)
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Filter {
    #[serde(rename = "type")]
    filter_type: FilterType,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    minimum: Option<Bound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    maximum: Option<Bound>,
    #[serde(rename = "exclusiveMinimum", skip_serializing_if = "Option::is_none")]
    exclusive_minimum: Option<Bound>,
    #[serde(rename = "exclusiveMaximum", skip_serializing_if = "Option::is_none")]
    exclusive_maximum: Option<Bound>,
    #[serde(rename = "minLength", skip_serializing_if = "Option::is_none")]
    min_length: Option<usize>,
    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    max_length: Option<usize>,
    #[serde(rename = "const", skip_serializing_if = "Option::is_none")]
    r#const: Option<Value>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    r#enum: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    not: Option<Box<Filter>>,
}

impl Filter {
    /// Creates a new filter with the given type.
    pub fn new(filter_type: FilterType) -> Self {
        Self {
            filter_type,
            format: None,
            pattern: None,
            minimum: None,
            maximum: None,
            exclusive_minimum: None,
            exclusive_maximum: None,
            min_length: None,
            max_length: None,
            r#const: None,
            r#enum: None,
            not: None,
        }
    }

    pub fn filter_type(&self) -> &FilterType {
        &self.filter_type
    }

    /// Semantic format of the value. `date` and `date-time` switch range
    /// comparisons to chronological order, `string` requires a string value.
    pub fn set_format(mut self, format: String) -> Self {
        self.format = Some(format);
        self
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    /// A regular expression searched for (unanchored) in the value.
    pub fn set_pattern(mut self, pattern: String) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    pub fn set_minimum(mut self, bound: impl Into<Bound>) -> Self {
        self.minimum = Some(bound.into());
        self
    }

    pub fn set_maximum(mut self, bound: impl Into<Bound>) -> Self {
        self.maximum = Some(bound.into());
        self
    }

    pub fn set_exclusive_minimum(mut self, bound: impl Into<Bound>) -> Self {
        self.exclusive_minimum = Some(bound.into());
        self
    }

    pub fn set_exclusive_maximum(mut self, bound: impl Into<Bound>) -> Self {
        self.exclusive_maximum = Some(bound.into());
        self
    }

    pub fn set_min_length(mut self, min_length: usize) -> Self {
        self.min_length = Some(min_length);
        self
    }

    pub fn set_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn set_const(mut self, value: Value) -> Self {
        self.r#const = Some(value);
        self
    }

    pub fn set_enum(mut self, values: Vec<Value>) -> Self {
        self.r#enum = Some(values);
        self
    }

    /// Negate `filter`: the value passes only if `filter` rejects it.
    pub fn set_not(mut self, filter: Filter) -> Self {
        self.not = Some(Box::new(filter));
        self
    }

    /// Evaluate the filter against one value extracted from a credential.
    pub fn evaluate(&self, value: &Value) -> Result<(), FilterError> {
        if self.format() == Some("string") && !value.is_string() {
            return Err(FilterError::Format(format!("{value} is not a string")));
        }

        let text = scalar_text(value);

        if let Some(pattern) = self.pattern.as_ref() {
            let regex = Regex::new(pattern)
                .map_err(|e| FilterError::Format(format!("invalid pattern {pattern}: {e}")))?;
            match text.as_deref() {
                Some(text) if regex.is_match(text) => {}
                _ => {
                    return Err(FilterError::Unsatisfied(format!(
                        "{value} does not match pattern {pattern}"
                    )))
                }
            }
        }

        if let Some(values) = self.r#enum.as_ref() {
            if !values.iter().any(|candidate| same_value(candidate, value)) {
                return Err(FilterError::Unsatisfied(format!(
                    "{value} is not one of the enumerated values"
                )));
            }
        }

        if let Some(expected) = self.r#const.as_ref() {
            if !same_value(value, expected) {
                return Err(FilterError::Unsatisfied(format!(
                    "{value} does not match const {expected}"
                )));
            }
        }

        if self.min_length.is_some() || self.max_length.is_some() {
            let length = text.as_deref().map(|t| t.chars().count()).ok_or_else(|| {
                FilterError::Unsatisfied(format!("{value} has no string length"))
            })?;

            if let Some(min_length) = self.min_length {
                if length < min_length {
                    return Err(FilterError::Unsatisfied(format!(
                        "length {length} is less than minimum {min_length}"
                    )));
                }
            }

            if let Some(max_length) = self.max_length {
                if length > max_length {
                    return Err(FilterError::Unsatisfied(format!(
                        "length {length} is greater than maximum {max_length}"
                    )));
                }
            }
        }

        if let Some(not) = self.not.as_ref() {
            if not.evaluate(value).is_ok() {
                return Err(FilterError::Unsatisfied(format!(
                    "{value} satisfies a negated filter"
                )));
            }
        }

        self.evaluate_ranges(value)
    }

    fn evaluate_ranges(&self, value: &Value) -> Result<(), FilterError> {
        let ranges = [
            (&self.maximum, "maximum"),
            (&self.minimum, "minimum"),
            (&self.exclusive_maximum, "exclusiveMaximum"),
            (&self.exclusive_minimum, "exclusiveMinimum"),
        ];

        if ranges.iter().all(|(bound, _)| bound.is_none()) {
            return Ok(());
        }

        let format = self.format();
        let operand = Comparable::from_value(value, format)?;

        for (bound, keyword) in ranges {
            let Some(bound) = bound else {
                continue;
            };
            let bound = Comparable::from_bound(bound, format)?;
            let ordering = operand.compare(&bound).ok_or_else(|| {
                FilterError::Format(format!("{value} cannot be compared with {keyword}"))
            })?;

            let holds = match keyword {
                "maximum" => ordering != Ordering::Greater,
                "minimum" => ordering != Ordering::Less,
                "exclusiveMaximum" => ordering == Ordering::Less,
                _ => ordering == Ordering::Greater,
            };

            if !holds {
                return Err(FilterError::Unsatisfied(format!(
                    "{value} is out of the {keyword} bound"
                )));
            }
        }

        Ok(())
    }
}

/// JSON equality, except that numbers compare by value: `18` equals `18.0`.
fn same_value(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn string_filter() -> Filter {
        Filter::new(FilterType::String)
    }

    #[test]
    fn deserializes_camel_case_keywords() {
        let filter: Filter = serde_json::from_value(json!({
            "type": "string",
            "minLength": 10,
            "maxLength": 12,
            "exclusiveMinimum": "5",
            "not": { "type": "string", "const": "0000000000" }
        }))
        .unwrap();

        assert_eq!(filter.min_length, Some(10));
        assert_eq!(filter.exclusive_minimum, Some(Bound::Text("5".into())));
        assert!(filter.not.is_some());
    }

    #[test]
    fn pattern_is_searched_in_scalars() {
        let issuer = string_filter().set_pattern("did:example:123|did:example:456".into());
        assert!(issuer.evaluate(&json!("did:example:123")).is_ok());
        assert!(matches!(
            issuer.evaluate(&json!("did:example:789")),
            Err(FilterError::Unsatisfied(_))
        ));

        let active = Filter::new(FilterType::Boolean).set_pattern("true".into());
        assert!(active.evaluate(&json!(true)).is_ok());
        assert!(active.evaluate(&json!(false)).is_err());

        let route = string_filter().set_pattern("^DE|^US|^JP".into());
        assert!(route.evaluate(&json!("DE-9876543210")).is_ok());
        assert!(route.evaluate(&json!("FR-9876543210")).is_err());
    }

    #[test]
    fn invalid_pattern_is_a_format_error() {
        let filter = string_filter().set_pattern("(unclosed".into());
        assert!(matches!(
            filter.evaluate(&json!("x")),
            Err(FilterError::Format(_))
        ));
    }

    #[test]
    fn string_format_requires_a_string() {
        let filter = string_filter().set_format("string".into());
        assert!(matches!(
            filter.evaluate(&json!(12)),
            Err(FilterError::Format(_))
        ));
        assert!(filter.evaluate(&json!("12")).is_ok());
    }

    #[test]
    fn enum_and_const() {
        let filter = string_filter().set_enum(vec![json!("DE"), json!("US")]);
        assert!(filter.evaluate(&json!("US")).is_ok());
        assert!(filter.evaluate(&json!("JP")).is_err());

        let filter = Filter::new(FilterType::Number).set_const(json!(3));
        assert!(filter.evaluate(&json!(3)).is_ok());
        assert!(filter.evaluate(&json!("3")).is_err());
    }

    #[test]
    fn numbers_compare_by_value() {
        let filter = Filter::new(FilterType::Number).set_const(json!(18));
        assert!(filter.evaluate(&json!(18.0)).is_ok());
        assert!(filter.evaluate(&json!(18.5)).is_err());

        let filter = Filter::new(FilterType::Number).set_enum(vec![json!(18.0), json!(21)]);
        assert!(filter.evaluate(&json!(18)).is_ok());
        assert!(filter.evaluate(&json!(21.0)).is_ok());
        assert!(filter.evaluate(&json!(20)).is_err());
    }

    #[test]
    fn length_bounds() {
        let filter = string_filter().set_min_length(10).set_max_length(12);
        assert!(filter.evaluate(&json!("1234567890")).is_ok());
        assert!(filter.evaluate(&json!("123456789")).is_err());
        assert!(filter.evaluate(&json!("1234567890123")).is_err());
        assert!(filter.evaluate(&json!({ "id": "1234567890" })).is_err());
    }

    #[test]
    fn not_inverts_inner_result() {
        let filter = string_filter().set_not(string_filter().set_const(json!("revoked")));
        assert!(filter.evaluate(&json!("active")).is_ok());
        assert!(filter.evaluate(&json!("revoked")).is_err());
    }

    #[test]
    fn numeric_ranges_coerce_strings() {
        let filter = Filter::new(FilterType::Number)
            .set_minimum(18.0)
            .set_maximum("65");
        assert!(filter.evaluate(&json!(18)).is_ok());
        assert!(filter.evaluate(&json!("65")).is_ok());
        assert!(filter.evaluate(&json!(17.5)).is_err());
        assert!(filter.evaluate(&json!(66)).is_err());
        assert!(matches!(
            filter.evaluate(&json!("eighteen")),
            Err(FilterError::Format(_))
        ));
    }

    #[test]
    fn exclusive_ranges_reject_the_bound() {
        let filter = Filter::new(FilterType::Number)
            .set_exclusive_minimum(0.0)
            .set_exclusive_maximum(10.0);
        assert!(filter.evaluate(&json!(5)).is_ok());
        assert!(filter.evaluate(&json!(0)).is_err());
        assert!(filter.evaluate(&json!(10)).is_err());
    }

    #[test]
    fn date_ranges_compare_chronologically() {
        let filter = string_filter()
            .set_format("date".into())
            .set_maximum("1999-05-16");
        assert!(matches!(
            filter.evaluate(&json!("1999-05-17")),
            Err(FilterError::Unsatisfied(_))
        ));
        assert!(filter.evaluate(&json!("1999-05-16")).is_ok());
        assert!(filter.evaluate(&json!("1980-07-13T00:00:00Z")).is_ok());

        let filter = string_filter()
            .set_format("date".into())
            .set_minimum("1999-5-16");
        assert!(filter.evaluate(&json!("2001-01-01")).is_ok());
        assert!(filter.evaluate(&json!("1999-05-15T23:59:59Z")).is_err());
        assert!(matches!(
            filter.evaluate(&json!("07/13/80")),
            Err(FilterError::Format(_))
        ));
    }

    #[test]
    fn tightening_a_bound_never_turns_fail_into_pass() {
        let value = json!("12345678901");
        let mut passed = true;
        for min_length in 8..14 {
            let ok = string_filter()
                .set_min_length(min_length)
                .evaluate(&value)
                .is_ok();
            assert!(passed || !ok);
            passed = ok;
        }
        assert!(!passed);
    }
}
