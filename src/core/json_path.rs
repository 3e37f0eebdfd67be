use serde_json::Value;
use serde_json_path::JsonPath;

/// Evaluate the candidate `paths` against `value` in order, and return the
/// non-null nodes matched by the first path that matches anything.
///
/// Later paths are fallbacks for differently shaped credentials, e.g.
/// `$.credentialSubject.dob` for a linked data credential and `$.vc.credentialSubject.dob`
/// for a JWT wrapped one. Paths that cannot be parsed are skipped.
pub fn extract<'a, P>(value: &'a Value, paths: &[P]) -> Vec<&'a Value>
where
    P: AsRef<str>,
{
    for path in paths {
        let path = path.as_ref();
        let parsed = match JsonPath::parse(path) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("skipping invalid JSON path {path}: {e}");
                continue;
            }
        };

        let nodes: Vec<&Value> = parsed
            .query(value)
            .all()
            .into_iter()
            .filter(|node| !node.is_null())
            .collect();

        if !nodes.is_empty() {
            return nodes;
        }
        tracing::debug!("nothing found in {path}");
    }

    Vec::new()
}

/// Evaluate a single path that must select exactly one object, e.g. a
/// descriptor map entry locating a credential inside a presentation.
pub fn select_one<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let parsed = JsonPath::parse(path)
        .map_err(|e| tracing::warn!("invalid JSON path {path}: {e}"))
        .ok()?;
    parsed.query(value).exactly_one().ok()
}
