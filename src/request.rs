use crate::catalog::Endpoint;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("missing required argument --{0}")]
    MissingParam(String),
    #[error("unresolved path params: {0}")]
    Unresolved(String),
    #[error("read body file {path}: {source}")]
    BodyFile {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid JSON body: {0}")]
    InvalidBody(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestParts {
    pub path: String,
    pub query: Vec<(String, String)>,
}

/// Fill `:param` placeholders and collect query pairs for `endpoint`.
///
/// `lookup` returns the user-supplied value for a parameter name. Path
/// parameters must all be present; query parameters are optional.
pub fn build_request_parts<'a, F>(endpoint: &Endpoint, lookup: F) -> Result<RequestParts, RequestError>
where
    F: Fn(&str) -> Option<&'a str>,
{
    let mut path = endpoint.path.clone();
    for name in endpoint.path_params() {
        let value = lookup(name).ok_or_else(|| RequestError::MissingParam(name.to_string()))?;
        path = replace_path_param(&path, name, value);
    }

    let query = endpoint
        .query_params()
        .into_iter()
        .filter_map(|name| lookup(name).map(|value| (name.to_string(), value.to_string())))
        .collect();

    if path.split('/').any(|segment| segment.starts_with(':')) {
        return Err(RequestError::Unresolved(path));
    }

    Ok(RequestParts { path, query })
}

/// Replace `:name` segments only, so `:id` never matches inside `:idx`.
pub fn replace_path_param(path: &str, name: &str, value: &str) -> String {
    path.split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(param) if param == name => value,
            _ => segment,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Inline JSON, or `@path` to read it from a file.
pub fn parse_body_arg(value: &str) -> Result<Value, RequestError> {
    let raw = if let Some(path) = value.strip_prefix('@') {
        fs::read_to_string(Path::new(path)).map_err(|source| RequestError::BodyFile {
            path: path.to_string(),
            source,
        })?
    } else {
        value.to_string()
    };

    Ok(serde_json::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::catalog;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn fills_path_placeholders() {
        let catalog = catalog().unwrap();
        let ep = catalog.find_endpoint("cv-management", "approve-cv").unwrap();
        let parts = build_request_parts(ep, |name| (name == "id").then_some("42")).unwrap();
        assert_eq!(parts.path, "/api/cvs/42/approve");
        assert!(parts.query.is_empty());
    }

    #[test]
    fn missing_path_value_is_an_error() {
        let catalog = catalog().unwrap();
        let ep = catalog.find_endpoint("cv-management", "restore-cv").unwrap();
        let err = build_request_parts(ep, |_| None).unwrap_err();
        assert!(matches!(err, RequestError::MissingParam(name) if name == "id"));
    }

    #[test]
    fn collects_documented_query_params_only() {
        let catalog = catalog().unwrap();
        let ep = catalog
            .find_endpoint("CV Management", "Get All CVs with Filtering")
            .unwrap();
        let values: HashMap<&str, &str> =
            HashMap::from([("status", "pending"), ("limit", "10"), ("sort", "asc")]);
        let parts = build_request_parts(ep, |name| values.get(name).copied()).unwrap();
        assert_eq!(parts.path, "/api/cvs/get-all-with-filtering");
        assert_eq!(
            parts.query,
            vec![
                ("status".to_string(), "pending".to_string()),
                ("limit".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn replace_matches_whole_segments() {
        assert_eq!(replace_path_param("/api/x/:id/:idx", "id", "7"), "/api/x/7/:idx");
    }

    #[test]
    fn body_from_inline_json() {
        let body = parse_body_arg(r#"{"reason": "incomplete"}"#).unwrap();
        assert_eq!(body["reason"], "incomplete");
        assert!(matches!(parse_body_arg("{nope"), Err(RequestError::InvalidBody(_))));
    }

    #[test]
    fn body_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"schemeId": "s-1"}}"#).unwrap();
        let arg = format!("@{}", file.path().display());
        let body = parse_body_arg(&arg).unwrap();
        assert_eq!(body["schemeId"], "s-1");

        let err = parse_body_arg("@/nonexistent/body.json").unwrap_err();
        assert!(matches!(err, RequestError::BodyFile { .. }));
    }
}
