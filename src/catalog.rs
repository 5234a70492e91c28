//! Embedded IMS endpoint catalog.
//!
//! The catalog is shipped as `schemas/api_catalog.json`, parsed on first use
//! and shared for the rest of the process. Nothing mutates it afterwards.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;

/// Field name to free-text annotation, e.g. `"email": "string (required)"`.
pub type FieldDocs = Map<String, Value>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("category name is blank")]
    BlankCategory,
    #[error("category `{0}` has no endpoints")]
    EmptyCategory(String),
    #[error("duplicate category `{0}`")]
    DuplicateCategory(String),
    #[error("{category}: endpoint #{index} has a blank {field}")]
    BlankField {
        category: String,
        index: usize,
        field: &'static str,
    },
    #[error("{category}: path `{path}` does not start with /api/")]
    InvalidPath { category: String, path: String },
    #[error("{category}: endpoint `{slug}` is listed twice")]
    DuplicateEndpoint { category: String, slug: String },
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ApiCatalog {
    pub version: u32,
    pub base_url: String,
    pub global_name: String,
    pub categories: Vec<Category>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Category {
    pub name: String,
    pub description: String,
    pub endpoints: Vec<Endpoint>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Endpoint {
    pub method: HttpMethod,
    pub path: String,
    pub title: String,
    pub description: String,
    pub details: Details,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Documentation fragments attached to an endpoint.
///
/// Only the four well-known sections get their own field. Anything else an
/// author adds is kept in `other`, in the order it was written.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct Details {
    #[serde(rename = "Headers", default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<FieldDocs>,
    #[serde(rename = "Request Body", default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<FieldDocs>,
    #[serde(rename = "Query Parameters", default, skip_serializing_if = "Option::is_none")]
    pub query_parameters: Option<FieldDocs>,
    /// Status code (as written, e.g. `"200"`) to example body.
    #[serde(rename = "Response", default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Details {
    pub fn response(&self, status: u16) -> Option<&Value> {
        self.response.as_ref()?.get(&status.to_string())
    }

    /// Sections in display order. Known sections and object-valued extras
    /// are field maps; any other extra is a single value.
    pub fn sections(&self) -> Vec<(&str, Section<'_>)> {
        let mut out = Vec::new();
        if let Some(headers) = &self.headers {
            out.push(("Headers", Section::Fields(headers)));
        }
        if let Some(body) = &self.request_body {
            out.push(("Request Body", Section::Fields(body)));
        }
        if let Some(query) = &self.query_parameters {
            out.push(("Query Parameters", Section::Fields(query)));
        }
        if let Some(response) = &self.response {
            out.push(("Response", Section::Fields(response)));
        }
        for (name, value) in &self.other {
            let section = match value {
                Value::Object(map) => Section::Fields(map),
                other => Section::Value(other),
            };
            out.push((name.as_str(), section));
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Section<'a> {
    Fields(&'a Map<String, Value>),
    Value(&'a Value),
}

impl ApiCatalog {
    pub fn category(&self, key: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.matches(key))
    }

    pub fn find_endpoint(&self, category: &str, endpoint: &str) -> Option<&Endpoint> {
        self.category(category)?.endpoint(endpoint)
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    pub fn endpoint_count(&self) -> usize {
        self.categories.iter().map(|c| c.endpoints.len()).sum()
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        validate_categories(&self.categories)
    }
}

impl Category {
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }

    /// Accepts the display name or its slug.
    pub fn matches(&self, key: &str) -> bool {
        self.name == key || self.slug() == key
    }

    pub fn endpoint(&self, key: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.matches(key))
    }
}

impl Endpoint {
    pub fn slug(&self) -> String {
        slugify(&self.title)
    }

    /// Accepts the title, its slug, the path, or `METHOD path`.
    ///
    /// Paths are shared between verbs (`GET` and `PUT /api/auth/profile`), so
    /// a bare path resolves to the first endpoint listed for it.
    pub fn matches(&self, key: &str) -> bool {
        if self.title == key || self.path == key || self.slug() == key {
            return true;
        }
        match key.split_once(' ') {
            Some((method, path)) => {
                method.eq_ignore_ascii_case(self.method.as_str()) && path.trim() == self.path
            }
            None => false,
        }
    }

    /// Names of `:param` placeholders in path order.
    pub fn path_params(&self) -> Vec<&str> {
        self.path
            .split('/')
            .filter_map(|segment| segment.strip_prefix(':'))
            .filter(|name| !name.is_empty())
            .collect()
    }

    pub fn query_params(&self) -> Vec<&str> {
        self.details
            .query_parameters
            .as_ref()
            .map(|q| q.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn has_body(&self) -> bool {
        self.details.request_body.is_some()
    }

    pub fn requires_auth(&self) -> bool {
        self.details
            .headers
            .as_ref()
            .is_some_and(|h| h.contains_key("Authorization"))
    }
}

/// Lower-case, dash-separated form of a display name.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

pub fn validate_categories(categories: &[Category]) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for category in categories {
        if category.name.trim().is_empty() {
            return Err(CatalogError::BlankCategory);
        }
        if !seen.insert(category.slug()) {
            return Err(CatalogError::DuplicateCategory(category.name.clone()));
        }
        if category.endpoints.is_empty() {
            return Err(CatalogError::EmptyCategory(category.name.clone()));
        }

        let mut slugs = HashSet::new();
        for (index, endpoint) in category.endpoints.iter().enumerate() {
            for (field, value) in [
                ("path", &endpoint.path),
                ("title", &endpoint.title),
                ("description", &endpoint.description),
            ] {
                if value.trim().is_empty() {
                    return Err(CatalogError::BlankField {
                        category: category.name.clone(),
                        index,
                        field,
                    });
                }
            }
            if !endpoint.path.starts_with("/api/") {
                return Err(CatalogError::InvalidPath {
                    category: category.name.clone(),
                    path: endpoint.path.clone(),
                });
            }
            let slug = endpoint.slug();
            if !slugs.insert(slug.clone()) {
                return Err(CatalogError::DuplicateEndpoint {
                    category: category.name.clone(),
                    slug,
                });
            }
        }
    }
    Ok(())
}

pub fn parse_catalog(raw: &str) -> Result<ApiCatalog, CatalogError> {
    let catalog: ApiCatalog = serde_json::from_str(raw)?;
    catalog.validate()?;
    Ok(catalog)
}

pub fn load_catalog() -> Result<ApiCatalog, CatalogError> {
    let raw = include_str!("../schemas/api_catalog.json");
    let catalog = parse_catalog(raw)?;
    debug!(
        categories = catalog.categories.len(),
        endpoints = catalog.endpoint_count(),
        "loaded api catalog"
    );
    Ok(catalog)
}

static CATALOG: OnceLock<ApiCatalog> = OnceLock::new();

/// Process-wide catalog, built on first call.
pub fn catalog() -> Result<&'static ApiCatalog, CatalogError> {
    if let Some(catalog) = CATALOG.get() {
        return Ok(catalog);
    }
    let loaded = load_catalog()?;
    Ok(CATALOG.get_or_init(|| loaded))
}
