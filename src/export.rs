//! Publishing the catalog to documentation pages.
//!
//! Pages consume the catalog as a category-keyed object, either through a
//! CommonJS `module.exports` assignment or through a `window` global. Both
//! adapters wrap the same value, and `parse_export` reads either one back.

use crate::catalog::{Category, CatalogError, Endpoint, validate_categories};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;
use thiserror::Error;

const MODULE_BINDING: &str = "module.exports";
const GLOBAL_SCOPE: &str = "window.";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unknown export format `{0}` (expected module, global or json)")]
    UnknownTarget(String),
    #[error("exported value is not a category map")]
    NotAnObject,
    #[error("malformed global assignment")]
    MalformedAssignment,
    #[error("invalid exported JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTarget {
    /// `module.exports = {...};`
    Module,
    /// `window.<global_name> = {...};`
    Global,
    /// The bare object.
    Json,
}

impl ExportTarget {
    pub const NAMES: [&'static str; 3] = ["module", "global", "json"];
}

impl FromStr for ExportTarget {
    type Err = ExportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "module" => Ok(ExportTarget::Module),
            "global" => Ok(ExportTarget::Global),
            "json" => Ok(ExportTarget::Json),
            other => Err(ExportError::UnknownTarget(other.to_string())),
        }
    }
}

#[derive(Serialize)]
struct CategoryRef<'a> {
    description: &'a str,
    endpoints: &'a [Endpoint],
}

#[derive(Deserialize)]
struct CategoryEntry {
    description: String,
    endpoints: Vec<Endpoint>,
}

/// The category-keyed object handed to documentation pages.
pub fn to_export_value(categories: &[Category]) -> Result<Value, ExportError> {
    let mut map = Map::new();
    for category in categories {
        let entry = CategoryRef {
            description: &category.description,
            endpoints: &category.endpoints,
        };
        map.insert(category.name.clone(), serde_json::to_value(entry)?);
    }
    Ok(Value::Object(map))
}

pub fn render(
    categories: &[Category],
    global_name: &str,
    target: ExportTarget,
    pretty: bool,
) -> Result<String, ExportError> {
    let value = to_export_value(categories)?;
    let body = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    Ok(match target {
        ExportTarget::Module => module_export(&body),
        ExportTarget::Global => global_export(global_name, &body),
        ExportTarget::Json => body,
    })
}

pub fn module_export(body: &str) -> String {
    format!("{MODULE_BINDING} = {body};")
}

pub fn global_export(global_name: &str, body: &str) -> String {
    format!("{GLOBAL_SCOPE}{global_name} = {body};")
}

/// Rebuild categories from any of the three export forms.
pub fn parse_export(text: &str) -> Result<Vec<Category>, ExportError> {
    let body = strip_assignment(text)?;
    let value: Value = serde_json::from_str(body)?;
    from_export_value(value)
}

pub fn from_export_value(value: Value) -> Result<Vec<Category>, ExportError> {
    let Value::Object(map) = value else {
        return Err(ExportError::NotAnObject);
    };
    let mut categories = Vec::with_capacity(map.len());
    for (name, entry) in map {
        let entry: CategoryEntry = serde_json::from_value(entry)?;
        categories.push(Category {
            name,
            description: entry.description,
            endpoints: entry.endpoints,
        });
    }
    validate_categories(&categories)?;
    Ok(categories)
}

fn strip_assignment(text: &str) -> Result<&str, ExportError> {
    let trimmed = text.trim();
    let trimmed = trimmed.strip_suffix(';').unwrap_or(trimmed).trim_end();
    if trimmed.starts_with('{') {
        return Ok(trimmed);
    }
    match trimmed.split_once('=') {
        Some((lhs, rhs)) if is_export_binding(lhs.trim()) => Ok(rhs.trim_start()),
        _ => Err(ExportError::MalformedAssignment),
    }
}

fn is_export_binding(lhs: &str) -> bool {
    if lhs == MODULE_BINDING {
        return true;
    }
    lhs.strip_prefix(GLOBAL_SCOPE).is_some_and(|name| {
        !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
    })
}
