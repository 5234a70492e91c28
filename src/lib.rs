//! API reference catalog for the Internship Management System.
//!
//! The catalog describes every documented IMS endpoint, grouped by feature
//! area. [`catalog()`] hands out the shared instance; [`export`] renders it
//! for documentation pages.

pub mod catalog;
pub mod cli;
pub mod export;
pub mod http;
pub mod request;

pub use catalog::{
    ApiCatalog, Category, CatalogError, Details, Endpoint, HttpMethod, Section, catalog, load_catalog,
    parse_catalog, slugify,
};
pub use export::{ExportError, ExportTarget, parse_export, render, to_export_value};
