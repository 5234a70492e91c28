//! Command tree and output rendering for the `ims-api` binary.
//!
//! Subcommands are generated from the catalog: one per category, one per
//! endpoint below it. Rendering returns strings so `main` owns stdout.

use crate::catalog::{ApiCatalog, Endpoint, Section};
use crate::export::{self, ExportTarget};
use anyhow::{Result, anyhow};
use clap::{Arg, ArgAction, ArgMatches, Command};
use serde_json::{Value, json};

pub const BASE_URL_ENV: &str = "IMS_API_URL";
pub const TOKEN_ENV: &str = "IMS_API_TOKEN";
pub const LOG_ENV: &str = "IMS_API_LOG";

fn json_flag() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Emit machine-readable JSON")
}

pub fn build_cli(catalog: &ApiCatalog) -> Command {
    let mut cmd = Command::new("ims-api")
        .about("Internship Management System API reference")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("pretty")
                .long("pretty")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Pretty-print JSON output"),
        )
        .arg(
            Arg::new("raw")
                .long("raw")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Include status and headers"),
        )
        .arg(
            Arg::new("base_url")
                .long("base-url")
                .global(true)
                .value_name("URL")
                .help("Override base API URL (IMS_API_URL)"),
        )
        .arg(
            Arg::new("token")
                .long("token")
                .global(true)
                .value_name("JWT")
                .help("Bearer token (IMS_API_TOKEN)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log debug output to stderr"),
        );

    cmd = cmd.subcommand(
        Command::new("list")
            .about("List categories and endpoints")
            .arg(json_flag()),
    );

    cmd = cmd.subcommand(
        Command::new("describe")
            .about("Describe a single endpoint")
            .arg(Arg::new("category").required(true).help("Category name or slug"))
            .arg(
                Arg::new("endpoint")
                    .required(true)
                    .help("Endpoint title, slug, path or \"METHOD path\""),
            )
            .arg(json_flag()),
    );

    cmd = cmd.subcommand(
        Command::new("tree")
            .about("Show the full catalog")
            .arg(json_flag()),
    );

    cmd = cmd.subcommand(
        Command::new("export")
            .about("Render the catalog for documentation pages")
            .arg(
                Arg::new("format")
                    .long("format")
                    .value_name("FORMAT")
                    .value_parser(ExportTarget::NAMES)
                    .default_value("module")
                    .help("module, global or json"),
            ),
    );

    for category in &catalog.categories {
        let mut res_cmd = Command::new(category.slug())
            .about(category.description.clone())
            .subcommand_required(true)
            .arg_required_else_help(true);

        for endpoint in &category.endpoints {
            res_cmd = res_cmd.subcommand(build_endpoint_command(endpoint));
        }
        cmd = cmd.subcommand(res_cmd);
    }

    cmd
}

fn build_endpoint_command(endpoint: &Endpoint) -> Command {
    let mut op_cmd = Command::new(endpoint.slug())
        .about(format!("{} {}", endpoint.method, endpoint.path));
    for name in endpoint.path_params() {
        op_cmd = op_cmd.arg(
            Arg::new(name.to_string())
                .long(name.to_string())
                .value_name("VALUE")
                .required(true),
        );
    }
    for name in endpoint.query_params() {
        op_cmd = op_cmd.arg(
            Arg::new(name.to_string())
                .long(name.to_string())
                .value_name("VALUE")
                .help("Query parameter"),
        );
    }
    if endpoint.has_body() {
        op_cmd = op_cmd.arg(
            Arg::new("body")
                .long("body")
                .value_name("JSON")
                .help("Request body JSON (or @file.json)"),
        );
    }
    op_cmd
}

/// Base URL and token for a live call: flag, then environment, then the
/// catalog default. There is no default token.
pub fn resolve_config<F>(
    matches: &ArgMatches,
    env_lookup: F,
    default_base_url: &str,
) -> (String, Option<String>)
where
    F: Fn(&str) -> Option<String>,
{
    let base_url = matches
        .get_one::<String>("base_url")
        .cloned()
        .or_else(|| env_lookup(BASE_URL_ENV))
        .unwrap_or_else(|| default_base_url.to_string());

    let token = matches
        .get_one::<String>("token")
        .cloned()
        .or_else(|| env_lookup(TOKEN_ENV));

    (base_url, token)
}

pub fn render_list(catalog: &ApiCatalog, matches: &ArgMatches) -> Result<String> {
    if matches.get_flag("json") {
        let out: Vec<_> = catalog
            .categories
            .iter()
            .map(|category| {
                let endpoints: Vec<Value> = category
                    .endpoints
                    .iter()
                    .map(|e| {
                        json!({
                            "name": e.slug(),
                            "method": e.method,
                            "path": e.path,
                            "title": e.title,
                        })
                    })
                    .collect();
                json!({
                    "category": category.name,
                    "slug": category.slug(),
                    "endpoints": endpoints,
                })
            })
            .collect();
        return Ok(serde_json::to_string_pretty(&out)?);
    }

    let mut lines = Vec::new();
    for category in &catalog.categories {
        lines.push(format!("{} ({})", category.name, category.slug()));
        for endpoint in &category.endpoints {
            lines.push(format!(
                "  {:<6} {:<40} {}",
                endpoint.method.as_str(),
                endpoint.path,
                endpoint.title
            ));
        }
    }
    Ok(lines.join("\n"))
}

pub fn render_describe(catalog: &ApiCatalog, matches: &ArgMatches) -> Result<String> {
    let category_key = matches
        .get_one::<String>("category")
        .ok_or_else(|| anyhow!("category required"))?;
    let endpoint_key = matches
        .get_one::<String>("endpoint")
        .ok_or_else(|| anyhow!("endpoint required"))?;

    let category = catalog
        .category(category_key)
        .ok_or_else(|| anyhow!("unknown category {category_key}"))?;
    let endpoint = category
        .endpoint(endpoint_key)
        .ok_or_else(|| anyhow!("unknown endpoint {endpoint_key} in {}", category.name))?;

    if matches.get_flag("json") {
        return Ok(serde_json::to_string_pretty(endpoint)?);
    }

    let mut lines = vec![
        format!("{} / {}", category.name, endpoint.title),
        format!("  method: {}", endpoint.method),
        format!("  path: {}", endpoint.path),
        format!("  description: {}", endpoint.description.trim()),
        format!("  command: ims-api {} {}", category.slug(), endpoint.slug()),
    ];
    for (section, value) in endpoint.details.sections() {
        match value {
            Section::Fields(fields) => {
                lines.push(format!("  {section}:"));
                for (key, field) in fields {
                    lines.push(format!("    {key}: {}", inline(field)));
                }
            }
            Section::Value(other) => lines.push(format!("  {section}: {}", inline(other))),
        }
    }
    Ok(lines.join("\n"))
}

fn inline(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

pub fn render_tree(catalog: &ApiCatalog, matches: &ArgMatches) -> Result<String> {
    if matches.get_flag("json") {
        return Ok(serde_json::to_string_pretty(catalog)?);
    }
    let mut lines = Vec::new();
    for category in &catalog.categories {
        lines.push(format!("{}: {}", category.name, category.description));
        for endpoint in &category.endpoints {
            lines.push(format!(
                "  {} {} - {}",
                endpoint.method, endpoint.path, endpoint.title
            ));
        }
    }
    Ok(lines.join("\n"))
}

pub fn render_export(catalog: &ApiCatalog, matches: &ArgMatches) -> Result<String> {
    let pretty = matches.get_flag("pretty");
    let target: ExportTarget = matches
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("module")
        .parse()?;
    Ok(export::render(
        &catalog.categories,
        &catalog.global_name,
        target,
        pretty,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::catalog;
    use std::collections::HashMap;

    fn parse(args: &[&str]) -> ArgMatches {
        build_cli(catalog().unwrap())
            .try_get_matches_from(args.iter().copied())
            .unwrap()
    }

    fn env_of(pairs: &[(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<&str, &str> = pairs.iter().copied().collect();
        move |key| vars.get(key).map(|v| v.to_string())
    }

    #[test]
    fn flags_win_over_environment() {
        let matches = parse(&[
            "ims-api",
            "--base-url",
            "http://flag:1",
            "--token",
            "flag-token",
            "statistics",
            "get-system-statistics",
        ]);
        let env = env_of(&[(BASE_URL_ENV, "http://env:2"), (TOKEN_ENV, "env-token")]);
        let (base_url, token) = resolve_config(&matches, env, "http://default:3");
        assert_eq!(base_url, "http://flag:1");
        assert_eq!(token.as_deref(), Some("flag-token"));
    }

    #[test]
    fn environment_wins_over_catalog_default() {
        let matches = parse(&["ims-api", "statistics", "get-system-statistics"]);
        let env = env_of(&[(BASE_URL_ENV, "http://env:2"), (TOKEN_ENV, "env-token")]);
        let (base_url, token) = resolve_config(&matches, env, "http://default:3");
        assert_eq!(base_url, "http://env:2");
        assert_eq!(token.as_deref(), Some("env-token"));
    }

    #[test]
    fn catalog_default_applies_last() {
        let matches = parse(&["ims-api", "statistics", "get-system-statistics"]);
        let (base_url, token) = resolve_config(&matches, env_of(&[]), "http://default:3");
        assert_eq!(base_url, "http://default:3");
        assert!(token.is_none());
    }

    #[test]
    fn global_flags_accepted_after_subcommand() {
        let matches = parse(&[
            "ims-api",
            "cv-management",
            "approve-cv",
            "--id",
            "9",
            "--base-url",
            "http://late:4",
        ]);
        let (base_url, _) = resolve_config(&matches, env_of(&[]), "http://default:3");
        assert_eq!(base_url, "http://late:4");
    }

    #[test]
    fn list_shows_method_path_and_title() {
        let matches = parse(&["ims-api", "list"]);
        let out = render_list(catalog().unwrap(), matches.subcommand_matches("list").unwrap())
            .unwrap();
        let login = out
            .lines()
            .find(|line| line.contains("/api/auth/login"))
            .unwrap();
        assert!(login.trim_start().starts_with("POST"));
        assert!(login.trim_end().ends_with("Login User"));
    }

    #[test]
    fn describe_prints_each_section() {
        let matches = parse(&["ims-api", "describe", "authentication", "login-user"]);
        let out = render_describe(
            catalog().unwrap(),
            matches.subcommand_matches("describe").unwrap(),
        )
        .unwrap();
        assert!(out.contains("  Request Body:\n    email: string (required)"));
        assert!(out.contains("  Response:\n    200: {\"token\":\"JWT_TOKEN\""));
        assert!(out.contains("command: ims-api authentication login-user"));
    }

    #[test]
    fn inline_keeps_strings_bare() {
        assert_eq!(inline(&json!("10 requests/min")), "10 requests/min");
        assert_eq!(inline(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn verbose_flag_is_global() {
        assert!(parse(&["ims-api", "-v", "list"]).get_flag("verbose"));
        assert!(parse(&["ims-api", "list", "--verbose"]).get_flag("verbose"));
        assert!(!parse(&["ims-api", "list"]).get_flag("verbose"));
    }

    #[test]
    fn path_params_are_required_flags() {
        let err = build_cli(catalog().unwrap())
            .try_get_matches_from(["ims-api", "cv-management", "approve-cv"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
