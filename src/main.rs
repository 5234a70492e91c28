use anyhow::{Context, Result, anyhow};
use ims_api_docs::cli::{self, LOG_ENV};
use ims_api_docs::http::HttpClient;
use ims_api_docs::request::{build_request_parts, parse_body_arg};
use std::{env, io::Write};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let catalog = ims_api_docs::catalog().context("load api catalog")?;
    let matches = cli::build_cli(catalog).get_matches();
    init_tracing(matches.get_flag("verbose"));
    debug!(
        categories = catalog.categories.len(),
        endpoints = catalog.endpoint_count(),
        "catalog ready"
    );

    if let Some(matches) = matches.subcommand_matches("list") {
        return write_stdout_line(&cli::render_list(catalog, matches)?);
    }
    if let Some(matches) = matches.subcommand_matches("describe") {
        return write_stdout_line(&cli::render_describe(catalog, matches)?);
    }
    if let Some(matches) = matches.subcommand_matches("tree") {
        return write_stdout_line(&cli::render_tree(catalog, matches)?);
    }
    if let Some(matches) = matches.subcommand_matches("export") {
        return write_stdout_line(&cli::render_export(catalog, matches)?);
    }

    let (base_url, token) =
        cli::resolve_config(&matches, |key| env::var(key).ok(), &catalog.base_url);

    let pretty = matches.get_flag("pretty");
    let raw = matches.get_flag("raw");

    let (category, res_matches) = matches
        .subcommand()
        .ok_or_else(|| anyhow!("category required"))?;
    let (op_name, op_matches) = res_matches
        .subcommand()
        .ok_or_else(|| anyhow!("endpoint required"))?;

    let endpoint = catalog
        .find_endpoint(category, op_name)
        .ok_or_else(|| anyhow!("unknown command {category} {op_name}"))?;

    if endpoint.requires_auth() && token.is_none() {
        warn!("{} expects a bearer token; set IMS_API_TOKEN or --token", endpoint.path);
    }

    let parts = build_request_parts(endpoint, |name| {
        op_matches.get_one::<String>(name).map(String::as_str)
    })?;
    let body = match op_matches.try_get_one::<String>("body").ok().flatten() {
        Some(value) => Some(parse_body_arg(value)?),
        None => None,
    };

    let client = HttpClient::new(base_url, token)?;
    let outcome = client.execute(endpoint.method, &parts.path, &parts.query, body, raw, pretty)?;

    write_stdout_line(&outcome.output)?;
    if !outcome.ok {
        return Err(anyhow!("http {}", outcome.status));
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn write_stdout_line(value: &str) -> Result<()> {
    let mut out = std::io::stdout().lock();
    if let Err(err) = out.write_all(value.as_bytes()) {
        if err.kind() == std::io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        return Err(err.into());
    }
    if let Err(err) = out.write_all(b"\n") {
        if err.kind() == std::io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        return Err(err.into());
    }
    Ok(())
}
