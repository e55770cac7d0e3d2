use crate::constraints::ConstraintResolver;
use crate::data_source::DefaultEndpointDataSource;
use crate::linking::LinkGenerator;
use crate::manifest::RouteManifest;
use crate::router::{RequestContext, Router};
use crate::values::{RouteValue, RouteValueDictionary};
use clap::{Parser, Subcommand};
use http::Method;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Command-line interface for brrtrouting
///
/// Inspects a route manifest: lists its routing table, matches paths,
/// generates links and parses paths back into route values.
#[derive(Parser)]
#[command(name = "brrtrouting")]
#[command(about = "brrtrouting CLI", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Print the routing table in match order
    Routes {
        /// Path to the route manifest (TOML, or JSON with a .json extension)
        #[arg(short, long)]
        manifest: PathBuf,
    },
    /// Match a request path and print the selected endpoint and its values
    Match {
        /// Path to the route manifest
        #[arg(short, long)]
        manifest: PathBuf,

        /// HTTP method of the request
        #[arg(long, default_value = "GET")]
        method: String,

        /// Host header of the request
        #[arg(long)]
        host: Option<String>,

        /// Request path, e.g. /users/42
        path: String,
    },
    /// Generate a path from route values
    ///
    /// With --name the named endpoint is used; otherwise the endpoint is
    /// selected by its required values.
    Link {
        /// Path to the route manifest
        #[arg(short, long)]
        manifest: PathBuf,

        /// Endpoint or route name
        #[arg(short, long)]
        name: Option<String>,

        /// Ambient values of the current request (repeatable key=value)
        #[arg(long, value_parser = parse_key_value)]
        ambient: Vec<(String, String)>,

        /// Explicit route values as key=value pairs
        #[arg(value_parser = parse_key_value)]
        values: Vec<(String, String)>,
    },
    /// Parse a path into route values for a named endpoint
    Parse {
        /// Path to the route manifest
        #[arg(short, long)]
        manifest: PathBuf,

        /// Endpoint or route name
        #[arg(short, long)]
        name: String,

        /// Path to parse
        path: String,
    },
}

/// Parse a `key=value` argument.
///
/// # Errors
///
/// When the argument has no `=` or the key is empty.
pub fn parse_key_value(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{arg}'")),
    }
}

fn to_values(pairs: &[(String, String)]) -> RouteValueDictionary {
    pairs
        .iter()
        .map(|(k, v)| (k.clone(), RouteValue::String(v.clone())))
        .collect()
}

fn format_values(values: &RouteValueDictionary) -> String {
    let mut pairs: Vec<String> = values
        .iter()
        .map(|(k, v)| format!("{k}={}", v.as_invariant_str()))
        .collect();
    pairs.sort();
    pairs.join(" ")
}

fn load_source(path: &Path) -> anyhow::Result<(RouteManifest, Arc<DefaultEndpointDataSource>)> {
    let manifest = RouteManifest::load(path)?;
    let source = Arc::new(DefaultEndpointDataSource::new(manifest.build_endpoints()?));
    Ok((manifest, source))
}

/// Execute a parsed CLI command.
///
/// # Errors
///
/// Manifest, template and configuration errors, and an invalid `--method`.
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Routes { manifest } => {
            let (manifest, source) = load_source(manifest)?;
            let router = Router::new(source, ConstraintResolver::default(), manifest.routing);
            router.dump_routes()?;
            Ok(())
        }
        Commands::Match {
            manifest,
            method,
            host,
            path,
        } => {
            let (manifest, source) = load_source(manifest)?;
            let router = Router::new(source, ConstraintResolver::default(), manifest.routing);
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .map_err(|e| anyhow::anyhow!("invalid HTTP method '{method}': {e}"))?;
            let mut context = RequestContext::new(method, path.as_str());
            if let Some(host) = host {
                context = context.with_host(host.as_str());
            }
            match router.route(&mut context)? {
                Some(matched) => println!(
                    "[match] {} -> {} {}",
                    matched.route_pattern(),
                    matched.handler_name().unwrap_or("-"),
                    format_values(&matched.values)
                ),
                None => println!("[match] no endpoint matched {path}"),
            }
            Ok(())
        }
        Commands::Link {
            manifest,
            name,
            ambient,
            values,
        } => {
            let (manifest, source) = load_source(manifest)?;
            let links = LinkGenerator::new(source, ConstraintResolver::default(), manifest.routing);
            let ambient = to_values(ambient);
            let ambient = (!ambient.is_empty()).then_some(&ambient);
            let path =
                links.get_path_by_route_values(name.as_deref(), &to_values(values), ambient)?;
            match path {
                Some(path) => println!("{path}"),
                None => println!("[link] no endpoint could produce a link"),
            }
            Ok(())
        }
        Commands::Parse {
            manifest,
            name,
            path,
        } => {
            let (manifest, source) = load_source(manifest)?;
            let links = LinkGenerator::new(source, ConstraintResolver::default(), manifest.routing);
            match links.parser().parse_path_by_endpoint_name(name, path)? {
                Some(values) => println!("{}", format_values(&values)),
                None => println!("[parse] '{path}' does not match endpoint '{name}'"),
            }
            Ok(())
        }
    }
}
