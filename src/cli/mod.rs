//! # CLI Module
//!
//! Command-line tooling for inspecting route manifests.
//!
//! ## Commands
//!
//! ### `routes`
//!
//! Print the routing table in the order endpoints are tried:
//!
//! ```bash
//! brrtrouting routes --manifest routes.toml
//! ```
//!
//! ### `match`
//!
//! Match a request path and print the selected endpoint with its values:
//!
//! ```bash
//! brrtrouting match --manifest routes.toml --method POST --host api.example.com /users/42
//! ```
//!
//! ### `link`
//!
//! Generate a path from route values, by name or by required values:
//!
//! ```bash
//! brrtrouting link --manifest routes.toml --name user id=42
//! brrtrouting link --manifest routes.toml controller=Store action=Browse
//! ```
//!
//! ### `parse`
//!
//! Parse a path back into route values for a named endpoint:
//!
//! ```bash
//! brrtrouting parse --manifest routes.toml --name user /users/42
//! ```
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use brrtrouting::cli::{Cli, run_cli};
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! run_cli(cli)?;
//! ```

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{parse_key_value, run_cli, Cli, Commands};
