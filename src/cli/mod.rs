//! # CLI Module
//!
//! Developer tooling for working with binding annotations outside a running
//! service.
//!
//! ## Commands
//!
//! ### `tags`
//!
//! Parse a tag string, check its position and constraints, and print the
//! resulting key/value map as JSON:
//!
//! ```bash
//! parambind tags '<in:query> <required> <len:3:6>'
//! parambind tags '<in:formData> <name:login>' --regexp '[a-z]+'
//! ```
//!
//! ### `bind`
//!
//! Run an ad-hoc (lenient) bind of one key against a query string:
//!
//! ```bash
//! parambind bind --query 'list[1]=b&list[0]=a' --key list
//! parambind bind --query 'm[a]=1&m[b]=2' --key m --map
//! ```
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use parambind::cli::{run_cli, Cli};
//! use clap::Parser;
//!
//! run_cli(Cli::parse())?;
//! ```

mod commands;


pub use commands::{bind_query, inspect_tag, run_cli, Cli, Commands};
