use crate::adhoc::AdHocBinder;
use crate::form::{FormValues, KeySource};
use crate::runtime_config::BindConfig;
use crate::schema::Position;
use crate::tags::{self, KEY_IN, KEY_NAME};
use crate::validator::Validator;
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Command-line interface for parambind
#[derive(Parser)]
#[command(name = "parambind")]
#[command(about = "Inspect binding tags and dry-run parameter binding", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Parse a tag string and print its constraint map as JSON
    Tags {
        /// Tag string, e.g. "<in:query> <required> <len:3:6>"
        tag: String,

        /// Full-match pattern, as given in a separate `regexp` annotation
        #[arg(long)]
        regexp: Option<String>,
    },
    /// Ad-hoc bind one key from a query string and print the result as JSON
    Bind {
        /// URL-encoded query string, without the leading `?`
        #[arg(short, long)]
        query: String,

        /// Key to bind
        #[arg(short, long)]
        key: String,

        /// Bind into a string map instead of a string list
        #[arg(long, default_value_t = false)]
        map: bool,

        /// Highest accepted `key[N]` index
        #[arg(long, env = "PARAMBIND_MAX_ARRAY_INDEX")]
        max_array_index: Option<usize>,
    },
}

/// Parse `tag` and check it the way registration would.
///
/// Returns `{"ignored": true}` for `-`, otherwise the tag map together with
/// the resolved position and whether the field is required.
pub fn inspect_tag(tag: &str, regexp: Option<&str>) -> Result<Value> {
    if tags::is_ignored(tag) {
        return Ok(json!({ "ignored": true }));
    }
    let map = tags::parse_tags(tag);
    let position: Position = map
        .get(KEY_IN)
        .ok_or_else(|| anyhow!("missing `{}` token", KEY_IN))?
        .parse()
        .map_err(|e: String| anyhow!(e))?;
    let validator = Validator::compile(&map, regexp)
        .map_err(|e| anyhow!(e))
        .context("invalid constraint")?;

    let required = position == Position::Path
        || map.contains_key(tags::KEY_REQUIRED)
        || map.contains_key(tags::KEY_NONZERO)
        || map.get(tags::KEY_RANGE).is_some_and(|r| !r.is_empty());

    let sorted: BTreeMap<&str, &str> = map.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    Ok(json!({
        "tags": sorted,
        "position": position.as_str(),
        "name": map.get(KEY_NAME),
        "required": required,
        "constrained": !validator.is_empty(),
    }))
}

/// Leniently bind `key` out of `query` into a string list, or a string map
/// when `as_map` is set. Absent keys produce an empty list or map.
pub fn bind_query(query: &str, key: &str, as_map: bool, config: BindConfig) -> Result<Value> {
    let values = FormValues::parse(query);
    let src = KeySource::new(&values, config.max_array_index);
    let binder = AdHocBinder::new(config);
    if as_map {
        let mut out: BTreeMap<String, String> = BTreeMap::new();
        binder.bind_from(&src, &mut out, key)?;
        Ok(serde_json::to_value(out)?)
    } else {
        let mut out: Vec<String> = Vec::new();
        binder.bind_from(&src, &mut out, key)?;
        Ok(serde_json::to_value(out)?)
    }
}

/// Execute a parsed command, printing its JSON result on stdout.
pub fn run_cli(cli: Cli) -> Result<()> {
    let output = match cli.command {
        Commands::Tags { tag, regexp } => inspect_tag(&tag, regexp.as_deref())?,
        Commands::Bind {
            query,
            key,
            map,
            max_array_index,
        } => {
            let mut config = BindConfig::from_env();
            if let Some(max) = max_array_index {
                config.max_array_index = max;
            }
            bind_query(&query, &key, map, config)?
        }
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
