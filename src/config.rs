use anyhow::{Context, Result};
use std::env;
use std::path::Path;

use crate::archive::EntryOrder;
use crate::cli::OrderArg;
use crate::extract::ExtractConfig;
use crate::scan::{read_path_list, scan_jars};

pub const ORDER_ENV: &str = "JVM_NAMES_ORDER";
pub const PARALLEL_ENV: &str = "JVM_NAMES_PARALLEL";

/// Command-line flags win over the environment, which wins over defaults.
pub fn resolve_extract_config(order: Option<OrderArg>, parallel: bool) -> Result<ExtractConfig> {
    resolve_extract_config_with(order, parallel, |key| env::var(key).ok())
}

fn resolve_extract_config_with(
    order: Option<OrderArg>,
    parallel: bool,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ExtractConfig> {
    let order = match order {
        Some(OrderArg::Native) => EntryOrder::Native,
        Some(OrderArg::Canonical) => EntryOrder::Canonical,
        None => match lookup(ORDER_ENV) {
            Some(raw) => parse_order(&raw).with_context(|| format!("Invalid {ORDER_ENV}"))?,
            None => EntryOrder::default(),
        },
    };

    let parallel = parallel
        || lookup(PARALLEL_ENV)
            .map(|raw| matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

    Ok(ExtractConfig { order, parallel })
}

fn parse_order(raw: &str) -> Result<EntryOrder> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "native" => Ok(EntryOrder::Native),
        "canonical" => Ok(EntryOrder::Canonical),
        other => anyhow::bail!("unknown entry order '{other}' (expected native or canonical)"),
    }
}

/// Positional paths first, then the params file, then jars found under `dir`.
pub fn resolve_archive_paths(
    jars: &[String],
    jars_file: Option<&Path>,
    dir: Option<&Path>,
) -> Result<Vec<String>> {
    let mut paths = jars.to_vec();
    if let Some(file) = jars_file {
        paths.extend(read_path_list(file)?);
    }
    if let Some(dir) = dir {
        let found = scan_jars(dir)
            .with_context(|| format!("Failed to discover jars under {}", dir.display()))?;
        paths.extend(found.iter().map(|p| p.to_string_lossy().to_string()));
    }
    Ok(paths)
}
