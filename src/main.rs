use anyhow::{Context, Result};
use clap::Parser;
use jvm_name_extractor::aggregate::SourceFileMapping;
use jvm_name_extractor::archive::{ArchiveStatus, EntryOrder, scan_archive};
use jvm_name_extractor::classfile::{ParsedClassHeader, parse_class_header};
use jvm_name_extractor::cli::{Cli, Commands, OutputFormat};
use jvm_name_extractor::config::{resolve_archive_paths, resolve_extract_config};
use jvm_name_extractor::extract::{ExtractStats, Extraction, extract_mappings};
use serde::Serialize;
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = parse_cli();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Extract {
            jars,
            jars_file,
            dir,
            format,
            output,
            order,
            parallel,
            strict,
        } => {
            let config = resolve_extract_config(order, parallel)?;
            let paths = resolve_archive_paths(&jars, jars_file.as_deref(), dir.as_deref())?;
            let extraction = extract_mappings(&paths, &config);
            write_extract_output(&extraction, format, output.as_deref())?;
            if strict && !extraction.diagnostics.is_empty() {
                anyhow::bail!(
                    "{} archive(s) or entries could not be read",
                    extraction.diagnostics.len()
                );
            }
        }
        Commands::Inspect { path } => {
            let report = inspect(&path)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn parse_cli() -> Cli {
    let args: Vec<String> = std::env::args().collect();
    Cli::parse_from(rewrite_args_for_implicit_extract(args))
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// `jvm-name-extractor a.jar b.jar` behaves like `jvm-name-extractor extract a.jar b.jar`.
fn rewrite_args_for_implicit_extract(mut args: Vec<String>) -> Vec<String> {
    if args.len() <= 1 {
        return args;
    }

    let subcommands = ["extract", "inspect", "help"];
    let global_flags = ["-v", "--verbose", "-h", "--help"];

    let idx = args
        .iter()
        .skip(1)
        .position(|a| !global_flags.contains(&a.as_str()))
        .map(|i| i + 1);

    if let Some(idx) = idx
        && !subcommands.contains(&args[idx].as_str())
    {
        args.insert(idx, "extract".to_string());
    }

    args
}

#[derive(Debug, Serialize)]
struct ExtractOutput<'a> {
    mappings: &'a [SourceFileMapping],
    diagnostics: Vec<String>,
    stats: ExtractStats,
}

fn write_extract_output(
    extraction: &Extraction,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let diagnostics: Vec<String> = extraction
        .diagnostics
        .iter()
        .map(|d| d.to_string())
        .collect();

    let content = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&ExtractOutput {
            mappings: &extraction.mappings,
            diagnostics,
            stats: extraction.stats,
        })?,
        OutputFormat::Text => {
            let mut out = String::new();
            for m in &extraction.mappings {
                let names: Vec<&str> = m.jvm_class_names.iter().map(String::as_str).collect();
                out.push_str(&format!(
                    "{}\t{}\t{}\n",
                    m.source_file,
                    m.package_name,
                    names.join(",")
                ));
            }
            for d in &diagnostics {
                out.push_str(&format!("! {d}\n"));
            }
            out
        }
    };

    if let Some(path) = output {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write output: {}", path.display()))?;
    } else {
        print!("{content}");
        if !content.ends_with('\n') {
            println!();
        }
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct InspectReport {
    path: String,
    classes: Vec<ParsedClassHeader>,
    diagnostics: Vec<String>,
}

fn inspect(path: &Path) -> Result<InspectReport> {
    let display = path.to_string_lossy().to_string();
    if path.extension().is_some_and(|e| e == "class") {
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let header = parse_class_header(&bytes)
            .with_context(|| format!("Failed to decode {}", path.display()))?;
        return Ok(InspectReport {
            path: display,
            classes: vec![header],
            diagnostics: Vec::new(),
        });
    }

    let scan = scan_archive(path, EntryOrder::Canonical);
    if scan.status == ArchiveStatus::Missing {
        anyhow::bail!("File not found: {}", path.display());
    }
    Ok(InspectReport {
        path: display,
        classes: scan.headers,
        diagnostics: scan.diagnostics.iter().map(|d| d.to_string()).collect(),
    })
}
