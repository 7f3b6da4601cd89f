use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "jvm-name-extractor")]
#[command(about = "Map source files to the JVM class names compiled from them")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log scan progress to stderr
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Map source files to class names across jars
    Extract {
        #[arg(value_name = "JAR")]
        jars: Vec<String>,

        /// File with one archive path per line
        #[arg(long, value_name = "FILE")]
        jars_file: Option<PathBuf>,

        /// Also scan every jar found under this directory
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,

        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Class entry visiting order [default: canonical, or JVM_NAMES_ORDER]
        #[arg(long, value_enum, value_name = "ORDER")]
        order: Option<OrderArg>,

        /// Scan archives concurrently; output is identical to a sequential run
        #[arg(long)]
        parallel: bool,

        /// Exit non-zero if any archive or entry could not be read
        #[arg(long)]
        strict: bool,
    },
    /// Print the decoded header of a class file, or of every class in a jar
    Inspect {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OrderArg {
    Native,
    Canonical,
}
