//! # jvm-name-extractor
//!
//! Maps each source file of a build to the JVM binary class names compiled
//! from it, using only the built archives.
//!
//! ## Architecture
//!
//! - **classfile**: Minimal class-file reader for the class name and `SourceFile` attribute
//! - **archive**: Jar scanning with per-entry fault isolation
//! - **aggregate**: Source file to class-name and package folding
//! - **extract**: Batch extraction over a list of archive paths
//! - **error**: Typed archive and entry diagnostics
//! - **scan**: Archive discovery in directories and params files
//! - **config**: Extraction settings from flags and environment
//! - **cli**: Command-line definition

pub mod aggregate;
pub mod archive;
pub mod classfile;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod scan;

#[cfg(test)]
mod fixtures;
