use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::classfile::{ParsedClassHeader, package_of};

/// The compiled classes one source file produced and the package they live in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFileMapping {
    pub source_file: String,
    pub jvm_class_names: BTreeSet<String>,
    pub package_name: String,
}

/// Folds decoded class headers into per-source-file records.
///
/// One aggregator serves one extraction and is consumed by [`finish`].
/// When classes declaring the same source disagree on package, the last
/// one added wins.
///
/// [`finish`]: MappingAggregator::finish
#[derive(Debug, Default)]
pub struct MappingAggregator {
    classes: BTreeMap<String, BTreeSet<String>>,
    packages: BTreeMap<String, String>,
}

impl MappingAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the header contributed, i.e. carried a source marker.
    pub fn add(&mut self, header: &ParsedClassHeader) -> bool {
        match header.source_file.as_deref() {
            Some(source_file) => {
                self.record(&header.binary_class_name, source_file, header.package_name());
                true
            }
            None => false,
        }
    }

    pub fn add_class(&mut self, binary_class_name: &str, source_file: &str) {
        self.record(binary_class_name, source_file, package_of(binary_class_name));
    }

    fn record(&mut self, binary_class_name: &str, source_file: &str, package: &str) {
        self.classes
            .entry(source_file.to_string())
            .or_default()
            .insert(binary_class_name.to_string());
        self.packages.insert(source_file.to_string(), package.to_string());
    }

    /// Number of distinct source files seen so far.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn finish(self) -> Vec<SourceFileMapping> {
        let Self {
            classes,
            mut packages,
        } = self;
        classes
            .into_iter()
            .map(|(source_file, jvm_class_names)| {
                let package_name = packages
                    .remove(&source_file)
                    .unwrap_or_else(|| derive_package(&jvm_class_names));
                SourceFileMapping {
                    source_file,
                    jvm_class_names,
                    package_name,
                }
            })
            .collect()
    }
}

// Only reached if a source was recorded without a package.
fn derive_package(class_names: &BTreeSet<String>) -> String {
    class_names
        .iter()
        .next()
        .map(|name| package_of(name).to_string())
        .unwrap_or_default()
}
