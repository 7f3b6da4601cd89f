use anyhow::{Context, Result};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// Collects every `*.jar` under `base_path`, sorted so repeated runs fold
/// archives in the same order.
pub fn scan_jars(base_path: &Path) -> Result<Vec<PathBuf>> {
    if !base_path.is_dir() {
        anyhow::bail!("not a directory: {}", base_path.display());
    }

    let (tx, rx) = mpsc::channel();

    let walker = WalkBuilder::new(base_path)
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .build_parallel();

    walker.run(|| {
        let tx = tx.clone();
        Box::new(move |entry| {
            if let Ok(entry) = entry {
                let path = entry.path();
                if path.is_file() && path.extension().is_some_and(|e| e == "jar") {
                    let _ = tx.send(path.to_path_buf());
                }
            }
            ignore::WalkState::Continue
        })
    });

    drop(tx);
    let mut jars: Vec<PathBuf> = rx.iter().collect();
    jars.sort();
    Ok(jars)
}

/// Reads a params file holding one archive path per line. Blank lines are
/// kept; the extractor discards them.
pub fn read_path_list(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read archive list: {}", path.display()))?;
    Ok(content.lines().map(str::to_string).collect())
}
