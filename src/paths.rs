//! # Path Resolution Module
//!
//! Questo modulo trasforma i path forniti dall'utente in coppie
//! `(input, output)` pronte per la pipeline.
//!
//! ## Responsabilità:
//! - Discovery ricorsiva dei file nelle directory (filtro per estensione,
//!   case-insensitive)
//! - Mirroring della struttura delle directory dentro un'eventuale output root
//! - Prefisso/suffisso opzionali applicati al nome del file di output
//! - Utility condivise: dimensioni human-readable, path relativi per i log
//!
//! L'estensione qui serve SOLO per la selezione dei file e per il naming di
//! output; il formato vero viene rilevato dai byte in `detect`.

use anyhow::Result;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One logical file to transform: where to read it and where the result
/// would be written. Immutable for the life of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPair {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Output naming policy applied while building path pairs.
#[derive(Debug, Clone, Default)]
pub struct OutputNaming {
    /// Mirror results into this root instead of writing next to the input.
    pub output_dir: Option<PathBuf>,
    pub prefix: String,
    pub suffix: String,
}

impl OutputNaming {
    fn rename(&self, input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();
        let extension = input
            .extension()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();
        let mut name = format!("{}{}{}", self.prefix, stem, self.suffix);
        if !extension.is_empty() {
            name.push('.');
            name.push_str(&extension);
        }
        PathBuf::from(name)
    }
}

/// Expands user-supplied paths into deduplicated `PathPair`s.
///
/// Directories are walked recursively; plain files are kept when their
/// extension matches. Each directory argument acts as the mirroring base for
/// the files found under it; files passed directly mirror by basename only.
pub fn collect_path_pairs(
    inputs: &[PathBuf],
    extensions: &[&str],
    naming: &OutputNaming,
) -> Result<Vec<PathPair>> {
    let mut files: BTreeSet<(PathBuf, PathBuf)> = BTreeSet::new();

    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                if has_extension(entry.path(), extensions) {
                    files.insert((entry.path().to_path_buf(), input.clone()));
                }
            }
        } else if input.is_file() && has_extension(input, extensions) {
            let base = input.parent().unwrap_or(Path::new("")).to_path_buf();
            files.insert((input.clone(), base));
        }
    }

    let pairs = files
        .into_iter()
        .map(|(input, base)| {
            let output = resolve_output(&input, &base, naming);
            PathPair { input, output }
        })
        .collect();

    Ok(pairs)
}

fn resolve_output(input: &Path, base: &Path, naming: &OutputNaming) -> PathBuf {
    let filename = naming.rename(input);

    match naming.output_dir {
        Some(ref output_dir) => {
            let relative_dir = input
                .strip_prefix(base)
                .unwrap_or(input)
                .parent()
                .unwrap_or(Path::new(""));
            output_dir.join(relative_dir).join(filename)
        }
        None => input.with_file_name(filename),
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    match path.extension() {
        Some(ext) => {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            extensions.contains(&ext_lower.as_str())
        }
        None => false,
    }
}

/// Creates the parent directories of an output path on demand.
pub async fn ensure_parent_dirs(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

/// Path shown in outcome lines: relative to the current directory when the
/// file lives under it.
pub fn display_path(path: &Path) -> String {
    if path.is_absolute() {
        if let Ok(cwd) = std::env::current_dir() {
            if let Ok(relative) = path.strip_prefix(&cwd) {
                return relative.display().to_string();
            }
        }
    }
    path.display().to_string()
}

/// Human-readable file size (B/KB/MB/GB/TB).
pub fn format_size(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", size as u64, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}
