//! tagtrace - Requirements traceability matrices from annotated documents
//!
//! Reads prose and source files, collects `[X:]` definitions and `[X=>Y]`
//! coverage annotations, and renders requirement and design tracing tables.

pub mod config;
pub mod output;

use config::Config;
use eyre::{Result, WrapErr};
use std::path::{Path, PathBuf};
use tagtrace_core::{Document, PathSources, Sources, WalkSources};

/// Default config location, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = ".config/tagtrace/config.yaml";

/// Load and parse a YAML config file
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        eyre::bail!(
            "Config file not found at {}\n\n\
             Create a config file to override the built-in rules:\n\n\
             requirement_rules:\n  \
               - type_code: R\n    \
                 covered_by: [T]\n  \
               - type_code: T",
            path.display()
        );
    }

    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = facet_yaml::from_str(&content)
        .map_err(|e| eyre::eyre!("{}", e))
        .wrap_err_with(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}

/// Load an explicit config, or the default one if it exists
///
/// An explicitly requested file must exist; the default location is optional.
pub fn load_config_or_default(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => load_config(path),
        None => {
            let path = Path::new(DEFAULT_CONFIG_PATH);
            if path.exists() {
                load_config(path)
            } else {
                Ok(Config::default())
            }
        }
    }
}

/// Read every input, in command-line order
///
/// Files are read as given. Directories are walked (sorted, gitignore-aware)
/// and their documents identified by `<dir>/<relative path>`.
pub fn collect_documents(inputs: &[PathBuf], config: &Config) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            documents.extend(PathSources::new(files.drain(..)).documents()?);
            documents.extend(walk_directory(input, config)?);
        } else {
            files.push(input.clone());
        }
    }
    documents.extend(PathSources::new(files).documents()?);

    Ok(documents)
}

fn walk_directory(dir: &Path, config: &Config) -> Result<Vec<Document>> {
    let walked = WalkSources::new(dir)
        .include(config.include.iter().cloned())
        .exclude(config.exclude_patterns())
        .documents()?;
    tracing::debug!(dir = %dir.display(), documents = walked.len(), "walked directory");

    if dir == Path::new(".") {
        return Ok(walked);
    }

    let prefix = dir.to_string_lossy().replace('\\', "/");
    let prefix = prefix.trim_end_matches('/');
    Ok(walked
        .into_iter()
        .map(|doc| Document::new(format!("{}/{}", prefix, doc.id), doc.content))
        .collect())
}
