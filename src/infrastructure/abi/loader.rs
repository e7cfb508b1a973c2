//! ABI artifact loader - discovers and parses contract interfaces from the filesystem

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use walkdir::WalkDir;

use crate::domain::abi::{ContractDescriptor, ContractSet};
use crate::error::{MapperError, Result};

/// Artifacts larger than this are skipped
const MAX_ARTIFACT_BYTES: u64 = 5 * 1024 * 1024;

/// ABI artifact loader
pub struct ArtifactLoader;

impl ArtifactLoader {
    /// Load every contract matched by `patterns`, relative to `working_dir`.
    ///
    /// A pattern is a JSON file, a directory (walked recursively), or a glob
    /// such as `out/*.json` or `build/**/*.json`. Unparseable files are
    /// skipped with a warning; a pattern that matches no file is an error.
    pub fn load(working_dir: &Path, patterns: &[String]) -> Result<ContractSet> {
        let started = Instant::now();
        let mut contracts = ContractSet::new();
        let mut scanned_files = 0usize;

        for pattern in patterns {
            let files = Self::expand(working_dir, pattern)?;
            if files.is_empty() {
                return Err(MapperError::Load(format!("no artifacts match '{}'", pattern)));
            }

            for path in files {
                scanned_files += 1;
                match Self::load_file(&path) {
                    Ok(Some(contract)) => {
                        let name = contract.name.clone();
                        if !contracts.insert(contract) {
                            tracing::warn!(
                                contract = %name,
                                path = %path.display(),
                                "duplicate contract name, keeping the first"
                            );
                        }
                    }
                    Ok(None) => {}
                    Err(err) => {
                        tracing::warn!(path = %path.display(), "skipping artifact: {:#}", err);
                    }
                }
            }
        }

        tracing::debug!(
            scanned_files,
            contracts = contracts.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "loaded contract artifacts"
        );

        Ok(contracts)
    }

    /// Resolve a pattern into the list of JSON files it names
    fn expand(working_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
        let path = working_dir.join(pattern);

        if path.is_file() {
            return Ok(vec![path]);
        }
        if path.is_dir() {
            return Ok(Self::walk(&path));
        }
        if !pattern.contains(['*', '?', '[']) {
            return Err(MapperError::Io {
                path,
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }

        // the working dir is literal, only the pattern may hold wildcards
        let base = glob::Pattern::escape(&working_dir.to_string_lossy());
        let full = Path::new(&base).join(pattern);
        let paths = glob::glob(&full.to_string_lossy())
            .map_err(|err| MapperError::Load(format!("invalid pattern '{}': {}", pattern, err)))?;

        let mut files = Vec::new();
        for entry in paths {
            let path = match entry {
                Ok(path) => path,
                Err(err) => {
                    tracing::warn!("glob error: {}", err);
                    continue;
                }
            };
            let relative = path.strip_prefix(working_dir).unwrap_or(&path);
            if relative.components().any(|c| Self::is_ignored_dir(Path::new(c.as_os_str()))) {
                continue;
            }
            let size = fs::metadata(&path).ok().filter(|m| m.is_file()).map(|m| m.len());
            if Self::is_artifact(&path, size) {
                files.push(path);
            }
        }

        Ok(files)
    }

    /// Recursively collect `.json` files under `root`
    fn walk(root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for entry in WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !Self::is_ignored_dir(e.path()))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!("walk error: {}", err);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }
            let size = entry.metadata().ok().map(|m| m.len());
            if Self::is_artifact(entry.path(), size) {
                files.push(entry.path().to_path_buf());
            }
        }

        files
    }

    /// A `.json` file of known size under the artifact size cap
    fn is_artifact(path: &Path, size: Option<u64>) -> bool {
        path.extension().and_then(|s| s.to_str()) == Some("json")
            && size.is_some_and(|len| len <= MAX_ARTIFACT_BYTES)
    }

    /// Load a single artifact; `Ok(None)` when the JSON holds no ABI
    fn load_file(path: &Path) -> anyhow::Result<Option<ContractDescriptor>> {
        let content = fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&content)?;

        if !value.is_array() && value.get("abi").is_none() {
            return Ok(None);
        }

        let name = value
            .get("contractName")
            .and_then(|n| n.as_str())
            .map(str::to_owned)
            .or_else(|| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(str::to_owned)
            })
            .unwrap_or_default();

        Ok(Some(ContractDescriptor::from_json(name, &value)?))
    }

    /// Check if a path should be ignored
    fn is_ignored_dir(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|name| matches!(name, ".git" | "target" | "node_modules"))
            .unwrap_or(false)
    }
}
