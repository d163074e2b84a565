use crate::config::{IgnoreFilter, ScanConfig};
use crate::identify::{split_lines, RegionIdentifier};
use crate::models::{FoldMap, FoldStats, ScanMetadata, SourceFile};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Config error: {0}")]
    ConfigError(#[from] crate::config::ConfigError),
    #[error("Thread pool error: {0}")]
    ThreadPoolError(String),
}

/// Main scanner for identifying foldable regions across a project
pub struct FoldScanner {
    config: ScanConfig,
    ignore_filter: IgnoreFilter,
    identifier: RegionIdentifier,
}

impl FoldScanner {
    pub fn new(config: ScanConfig) -> Result<Self, ScanError> {
        let ignore_filter = IgnoreFilter::new(&config)?;
        let identifier = RegionIdentifier::with_policy(config.fold_policy);
        Ok(Self {
            config,
            ignore_filter,
            identifier,
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan the project and return the fold map
    pub fn scan(&self) -> Result<FoldMap, ScanError> {
        let start = Instant::now();

        let source_files = self.find_source_files();
        debug!(
            root = %self.config.root.display(),
            files = source_files.len(),
            "found source files"
        );

        let files: Vec<SourceFile> = if self.config.threads == 1 {
            source_files
                .iter()
                .filter_map(|path| self.identify_file(path))
                .collect()
        } else if self.config.threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.threads)
                .build()
                .map_err(|e| ScanError::ThreadPoolError(e.to_string()))?;
            pool.install(|| {
                source_files
                    .par_iter()
                    .filter_map(|path| self.identify_file(path))
                    .collect()
            })
        } else {
            source_files
                .par_iter()
                .filter_map(|path| self.identify_file(path))
                .collect()
        };

        let stats = calculate_stats(&files);

        let duration = start.elapsed();
        let metadata = ScanMetadata {
            scan_duration_ms: duration.as_millis() as u64,
            files_per_second: if duration.as_secs_f64() > 0.0 {
                files.len() as f64 / duration.as_secs_f64()
            } else {
                0.0
            },
            timestamp: chrono::Utc::now().to_rfc3339(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        };

        Ok(FoldMap {
            root: self.config.root.clone(),
            files,
            stats,
            metadata,
        })
    }

    /// Identify regions in a single file
    pub fn scan_file(&self, path: &Path) -> Result<SourceFile, ScanError> {
        let content = fs::read_to_string(path)?;
        Ok(self.source_file(path, &content))
    }

    /// Find all files under the root with a configured extension
    fn find_source_files(&self) -> Vec<PathBuf> {
        WalkDir::new(&self.config.root)
            .into_iter()
            .filter_entry(|e| {
                !(e.file_type().is_dir() && self.ignore_filter.should_ignore(e.path(), true))
            })
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|path| !self.ignore_filter.should_ignore(path, false))
            .filter(|path| self.config.matches_extension(path))
            .collect()
    }

    /// Read and identify one file; `None` when it is skipped for size
    fn identify_file(&self, path: &Path) -> Option<SourceFile> {
        if let Ok(meta) = fs::metadata(path) {
            if meta.len() > self.config.max_file_size {
                warn!(
                    path = %path.display(),
                    size = meta.len(),
                    "skipping file above max_file_size"
                );
                return None;
            }
        }

        match fs::read_to_string(path) {
            Ok(content) => Some(self.source_file(path, &content)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read file");
                Some(SourceFile {
                    path: self.relative_path(path),
                    absolute_path: path.to_path_buf(),
                    regions: vec![],
                    line_count: 0,
                    parsed: false,
                    error: Some(e.to_string()),
                })
            }
        }
    }

    fn source_file(&self, path: &Path, content: &str) -> SourceFile {
        let regions = self.identifier.identify(content);
        debug!(path = %path.display(), regions = regions.len(), "identified file");

        SourceFile {
            path: self.relative_path(path),
            absolute_path: path.to_path_buf(),
            regions,
            line_count: split_lines(content).len(),
            parsed: true,
            error: None,
        }
    }

    fn relative_path(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.config.root)
            .unwrap_or(path)
            .to_path_buf()
    }
}

/// Calculate fold statistics
fn calculate_stats(files: &[SourceFile]) -> FoldStats {
    let mut stats = FoldStats {
        total_files: files.len(),
        ..Default::default()
    };

    for file in files {
        if !file.parsed {
            stats.files_with_errors += 1;
        }
        stats.total_lines += file.line_count;
        for region in &file.regions {
            stats.add_region(region);
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RegionKind;
    use tempfile::TempDir;

    fn create_test_project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(
            root.join("src/lib.rs"),
            "use std::fmt;\nuse std::io;\n\npub struct Config {\n    name: String,\n}\n\nimpl Config {\n    pub fn name(&self) -> &str {\n        &self.name\n    }\n}\n",
        )
        .unwrap();
        fs::write(
            root.join("src/main.rs"),
            "fn main() {\n    println!(\"hi\");\n}\n",
        )
        .unwrap();
        fs::write(root.join("README.md"), "fn not_code() {\n}\n").unwrap();

        fs::create_dir_all(root.join("target/debug")).unwrap();
        fs::write(root.join("target/debug/build.rs"), "fn build() {\n}\n").unwrap();

        dir
    }

    #[test]
    fn test_scanner_creation() {
        let config = ScanConfig::default();
        let scanner = FoldScanner::new(config);
        assert!(scanner.is_ok());
    }

    #[test]
    fn test_scan_directory() {
        let dir = create_test_project();
        let scanner = FoldScanner::new(ScanConfig::new(dir.path().to_path_buf())).unwrap();
        let result = scanner.scan().unwrap();

        assert_eq!(result.stats.total_files, 2);
        assert_eq!(result.stats.fn_regions, 2);
        assert_eq!(result.stats.struct_regions, 1);
        assert_eq!(result.stats.impl_regions, 1);
        assert_eq!(result.stats.import_blocks, 1);
        assert_eq!(result.stats.import_statements, 2);
        assert_eq!(result.stats.files_with_errors, 0);
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let dir = create_test_project();
        let root = dir.path().to_path_buf();
        let seq = FoldScanner::new(ScanConfig::new(root.clone()).with_threads(1))
            .unwrap()
            .scan()
            .unwrap();
        let par = FoldScanner::new(ScanConfig::new(root).with_threads(2))
            .unwrap()
            .scan()
            .unwrap();
        assert_eq!(seq.stats, par.stats);
    }

    #[test]
    fn test_scan_file() {
        let dir = create_test_project();
        let root = dir.path().to_path_buf();
        let scanner = FoldScanner::new(ScanConfig::new(root.clone())).unwrap();
        let file = scanner.scan_file(&root.join("src/lib.rs")).unwrap();

        assert_eq!(file.path, PathBuf::from("src/lib.rs"));
        assert_eq!(file.import_count(), 2);
        let kinds: Vec<_> = file.regions.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RegionKind::ConsolidatedUseBlock,
                RegionKind::Struct,
                RegionKind::Impl,
                RegionKind::Fn
            ]
        );
    }

    #[test]
    fn test_max_file_size_skips() {
        let dir = create_test_project();
        let config = ScanConfig::new(dir.path().to_path_buf()).with_max_file_size(40);
        let result = FoldScanner::new(config).unwrap().scan().unwrap();
        // only main.rs is small enough
        assert_eq!(result.stats.total_files, 1);
    }
}
