use crate::models::FoldPolicy;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File looked up at the scan root when no explicit config path is given
pub const CONFIG_FILE_NAME: &str = "blockfold.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to build glob pattern: {0}")]
    GlobError(#[from] globset::Error),
    #[error("Failed to parse gitignore: {0}")]
    GitignoreError(#[from] ignore::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid config file {path}: {source}")]
    TomlError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Configuration for scanning
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Root directory to scan
    pub root: PathBuf,
    /// File extensions to identify regions in (without the dot)
    pub extensions: Vec<String>,
    /// Additional ignore patterns (glob style)
    pub ignore_patterns: Vec<String>,
    /// Custom ignore file path
    pub ignore_file: Option<PathBuf>,
    /// Include target/ and vendored dependencies in the scan
    pub include_deps: bool,
    /// Number of threads (0 = auto)
    pub threads: usize,
    /// Files larger than this are skipped (bytes)
    pub max_file_size: u64,
    /// Default collapsed state per region kind
    pub fold_policy: FoldPolicy,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            extensions: vec!["rs".to_string()],
            ignore_patterns: vec![],
            ignore_file: None,
            include_deps: false,
            threads: 0,
            max_file_size: 10 * 1024 * 1024,
            fold_policy: FoldPolicy::default(),
        }
    }
}

impl ScanConfig {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            ..Default::default()
        }
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    pub fn with_ignore_file(mut self, path: PathBuf) -> Self {
        self.ignore_file = Some(path);
        self
    }

    pub fn with_include_deps(mut self, include: bool) -> Self {
        self.include_deps = include;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    pub fn with_fold_policy(mut self, policy: FoldPolicy) -> Self {
        self.fold_policy = policy;
        self
    }

    /// Whether `path` carries one of the configured extensions
    pub fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)))
    }
}

/// Contents of a `blockfold.toml` file
///
/// ```toml
/// [fold]
/// fn = true
/// impl = false
/// imports = true
///
/// [scan]
/// ignore = ["**/generated/**"]
/// extensions = ["rs"]
/// threads = 4
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub fold: Option<FoldPolicy>,
    pub scan: ScanSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanSection {
    pub ignore: Vec<String>,
    pub extensions: Option<Vec<String>>,
    pub threads: Option<usize>,
    pub include_deps: Option<bool>,
    pub max_file_size: Option<u64>,
}

impl FileConfig {
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::TomlError {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text, path)
    }

    /// Load `blockfold.toml` from `root` if present
    pub fn discover(root: &Path) -> Result<Option<Self>, ConfigError> {
        let path = root.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            return Ok(None);
        }
        Self::load(&path).map(Some)
    }

    /// Layer the file values over `config`; ignore patterns are appended.
    pub fn apply(self, mut config: ScanConfig) -> ScanConfig {
        if let Some(policy) = self.fold {
            config.fold_policy = policy;
        }
        config.ignore_patterns.extend(self.scan.ignore);
        if let Some(extensions) = self.scan.extensions {
            config.extensions = extensions;
        }
        if let Some(threads) = self.scan.threads {
            config.threads = threads;
        }
        if let Some(include) = self.scan.include_deps {
            config.include_deps = include;
        }
        if let Some(size) = self.scan.max_file_size {
            config.max_file_size = size;
        }
        config
    }
}

/// Filter for ignoring files and directories
pub struct IgnoreFilter {
    gitignore: Option<Gitignore>,
    custom_globs: GlobSet,
    default_ignores: GlobSet,
}

impl IgnoreFilter {
    pub fn new(config: &ScanConfig) -> Result<Self, ConfigError> {
        let gitignore_path = config
            .ignore_file
            .clone()
            .unwrap_or_else(|| config.root.join(".gitignore"));
        let gitignore = if gitignore_path.exists() {
            let mut builder = GitignoreBuilder::new(&config.root);
            if let Some(err) = builder.add(&gitignore_path) {
                return Err(err.into());
            }
            Some(builder.build()?)
        } else {
            None
        };

        let mut custom_builder = GlobSetBuilder::new();
        for pattern in &config.ignore_patterns {
            custom_builder.add(Glob::new(pattern)?);
        }
        let custom_globs = custom_builder.build()?;

        // Build output and vendored sources unless asked for
        let mut default_builder = GlobSetBuilder::new();
        if !config.include_deps {
            default_builder.add(Glob::new("**/target/**")?);
            default_builder.add(Glob::new("**/vendor/**")?);
            default_builder.add(Glob::new("**/.cargo/**")?);
            default_builder.add(Glob::new("**/.git/**")?);
            default_builder.add(Glob::new("**/node_modules/**")?);
        }
        let default_ignores = default_builder.build()?;

        Ok(Self {
            gitignore,
            custom_globs,
            default_ignores,
        })
    }

    /// Check if a path should be ignored
    pub fn should_ignore(&self, path: &Path, is_dir: bool) -> bool {
        let path_str = path.to_string_lossy();

        if self.default_ignores.is_match(&*path_str) {
            return true;
        }

        if self.custom_globs.is_match(&*path_str) {
            return true;
        }

        if let Some(ref gi) = self.gitignore {
            if gi.matched(path, is_dir).is_ignore() {
                return true;
            }
        }

        false
    }
}
