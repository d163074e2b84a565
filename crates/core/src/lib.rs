//! Blockfold Core Library
//!
//! Identifies foldable regions in Rust and C-family source text without a
//! parser: a line-oriented lexer tracks comments and string literals, and two
//! passes over the same lines produce the region list.
//!
//! # Features
//!
//! - `fn`, `struct`, `impl`, `enum`, `trait` and `mod` blocks, with multi-line
//!   signatures anchored to the line of their opening brace
//! - Every `use` statement in a file consolidated into one import region
//! - Configurable default fold state per region kind
//! - Project scans with gitignore support and parallel identification
//! - Output in JSON, YAML, or a plain/ANSI summary, plus a folded text view
//!
//! # Example
//!
//! ```no_run
//! use blockfold_core::{format_output, FoldScanner, OutputFormat, ScanConfig};
//! use std::path::PathBuf;
//!
//! let config = ScanConfig::new(PathBuf::from("."));
//! let scanner = FoldScanner::new(config).unwrap();
//! let fold_map = scanner.scan().unwrap();
//!
//! let output = format_output(&fold_map, OutputFormat::Json).unwrap();
//! println!("{}", output);
//! ```

pub mod config;
pub mod engine;
pub mod identify;
pub mod models;
pub mod output;

// Re-exports for convenience
pub use config::{ConfigError, FileConfig, IgnoreFilter, ScanConfig, CONFIG_FILE_NAME};
pub use engine::{render_file, FoldScanner, Renderer, ScanError};
pub use identify::{identify_foldable_regions, RegionIdentifier};
pub use models::*;
pub use output::{format_file, format_output, format_summary, FormatError, OutputFormat};
