//! Error types for grammar processing.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or transforming a grammar listing.
#[derive(Debug, Error)]
pub enum GrammarError {
	/// Error reading an input file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// The generator configuration file is not valid TOML for the expected shape.
	#[error("invalid tree-sitter config {path}: {error}")]
	Config {
		/// Path to the offending config file.
		path: PathBuf,
		/// The underlying parse error.
		error: toml::de::Error,
	},

	/// A production marked for inlining is referenced but never defined.
	#[error("production '{0}' is referenced for inlining but has no definition")]
	UndefinedProduction(String),

	/// A pattern built from the inline word list failed to compile.
	#[error("invalid inline pattern: {0}")]
	Pattern(#[from] regex::Error),
}

/// Result type for grammar operations.
pub type Result<T> = std::result::Result<T, GrammarError>;
