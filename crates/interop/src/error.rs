//! Error types for schema loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a CQL JSON schema.
#[derive(Debug, Error)]
pub enum InteropError {
	/// Error reading the schema file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// The schema is not valid JSON or does not have the expected shape.
	#[error("invalid CQL schema {path}: {error}")]
	Json {
		/// Path to the offending schema, or `<stdin>`.
		path: PathBuf,
		/// The underlying parse error.
		error: serde_json::Error,
	},
}

/// Result type for interop operations.
pub type Result<T> = std::result::Result<T, InteropError>;
