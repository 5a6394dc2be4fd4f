//! CLI schema for the cqlgen binary.
//!
//! Long flags are kebab-case; the snake_case spellings accepted by the older
//! generator scripts (`--cql_header`, `--emit_c`, ...) still parse as aliases.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cqlgen_interop::Verbosity;
use strum::VariantNames;

#[derive(Parser, Debug)]
#[command(name = "cqlgen")]
#[command(about = "Generators for the CQL grammar listing and JSON schema")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Write the generated source here instead of stdout
	#[arg(short, long, global = true, value_name = "PATH")]
	pub output: Option<PathBuf>,

	/// Verbose logging
	#[arg(short, long, global = true)]
	pub verbose: bool,

	#[command(subcommand)]
	pub command: Command,
}

/// Available generators.
#[derive(Subcommand, Debug)]
pub enum Command {
	/// Generate a tree-sitter grammar.js from the grammar listing
	TreeSitter {
		/// Grammar listing printed by the CQL compiler
		#[arg(default_value = "cql_grammar.txt")]
		grammar: PathBuf,

		/// TOML file replacing the built-in generation tables
		#[arg(long, value_name = "PATH")]
		config: Option<PathBuf>,
	},

	/// Inline helper productions into the grammar listing
	Inline {
		/// Grammar listing; reads stdin when omitted or `-`
		input: Option<PathBuf>,

		/// Productions to inline (comma-separated), replacing the default set
		#[arg(long, value_delimiter = ',')]
		words: Option<Vec<String>>,
	},

	/// Objective-C shim header over the C result set accessors
	Objc {
		/// CQL JSON schema; `-` reads stdin
		schema: PathBuf,

		/// CQL-generated C header to import
		#[arg(long = "cql-header", alias = "cql_header", value_name = "HEADER")]
		cql_header: String,
	},

	/// Full Objective-C classes, header or implementation
	ObjcFull {
		/// CQL JSON schema; `-` reads stdin
		schema: PathBuf,

		/// Header imported by the generated file
		#[arg(long, default_value = "something.h", value_name = "HEADER")]
		header: String,

		/// Declare instance variables explicitly
		#[arg(long)]
		legacy: bool,

		/// Emit the .m implementation instead of the header
		#[arg(long = "emit-impl", alias = "emit_impl")]
		emit_impl: bool,
	},

	/// C# bindings, managed or the C half
	Csharp {
		/// CQL JSON schema; `-` reads stdin
		schema: PathBuf,

		/// Name of the generated class
		#[arg(long = "class", default_value = "default_class", value_name = "NAME")]
		class_name: String,

		/// CQL-generated C header included by the C half
		#[arg(long = "cql-header", alias = "cql_header", default_value = "something.h", value_name = "HEADER")]
		cql_header: String,

		/// Emit the C half instead of C#
		#[arg(long = "emit-c", alias = "emit_c")]
		emit_c: bool,
	},

	/// Java bindings, managed or the JNI C half
	Java {
		/// CQL JSON schema; `-` reads stdin
		schema: PathBuf,

		/// Java package of the generated class
		#[arg(long, default_value = "default_package", value_name = "NAME")]
		package: String,

		/// Name of the generated class
		#[arg(long = "class", default_value = "default_class", value_name = "NAME")]
		class_name: String,

		/// Header declaring the JNI natives
		#[arg(
			long = "jni-header",
			alias = "jni_header",
			default_value = "something_somethingJNI.h",
			value_name = "HEADER"
		)]
		jni_header: String,

		/// CQL-generated C header included by the C half
		#[arg(long = "cql-header", alias = "cql_header", default_value = "something.h", value_name = "HEADER")]
		cql_header: String,

		/// Emit the JNI C half instead of Java
		#[arg(long = "emit-c", alias = "emit_c")]
		emit_c: bool,
	},

	/// SQLite extension exposing procedures as SQL functions
	SqliteExt {
		/// CQL JSON schema; `-` reads stdin
		schema: PathBuf,

		/// CQL-generated C header to include
		#[arg(long = "cql-header", alias = "cql_header", default_value = "cqlrt.h", value_name = "HEADER")]
		cql_header: String,

		/// Prefix for every SQL function name
		#[arg(long, value_name = "NAME")]
		namespace: Option<String>,

		/// Comment level: quiet, normal, verbose, very_verbose or debug
		#[arg(long, default_value = "very_verbose", value_parser = parse_verbosity)]
		verbosity: Verbosity,
	},
}

fn parse_verbosity(value: &str) -> Result<Verbosity, String> {
	value
		.parse()
		.map_err(|_| format!("expected one of {}", Verbosity::VARIANTS.join(", ")))
}

#[cfg(test)]
mod tests;
