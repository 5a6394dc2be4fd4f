//! cqlgen: code generators around the CQL compiler.
//!
//! Every subcommand reads one input (a grammar listing or a JSON schema) and
//! writes one generated file to stdout or `--output`.

mod cli;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Command};
use cqlgen_grammar::{Grammar, Inliner, TreeSitterConfig, TreeSitterGenerator};
use cqlgen_interop::{CSharp, Emitter, Java, ObjcFull, ObjcShim, Schema, SqliteExtension};
use tracing::info;

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	setup_tracing(cli.verbose);

	let generated = generate(&cli.command)?;
	write_output(cli.output.as_deref(), &generated)
}

/// Writes `generated` to `path`, or stdout when no path is given.
fn write_output(path: Option<&Path>, generated: &str) -> anyhow::Result<()> {
	match path {
		Some(path) => {
			std::fs::write(path, generated).with_context(|| format!("writing {}", path.display()))?;
			info!(path = %path.display(), "wrote generated source");
		}
		None => print!("{generated}"),
	}
	Ok(())
}

/// Runs the selected generator and returns its output.
fn generate(command: &Command) -> anyhow::Result<String> {
	let out = match command {
		Command::TreeSitter { grammar, config } => {
			let config = match config {
				Some(path) => TreeSitterConfig::load(path)?,
				None => TreeSitterConfig::default(),
			};
			info!(grammar = %grammar.display(), "generating tree-sitter grammar");
			let grammar = Grammar::load(grammar)?;
			TreeSitterGenerator::new(config).generate(&grammar)
		}
		Command::Inline { input, words } => {
			let inliner = match words {
				Some(words) => Inliner::new(words)?,
				None => Inliner::cql()?,
			};
			let text = read_input(input.as_deref())?;
			inliner.inline(&text)?
		}
		Command::Objc { schema, cql_header } => ObjcShim::new(cql_header).emit(&load_schema(schema)?),
		Command::ObjcFull {
			schema,
			header,
			legacy,
			emit_impl,
		} => ObjcFull::new(header)
			.legacy(*legacy)
			.implementation(*emit_impl)
			.emit(&load_schema(schema)?),
		Command::Csharp {
			schema,
			class_name,
			cql_header,
			emit_c,
		} => CSharp::new(class_name)
			.cql_header(cql_header)
			.emit_c(*emit_c)
			.emit(&load_schema(schema)?),
		Command::Java {
			schema,
			package,
			class_name,
			jni_header,
			cql_header,
			emit_c,
		} => Java::new(package, class_name)
			.jni_header(jni_header)
			.cql_header(cql_header)
			.emit_c(*emit_c)
			.emit(&load_schema(schema)?),
		Command::SqliteExt {
			schema,
			cql_header,
			namespace,
			verbosity,
		} => {
			let mut extension = SqliteExtension::new(schema.display().to_string())
				.cql_header(cql_header)
				.verbosity(*verbosity);
			if let Some(namespace) = namespace {
				extension = extension.namespace(namespace);
			}
			extension.emit(&load_schema(schema)?)
		}
	};
	Ok(out)
}

fn is_stdin(path: &Path) -> bool {
	path.as_os_str() == "-"
}

/// Reads `path`, or stdin when it is absent or `-`.
fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
	match path {
		Some(path) if !is_stdin(path) => {
			std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
		}
		_ => {
			let mut text = String::new();
			std::io::stdin().read_to_string(&mut text).context("reading stdin")?;
			Ok(text)
		}
	}
}

fn load_schema(path: &Path) -> anyhow::Result<Schema> {
	let schema = if is_stdin(path) {
		Schema::parse(&read_input(None)?, Path::new("<stdin>"))?
	} else {
		Schema::load(path)?
	};
	info!(
		schema = %path.display(),
		procedures = schema.procedures().count(),
		"loaded schema"
	);
	Ok(schema)
}

fn setup_tracing(verbose: bool) {
	use std::fs::OpenOptions;

	use tracing_subscriber::EnvFilter;
	use tracing_subscriber::prelude::*;

	// CQLGEN_LOG_DIR keeps a log per run next to the generated files
	if let Some(log_dir) = std::env::var("CQLGEN_LOG_DIR").ok().map(PathBuf::from)
		&& std::fs::create_dir_all(&log_dir).is_ok()
	{
		let log_path = log_dir.join(format!("cqlgen.{}.log", std::process::id()));

		if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
			let filter = EnvFilter::try_from_env("CQLGEN_LOG").unwrap_or_else(|_| {
				if verbose {
					EnvFilter::new("cqlgen=trace,debug")
				} else {
					EnvFilter::new("cqlgen=debug,info")
				}
			});

			let file_layer = tracing_subscriber::fmt::layer()
				.with_writer(file)
				.with_ansi(false)
				.with_target(true);

			tracing_subscriber::registry().with(filter).with(file_layer).init();

			tracing::info!(path = ?log_path, "cqlgen tracing initialized");
			return;
		}
	}

	// Generated source goes to stdout, so logs stay on stderr
	tracing_subscriber::fmt()
		.with_writer(std::io::stderr)
		.with_max_level(if verbose {
			tracing::Level::DEBUG
		} else {
			tracing::Level::INFO
		})
		.init();
}
