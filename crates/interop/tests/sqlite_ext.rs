use std::path::{Path, PathBuf};

use cqlgen_interop::{Emitter, Schema, SqliteExtension, Verbosity};
use pretty_assertions::assert_eq;

fn fixture(name: &str) -> PathBuf {
	Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn extension() -> SqliteExtension {
	SqliteExtension::new("extension.json").cql_header("demo.h").namespace("demo")
}

#[test]
fn very_verbose_extension_matches_golden() {
	let schema = Schema::load(&fixture("extension.json")).unwrap();
	let expected = std::fs::read_to_string(fixture("extension.c")).unwrap();
	assert_eq!(extension().emit(&schema), expected);
}

#[test]
fn quiet_extension() {
	let schema = Schema::load(&fixture("extension.json")).unwrap();
	let out = extension().verbosity(Verbosity::Quiet).emit(&schema);
	insta::assert_snapshot!(out);
}
