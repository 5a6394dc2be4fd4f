use clap::Parser;
use pretty_assertions::assert_eq;

use super::*;

fn parse(args: &[&str]) -> Cli {
	Cli::try_parse_from(std::iter::once("cqlgen").chain(args.iter().copied())).unwrap()
}

#[test]
fn tree_sitter_defaults_to_grammar_listing() {
	let cli = parse(&["tree-sitter"]);
	match cli.command {
		Command::TreeSitter { grammar, config } => {
			assert_eq!(grammar, PathBuf::from("cql_grammar.txt"));
			assert_eq!(config, None);
		}
		other => panic!("unexpected command {other:?}"),
	}
}

#[test]
fn global_flags_follow_subcommand() {
	let cli = parse(&["inline", "-", "-o", "out.txt", "-v"]);
	assert_eq!(cli.output, Some(PathBuf::from("out.txt")));
	assert!(cli.verbose);
	assert!(matches!(cli.command, Command::Inline { input: Some(_), words: None }));
}

#[test]
fn inline_words_are_comma_separated() {
	let cli = parse(&["inline", "--words", "ifdef,endif"]);
	match cli.command {
		Command::Inline { input, words } => {
			assert_eq!(input, None);
			assert_eq!(words, Some(vec!["ifdef".to_string(), "endif".to_string()]));
		}
		other => panic!("unexpected command {other:?}"),
	}

	let cli = parse(&["inline", "--words", "ifdef,"]);
	assert!(matches!(cli.command, Command::Inline { words: Some(ref words), .. } if words == &["ifdef", ""]));
}

#[test]
fn snake_case_flags_are_accepted() {
	let cli = parse(&[
		"java",
		"schema.json",
		"--emit_c",
		"--jni_header",
		"Api.h",
		"--cql_header",
		"db.h",
		"--package",
		"com.acme",
		"--class",
		"Api",
	]);
	match cli.command {
		Command::Java {
			schema,
			package,
			class_name,
			jni_header,
			cql_header,
			emit_c,
		} => {
			assert_eq!(schema, PathBuf::from("schema.json"));
			assert_eq!(package, "com.acme");
			assert_eq!(class_name, "Api");
			assert_eq!(jni_header, "Api.h");
			assert_eq!(cql_header, "db.h");
			assert!(emit_c);
		}
		other => panic!("unexpected command {other:?}"),
	}

	let cli = parse(&["objc-full", "schema.json", "--emit_impl", "--legacy"]);
	assert!(matches!(
		cli.command,
		Command::ObjcFull { emit_impl: true, legacy: true, ref header, .. } if header == "something.h"
	));
}

#[test]
fn objc_requires_cql_header() {
	assert!(Cli::try_parse_from(["cqlgen", "objc", "schema.json"]).is_err());
	let cli = parse(&["objc", "schema.json", "--cql-header", "Sample.h"]);
	assert!(matches!(cli.command, Command::Objc { ref cql_header, .. } if cql_header == "Sample.h"));
}

#[test]
fn sqlite_ext_verbosity() {
	let cli = parse(&["sqlite-ext", "schema.json"]);
	assert!(matches!(
		cli.command,
		Command::SqliteExt { verbosity: Verbosity::VeryVerbose, namespace: None, .. }
	));

	let cli = parse(&["sqlite-ext", "schema.json", "--verbosity", "quiet", "--namespace", "app"]);
	assert!(matches!(
		cli.command,
		Command::SqliteExt { verbosity: Verbosity::Quiet, namespace: Some(ref ns), .. } if ns == "app"
	));

	let err = Cli::try_parse_from(["cqlgen", "sqlite-ext", "schema.json", "--verbosity", "loud"]).unwrap_err();
	assert!(err.to_string().contains("expected one of quiet, normal, verbose, very_verbose, debug"));
}
