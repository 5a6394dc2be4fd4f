use std::path::Path;

use pretty_assertions::assert_eq;
use rstest::rstest;

use super::*;
use crate::fixture_schema;

fn inline(json: &str) -> Schema {
	Schema::parse(json, Path::new("inline.json")).unwrap()
}

#[rstest]
#[case::quiet("quiet", Verbosity::Quiet)]
#[case::normal("normal", Verbosity::Normal)]
#[case::very_verbose("very_verbose", Verbosity::VeryVerbose)]
#[case::debug("debug", Verbosity::Debug)]
fn verbosity_parses(#[case] name: &str, #[case] expected: Verbosity) {
	assert_eq!(name.parse::<Verbosity>().unwrap(), expected);
}

#[test]
fn verbosity_names_round_trip() {
	use strum::VariantNames;

	assert_eq!(Verbosity::VARIANTS, ["quiet", "normal", "verbose", "very_verbose", "debug"]);
	for name in Verbosity::VARIANTS {
		assert_eq!(name.parse::<Verbosity>().unwrap().to_string(), *name);
	}
	assert!("loud".parse::<Verbosity>().is_err());
}

#[test]
fn wrappers_sorted_and_suppressed_skipped() {
	let out = SqliteExtension::new("schema.json").emit(&fixture_schema());
	let order: Vec<_> = out.lines().filter_map(|line| line.strip_prefix("// SELECT FUNC ")).collect();
	assert_eq!(
		order,
		[
			"add_numbers(`x` integer!, `y` long, `label` text) long!;",
			"child_rowset() /*void*/ int;",
			"delete_user(`id` long) /*void*/ int;",
			"get_users(`min_id` integer!) (`id` integer!, `name` text, `score` real, `active` bool!);",
			"insert_user(`id` integer!, `name` text!) /*void*/ int;",
			"no_db() /*void*/ int;",
			"one_row(`flag` bool) (`id` integer!, `payload` blob);",
		]
	);
	assert!(!out.contains("private_helper"));
}

#[test]
fn object_outputs_are_skipped_for_the_scalar_result() {
	let out = SqliteExtension::new("schema.json").emit(&fixture_schema());
	assert!(out.contains(concat!(
		"/* object not implemented yet, skipping outtie arg rs */\n",
		"// SELECT FUNC child_rowset() /*void*/ int;\n",
	)));
	assert!(out.contains("  if (rs) cql_object_release(rs);\n"));
	assert!(out.contains("  cql_object_ref       rs                        = NULL;\n"));
}

#[test]
fn inout_text_is_read_and_returned() {
	let out = SqliteExtension::new("schema.json").emit(&fixture_schema());
	assert!(out.contains("  cql_string_ref       label                     = resolve_text_from_sqlite3_value(argv[2]);\n"));
	assert!(out.contains("  add_numbers(\n    x,\n    y,\n    &total,\n    &label\n  );\n"));
	assert!(out.contains("  sqlite3_result_int64(context, total);\n"));
	assert!(out.contains("  if (label) cql_string_release(label);\n"));
}

#[test]
fn database_failure_returns_null_from_scalar() {
	let out = SqliteExtension::new("schema.json").emit(&fixture_schema());
	assert!(out.contains(concat!(
		"  cql_code rc = SQLITE_OK;\n",
		"  sqlite3* db = sqlite3_context_db_handle(context);\n",
		"\n",
		"  // 5. Call the procedure\n",
		"  rc = delete_user(\n",
		"    db,\n",
		"    id\n",
		"  );\n",
	)));
	assert!(out.contains("  if (rc != SQLITE_OK) {\n    sqlite3_result_null(context);\n    goto cleanup;\n  }\n"));
}

#[test]
fn nullable_out_starts_null() {
	let schema = inline(
		r#"{ "general": [{ "name": "peek", "usesDatabase": 0, "args": [
			{ "name": "v", "type": "real", "isNotNull": 0, "binding": "out" },
			{ "name": "o", "type": "object", "isNotNull": 1 }
		] }] }"#,
	);
	let out = SqliteExtension::new("inline.json").verbosity(Verbosity::Quiet).emit(&schema);
	assert!(out.contains("  cql_nullable_double  v                         ; cql_set_null(v);\n"));
	assert!(out.contains("  peek(\n    &v,\n    /* unsupported arg type object*/\n  );\n"));
	assert!(out.contains("  sqlite3_result_cql_nullable_double(context, v);\n"));
	assert!(out.contains("  cql_object_release(o);\n"));
}

#[test]
fn initializer_registers_every_wrapper() {
	let out = SqliteExtension::new("schema.json").namespace("app").emit(&fixture_schema());
	assert!(out.contains(concat!(
		"  aux = cql_rowset_create_aux_init(call_app_get_users, ",
		"\"CREATE TABLE app_get_users([id] integer, [name] text, [score] real, [active] bool, [arg_min_id] integer hidden)\");\n",
		"  rc = register_cql_rowset_tvf(db, aux, \"app_get_users\");\n",
	)));
	assert!(out.contains(
		"  rc = sqlite3_create_function(db, \"app_add_numbers\", 3, SQLITE_UTF8, NULL, call_app_add_numbers, NULL, NULL);\n"
	));
	assert_eq!(out.matches("  if (rc != SQLITE_OK) return rc;\n").count(), 7);
	assert!(out.ends_with("\n  return rc;\n}\n"));
}

#[test]
fn api_init_comment_survives_quiet() {
	let out = SqliteExtension::new("schema.json").verbosity(Verbosity::Quiet).emit(&fixture_schema());
	assert!(out.contains(concat!(
		"#ifdef CQL_SQLITE_EXT\n",
		"  SQLITE_EXTENSION_INIT2(pApi);  // Initialize extension API function pointers\n",
		"#endif\n",
	)));
}
