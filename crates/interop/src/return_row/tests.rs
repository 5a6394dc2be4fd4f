use pretty_assertions::assert_eq;

use super::*;
use crate::fixture_schema;

fn row_for(name: &str) -> ReturnRow {
	let schema = fixture_schema();
	let proc = schema.procedures().find(|proc| proc.name == name).unwrap();
	ReturnRow::new(proc)
}

#[test]
fn out_arguments_put_references_last() {
	let mut out = String::new();
	row_for("add_numbers").write_definitions(&mut out).unwrap();
	assert_eq!(
		out,
		concat!(
			"\n",
			"uint8_t add_numbers_return_meta[] = {\n",
			"  CQL_DATA_TYPE_INT64 | CQL_DATA_TYPE_NOT_NULL, // total\n",
			"  CQL_DATA_TYPE_STRING, // label\n",
			"};\n",
			"\n",
			"typedef struct add_numbers_return_struct {\n",
			"  cql_int64 total;\n",
			"  cql_string_ref label;\n",
			"} add_numbers_return_struct;\n",
			"\n",
			"#define add_numbers_return_struct_refs_count 1\n",
			"#define add_numbers_return_struct_refs_offset cql_offsetof(add_numbers_return_struct, label)\n",
			"\n",
			"static cql_uint16 add_numbers_offsets[] = { 2,\n",
			"  cql_offsetof(add_numbers_return_struct, total),\n",
			"  cql_offsetof(add_numbers_return_struct, label),\n",
			"};\n",
			"\n",
		)
	);
}

#[test]
fn result_set_adds_handle_and_reference() {
	let row = row_for("get_users");
	assert_eq!(row.field_count, 3);
	assert_eq!(row.ref_count, 1);

	let mut out = String::new();
	row.write_definitions(&mut out).unwrap();
	assert!(out.contains("  cql_int32 __rc;\n  cql_int64 __result_long;\n  cql_result_set_ref __result;\n"));
	assert!(out.contains("#define get_users_return_struct_refs_offset cql_offsetof(get_users_return_struct, __result)\n"));
	assert!(out.contains("static cql_uint16 get_users_offsets[] = { 3,\n"));
}

#[test]
fn procedure_without_outputs_has_no_row() {
	let row = row_for("no_db");
	assert!(row.is_empty());

	let mut out = String::new();
	row.write_definitions(&mut out).unwrap();
	assert_eq!(out, "");
}

#[test]
fn fetch_info_lists_reference_block() {
	let mut out = String::new();
	row_for("delete_user").write_fetch_info(&mut out, true, true).unwrap();
	assert_eq!(
		out,
		concat!(
			"\n",
			"  cql_fetch_info info = {\n",
			"    .rc = SQLITE_OK,\n",
			"    .col_offsets = delete_user_offsets,\n",
			"    .data_types = delete_user_return_meta,\n",
			"    .encode_context_index = -1,\n",
			"    .rowsize = sizeof(delete_user_return_struct),\n",
			"  };\n",
		)
	);
}
