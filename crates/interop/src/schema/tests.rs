use std::path::Path;

use pretty_assertions::assert_eq;
use rstest::rstest;

use super::*;
use crate::fixture_schema;

fn procedure(json: &str) -> Procedure {
	serde_json::from_str(json).unwrap()
}

#[test]
fn procedures_follow_section_order() {
	let schema = fixture_schema();
	let names: Vec<&str> = schema.procedures().map(|proc| proc.name.as_str()).collect();
	assert_eq!(names, vec![
		"get_users",
		"delete_user",
		"insert_user",
		"add_numbers",
		"one_row",
		"child_rowset",
		"private_helper",
		"no_db",
	]);
}

#[test]
fn missing_sections_default_to_empty() {
	let schema = Schema::parse(r#"{ "tables": [], "general": [] }"#, Path::new("mini.json")).unwrap();
	assert_eq!(schema.procedures().count(), 0);
}

#[test]
fn query_without_flag_uses_database() {
	let schema = fixture_schema();
	let by_name = |name: &str| schema.procedures().find(|proc| proc.name == name).unwrap().uses_database();
	assert!(by_name("get_users"));
	assert!(by_name("delete_user"));
	assert!(!by_name("add_numbers"));
}

#[rstest]
#[case::private("cql:private", true)]
#[case::result_set("cql:suppress_result_set", true)]
#[case::getters("cql:suppress_getters", true)]
#[case::identity("cql:identity", false)]
fn suppression_attributes(#[case] attribute: &str, #[case] suppressed: bool) {
	let proc = procedure(&format!(
		r#"{{ "name": "p", "args": [], "attributes": [{{ "name": "{attribute}", "value": 1 }}] }}"#
	));
	assert_eq!(proc.is_suppressed(), suppressed);
}

#[test]
fn bindings_split_inputs_and_outputs() {
	let schema = fixture_schema();
	let proc = schema.general.iter().find(|proc| proc.name == "add_numbers").unwrap();
	let inputs: Vec<&str> = proc.in_args().map(|arg| arg.name.as_str()).collect();
	let outputs: Vec<&str> = proc.out_args().map(|arg| arg.name.as_str()).collect();
	assert_eq!(inputs, vec!["x", "y", "label"]);
	assert_eq!(outputs, vec!["total", "label"]);
}

#[test]
fn result_set_kind_names_the_producer() {
	let schema = fixture_schema();
	let proc = schema.general.iter().find(|proc| proc.name == "child_rowset").unwrap();
	assert_eq!(proc.args[0].result_set_kind(), Some("get_users"));
}

#[test]
fn vault_by_name_requires_sensitive_column() {
	let schema = fixture_schema();
	let proc = &schema.queries[0];
	let vaulted: Vec<&str> = proc
		.columns()
		.iter()
		.filter(|column| proc.is_vaulted(column))
		.map(|column| column.name.as_str())
		.collect();
	assert_eq!(vaulted, vec!["name"]);
}

#[rstest]
#[case::one("1", true)]
#[case::true_("true", true)]
#[case::zero("0", false)]
#[case::false_("false", false)]
fn vault_all_covers_every_sensitive_column(#[case] value: &str, #[case] vaulted: bool) {
	let proc = procedure(&format!(
		r#"{{
			"name": "p",
			"projection": [
				{{ "name": "a", "type": "text", "isNotNull": 1, "isSensitive": 1 }},
				{{ "name": "b", "type": "text", "isNotNull": 1 }}
			],
			"attributes": [{{ "name": "cql:vault_sensitive", "value": {value} }}]
		}}"#
	));
	let columns = proc.columns();
	assert_eq!(proc.is_vaulted(&columns[0]), vaulted);
	assert!(!proc.is_vaulted(&columns[1]));
}

#[test]
fn type_and_binding_names() {
	assert_eq!(CqlType::Text.to_string(), "text");
	assert_eq!(<&str>::from(CqlType::Integer), "integer");
	assert_eq!(Binding::InOut.to_string(), "inout");
	assert_eq!(<&str>::from(Binding::Out), "out");
}

#[test]
fn flags_accept_booleans() {
	let proc = procedure(r#"{ "name": "p", "usesDatabase": false, "hasOutResult": true }"#);
	assert!(!proc.uses_database());
	assert!(proc.has_out_result);
}

#[test]
fn unknown_type_is_rejected() {
	let err = Schema::parse(
		r#"{ "queries": [{ "name": "p", "args": [{ "name": "a", "type": "date", "isNotNull": 1 }] }] }"#,
		Path::new("bad.json"),
	)
	.unwrap_err();
	assert!(matches!(err, InteropError::Json { .. }));
	assert!(err.to_string().contains("bad.json"));
}

#[test]
fn stdin_errors_name_stdin() {
	let err = Schema::parse("{ \"queries\": [", Path::new("<stdin>")).unwrap_err();
	assert!(matches!(err, InteropError::Json { .. }));
	assert!(err.to_string().contains("<stdin>"));
}
