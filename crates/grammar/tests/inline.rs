use std::path::Path;

use cqlgen_grammar::Inliner;
use insta::assert_snapshot;

#[test]
fn inlines_parser_action_productions() {
	let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/inline_grammar.txt");
	let listing = std::fs::read_to_string(path).unwrap();
	let output = Inliner::cql().unwrap().inline(&listing).unwrap();
	assert_snapshot!("inline_fixture", output);
}
