use pretty_assertions::assert_eq;

use super::*;

#[test]
fn drops_inlined_definitions_and_non_rules() {
	let inliner = Inliner::new(["helper"]).unwrap();
	let out = inliner.inline("Title\n\nhelper ::= \"X\"\nkeep ::= a b\n").unwrap();
	assert_eq!(out, "keep ::= a b\n");
}

#[test]
fn substitutes_whole_words_only() {
	let inliner = Inliner::new(["temp"]).unwrap();
	let out = inliner.inline("temp ::= \"TEMP\"\nt ::= temp temp_table attempt\n").unwrap();
	assert_eq!(out, "t ::= \"TEMP\" temp_table attempt\n");
}

#[test]
fn replacement_is_literal() {
	let inliner = Inliner::new(["money"]).unwrap();
	let out = inliner.inline("money ::= \"$1\" '$'\nprice ::= money\n").unwrap();
	assert_eq!(out, "price ::= \"$1\" '$'\n");
}

#[test]
fn later_words_expand_inside_earlier_bodies() {
	let inliner = Inliner::new(["outer", "inner"]).unwrap();
	let out = inliner.inline("outer ::= inner \"B\"\ninner ::= \"A\"\nr ::= outer\n").unwrap();
	assert_eq!(out, "r ::= \"A\" \"B\"\n");
}

#[test]
fn blank_words_are_ignored() {
	let inliner = Inliner::new(["b", "", " "]).unwrap();
	let out = inliner.inline("a ::= b\nb ::= \"X\"\n").unwrap();
	assert_eq!(out, "a ::= \"X\"\n");
}

#[test]
fn only_blank_words_leave_listing_unchanged() {
	let inliner = Inliner::new([""]).unwrap();
	let out = inliner.inline("a ::= b\nb ::= \"X\"\n").unwrap();
	assert_eq!(out, "a ::= b\nb ::= \"X\"\n");
}

#[test]
fn unused_undefined_words_are_fine() {
	let inliner = Inliner::cql().unwrap();
	let out = inliner.inline("a ::= b\n").unwrap();
	assert_eq!(out, "a ::= b\n");
}

#[test]
fn undefined_word_in_use_is_an_error() {
	let inliner = Inliner::new(["ghost"]).unwrap();
	let err = inliner.inline("a ::= ghost\n").unwrap_err();
	assert!(matches!(err, GrammarError::UndefinedProduction(ref name) if name == "ghost"));
}

#[test]
fn trims_surrounding_whitespace() {
	let inliner = Inliner::cql().unwrap();
	let out = inliner.inline("   a ::=   b | c   \n").unwrap();
	assert_eq!(out, "a ::=   b | c\n");
}
