//! Tables that steer tree-sitter grammar generation.
//!
//! The defaults describe the CQL grammar. A TOML file may replace any table
//! wholesale; tables it leaves out keep their defaults.

use std::path::Path;

use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;

use crate::{GrammarError, Result};

const LICENSE_HEADER: &str = "/**
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */";

const LINE_BREAK_RULES: &[&str] = &[
	"any_literal",
	"any_stmt",
	"basic_expr",
	"col_attrs",
	"create_index_stmt",
	"create_proc_stmt",
	"create_table_stmt",
	"create_view_stmt",
	"create_virtual_table_stmt",
	"cte_table",
	"data_type_any",
	"data_type_numeric",
	"data_type_with_options",
	"declare_forward_read_cursor_stmt",
	"declare_func_stmt",
	"declare_proc_stmt",
	"declare_select_func_stmt",
	"declare_value_cursor",
	"enforcement_options",
	"explain_target",
	"expr",
	"fetch_values_stmt",
	"fk_def",
	"fk_on_options",
	"from_shape",
	"insert_stmt",
	"insert_stmt_type",
	"math_expr",
	"misc_attr",
	"name",
	"op_stmt",
	"pk_def",
	"raise_expr",
	"rollback_trans_stmt",
	"schema_ad_hoc_migration_stmt",
	"select_core",
	"select_core_list",
	"simple_call",
	"table_or_subquery",
	"trycatch_stmt",
	"unq_def",
	"update_cursor_stmt",
	"update_stmt",
	"upsert_stmt",
	"version_attrs_opt_recreate",
];

const PRECEDENCE: &[(&str, &str)] = &[
	("fk_target_options", "prec.left({})"),
	("join_target", "prec.left({})"),
	("elseif_list", "prec.left({})"),
	("cte_decl", "prec.left(1, {})"),
	("loose_name", "prec.left(100, {})"),
	("basic_expr", "prec.left(1, {})"),
	("math_expr", "prec.left(1, {})"),
	("expr", "prec.left(1, {})"),
];

// Terminals the listing never defines; the boot rules define them instead.
const RENAMES: &[(&str, &str)] = &[
	("integer-literal", "INT_LIT"),
	("long-literal", "LONG_LIT"),
	("real-literal", "REAL_LIT"),
	("sql-blob-literal", "BLOB_LIT"),
	("c-string-literal", "C_STR_LIT"),
	("sql-string-literal", "STR_LIT"),
	("ID!", "ID_BANG"),
	("`quoted_identifier`", "QID"),
	("ID", "ID"),
	("ELSE_IF", "ELSE_IF"),
];

const SUPPRESSED: &[&str] = &["create_table_prefix_opt_temp"];

const DELETED: &[&str] = &[
	"@INCLUDE_quoted-filename",
	"ELSE_IF",
	"cte_tables_macro_ref",
	"end_of_included_file",
	"expr_macro_ref",
	"include_section",
	"include_stmts",
	"non_expr_macro_ref",
	"opt_distinct",
	"opt_stmt_list",
	"program",
	"query_parts_macro_ref",
	"select_core_macro_ref",
	"select_expr_macro_ref",
	"stmt_list",
	"stmt_list_macro_ref",
	"top_level_stmts",
	"`quoted_identifier`",
];

const REFERENCE_OVERRIDES: &[(&str, &str)] = &[
	("opt_stmt_list", "optional($.stmt_list)"),
	("opt_distinct", "optional($.DISTINCT)"),
];

const RULE_OVERRIDES: &[(&str, &str)] = &[(
	"if_stmt",
	"$ => seq($.IF, $.expr, $.THEN, optional($.stmt_list), optional(repeat1($.elseif_item)), optional($.opt_else), $.END, optional($.IF))",
)];

/// Generation tables for [`TreeSitterGenerator`](super::TreeSitterGenerator).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TreeSitterConfig {
	/// Value of the grammar's `name` field.
	pub name: String,
	/// Comment block printed at the top of `grammar.js`.
	pub header: String,
	/// Groups of rules listed under `conflicts`.
	pub conflicts: Vec<Vec<String>>,
	/// Rules whose alternatives are printed one per line.
	pub line_break_rules: IndexSet<String>,
	/// Precedence wrappers keyed by rule; `{}` marks the rule body.
	pub precedence: IndexMap<String, String>,
	/// Listing terminals mapped onto boot rule names.
	pub renames: IndexMap<String, String>,
	/// Productions spliced into their users instead of being emitted.
	pub suppressed: IndexSet<String>,
	/// Rules never emitted, in addition to every rename target.
	pub deleted: IndexSet<String>,
	/// Fixed expressions used wherever the keyed rule is referenced.
	pub reference_overrides: IndexMap<String, String>,
	/// Hand-written definitions replacing generated rules of the same name.
	pub rule_overrides: IndexMap<String, String>,
}

impl Default for TreeSitterConfig {
	fn default() -> Self {
		Self {
			name: "cql".to_string(),
			header: LICENSE_HEADER.to_string(),
			conflicts: vec![vec!["fk_options".to_string()]],
			line_break_rules: owned(LINE_BREAK_RULES),
			precedence: owned_pairs(PRECEDENCE),
			renames: owned_pairs(RENAMES),
			suppressed: owned(SUPPRESSED),
			deleted: owned(DELETED),
			reference_overrides: owned_pairs(REFERENCE_OVERRIDES),
			rule_overrides: owned_pairs(RULE_OVERRIDES),
		}
	}
}

fn owned(items: &[&str]) -> IndexSet<String> {
	items.iter().map(|s| s.to_string()).collect()
}

fn owned_pairs(items: &[(&str, &str)]) -> IndexMap<String, String> {
	items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

impl TreeSitterConfig {
	/// Parses a TOML config; missing tables keep their defaults.
	pub fn from_toml(text: &str, path: &Path) -> Result<Self> {
		toml::from_str(text).map_err(|error| GrammarError::Config {
			path: path.to_path_buf(),
			error,
		})
	}

	/// Reads and parses a TOML config from disk.
	pub fn load(path: &Path) -> Result<Self> {
		let text = std::fs::read_to_string(path).map_err(|error| GrammarError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml(&text, path)
	}

	/// Whether `name` must not appear among the emitted rules.
	pub fn is_deleted(&self, name: &str) -> bool {
		self.deleted.contains(name) || self.renames.values().any(|target| target == name)
	}
}
