//! Inlining of helper productions into the rules that reference them.
//!
//! Some productions exist only so the parser can run an action at a
//! particular shift point. They make the documented grammar harder to read,
//! so the inliner drops their definitions and substitutes their bodies at
//! every whole-word use site.

use std::collections::HashMap;

use regex::{NoExpand, Regex};
use tracing::debug;

use crate::{GrammarError, Result};

/// Productions the CQL grammar defines purely for parser actions.
pub const DEFAULT_INLINE_WORDS: &[&str] = &[
	"create_table_prefix_opt_temp",
	"cte_tables_macro_def",
	"elsedef",
	"endif",
	"expr_macro_def",
	"ifdef",
	"ifndef",
	"query_parts_macro_def",
	"select_core_macro_def",
	"select_expr_macro_def",
	"stmt_list_macro_def",
];

/// Rewrites a grammar listing with a fixed set of productions inlined.
#[derive(Debug, Clone)]
pub struct Inliner {
	any: Regex,
	words: Vec<(String, Regex)>,
}

impl Inliner {
	/// Builds an inliner for the given production names.
	///
	/// Substitution happens in list order, so a body that mentions a word
	/// later in the list is itself expanded. Blank names are ignored.
	pub fn new<I, S>(words: I) -> Result<Self>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let words: Vec<String> = words
			.into_iter()
			.map(|w| w.as_ref().trim().to_string())
			.filter(|w| !w.is_empty())
			.collect();
		let alternation = words.iter().map(|w| regex::escape(w)).collect::<Vec<_>>().join("|");
		let any = Regex::new(&format!(r"\b({alternation})\b"))?;
		let words = words
			.into_iter()
			.map(|word| {
				let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(&word)))?;
				Ok((word, pattern))
			})
			.collect::<Result<Vec<_>>>()?;
		Ok(Self { any, words })
	}

	/// Builds an inliner for [`DEFAULT_INLINE_WORDS`].
	pub fn cql() -> Result<Self> {
		Self::new(DEFAULT_INLINE_WORDS)
	}

	fn is_inlined(&self, name: &str) -> bool {
		self.words.iter().any(|(word, _)| word == name)
	}

	/// Inlines the listing in `text`.
	///
	/// Every output line is a trimmed production; other lines and the
	/// definitions of inlined productions are dropped. Fails only when a
	/// production that actually needs substituting has no definition.
	pub fn inline(&self, text: &str) -> Result<String> {
		let lines: Vec<&str> = text.lines().map(str::trim).collect();

		let bodies: HashMap<&str, &str> = lines
			.iter()
			.filter_map(|line| line.split_once("::="))
			.map(|(key, value)| (key.trim(), value.trim()))
			.collect();

		let mut out = String::new();
		for line in &lines {
			let Some((key, value)) = line.split_once("::=") else {
				continue;
			};
			if self.is_inlined(key.trim()) {
				continue;
			}

			let mut line = line.to_string();
			if self.any.is_match(value.trim()) {
				for (word, pattern) in &self.words {
					if !pattern.is_match(&line) {
						continue;
					}
					let body = *bodies
						.get(word.as_str())
						.ok_or_else(|| GrammarError::UndefinedProduction(word.clone()))?;
					debug!(rule = key.trim(), word = %word, "inlining production");
					line = pattern.replace_all(&line, NoExpand(body)).into_owned();
				}
			}

			out.push_str(&line);
			out.push('\n');
		}
		Ok(out)
	}
}

#[cfg(test)]
mod tests;
