//! Generation of a tree-sitter `grammar.js` from the CQL grammar listing.
//!
//! Each production becomes a `name: $ => ...` rule. Quoted keywords become
//! case-insensitive token rules, multi-word keywords become `seq(CI(..))`
//! helper rules, and a fixed block of hand-written boot rules supplies the
//! literals, comments and preprocessor constructs the listing cannot express.

mod config;

use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use tracing::{debug, warn};

pub use self::config::TreeSitterConfig;
use crate::rules::Grammar;

const BOOT_RULES: &str = include_str!("boot_rules.js");

const CI_FUNCTION: &str = "// make string case insensitive
function CI (keyword) {
  return new RegExp(keyword
     .split('')
     .map(letter => `[${letter}${letter.toUpperCase()}]`)
     .join('')
  )
}
";

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\w\-@]+").expect("word pattern"));
static STRING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"^"[^"]+""#).expect("string pattern"));
static QUOTE_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^'[^']+'").expect("quote word pattern"));
static OPERATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"^"[+-=:~/*,<>]+""#).expect("operator pattern"));
static SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("space pattern"));

/// Turns a parsed grammar listing into tree-sitter grammar source.
#[derive(Debug, Clone, Default)]
pub struct TreeSitterGenerator {
	config: TreeSitterConfig,
}

impl TreeSitterGenerator {
	pub fn new(config: TreeSitterConfig) -> Self {
		Self { config }
	}

	pub fn config(&self) -> &TreeSitterConfig {
		&self.config
	}

	/// Renders the complete `grammar.js` for `grammar`.
	pub fn generate(&self, grammar: &Grammar) -> String {
		let mut builder = Builder::new(&self.config, grammar);
		builder.build();

		let rules = builder
			.rules
			.iter()
			.filter(|(name, _)| !self.config.is_deleted(name))
			.map(|(name, body)| format!("{name}: {body}"))
			.chain(builder.tokens.values().cloned())
			.collect::<Vec<_>>()
			.join(",\n    ");

		let mut out = String::new();
		out.push_str(&self.config.header);
		out.push_str("\n\n\n");
		out.push_str("const PREC = {\n};\n\n");
		out.push_str("module.exports = grammar({\n");
		let _ = writeln!(out, "  name: '{}',", self.config.name);
		out.push_str("  extras: $ => [\n");
		out.push_str("     /\\s|\\\\\\r?\\n/,\n");
		out.push_str("     $.comment\n");
		out.push_str("  ],\n");
		out.push_str("  conflicts: $ => [\n");
		for group in &self.config.conflicts {
			let refs = group.iter().map(|r| format!("$.{r}")).collect::<Vec<_>>().join(", ");
			let _ = writeln!(out, "     [{refs}],");
		}
		out.push_str("  ],\n");
		out.push_str("  word: $ => $.ID,\n");
		out.push_str("  rules: {");
		out.push_str(BOOT_RULES);
		let _ = writeln!(out, "    {rules}");
		out.push_str("  }\n});\n\n");
		out.push_str(CI_FUNCTION);
		out.push('\n');
		out
	}
}

/// Working state for one generation pass.
struct Builder<'a> {
	config: &'a TreeSitterConfig,
	grammar: Grammar,
	rules: IndexMap<String, String>,
	tokens: IndexMap<String, String>,
	visited: HashSet<String>,
}

impl<'a> Builder<'a> {
	fn new(config: &'a TreeSitterConfig, grammar: &Grammar) -> Self {
		Self {
			config,
			grammar: grammar.clone(),
			rules: IndexMap::new(),
			tokens: IndexMap::new(),
			visited: HashSet::new(),
		}
	}

	fn build(&mut self) {
		self.splice_suppressed();

		let names: Vec<String> = self.grammar.iter().map(|rule| rule.name.clone()).collect();
		for name in names {
			if !self.visited.insert(name.clone()) {
				continue;
			}
			let Some(rule) = self.grammar.get(&name) else {
				continue;
			};
			let choices = rule.choices.clone();

			let mut alternatives = Vec::with_capacity(choices.len());
			for choice in &choices {
				let seq = self.sequence(choice);
				match seq.len() {
					0 => {}
					1 => alternatives.extend(seq),
					_ => alternatives.push(format!("seq({})", seq.join(", "))),
				}
			}

			let mut body = if alternatives.len() == 1 {
				alternatives.remove(0)
			} else if self.config.line_break_rules.contains(&name) {
				format!("choice({})", alternatives.join(",\n      "))
			} else {
				format!("choice({})", alternatives.join(", "))
			};

			if let Some(wrapper) = self.config.precedence.get(&name) {
				body = wrapper.replacen("{}", &body, 1);
			}

			self.rules.insert(name, format!("$ => {body}"));
		}

		for (name, body) in &self.config.rule_overrides {
			if let Some(slot) = self.rules.get_mut(name) {
				debug!(rule = %name, "replacing generated rule");
				*slot = body.clone();
			}
		}
	}

	/// Replaces each reference to a suppressed production with the tokens of
	/// its first alternative, then drops the production itself.
	fn splice_suppressed(&mut self) {
		let mut replacements: IndexMap<String, Vec<String>> = IndexMap::new();
		for name in &self.config.suppressed {
			match self.grammar.get(name) {
				Some(rule) => {
					replacements.insert(name.clone(), rule.choices.first().cloned().unwrap_or_default());
				}
				None => warn!(rule = %name, "suppressed rule is not defined by the grammar"),
			}
		}

		for rule in self.grammar.iter_mut() {
			for choice in &mut rule.choices {
				if !choice.iter().any(|token| replacements.contains_key(token)) {
					continue;
				}
				*choice = choice
					.iter()
					.flat_map(|token| match replacements.get(token) {
						Some(tokens) => tokens.clone(),
						None => vec![token.clone()],
					})
					.collect();
			}
		}

		for name in replacements.keys() {
			self.grammar.remove(name);
			self.visited.insert(name.clone());
		}
	}

	fn sequence(&mut self, tokens: &[String]) -> Vec<String> {
		tokens
			.iter()
			.map(|token| token.trim())
			.filter(|token| !token.is_empty())
			.map(|token| {
				if SPACE.is_match(token) {
					self.sub_sequence(token)
				} else {
					self.rule_ref(token)
				}
			})
			.collect()
	}

	/// Handles a quoted multi-word keyword such as `"IF NOT EXISTS"`.
	fn sub_sequence(&mut self, token: &str) -> String {
		let words: Vec<&str> = SPACE.split(token.trim_matches('"')).collect();
		let name = words.join("_");
		if self.visited.insert(name.clone()) {
			let parts = words
				.iter()
				.map(|word| format!("CI('{}')", word.to_lowercase()))
				.collect::<Vec<_>>()
				.join(", ");
			self.rules.insert(name.clone(), format!("$ => prec.left(1, seq({parts}))"));
		}
		self.rule_ref(&name)
	}

	fn rule_ref(&mut self, token: &str) -> String {
		if let Some(target) = self.config.renames.get(token) {
			return format!("$.{target}");
		}
		if QUOTE_WORD.is_match(token) || OPERATOR.is_match(token) {
			return token.to_string();
		}
		if STRING.is_match(token) {
			let word = token.trim_matches('"');
			if !WORD.is_match(word) {
				return token.to_string();
			}
			if let Some(target) = self.config.renames.get(word) {
				return format!("$.{target}");
			}
			let name = word.replace('@', "AT_");
			self.tokens
				.entry(name.clone())
				.or_insert_with(|| format!("{name}: $ => CI('{}')", word.to_lowercase()));
			return format!("$.{name}");
		}
		if let Some(fixed) = self.config.reference_overrides.get(token) {
			return fixed.clone();
		}
		if self.grammar.is_optional(token) {
			format!("optional($.{token})")
		} else {
			format!("$.{token}")
		}
	}
}
