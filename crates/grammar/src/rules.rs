//! Parsing of the `name ::= alternative | alternative` grammar listing.

use std::path::Path;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::{GrammarError, Result};

static RULE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(.*)\s*::=\s*(.*)").expect("rule pattern"));
static CHOICE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+\|\s+").expect("choice pattern"));
static NIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^/\*\s*nil\s*\*/").expect("nil pattern"));
static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""[^"]+"|'.?'|[\w\-@]+"#).expect("token pattern"));

/// One production of the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
	/// Left-hand side of the production.
	pub name: String,
	/// Non-empty alternatives, each a sequence of raw tokens.
	///
	/// Quoted keywords keep their double quotes and punctuation keeps its
	/// single quotes, exactly as written in the listing.
	pub choices: Vec<Vec<String>>,
	/// Whether one of the alternatives was `/* nil */`.
	pub optional: bool,
}

/// All productions of a listing in definition order.
#[derive(Debug, Clone, Default)]
pub struct Grammar {
	rules: IndexMap<String, Rule>,
}

impl Grammar {
	/// Parses a grammar listing.
	///
	/// Lines without `::=` are ignored. A production defined twice keeps its
	/// first position and its last definition.
	pub fn parse(text: &str) -> Self {
		let mut rules: IndexMap<String, Rule> = IndexMap::new();

		for caps in RULE.captures_iter(text) {
			let name = caps[1].trim().to_string();
			let mut rule = Rule {
				name: name.clone(),
				choices: Vec::new(),
				optional: false,
			};

			for choice in CHOICE.split(&caps[2]) {
				if NIL.is_match(choice) {
					rule.optional = true;
					continue;
				}
				let seq: Vec<String> = TOKEN.find_iter(choice).map(|m| m.as_str().trim().to_string()).collect();
				if !seq.is_empty() {
					rule.choices.push(seq);
				}
			}

			if let Some(previous) = rules.get(&name) {
				rule.optional |= previous.optional;
			}
			rules.insert(name, rule);
		}

		Self { rules }
	}

	/// Reads and parses a grammar listing from disk.
	pub fn load(path: &Path) -> Result<Self> {
		let text = std::fs::read_to_string(path).map_err(|error| GrammarError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Ok(Self::parse(&text))
	}

	pub fn get(&self, name: &str) -> Option<&Rule> {
		self.rules.get(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.rules.contains_key(name)
	}

	/// Whether `name` is a production that may match nothing.
	pub fn is_optional(&self, name: &str) -> bool {
		self.rules.get(name).is_some_and(|rule| rule.optional)
	}

	/// Removes a production, keeping the order of the others.
	pub fn remove(&mut self, name: &str) -> Option<Rule> {
		self.rules.shift_remove(name)
	}

	pub fn iter(&self) -> impl Iterator<Item = &Rule> {
		self.rules.values()
	}

	pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Rule> {
		self.rules.values_mut()
	}

	pub fn len(&self) -> usize {
		self.rules.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rules.is_empty()
	}
}
