//! Post-processing for the CQL grammar listing.
//!
//! The CQL compiler can print its grammar as a plain text listing of
//! `name ::= alternative | alternative` productions. This crate turns that
//! listing into two derived artifacts:
//!
//! * [`inline::Inliner`] rewrites the listing with helper productions
//!   substituted into the rules that use them, for documentation.
//! * [`tree_sitter::TreeSitterGenerator`] emits a `grammar.js` definition
//!   consumed by tree-sitter for editor highlighting.

mod error;
pub mod inline;
pub mod rules;
pub mod tree_sitter;

pub use error::{GrammarError, Result};
pub use inline::{DEFAULT_INLINE_WORDS, Inliner};
pub use rules::{Grammar, Rule};
pub use tree_sitter::{TreeSitterConfig, TreeSitterGenerator};
