//! Typed view of the JSON schema description printed by the CQL compiler.
//!
//! Only the procedure sections are modelled; tables, views, triggers and the
//! rest of the document are accepted and ignored.

use std::path::Path;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use strum::{Display, IntoStaticStr};

use crate::{InteropError, Result};

/// The procedure sections of a CQL JSON schema.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Schema {
	pub queries: Vec<Procedure>,
	pub deletes: Vec<Procedure>,
	pub inserts: Vec<Procedure>,
	pub general_inserts: Vec<Procedure>,
	pub updates: Vec<Procedure>,
	pub general: Vec<Procedure>,
}

impl Schema {
	/// Parses schema JSON; `path` is only used for error reporting.
	pub fn parse(text: &str, path: &Path) -> Result<Self> {
		serde_json::from_str(text).map_err(|error| InteropError::Json {
			path: path.to_path_buf(),
			error,
		})
	}

	pub fn load(path: &Path) -> Result<Self> {
		let text = std::fs::read_to_string(path).map_err(|error| InteropError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::parse(&text, path)
	}

	/// Every procedure, section by section: queries, deletes, inserts,
	/// general inserts, updates, then general.
	pub fn procedures(&self) -> impl Iterator<Item = &Procedure> {
		self.queries
			.iter()
			.chain(&self.deletes)
			.chain(&self.inserts)
			.chain(&self.general_inserts)
			.chain(&self.updates)
			.chain(&self.general)
	}
}

/// A stored procedure the compiler generated C entry points for.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Procedure {
	pub name: String,
	#[serde(default)]
	pub args: Vec<Argument>,
	/// Result set columns, present only when the procedure produces rows.
	#[serde(default)]
	pub projection: Option<Vec<Column>>,
	#[serde(default)]
	pub attributes: Vec<Attribute>,
	#[serde(default, rename = "usesDatabase", deserialize_with = "optional_flag")]
	declared_uses_database: Option<bool>,
	/// The result set holds exactly one row produced by `OUT`.
	#[serde(default, deserialize_with = "flag")]
	pub has_out_result: bool,
}

impl Procedure {
	/// Query sections omit `usesDatabase`; they always take a database.
	pub fn uses_database(&self) -> bool {
		self.declared_uses_database.unwrap_or(true)
	}

	pub fn attribute(&self, name: &str) -> Option<&Value> {
		self.attributes.iter().find(|attr| attr.name == name).map(|attr| &attr.value)
	}

	pub fn has_attribute(&self, name: &str) -> bool {
		self.attribute(name).is_some()
	}

	pub fn is_private(&self) -> bool {
		self.has_attribute("cql:private")
	}

	/// Private procedures and those whose result set accessors were
	/// suppressed get no wrappers.
	pub fn is_suppressed(&self) -> bool {
		self.is_private()
			|| self.has_attribute("cql:suppress_result_set")
			|| self.has_attribute("cql:suppress_getters")
	}

	pub fn has_identity_columns(&self) -> bool {
		self.has_attribute("cql:identity")
	}

	pub fn columns(&self) -> &[Column] {
		self.projection.as_deref().unwrap_or_default()
	}

	/// Arguments the caller supplies: `in` and `inout`.
	pub fn in_args(&self) -> impl Iterator<Item = &Argument> {
		self.args.iter().filter(|arg| arg.binding.is_input())
	}

	/// Arguments the procedure writes back: `out` and `inout`.
	pub fn out_args(&self) -> impl Iterator<Item = &Argument> {
		self.args.iter().filter(|arg| arg.binding.is_output())
	}

	pub fn has_out_args(&self) -> bool {
		self.out_args().next().is_some()
	}

	/// Whether `column` is stored encoded. `cql:vault_sensitive` is either
	/// `1`/`true` for every sensitive column or a list of column names.
	pub fn is_vaulted(&self, column: &Column) -> bool {
		if !column.is_sensitive {
			return false;
		}
		match self.attribute("cql:vault_sensitive") {
			Some(Value::Array(names)) => names.iter().any(|name| name.as_str() == Some(column.name.as_str())),
			Some(Value::Bool(all)) => *all,
			Some(value) => value.as_i64() == Some(1),
			None => false,
		}
	}
}

/// A procedure parameter.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Argument {
	pub name: String,
	#[serde(rename = "type")]
	pub ty: CqlType,
	#[serde(deserialize_with = "flag")]
	pub is_not_null: bool,
	#[serde(default)]
	pub binding: Binding,
	/// Object kind, e.g. `get_users SET` for a child result set.
	#[serde(default)]
	pub kind: Option<String>,
	#[serde(default, deserialize_with = "flag")]
	pub is_sensitive: bool,
}

impl Argument {
	/// The procedure named by a `<proc> SET` object kind.
	pub fn result_set_kind(&self) -> Option<&str> {
		match self.ty {
			CqlType::Object => self.kind.as_deref()?.strip_suffix(" SET"),
			_ => None,
		}
	}
}

/// A projected result set column.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
	pub name: String,
	#[serde(rename = "type")]
	pub ty: CqlType,
	#[serde(deserialize_with = "flag")]
	pub is_not_null: bool,
	#[serde(default)]
	pub kind: Option<String>,
	#[serde(default, deserialize_with = "flag")]
	pub is_sensitive: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Attribute {
	pub name: String,
	#[serde(default)]
	pub value: Value,
}

/// Direction of a procedure argument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Display, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Binding {
	#[default]
	In,
	Out,
	InOut,
}

impl Binding {
	pub fn is_input(self) -> bool {
		matches!(self, Self::In | Self::InOut)
	}

	pub fn is_output(self) -> bool {
		matches!(self, Self::Out | Self::InOut)
	}
}

/// The core CQL data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Display, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CqlType {
	Bool,
	Integer,
	Long,
	Real,
	Object,
	Blob,
	Text,
}

impl CqlType {
	/// Reference types are passed as retained pointers rather than values.
	pub fn is_ref(self) -> bool {
		matches!(self, Self::Object | Self::Blob | Self::Text)
	}

	/// C storage type used by the CQL runtime.
	pub fn c_type(self) -> &'static str {
		match self {
			Self::Bool => "cql_bool",
			Self::Integer => "cql_int32",
			Self::Long => "cql_int64",
			Self::Real => "cql_double",
			Self::Object => "cql_object_ref",
			Self::Blob => "cql_blob_ref",
			Self::Text => "cql_string_ref",
		}
	}

	/// C storage for a nullable value; reference types carry their own null.
	pub fn nullable_c_type(self) -> &'static str {
		match self {
			Self::Bool => "cql_nullable_bool",
			Self::Integer => "cql_nullable_int32",
			Self::Long => "cql_nullable_int64",
			Self::Real => "cql_nullable_double",
			other => other.c_type(),
		}
	}

	/// Runtime data type code, without the not-null bit.
	pub fn data_type(self) -> &'static str {
		match self {
			Self::Bool => "CQL_DATA_TYPE_BOOL",
			Self::Integer => "CQL_DATA_TYPE_INT32",
			Self::Long => "CQL_DATA_TYPE_INT64",
			Self::Real => "CQL_DATA_TYPE_DOUBLE",
			Self::Object => "CQL_DATA_TYPE_OBJECT",
			Self::Blob => "CQL_DATA_TYPE_BLOB",
			Self::Text => "CQL_DATA_TYPE_STRING",
		}
	}
}

/// Schema flags are written as `0`/`1` but `true`/`false` is accepted too.
fn flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Flag {
		Bool(bool),
		Int(i64),
	}

	Ok(match Flag::deserialize(deserializer)? {
		Flag::Bool(value) => value,
		Flag::Int(value) => value != 0,
	})
}

fn optional_flag<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
	D: Deserializer<'de>,
{
	flag(deserializer).map(Some)
}

#[cfg(test)]
mod tests;
