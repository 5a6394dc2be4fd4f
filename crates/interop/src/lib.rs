//! Interop glue generated from the CQL JSON schema.
//!
//! The CQL compiler describes every procedure it compiled (arguments,
//! projected columns, attributes) in a JSON document. Each emitter here
//! reads that [`Schema`] and prints the wrappers another runtime needs to
//! call those procedures:
//!
//! * [`ObjcShim`] and [`ObjcFull`] for Objective-C,
//! * [`CSharp`] for .NET, as managed C# or the C half of the bridge,
//! * [`Java`] for the JVM, as managed Java or the JNI C half,
//! * [`SqliteExtension`] for exposing procedures as SQLite functions.

use std::fmt;

mod csharp;
mod error;
mod java;
mod objc;
mod objc_full;
mod return_row;
pub mod schema;
mod sqlite_ext;

pub use csharp::CSharp;
pub use error::{InteropError, Result};
pub use java::Java;
pub use objc::ObjcShim;
pub use objc_full::ObjcFull;
pub use schema::Schema;
pub use sqlite_ext::{SqliteExtension, Verbosity};

/// Signed-source marker placed at the top of generated Objective-C.
const GENERATED_MARKER: &str = "// @generated SignedSource<<deadbeef8badf00ddefec8edfacefeed>>";

/// Licence block placed at the top of generated C, C# and Java.
const LICENSE_COMMENT: &str = "/*
* Copyright (c) Meta Platforms, Inc. and affiliates.
*
* This source code is licensed under the MIT license found in the
* LICENSE file in the root directory of this source tree.
*/
";

/// The `CQLResultSet` accessor for a field, e.g. `getNullableLong`.
/// Reference types have no separate nullable accessor.
pub(crate) fn result_set_getter(ty: schema::CqlType, is_not_null: bool) -> String {
	use schema::CqlType;

	let base = match ty {
		CqlType::Bool => "Boolean",
		CqlType::Integer => "Integer",
		CqlType::Long => "Long",
		CqlType::Real => "Double",
		CqlType::Object => "ChildResultSet",
		CqlType::Blob => "Blob",
		CqlType::Text => "String",
	};
	let nullable = if is_not_null || ty.is_ref() { "" } else { "Nullable" };
	format!("get{nullable}{base}")
}

/// A code generator driven by a parsed schema.
pub trait Emitter {
	/// Writes the generated source for `schema` into `out`.
	fn write_to(&self, schema: &Schema, out: &mut dyn fmt::Write) -> fmt::Result;

	/// Renders the generated source into a new string.
	fn emit(&self, schema: &Schema) -> String {
		let mut out = String::new();
		// Writing into a String never fails.
		let _ = self.write_to(schema, &mut out);
		out
	}
}

#[cfg(test)]
pub(crate) fn fixture_schema() -> Schema {
	Schema::parse(include_str!("../tests/fixtures/schema.json"), std::path::Path::new("schema.json")).unwrap()
}
