//! Objective-C shim header over the C result set accessors.
//!
//! Every procedure with a projection gets an opaque `CGS_<proc>` class that is
//! toll-free bridged to its `<proc>_result_set_ref`, plus `static inline`
//! getters that box values into Foundation types.

use std::fmt::{self, Write};

use tracing::debug;

use crate::schema::{Column, CqlType, Procedure, Schema};
use crate::{Emitter, GENERATED_MARKER};

const PREFIX: &str = "CGS_";

/// Emits the inline Objective-C shim header.
#[derive(Debug, Clone)]
pub struct ObjcShim {
	cql_header: String,
}

impl ObjcShim {
	/// `cql_header` is the CQL-generated C header the shim imports.
	pub fn new(cql_header: impl Into<String>) -> Self {
		Self {
			cql_header: cql_header.into(),
		}
	}
}

impl Emitter for ObjcShim {
	fn write_to(&self, schema: &Schema, out: &mut dyn Write) -> fmt::Result {
		writeln!(out, "{GENERATED_MARKER}")?;
		writeln!(out, "#pragma once")?;
		writeln!(out)?;
		writeln!(out, "#import <Foundation/Foundation.h>")?;
		writeln!(out)?;
		writeln!(out, "#import <{}>", self.cql_header)?;
		writeln!(out)?;
		writeln!(out, "NS_ASSUME_NONNULL_BEGIN")?;

		for proc in schema.procedures() {
			if proc.is_private() {
				debug!(procedure = %proc.name, "skipping private procedure");
				continue;
			}
			if proc.projection.is_some() {
				write_procedure(out, proc)?;
			}
		}

		writeln!(out)?;
		writeln!(out, "NS_ASSUME_NONNULL_END")
	}
}

fn write_procedure(out: &mut dyn Write, proc: &Procedure) -> fmt::Result {
	let name = &proc.name;
	let class = format!("{PREFIX}{name}");

	writeln!(out, "@class {class};")?;
	writeln!(out)?;
	writeln!(out, "#ifdef CQL_EMIT_OBJC_INTERFACES")?;
	writeln!(out, "@interface {class}")?;
	writeln!(out, "@end")?;
	writeln!(out, "#endif")?;
	writeln!(out)?;

	writeln!(out, "static inline {class} *{class}_from_{name}({name}_result_set_ref resultSet)")?;
	writeln!(out, "{{")?;
	writeln!(out, "  return (__bridge {class} *)resultSet;")?;
	writeln!(out, "}}")?;
	writeln!(out)?;
	writeln!(out, "static inline {name}_result_set_ref {name}_from_{class}({class} *resultSet)")?;
	writeln!(out, "{{")?;
	writeln!(out, "  return (__bridge {name}_result_set_ref)resultSet;")?;
	writeln!(out, "}}")?;
	writeln!(out)?;

	let (row_arg, row_param) = if proc.has_out_result { ("", "") } else { (", row", ", cql_int32 row") };

	for column in proc.columns() {
		write_getter(out, name, &class, column, row_arg, row_param)?;
	}

	writeln!(out, "static inline cql_int32 {class}_result_count({class} *resultSet)")?;
	writeln!(out, "{{")?;
	writeln!(out, "  return {name}_result_count({name}_from_{class}(resultSet));")?;
	writeln!(out, "}}")?;

	if proc.has_attribute("cql:generate_copy") {
		writeln!(
			out,
			"static inline {class} *{class}_copy({class} *resultSet, cql_int32 from, cql_int32 count)"
		)?;
		writeln!(out, "{{")?;
		writeln!(out, "  {name}_result_set_ref copy;")?;
		writeln!(out, "  {name}_copy({name}_from_{class}(resultSet), &copy, from, count);")?;
		writeln!(out, "  cql_result_set_note_ownership_transferred(copy);")?;
		writeln!(out, "  return (__bridge_transfer {class} *)copy;")?;
		writeln!(out, "}}")?;
	}

	writeln!(out, "static inline NSUInteger {class}_row_hash({class} *resultSet{row_param})")?;
	writeln!(out, "{{")?;
	writeln!(out, "  return {name}_row_hash({name}_from_{class}(resultSet){row_arg});")?;
	writeln!(out, "}}")?;

	let (r1_arg, r2_arg, r1_param, r2_param) = if proc.has_out_result {
		("", "", "", "")
	} else {
		(", row1", ", row2", ", cql_int32 row1", ", cql_int32 row2")
	};
	writeln!(
		out,
		"static inline BOOL {class}_row_equal({class} *resultSet1{r1_param}, {class} *resultSet2{r2_param})"
	)?;
	writeln!(out, "{{")?;
	writeln!(
		out,
		"  return {name}_row_equal({name}_from_{class}(resultSet1){r1_arg}, {name}_from_{class}(resultSet2){r2_arg});"
	)?;
	writeln!(out, "}}")
}

fn write_getter(
	out: &mut dyn Write,
	name: &str,
	class: &str,
	column: &Column,
	row_arg: &str,
	row_param: &str,
) -> fmt::Result {
	let c_name = &column.name;
	writeln!(
		out,
		"static inline {} {class}_get_{c_name}({class} *resultSet{row_param})",
		objc_type(column)
	)?;
	writeln!(out, "{{")?;
	writeln!(out, "  {name}_result_set_ref cResultSet = {name}_from_{class}(resultSet);")?;

	let getter = format!("{name}_get_{c_name}");
	match (column.ty, column.is_not_null) {
		(ty, _) if ty.is_ref() => {
			writeln!(out, "  return (__bridge {}){getter}(cResultSet{row_arg});", bridge_type(ty))?;
		}
		(CqlType::Bool, true) => writeln!(out, "  return {getter}(cResultSet{row_arg}) ? YES : NO;")?,
		(_, true) => writeln!(out, "  return {getter}(cResultSet{row_arg});")?,
		// Nullable values are read through the split is_null/value accessors.
		(_, false) => writeln!(
			out,
			"  return {getter}_is_null(cResultSet{row_arg}) ? nil : @({getter}_value(cResultSet{row_arg}));"
		)?,
	}

	writeln!(out, "}}")?;
	writeln!(out)
}

fn objc_type(column: &Column) -> &'static str {
	match (column.ty, column.is_not_null) {
		(CqlType::Bool, true) => "cql_bool",
		(CqlType::Integer, true) => "cql_int32",
		(CqlType::Long, true) => "cql_int64",
		(CqlType::Real, true) => "double",
		(CqlType::Object, true) => "NSObject *",
		(CqlType::Blob, true) => "NSData *",
		(CqlType::Text, true) => "NSString *",
		(CqlType::Object, false) => "NSObject *_Nullable",
		(CqlType::Blob, false) => "NSData *_Nullable",
		(CqlType::Text, false) => "NSString *_Nullable",
		(_, false) => "NSNumber *_Nullable",
	}
}

fn bridge_type(ty: CqlType) -> &'static str {
	match ty {
		CqlType::Blob => "NSData *",
		CqlType::Text => "NSString *",
		_ => "NSObject *",
	}
}
