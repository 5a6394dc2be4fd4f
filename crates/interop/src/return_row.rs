//! The one-row result set a C entry point returns to a managed caller.
//!
//! Out and inout arguments, the SQLite result code and the procedure's own
//! result set all travel back as fields of a single row. Reference fields are
//! laid out after value fields so the runtime can release them as one block;
//! the offsets table keeps the declared order.

use std::fmt::{self, Write};

use crate::schema::Procedure;

pub(crate) struct ReturnRow {
	proc_name: String,
	pub(crate) field_count: usize,
	pub(crate) ref_count: usize,
	meta: String,
	val_fields: String,
	ref_fields: String,
	offsets: String,
	first_ref: Option<String>,
}

impl ReturnRow {
	pub(crate) fn new(proc: &Procedure) -> Self {
		let mut row = Self {
			proc_name: proc.name.clone(),
			field_count: 0,
			ref_count: 0,
			meta: String::new(),
			val_fields: String::new(),
			ref_fields: String::new(),
			offsets: String::new(),
			first_ref: None,
		};
		let row_type = row.row_type();

		for arg in proc.out_args() {
			row.field_count += 1;
			let not_null = if arg.is_not_null { " | CQL_DATA_TYPE_NOT_NULL" } else { "" };
			row.meta.push_str(&format!("  {}{not_null}, // {}\n", arg.ty.data_type(), arg.name));

			let c_type = if arg.is_not_null { arg.ty.c_type() } else { arg.ty.nullable_c_type() };
			let field = format!("  {c_type} {};\n", arg.name);
			if arg.ty.is_ref() {
				row.ref_fields.push_str(&field);
				row.ref_count += 1;
				row.first_ref.get_or_insert_with(|| arg.name.clone());
			} else {
				row.val_fields.push_str(&field);
			}
			row.offsets.push_str(&format!("  cql_offsetof({row_type}, {}),\n", arg.name));
		}

		if proc.uses_database() {
			row.meta.push_str("  CQL_DATA_TYPE_INT32 | CQL_DATA_TYPE_NOT_NULL,\n");
			row.val_fields.push_str("  cql_int32 __rc;\n");
			row.offsets.push_str(&format!("  cql_offsetof({row_type}, __rc),\n"));
			row.field_count += 1;
		}

		// The result set is carried twice: once as a plain integer handle for
		// the managed side, once as a counted reference the row releases.
		if proc.projection.is_some() {
			row.meta.push_str("  CQL_DATA_TYPE_INT64 | CQL_DATA_TYPE_NOT_NULL, // result as long\n");
			row.meta.push_str("  CQL_DATA_TYPE_OBJECT, // result set as object\n");
			row.ref_fields.push_str("  cql_int64 __result_long;\n");
			row.ref_fields.push_str("  cql_result_set_ref __result;\n");
			row.ref_count += 1;
			row.offsets.push_str(&format!("  cql_offsetof({row_type}, __result_long),\n"));
			row.offsets.push_str(&format!("  cql_offsetof({row_type}, __result),\n"));
			row.field_count += 2;
			row.first_ref.get_or_insert_with(|| "__result".to_string());
		}

		row
	}

	pub(crate) fn row_type(&self) -> String {
		format!("{}_return_struct", self.proc_name)
	}

	pub(crate) fn is_empty(&self) -> bool {
		self.field_count == 0
	}

	/// Writes the data type table, struct, reference block macros and
	/// offsets table. Nothing is written for a row without fields.
	pub(crate) fn write_definitions(&self, out: &mut dyn Write) -> fmt::Result {
		if self.is_empty() {
			return Ok(());
		}
		let name = &self.proc_name;
		let row_type = self.row_type();

		writeln!(out)?;
		writeln!(out, "uint8_t {name}_return_meta[] = {{")?;
		out.write_str(&self.meta)?;
		writeln!(out, "}};")?;
		writeln!(out)?;

		writeln!(out, "typedef struct {row_type} {{")?;
		out.write_str(&self.val_fields)?;
		out.write_str(&self.ref_fields)?;
		writeln!(out, "}} {row_type};")?;
		writeln!(out)?;

		if let Some(first_ref) = &self.first_ref {
			writeln!(out, "#define {row_type}_refs_count {}", self.ref_count)?;
			writeln!(out, "#define {row_type}_refs_offset cql_offsetof({row_type}, {first_ref})")?;
			writeln!(out)?;
		}

		writeln!(out, "static cql_uint16 {name}_offsets[] = {{ {},", self.field_count)?;
		out.write_str(&self.offsets)?;
		writeln!(out, "}};")?;
		writeln!(out)
	}

	/// Writes the `cql_fetch_info` initializer describing this row.
	pub(crate) fn write_fetch_info(&self, out: &mut dyn Write, uses_database: bool, encode_context: bool) -> fmt::Result {
		let name = &self.proc_name;
		let row_type = self.row_type();

		writeln!(out)?;
		writeln!(out, "  cql_fetch_info info = {{")?;
		if uses_database {
			writeln!(out, "    .rc = SQLITE_OK,")?;
		}
		writeln!(out, "    .col_offsets = {name}_offsets,")?;
		writeln!(out, "    .data_types = {name}_return_meta,")?;
		if self.ref_count > 0 {
			writeln!(out, "    .refs_count = {row_type}_refs_count,")?;
			writeln!(out, "    .refs_offset = {row_type}_refs_offset,")?;
		}
		if encode_context {
			writeln!(out, "    .encode_context_index = -1,")?;
		}
		writeln!(out, "    .rowsize = sizeof({row_type}),")?;
		writeln!(out, "  }};")
	}
}

#[cfg(test)]
mod tests;
