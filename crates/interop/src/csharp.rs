//! C# bindings over a small C interop layer.
//!
//! The managed half declares a view model per result set, a return type per
//! procedure and a `DllImport` entry point. The C half implements those entry
//! points: it unpacks the marshalled arguments, calls the procedure and hands
//! back every output as a one-row result set.

use std::fmt::{self, Write};

use tracing::debug;

use crate::return_row::ReturnRow;
use crate::schema::{Argument, Binding, Column, CqlType, Procedure, Schema};
use crate::{Emitter, LICENSE_COMMENT, result_set_getter};

const BASE_TYPES: &str = "typedef struct nullable_bool {
  unsigned int hasValue;
  unsigned int value;
} nullable_bool;
typedef struct nullable_int {
  unsigned int hasValue;
  cql_int32 value;
} nullable_int;
typedef struct nullable_long {
  unsigned int hasValue;
  cql_int64 value;
} nullable_long;
typedef struct nullable_real {
  unsigned int hasValue;
  double value;
} nullable_real;
";

/// Emits the managed C# wrapper class or, with `emit_c`, its C counterpart.
#[derive(Debug, Clone)]
pub struct CSharp {
	class_name: String,
	cql_header: String,
	emit_c: bool,
}

impl CSharp {
	/// `class_name` names the wrapper class and prefixes every C entry point.
	pub fn new(class_name: impl Into<String>) -> Self {
		Self {
			class_name: class_name.into(),
			cql_header: "something.h".to_string(),
			emit_c: false,
		}
	}

	/// The CQL-generated header included by the C half.
	pub fn cql_header(mut self, header: impl Into<String>) -> Self {
		self.cql_header = header.into();
		self
	}

	pub fn emit_c(mut self, emit_c: bool) -> Self {
		self.emit_c = emit_c;
		self
	}
}

impl Emitter for CSharp {
	fn write_to(&self, schema: &Schema, out: &mut dyn Write) -> fmt::Result {
		writeln!(out, "{LICENSE_COMMENT}")?;

		if self.emit_c {
			writeln!(out)?;
			writeln!(out, "#include \"cqlrt.h\"")?;
			writeln!(out, "#include \"{}\"", self.cql_header)?;
			writeln!(out)?;
			out.write_str(BASE_TYPES)?;
		} else {
			writeln!(out, "using System;")?;
			writeln!(out, "using System.Runtime.InteropServices;")?;
			writeln!(out, "using System.Text;")?;
			writeln!(out, "using CGSQL;")?;
			writeln!(out)?;
			writeln!(out, "public class {}", self.class_name)?;
			writeln!(out, "{{")?;
			writeln!(out)?;
		}

		for proc in schema.procedures() {
			if proc.is_suppressed() {
				debug!(procedure = %proc.name, "skipping suppressed procedure");
				continue;
			}
			if self.emit_c {
				self.write_c_entry_point(out, proc)?;
			} else {
				write_view_model(out, proc)?;
				write_return_type(out, proc)?;
				self.write_managed_entry_point(out, proc)?;
			}
		}

		if !self.emit_c {
			writeln!(out, "}}")?;
		}
		Ok(())
	}
}

impl CSharp {
	fn write_managed_entry_point(&self, out: &mut dyn Write, proc: &Procedure) -> fmt::Result {
		let name = &proc.name;
		let class = &self.class_name;

		let mut params = Vec::new();
		let mut c_params = Vec::new();
		let mut call_args = Vec::new();
		if proc.uses_database() {
			params.push("long __db".to_string());
			c_params.push("long __db".to_string());
			call_args.push("__db".to_string());
		}

		for arg in proc.in_args() {
			let a_name = &arg.name;
			let ty = cs_type(arg.ty, arg.is_not_null);
			params.push(format!("{ty} {a_name}"));
			// Nullable values cross the boundary as a presence flag plus value.
			if is_split(arg) {
				call_args.push(format!("{a_name}.HasValue, {a_name}.GetValueOrDefault()"));
				c_params.push(format!("bool {a_name}_has_value, {} {a_name}_value", cs_type(arg.ty, true)));
			} else {
				call_args.push(a_name.clone());
				c_params.push(format!("{ty} {a_name}"));
			}
		}

		let needs_return_type = proc.uses_database() || proc.has_out_args() || proc.projection.is_some();
		let params = params.join(", ");
		let call_args = call_args.join(", ");

		writeln!(out, "  // procedure entry point {name}")?;
		let return_type = if needs_return_type {
			writeln!(out, "  public static {name}ReturnType {name}({params}) {{")?;
			writeln!(
				out,
				"     return new {name}ReturnType(new CQLResultSet({class}_{name}({call_args})));"
			)?;
			"long"
		} else {
			writeln!(out, "  public static void {name}({params}) {{")?;
			writeln!(out, "     {class}_{name}({call_args});")?;
			"void"
		};
		writeln!(out, "  }}")?;
		writeln!(out)?;

		writeln!(out, "  [DllImport(@\"cql_interop.dll\")]")?;
		writeln!(
			out,
			"  public static extern {return_type} {class}_{name}({});",
			c_params.join(", ")
		)?;
		writeln!(out)
	}

	fn write_c_entry_point(&self, out: &mut dyn Write, proc: &Procedure) -> fmt::Result {
		let name = &proc.name;
		let row = ReturnRow::new(proc);
		let row_type = row.row_type();
		row.write_definitions(out)?;

		let return_type = if row.is_empty() { "void" } else { "cql_int64" };
		writeln!(out, "{return_type} {}_{name}(", self.class_name)?;

		let mut params = Vec::new();
		if proc.uses_database() {
			params.push("  cql_int64 __db".to_string());
		}
		for arg in proc.in_args() {
			if is_split(arg) {
				params.push(format!(
					"  bool {0}_has_value,\n  {1} {0}_value",
					arg.name,
					interop_type(arg.ty, true)
				));
			} else {
				params.push(format!("  {} {}", interop_type(arg.ty, arg.is_not_null), arg.name));
			}
		}
		writeln!(out, "{})", params.join(",\n"))?;
		writeln!(out, "{{")?;

		if proc.uses_database() {
			writeln!(out, "  cql_code rc = SQLITE_OK;")?;
		}
		if proc.projection.is_some() {
			writeln!(out, "  {name}_result_set_ref _data_result_set_ = NULL;")?;
		}
		if !row.is_empty() {
			writeln!(out, "  cql_result_set_ref outputs_result_set = NULL;")?;
			writeln!(out, "  {row_type} *row = ({row_type} *)calloc(1, sizeof({row_type}));")?;
		}

		let mut preamble = String::new();
		let mut cleanup = String::new();
		let mut call_args = Vec::new();
		if proc.uses_database() {
			call_args.push("(sqlite3*)__db".to_string());
		}
		if proc.projection.is_some() {
			call_args.push("&_data_result_set_".to_string());
		}
		let leading = call_args.join(", ");
		let mut call = format!(
			"  {}{name}{}({leading}",
			if proc.uses_database() { "rc = " } else { "" },
			if proc.projection.is_some() { "_fetch_results" } else { "" }
		);
		for (index, arg) in proc.args.iter().enumerate() {
			if index > 0 || !leading.is_empty() {
				call.push(',');
			}
			call.push_str(&marshal_arg(arg, &mut preamble, &mut cleanup));
		}
		call.push_str(");");

		if !preamble.is_empty() {
			writeln!(out, "{preamble}")?;
		}
		writeln!(out, "{call}")?;
		if !cleanup.is_empty() {
			writeln!(out, "{cleanup}")?;
		}

		if !row.is_empty() {
			if proc.uses_database() {
				writeln!(out, "  row->__rc = rc;")?;
			}
			if proc.projection.is_some() {
				writeln!(out, "  // the row takes over the result set reference.")?;
				writeln!(out, "  row->__result = (cql_result_set_ref)_data_result_set_;")?;
				writeln!(out, "  row->__result_long = (int64_t)_data_result_set_;")?;
			}
			row.write_fetch_info(out, proc.uses_database(), false)?;
			writeln!(out, "  cql_one_row_result(&info, (char *)row, 1, &outputs_result_set);")?;
			writeln!(out, "  return (cql_int64)outputs_result_set;")?;
		}

		writeln!(out, "}}")
	}
}

fn write_view_model(out: &mut dyn Write, proc: &Procedure) -> fmt::Result {
	let name = &proc.name;
	if proc.projection.is_none() {
		return Ok(());
	}

	writeln!(out, "  public sealed class {name}ViewModel : CQLViewModel {{")?;
	writeln!(out, "    public {name}ViewModel(CQLResultSet resultSet) : base(resultSet) {{")?;
	writeln!(out, "    }}")?;
	writeln!(out)?;

	let (row_param, row) = if proc.has_out_result { ("", "0") } else { ("int row", "row") };
	for (col, column) in proc.columns().iter().enumerate() {
		let nullable = if !column.is_not_null && !column.ty.is_ref() { "?" } else { "" };
		writeln!(
			out,
			"    public {}{nullable} get_{}({row_param}) {{",
			column_type(column),
			column.name
		)?;
		writeln!(out, "      return mResultSet.{}({row}, {col});", result_set_getter(column.ty, column.is_not_null))?;
		writeln!(out, "    }}")?;
		writeln!(out)?;
	}

	writeln!(out, "    override protected bool hasIdentityColumns() {{")?;
	writeln!(out, "      return {};", proc.has_identity_columns())?;
	writeln!(out, "    }}")?;
	writeln!(out)?;
	writeln!(out, "    public int Count {{")?;
	writeln!(out, "       get {{")?;
	writeln!(out, "        return mResultSet.getCount();")?;
	writeln!(out, "       }}")?;
	writeln!(out, "    }}")?;
	writeln!(out)?;
	writeln!(out, "  }}")?;
	writeln!(out)
}

/// Out arguments, the result code and the result set, read back from the
/// single row the C entry point returns.
fn write_return_type(out: &mut dyn Write, proc: &Procedure) -> fmt::Result {
	let name = &proc.name;
	writeln!(out, "  public sealed class {name}ReturnType : CQLViewModel {{")?;
	writeln!(out, "    public {name}ReturnType(CQLResultSet resultSet) : base(resultSet) {{")?;
	writeln!(out, "    }}")?;
	writeln!(out)?;

	let mut col = 0;
	for arg in proc.out_args() {
		let ty = match arg.ty {
			CqlType::Object => "CQLResultSet",
			ty => cs_type(ty, arg.is_not_null),
		};
		writeln!(out, "    public {ty} {} {{", arg.name)?;
		writeln!(out, "      get {{")?;
		writeln!(out, "        return mResultSet.{}(0, {col});", result_set_getter(arg.ty, arg.is_not_null))?;
		writeln!(out, "      }}")?;
		writeln!(out, "    }}")?;
		writeln!(out)?;
		col += 1;
	}

	if proc.uses_database() {
		writeln!(out, "    public int result_code {{")?;
		writeln!(out, "      get {{")?;
		writeln!(out, "        return mResultSet.getInteger(0, {col});")?;
		writeln!(out, "      }}")?;
		writeln!(out, "    }}")?;
		writeln!(out)?;
		col += 1;
	}

	if proc.projection.is_some() {
		writeln!(out, "    public {name}ViewModel result_set {{")?;
		writeln!(out, "      get {{")?;
		writeln!(
			out,
			"        return new {name}ViewModel(new CQLResultSet(mResultSet.getLong(0, {col})));"
		)?;
		writeln!(out, "      }}")?;
		writeln!(out, "    }}")?;
		writeln!(out)?;
	}

	writeln!(out, "    public int Count {{")?;
	writeln!(out, "       get {{")?;
	writeln!(out, "        return 1;")?;
	writeln!(out, "       }}")?;
	writeln!(out, "    }}")?;
	writeln!(out)?;
	writeln!(out, "    override protected bool hasIdentityColumns() {{")?;
	writeln!(out, "      return false;")?;
	writeln!(out, "    }}")?;
	writeln!(out, "  }}")?;
	writeln!(out)
}

/// Converts one argument for the C call, collecting setup and teardown.
fn marshal_arg(arg: &Argument, preamble: &mut String, cleanup: &mut String) -> String {
	let a_name = &arg.name;
	let inout = arg.binding == Binding::InOut;

	let mut call = format!(" /*{}*/ ", arg.binding);
	if inout {
		call.push('&');
	}

	if arg.binding == Binding::Out {
		call.push_str(&format!("&row->{a_name}"));
		return call;
	}

	match arg.ty {
		ty if arg.is_not_null && !ty.is_ref() => {
			if inout {
				cleanup.push_str(&format!("  row->{a_name} = {a_name};\n"));
			}
			call.push_str(a_name);
		}
		CqlType::Text => {
			preamble.push_str(&format!("  cql_string_ref str_ref_{a_name} = NULL;\n"));
			preamble.push_str(&format!("  if ({a_name}) {{\n"));
			preamble.push_str(&format!("    str_ref_{a_name} = cql_string_ref_new({a_name});\n"));
			preamble.push_str("  }\n");
			if inout {
				cleanup.push_str(&format!("  cql_set_string_ref(&row->{a_name}, str_ref_{a_name});\n"));
			}
			cleanup.push_str(&format!("  cql_string_release(str_ref_{a_name});\n"));
			call.push_str(&format!("str_ref_{a_name}"));
		}
		CqlType::Blob => {
			// TODO: copy the managed byte array once the C signature carries its length.
			preamble.push_str(&format!("  cql_blob_ref blob_ref_{a_name} = NULL;\n"));
			preamble.push_str(&format!("  if ({a_name}) {{\n"));
			preamble.push_str(&format!("    void *bytes_{a_name} = \"xx\";\n"));
			preamble.push_str(&format!("    int len_{a_name} = 2;\n"));
			preamble.push_str(&format!(
				"    blob_ref_{a_name} = cql_blob_ref_new(bytes_{a_name}, len_{a_name});\n"
			));
			preamble.push_str("  }\n");
			if inout {
				cleanup.push_str(&format!("  cql_set_blob_ref(&row->{a_name}, blob_ref_{a_name});\n"));
			}
			cleanup.push_str(&format!("  cql_blob_release(blob_ref_{a_name});\n"));
			call.push_str(&format!("blob_ref_{a_name}"));
		}
		CqlType::Object => {
			call.push_str(&format!(
				" /* unsupported arg type:'object' isNotNull:{} kind:'{}' */",
				u8::from(arg.is_not_null),
				arg.kind.as_deref().unwrap_or_default()
			));
		}
		ty => {
			preamble.push_str(&format!("  {} n_{a_name};\n", ty.nullable_c_type()));
			preamble.push_str(&format!(
				"  cql_set_nullable(n_{a_name}, !{a_name}_has_value, {a_name}_value);\n"
			));
			if inout {
				cleanup.push_str(&format!("  row->{a_name} = n_{a_name};\n"));
			}
			call.push_str(&format!("n_{a_name}"));
		}
	}

	call
}

fn is_split(arg: &Argument) -> bool {
	!arg.is_not_null && !arg.ty.is_ref()
}

fn cs_type(ty: CqlType, is_not_null: bool) -> &'static str {
	match (ty, is_not_null) {
		(CqlType::Bool, true) => "bool",
		(CqlType::Integer, true) => "int",
		(CqlType::Long, true) => "long",
		(CqlType::Real, true) => "double",
		(CqlType::Object, true) => "object",
		(CqlType::Blob, true) => "byte[]",
		(CqlType::Text, true) => "string",
		(CqlType::Bool, false) => "bool?",
		(CqlType::Integer, false) => "int?",
		(CqlType::Long, false) => "long?",
		(CqlType::Real, false) => "double?",
		(CqlType::Object, false) => "object?",
		(CqlType::Blob, false) => "byte[]?",
		(CqlType::Text, false) => "string?",
	}
}

/// Column types are declared non-null; nullable values add the `?`.
fn column_type(column: &Column) -> &'static str {
	match column.ty {
		CqlType::Object => "CQLResultSet",
		ty => cs_type(ty, true),
	}
}

fn interop_type(ty: CqlType, is_not_null: bool) -> &'static str {
	match (ty, is_not_null) {
		(CqlType::Object, true) => "void*",
		(CqlType::Object, false) => "void *",
		(CqlType::Blob, _) => "const void *",
		(CqlType::Text, _) => "const char *",
		(ty, _) => ty.c_type(),
	}
}
