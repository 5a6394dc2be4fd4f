//! A SQLite extension exposing CQL procedures to SQL.
//!
//! Procedures with a projection become table valued functions whose hidden
//! columns carry the arguments. Everything else becomes a scalar function
//! returning its first non-object `out` value, or NULL.

use std::fmt::{self, Write};

use strum::{Display, EnumString, VariantNames};
use tracing::debug;

use crate::Emitter;
use crate::schema::{Argument, Binding, CqlType, Procedure, Schema};

/// How much commentary the generated C carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Display, EnumString, VariantNames)]
#[strum(serialize_all = "snake_case")]
pub enum Verbosity {
	Quiet,
	Normal,
	Verbose,
	#[default]
	VeryVerbose,
	Debug,
}

/// Emits the extension source: one wrapper per procedure and the
/// `sqlite3_cqlextension_init` entry point registering them.
#[derive(Debug, Clone)]
pub struct SqliteExtension {
	source: String,
	cql_header: String,
	namespace: Option<String>,
	verbosity: Verbosity,
}

impl SqliteExtension {
	/// `source` names the schema file in the generated banner.
	pub fn new(source: impl Into<String>) -> Self {
		Self {
			source: source.into(),
			cql_header: "cqlrt.h".to_string(),
			namespace: None,
			verbosity: Verbosity::default(),
		}
	}

	pub fn cql_header(mut self, header: impl Into<String>) -> Self {
		self.cql_header = header.into();
		self
	}

	/// Prefixes every SQL function name with `namespace_`.
	pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
		self.namespace = Some(namespace.into());
		self
	}

	pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
		self.verbosity = verbosity;
		self
	}

	/// The name SQL sees, which also names the C wrapper.
	fn canonical_name(&self, proc: &Procedure) -> String {
		match &self.namespace {
			Some(namespace) => format!("{namespace}_{}", proc.name),
			None => proc.name.clone(),
		}
	}
}

impl Emitter for SqliteExtension {
	fn write_to(&self, schema: &Schema, out: &mut dyn Write) -> fmt::Result {
		writeln!(out, "// Generated by cqlgen from {}", self.source)?;
		writeln!(out)?;
		writeln!(out, "#ifdef CQL_SQLITE_EXT")?;
		writeln!(out, "#include <sqlite3ext.h>")?;
		writeln!(out, "SQLITE_EXTENSION_INIT1")?;
		writeln!(out, "#endif")?;
		writeln!(out, "#include \"cqlrt.h\"")?;
		writeln!(out, "#include \"cql_sqlite_extension.h\"")?;
		writeln!(out, "#include \"{}\"", self.cql_header)?;
		writeln!(out)?;

		let mut procs: Vec<&Procedure> = schema.procedures().filter(|proc| !proc.is_suppressed()).collect();
		procs.sort_by(|a, b| a.name.cmp(&b.name));

		let mut writer = CodeWriter::new(out, self.verbosity);
		for proc in &procs {
			self.write_wrapper(&mut writer, proc)?;
		}

		self.write_initializer(out, schema)
	}
}

impl SqliteExtension {
	fn write_wrapper(&self, w: &mut CodeWriter<'_>, proc: &Procedure) -> fmt::Result {
		let name = self.canonical_name(proc);
		let has_projection = proc.projection.is_some();
		let innie: Vec<&Argument> = proc.in_args().collect();
		let outtie: Vec<&Argument> = proc.out_args().collect();

		// Objects have no SQLite value, so the scalar result is the first
		// output that is not one.
		for arg in outtie.iter().take_while(|arg| arg.ty == CqlType::Object) {
			w.line_at(
				Verbosity::Normal,
				&format!("/* object not implemented yet, skipping outtie arg {} */", arg.name),
			)?;
		}
		let first_outtie = outtie.iter().copied().find(|arg| arg.ty != CqlType::Object);

		let sql_args = innie
			.iter()
			.map(|arg| format!("`{}` {}", arg.name, sql_type(arg.ty, arg.is_not_null)))
			.collect::<Vec<_>>()
			.join(", ");
		let sql_result = match (&proc.projection, first_outtie) {
			(Some(_), _) => {
				let columns = proc
					.columns()
					.iter()
					.map(|column| format!("`{}` {}", column.name, sql_type(column.ty, column.is_not_null)))
					.collect::<Vec<_>>()
					.join(", ");
				format!("({columns})")
			}
			(None, Some(arg)) => sql_type(arg.ty, arg.is_not_null),
			(None, None) => "/*void*/ int".to_string(),
		};
		w.line(&format!("// SELECT FUNC {name}({sql_args}) {sql_result};"))?;

		if has_projection {
			w.line(&format!(
				"void call_{name}(sqlite3 *_Nonnull db, int32_t argc, sqlite3_value *_Nonnull *_Nonnull argv, cql_result_set_ref *result)"
			))?;
		} else {
			w.line(&format!(
				"void call_{name}(sqlite3_context *_Nonnull context, int32_t argc, sqlite3_value *_Nonnull *_Nonnull argv)"
			))?;
		}
		w.line("{")?;
		w.indent();

		if has_projection {
			w.line_at(Verbosity::Verbose, "// 0. Ensure output result set is cleared in case of early out")?;
			w.line("*result = NULL;")?;
			w.blank()?;
		}

		w.line_at(
			Verbosity::Verbose,
			"// 1. Ensure Sqlite function argument count matches count of the procedure in and inout arguments",
		)?;
		w.line(&format!("if (argc != {}) goto invalid_arguments;", innie.len()))?;
		w.blank()?;

		w.line_at(Verbosity::Verbose, "// 2. Ensure sqlite3 value type is compatible with cql type")?;
		for (index, arg) in innie.iter().enumerate() {
			w.line(&format!(
				"if (!is_sqlite3_type_compatible_with_cql_core_type(sqlite3_value_type(argv[{index}]), {}, {})) goto invalid_arguments; // {}",
				arg.ty.data_type(),
				if arg.is_not_null { "cql_false" } else { "cql_true" },
				arg.name
			))?;
		}
		w.blank()?;

		w.line_at(Verbosity::Verbose, "// 3. Marshalled argument initialization")?;
		for (index, arg) in innie.iter().enumerate() {
			w.line(&format!(
				"{:<20} {:<25} = {}(argv[{index}]);",
				c_type(arg),
				arg.name,
				value_getter(arg.ty, arg.is_not_null)
			))?;
		}
		for arg in proc.args.iter().filter(|arg| arg.binding == Binding::Out) {
			let init = if arg.ty.is_ref() {
				" = NULL;".to_string()
			} else if arg.is_not_null {
				" = 0;".to_string()
			} else {
				format!(" ; cql_set_null({});", arg.name)
			};
			w.line(&format!("{:<20} {:<25}{init}", c_type(arg), arg.name))?;
		}
		w.blank()?;

		w.line_at(Verbosity::Verbose, "// 4. Initialize procedure dependencies")?;
		if proc.uses_database() {
			w.line("cql_code rc = SQLITE_OK;")?;
			if !has_projection {
				w.line("sqlite3* db = sqlite3_context_db_handle(context);")?;
			}
			w.blank()?;
		}
		if has_projection {
			w.line(&format!("{}_result_set_ref _data_result_set_ = NULL;", proc.name))?;
			w.blank()?;
		}

		w.line_at(Verbosity::Verbose, "// 5. Call the procedure")?;
		let mut call_args = Vec::new();
		if proc.uses_database() {
			call_args.push("db".to_string());
		}
		if has_projection {
			call_args.push("&_data_result_set_".to_string());
		}
		for arg in &proc.args {
			call_args.push(match (arg.binding, arg.ty) {
				(Binding::In, CqlType::Object) => "/* unsupported arg type object*/".to_string(),
				(Binding::In, _) => arg.name.clone(),
				_ => format!("&{}", arg.name),
			});
		}
		w.line(&format!(
			"{}{}{}(",
			if proc.uses_database() { "rc = " } else { "" },
			proc.name,
			if has_projection { "_fetch_results" } else { "" }
		))?;
		w.raw(&call_args.iter().map(|arg| format!("    {arg}")).collect::<Vec<_>>().join(",\n"))?;
		w.line(");")?;
		w.blank()?;

		w.line_at(Verbosity::Verbose, "// 6. Cleanup In arguments since they are no longer needed")?;
		for arg in proc.args.iter().filter(|arg| arg.binding == Binding::In && arg.ty.is_ref()) {
			w.line(&format!("{}({});", release(arg.ty), arg.name))?;
		}
		w.blank()?;

		w.line_at(Verbosity::Verbose, "// 7. Ensure the procedure executed successfully")?;
		if proc.uses_database() {
			w.line("if (rc != SQLITE_OK) {")?;
			if !has_projection {
				w.line("  sqlite3_result_null(context);")?;
			}
			w.line("  goto cleanup;")?;
			w.line("}")?;
		}
		w.blank()?;

		w.line_at(Verbosity::Verbose, "// 8. Resolve the result based on:")?;
		w.line_at(Verbosity::VeryVerbose, "//   (A) The rows of the result_set, if any")?;
		w.line_at(Verbosity::VeryVerbose, "//   (B) The first outtie argument (out or inout) value, if any")?;
		w.line_at(Verbosity::VeryVerbose, "//   (C) Fallback to: null")?;
		w.line_at(Verbosity::VeryVerbose, "//")?;
		if has_projection {
			w.line_at(
				Verbosity::VeryVerbose,
				"// Current strategy: (A) Table valued function that exposes the result set",
			)?;
			w.line("*result = (cql_result_set_ref)_data_result_set_;")?;
		} else if let Some(arg) = first_outtie {
			w.line_at(Verbosity::VeryVerbose, "// Current strategy: (B) Using Outtie arguments")?;
			w.line_at(Verbosity::VeryVerbose, "// Set Sqlite result")?;
			w.line(&format!("{}(context, {});", result_setter(arg.ty, arg.is_not_null), arg.name))?;
		} else {
			w.line_at(Verbosity::VeryVerbose, "// Current strategy: (C) Fallback to null")?;
			w.line("sqlite3_result_null(context);")?;
		}
		w.line("goto cleanup;")?;
		w.blank()?;

		w.line("invalid_arguments:")?;
		if !has_projection {
			w.line("sqlite3_result_error(context, \"CQL extension: Invalid procedure arguments\", -1);")?;
		}
		w.line("return;")?;
		w.blank()?;

		w.line("cleanup:")?;
		w.line_at(Verbosity::Verbose, "// 10. Cleanup Outtie arguments")?;
		for arg in outtie.iter().filter(|arg| arg.ty.is_ref()) {
			w.line(&format!("if ({ref_name}) {}({ref_name});", release(arg.ty), ref_name = arg.name))?;
		}
		w.line_at(Verbosity::Normal, "/* Avoid empty block warning */ ;")?;

		w.dedent();
		w.line("}")?;
		w.blank()
	}

	fn write_initializer(&self, out: &mut dyn Write, schema: &Schema) -> fmt::Result {
		writeln!(out)?;
		writeln!(
			out,
			"int sqlite3_cqlextension_init(sqlite3 *_Nonnull db, char *_Nonnull *_Nonnull pzErrMsg, const sqlite3_api_routines *_Nonnull pApi) {{"
		)?;
		writeln!(out, "#ifdef CQL_SQLITE_EXT")?;
		writeln!(out, "  SQLITE_EXTENSION_INIT2(pApi);  // Initialize extension API function pointers")?;
		writeln!(out, "#endif")?;
		writeln!(out)?;
		writeln!(out, "  int rc = SQLITE_OK;")?;
		writeln!(out, "  cql_rowset_aux_init *aux = NULL;")?;

		for proc in schema.procedures() {
			// Only procedures that got a wrapper can be registered.
			if proc.is_suppressed() {
				debug!(procedure = %proc.name, "not registering suppressed procedure");
				continue;
			}
			let name = self.canonical_name(proc);
			writeln!(out)?;
			if proc.projection.is_some() {
				let columns = proc
					.columns()
					.iter()
					.map(|column| format!("[{}] {}", column.name, column.ty))
					.chain(proc.args.iter().map(|arg| format!("[arg_{}] {} hidden", arg.name, arg.ty)))
					.collect::<Vec<_>>()
					.join(", ");
				writeln!(
					out,
					"  aux = cql_rowset_create_aux_init(call_{name}, \"CREATE TABLE {name}({columns})\");"
				)?;
				writeln!(out, "  rc = register_cql_rowset_tvf(db, aux, \"{name}\");")?;
			} else {
				writeln!(
					out,
					"  rc = sqlite3_create_function(db, \"{name}\", {}, SQLITE_UTF8, NULL, call_{name}, NULL, NULL);",
					proc.in_args().count()
				)?;
			}
			writeln!(out)?;
			writeln!(out, "  if (rc != SQLITE_OK) return rc;")?;
		}

		writeln!(out)?;
		writeln!(out, "  return rc;")?;
		writeln!(out, "}}")
	}
}

/// Line printer with two-space indentation and verbosity gated comments.
struct CodeWriter<'a> {
	out: &'a mut dyn Write,
	verbosity: Verbosity,
	level: usize,
}

impl<'a> CodeWriter<'a> {
	fn new(out: &'a mut dyn Write, verbosity: Verbosity) -> Self {
		Self { out, verbosity, level: 0 }
	}

	fn indent(&mut self) {
		self.level += 1;
	}

	fn dedent(&mut self) {
		self.level = self.level.saturating_sub(1);
	}

	fn line(&mut self, text: &str) -> fmt::Result {
		writeln!(self.out, "{}{text}", "  ".repeat(self.level))
	}

	/// Writes `text` only when the configured verbosity reaches `min`.
	fn line_at(&mut self, min: Verbosity, text: &str) -> fmt::Result {
		if self.verbosity >= min { self.line(text) } else { Ok(()) }
	}

	/// Empty lines carry no indentation.
	fn blank(&mut self) -> fmt::Result {
		writeln!(self.out)
	}

	/// Writes `text` verbatim followed by a newline, or nothing if empty.
	fn raw(&mut self, text: &str) -> fmt::Result {
		if text.is_empty() {
			return Ok(());
		}
		writeln!(self.out, "{text}")
	}
}

fn sql_type(ty: CqlType, is_not_null: bool) -> String {
	format!("{ty}{}", if is_not_null { "!" } else { "" })
}

fn c_type(arg: &Argument) -> &'static str {
	if arg.is_not_null { arg.ty.c_type() } else { arg.ty.nullable_c_type() }
}

fn value_getter(ty: CqlType, is_not_null: bool) -> String {
	match ty {
		CqlType::Object | CqlType::Blob | CqlType::Text => {
			format!("resolve_{ty}_from_sqlite3_value")
		}
		_ => {
			let null = if is_not_null { "not_null" } else { "nullable" };
			format!("resolve_{null}_{ty}_from_sqlite3_value")
		}
	}
}

fn result_setter(ty: CqlType, is_not_null: bool) -> &'static str {
	match (ty, is_not_null) {
		(CqlType::Object, _) => "sqlite3_result_cql_pointer",
		(CqlType::Blob, _) => "sqlite3_result_cql_blob",
		(CqlType::Text, _) => "sqlite3_result_cql_text",
		(CqlType::Bool | CqlType::Integer, true) => "sqlite3_result_int",
		(CqlType::Long, true) => "sqlite3_result_int64",
		(CqlType::Real, true) => "sqlite3_result_double",
		(CqlType::Bool, false) => "sqlite3_result_cql_nullable_bool",
		(CqlType::Integer, false) => "sqlite3_result_cql_nullable_int",
		(CqlType::Long, false) => "sqlite3_result_cql_nullable_int64",
		(CqlType::Real, false) => "sqlite3_result_cql_nullable_double",
	}
}

fn release(ty: CqlType) -> &'static str {
	match ty {
		CqlType::Blob => "cql_blob_release",
		CqlType::Object => "cql_object_release",
		_ => "cql_string_release",
	}
}

#[cfg(test)]
mod tests;
