//! Full Objective-C bindings: a header of classes and a matching `.m`.
//!
//! Each procedure with a projection gets a `CGS<proc>RS` result set class.
//! Procedures with out arguments or a projection get a `CGS<proc>RT` return
//! class and a `CGSCreate<proc>RT` entry point; the rest get `CGS<proc>`
//! returning the SQLite result code, or nothing when no database is used.

use std::fmt::{self, Write};

use tracing::debug;

use crate::schema::{Argument, Binding, CqlType, Procedure, Schema};
use crate::{Emitter, GENERATED_MARKER};

const PREFIX: &str = "CGS";
const DASHES: &str = "// ----------------------------------------------------------------";

/// Emits the Objective-C class header or, with `implementation`, its `.m`.
#[derive(Debug, Clone)]
pub struct ObjcFull {
	header: String,
	legacy: bool,
	implementation: bool,
}

impl ObjcFull {
	/// `header` is imported by the generated file.
	pub fn new(header: impl Into<String>) -> Self {
		Self {
			header: header.into(),
			legacy: false,
			implementation: false,
		}
	}

	/// Declares instance variables explicitly, for pre-ARC toolchains.
	pub fn legacy(mut self, legacy: bool) -> Self {
		self.legacy = legacy;
		self
	}

	/// Emits the `.m` implementation instead of the header.
	pub fn implementation(mut self, implementation: bool) -> Self {
		self.implementation = implementation;
		self
	}
}

impl Emitter for ObjcFull {
	fn write_to(&self, schema: &Schema, out: &mut dyn Write) -> fmt::Result {
		writeln!(out, "{GENERATED_MARKER}")?;

		if self.implementation {
			writeln!(out, "#import \"{}\"", self.header)?;
			writeln!(out)?;
		} else {
			writeln!(out, "#pragma once")?;
			writeln!(out)?;
			writeln!(out, "#import <Foundation/Foundation.h>")?;
			writeln!(out)?;
			writeln!(out, "#import <{}>", self.header)?;
			writeln!(out)?;
			writeln!(out, "NS_ASSUME_NONNULL_BEGIN")?;
			writeln!(out)?;
		}

		for proc in schema.procedures() {
			if proc.is_suppressed() {
				debug!(procedure = %proc.name, "skipping suppressed procedure");
				continue;
			}
			let writer = ProcWriter { proc, legacy: self.legacy };
			if self.implementation {
				writer.write_implementation(out)?;
			} else {
				writer.write_header(out)?;
			}
		}

		if !self.implementation {
			writeln!(out)?;
			writeln!(out, "NS_ASSUME_NONNULL_END")?;
		}
		Ok(())
	}
}

struct ProcWriter<'a> {
	proc: &'a Procedure,
	legacy: bool,
}

impl ProcWriter<'_> {
	fn name(&self) -> &str {
		&self.proc.name
	}

	fn needs_return_type(&self) -> bool {
		self.proc.has_out_args() || self.proc.projection.is_some()
	}

	fn write_header(&self, out: &mut dyn Write) -> fmt::Result {
		let name = self.name();

		if self.proc.projection.is_some() {
			writeln!(out)?;
			writeln!(out, "{DASHES}")?;
			write!(out, "@interface {PREFIX}{name}RS : NSObject")?;
			if self.legacy {
				writeln!(out, " {{")?;
				writeln!(out, "  {name}_result_set_ref _resultSet;")?;
				writeln!(out, "}}")?;
			}
			writeln!(out)?;

			for column in self.proc.columns() {
				let ty = objc_type_for(column.ty, column.kind.as_deref(), column.is_not_null);
				if self.proc.has_out_result {
					writeln!(out, "@property (nonatomic, readonly) {ty} {};", column.name)?;
				} else {
					writeln!(out, "- ({ty}){}:(NSUInteger)row;", column.name)?;
				}
			}

			writeln!(out)?;
			writeln!(out, "@property (nonatomic, assign) {name}_result_set_ref resultSet;")?;
			writeln!(out, "@property (nonatomic, readonly) cql_bool hasIdentityColumns;")?;
			writeln!(out, "@property (nonatomic, readonly) int count;")?;
			writeln!(out)?;
			writeln!(out, "@end")?;
			writeln!(out, "{DASHES}")?;
		}

		if self.needs_return_type() {
			self.write_return_interface(out)?;
		}

		writeln!(out)?;
		writeln!(out, "// procedure entry point {name}")?;
		let params = self.params().join(", ");
		writeln!(out, "{}({params});", self.entry_point())?;
		writeln!(out)
	}

	fn write_return_interface(&self, out: &mut dyn Write) -> fmt::Result {
		let name = self.name();
		writeln!(out)?;
		writeln!(out, "{DASHES}")?;
		write!(out, "@interface {PREFIX}{name}RT : NSObject")?;

		if self.legacy {
			writeln!(out, " {{")?;
			self.write_ivars(out)?;
			writeln!(out, "}}")?;
		}

		let mut first = true;
		for arg in self.proc.out_args() {
			if std::mem::take(&mut first) {
				writeln!(out)?;
			}
			let retain = if arg.ty.is_ref() || !arg.is_not_null { "retain" } else { "assign" };
			writeln!(out, "@property (nonatomic, {retain}) {} {};", arg_type(arg), arg.name)?;
		}

		if self.proc.uses_database() {
			writeln!(out)?;
			writeln!(out, "@property (nonatomic, assign) int resultCode;")?;
		}
		if self.proc.projection.is_some() {
			writeln!(out)?;
			writeln!(out, "@property (nonatomic, retain) {PREFIX}{name}RS *_Nullable resultSet;")?;
		}

		writeln!(out)?;
		writeln!(out, "@end")?;
		writeln!(out, "{DASHES}")
	}

	fn write_ivars(&self, out: &mut dyn Write) -> fmt::Result {
		for arg in self.proc.out_args() {
			writeln!(out, "  {} _{};", arg_type(arg), arg.name)?;
		}
		if self.proc.uses_database() {
			writeln!(out, "  int _resultCode;")?;
		}
		if self.proc.projection.is_some() {
			writeln!(out, "  {PREFIX}{}RS *_Nullable _resultSet;", self.name())?;
		}
		Ok(())
	}

	/// Return type and name of the entry point, without the parameter list.
	fn entry_point(&self) -> String {
		let name = self.name();
		if self.needs_return_type() {
			format!("{PREFIX}{name}RT *_Nonnull {PREFIX}Create{name}RT")
		} else if self.proc.uses_database() {
			format!("int {PREFIX}{name}")
		} else {
			format!("void {PREFIX}{name}")
		}
	}

	fn params(&self) -> Vec<String> {
		let db = self.proc.uses_database().then(|| "sqlite3 *_Nonnull __db".to_string());
		db.into_iter()
			.chain(
				self.proc
					.in_args()
					.map(|arg| format!("{} {}", objc_type(arg.ty, arg.is_not_null), arg.name)),
			)
			.collect()
	}

	fn implementation_keyword(&self, class: &str) -> String {
		if self.legacy {
			format!("@implementation {class} : NSObject")
		} else {
			format!("@implementation {class}")
		}
	}

	fn write_implementation(&self, out: &mut dyn Write) -> fmt::Result {
		if self.needs_return_type() {
			self.write_return_implementation(out)?;
		}
		if self.proc.projection.is_some() {
			self.write_result_set_implementation(out)?;
		}
		self.write_entry_point(out)
	}

	fn write_return_implementation(&self, out: &mut dyn Write) -> fmt::Result {
		let name = self.name();
		writeln!(out)?;
		writeln!(out, "{DASHES}")?;
		writeln!(out, "{} {{", self.implementation_keyword(&format!("{PREFIX}{name}RT")))?;
		self.write_ivars(out)?;
		writeln!(out, "}}")?;
		writeln!(out)?;

		for arg in self.proc.out_args() {
			writeln!(out, "@synthesize {0} = _{0};", arg.name)?;
		}
		if self.proc.uses_database() {
			writeln!(out, "@synthesize resultCode = _resultCode;")?;
		}
		if self.proc.projection.is_some() {
			writeln!(out, "@synthesize resultSet = _resultSet;")?;
		}

		writeln!(out)?;
		writeln!(out, "@end")?;
		writeln!(out, "{DASHES}")
	}

	fn write_result_set_implementation(&self, out: &mut dyn Write) -> fmt::Result {
		let name = self.name();
		writeln!(out)?;
		writeln!(out, "{DASHES}")?;
		writeln!(out, "{} {{", self.implementation_keyword(&format!("{PREFIX}{name}RS")))?;
		writeln!(out, "  {name}_result_set_ref _resultSet;")?;
		writeln!(out, "}}")?;

		let row = if self.proc.has_out_result { "" } else { ", row" };
		for column in self.proc.columns() {
			let c_name = &column.name;
			let ty = objc_type_for(column.ty, column.kind.as_deref(), column.is_not_null);

			writeln!(out)?;
			if self.proc.has_out_result {
				writeln!(out, "- ({ty}){c_name} {{")?;
			} else {
				writeln!(out, "- ({ty}){c_name}:(NSUInteger)row {{")?;
			}

			let getter = format!("{name}_get_{c_name}");
			if column.ty.is_ref() {
				writeln!(out, "  return (__bridge {ty}){getter}(_resultSet{row});")?;
			} else if !column.is_not_null {
				writeln!(
					out,
					"  return {getter}_is_null(_resultSet{row}) ? nil : @({getter}_value(_resultSet{row}));"
				)?;
			} else if column.ty == CqlType::Bool {
				writeln!(out, "  return {getter}(_resultSet{row}) ? YES : NO;")?;
			} else {
				writeln!(out, "  return {getter}(_resultSet{row});")?;
			}
			writeln!(out, "}}")?;
		}

		let identity = if self.proc.has_identity_columns() { "YES" } else { "NO" };
		writeln!(out)?;
		writeln!(out, "- (cql_bool)hasIdentityColumns {{")?;
		writeln!(out, "  return {identity};")?;
		writeln!(out, "}}")?;

		writeln!(out)?;
		writeln!(out, "-(int)count {{")?;
		writeln!(out, "  return {name}_result_count(_resultSet);")?;
		writeln!(out, "}}")?;

		writeln!(out)?;
		writeln!(out, "-(void)dealloc {{")?;
		writeln!(out, "  cql_release((cql_type_ref)self.resultSet);")?;
		if self.legacy {
			writeln!(out, "  [super dealloc];")?;
		}
		writeln!(out, "}}")?;

		writeln!(out)?;
		writeln!(out, "@synthesize resultSet = _resultSet;")?;
		writeln!(out)?;
		writeln!(out, "@end")?;
		writeln!(out, "{DASHES}")
	}

	fn write_entry_point(&self, out: &mut dyn Write) -> fmt::Result {
		let name = self.name();
		let proc = self.proc;

		writeln!(out)?;
		writeln!(out, "// procedure entry point {name}")?;
		writeln!(out, "{}(", self.entry_point())?;
		let params = self.params().iter().map(|param| format!("  {param}")).collect::<Vec<_>>();
		writeln!(out, "{})", params.join(",\n"))?;
		writeln!(out, "{{")?;

		if proc.uses_database() {
			writeln!(out, "  cql_code rc = SQLITE_OK;")?;
		}
		if proc.projection.is_some() {
			writeln!(out, "  {name}_result_set_ref _result_set_ref = NULL;")?;
		}
		if self.needs_return_type() {
			writeln!(out, "  {PREFIX}{name}RT *_result = [{PREFIX}{name}RT new];")?;
		}

		let mut preamble = String::new();
		let mut cleanup = String::new();
		let mut call_args = Vec::new();
		if proc.uses_database() {
			call_args.push("__db".to_string());
		}
		if proc.projection.is_some() {
			call_args.push("&_result_set_ref".to_string());
		}
		for arg in &proc.args {
			call_args.push(marshal_arg(arg, &mut preamble, &mut cleanup));
		}

		let rc = if proc.uses_database() { "rc = " } else { "" };
		let fetch = if proc.projection.is_some() { "_fetch_results" } else { "" };

		if !preamble.is_empty() {
			writeln!(out, "{preamble}")?;
		}
		writeln!(out, "  {rc}{name}{fetch}(\n    {});\n", call_args.join(",\n    "))?;
		if !cleanup.is_empty() {
			writeln!(out, "{cleanup}")?;
		}

		if self.needs_return_type() {
			if proc.uses_database() {
				writeln!(out, "  _result.resultCode = rc;")?;
			}
			if proc.projection.is_some() {
				writeln!(out, "  // {PREFIX}{name}RS takes over result_set_ref, it knows to clean it up")?;
				writeln!(out, "  {PREFIX}{name}RS *rs = [{PREFIX}{name}RS new];")?;
				writeln!(out, "  rs.resultSet = _result_set_ref;")?;
				writeln!(out, "  _result.resultSet = rs;")?;
			}
			writeln!(out, "  return _result;")?;
		} else if proc.uses_database() {
			writeln!(out, "  return rc;")?;
		}

		writeln!(out, "}}")
	}
}

/// Converts one argument for the C call: declares temporaries in `preamble`,
/// copies results into `_result` in `cleanup`, and returns the call argument.
fn marshal_arg(arg: &Argument, preamble: &mut String, cleanup: &mut String) -> String {
	let a_name = &arg.name;
	let out_only = arg.binding == Binding::Out;
	let returned = arg.binding.is_output();
	let c_type = if arg.is_not_null { arg.ty.c_type() } else { arg.ty.nullable_c_type() };

	let mut call = format!("/*{}*/ ", arg.binding);
	if returned {
		call.push('&');
	}

	if out_only || !arg.is_not_null || arg.ty.is_ref() {
		if !arg.ty.is_ref() {
			preamble.push_str(&format!("  {c_type} tmp_{a_name};\n"));
		} else if out_only {
			preamble.push_str(&format!("  {c_type} tmp_{a_name} = NULL;\n"));
		} else {
			preamble.push_str(&format!("  {c_type} tmp_{a_name} = (__bridge {}){a_name};\n", cf_type(arg.ty)));
		}
	}

	let transfer = if out_only { "_transfer" } else { "" };
	match arg.ty {
		ty if arg.is_not_null && !ty.is_ref() => {
			let value = if out_only { format!("tmp_{a_name}") } else { a_name.clone() };
			if returned {
				cleanup.push_str(&format!("  _result.{a_name} = {value};\n"));
			}
			call.push_str(&value);
		}
		CqlType::Text | CqlType::Blob => {
			let class = if arg.ty == CqlType::Text { "NSString" } else { "NSData" };
			if returned {
				cleanup.push_str(&format!("  _result.{a_name} = (__bridge{transfer} {class} *)tmp_{a_name};\n"));
			}
			call.push_str(&format!("tmp_{a_name}"));
		}
		CqlType::Object => {
			call.push_str(&format!(
				" /* unsupported arg type:'object' isNotNull:{} kind:'{}' */  error_unsupported_arg_type_{a_name}",
				u8::from(arg.is_not_null),
				arg.kind.as_deref().unwrap_or_default()
			));
		}
		ty => {
			if !out_only {
				let bool_norm = if ty == CqlType::Bool { "!!" } else { "" };
				preamble.push_str(&format!(
					"  cql_set_nullable(tmp_{a_name}, !{a_name}, ({}){bool_norm}[{a_name} {}]);\n",
					ty.c_type(),
					unbox_selector(ty)
				));
			}
			if returned {
				cleanup.push_str(&format!("  _result.{a_name} = tmp_{a_name}.is_null ? NULL : @(tmp_{a_name}.value);\n"));
			}
			call.push_str(&format!("tmp_{a_name}"));
		}
	}

	call
}

fn objc_type(ty: CqlType, is_not_null: bool) -> &'static str {
	match (ty, is_not_null) {
		(CqlType::Bool, true) => "cql_bool",
		(CqlType::Integer, true) => "cql_int32",
		(CqlType::Long, true) => "cql_int64",
		(CqlType::Real, true) => "cql_double",
		(CqlType::Object, true) => "NSObject *_Nonnull",
		(CqlType::Blob, true) => "NSData *_Nonnull",
		(CqlType::Text, true) => "NSString *_Nonnull",
		(CqlType::Object, false) => "NSObject *_Nullable",
		(CqlType::Blob, false) => "NSData *_Nullable",
		(CqlType::Text, false) => "NSString *_Nullable",
		(_, false) => "NSNumber *_Nullable",
	}
}

/// Child result sets are typed as the producing procedure's result set class.
fn objc_type_for(ty: CqlType, kind: Option<&str>, is_not_null: bool) -> String {
	match kind.and_then(|kind| kind.strip_suffix(" SET")) {
		Some(set) if ty == CqlType::Object => {
			let nullability = if is_not_null { "_Nonnull" } else { "_Nullable" };
			format!("{PREFIX}{set}RS *{nullability}")
		}
		_ => objc_type(ty, is_not_null).to_string(),
	}
}

fn arg_type(arg: &Argument) -> String {
	objc_type_for(arg.ty, arg.kind.as_deref(), arg.is_not_null)
}

fn cf_type(ty: CqlType) -> &'static str {
	match ty {
		CqlType::Blob => "CFDataRef",
		CqlType::Text => "CFStringRef",
		_ => "CFTypeRef",
	}
}

fn unbox_selector(ty: CqlType) -> &'static str {
	match ty {
		CqlType::Long => "longLongValue",
		CqlType::Real => "doubleValue",
		_ => "intValue",
	}
}
