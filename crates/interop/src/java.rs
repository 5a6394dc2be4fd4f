//! Java bindings over JNI.
//!
//! The managed half is one outer class holding a view model per result set,
//! a `Results` class per procedure and `native` entry points. The C half
//! implements those natives: it unboxes the Java arguments, calls the
//! procedure and returns the outputs as a one-row result set handle.

use std::fmt::{self, Write};

use tracing::debug;

use crate::return_row::ReturnRow;
use crate::schema::{Argument, Binding, Column, CqlType, Procedure, Schema};
use crate::{Emitter, LICENSE_COMMENT, result_set_getter};

const UNBOX_HELPERS: &str = r#"
static jboolean UnboxBoolean(JNIEnv *env, jobject boxedBoolean)
{
    // Get the class of Boolean
    jclass booleanClass = (*env)->GetObjectClass(env, boxedBoolean);

    // Get the method ID for booleanValue() method
    jmethodID booleanValueMethodID = (*env)->GetMethodID(env, booleanClass, "booleanValue", "()Z");

    // Call the booleanValue() method to get the boolean value
    return (*env)->CallBooleanMethod(env, boxedBoolean, booleanValueMethodID);
}

static jint UnboxInteger(JNIEnv *env, jobject boxedInteger)
{
    // Get the class of Integer
    jclass integerClass = (*env)->GetObjectClass(env, boxedInteger);

    // Get the method ID for intValue() method
    jmethodID intValueMethodID = (*env)->GetMethodID(env, integerClass, "intValue", "()I");

    // Call the intValue() method to get the int value
    return (*env)->CallIntMethod(env, boxedInteger, intValueMethodID);
}

static jlong UnboxLong(JNIEnv *env, jobject boxedLong)
{
    // Get the class of Long
    jclass longClass = (*env)->GetObjectClass(env, boxedLong);

    // Get the method ID for longValue() method
    jmethodID longValueMethodID = (*env)->GetMethodID(env, longClass, "longValue", "()J");

    // Call the longValue() method to get the long value
    return (*env)->CallLongMethod(env, boxedLong, longValueMethodID);
}

static jdouble UnboxDouble(JNIEnv *env, jobject boxedDouble)
{
    // Get the class of Double
    jclass doubleClass = (*env)->GetObjectClass(env, boxedDouble);

    // Get the method ID for doubleValue() method
    jmethodID doubleValueMethodID = (*env)->GetMethodID(env, doubleClass, "doubleValue", "()D");

    // Call the doubleValue() method to get the double value
    return (*env)->CallDoubleMethod(env, boxedDouble, doubleValueMethodID);
}

"#;

/// Emits the managed Java class or, with `emit_c`, the JNI C implementation.
#[derive(Debug, Clone)]
pub struct Java {
	package: String,
	class_name: String,
	jni_header: String,
	cql_header: String,
	emit_c: bool,
}

impl Java {
	pub fn new(package: impl Into<String>, class_name: impl Into<String>) -> Self {
		Self {
			package: package.into(),
			class_name: class_name.into(),
			jni_header: "something_somethingJNI.h".to_string(),
			cql_header: "something.h".to_string(),
			emit_c: false,
		}
	}

	/// The `javah`-style header declaring the natives.
	pub fn jni_header(mut self, header: impl Into<String>) -> Self {
		self.jni_header = header.into();
		self
	}

	/// The CQL-generated header declaring the procedures.
	pub fn cql_header(mut self, header: impl Into<String>) -> Self {
		self.cql_header = header.into();
		self
	}

	pub fn emit_c(mut self, emit_c: bool) -> Self {
		self.emit_c = emit_c;
		self
	}

	/// Symbol prefix of every native in the class, e.g.
	/// `Java_com_acme_Users_` for `com.acme` and `Users`.
	fn jni_prefix(&self) -> String {
		let package = self.package.split('.').map(jni_escape).collect::<Vec<_>>().join("_");
		format!("Java_{package}_{}_", jni_escape(&self.class_name))
	}
}

impl Emitter for Java {
	fn write_to(&self, schema: &Schema, out: &mut dyn Write) -> fmt::Result {
		writeln!(out, "{LICENSE_COMMENT}")?;

		if self.emit_c {
			writeln!(out)?;
			writeln!(out, "#include \"cqlrt.h\"")?;
			writeln!(out, "#include \"{}\"", self.jni_header)?;
			writeln!(out, "#include \"{}\"", self.cql_header)?;
			writeln!(out)?;
			out.write_str(UNBOX_HELPERS)?;
		} else {
			writeln!(out, "package {};\n\n", self.package)?;
			writeln!(out, "import com.acme.cgsql.CQLResultSet;\n")?;
			writeln!(out, "import com.acme.cgsql.CQLViewModel;\n")?;
			writeln!(out, "import com.acme.cgsql.EncodedString;\n")?;
			writeln!(out, "public class {}", self.class_name)?;
			writeln!(out, "{{")?;
			writeln!(out, "  static {{")?;
			writeln!(out, "    System.loadLibrary(\"{}\");", self.class_name)?;
			writeln!(out, "  }}")?;
			writeln!(out)?;
		}

		for proc in schema.procedures() {
			if proc.is_suppressed() {
				debug!(procedure = %proc.name, "skipping suppressed procedure");
				continue;
			}
			if self.emit_c {
				self.write_native(out, proc)?;
			} else {
				write_view_model(out, proc)?;
				write_results(out, proc)?;
				write_entry_point(out, proc)?;
			}
		}

		if !self.emit_c {
			writeln!(out, "}}")?;
		}
		Ok(())
	}
}

fn write_view_model(out: &mut dyn Write, proc: &Procedure) -> fmt::Result {
	let name = &proc.name;
	if proc.projection.is_none() {
		return Ok(());
	}

	writeln!(out, "  static public final class {name}ViewModel extends CQLViewModel {{")?;
	writeln!(out, "    public {name}ViewModel(CQLResultSet resultSet) {{")?;
	writeln!(out, "       super(resultSet);")?;
	writeln!(out, "    }}")?;
	writeln!(out)?;

	for (col, column) in proc.columns().iter().enumerate() {
		let encoded = proc.is_vaulted(column);
		let (ty, getter) = if encoded && column.ty == CqlType::Text {
			("EncodedString", "getEncodedString".to_string())
		} else {
			(column_type(column), result_set_getter(column.ty, column.is_not_null))
		};

		writeln!(out, "    public {ty} get_{}(int row) {{", column.name)?;
		writeln!(out, "      return mResultSet.{getter}(row, {col});")?;
		writeln!(out, "    }}")?;
		writeln!(out)?;

		if encoded {
			writeln!(out, "    public boolean get_{}_IsEncoded() {{", column.name)?;
			writeln!(out, "      return mResultSet.getIsEncoded({col});")?;
			writeln!(out, "    }}")?;
			writeln!(out)?;
		}
	}

	writeln!(out, "    @Override")?;
	writeln!(out, "    protected boolean hasIdentityColumns() {{")?;
	writeln!(out, "      return {};", proc.has_identity_columns())?;
	writeln!(out, "    }}")?;
	writeln!(out)?;
	writeln!(out, "    public int getCount() {{")?;
	writeln!(out, "      return mResultSet.getCount();")?;
	writeln!(out, "    }}")?;
	writeln!(out, "  }}")?;
	writeln!(out)
}

fn write_results(out: &mut dyn Write, proc: &Procedure) -> fmt::Result {
	let name = &proc.name;
	writeln!(out, "  static public final class {name}Results extends CQLViewModel {{")?;
	writeln!(out, "    public {name}Results(CQLResultSet resultSet) {{")?;
	writeln!(out, "       super(resultSet);")?;
	writeln!(out, "    }}")?;
	writeln!(out)?;

	let mut col = 0;
	for arg in proc.out_args() {
		let ty = match arg.ty {
			CqlType::Object => "CQLResultSet",
			ty => java_type(ty, arg.is_not_null),
		};
		writeln!(out, "    public {ty} get_{}() {{", arg.name)?;
		writeln!(out, "      return mResultSet.{}(0, {col});", result_set_getter(arg.ty, arg.is_not_null))?;
		writeln!(out, "    }}")?;
		writeln!(out)?;
		col += 1;
	}

	if proc.uses_database() {
		writeln!(out, "    public int get_result_code() {{")?;
		writeln!(out, "      return mResultSet.getInteger(0, {col});")?;
		writeln!(out, "    }}")?;
		writeln!(out)?;
		col += 1;
	}

	if proc.projection.is_some() {
		writeln!(out, "    public {name}ViewModel get_result_set() {{")?;
		writeln!(
			out,
			"      return new {name}ViewModel(new CQLResultSet(mResultSet.getLong(0, {col})));"
		)?;
		writeln!(out, "    }}")?;
		writeln!(out)?;
	}

	writeln!(out, "    public int getCount() {{")?;
	writeln!(out, "      return 1;")?;
	writeln!(out, "    }}")?;
	writeln!(out)?;
	writeln!(out, "    @Override")?;
	writeln!(out, "    protected boolean hasIdentityColumns() {{")?;
	writeln!(out, "      return false;")?;
	writeln!(out, "    }}")?;
	writeln!(out, "  }}")?;
	writeln!(out)
}

fn write_entry_point(out: &mut dyn Write, proc: &Procedure) -> fmt::Result {
	let name = &proc.name;

	let mut params = Vec::new();
	let mut names = Vec::new();
	if proc.uses_database() {
		params.push("long __db".to_string());
		names.push("__db".to_string());
	}
	for arg in proc.in_args() {
		params.push(format!("{} {}", java_type(arg.ty, arg.is_not_null), arg.name));
		names.push(arg.name.clone());
	}
	let params = params.join(", ");

	writeln!(out, "  // procedure entry point {name}")?;
	if has_results(proc) {
		writeln!(out, "  public static {name}Results {name}({params}) {{")?;
		writeln!(
			out,
			"     return new {name}Results(new CQLResultSet({name}JNI({})));",
			names.join(", ")
		)?;
		writeln!(out, "  }}")?;
		writeln!(out)?;
		writeln!(out, "  public static native long {name}JNI({params});")?;
	} else {
		writeln!(out, "  public static native void {name}({params});")?;
	}
	writeln!(out)
}

impl Java {
	fn write_native(&self, out: &mut dyn Write, proc: &Procedure) -> fmt::Result {
		let name = &proc.name;
		let row = ReturnRow::new(proc);
		let row_type = row.row_type();
		row.write_definitions(out)?;

		let (return_type, suffix) = if row.is_empty() { ("void", "") } else { ("jlong", "JNI") };
		writeln!(
			out,
			"JNIEXPORT {return_type} JNICALL {}{}{suffix}(",
			self.jni_prefix(),
			jni_escape(name)
		)?;
		write!(out, "  JNIEnv *env,\n  jclass thiz")?;
		if proc.uses_database() {
			write!(out, ",\n  jlong __db")?;
		}
		for arg in proc.in_args() {
			write!(out, ",\n  {} {}", jni_type(arg.ty, arg.is_not_null), arg.name)?;
		}
		writeln!(out, ")")?;
		writeln!(out, "{{")?;

		if proc.uses_database() {
			writeln!(out, "  cql_code rc = SQLITE_OK;")?;
		}
		if proc.projection.is_some() {
			writeln!(out, "  {name}_result_set_ref _result_set_ = NULL;")?;
		}
		if !row.is_empty() {
			writeln!(out, "  cql_result_set_ref result_set = NULL;")?;
			writeln!(out, "  {row_type} *row = ({row_type} *)calloc(1, sizeof({row_type}));")?;
		}

		let mut leading = Vec::new();
		if proc.uses_database() {
			leading.push("(sqlite3*)__db");
		}
		if proc.projection.is_some() {
			leading.push("&_result_set_");
		}
		let mut call = format!(
			"  {}{name}{}({}",
			if proc.uses_database() { "rc = " } else { "" },
			if proc.projection.is_some() { "_fetch_results" } else { "" },
			leading.join(", ")
		);

		writeln!(out, "  // inout bindings not supported yet")?;

		let mut preamble = String::new();
		let mut cleanup = String::new();
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
				writeln!(out, "  // let the row take over the reference, we don't release it")?;
				writeln!(out, "  row->__result = (cql_result_set_ref)_result_set_;")?;
				writeln!(out, "  row->__result_long = (int64_t)_result_set_;")?;
			}
			row.write_fetch_info(out, proc.uses_database(), true)?;
			writeln!(out, "  cql_one_row_result(&info, (char *)row, 1, &result_set);")?;
			writeln!(out, "  return (jlong)result_set;")?;
		}

		writeln!(out, "}}")
	}
}

/// Converts one JNI argument for the C call, collecting setup and teardown.
fn marshal_arg(arg: &Argument, preamble: &mut String, cleanup: &mut String) -> String {
	let a_name = &arg.name;
	let mut call = format!("/* {} */", arg.binding);
	if arg.binding == Binding::InOut {
		call.push('&');
	}

	if arg.binding == Binding::Out {
		call.push_str(&format!("&row->{a_name}"));
		return call;
	}

	match arg.ty {
		ty if arg.is_not_null && !ty.is_ref() => call.push_str(a_name),
		CqlType::Text => {
			preamble.push_str(&format!("  cql_string_ref str_ref_{a_name} = NULL;\n"));
			preamble.push_str(&format!("  if ({a_name}) {{\n"));
			preamble.push_str(&format!(
				"    const char *cString_{a_name} = (*env)->GetStringUTFChars(env, {a_name}, NULL);\n"
			));
			preamble.push_str(&format!("    str_ref_{a_name} = cql_string_ref_new(cString_{a_name});\n"));
			preamble.push_str(&format!(
				"    (*env)->ReleaseStringUTFChars(env, {a_name}, cString_{a_name});\n"
			));
			preamble.push_str("  }\n");
			cleanup.push_str(&format!("  cql_string_release(str_ref_{a_name});\n"));
			call.push_str(&format!("str_ref_{a_name}"));
		}
		CqlType::Blob => {
			preamble.push_str(&format!("  cql_blob_ref blob_ref_{a_name} = NULL;\n"));
			preamble.push_str(&format!("  if ({a_name}) {{\n"));
			preamble.push_str(&format!(
				"    jbyte *bytes_{a_name} = (*env)->GetByteArrayElements(env, {a_name}, NULL);\n"
			));
			preamble.push_str(&format!("    jsize len_{a_name} = (*env)->GetArrayLength(env, {a_name});\n"));
			preamble.push_str(&format!(
				"    blob_ref_{a_name} = cql_blob_ref_new(bytes_{a_name}, len_{a_name});\n"
			));
			preamble.push_str(&format!(
				"    (*env)->ReleaseByteArrayElements(env, {a_name}, bytes_{a_name}, JNI_ABORT);\n"
			));
			preamble.push_str("  }\n");
			cleanup.push_str(&format!("  cql_blob_release(blob_ref_{a_name});\n"));
			call.push_str(&format!("blob_ref_{a_name}"));
		}
		CqlType::Object => {
			call.push_str(&format!(
				" /* unsupported arg type object isnotnull:{} */",
				u8::from(arg.is_not_null)
			));
		}
		ty => {
			let unbox = match ty {
				CqlType::Bool => "UnboxBoolean",
				CqlType::Integer => "UnboxInteger",
				CqlType::Long => "UnboxLong",
				_ => "UnboxDouble",
			};
			preamble.push_str(&format!("  {} n_{a_name};\n", ty.nullable_c_type()));
			// A null box leaves the value unread.
			preamble.push_str(&format!(
				"  cql_set_nullable(n_{a_name}, !{a_name}, {a_name} ? {unbox}(env, {a_name}) : 0);\n"
			));
			call.push_str(&format!("n_{a_name}"));
		}
	}

	call
}

fn has_results(proc: &Procedure) -> bool {
	proc.uses_database() || proc.has_out_args() || proc.projection.is_some()
}

fn java_type(ty: CqlType, is_not_null: bool) -> &'static str {
	match (ty, is_not_null) {
		(CqlType::Bool, true) => "boolean",
		(CqlType::Integer, true) => "int",
		(CqlType::Long, true) => "long",
		(CqlType::Real, true) => "double",
		(CqlType::Bool, false) => "Boolean",
		(CqlType::Integer, false) => "Integer",
		(CqlType::Long, false) => "Long",
		(CqlType::Real, false) => "Double",
		(CqlType::Object, _) => "Object",
		(CqlType::Blob, _) => "byte[]",
		(CqlType::Text, _) => "String",
	}
}

fn column_type(column: &Column) -> &'static str {
	match column.ty {
		CqlType::Object => "CQLResultSet",
		ty => java_type(ty, column.is_not_null),
	}
}

fn jni_type(ty: CqlType, is_not_null: bool) -> &'static str {
	match (ty, is_not_null) {
		(CqlType::Bool, true) => "jboolean",
		(CqlType::Integer, true) => "jint",
		(CqlType::Long, true) => "jlong",
		(CqlType::Real, true) => "jdouble",
		(CqlType::Blob, _) => "jbyteArray",
		(CqlType::Text, _) => "jstring",
		_ => "jobject",
	}
}

/// Escapes one name component for a JNI symbol; `_` becomes `_1`.
fn jni_escape(name: &str) -> String {
	name.replace('_', "_1")
}

#[cfg(test)]
mod tests;
