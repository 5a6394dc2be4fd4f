use std::path::Path;

use pretty_assertions::assert_eq;

use super::*;
use crate::fixture_schema;

fn managed() -> String {
	Java::new("com.acme", "Users").emit(&fixture_schema())
}

fn native() -> String {
	Java::new("com.acme", "Users")
		.jni_header("Users_JNI.h")
		.cql_header("Sample.h")
		.emit_c(true)
		.emit(&fixture_schema())
}

fn section<'a>(out: &'a str, start: &str, end: &str) -> &'a str {
	let from = out.find(start).unwrap();
	let len = out[from..].find(end).unwrap() + end.len();
	&out[from..from + len]
}

#[test]
fn managed_file_declares_package_and_class() {
	let out = managed();
	assert!(out.contains(concat!(
		"*/\n",
		"\n",
		"package com.acme;\n",
		"\n",
		"\n",
		"import com.acme.cgsql.CQLResultSet;\n",
		"\n",
		"import com.acme.cgsql.CQLViewModel;\n",
		"\n",
		"import com.acme.cgsql.EncodedString;\n",
		"\n",
		"public class Users\n",
		"{\n",
		"  static {\n",
		"    System.loadLibrary(\"Users\");\n",
		"  }\n",
		"\n",
		"  static public final class get_usersViewModel",
	)));
	assert!(out.ends_with("  // procedure entry point no_db\n  public static native void no_db();\n\n}\n"));
	assert!(!out.contains("private_helper"));
}

#[test]
fn view_model_marks_vaulted_text() {
	let out = managed();
	assert_eq!(
		section(&out, "  static public final class get_usersViewModel", "\n  }\n\n"),
		concat!(
			"  static public final class get_usersViewModel extends CQLViewModel {\n",
			"    public get_usersViewModel(CQLResultSet resultSet) {\n",
			"       super(resultSet);\n",
			"    }\n",
			"\n",
			"    public int get_id(int row) {\n",
			"      return mResultSet.getInteger(row, 0);\n",
			"    }\n",
			"\n",
			"    public EncodedString get_name(int row) {\n",
			"      return mResultSet.getEncodedString(row, 1);\n",
			"    }\n",
			"\n",
			"    public boolean get_name_IsEncoded() {\n",
			"      return mResultSet.getIsEncoded(1);\n",
			"    }\n",
			"\n",
			"    public Double get_score(int row) {\n",
			"      return mResultSet.getNullableDouble(row, 2);\n",
			"    }\n",
			"\n",
			"    public boolean get_active(int row) {\n",
			"      return mResultSet.getBoolean(row, 3);\n",
			"    }\n",
			"\n",
			"    @Override\n",
			"    protected boolean hasIdentityColumns() {\n",
			"      return true;\n",
			"    }\n",
			"\n",
			"    public int getCount() {\n",
			"      return mResultSet.getCount();\n",
			"    }\n",
			"  }\n",
			"\n",
		)
	);
}

#[test]
fn results_expose_outputs_and_result_set() {
	let out = managed();
	assert_eq!(
		section(&out, "  static public final class get_usersResults", "\n  }\n\n"),
		concat!(
			"  static public final class get_usersResults extends CQLViewModel {\n",
			"    public get_usersResults(CQLResultSet resultSet) {\n",
			"       super(resultSet);\n",
			"    }\n",
			"\n",
			"    public int get_result_code() {\n",
			"      return mResultSet.getInteger(0, 0);\n",
			"    }\n",
			"\n",
			"    public get_usersViewModel get_result_set() {\n",
			"      return new get_usersViewModel(new CQLResultSet(mResultSet.getLong(0, 1)));\n",
			"    }\n",
			"\n",
			"    public int getCount() {\n",
			"      return 1;\n",
			"    }\n",
			"\n",
			"    @Override\n",
			"    protected boolean hasIdentityColumns() {\n",
			"      return false;\n",
			"    }\n",
			"  }\n",
			"\n",
		)
	);
	assert!(out.contains("    public long get_total() {\n      return mResultSet.getLong(0, 0);\n"));
	assert!(out.contains("    public String get_label() {\n      return mResultSet.getString(0, 1);\n"));
	assert!(out.contains("    public CQLResultSet get_rs() {\n      return mResultSet.getChildResultSet(0, 0);\n"));
}

#[test]
fn entry_points_wrap_native_calls() {
	let out = managed();
	assert!(out.contains(concat!(
		"  // procedure entry point add_numbers\n",
		"  public static add_numbersResults add_numbers(int x, Long y, String label) {\n",
		"     return new add_numbersResults(new CQLResultSet(add_numbersJNI(x, y, label)));\n",
		"  }\n",
		"\n",
		"  public static native long add_numbersJNI(int x, Long y, String label);\n",
		"\n",
	)));
	assert!(out.contains("  public static native long get_usersJNI(long __db, int min_id);\n"));
	assert!(out.contains("  public static native long one_rowJNI(long __db, Boolean flag);\n"));
}

#[test]
fn native_file_includes_headers_and_unbox_helpers() {
	let out = native();
	assert!(out.contains(
		"*/\n\n\n#include \"cqlrt.h\"\n#include \"Users_JNI.h\"\n#include \"Sample.h\"\n\n\nstatic jboolean UnboxBoolean"
	));
	assert!(out.contains("static jdouble UnboxDouble(JNIEnv *env, jobject boxedDouble)\n"));
	assert!(out.ends_with(concat!(
		"JNIEXPORT void JNICALL Java_com_acme_Users_no_1db(\n",
		"  JNIEnv *env,\n",
		"  jclass thiz)\n",
		"{\n",
		"  // inout bindings not supported yet\n",
		"  no_db();\n",
		"}\n",
	)));
	assert!(!out.contains("private_helper"));
}

#[test]
fn native_entry_point_for_nullable_arg() {
	let out = native();
	assert_eq!(
		section(&out, "JNIEXPORT jlong JNICALL Java_com_acme_Users_delete_1userJNI(", "\n}\n"),
		concat!(
			"JNIEXPORT jlong JNICALL Java_com_acme_Users_delete_1userJNI(\n",
			"  JNIEnv *env,\n",
			"  jclass thiz,\n",
			"  jlong __db,\n",
			"  jobject id)\n",
			"{\n",
			"  cql_code rc = SQLITE_OK;\n",
			"  cql_result_set_ref result_set = NULL;\n",
			"  delete_user_return_struct *row = (delete_user_return_struct *)calloc(1, sizeof(delete_user_return_struct));\n",
			"  // inout bindings not supported yet\n",
			"  cql_nullable_int64 n_id;\n",
			"  cql_set_nullable(n_id, !id, id ? UnboxLong(env, id) : 0);\n",
			"\n",
			"  rc = delete_user((sqlite3*)__db,/* in */n_id);\n",
			"  row->__rc = rc;\n",
			"\n",
			"  cql_fetch_info info = {\n",
			"    .rc = SQLITE_OK,\n",
			"    .col_offsets = delete_user_offsets,\n",
			"    .data_types = delete_user_return_meta,\n",
			"    .encode_context_index = -1,\n",
			"    .rowsize = sizeof(delete_user_return_struct),\n",
			"  };\n",
			"  cql_one_row_result(&info, (char *)row, 1, &result_set);\n",
			"  return (jlong)result_set;\n",
			"}\n",
		)
	);
}

#[test]
fn native_entry_point_hands_result_set_to_row() {
	let out = native();
	let body = section(&out, "JNIEXPORT jlong JNICALL Java_com_acme_Users_get_1usersJNI(", "\n}\n");
	assert!(body.contains("  jint min_id)\n"));
	assert!(body.contains("  get_users_result_set_ref _result_set_ = NULL;\n"));
	assert!(body.contains("  rc = get_users_fetch_results((sqlite3*)__db, &_result_set_,/* in */min_id);\n"));
	assert!(body.contains(concat!(
		"  // let the row take over the reference, we don't release it\n",
		"  row->__result = (cql_result_set_ref)_result_set_;\n",
		"  row->__result_long = (int64_t)_result_set_;\n",
	)));
}

#[test]
fn native_text_and_blob_args_guard_null() {
	let out = native();
	let insert = section(&out, "Java_com_acme_Users_insert_1userJNI(", "\n}\n");
	assert!(insert.contains(concat!(
		"  cql_string_ref str_ref_name = NULL;\n",
		"  if (name) {\n",
		"    const char *cString_name = (*env)->GetStringUTFChars(env, name, NULL);\n",
		"    str_ref_name = cql_string_ref_new(cString_name);\n",
		"    (*env)->ReleaseStringUTFChars(env, name, cString_name);\n",
		"  }\n",
		"\n",
		"  rc = insert_user((sqlite3*)__db,/* in */id,/* in */str_ref_name);\n",
		"  cql_string_release(str_ref_name);\n",
		"\n",
	)));

	let schema = Schema::parse(
		r#"{ "general": [{ "name": "put", "usesDatabase": 0, "args": [
			{ "name": "data", "type": "blob", "isNotNull": 1 },
			{ "name": "obj", "type": "object", "isNotNull": 1 }
		] }] }"#,
		Path::new("inline.json"),
	)
	.unwrap();
	let out = Java::new("p", "C").emit_c(true).emit(&schema);
	assert!(out.contains(concat!(
		"JNIEXPORT void JNICALL Java_p_C_put(\n",
		"  JNIEnv *env,\n",
		"  jclass thiz,\n",
		"  jbyteArray data,\n",
		"  jobject obj)\n",
	)));
	assert!(out.contains("    blob_ref_data = cql_blob_ref_new(bytes_data, len_data);\n"));
	assert!(out.contains("    (*env)->ReleaseByteArrayElements(env, data, bytes_data, JNI_ABORT);\n"));
	assert!(out.contains("  put(/* in */blob_ref_data,/* in */ /* unsupported arg type object isnotnull:1 */);\n"));
	assert!(out.contains("  cql_blob_release(blob_ref_data);\n"));
}

#[test]
fn native_symbols_escape_underscores() {
	let java = Java::new("com.my_app", "Db_Api");
	assert_eq!(java.jni_prefix(), "Java_com_my_1app_Db_1Api_");
}
