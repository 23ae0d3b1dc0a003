use std::path::PathBuf;

use rs2jdbc::{
    errors::{Error, Result},
    vm::{AttachGuard, Context, JvmOptions},
    wrap::{self, ThreadEnv},
    JNIVersion,
};

/// Driver jar search: this variable first, then `./lib/*.jar`.
pub const TEST_CLASSPATH_VAR: &str = "RS2JDBC_TEST_CLASSPATH";

#[allow(dead_code)]
pub fn options() -> JvmOptions {
    let mut options = JvmOptions::new()
        .version(JNIVersion::V1_8)
        .check("jni")
        .destroy_on_exit(false);
    if let Some(jar) = driver_classpath() {
        options = options.classpath_entry(jar);
    }
    options
}

pub fn jvm() -> &'static Context {
    Context::get_or_init(&options()).unwrap_or_else(|e| panic!("{:#?}", e))
}

#[allow(dead_code)]
pub fn attach_current_thread() -> AttachGuard<'static> {
    jvm()
        .attach()
        .expect("failed to attach jvm thread")
}

#[allow(dead_code)]
pub fn thread_env() -> ThreadEnv {
    jvm();
    unwrap(wrap::get_env(&options()))
}

/// The SQLite driver jar, if one is available.
#[allow(dead_code)]
pub fn driver_classpath() -> Option<PathBuf> {
    if let Some(cp) = std::env::var_os(TEST_CLASSPATH_VAR) {
        return Some(PathBuf::from(cp));
    }
    let lib = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("lib");
    std::fs::read_dir(lib)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .find(|path| {
            path.extension().is_some_and(|ext| ext == "jar")
                && path
                    .file_name()
                    .is_some_and(|name| name.to_string_lossy().contains("sqlite"))
        })
}

#[allow(dead_code)]
pub fn print_exception(err: &Error) {
    if let Some(exc) = err.java_exception() {
        eprintln!("{exc}");
    }
}

#[allow(dead_code)]
pub fn unwrap<T>(res: Result<T>) -> T {
    res.unwrap_or_else(|e| {
        print_exception(&e);
        panic!("{:#?}", e);
    })
}
