//! Finding the JVM shared library and assembling the classpath.

use std::{
    collections::HashSet,
    env,
    path::{Path, PathBuf},
};

cfg_if::cfg_if! {
    if #[cfg(windows)] {
        /// A platform specific name of the jvm dynamic library.
        pub const LIBJVM_NAME: &str = "jvm.dll";
        /// A platform specific separator of paths in corresponding environment variables.
        pub const PATHS_SEP: &str = ";";
    } else if #[cfg(any(target_os = "macos", target_os = "ios"))] {
        /// A platform specific name of the jvm dynamic library.
        pub const LIBJVM_NAME: &str = "libjvm.dylib";
        /// A platform specific separator of paths in corresponding environment variables.
        pub const PATHS_SEP: &str = ":";
    } else {
        /// A platform specific name of the jvm dynamic library.
        pub const LIBJVM_NAME: &str = "libjvm.so";
        /// A platform specific separator of paths in corresponding environment variables.
        pub const PATHS_SEP: &str = ":";
    }
}

/// Environment variables naming a Java installation, checked in order.
pub const JAVA_HOME_VARS: [&str; 3] = ["RS2JDBC_JAVA_HOME", "JAVA_HOME", "JDK_HOME"];

/// The classpath used when none is given: `$CLASSPATH` followed by the
/// `./lib` directory (whose jars are expanded by [`build_classpath`]).
pub fn default_classpath() -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = env::var("CLASSPATH")
        .map(|cp| split_classpath(&cp))
        .unwrap_or_default();
    let lib = Path::new("lib");
    if lib.is_dir() {
        entries.push(lib.to_path_buf());
    }
    entries
}

/// Split a separator-joined classpath string, dropping empty entries.
pub fn split_classpath(cp: &str) -> Vec<PathBuf> {
    cp.split(PATHS_SEP)
        .filter(|entry| !entry.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Join classpath entries with the platform separator.
///
/// A directory contributes itself (for loose class files) followed by every
/// `*.jar` directly inside it, in name order. Duplicates are dropped; the
/// first occurrence wins. Entries that don't exist are kept verbatim, since
/// the VM accepts wildcards like `lib/*`.
pub fn build_classpath<P: AsRef<Path>>(entries: &[P]) -> String {
    let mut seen = HashSet::new();
    let mut out: Vec<String> = Vec::new();
    let mut push = |path: PathBuf| {
        if seen.insert(path.clone()) {
            out.push(path.to_string_lossy().into_owned());
        }
    };

    for entry in entries {
        let entry = entry.as_ref();
        if entry.is_dir() {
            push(entry.to_path_buf());
            let mut jars: Vec<PathBuf> = std::fs::read_dir(entry)
                .map(|dir| {
                    dir.filter_map(|e| e.ok())
                        .map(|e| e.path())
                        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "jar"))
                        .collect()
                })
                .unwrap_or_default();
            jars.sort();
            jars.into_iter().for_each(&mut push);
        } else {
            push(entry.to_path_buf());
        }
    }

    out.join(PATHS_SEP)
}

/// Locate the JVM shared library.
///
/// Tried in order: the explicit path, the [`JAVA_HOME_VARS`] installations,
/// the `java` executable found by `java-locator`, the bare library name (left
/// to the OS loader's search path) and finally well-known install roots.
#[cfg(all(feature = "invocation", not(target_os = "android")))]
pub fn locate_libjvm(explicit: Option<&Path>) -> Result<PathBuf, crate::errors::StartJvmError> {
    use log::debug;

    if let Some(path) = explicit {
        return Ok(if path.is_dir() {
            find_libjvm_in(path).unwrap_or_else(|| path.join(LIBJVM_NAME))
        } else {
            path.to_path_buf()
        });
    }

    for var in JAVA_HOME_VARS {
        if let Some(home) = env::var_os(var).map(PathBuf::from) {
            if let Some(found) = home.exists().then(|| find_libjvm_in(&home)).flatten() {
                debug!("Found {LIBJVM_NAME} via {var}: {}", found.display());
                return Ok(found);
            }
        }
    }

    if let Ok(dir) = java_locator::locate_jvm_dyn_library() {
        let found = Path::new(&dir).join(java_locator::get_jvm_dyn_lib_file_name());
        if found.is_file() {
            debug!("Found {LIBJVM_NAME} via java executable: {}", found.display());
            return Ok(found);
        }
    }

    // Can the OS loader find it on its own?
    if unsafe { libloading::Library::new(LIBJVM_NAME) }.is_ok() {
        return Ok(PathBuf::from(LIBJVM_NAME));
    }

    well_known_roots()
        .iter()
        .filter(|root| root.exists())
        .find_map(|root| find_libjvm_in(root))
        .ok_or(crate::errors::StartJvmError::NotFound)
}

#[cfg(all(feature = "invocation", not(target_os = "android")))]
fn well_known_roots() -> Vec<PathBuf> {
    cfg_if::cfg_if! {
        if #[cfg(target_os = "macos")] {
            vec![
                PathBuf::from("/Library/Java/JavaVirtualMachines"),
                PathBuf::from("/System/Library/Frameworks/JavaVM.framework/Libraries"),
            ]
        } else if #[cfg(windows)] {
            ["ProgramFiles", "ProgramFiles(x86)"]
                .iter()
                .filter_map(env::var_os)
                .map(|dir| PathBuf::from(dir).join("Java"))
                .collect()
        } else {
            vec![PathBuf::from("/usr/lib/jvm"), PathBuf::from("/usr/java")]
        }
    }
}

/// Recursively search `root` for the JVM library, preferring the `server`
/// VM and the usual `jre`/`jdk` layouts over anything else found.
#[cfg(all(feature = "invocation", not(target_os = "android")))]
fn find_libjvm_in(root: &Path) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name() == LIBJVM_NAME)
        .map(|entry| entry.into_path())
        .collect();
    candidates.sort_by_key(|path| std::cmp::Reverse(rank(path)));
    candidates.into_iter().next()
}

#[cfg(all(feature = "invocation", not(target_os = "android")))]
fn rank(path: &Path) -> u8 {
    let s = path.to_string_lossy().replace('\\', "/");
    let mut rank = 0;
    if s.contains("/server/") {
        rank += 2;
    }
    if ["/jre/lib/", "/jdk/lib/", "/java/lib/", "/lib/server/"]
        .iter()
        .any(|p| s.contains(p))
    {
        rank += 1;
    }
    rank
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn split_drops_empty() {
        let cp = ["a.jar", "", "b"].join(PATHS_SEP);
        assert_eq!(
            split_classpath(&cp),
            vec![PathBuf::from("a.jar"), PathBuf::from("b")]
        );
    }

    #[test]
    fn build_dedupes_and_expands_directories() {
        let dir = env::temp_dir().join(format!("rs2jdbc-cp-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("b.jar"), b"").unwrap();
        std::fs::write(dir.join("a.jar"), b"").unwrap();
        std::fs::write(dir.join("notes.txt"), b"").unwrap();

        let cp = build_classpath(&[
            PathBuf::from("x.jar"),
            dir.clone(),
            dir.join("a.jar"),
            PathBuf::from("x.jar"),
        ]);
        let expected = [
            "x.jar".to_owned(),
            dir.to_string_lossy().into_owned(),
            dir.join("a.jar").to_string_lossy().into_owned(),
            dir.join("b.jar").to_string_lossy().into_owned(),
        ]
        .join(PATHS_SEP);
        assert_eq!(cp, expected);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[cfg(all(feature = "invocation", not(target_os = "android")))]
    #[test]
    fn server_vm_ranks_first() {
        assert!(rank(Path::new("/usr/lib/jvm/x/lib/server/libjvm.so")) > rank(Path::new("/usr/lib/jvm/x/lib/client/libjvm.so")));
    }
}
