use std::{
    ffi::{c_void, CString},
    path::{Path, PathBuf},
    ptr,
};

use crate::{
    errors::{Error, Result},
    sys::{JavaVMInitArgs, JavaVMOption, JNI_FALSE, JNI_TRUE},
    JNIVersion,
};

use super::locate;

/// Builder for JavaVM InitArgs.
///
/// Options are passed to the VM verbatim, e.g. `-Xcheck:jni` or
/// `-Djava.class.path=a.jar`. The `vfprintf`, `abort` and `exit` hooks
/// take function pointers rather than strings and are silently dropped.
#[derive(Debug, Default, Clone)]
pub struct InitArgsBuilder {
    opts: Vec<String>,
    ignore_unrecognized: bool,
    version: JNIVersion,
}

impl InitArgsBuilder {
    /// Create a new default InitArgsBuilder
    pub fn new() -> Self {
        Default::default()
    }

    /// Add an option to the init args
    pub fn option(mut self, opt_string: &str) -> Self {
        match opt_string {
            "vfprintf" | "abort" | "exit" => return self,
            _ => {}
        }

        self.opts.push(opt_string.into());
        self
    }

    /// Add several options at once
    pub fn options<I, S>(self, opts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        opts.into_iter().fold(self, |b, opt| b.option(opt.as_ref()))
    }

    /// Set JNI version for the init args
    ///
    /// Default: V1_2
    pub fn version(mut self, version: JNIVersion) -> Self {
        self.version = version;
        self
    }

    /// Set the `ignoreUnrecognized` init arg flag
    ///
    /// If ignoreUnrecognized is true, JavaVM::new ignores all unrecognized option strings that
    /// begin with "-X" or "_". If ignoreUnrecognized is false, JavaVM::new returns JNI_ERR as
    /// soon as it encounters any unrecognized option strings.
    ///
    /// Default: `false`
    pub fn ignore_unrecognized(mut self, ignore: bool) -> Self {
        self.ignore_unrecognized = ignore;
        self
    }

    /// Build the `InitArgs`
    ///
    /// Fails with [`Error::NulInString`] if an option contains a NUL byte.
    pub fn build(self) -> Result<InitArgs> {
        let mut opts = Vec::with_capacity(self.opts.len());
        for opt in &self.opts {
            let option_string = CString::new(opt.as_str())
                .map_err(|_| Error::NulInString(opt.clone()))?;
            opts.push(JavaVMOption {
                optionString: option_string.into_raw(),
                extraInfo: ptr::null_mut(),
            });
        }

        Ok(InitArgs {
            inner: JavaVMInitArgs {
                version: self.version.into(),
                ignoreUnrecognized: if self.ignore_unrecognized {
                    JNI_TRUE
                } else {
                    JNI_FALSE
                },
                options: opts.as_mut_ptr(),
                nOptions: opts.len() as _,
            },
            opts,
            strings: self.opts,
            version: self.version,
        })
    }
}

/// JavaVM InitArgs, ready to be passed to `JNI_CreateJavaVM`.
///
/// *This API requires "invocation" feature to create a VM.*
pub struct InitArgs {
    inner: JavaVMInitArgs,
    opts: Vec<JavaVMOption>,
    strings: Vec<String>,
    version: JNIVersion,
}

impl InitArgs {
    pub(crate) fn inner_ptr(&mut self) -> *mut c_void {
        &mut self.inner as *mut JavaVMInitArgs as *mut c_void
    }

    /// The requested JNI version
    pub fn version(&self) -> JNIVersion {
        self.version
    }

    /// The option strings, in order
    pub fn options(&self) -> &[String] {
        &self.strings
    }
}

impl std::fmt::Debug for InitArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitArgs")
            .field("version", &self.version)
            .field("options", &self.strings)
            .finish()
    }
}

impl Drop for InitArgs {
    fn drop(&mut self) {
        for opt in self.opts.iter() {
            // Safety: every optionString came from CString::into_raw in build()
            unsafe { drop(CString::from_raw(opt.optionString)) };
        }
    }
}

/// Options for starting the VM, as accepted by
/// [`get_env`][crate::vm::get_env].
///
/// They only matter for the call that actually creates the VM; later
/// callers just attach to the existing one.
///
/// ```
/// use rs2jdbc::{vm::JvmOptions, JNIVersion};
///
/// let opts = JvmOptions::new()
///     .classpath(["sqlite-jdbc.jar"])
///     .version(JNIVersion::V1_8)
///     .verbose("gc")
///     .check("jni")
///     .option("-Xmx", "256m");
///
/// assert_eq!(
///     opts.render(),
///     [
///         "-Djava.class.path=sqlite-jdbc.jar",
///         "-verbose:gc",
///         "-Xcheck:jni",
///         "-Xmx256m",
///     ]
/// );
/// ```
#[derive(Debug, Clone)]
pub struct JvmOptions {
    classpath: Option<Vec<PathBuf>>,
    version: JNIVersion,
    verbose: Vec<String>,
    check: Vec<String>,
    extra: Vec<(String, String)>,
    libjvm_path: Option<PathBuf>,
    destroy_on_exit: bool,
}

impl Default for JvmOptions {
    fn default() -> Self {
        JvmOptions {
            classpath: None,
            version: JNIVersion::default(),
            verbose: Vec::new(),
            check: Vec::new(),
            extra: Vec::new(),
            libjvm_path: None,
            destroy_on_exit: true,
        }
    }
}

impl JvmOptions {
    /// Defaults: the [default classpath][locate::default_classpath], JNI
    /// 1.2, destroy on exit.
    pub fn new() -> Self {
        Default::default()
    }

    /// Replace the classpath. Each entry is a jar, a directory of jars or a
    /// directory of classes.
    pub fn classpath<I, P>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.classpath = Some(entries.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the classpath with a separator-joined string.
    pub fn classpath_str(self, cp: &str) -> Self {
        self.classpath(locate::split_classpath(cp))
    }

    /// Append one entry to the classpath (after the default one, if no
    /// classpath was set yet).
    pub fn classpath_entry<P: Into<PathBuf>>(mut self, entry: P) -> Self {
        self.classpath
            .get_or_insert_with(locate::default_classpath)
            .push(entry.into());
        self
    }

    /// The JNI version to request. Default: 1.2
    pub fn version(mut self, version: JNIVersion) -> Self {
        self.version = version;
        self
    }

    /// Enable `-verbose:<subsystem>`.
    pub fn verbose(mut self, subsystem: &str) -> Self {
        self.verbose.push(subsystem.to_owned());
        self
    }

    /// Enable `-Xcheck:<subsystem>`.
    pub fn check(mut self, subsystem: &str) -> Self {
        self.check.push(subsystem.to_owned());
        self
    }

    /// Forward any other option: rendered as `key` immediately followed by
    /// `value`, e.g. `("-Xss", "4m")` or `("-Dfoo=", "bar")`.
    pub fn option(mut self, key: &str, value: &str) -> Self {
        self.extra.push((key.to_owned(), value.to_owned()));
        self
    }

    /// Load the VM from this library (or directory) instead of searching.
    pub fn libjvm_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.libjvm_path = Some(path.into());
        self
    }

    /// Whether to destroy the VM when the process exits. Default: `true`
    pub fn destroy_on_exit(mut self, destroy: bool) -> Self {
        self.destroy_on_exit = destroy;
        self
    }

    /// Explicit library path, if any
    pub fn get_libjvm_path(&self) -> Option<&Path> {
        self.libjvm_path.as_deref()
    }

    /// Requested JNI version
    pub fn get_version(&self) -> JNIVersion {
        self.version
    }

    /// Whether the VM is destroyed at exit
    pub fn get_destroy_on_exit(&self) -> bool {
        self.destroy_on_exit
    }

    /// The native option strings these options stand for.
    pub fn render(&self) -> Vec<String> {
        let classpath = match &self.classpath {
            Some(entries) => locate::build_classpath(entries),
            None => locate::build_classpath(&locate::default_classpath()),
        };

        let mut opts = Vec::new();
        if !classpath.is_empty() {
            opts.push(format!("-Djava.class.path={classpath}"));
        }
        opts.extend(self.verbose.iter().map(|v| format!("-verbose:{v}")));
        opts.extend(self.check.iter().map(|c| format!("-Xcheck:{c}")));
        opts.extend(self.extra.iter().map(|(k, v)| format!("{k}{v}")));
        opts
    }

    /// Build the raw init args.
    pub fn to_init_args(&self) -> Result<InitArgs> {
        InitArgsBuilder::new()
            .version(self.version)
            .options(self.render())
            .build()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builder_skips_hooks() {
        let args = InitArgsBuilder::new()
            .option("-Xcheck:jni")
            .option("exit")
            .option("-verbose:jni")
            .build()
            .unwrap();
        assert_eq!(args.options(), ["-Xcheck:jni", "-verbose:jni"]);
        assert_eq!(args.version(), JNIVersion::V1_2);
        assert_eq!(args.inner.nOptions, 2);
    }

    #[test]
    fn builder_rejects_nul() {
        let err = InitArgsBuilder::new().option("-Dx=\0").build().unwrap_err();
        assert!(matches!(err, Error::NulInString(_)));
    }

    #[test]
    fn render_empty_classpath() {
        let opts = JvmOptions::new()
            .classpath(Vec::<PathBuf>::new())
            .check("jni")
            .option("-Xrs", "");
        assert_eq!(opts.render(), ["-Xcheck:jni", "-Xrs"]);
    }

    #[test]
    fn render_classpath_str() {
        let cp = ["a.jar", "b.jar", "a.jar"].join(locate::PATHS_SEP);
        let opts = JvmOptions::new().classpath_str(&cp);
        assert_eq!(
            opts.render(),
            [format!(
                "-Djava.class.path={}",
                ["a.jar", "b.jar"].join(locate::PATHS_SEP)
            )]
        );
    }
}
