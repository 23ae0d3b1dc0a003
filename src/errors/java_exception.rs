use std::{fmt, ptr};

use log::warn;
use once_cell::sync::OnceCell;

use crate::{env::Env, errors::Error, refs::GlobalRef, sys, vm::Context};

/// A captured Java exception.
///
/// Produced whenever a JNI call leaves the pending-exception flag set. The
/// flag is cleared at capture time and the throwable is kept alive through a
/// global reference, so the error can be propagated across calls and
/// threads.
///
/// The class name, message and stack trace are decoded lazily the first
/// time any of them is inspected (including via [`Display`][fmt::Display])
/// and then cached. Decoding needs the VM: the inspecting thread is attached
/// temporarily if it isn't already.
pub struct JavaException {
    inner: Inner,
    details: OnceCell<std::result::Result<Details, String>>,
}

#[derive(Debug)]
enum Inner {
    Captured(GlobalRef),
    /// The exception flag was set but `ExceptionOccurred` returned nothing.
    Missing,
}

#[derive(Debug)]
struct Details {
    class_name: String,
    message: Option<String>,
    stack_trace: Vec<StackFrame>,
}

/// One element of a Java stack trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Fully qualified, dotted class name
    pub class_name: String,
    /// Method name
    pub method_name: String,
    /// Source file, if known
    pub file_name: Option<String>,
    /// Line number; negative if unknown or native
    pub line_number: i32,
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class_name, self.method_name)?;
        match (&self.file_name, self.line_number) {
            (_, -2) => write!(f, "(Native Method)"),
            (Some(file), line) if line >= 0 => write!(f, "({file}:{line})"),
            (Some(file), _) => write!(f, "({file})"),
            (None, _) => write!(f, "(Unknown Source)"),
        }
    }
}

impl JavaException {
    /// Drains the currently pending exception: reads it, clears it and
    /// promotes it to a global reference.
    pub(crate) fn capture(env: &Env<'_>) -> Self {
        // Safety: exception functions are safe to call with a pending
        // exception, and NewGlobalRef is called only after clearing it.
        let inner = unsafe {
            let throwable = env.exception_occurred();
            env.exception_clear();
            if throwable.is_null() {
                Inner::Missing
            } else {
                let global = jni_call_unchecked!(env, v1_1, NewGlobalRef, throwable);
                env.delete_local_ref(throwable);
                if global.is_null() {
                    Inner::Missing
                } else {
                    Inner::Captured(GlobalRef::from_raw(global))
                }
            }
        };

        JavaException {
            inner,
            details: OnceCell::new(),
        }
    }

    /// Global reference to the captured `java.lang.Throwable`.
    pub fn throwable(&self) -> Option<&GlobalRef> {
        match &self.inner {
            Inner::Captured(obj) => Some(obj),
            Inner::Missing => None,
        }
    }

    /// Dotted class name of the throwable, e.g. `java.sql.SQLException`.
    pub fn class_name(&self) -> Option<&str> {
        self.details().map(|d| d.class_name.as_str())
    }

    /// `Throwable.getMessage()`, or `None` if it returned `null`.
    pub fn message(&self) -> Option<&str> {
        self.details().and_then(|d| d.message.as_deref())
    }

    /// `Throwable.getStackTrace()`, one frame per element.
    pub fn stack_trace(&self) -> &[StackFrame] {
        self.details()
            .map(|d| d.stack_trace.as_slice())
            .unwrap_or_default()
    }

    /// Tests whether the throwable is an instance of the given class
    /// (slashed or dotted name).
    pub fn is_instance_of(&self, class_name: &str) -> crate::errors::Result<bool> {
        let Some(throwable) = self.throwable() else {
            return Ok(false);
        };
        let name = class_name.replace('.', "/");
        Context::singleton()?.with_env(|env| {
            env.with_local_frame(2, |env| unsafe {
                let class = env.find_class(&name)?;
                env.is_instance_of(throwable.as_raw(), class)
            })
        })
    }

    fn details(&self) -> Option<&Details> {
        let throwable = self.throwable()?;
        let details = self.details.get_or_init(|| {
            let decoded = Context::singleton().and_then(|ctx| {
                ctx.with_env(|env| {
                    env.with_local_frame(16, |env| unsafe { decode(env, throwable.as_raw()) })
                })
            });
            decoded.map_err(|e| {
                warn!("Failed to decode Java exception: {e}");
                e.to_string()
            })
        });
        details.as_ref().ok()
    }
}

unsafe fn call_string_method(
    env: &Env<'_>,
    obj: sys::jobject,
    class: sys::jclass,
    name: &str,
) -> crate::errors::Result<Option<String>> {
    let method = env.get_method_id(class, name, "()Ljava/lang/String;")?;
    let s = env.call_object_method_a(obj, method, ptr::null())?;
    if s.is_null() {
        return Ok(None);
    }
    let decoded = env.get_string(s);
    env.delete_local_ref(s);
    decoded.map(Some)
}

unsafe fn decode(env: &Env<'_>, throwable: sys::jobject) -> crate::errors::Result<Details> {
    let throwable_class = env.get_object_class(throwable)?;
    let class_class = env.get_object_class(throwable_class)?;
    let class_name = call_string_method(env, throwable_class, class_class, "getName")?
        .unwrap_or_default();
    let message = call_string_method(env, throwable, throwable_class, "getMessage")?;

    let get_stack_trace = env.get_method_id(
        throwable_class,
        "getStackTrace",
        "()[Ljava/lang/StackTraceElement;",
    )?;
    let elements = env.call_object_method_a(throwable, get_stack_trace, ptr::null())?;
    let mut stack_trace = Vec::new();
    if !elements.is_null() {
        let element_class = env.find_class("java/lang/StackTraceElement")?;
        let line_number = env.get_method_id(element_class, "getLineNumber", "()I")?;
        let len = env.get_array_length(elements)?;
        for i in 0..len {
            let element = env.get_object_array_element(elements, i)?;
            if element.is_null() {
                continue;
            }
            let frame = StackFrame {
                class_name: call_string_method(env, element, element_class, "getClassName")?
                    .unwrap_or_default(),
                method_name: call_string_method(env, element, element_class, "getMethodName")?
                    .unwrap_or_default(),
                file_name: call_string_method(env, element, element_class, "getFileName")?,
                line_number: env.call_int_method_a(element, line_number, ptr::null())?,
            };
            env.delete_local_ref(element);
            stack_trace.push(frame);
        }
    }

    Ok(Details {
        class_name,
        message,
        stack_trace,
    })
}

impl fmt::Debug for JavaException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug must not touch the VM.
        f.debug_struct("JavaException")
            .field("throwable", &self.inner)
            .field("details", &self.details.get())
            .finish()
    }
}

impl fmt::Display for JavaException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if matches!(self.inner, Inner::Missing) {
            return f.write_str("<Java exception flag was set, but no throwable was pending>");
        }
        let Some(details) = self.details() else {
            return f.write_str("<unidentified Java exception: failed to decode throwable>");
        };

        f.write_str(&details.class_name)?;
        if let Some(message) = &details.message {
            write!(f, ": {message}")?;
        }
        if f.alternate() {
            for frame in &details.stack_trace {
                write!(f, "\n    at {frame}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for JavaException {}

impl From<JavaException> for Error {
    fn from(e: JavaException) -> Self {
        Error::JavaException(e)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn stack_frame_display() {
        let mut frame = StackFrame {
            class_name: "java.lang.Integer".into(),
            method_name: "parseInt".into(),
            file_name: Some("Integer.java".into()),
            line_number: 652,
        };
        assert_eq!(
            frame.to_string(),
            "java.lang.Integer.parseInt(Integer.java:652)"
        );

        frame.line_number = -1;
        assert_eq!(frame.to_string(), "java.lang.Integer.parseInt(Integer.java)");

        frame.line_number = -2;
        assert_eq!(frame.to_string(), "java.lang.Integer.parseInt(Native Method)");

        frame.file_name = None;
        frame.line_number = 10;
        assert_eq!(
            frame.to_string(),
            "java.lang.Integer.parseInt(Unknown Source)"
        );
    }
}
