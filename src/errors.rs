use thiserror::Error;

use crate::{strings::DecodeError, sys};

mod java_exception;
pub use java_exception::{JavaException, StackFrame};

/// Errors that can occur while starting the Java VM.
///
/// All of them are fatal: the bridge never retries a failed start.
#[derive(Debug, Error)]
pub enum StartJvmError {
    /// No JVM shared library could be found.
    #[error(
        "Couldn't find the JVM shared library. Set JAVA_HOME or RS2JDBC_JAVA_HOME, or pass an explicit library path"
    )]
    NotFound,

    /// The JVM shared library was found but could not be loaded, or a
    /// required entry point is missing from it.
    #[cfg(all(feature = "invocation", not(target_os = "android")))]
    #[error("Couldn't load the Java VM shared library ({0}): {1}")]
    LoadError(String, #[source] libloading::Error),

    /// `JNI_GetDefaultJavaVMInitArgs` rejected the requested version.
    #[error("Couldn't get default JVM init args for version {version:#x}: {source}")]
    DefaultArgs {
        /// Requested JNI version
        version: sys::jint,
        /// Error code
        #[source]
        source: JniError,
    },

    /// `JNI_CreateJavaVM` failed.
    #[error("Couldn't create Java VM: {0}")]
    Create(#[source] JniError),
}

/// JNI error codes returned by invocation API functions.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum JniError {
    /// Unknown error (`JNI_ERR`)
    #[error("Unknown error")]
    Unknown,
    /// Thread is detached from the VM (`JNI_EDETACHED`)
    #[error("Current thread is not attached to the Java VM")]
    ThreadDetached,
    /// JNI version error (`JNI_EVERSION`)
    #[error("JNI version error")]
    WrongVersion,
    /// Not enough memory (`JNI_ENOMEM`)
    #[error("Not enough memory")]
    NoMemory,
    /// VM already created (`JNI_EEXIST`)
    #[error("VM already created")]
    AlreadyCreated,
    /// Invalid arguments (`JNI_EINVAL`)
    #[error("Invalid arguments")]
    InvalidArguments,
    /// Any other code
    #[error("Error code {0}")]
    Other(sys::jint),
}

/// Errors that can occur when calling through the bridge.
#[derive(Debug, Error)]
pub enum Error {
    /// A call completed with the Java pending-exception flag set. The
    /// exception has already been cleared.
    #[error("Java exception was thrown: {0}")]
    JavaException(JavaException),

    /// A JNI function that never returns `null` on success did so without
    /// raising.
    #[error("null pointer in {0}")]
    NullPtr(&'static str),

    /// The class could not be found on the VM's classpath.
    #[error("Class not found: {0}")]
    ClassNotFound(String),

    /// No method with this name and signature exists.
    #[error("Method not found: {name} {sig}")]
    MethodNotFound {
        /// Method name
        name: String,
        /// Method signature
        sig: String,
    },

    /// No field with this name and signature exists.
    #[error("Field not found: {name} {sig}")]
    FieldNotFound {
        /// Field name
        name: String,
        /// Field signature
        sig: String,
    },

    /// The signature string is malformed.
    #[error("Failed to parse signature: {0} (input: {1})")]
    ParseFailed(#[source] combine::error::StringStreamError, String),

    /// A native boolean was neither `JNI_TRUE` nor `JNI_FALSE`.
    #[error("Invalid native boolean value: {0}")]
    InvalidBoolean(u8),

    /// The number of arguments doesn't match the signature's arity.
    #[error("Invalid number of arguments: expected {expected}, got {actual}")]
    InvalidArgList {
        /// Declared arity
        expected: usize,
        /// Supplied arguments
        actual: usize,
    },

    /// A host value can't be converted to the declared type.
    #[error("Cannot convert {actual} to {expected}")]
    WrongValueType {
        /// The declared type
        expected: String,
        /// The kind of value supplied
        actual: &'static str,
    },

    /// Constructor signatures must return void.
    #[error("Invalid constructor return type (must be void)")]
    InvalidCtorReturn,

    /// `V` is only valid as a method return type.
    #[error("void is only valid as a method return type: {0}")]
    VoidNotAllowed(String),

    /// An invocation API function returned an error code.
    #[error("JNI error: {0}")]
    JniCall(#[source] JniError),

    /// The current thread is not attached to the VM.
    #[error("Current thread is not attached to the Java VM")]
    ThreadDetached,

    /// No VM has been created or adopted yet.
    #[error("Java VM has not been initialized")]
    UninitializedJavaVM,

    /// The VM has been destroyed.
    #[error("Java VM has been destroyed")]
    JavaVMDestroyed,

    /// The VM could not be started.
    #[error(transparent)]
    StartJvm(#[from] StartJvmError),

    /// A hangup signal was delivered to the process.
    #[error("Received hangup signal")]
    Hangup,

    /// Modified UTF-8 from the VM could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A string passed to the VM contains an interior NUL.
    #[error("String contains an interior NUL: {0:?}")]
    NulInString(String),

    /// The operation isn't implemented by the bridge.
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),
}

impl Error {
    /// Returns true for errors that indicate a broken setup rather than a
    /// failed call: the VM couldn't start, a class or member doesn't exist
    /// or the process received a hangup. Retrying is pointless.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::StartJvm(_)
                | Error::ClassNotFound(_)
                | Error::MethodNotFound { .. }
                | Error::FieldNotFound { .. }
                | Error::Hangup
        )
    }

    /// The captured Java exception, if this error wraps one.
    pub fn java_exception(&self) -> Option<&JavaException> {
        match self {
            Error::JavaException(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type with our [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Map a JNI invocation return code to a [`JniError`].
pub fn jni_error_code_to_result(code: sys::jint) -> std::result::Result<(), JniError> {
    match code {
        sys::JNI_OK => Ok(()),
        sys::JNI_ERR => Err(JniError::Unknown),
        sys::JNI_EDETACHED => Err(JniError::ThreadDetached),
        sys::JNI_EVERSION => Err(JniError::WrongVersion),
        sys::JNI_ENOMEM => Err(JniError::NoMemory),
        sys::JNI_EEXIST => Err(JniError::AlreadyCreated),
        sys::JNI_EINVAL => Err(JniError::InvalidArguments),
        _ => Err(JniError::Other(code)),
    }
}

impl From<JniError> for Error {
    fn from(err: JniError) -> Self {
        match err {
            JniError::ThreadDetached => Error::ThreadDetached,
            err => Error::JniCall(err),
        }
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn error_codes() {
        assert_eq!(jni_error_code_to_result(sys::JNI_OK), Ok(()));
        assert_eq!(
            jni_error_code_to_result(sys::JNI_EEXIST),
            Err(JniError::AlreadyCreated)
        );
        assert_eq!(jni_error_code_to_result(-42), Err(JniError::Other(-42)));
        assert_matches!(
            Error::from(JniError::ThreadDetached),
            Error::ThreadDetached
        );
        assert_matches!(
            Error::from(JniError::NoMemory),
            Error::JniCall(JniError::NoMemory)
        );
    }

    #[test]
    fn fatal_classification() {
        assert!(Error::ClassNotFound("java/lang/Nope".into()).is_fatal());
        assert!(Error::Hangup.is_fatal());
        assert!(!Error::NullPtr("FindClass result").is_fatal());
        assert!(!Error::InvalidArgList {
            expected: 1,
            actual: 2
        }
        .is_fatal());
    }
}
