use crate::sys::{JNI_ABORT, JNI_COMMIT};

/// How a `Release<Type>ArrayElements` call disposes of the element buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ReleaseMode {
    /// Copy back the content and free the elems buffer.
    CopyBack = 0,
    /// Copy back the content but keep the buffer.
    Commit = JNI_COMMIT,
    /// Free the buffer without copying back the possible changes.
    NoCopyBack = JNI_ABORT,
}

impl From<ReleaseMode> for crate::sys::jint {
    fn from(mode: ReleaseMode) -> Self {
        mode as crate::sys::jint
    }
}
