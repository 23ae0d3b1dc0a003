//! Java's [modified UTF-8]: the encoding used for every string that crosses
//! the JNI boundary (class and member names, signatures and the contents of
//! `java.lang.String` objects).
//!
//! [modified UTF-8]: https://docs.oracle.com/en/java/javase/21/docs/specs/jni/types.html#modified-utf-8-strings

mod ffi_str;
pub use ffi_str::JNIString;

mod mutf8;
pub use mutf8::{decode, decode_with, encode, DecodeError, DecodeErrorKind, DecodeMode};
