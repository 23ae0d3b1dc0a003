use std::{
    ffi::{CStr, CString},
    fmt,
    os::raw::c_char,
};

use crate::errors::{Error, Result};

use super::encode;

/// An owned, null-terminated string in modified UTF-8, ready to be handed
/// to a JNI function taking a `const char *`.
///
/// Modified UTF-8 never contains a zero byte (U+0000 is encoded as
/// `C0 80`), so any Rust string can be converted.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct JNIString {
    internal: CString,
}

impl JNIString {
    /// Encode `s` as modified UTF-8.
    pub fn new(s: &str) -> Result<Self> {
        let bytes = encode(s).into_owned();
        CString::new(bytes)
            .map(|internal| JNIString { internal })
            .map_err(|_| Error::NulInString(s.to_owned()))
    }

    /// Pointer to the null-terminated bytes, valid while `self` is alive.
    pub fn as_ptr(&self) -> *const c_char {
        self.internal.as_ptr()
    }

    /// The encoded bytes.
    pub fn as_cstr(&self) -> &CStr {
        &self.internal
    }
}

impl fmt::Debug for JNIString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match super::decode(self.internal.to_bytes()) {
            Ok(s) => write!(f, "{s:?}"),
            Err(_) => write!(f, "{:?}", self.internal),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn nul_is_encoded() {
        let s = JNIString::new("a\u{0}b").unwrap();
        assert_eq!(s.as_cstr().to_bytes(), &[b'a', 0xC0, 0x80, b'b']);
        assert_eq!(format!("{s:?}"), "\"a\\0b\"");
    }
}
