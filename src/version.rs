use std::fmt;

use crate::sys;

/// A JNI interface version, as passed to `JNI_CreateJavaVM` and `GetEnv`.
///
/// The bridge needs at least [`JNIVersion::V1_2`] (for `ExceptionCheck` and
/// local frames), which is also the default.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Ord, Eq, Hash)]
#[repr(transparent)]
pub struct JNIVersion(u32);

macro_rules! versions {
    ($( $(#[$doc:meta])* $name:ident = $sys:ident ),* $(,)?) => {
        impl JNIVersion {
            $(
                $(#[$doc])*
                pub const $name: Self = JNIVersion(sys::$sys as u32);
            )*
        }
    };
}

versions! {
    /// JNI 1.1
    V1_1 = JNI_VERSION_1_1,
    /// JNI 1.2
    V1_2 = JNI_VERSION_1_2,
    /// JNI 1.4
    V1_4 = JNI_VERSION_1_4,
    /// JNI 1.6
    V1_6 = JNI_VERSION_1_6,
    /// JNI 1.8
    V1_8 = JNI_VERSION_1_8,
    /// JNI 9
    V9 = JNI_VERSION_9,
    /// JNI 10
    V10 = JNI_VERSION_10,
    /// JNI 19
    V19 = JNI_VERSION_19,
    /// JNI 20
    V20 = JNI_VERSION_20,
    /// JNI 21
    V21 = JNI_VERSION_21,
}

impl JNIVersion {
    /// Wrap a raw version constant like [`sys::JNI_VERSION_1_2`]
    pub fn new(ver: sys::jint) -> Self {
        Self::from(ver)
    }

    /// Major component of the version number
    pub fn major(&self) -> u16 {
        ((self.0 & 0x00ff0000) >> 16) as u16
    }

    /// Minor component of the version number
    pub fn minor(&self) -> u16 {
        (self.0 & 0xff) as u16
    }
}

impl Default for JNIVersion {
    fn default() -> Self {
        JNIVersion::V1_2
    }
}

impl fmt::Display for JNIVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.major() == 1 {
            write!(f, "{}.{}", self.major(), self.minor())
        } else {
            write!(f, "{}", self.major())
        }
    }
}

impl From<sys::jint> for JNIVersion {
    fn from(value: sys::jint) -> Self {
        JNIVersion(value as u32)
    }
}

impl From<JNIVersion> for sys::jint {
    fn from(val: JNIVersion) -> Self {
        val.0 as sys::jint
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn major_minor() {
        macro_rules! check {
            ($major:expr, $minor:expr, $ver:ident, $sys:ident) => {
                let v = JNIVersion::$ver;
                assert_eq!((v.major(), v.minor()), ($major, $minor));
                assert_eq!(JNIVersion::new(sys::$sys), v);
            };
        }

        check!(1, 1, V1_1, JNI_VERSION_1_1);
        check!(1, 2, V1_2, JNI_VERSION_1_2);
        check!(1, 8, V1_8, JNI_VERSION_1_8);
        check!(9, 0, V9, JNI_VERSION_9);
        check!(21, 0, V21, JNI_VERSION_21);
    }

    #[test]
    fn display_and_default() {
        assert_eq!(JNIVersion::default(), JNIVersion::V1_2);
        assert_eq!(JNIVersion::V1_8.to_string(), "1.8");
        assert_eq!(JNIVersion::V10.to_string(), "10");
        assert_eq!(sys::jint::from(JNIVersion::V1_6), sys::JNI_VERSION_1_6);
        assert!(JNIVersion::V1_2 < JNIVersion::V9);
    }
}
