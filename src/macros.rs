//! Macros for making raw JNI calls through the environment and VM tables.
//!
//! Note: none of these macros contain hidden control flow like `return` or
//! `?`; they all evaluate to a value (usually a `Result`) for the caller to
//! deal with.

/// Directly calls an Env FFI function, nothing else
///
/// # Safety
///
/// Only for JNI functions that may be called with a pending exception
/// (`Exception*`, `Delete*Ref`, `Release*`, `PopLocalFrame`, `MonitorExit`)
/// or for callers that check for exceptions themselves. The arguments must be
/// valid for the function being called.
macro_rules! jni_call_unchecked {
    ( $jnienv:expr, $version:tt, $name:ident $(, $args:expr )* ) => {{
        let env: *mut jni_sys::JNIEnv = $jnienv.get_raw();
        let interface: *const jni_sys::JNINativeInterface_ = *env;

        ((*interface).$version.$name)(env $(, $args)*)
    }};
}

/// Checks for a hangup, calls an Env function, then drains any pending
/// exception
///
/// After a hangup the function is not called and `Err(Error::Hangup)` is
/// returned. If the call left an exception pending it is captured, cleared
/// and returned as `Err(Error::JavaException(_))`, so the next JNI call
/// always starts with no exception pending. Otherwise the raw return value
/// is returned unchanged (`null`/zero included).
macro_rules! jni_call_check_ex {
    ( $jnienv:expr, $version:tt, $name:ident $(, $args:expr )* ) => {{
        $crate::__must_use(match $crate::vm::check_hangup() {
            Ok(()) => {
                let ret = jni_call_unchecked!($jnienv, $version, $name $(, $args)*);
                $jnienv.drain_exception().map(|()| ret)
            }
            Err(e) => Err(e),
        })
    }};
}

/// Calls an Env function, drains any pending exception, then checks for a
/// `null` return value
///
/// Returns `Err(Error::NullPtr)` if the function returned `null` without
/// raising, which the JNI allows for lookups and allocations.
macro_rules! jni_call_check_ex_and_null_ret {
    ( $jnienv:expr, $version:tt, $name:ident $(, $args:expr )* ) => {{
        jni_call_check_ex!($jnienv, $version, $name $(, $args)*).and_then(|ret| {
            if ret.is_null() {
                Err($crate::errors::Error::NullPtr(concat!(stringify!($name), " result")))
            } else {
                Ok(ret)
            }
        })
    }};
}

/// Maps a pointer to either Ok(ptr) or Err(Error::NullPtr)
macro_rules! null_check {
    ( $obj:expr, $ctx:expr ) => {
        if $obj.is_null() {
            Err($crate::errors::Error::NullPtr($ctx))
        } else {
            Ok($obj)
        }
    };
}

/// Directly calls a JavaVM function, nothing else
///
/// # Safety
///
/// The VM pointer must be valid and the arguments must be valid for the
/// particular invocation function being called.
macro_rules! java_vm_call_unchecked {
    ( $jvm:expr, $version:tt, $name:ident $(, $args:expr )* ) => {{
        let jvm: *mut jni_sys::JavaVM = $jvm;
        ((*(*jvm)).$version.$name)(jvm $(, $args)*)
    }};
}
