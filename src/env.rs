//! Typed forwarding over the JNI environment function table.
//!
//! [`Env`] is a 1:1 shim: each method forwards its arguments to one JNI
//! function unchanged and, for every function that can raise, drains the
//! pending exception into [`Error::JavaException`] before returning. Lookups
//! and allocations additionally turn a silent `null` into [`Error::NullPtr`].
//! No conversions happen at this level; see [`crate::sigtype`] for those.
//!
//! Methods taking raw references are `unsafe`: the caller guarantees the
//! references are valid and of the right kind for the function.

use std::{
    ffi::CStr,
    marker::PhantomData,
    panic::{catch_unwind, resume_unwind, AssertUnwindSafe},
    ptr,
};

use paste::paste;

use crate::{
    errors::{Error, JavaException, Result},
    refs::{GlobalRef, ReleaseMode},
    strings::{decode, JNIString},
    sys::{self, jint, jsize},
    JNIVersion,
};

/// A JNI environment, valid on the thread it was obtained on.
///
/// `Env` is neither `Send` nor `Sync`: the underlying `JNIEnv *` belongs to
/// one attached thread. The `'local` lifetime ties it to the attachment (or
/// local frame) it came from.
///
/// ```rust,compile_fail
/// # fn main() -> rs2jdbc::errors::Result<()> {
/// use rs2jdbc::vm::{get_env, JvmOptions};
///
/// let env = get_env(&JvmOptions::default())?;
/// std::thread::spawn(move || env.get_version());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Env<'local> {
    internal: *mut sys::JNIEnv,
    owns_attachment: bool,
    lifetime: PhantomData<&'local ()>,
}

impl<'local> Env<'local> {
    /// Wrap a raw `JNIEnv` pointer.
    ///
    /// # Safety
    ///
    /// `ptr` must be a valid `JNIEnv` pointer for the current thread and must
    /// stay valid for `'local`.
    pub unsafe fn from_raw(ptr: *mut sys::JNIEnv) -> Result<Self> {
        let internal = null_check!(ptr, "from_raw ptr argument")?;
        Ok(Env {
            internal,
            owns_attachment: false,
            lifetime: PhantomData,
        })
    }

    pub(crate) fn owning_attachment(mut self) -> Self {
        self.owns_attachment = true;
        self
    }

    /// The raw `JNIEnv` pointer.
    pub fn get_raw(&self) -> *mut sys::JNIEnv {
        self.internal
    }

    /// False if the thread was attached only to obtain this environment and
    /// will be detached again once it goes away.
    pub fn was_attached(&self) -> bool {
        !self.owns_attachment
    }

    /// `GetVersion`
    pub fn get_version(&self) -> Result<JNIVersion> {
        let version = unsafe { jni_call_unchecked!(self, v1_1, GetVersion) };
        Ok(JNIVersion::from(version))
    }

    // Exceptions

    /// `ExceptionCheck`
    pub fn exception_check(&self) -> bool {
        unsafe { jni_call_unchecked!(self, v1_2, ExceptionCheck) }
    }

    /// `ExceptionOccurred`: a new local reference to the pending throwable,
    /// or `null`.
    ///
    /// # Safety
    ///
    /// The returned reference must be deleted by the caller.
    pub unsafe fn exception_occurred(&self) -> sys::jthrowable {
        jni_call_unchecked!(self, v1_1, ExceptionOccurred)
    }

    /// `ExceptionClear`
    ///
    /// # Safety
    ///
    /// Discards the pending exception without looking at it.
    pub unsafe fn exception_clear(&self) {
        jni_call_unchecked!(self, v1_1, ExceptionClear)
    }

    /// `ExceptionDescribe`: prints the pending exception to stderr and
    /// clears it.
    pub fn exception_describe(&self) {
        unsafe { jni_call_unchecked!(self, v1_1, ExceptionDescribe) }
    }

    /// Capture and clear the pending exception, if any.
    ///
    /// Called after every checked JNI call, so a stale exception never leaks
    /// into the next unrelated call.
    pub fn drain_exception(&self) -> Result<()> {
        if self.exception_check() {
            Err(Error::JavaException(JavaException::capture(self)))
        } else {
            Ok(())
        }
    }

    /// `Throw`
    ///
    /// # Safety
    ///
    /// `obj` must be a valid `java.lang.Throwable` reference.
    pub unsafe fn throw(&self, obj: sys::jthrowable) -> Result<()> {
        let res = jni_call_unchecked!(self, v1_1, Throw, obj);
        if res == sys::JNI_OK {
            Ok(())
        } else {
            Err(Error::JniCall(crate::errors::JniError::Other(res)))
        }
    }

    /// `ThrowNew`
    ///
    /// # Safety
    ///
    /// `class` must be a valid reference to a `Throwable` subclass.
    pub unsafe fn throw_new(&self, class: sys::jclass, msg: &str) -> Result<()> {
        let msg = JNIString::new(msg)?;
        let res = jni_call_unchecked!(self, v1_1, ThrowNew, class, msg.as_ptr());
        if res == sys::JNI_OK {
            Ok(())
        } else {
            Err(Error::JniCall(crate::errors::JniError::Other(res)))
        }
    }

    /// `FatalError`: aborts the VM (and the process).
    #[allow(unreachable_code)]
    pub fn fatal_error(&self, msg: &str) -> ! {
        if let Ok(msg) = JNIString::new(msg) {
            unsafe { jni_call_unchecked!(self, v1_1, FatalError, msg.as_ptr()) };
        }
        std::process::abort()
    }

    // Classes

    /// `FindClass` with a slashed name like `java/lang/String` (or an array
    /// descriptor like `[I`).
    pub fn find_class(&self, name: &str) -> Result<sys::jclass> {
        let name = JNIString::new(name)?;
        unsafe { jni_call_check_ex_and_null_ret!(self, v1_1, FindClass, name.as_ptr()) }
    }

    /// `GetSuperclass`; `null` for `java.lang.Object` and interfaces.
    ///
    /// # Safety
    ///
    /// `class` must be a valid class reference.
    pub unsafe fn get_superclass(&self, class: sys::jclass) -> Result<sys::jclass> {
        jni_call_check_ex!(self, v1_1, GetSuperclass, class)
    }

    /// `IsAssignableFrom`
    ///
    /// # Safety
    ///
    /// Both arguments must be valid class references.
    pub unsafe fn is_assignable_from(&self, sub: sys::jclass, sup: sys::jclass) -> Result<bool> {
        jni_call_check_ex!(self, v1_1, IsAssignableFrom, sub, sup)
    }

    /// `GetObjectClass`
    ///
    /// # Safety
    ///
    /// `obj` must be a valid, non-null reference.
    pub unsafe fn get_object_class(&self, obj: sys::jobject) -> Result<sys::jclass> {
        jni_call_check_ex_and_null_ret!(self, v1_1, GetObjectClass, obj)
    }

    /// `IsInstanceOf`. `null` is an instance of every class.
    ///
    /// # Safety
    ///
    /// Both arguments must be valid references.
    pub unsafe fn is_instance_of(&self, obj: sys::jobject, class: sys::jclass) -> Result<bool> {
        jni_call_check_ex!(self, v1_1, IsInstanceOf, obj, class)
    }

    /// `IsSameObject`
    ///
    /// # Safety
    ///
    /// Both arguments must be valid (possibly null) references.
    pub unsafe fn is_same_object(&self, a: sys::jobject, b: sys::jobject) -> Result<bool> {
        jni_call_check_ex!(self, v1_1, IsSameObject, a, b)
    }

    // References and frames

    /// `PushLocalFrame`
    ///
    /// # Safety
    ///
    /// Must be paired with [`Env::pop_local_frame`].
    pub unsafe fn push_local_frame(&self, capacity: i32) -> Result<()> {
        let res = jni_call_check_ex!(self, v1_2, PushLocalFrame, capacity)?;
        crate::errors::jni_error_code_to_result(res).map_err(Error::from)
    }

    /// `PopLocalFrame`, returning `result` as a reference in the outer frame.
    ///
    /// # Safety
    ///
    /// Every local reference created since the matching push is invalid
    /// afterwards.
    pub unsafe fn pop_local_frame(&self, result: sys::jobject) -> sys::jobject {
        jni_call_unchecked!(self, v1_2, PopLocalFrame, result)
    }

    /// `EnsureLocalCapacity`
    pub fn ensure_local_capacity(&self, capacity: jint) -> Result<()> {
        let res = unsafe { jni_call_check_ex!(self, v1_2, EnsureLocalCapacity, capacity)? };
        crate::errors::jni_error_code_to_result(res).map_err(Error::from)
    }

    /// Runs `f` in a new local reference frame with room for at least
    /// `capacity` references. Every local reference created inside is
    /// deleted when `f` returns, whether it returns `Ok`, `Err` or panics.
    pub fn with_local_frame<F, T, E>(&self, capacity: i32, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&Env<'_>) -> std::result::Result<T, E>,
        E: From<Error>,
    {
        unsafe {
            self.push_local_frame(capacity)?;
            let ret = catch_unwind(AssertUnwindSafe(|| f(self)));
            self.pop_local_frame(ptr::null_mut());

            match ret {
                Ok(ret) => ret,
                Err(payload) => resume_unwind(payload),
            }
        }
    }

    /// Like [`Env::with_local_frame`], except the single local reference `f`
    /// returns survives the frame as a new local reference in the outer one.
    pub fn with_local_frame_returning_local<F, E>(
        &self,
        capacity: i32,
        f: F,
    ) -> std::result::Result<sys::jobject, E>
    where
        F: FnOnce(&Env<'_>) -> std::result::Result<sys::jobject, E>,
        E: From<Error>,
    {
        unsafe {
            self.push_local_frame(capacity)?;
            match catch_unwind(AssertUnwindSafe(|| f(self))) {
                Ok(Ok(obj)) => Ok(self.pop_local_frame(obj)),
                Ok(Err(err)) => {
                    self.pop_local_frame(ptr::null_mut());
                    Err(err)
                }
                Err(payload) => {
                    self.pop_local_frame(ptr::null_mut());
                    resume_unwind(payload)
                }
            }
        }
    }

    /// `NewGlobalRef`, owned by the returned [`GlobalRef`].
    ///
    /// # Safety
    ///
    /// `obj` must be a valid, non-null reference.
    pub unsafe fn new_global_ref(&self, obj: sys::jobject) -> Result<GlobalRef> {
        let global = jni_call_check_ex_and_null_ret!(self, v1_1, NewGlobalRef, obj)?;
        Ok(GlobalRef::from_raw(global))
    }

    /// `DeleteGlobalRef`
    ///
    /// # Safety
    ///
    /// `obj` must be a global reference that is not used afterwards.
    pub unsafe fn delete_global_ref(&self, obj: sys::jobject) {
        jni_call_unchecked!(self, v1_1, DeleteGlobalRef, obj)
    }

    /// `NewLocalRef`; `null` if `obj` is a cleared weak reference.
    ///
    /// # Safety
    ///
    /// `obj` must be a valid reference.
    pub unsafe fn new_local_ref(&self, obj: sys::jobject) -> Result<sys::jobject> {
        jni_call_check_ex!(self, v1_2, NewLocalRef, obj)
    }

    /// `DeleteLocalRef`. Deleting `null` is a no-op.
    ///
    /// # Safety
    ///
    /// `obj` must be a local reference that is not used afterwards.
    pub unsafe fn delete_local_ref(&self, obj: sys::jobject) {
        if !obj.is_null() {
            jni_call_unchecked!(self, v1_1, DeleteLocalRef, obj)
        }
    }

    /// `NewWeakGlobalRef`
    ///
    /// # Safety
    ///
    /// `obj` must be a valid, non-null reference.
    pub unsafe fn new_weak_global_ref(&self, obj: sys::jobject) -> Result<sys::jweak> {
        jni_call_check_ex_and_null_ret!(self, v1_2, NewWeakGlobalRef, obj)
    }

    /// `DeleteWeakGlobalRef`
    ///
    /// # Safety
    ///
    /// `obj` must be a weak global reference that is not used afterwards.
    pub unsafe fn delete_weak_global_ref(&self, obj: sys::jweak) {
        jni_call_unchecked!(self, v1_2, DeleteWeakGlobalRef, obj)
    }

    /// `GetObjectRefType`
    ///
    /// # Safety
    ///
    /// `obj` must not be a deleted reference.
    pub unsafe fn get_object_ref_type(&self, obj: sys::jobject) -> sys::jobjectRefType {
        jni_call_unchecked!(self, v1_6, GetObjectRefType, obj)
    }

    // Objects and member IDs

    /// `AllocObject`: a new instance without running any constructor.
    ///
    /// # Safety
    ///
    /// `class` must be a valid, non-abstract class reference.
    pub unsafe fn alloc_object(&self, class: sys::jclass) -> Result<sys::jobject> {
        jni_call_check_ex_and_null_ret!(self, v1_1, AllocObject, class)
    }

    /// `NewObjectA`
    ///
    /// # Safety
    ///
    /// `ctor` must be a constructor of `class` and `args` must point to as
    /// many correctly typed values as it takes.
    pub unsafe fn new_object_a(
        &self,
        class: sys::jclass,
        ctor: sys::jmethodID,
        args: *const sys::jvalue,
    ) -> Result<sys::jobject> {
        jni_call_check_ex_and_null_ret!(self, v1_1, NewObjectA, class, ctor, args)
    }

    /// `GetMethodID`
    ///
    /// # Safety
    ///
    /// `class` must be a valid class reference.
    pub unsafe fn get_method_id(&self, class: sys::jclass, name: &str, sig: &str) -> Result<sys::jmethodID> {
        let (c_name, c_sig) = (JNIString::new(name)?, JNIString::new(sig)?);
        jni_call_check_ex_and_null_ret!(self, v1_1, GetMethodID, class, c_name.as_ptr(), c_sig.as_ptr())
    }

    /// `GetStaticMethodID`
    ///
    /// # Safety
    ///
    /// `class` must be a valid class reference.
    pub unsafe fn get_static_method_id(
        &self,
        class: sys::jclass,
        name: &str,
        sig: &str,
    ) -> Result<sys::jmethodID> {
        let (c_name, c_sig) = (JNIString::new(name)?, JNIString::new(sig)?);
        jni_call_check_ex_and_null_ret!(self, v1_1, GetStaticMethodID, class, c_name.as_ptr(), c_sig.as_ptr())
    }

    /// `GetFieldID`
    ///
    /// # Safety
    ///
    /// `class` must be a valid class reference.
    pub unsafe fn get_field_id(&self, class: sys::jclass, name: &str, sig: &str) -> Result<sys::jfieldID> {
        let (c_name, c_sig) = (JNIString::new(name)?, JNIString::new(sig)?);
        jni_call_check_ex_and_null_ret!(self, v1_1, GetFieldID, class, c_name.as_ptr(), c_sig.as_ptr())
    }

    /// `GetStaticFieldID`
    ///
    /// # Safety
    ///
    /// `class` must be a valid class reference.
    pub unsafe fn get_static_field_id(
        &self,
        class: sys::jclass,
        name: &str,
        sig: &str,
    ) -> Result<sys::jfieldID> {
        let (c_name, c_sig) = (JNIString::new(name)?, JNIString::new(sig)?);
        jni_call_check_ex_and_null_ret!(self, v1_1, GetStaticFieldID, class, c_name.as_ptr(), c_sig.as_ptr())
    }

    // Strings

    /// `NewStringUTF` from a Rust string, encoded as modified UTF-8.
    pub fn new_string(&self, s: &str) -> Result<sys::jstring> {
        let s = JNIString::new(s)?;
        unsafe { jni_call_check_ex_and_null_ret!(self, v1_1, NewStringUTF, s.as_ptr()) }
    }

    /// Decode a `java.lang.String` into a Rust string.
    ///
    /// # Safety
    ///
    /// `s` must be a valid, non-null string reference.
    pub unsafe fn get_string(&self, s: sys::jstring) -> Result<String> {
        let chars = self.get_string_utf_chars(s)?;
        let decoded = decode(CStr::from_ptr(chars).to_bytes()).map(|s| s.into_owned());
        self.release_string_utf_chars(s, chars);
        Ok(decoded?)
    }

    /// `GetStringLength`, in UTF-16 units.
    ///
    /// # Safety
    ///
    /// `s` must be a valid, non-null string reference.
    pub unsafe fn get_string_length(&self, s: sys::jstring) -> Result<jsize> {
        jni_call_check_ex!(self, v1_1, GetStringLength, s)
    }

    /// `GetStringUTFLength`, in modified UTF-8 bytes.
    ///
    /// # Safety
    ///
    /// `s` must be a valid, non-null string reference.
    pub unsafe fn get_string_utf_length(&self, s: sys::jstring) -> Result<jsize> {
        jni_call_check_ex!(self, v1_1, GetStringUTFLength, s)
    }

    /// `GetStringUTFChars`
    ///
    /// # Safety
    ///
    /// The returned buffer must be released with
    /// [`Env::release_string_utf_chars`].
    pub unsafe fn get_string_utf_chars(&self, s: sys::jstring) -> Result<*const std::os::raw::c_char> {
        jni_call_check_ex_and_null_ret!(self, v1_1, GetStringUTFChars, s, ptr::null_mut())
    }

    /// `ReleaseStringUTFChars`
    ///
    /// # Safety
    ///
    /// `chars` must come from [`Env::get_string_utf_chars`] on `s`.
    pub unsafe fn release_string_utf_chars(&self, s: sys::jstring, chars: *const std::os::raw::c_char) {
        jni_call_unchecked!(self, v1_1, ReleaseStringUTFChars, s, chars)
    }

    /// `GetStringUTFRegion`: copies `len` UTF-16 units starting at `start`,
    /// encoded as modified UTF-8, into `buf`.
    ///
    /// # Safety
    ///
    /// `buf` must have room for the encoded region plus a terminating NUL.
    pub unsafe fn get_string_utf_region(
        &self,
        s: sys::jstring,
        start: jsize,
        len: jsize,
        buf: *mut std::os::raw::c_char,
    ) -> Result<()> {
        jni_call_check_ex!(self, v1_2, GetStringUTFRegion, s, start, len, buf)
    }

    // Arrays

    /// `GetArrayLength`
    ///
    /// # Safety
    ///
    /// `array` must be a valid, non-null array reference.
    pub unsafe fn get_array_length(&self, array: sys::jarray) -> Result<jsize> {
        jni_call_check_ex!(self, v1_1, GetArrayLength, array)
    }

    /// `NewObjectArray`
    ///
    /// # Safety
    ///
    /// `class` must be a valid class reference and `init` null or an instance
    /// of it.
    pub unsafe fn new_object_array(
        &self,
        len: jsize,
        class: sys::jclass,
        init: sys::jobject,
    ) -> Result<sys::jobjectArray> {
        jni_call_check_ex_and_null_ret!(self, v1_1, NewObjectArray, len, class, init)
    }

    /// `GetObjectArrayElement`
    ///
    /// # Safety
    ///
    /// `array` must be a valid, non-null object array reference.
    pub unsafe fn get_object_array_element(
        &self,
        array: sys::jobjectArray,
        index: jsize,
    ) -> Result<sys::jobject> {
        jni_call_check_ex!(self, v1_1, GetObjectArrayElement, array, index)
    }

    /// `SetObjectArrayElement`
    ///
    /// # Safety
    ///
    /// `array` must be a valid, non-null object array reference and `value`
    /// null or assignable to its element type.
    pub unsafe fn set_object_array_element(
        &self,
        array: sys::jobjectArray,
        index: jsize,
        value: sys::jobject,
    ) -> Result<()> {
        jni_call_check_ex!(self, v1_1, SetObjectArrayElement, array, index, value)
    }

    // Monitors and the VM

    /// `MonitorEnter`
    ///
    /// # Safety
    ///
    /// `obj` must be a valid, non-null reference; every enter must be
    /// matched by [`Env::monitor_exit`] on the same thread.
    pub unsafe fn monitor_enter(&self, obj: sys::jobject) -> Result<()> {
        let res = jni_call_check_ex!(self, v1_1, MonitorEnter, obj)?;
        crate::errors::jni_error_code_to_result(res).map_err(Error::from)
    }

    /// `MonitorExit`
    ///
    /// # Safety
    ///
    /// The current thread must own the monitor of `obj`.
    pub unsafe fn monitor_exit(&self, obj: sys::jobject) -> Result<()> {
        let res = jni_call_check_ex!(self, v1_1, MonitorExit, obj)?;
        crate::errors::jni_error_code_to_result(res).map_err(Error::from)
    }

    /// `GetJavaVM`
    pub fn get_java_vm(&self) -> Result<*mut sys::JavaVM> {
        let mut vm = ptr::null_mut();
        let res = unsafe { jni_call_unchecked!(self, v1_1, GetJavaVM, &mut vm) };
        crate::errors::jni_error_code_to_result(res)?;
        null_check!(vm, "GetJavaVM result")
    }
}

macro_rules! call_families {
    ($( $name:ident => $ret:ty ),* $(,)?) => {
        paste! {
            impl<'local> Env<'local> {
                $(
                    #[doc = concat!("`Call", stringify!($name), "MethodA`")]
                    ///
                    /// # Safety
                    ///
                    /// `method` must belong to the class of `obj` and `args`
                    /// must point to as many correctly typed values as it
                    /// takes.
                    pub unsafe fn [<call_ $name:snake _method_a>](
                        &self,
                        obj: sys::jobject,
                        method: sys::jmethodID,
                        args: *const sys::jvalue,
                    ) -> Result<$ret> {
                        jni_call_check_ex!(self, v1_1, [<Call $name MethodA>], obj, method, args)
                    }

                    #[doc = concat!("`CallStatic", stringify!($name), "MethodA`")]
                    ///
                    /// # Safety
                    ///
                    /// `method` must be a static method of `class` and `args`
                    /// must point to as many correctly typed values as it
                    /// takes.
                    pub unsafe fn [<call_static_ $name:snake _method_a>](
                        &self,
                        class: sys::jclass,
                        method: sys::jmethodID,
                        args: *const sys::jvalue,
                    ) -> Result<$ret> {
                        jni_call_check_ex!(self, v1_1, [<CallStatic $name MethodA>], class, method, args)
                    }

                    #[doc = concat!("`CallNonvirtual", stringify!($name), "MethodA`")]
                    ///
                    /// # Safety
                    ///
                    /// `method` must be declared by `class`, `obj` must be an
                    /// instance of it and `args` must point to as many
                    /// correctly typed values as it takes.
                    pub unsafe fn [<call_nonvirtual_ $name:snake _method_a>](
                        &self,
                        obj: sys::jobject,
                        class: sys::jclass,
                        method: sys::jmethodID,
                        args: *const sys::jvalue,
                    ) -> Result<$ret> {
                        jni_call_check_ex!(self, v1_1, [<CallNonvirtual $name MethodA>], obj, class, method, args)
                    }
                )*
            }
        }
    };
}

call_families! {
    Object => sys::jobject,
    Boolean => sys::jboolean,
    Byte => sys::jbyte,
    Char => sys::jchar,
    Short => sys::jshort,
    Int => sys::jint,
    Long => sys::jlong,
    Float => sys::jfloat,
    Double => sys::jdouble,
    Void => (),
}

macro_rules! field_families {
    ($( $name:ident => $ty:ty ),* $(,)?) => {
        paste! {
            impl<'local> Env<'local> {
                $(
                    #[doc = concat!("`Get", stringify!($name), "Field`")]
                    ///
                    /// # Safety
                    ///
                    /// `field` must be an instance field of the class of `obj`
                    /// with a matching type.
                    pub unsafe fn [<get_ $name:snake _field>](&self, obj: sys::jobject, field: sys::jfieldID) -> Result<$ty> {
                        jni_call_check_ex!(self, v1_1, [<Get $name Field>], obj, field)
                    }

                    #[doc = concat!("`Set", stringify!($name), "Field`")]
                    ///
                    /// # Safety
                    ///
                    /// `field` must be an instance field of the class of `obj`
                    /// with a matching type.
                    pub unsafe fn [<set_ $name:snake _field>](&self, obj: sys::jobject, field: sys::jfieldID, value: $ty) -> Result<()> {
                        jni_call_check_ex!(self, v1_1, [<Set $name Field>], obj, field, value)
                    }

                    #[doc = concat!("`GetStatic", stringify!($name), "Field`")]
                    ///
                    /// # Safety
                    ///
                    /// `field` must be a static field of `class` with a
                    /// matching type.
                    pub unsafe fn [<get_static_ $name:snake _field>](&self, class: sys::jclass, field: sys::jfieldID) -> Result<$ty> {
                        jni_call_check_ex!(self, v1_1, [<GetStatic $name Field>], class, field)
                    }

                    #[doc = concat!("`SetStatic", stringify!($name), "Field`")]
                    ///
                    /// # Safety
                    ///
                    /// `field` must be a static field of `class` with a
                    /// matching type.
                    pub unsafe fn [<set_static_ $name:snake _field>](&self, class: sys::jclass, field: sys::jfieldID, value: $ty) -> Result<()> {
                        jni_call_check_ex!(self, v1_1, [<SetStatic $name Field>], class, field, value)
                    }
                )*
            }
        }
    };
}

field_families! {
    Object => sys::jobject,
    Boolean => sys::jboolean,
    Byte => sys::jbyte,
    Char => sys::jchar,
    Short => sys::jshort,
    Int => sys::jint,
    Long => sys::jlong,
    Float => sys::jfloat,
    Double => sys::jdouble,
}

macro_rules! primitive_array_families {
    ($( $name:ident => $ty:ty ),* $(,)?) => {
        paste! {
            impl<'local> Env<'local> {
                $(
                    #[doc = concat!("`New", stringify!($name), "Array`")]
                    pub fn [<new_ $name:snake _array>](&self, len: jsize) -> Result<sys::jarray> {
                        unsafe { jni_call_check_ex_and_null_ret!(self, v1_1, [<New $name Array>], len) }
                    }

                    #[doc = concat!("`Get", stringify!($name), "ArrayElements`")]
                    ///
                    /// # Safety
                    ///
                    /// `array` must be a valid array of the matching element
                    /// type, and the buffer must be released with the
                    /// matching release function.
                    pub unsafe fn [<get_ $name:snake _array_elements>](&self, array: sys::jarray) -> Result<*mut $ty> {
                        jni_call_check_ex_and_null_ret!(self, v1_1, [<Get $name ArrayElements>], array, ptr::null_mut())
                    }

                    #[doc = concat!("`Release", stringify!($name), "ArrayElements`")]
                    ///
                    /// # Safety
                    ///
                    /// `elems` must come from the matching get function on
                    /// `array` and must not be used afterwards (unless `mode`
                    /// is [`ReleaseMode::Commit`]).
                    pub unsafe fn [<release_ $name:snake _array_elements>](&self, array: sys::jarray, elems: *mut $ty, mode: ReleaseMode) {
                        jni_call_unchecked!(self, v1_1, [<Release $name ArrayElements>], array, elems, mode.into())
                    }

                    #[doc = concat!("`Get", stringify!($name), "ArrayRegion`")]
                    ///
                    /// # Safety
                    ///
                    /// `array` must be a valid array of the matching element
                    /// type.
                    pub unsafe fn [<get_ $name:snake _array_region>](&self, array: sys::jarray, start: jsize, buf: &mut [$ty]) -> Result<()> {
                        jni_call_check_ex!(self, v1_1, [<Get $name ArrayRegion>], array, start, buf.len() as jsize, buf.as_mut_ptr())
                    }

                    #[doc = concat!("`Set", stringify!($name), "ArrayRegion`")]
                    ///
                    /// # Safety
                    ///
                    /// `array` must be a valid array of the matching element
                    /// type.
                    pub unsafe fn [<set_ $name:snake _array_region>](&self, array: sys::jarray, start: jsize, buf: &[$ty]) -> Result<()> {
                        jni_call_check_ex!(self, v1_1, [<Set $name ArrayRegion>], array, start, buf.len() as jsize, buf.as_ptr())
                    }
                )*
            }
        }
    };
}

primitive_array_families! {
    Boolean => sys::jboolean,
    Byte => sys::jbyte,
    Char => sys::jchar,
    Short => sys::jshort,
    Int => sys::jint,
    Long => sys::jlong,
    Float => sys::jfloat,
    Double => sys::jdouble,
}
