use std::fmt;

use log::error;

use crate::{errors::Result, refs::GlobalRef, sys, Value};

use super::ClassWrapper;

/// A Java object: an instance reference plus the class it was created or
/// wrapped as.
#[derive(Clone)]
pub struct JObject {
    class: ClassWrapper,
    obj: GlobalRef,
}

impl JObject {
    /// Pair an instance with its class. `obj` is not checked against
    /// `class`.
    pub fn new(class: ClassWrapper, obj: GlobalRef) -> Self {
        JObject { class, obj }
    }

    /// The class this object is typed as.
    pub fn class(&self) -> &ClassWrapper {
        &self.class
    }

    /// Dotted name of [`JObject::class`].
    pub fn class_name(&self) -> String {
        self.class.get_name()
    }

    /// The instance reference.
    pub fn global_ref(&self) -> &GlobalRef {
        &self.obj
    }

    /// The raw instance reference.
    pub fn as_raw(&self) -> sys::jobject {
        self.obj.as_raw()
    }

    /// Resolve and call an instance method in one go.
    pub fn call_method(&self, name: &str, sig: &str, args: &[Value]) -> Result<Value> {
        self.class.method(name, sig)?.call(self, args)
    }

    /// `Object.toString()`.
    pub fn to_java_string(&self) -> Result<Option<String>> {
        self.call_method("toString", "()Ljava/lang/String;", &[])?.str()
    }

    /// `Object.equals(other)`.
    pub fn java_equals(&self, other: &JObject) -> Result<bool> {
        self.call_method("equals", "(Ljava/lang/Object;)Z", &[Value::Object(other.obj.clone())])?
            .z()
    }

    /// Reference identity (`IsSameObject`).
    pub fn is_same_object(&self, other: &JObject) -> Result<bool> {
        unsafe { self.class.env()?.is_same_object(self.as_raw(), other.as_raw()) }
    }

    /// Enter the object's monitor; it is exited when the guard drops.
    pub fn monitor(&self) -> Result<MonitorGuard<'_>> {
        unsafe { self.class.env()?.monitor_enter(self.as_raw())? };
        Ok(MonitorGuard { obj: self })
    }
}

impl AsRef<GlobalRef> for JObject {
    fn as_ref(&self) -> &GlobalRef {
        &self.obj
    }
}

impl PartialEq for JObject {
    fn eq(&self, other: &Self) -> bool {
        self.is_same_object(other).unwrap_or(false)
    }
}

impl fmt::Debug for JObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JObject")
            .field("class", &self.class.name())
            .field("obj", &self.obj)
            .finish()
    }
}

impl From<JObject> for Value {
    fn from(obj: JObject) -> Self {
        Value::Object(obj.obj)
    }
}

/// Holds an object's monitor; see [`JObject::monitor`].
#[derive(Debug)]
pub struct MonitorGuard<'a> {
    obj: &'a JObject,
}

impl Drop for MonitorGuard<'_> {
    fn drop(&mut self) {
        let res = self
            .obj
            .class
            .env()
            .and_then(|env| unsafe { env.monitor_exit(self.obj.as_raw()) });
        if let Err(e) = res {
            error!("Error exiting monitor of {:?}: {e}", self.obj);
        }
    }
}
