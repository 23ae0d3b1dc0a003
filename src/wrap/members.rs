use std::fmt;

use crate::{
    errors::Result,
    refs::GlobalRef,
    sigtype::{CallTarget, FieldTarget, SigType},
    sys, Value,
};

use super::{ClassWrapper, JObject};

/// A resolved instance field.
pub struct Field {
    class: ClassWrapper,
    name: String,
    id: sys::jfieldID,
    ty: SigType,
}

impl Field {
    pub(super) fn new(class: ClassWrapper, name: &str, id: sys::jfieldID, ty: SigType) -> Self {
        Field {
            class,
            name: name.to_owned(),
            id,
            ty,
        }
    }

    /// Read the field of `obj`.
    pub fn get(&self, obj: &impl AsRef<GlobalRef>) -> Result<Value> {
        self.ty
            .get_field(self.class.env()?, FieldTarget::Instance(obj.as_ref().as_raw()), self.id)
    }

    /// Write the field of `obj`.
    pub fn set(&self, obj: &impl AsRef<GlobalRef>, value: &Value) -> Result<()> {
        self.ty.set_field(
            self.class.env()?,
            FieldTarget::Instance(obj.as_ref().as_raw()),
            self.id,
            value,
        )
    }

    /// The field's converter.
    pub fn sig_type(&self) -> &SigType {
        &self.ty
    }
}

/// A resolved static field, read and written on demand.
pub struct StaticField {
    class: ClassWrapper,
    name: String,
    id: sys::jfieldID,
    ty: SigType,
}

impl StaticField {
    pub(super) fn new(class: ClassWrapper, name: &str, id: sys::jfieldID, ty: SigType) -> Self {
        StaticField {
            class,
            name: name.to_owned(),
            id,
            ty,
        }
    }

    /// Read the current value.
    pub fn get(&self) -> Result<Value> {
        self.ty.get_field(self.class.env()?, self.class.static_target(), self.id)
    }

    /// Write a new value.
    pub fn set(&self, value: &Value) -> Result<()> {
        self.ty
            .set_field(self.class.env()?, self.class.static_target(), self.id, value)
    }
}

/// A resolved instance method.
pub struct Method {
    class: ClassWrapper,
    name: String,
    id: sys::jmethodID,
    args: Vec<SigType>,
    ret: SigType,
    nonvirtual: bool,
}

impl Method {
    pub(super) fn new(
        class: ClassWrapper,
        name: &str,
        id: sys::jmethodID,
        args: Vec<SigType>,
        ret: SigType,
        nonvirtual: bool,
    ) -> Self {
        Method {
            class,
            name: name.to_owned(),
            id,
            args,
            ret,
            nonvirtual,
        }
    }

    /// Call the method on `obj`.
    pub fn call(&self, obj: &impl AsRef<GlobalRef>, args: &[Value]) -> Result<Value> {
        let obj = obj.as_ref().as_raw();
        let target = if self.nonvirtual {
            CallTarget::Nonvirtual(obj, self.class.as_raw())
        } else {
            CallTarget::Instance(obj)
        };
        self.ret.call(self.class.env()?, target, self.id, &self.args, args)
    }

    /// Argument converters, in order.
    pub fn arg_types(&self) -> &[SigType] {
        &self.args
    }

    /// Return converter.
    pub fn return_type(&self) -> &SigType {
        &self.ret
    }
}

/// A resolved static method.
pub struct StaticMethod {
    class: ClassWrapper,
    name: String,
    id: sys::jmethodID,
    args: Vec<SigType>,
    ret: SigType,
}

impl StaticMethod {
    pub(super) fn new(
        class: ClassWrapper,
        name: &str,
        id: sys::jmethodID,
        args: Vec<SigType>,
        ret: SigType,
    ) -> Self {
        StaticMethod {
            class,
            name: name.to_owned(),
            id,
            args,
            ret,
        }
    }

    /// Call the method.
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        self.ret.call(
            self.class.env()?,
            CallTarget::Static(self.class.as_raw()),
            self.id,
            &self.args,
            args,
        )
    }
}

/// A resolved constructor.
pub struct Constructor {
    class: ClassWrapper,
    id: sys::jmethodID,
    args: Vec<SigType>,
    ret: SigType,
}

impl Constructor {
    pub(super) fn new(class: ClassWrapper, id: sys::jmethodID, args: Vec<SigType>, ret: SigType) -> Self {
        Constructor { class, id, args, ret }
    }

    /// Allocate and initialize a new instance.
    pub fn new_object(&self, args: &[Value]) -> Result<JObject> {
        let value = self.ret.call(
            self.class.env()?,
            CallTarget::Constructor(self.class.as_raw()),
            self.id,
            &self.args,
            args,
        )?;
        let obj = value.l()?.ok_or(crate::errors::Error::NullPtr("NewObjectA result"))?;
        Ok(JObject::new(self.class.clone(), obj))
    }
}

macro_rules! debug_member {
    ($ty:ident, $kind:literal) => {
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({}.{})", $kind, self.class.name(), self.name)
            }
        }
    };
}

debug_member!(Field, "Field");
debug_member!(StaticField, "StaticField");
debug_member!(Method, "Method");
debug_member!(StaticMethod, "StaticMethod");

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Constructor({}{})", self.class.name(), crate::sigtype::constructor_signature(&self.args))
    }
}
