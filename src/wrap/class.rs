use std::{fmt, ptr, rc::Rc};

use log::trace;

use crate::{
    env::Env,
    errors::{Error, Result},
    refs::GlobalRef,
    sigtype::{self, FieldTarget},
    sys, Value,
};

use super::{
    members::{Constructor, Field, Method, StaticField, StaticMethod},
    thread_env::{map_not_found, Shared},
    ThreadEnv,
};

const CLASS_NOT_FOUND: [&str; 2] = ["java.lang.NoClassDefFoundError", "java.lang.ClassNotFoundException"];
const FIELD_NOT_FOUND: [&str; 1] = ["java.lang.NoSuchFieldError"];
const METHOD_NOT_FOUND: [&str; 1] = ["java.lang.NoSuchMethodError"];

/// A resolved class, pinned by a global reference.
///
/// Obtained from [`ThreadEnv::get`]. Cheap to clone; bound to the thread
/// whose [`ThreadEnv`] resolved it.
#[derive(Clone)]
pub struct ClassWrapper {
    inner: Rc<Inner>,
}

struct Inner {
    shared: Rc<Shared>,
    name: String,
    class: GlobalRef,
}

impl ClassWrapper {
    pub(super) fn resolve(shared: Rc<Shared>, name: &str) -> Result<Self> {
        let class = shared.env()?.with_local_frame(2, |env| -> Result<GlobalRef> {
            let local = env
                .find_class(name)
                .map_err(|e| map_not_found(e, &CLASS_NOT_FOUND, || Error::ClassNotFound(name.to_owned())))?;
            unsafe { env.new_global_ref(local) }
        })?;

        Ok(ClassWrapper {
            inner: Rc::new(Inner {
                shared,
                name: name.to_owned(),
                class,
            }),
        })
    }

    /// The wrapper for the runtime class of `obj`, through the cache of
    /// `env`.
    pub fn from_object(env: &ThreadEnv, obj: &GlobalRef) -> Result<Self> {
        let (name, class) = env.env()?.with_local_frame(4, |env| -> Result<(String, GlobalRef)> {
            unsafe {
                let class = env.get_object_class(obj.as_raw())?;
                let class_class = env.get_object_class(class)?;
                let get_name = env.get_method_id(class_class, "getName", "()Ljava/lang/String;")?;
                let name = env.call_object_method_a(class, get_name, ptr::null())?;
                let name = env.get_string(null_check!(name, "Class.getName result")?)?;
                Ok((name.replace('.', "/"), env.new_global_ref(class)?))
            }
        })?;

        if let Some(cached) = env.cached(&name) {
            return Ok(cached);
        }
        trace!("Caching runtime class {name}");
        let wrapper = ClassWrapper {
            inner: Rc::new(Inner {
                shared: env.shared().clone(),
                name: name.clone(),
                class,
            }),
        };
        Ok(env.insert(name, wrapper))
    }

    pub(super) fn env(&self) -> Result<&Env<'static>> {
        self.inner.shared.env()
    }

    /// Slashed class name, e.g. `java/lang/String`.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Dotted class name, e.g. `java.lang.String`.
    pub fn get_name(&self) -> String {
        self.inner.name.replace('/', ".")
    }

    /// The class reference.
    pub fn as_raw(&self) -> sys::jclass {
        self.inner.class.as_raw()
    }

    /// Is `obj` an instance of this class?
    pub fn is_instance(&self, obj: &impl AsRef<GlobalRef>) -> Result<bool> {
        unsafe { self.env()?.is_instance_of(obj.as_ref().as_raw(), self.as_raw()) }
    }

    /// Resolve an instance field.
    pub fn field(&self, name: &str, sig: &str) -> Result<Field> {
        let ty = sigtype::parse_field(sig)?;
        let id = unsafe { self.env()?.get_field_id(self.as_raw(), name, sig) }
            .map_err(|e| self.field_not_found(e, name, sig))?;
        trace!("Resolved field {}.{name} {sig}", self.name());
        Ok(Field::new(self.clone(), name, id, ty))
    }

    /// Read a static field once, now.
    ///
    /// The value is a snapshot: later changes to the field are not seen.
    /// Use [`ClassWrapper::static_field_live`] for a field that changes.
    pub fn static_field(&self, name: &str, sig: &str) -> Result<Value> {
        self.static_field_live(name, sig)?.get()
    }

    /// Resolve a static field for repeated reads and writes.
    pub fn static_field_live(&self, name: &str, sig: &str) -> Result<StaticField> {
        let ty = sigtype::parse_field(sig)?;
        let id = unsafe { self.env()?.get_static_field_id(self.as_raw(), name, sig) }
            .map_err(|e| self.field_not_found(e, name, sig))?;
        trace!("Resolved static field {}.{name} {sig}", self.name());
        Ok(StaticField::new(self.clone(), name, id, ty))
    }

    /// Resolve an instance method, called virtually.
    pub fn method(&self, name: &str, sig: &str) -> Result<Method> {
        self.instance_method(name, sig, false)
    }

    /// Resolve an instance method that is always dispatched to this class's
    /// implementation, even on instances of a subclass that overrides it.
    pub fn nonvirtual_method(&self, name: &str, sig: &str) -> Result<Method> {
        self.instance_method(name, sig, true)
    }

    fn instance_method(&self, name: &str, sig: &str, nonvirtual: bool) -> Result<Method> {
        let (args, ret) = sigtype::parse_method(sig)?;
        let id = unsafe { self.env()?.get_method_id(self.as_raw(), name, sig) }
            .map_err(|e| self.method_not_found(e, name, sig))?;
        trace!("Resolved method {}.{name}{sig}", self.name());
        Ok(Method::new(self.clone(), name, id, args, ret, nonvirtual))
    }

    /// Resolve a static method.
    pub fn static_method(&self, name: &str, sig: &str) -> Result<StaticMethod> {
        let (args, ret) = sigtype::parse_method(sig)?;
        let id = unsafe { self.env()?.get_static_method_id(self.as_raw(), name, sig) }
            .map_err(|e| self.method_not_found(e, name, sig))?;
        trace!("Resolved static method {}.{name}{sig}", self.name());
        Ok(StaticMethod::new(self.clone(), name, id, args, ret))
    }

    /// Resolve a constructor from its argument types, either as a full
    /// signature (`"(I)V"`) or the bare argument list (`"I"`).
    pub fn constructor(&self, sig: &str) -> Result<Constructor> {
        let (args, ret) = sigtype::parse_constructor(self.name(), sig)?;
        let full_sig = sigtype::constructor_signature(&args);
        let id = unsafe { self.env()?.get_method_id(self.as_raw(), "<init>", &full_sig) }
            .map_err(|e| self.method_not_found(e, "<init>", &full_sig))?;
        trace!("Resolved constructor {}{full_sig}", self.name());
        Ok(Constructor::new(self.clone(), id, args, ret))
    }

    pub(super) fn static_target(&self) -> FieldTarget {
        FieldTarget::Static(self.as_raw())
    }

    fn field_not_found(&self, err: Error, name: &str, sig: &str) -> Error {
        map_not_found(err, &FIELD_NOT_FOUND, || Error::FieldNotFound {
            name: format!("{}.{name}", self.get_name()),
            sig: sig.to_owned(),
        })
    }

    fn method_not_found(&self, err: Error, name: &str, sig: &str) -> Error {
        map_not_found(err, &METHOD_NOT_FOUND, || Error::MethodNotFound {
            name: format!("{}.{name}", self.get_name()),
            sig: sig.to_owned(),
        })
    }
}

impl fmt::Debug for ClassWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassWrapper")
            .field("name", &self.inner.name)
            .field("class", &self.inner.class)
            .finish()
    }
}
