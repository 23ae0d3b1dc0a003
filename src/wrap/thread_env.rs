use std::{cell::RefCell, collections::HashMap, rc::Rc};

use log::trace;

use crate::{
    env::Env,
    errors::{Error, Result},
    refs::GlobalRef,
    vm::{self, check_hangup, Context, JvmOptions},
};

use super::{ClassWrapper, JObject};

/// Classes every thread resolves up front; exception decoding needs them.
const PRELOADED: [&str; 3] = [
    "java/lang/Object",
    "java/lang/Throwable",
    "java/lang/StackTraceElement",
];

thread_local! {
    static THREAD_ENV: RefCell<Option<ThreadEnv>> = const { RefCell::new(None) };
}

/// The calling thread's resolution context, creating the VM and attaching
/// the thread first if needed.
///
/// The same instance is returned for every later call on this thread until
/// the thread is detached; after that a fresh one is built on a new
/// attachment. Once the VM is destroyed this fails with
/// [`Error::JavaVMDestroyed`]. `options` only matter to the call that
/// creates the VM.
pub fn get_env(options: &JvmOptions) -> Result<ThreadEnv> {
    check_hangup()?;
    if let Some(env) = THREAD_ENV.with(|cell| cell.borrow().clone()) {
        match env.shared.env().map(|_| ()) {
            Ok(()) => return Ok(env),
            Err(Error::ThreadDetached) => trace!("Thread was detached, rebuilding its environment"),
            Err(e) => return Err(e),
        }
    }
    // Dropped outside the borrow; its global refs may need to attach.
    let stale = THREAD_ENV.with(|cell| cell.borrow_mut().take());
    drop(stale);

    let env = ThreadEnv::new(vm::get_env(options)?)?;
    THREAD_ENV.with(|cell| *cell.borrow_mut() = Some(env.clone()));
    Ok(env)
}

pub(super) struct Shared {
    env: Env<'static>,
    detaches: u64,
}

impl Shared {
    /// The environment, unless the thread was detached or the VM destroyed
    /// since it was obtained.
    pub(super) fn env(&self) -> Result<&Env<'static>> {
        check_hangup()?;
        if Context::singleton().is_ok_and(|ctx| ctx.is_destroyed()) {
            return Err(Error::JavaVMDestroyed);
        }
        if vm::detach_count() != self.detaches {
            return Err(Error::ThreadDetached);
        }
        Ok(&self.env)
    }
}

/// Per-thread class resolution with a cache keyed by slashed class name.
///
/// Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct ThreadEnv {
    shared: Rc<Shared>,
    classes: Rc<RefCell<HashMap<String, ClassWrapper>>>,
}

impl ThreadEnv {
    /// Wrap an attached environment and preload the core classes.
    ///
    /// `env` must belong to the current thread's present attachment.
    pub fn new(env: Env<'static>) -> Result<Self> {
        let thread_env = ThreadEnv {
            shared: Rc::new(Shared {
                env,
                detaches: vm::detach_count(),
            }),
            classes: Rc::new(RefCell::new(HashMap::new())),
        };
        for name in PRELOADED {
            thread_env.get(name)?;
        }
        Ok(thread_env)
    }

    /// The underlying environment.
    ///
    /// Fails with [`Error::ThreadDetached`] once the thread has been detached
    /// and with [`Error::JavaVMDestroyed`] once the VM is gone.
    pub fn env(&self) -> Result<&Env<'static>> {
        self.shared.env()
    }

    pub(super) fn shared(&self) -> &Rc<Shared> {
        &self.shared
    }

    /// Resolve a class by dotted (`java.lang.String`) or slashed
    /// (`java/lang/String`) name. Array descriptors like `[I` work too.
    pub fn get(&self, name: &str) -> Result<ClassWrapper> {
        self.shared.env()?;
        let name = normalize(name);
        if let Some(class) = self.classes.borrow().get(&name) {
            return Ok(class.clone());
        }

        trace!("Resolving class {name}");
        let class = ClassWrapper::resolve(self.shared.clone(), &name)?;
        Ok(self.insert(name, class))
    }

    pub(super) fn cached(&self, name: &str) -> Option<ClassWrapper> {
        self.classes.borrow().get(&normalize(name)).cloned()
    }

    pub(super) fn insert(&self, name: String, class: ClassWrapper) -> ClassWrapper {
        self.classes.borrow_mut().entry(name).or_insert(class).clone()
    }

    /// Number of classes resolved on this thread so far.
    pub fn cached_classes(&self) -> usize {
        self.classes.borrow().len()
    }

    /// Wrap an object reference in a proxy typed by its runtime class.
    pub fn wrap_object(&self, obj: GlobalRef) -> Result<JObject> {
        let class = ClassWrapper::from_object(self, &obj)?;
        Ok(JObject::new(class, obj))
    }

    /// Like [`ThreadEnv::wrap_object`] for a call result; `None` for `null`.
    pub fn wrap_value(&self, value: crate::Value) -> Result<Option<JObject>> {
        value.l()?.map(|obj| self.wrap_object(obj)).transpose()
    }
}

impl std::fmt::Debug for ThreadEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadEnv")
            .field("env", &self.shared.env)
            .field("classes", &self.classes.borrow().keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Map a failed lookup to `not_found` if it failed because the thing doesn't
/// exist: a silent `null` or one of the `expected` Java errors.
pub(super) fn map_not_found(err: Error, expected: &[&str], not_found: impl FnOnce() -> Error) -> Error {
    let missing = match &err {
        Error::NullPtr(_) => true,
        Error::JavaException(e) => e.class_name().is_some_and(|c| expected.contains(&c)),
        _ => false,
    };
    if missing {
        not_found()
    } else {
        err
    }
}

fn normalize(name: &str) -> String {
    name.replace('.', "/")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn normalizes_names() {
        assert_eq!(normalize("java.lang.String"), "java/lang/String");
        assert_eq!(normalize("java/lang/String"), "java/lang/String");
        assert_eq!(normalize("[Ljava.lang.String;"), "[Ljava/lang/String;");
    }

    #[test]
    fn maps_null_to_not_found() {
        let err = map_not_found(Error::NullPtr("FindClass result"), &[], || {
            Error::ClassNotFound("a/B".into())
        });
        assert!(matches!(err, Error::ClassNotFound(name) if name == "a/B"));

        let err = map_not_found(Error::Hangup, &[], || Error::ClassNotFound("a/B".into()));
        assert!(matches!(err, Error::Hangup));
    }
}
