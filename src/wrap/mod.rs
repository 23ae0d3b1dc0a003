//! Class and member resolution.
//!
//! [`get_env`] hands out the calling thread's [`ThreadEnv`], which resolves
//! classes by name and caches them. A [`ClassWrapper`] resolves members by
//! name and signature into handles ([`Field`], [`StaticField`], [`Method`],
//! [`StaticMethod`], [`Constructor`]) that carry their converters, so calling
//! one is just argument pass-through.
//!
//! Every handle here is bound to the thread that created it. The class cache
//! is per thread too: two threads resolving the same class each do their own
//! lookup.
//!
//! Resolution failures ([`Error::ClassNotFound`],
//! [`Error::MethodNotFound`], [`Error::FieldNotFound`]) are fatal: they mean
//! the code was built against a different classpath.
//!
//! [`Error::ClassNotFound`]: crate::errors::Error::ClassNotFound
//! [`Error::MethodNotFound`]: crate::errors::Error::MethodNotFound
//! [`Error::FieldNotFound`]: crate::errors::Error::FieldNotFound

mod class;
pub use class::ClassWrapper;

mod members;
pub use members::{Constructor, Field, Method, StaticField, StaticMethod};

mod object;
pub use object::{JObject, MonitorGuard};

mod thread_env;
pub use thread_env::{get_env, ThreadEnv};
