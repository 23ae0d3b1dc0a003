#![warn(missing_docs)]
#![allow(clippy::upper_case_acronyms)]
// We're going to be dealing with a lot of raw JNI pointers
#![allow(clippy::not_unsafe_ptr_arg_deref)]

//! # Overview
//!
//! `rs2jdbc` embeds a Java VM through the JNI invocation API and lets Rust
//! code call into it by *signature*: given a member name and a type signature
//! such as `"(ILjava/lang/String;)[I"`, the bridge resolves the right native
//! entry point, converts every argument into its native representation,
//! performs the call, converts the result back into a [`Value`] and releases
//! any temporary native resources it created along the way.
//!
//! On top of that core sits [`sql`], a small DB-API shaped client for JDBC
//! drivers that are reachable on the VM's classpath.
//!
//! The layers, from the bottom up:
//!
//! * [`vm`]: the single process-wide [`vm::Context`] and per-thread
//!   attachment.
//! * [`env::Env`]: a 1:1 typed shim over the JNI environment table. Every
//!   call that can raise drains the pending exception into
//!   [`errors::Error::JavaException`].
//! * [`signature`] and [`sigtype`]: the signature grammar and the closed set
//!   of converters ([`sigtype::SigType`]) built from it.
//! * [`wrap`]: per-thread class/member resolution with caching.
//! * [`sql`]: `connect`, `Connection` and `Cursor`.
//!
//! # Example
//!
//! ```rust,no_run
//! # fn main() -> rs2jdbc::errors::Result<()> {
//! use rs2jdbc::{vm::JvmOptions, wrap, Value};
//!
//! let env = wrap::get_env(&JvmOptions::default())?;
//! let math = env.get("java.lang.Math")?;
//! let abs = math.static_method("abs", "(I)I")?;
//!
//! assert_eq!(abs.call(&[Value::from(-10)])?.i()?, 10);
//! # Ok(())
//! # }
//! ```
//!
//! # Threads
//!
//! An [`env::Env`] (and everything in [`wrap`] built from it) is bound to the
//! thread that attached it and is neither `Send` nor `Sync`. Global
//! references and [`Value`]s can be moved between threads freely; each
//! thread resolves its own classes.

/// `jni-sys` re-exports
pub mod sys {
    pub use jni_sys::*;
}

#[macro_use]
mod macros;

/// Errors. Do you really need an explanation?
pub mod errors;

/// JNI version constants
mod version;
pub use crate::version::JNIVersion;

/// Modified UTF-8 encoding and decoding
pub mod strings;

/// Parser for field and method type signatures
pub mod signature;

/// The Java VM and thread attachment
pub mod vm;

/// Typed forwarding over the JNI environment table
pub mod env;

/// Global references and array release modes
pub mod refs;

/// Host-side values
mod value;
pub use crate::value::Value;

/// Signature-driven converters
pub mod sigtype;

/// Class and member resolution
pub mod wrap;

/// DB-API style JDBC client
pub mod sql;

// Used to ensure that a `Result` returned from a macro is used.
#[doc(hidden)]
#[inline(always)]
#[must_use]
pub fn __must_use<T>(v: T) -> T {
    v
}
