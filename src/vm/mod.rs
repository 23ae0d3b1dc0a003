//! The process-wide Java VM and thread attachment.
//!
//! There is at most one [`Context`] per process. It is created lazily by the
//! first [`get_env`] call (with the `invocation` feature) or adopted from an
//! existing VM with [`Context::from_raw`]. Every thread that wants to call
//! into Java must be attached; [`get_env`] attaches the calling thread until
//! it exits, [`Context::attach`] attaches it for the lifetime of a guard.

mod context;
pub use context::{get_env, AttachGuard, Context};
pub(crate) use context::detach_count;

mod init_args;
pub use init_args::{InitArgs, InitArgsBuilder, JvmOptions};

pub mod locate;

mod signal;
pub use signal::check_hangup;
