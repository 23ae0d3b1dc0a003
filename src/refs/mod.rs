//! Reference lifetimes.
//!
//! Local references are scoped by [`Env::with_local_frame`][crate::env::Env::with_local_frame];
//! anything that must outlive a frame is promoted to a [`GlobalRef`].

mod global;
pub use global::GlobalRef;

mod release_mode;
pub use release_mode::ReleaseMode;
