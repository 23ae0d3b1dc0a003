use std::{fmt, sync::Arc};

use log::{debug, warn};

use crate::{sys::jobject, vm::Context};

/// A global JVM reference. These are "pinned" by the garbage collector and are
/// guaranteed to not get collected until released. Thus, this is allowed to
/// outlive the local frame it came from and can be sent to other threads.
///
/// Cloning is cheap and shares the underlying reference, which is deleted
/// exactly once when the last clone is dropped. Dropping on a thread that
/// isn't attached attaches it for the duration of the delete, which is slow;
/// a warning is logged when that happens.
#[derive(Clone)]
pub struct GlobalRef {
    inner: Arc<GlobalRefGuard>,
}

struct GlobalRefGuard {
    obj: jobject,
}

unsafe impl Send for GlobalRefGuard {}
unsafe impl Sync for GlobalRefGuard {}

impl GlobalRef {
    /// Take ownership of a reference created with `NewGlobalRef`.
    ///
    /// # Safety
    ///
    /// `obj` must be a valid, non-null global reference that nothing else
    /// will delete.
    pub unsafe fn from_raw(obj: jobject) -> Self {
        GlobalRef {
            inner: Arc::new(GlobalRefGuard { obj }),
        }
    }

    /// The raw reference. Only valid while `self` (or a clone) is alive.
    pub fn as_raw(&self) -> jobject {
        self.inner.obj
    }
}

impl AsRef<GlobalRef> for GlobalRef {
    fn as_ref(&self) -> &GlobalRef {
        self
    }
}

impl fmt::Debug for GlobalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GlobalRef").field(&self.inner.obj).finish()
    }
}

impl Drop for GlobalRefGuard {
    fn drop(&mut self) {
        let ctx = match Context::singleton() {
            Ok(ctx) => ctx,
            Err(e) => {
                debug!("Leaking global ref {:?}: {e}", self.obj);
                return;
            }
        };
        if ctx.is_destroyed() {
            return;
        }

        let obj = self.obj;
        let res = ctx.with_env(|env| {
            if !env.was_attached() {
                warn!("A global reference was dropped on a thread that is not attached to the Java VM. This is slow if it happens frequently.");
            }
            // Safety: DeleteGlobalRef is safe to call with a pending exception.
            unsafe { env.delete_global_ref(obj) };
            Ok(())
        });

        if let Err(e) = res {
            debug!("error dropping global ref: {e:#?}");
        }
    }
}
