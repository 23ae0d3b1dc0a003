use std::{
    cell::{Cell, RefCell},
    ops::Deref,
    ptr,
    sync::atomic::{AtomicU8, AtomicUsize, Ordering},
    thread::current,
};

use log::{debug, error};
use once_cell::sync::OnceCell;

use crate::{
    env::Env,
    errors::{jni_error_code_to_result, Error, JniError, Result},
    sys, JNIVersion,
};

use super::{signal, JvmOptions};

static CONTEXT: OnceCell<Context> = OnceCell::new();

static ATTACHED_THREADS: AtomicUsize = AtomicUsize::new(0);

const RUNNING: u8 = 0;
const DESTROYING: u8 = 1;
const DESTROYED: u8 = 2;

/// The Java VM of this process.
///
/// Obtained with [`Context::get_or_init`] (which loads and starts a VM if
/// needed), [`Context::from_raw`] (which adopts one that already exists) or
/// [`Context::singleton`] once either has run. There is never more than one:
/// creation happens under a one-time initialization guard, so concurrent
/// first callers all end up with the same instance.
///
/// The context is `Send + Sync`; the [`Env`]s it hands out are not.
#[derive(Debug)]
pub struct Context {
    vm: *mut sys::JavaVM,
    version: JNIVersion,
    state: AtomicU8,
}

unsafe impl Send for Context {}
unsafe impl Sync for Context {}

/// Attach the current thread to the process VM, creating the VM first if this
/// is the first call in the process.
///
/// The thread stays attached until it exits; calling this again on an
/// attached thread returns the existing environment. `options` only matter
/// to the call that creates the VM.
pub fn get_env(options: &JvmOptions) -> Result<Env<'static>> {
    signal::check_hangup()?;

    #[cfg(all(feature = "invocation", not(target_os = "android")))]
    let ctx = Context::get_or_init(options)?;

    #[cfg(not(all(feature = "invocation", not(target_os = "android"))))]
    let ctx = {
        let _ = options;
        Context::singleton()?
    };

    ctx.attach_permanently()
}

impl Context {
    /// Get the process VM, loading and starting it with `options` if no VM
    /// exists yet.
    ///
    /// If the JVM library is already hosting a VM (created by someone else
    /// in this process) that VM is adopted instead. A failure to start is
    /// fatal and is not retried by later callers with the same options.
    ///
    /// *This API requires the "invocation" feature.*
    #[cfg(all(feature = "invocation", not(target_os = "android")))]
    pub fn get_or_init(options: &JvmOptions) -> Result<&'static Context> {
        CONTEXT.get_or_try_init(|| {
            let ctx = Self::create(options)?;
            signal::install_hangup_handler();
            if options.get_destroy_on_exit() {
                register_exit_hook();
            }
            Ok(ctx)
        })
    }

    #[cfg(all(feature = "invocation", not(target_os = "android")))]
    fn create(options: &JvmOptions) -> Result<Context> {
        use std::ffi::c_void;

        use crate::errors::StartJvmError;

        type CreateJavaVm =
            unsafe extern "system" fn(*mut *mut sys::JavaVM, *mut *mut c_void, *mut c_void) -> sys::jint;
        type GetCreatedJavaVms =
            unsafe extern "system" fn(*mut *mut sys::JavaVM, sys::jsize, *mut sys::jsize) -> sys::jint;
        type GetDefaultJavaVmInitArgs = unsafe extern "system" fn(*mut c_void) -> sys::jint;

        let path = super::locate::locate_libjvm(options.get_libjvm_path())?;
        let path_string = path.to_string_lossy().into_owned();
        let load_error = |e| StartJvmError::LoadError(path_string.clone(), e);

        let libjvm = unsafe { libloading::Library::new(&path) }.map_err(load_error)?;
        let (create, get_created, get_default_args) = unsafe {
            (
                *libjvm
                    .get::<CreateJavaVm>(b"JNI_CreateJavaVM\0")
                    .map_err(load_error)?,
                *libjvm
                    .get::<GetCreatedJavaVms>(b"JNI_GetCreatedJavaVMs\0")
                    .map_err(load_error)?,
                *libjvm
                    .get::<GetDefaultJavaVmInitArgs>(b"JNI_GetDefaultJavaVMInitArgs\0")
                    .map_err(load_error)?,
            )
        };

        let version = options.get_version();
        let mut existing: *mut sys::JavaVM = ptr::null_mut();
        let mut count: sys::jsize = 0;
        let res = unsafe { get_created(&mut existing, 1, &mut count) };

        let vm = if res == sys::JNI_OK && count > 0 && !existing.is_null() {
            debug!("Adopting Java VM already running in {path_string}");
            existing
        } else {
            let mut defaults = sys::JavaVMInitArgs {
                version: version.into(),
                nOptions: 0,
                options: ptr::null_mut(),
                ignoreUnrecognized: sys::JNI_FALSE,
            };
            jni_error_code_to_result(unsafe {
                get_default_args(&mut defaults as *mut sys::JavaVMInitArgs as *mut c_void)
            })
            .map_err(|source| StartJvmError::DefaultArgs {
                version: version.into(),
                source,
            })?;

            let mut args = options.to_init_args()?;
            debug!(
                "Creating Java VM (JNI {version}) from {path_string} with options {:?}",
                args.options()
            );

            let mut vm: *mut sys::JavaVM = ptr::null_mut();
            let mut env: *mut c_void = ptr::null_mut();
            jni_error_code_to_result(unsafe { create(&mut vm, &mut env, args.inner_ptr()) })
                .map_err(StartJvmError::Create)?;

            // JNI_CreateJavaVM attaches the calling thread behind our back;
            // detach it so that every attachment goes through a guard.
            unsafe { java_vm_call_unchecked!(vm, v1_1, DetachCurrentThread) };
            vm
        };

        // The library must never be unloaded while the VM (and its threads)
        // are alive, and a VM can't be unloaded after DestroyJavaVM either.
        std::mem::forget(libjvm);

        Ok(Context {
            vm,
            version,
            state: AtomicU8::new(RUNNING),
        })
    }

    /// Adopt a VM created outside this crate, e.g. the one passed to
    /// `JNI_OnLoad` when this code is loaded as a native library.
    ///
    /// Adopting the same VM twice returns the existing context; a different
    /// VM fails with [`JniError::AlreadyCreated`].
    ///
    /// # Safety
    ///
    /// `vm` must be a valid `JavaVM` pointer that stays valid for the rest
    /// of the process.
    pub unsafe fn from_raw(vm: *mut sys::JavaVM, version: JNIVersion) -> Result<&'static Context> {
        let vm = null_check!(vm, "from_raw vm argument")?;
        let ctx = CONTEXT.get_or_init(|| {
            signal::install_hangup_handler();
            Context {
                vm,
                version,
                state: AtomicU8::new(RUNNING),
            }
        });
        if ctx.vm != vm {
            return Err(Error::JniCall(JniError::AlreadyCreated));
        }
        Ok(ctx)
    }

    /// The process VM, if it has been created or adopted.
    pub fn singleton() -> Result<&'static Context> {
        CONTEXT.get().ok_or(Error::UninitializedJavaVM)
    }

    /// The underlying `JavaVM` pointer.
    pub fn get_java_vm_pointer(&self) -> *mut sys::JavaVM {
        self.vm
    }

    /// The JNI version requested from the VM.
    pub fn version(&self) -> JNIVersion {
        self.version
    }

    /// True once [`Context::destroy`] has started.
    pub fn is_destroyed(&self) -> bool {
        self.state.load(Ordering::SeqCst) != RUNNING
    }

    fn check_running(&self) -> Result<()> {
        if self.is_destroyed() {
            Err(Error::JavaVMDestroyed)
        } else {
            Ok(())
        }
    }

    /// The environment of the current thread, or [`Error::ThreadDetached`]
    /// if it isn't attached.
    pub fn get_env(&self) -> Result<Env<'_>> {
        self.check_running()?;
        let mut ptr = ptr::null_mut();
        unsafe {
            let res = java_vm_call_unchecked!(self.vm, v1_2, GetEnv, &mut ptr, self.version.into());
            jni_error_code_to_result(res)?;
            Env::from_raw(ptr as *mut sys::JNIEnv)
        }
    }

    /// Attaches the current thread for the lifetime of the returned guard.
    ///
    /// On an already attached thread this is a no-op and dropping the guard
    /// leaves the thread attached.
    pub fn attach(&self) -> Result<AttachGuard<'_>> {
        match self.get_env() {
            Ok(env) => Ok(AttachGuard::new_nested(env)),
            Err(Error::ThreadDetached) => {
                self.check_running()?;
                let guard = InternalAttachGuard::new(self.vm);
                let env = unsafe { Env::from_raw(guard.attach_current_thread()?)? };
                Ok(AttachGuard::new(env.owning_attachment(), guard))
            }
            Err(e) => Err(e),
        }
    }

    /// Attaches the current thread until it exits. A no-op on an attached
    /// thread.
    pub fn attach_permanently(&self) -> Result<Env<'_>> {
        match self.get_env() {
            Ok(env) => Ok(env),
            Err(Error::ThreadDetached) => self.attach_impl(ThreadType::Normal),
            Err(e) => Err(e),
        }
    }

    /// Attaches the current thread as a daemon until it exits. Daemon
    /// threads don't keep the VM from shutting down.
    pub fn attach_as_daemon(&self) -> Result<Env<'_>> {
        match self.get_env() {
            Ok(env) => Ok(env),
            Err(Error::ThreadDetached) => self.attach_impl(ThreadType::Daemon),
            Err(e) => Err(e),
        }
    }

    /// Detaches the current thread if it was attached through this context.
    ///
    /// Any `Env` obtained on this thread is invalid afterwards.
    pub fn detach_current_thread(&self) {
        InternalAttachGuard::clear_tls();
    }

    /// Runs `f` with the current thread's environment, attaching the thread
    /// for the duration of the call if necessary.
    pub fn with_env<T>(&self, f: impl FnOnce(&Env<'_>) -> Result<T>) -> Result<T> {
        match self.get_env() {
            Ok(env) => f(&env),
            Err(Error::ThreadDetached) => {
                let guard = self.attach()?;
                f(&guard)
            }
            Err(e) => Err(e),
        }
    }

    /// Number of threads currently attached through this crate.
    pub fn threads_attached(&self) -> usize {
        ATTACHED_THREADS.load(Ordering::SeqCst)
    }

    /// Detaches the current thread and destroys the VM.
    ///
    /// Only the first call does anything; later calls (and the exit hook)
    /// return `Ok`. Once destroyed, every attach fails with
    /// [`Error::JavaVMDestroyed`] and global references are leaked rather
    /// than deleted.
    pub fn destroy(&self) -> Result<()> {
        if self
            .state
            .compare_exchange(RUNNING, DESTROYING, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(());
        }

        InternalAttachGuard::clear_tls();
        let res = unsafe { java_vm_call_unchecked!(self.vm, v1_1, DestroyJavaVM) };
        self.state.store(DESTROYED, Ordering::SeqCst);
        debug!("Destroyed Java VM");

        jni_error_code_to_result(res).map_err(Error::from)
    }

    fn attach_impl(&self, thread_type: ThreadType) -> Result<Env<'_>> {
        self.check_running()?;
        let guard = InternalAttachGuard::new(self.vm);
        let env_ptr = unsafe {
            match thread_type {
                ThreadType::Daemon => guard.attach_current_thread_as_daemon()?,
                ThreadType::Normal => guard.attach_current_thread()?,
            }
        };

        InternalAttachGuard::fill_tls(guard)?;

        unsafe { Env::from_raw(env_ptr) }
    }
}

#[cfg(all(unix, feature = "invocation", not(target_os = "android")))]
fn register_exit_hook() {
    extern "C" fn destroy_at_exit() {
        if let Some(ctx) = CONTEXT.get() {
            if let Err(e) = ctx.destroy() {
                error!("Error destroying Java VM at exit: {e}");
            }
        }
    }

    // Safety: the hook only touches the context, which is 'static.
    if unsafe { libc::atexit(destroy_at_exit) } != 0 {
        log::warn!("Failed to register Java VM exit hook");
    }
}

#[cfg(all(not(unix), feature = "invocation", not(target_os = "android")))]
fn register_exit_hook() {
    debug!("No exit hook on this platform; call Context::destroy explicitly");
}

thread_local! {
    static THREAD_ATTACH_GUARD: RefCell<Option<InternalAttachGuard>> = const { RefCell::new(None) };
    static DETACHES: Cell<u64> = const { Cell::new(0) };
}

/// How many times the current thread has been detached through this crate.
///
/// An `Env` obtained while the count had a different value must not be used.
pub(crate) fn detach_count() -> u64 {
    DETACHES.try_with(Cell::get).unwrap_or(u64::MAX)
}

/// A RAII implementation of scoped guard which detaches the current thread
/// when dropped. The attached `Env` can be accessed through this guard
/// via its `Deref` implementation.
#[derive(Debug)]
pub struct AttachGuard<'a> {
    env: Env<'a>,
    // Dropped after `env`.
    guard: Option<InternalAttachGuard>,
}

impl<'a> AttachGuard<'a> {
    /// AttachGuard created with this method will detach current thread on drop
    fn new(env: Env<'a>, guard: InternalAttachGuard) -> Self {
        Self {
            env,
            guard: Some(guard),
        }
    }

    /// AttachGuard created with this method will not detach current thread on drop, which is
    /// the case for nested attaches.
    fn new_nested(env: Env<'a>) -> Self {
        Self { env, guard: None }
    }

    /// True if dropping this guard detaches the thread.
    pub fn owns_attachment(&self) -> bool {
        self.guard.is_some()
    }
}

impl<'a> Deref for AttachGuard<'a> {
    type Target = Env<'a>;

    fn deref(&self) -> &Self::Target {
        &self.env
    }
}

#[derive(PartialEq)]
enum ThreadType {
    Normal,
    Daemon,
}

#[derive(Debug)]
struct InternalAttachGuard {
    java_vm: *mut sys::JavaVM,
}

impl InternalAttachGuard {
    fn new(java_vm: *mut sys::JavaVM) -> Self {
        Self { java_vm }
    }

    /// Stores guard in thread local storage. Fails (detaching again) if the
    /// thread is already tearing down its locals.
    fn fill_tls(guard: InternalAttachGuard) -> Result<()> {
        let mut guard = Some(guard);
        THREAD_ATTACH_GUARD
            .try_with(|f| *f.borrow_mut() = guard.take())
            .map_err(|_| Error::ThreadDetached)
    }

    /// Clears thread local storage, dropping the InternalAttachGuard and causing detach of
    /// the current thread.
    fn clear_tls() {
        // try_with: this also runs from the exit hook, possibly after the
        // thread's locals are gone.
        let guard = THREAD_ATTACH_GUARD
            .try_with(|f| f.borrow_mut().take())
            .ok()
            .flatten();
        drop(guard);
    }

    unsafe fn attach_current_thread(&self) -> Result<*mut sys::JNIEnv> {
        let mut env_ptr = ptr::null_mut();
        let res = java_vm_call_unchecked!(
            self.java_vm,
            v1_1,
            AttachCurrentThread,
            &mut env_ptr,
            ptr::null_mut()
        );
        jni_error_code_to_result(res)?;

        ATTACHED_THREADS.fetch_add(1, Ordering::SeqCst);

        debug!(
            "Attached thread {} ({:?}). {} threads attached",
            current().name().unwrap_or_default(),
            current().id(),
            ATTACHED_THREADS.load(Ordering::SeqCst)
        );

        Ok(env_ptr as *mut sys::JNIEnv)
    }

    unsafe fn attach_current_thread_as_daemon(&self) -> Result<*mut sys::JNIEnv> {
        let mut env_ptr = ptr::null_mut();
        let res = java_vm_call_unchecked!(
            self.java_vm,
            v1_4,
            AttachCurrentThreadAsDaemon,
            &mut env_ptr,
            ptr::null_mut()
        );
        jni_error_code_to_result(res)?;

        ATTACHED_THREADS.fetch_add(1, Ordering::SeqCst);

        debug!(
            "Attached daemon thread {} ({:?}). {} threads attached",
            current().name().unwrap_or_default(),
            current().id(),
            ATTACHED_THREADS.load(Ordering::SeqCst)
        );

        Ok(env_ptr as *mut sys::JNIEnv)
    }

    fn detach(&mut self) -> Result<()> {
        // After DestroyJavaVM the pointer is dangling.
        if CONTEXT
            .get()
            .is_some_and(|ctx| ctx.state.load(Ordering::SeqCst) == DESTROYED)
        {
            return Ok(());
        }

        let res = unsafe { java_vm_call_unchecked!(self.java_vm, v1_1, DetachCurrentThread) };
        jni_error_code_to_result(res)?;
        ATTACHED_THREADS.fetch_sub(1, Ordering::SeqCst);
        debug!(
            "Detached thread {} ({:?}). {} threads remain attached",
            current().name().unwrap_or_default(),
            current().id(),
            ATTACHED_THREADS.load(Ordering::SeqCst)
        );

        Ok(())
    }
}

impl Drop for InternalAttachGuard {
    fn drop(&mut self) {
        let _ = DETACHES.try_with(|count| count.set(count.get().wrapping_add(1)));
        if let Err(e) = self.detach() {
            error!(
                "Error detaching current thread: {:#?}\nThread {} id={:?}",
                e,
                current().name().unwrap_or_default(),
                current().id(),
            );
        }
    }
}
