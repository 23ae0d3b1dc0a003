#![cfg(feature = "invocation")]

use assert_matches::assert_matches;
use rusty_fork::rusty_fork_test;

use rs2jdbc::{
    env::Env,
    errors::Error,
    refs::GlobalRef,
    vm::{check_hangup, Context},
    wrap, Value,
};

mod util;
use util::{attach_current_thread, jvm, options, thread_env, unwrap};

static_assertions::assert_not_impl_any!(Env<'static>: Send, Sync);
static_assertions::assert_impl_all!(Context: Send, Sync);
static_assertions::assert_impl_all!(GlobalRef: Send, Sync);
static_assertions::assert_impl_all!(Value: Send, Sync);

#[test]
fn singleton_is_shared() {
    let ctx: &'static Context = jvm();
    let again: &'static Context = unwrap(Context::singleton());
    assert!(std::ptr::eq(ctx as *const Context, again as *const Context));
    assert!(!ctx.is_destroyed());
    assert!(unwrap(attach_current_thread().get_version()) >= ctx.version());
}

#[test]
fn nested_attach_guard_should_not_detach_thread() {
    let ctx = jvm();
    std::thread::spawn(move || {
        let outer = unwrap(ctx.attach());
        assert!(outer.owns_attachment());
        {
            let nested = unwrap(ctx.attach());
            assert!(!nested.owns_attachment());
        }
        // Still attached after the nested guard dropped.
        assert!(ctx.get_env().is_ok());
        drop(outer);
        assert_matches!(ctx.get_env(), Err(Error::ThreadDetached));
    })
    .join()
    .expect("thread panicked");
}

#[test]
fn with_env_attaches_temporarily() {
    let ctx = jvm();
    std::thread::spawn(move || {
        let version = unwrap(ctx.with_env(|env| env.get_version()));
        assert_eq!(version, unwrap(ctx.with_env(|env| env.get_version())));
        assert_matches!(ctx.get_env(), Err(Error::ThreadDetached));
    })
    .join()
    .expect("thread panicked");
}

#[test]
fn permanent_attach_survives_until_detach() {
    let ctx = jvm();
    std::thread::spawn(move || {
        unwrap(ctx.attach_permanently());
        assert!(ctx.get_env().is_ok());
        ctx.detach_current_thread();
        assert_matches!(ctx.get_env(), Err(Error::ThreadDetached));

        unwrap(ctx.attach_as_daemon());
        assert!(ctx.get_env().is_ok());
    })
    .join()
    .expect("thread panicked");
}

#[test]
fn global_ref_outlives_thread() {
    let value = std::thread::spawn(|| {
        let env = thread_env();
        let list = unwrap(env.get("java.util.ArrayList"));
        let list = unwrap(unwrap(list.constructor("()V")).new_object(&[]));
        list.global_ref().clone()
    })
    .join()
    .expect("thread panicked");

    let env = thread_env();
    let list = unwrap(env.wrap_object(value));
    assert_eq!(unwrap(list.to_java_string()).as_deref(), Some("[]"));
}

#[test]
fn thread_env_does_not_survive_detach() {
    let ctx = jvm();
    std::thread::spawn(move || {
        let env = unwrap(wrap::get_env(&options()));
        let list_class = unwrap(env.get("java.util.ArrayList"));

        ctx.detach_current_thread();
        assert_matches!(ctx.get_env(), Err(Error::ThreadDetached));
        assert_matches!(env.env(), Err(Error::ThreadDetached));
        assert_matches!(list_class.constructor("()V"), Err(Error::ThreadDetached));

        // A fresh environment on a new attachment.
        let fresh = unwrap(wrap::get_env(&options()));
        assert!(ctx.get_env().is_ok());
        let list_class = unwrap(fresh.get("java.util.ArrayList"));
        let list = unwrap(unwrap(list_class.constructor("()V")).new_object(&[]));
        assert_eq!(unwrap(list.to_java_string()).as_deref(), Some("[]"));
    })
    .join()
    .expect("thread panicked");
}

#[test]
fn thread_env_does_not_survive_scoped_attach() {
    let ctx = jvm();
    std::thread::spawn(move || {
        let env = {
            let _guard = unwrap(ctx.attach());
            unwrap(wrap::get_env(&options()))
        };
        assert_matches!(env.env(), Err(Error::ThreadDetached));
        let math = unwrap(unwrap(wrap::get_env(&options())).get("java.lang.Math"));
        let abs = unwrap(math.static_method("abs", "(I)I"));
        assert_eq!(unwrap(abs.call(&[Value::Int(-2)])), Value::Int(2));
    })
    .join()
    .expect("thread panicked");
}

rusty_fork_test! {
#[test]
#[cfg(unix)]
fn hangup_fails_the_next_call() {
    let env = thread_env();
    let math = unwrap(env.get("java.lang.Math"));
    let abs = unwrap(math.static_method("abs", "(I)I"));
    assert_eq!(unwrap(abs.call(&[Value::Int(-1)])), Value::Int(1));

    unsafe { libc::raise(libc::SIGHUP) };

    assert_matches!(check_hangup(), Err(Error::Hangup));
    assert_matches!(abs.call(&[Value::Int(-1)]), Err(Error::Hangup));
    assert_matches!(env.get("java.lang.String"), Err(Error::Hangup));
    // Raw environment calls see it too.
    let raw = attach_current_thread();
    assert_matches!(raw.find_class("java/lang/Object"), Err(Error::Hangup));
    assert!(Error::Hangup.is_fatal());
}
}

rusty_fork_test! {
#[test]
fn destroy_is_final() {
    let ctx = jvm();
    unwrap(attach_current_thread().get_version());
    let env = thread_env();
    let math = unwrap(env.get("java.lang.Math"));

    unwrap(ctx.destroy());
    assert_matches!(math.static_method("abs", "(I)I"), Err(Error::JavaVMDestroyed));
    assert_matches!(env.get("java.lang.String"), Err(Error::JavaVMDestroyed));
    assert_matches!(wrap::get_env(&options()), Err(Error::JavaVMDestroyed));
    assert!(ctx.is_destroyed());
    assert_matches!(ctx.attach(), Err(Error::JavaVMDestroyed));
    assert_matches!(ctx.get_env(), Err(Error::JavaVMDestroyed));
    // Only the first call does anything.
    assert_matches!(ctx.destroy(), Ok(()));
}
}
