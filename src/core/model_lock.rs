//! The mutable-state execution boundary shared with the wider build model.
//!
//! Artifact realization may observe state that the rest of the build mutates
//! (the raw declarations appended by a [`DeclarationSource`], live project
//! state behind it, and so on). The broader model owns the lock that
//! serializes such access; this crate only calls through it. The boundary is
//! therefore an opaque callable: implementations receive a closure and run it
//! while holding whatever lock the host model requires.
//!
//! [`DeclarationSource`]: crate::metadata::DeclarationSource

/// Scoped execution under the build model's mutable-state lock.
///
/// Implementations must be **re-entrant**: realizing one configuration's
/// artifacts forces its ancestors' artifacts, which re-enters the boundary on
/// the same thread. A non-re-entrant mutex here will deadlock on any
/// non-trivial hierarchy.
pub trait ModelLock: Send + Sync {
    /// Invokes `action` exactly once while holding the model lock.
    fn run_under_lock(&self, action: &mut dyn FnMut());
}

/// Runs `action` under `model`'s lock and returns its result.
///
/// This is the typed front door over [`ModelLock::run_under_lock`], which is
/// object-safe and therefore untyped.
pub fn run_under_model_lock<T>(model: &dyn ModelLock, action: impl FnOnce() -> T) -> T {
    let mut action = Some(action);
    let mut output = None;
    model.run_under_lock(&mut || {
        let action = action.take().expect("model lock ran the action more than once");
        output = Some(action());
    });
    output.expect("model lock did not run the action")
}

/// A pass-through boundary that runs the action on the calling thread with no
/// serialization.
///
/// Suitable when the component is not shared with a mutating build model:
/// standalone use, tests, or hosts that serialize access by other means.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectModelLock;

impl ModelLock for DirectModelLock {
    fn run_under_lock(&self, action: &mut dyn FnMut()) {
        action();
    }
}
