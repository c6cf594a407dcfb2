//! The process-wide container and the thread-scoped override stack.
//!
//! Every thread starts out seeing the same base container. A thread that
//! needs to register, replace or remove services without affecting anyone
//! else pushes an override: a clone of what it currently sees, visible only
//! to that thread until the returned [`OverrideGuard`] is dropped. Overrides
//! nest and must be released innermost first.
//!
//! ```rust
//! use ioc_container::{ambient, Resolver, ServiceKey};
//! use std::sync::Arc;
//!
//! struct Clock(&'static str);
//!
//! {
//!     let outer = ambient::override_ioc();
//!     outer.container().register_instance(Arc::new(Clock("real")), ServiceKey::NONE);
//!     {
//!         let inner = ambient::override_ioc();
//!         inner.container().unregister::<Clock>(ServiceKey::NONE);
//!         inner.container().register_instance(Arc::new(Clock("fake")), ServiceKey::NONE);
//!         assert_eq!(ambient::current().resolve::<Clock>().unwrap().0, "fake");
//!     }
//!     assert_eq!(ambient::current().resolve::<Clock>().unwrap().0, "real");
//! }
//! assert!(ambient::current().try_resolve::<Clock>(ServiceKey::NONE).unwrap().is_none());
//! ```

use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::config::ContainerOptions;
use crate::container::Container;
use crate::error::{DiError, DiResult};

static BASE: Lazy<Arc<Container>> = Lazy::new(|| {
    let options = ContainerOptions::from_env();
    tracing::debug!(?options, "initialized base container");
    Arc::new(Container::with_options(options))
});

static NEXT_FRAME: AtomicU64 = AtomicU64::new(1);

struct Frame {
    id: u64,
    previous: Arc<Container>,
    active: Arc<Container>,
}

thread_local! {
    static OVERRIDES: RefCell<Vec<Frame>> = RefCell::new(Vec::new());
}

/// The process-wide base container, ignoring any override.
pub fn base() -> Arc<Container> {
    Arc::clone(&BASE)
}

/// The container this thread sees: the innermost override, or the base.
pub fn current() -> Arc<Container> {
    OVERRIDES
        .with(|stack| stack.borrow().last().map(|frame| frame.active.clone()))
        .unwrap_or_else(base)
}

/// How many overrides this thread has pushed and not yet released.
pub fn override_depth() -> usize {
    OVERRIDES.with(|stack| stack.borrow().len())
}

/// Pushes a clone of the current container as this thread's override.
///
/// The clone and everything registered in it is discarded when the guard
/// is released; nothing is merged back.
pub fn override_ioc() -> OverrideGuard {
    let previous = current();
    let active = Arc::new(previous.as_ref().clone());
    let id = NEXT_FRAME.fetch_add(1, Ordering::Relaxed);
    let depth = OVERRIDES.with(|stack| {
        let mut stack = stack.borrow_mut();
        stack.push(Frame {
            id,
            previous,
            active: active.clone(),
        });
        stack.len()
    });
    tracing::debug!(depth, "pushed container override");
    OverrideGuard {
        id,
        depth,
        active,
        released: false,
        _not_send: PhantomData,
    }
}

/// Runs `f` inside a fresh override, releasing it on every exit path.
pub fn with_override<R, F>(f: F) -> R
where
    F: FnOnce(&Container) -> R,
{
    let guard = override_ioc();
    f(guard.container())
}

/// One pushed override. Releasing it restores the container seen before the push.
///
/// Dropping releases. Dropping out of order is a programming error and
/// panics, unless the thread is already panicking: then it is logged and
/// this override together with every one pushed after it is discarded.
#[must_use = "dropping the guard immediately releases the override"]
pub struct OverrideGuard {
    id: u64,
    depth: usize,
    active: Arc<Container>,
    released: bool,
    // the frame lives in a thread local
    _not_send: PhantomData<*const ()>,
}

impl OverrideGuard {
    /// The container visible on this thread while the guard is held.
    pub fn container(&self) -> &Arc<Container> {
        &self.active
    }

    /// Stack depth of this override, starting at 1.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Releases explicitly, reporting misuse instead of panicking.
    ///
    /// On error the stack is left as it was and the guard is handed back,
    /// so it can be released again once the overrides above it are gone.
    pub fn pop(mut self) -> Result<(), (OverrideGuard, DiError)> {
        match release(self.id, self.depth) {
            Ok(()) => {
                self.released = true;
                Ok(())
            }
            Err(err) => Err((self, err)),
        }
    }

    // Releases, or if out of order discards this frame and everything above it.
    pub(crate) fn pop_or_unwind(mut self) -> DiResult<()> {
        self.released = true;
        release(self.id, self.depth).map_err(|err| {
            truncate_to(self.id);
            err
        })
    }
}

impl std::fmt::Debug for OverrideGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverrideGuard")
            .field("depth", &self.depth)
            .field("released", &self.released)
            .finish()
    }
}

impl Drop for OverrideGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(err) = release(self.id, self.depth) {
            if std::thread::panicking() {
                tracing::error!(error = %err, depth = self.depth, "container override released out of order while unwinding");
                truncate_to(self.id);
            } else {
                panic!("{}", err);
            }
        }
    }
}

fn release(id: u64, depth: usize) -> DiResult<()> {
    OVERRIDES
        .try_with(|stack| {
            let mut stack = stack.borrow_mut();
            match stack.last() {
                None => Err(DiError::OverrideNotActive),
                Some(top) if top.id == id => {
                    stack.pop();
                    tracing::debug!(depth, "popped container override");
                    Ok(())
                }
                Some(_) if !stack.iter().any(|frame| frame.id == id) => Err(DiError::OverrideNotActive),
                Some(_) => Err(DiError::OverrideOutOfOrder {
                    expected: stack.len(),
                    actual: depth,
                }),
            }
        })
        // thread is shutting down, nothing left to restore
        .unwrap_or(Ok(()))
}

fn truncate_to(id: u64) {
    let _ = OVERRIDES.try_with(|stack| {
        let mut stack = stack.borrow_mut();
        if let Some(position) = stack.iter().position(|frame| frame.id == id) {
            let restored = stack[position].previous.clone();
            stack.truncate(position);
            tracing::debug!(depth = position, registrations = restored.len(), "restored container after unwinding overrides");
        }
    });
}
