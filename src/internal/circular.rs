//! Circular dependency detection infrastructure.

use std::cell::RefCell;
use std::marker::PhantomData;

use crate::config::ContainerOptions;
use crate::error::{DiError, DiResult};

// Activations currently running a factory on this thread, outermost first
thread_local! {
    static RESOLUTION_STACK: RefCell<Vec<Frame>> = RefCell::new(Vec::new());
}

struct Frame {
    activation: usize,
    name: &'static str,
}

/// Marks one activation as "being built" on this thread until dropped.
///
/// Guards nest strictly, so dropping always pops the frame this guard pushed,
/// including while a factory panic unwinds.
pub(crate) struct StackGuard {
    // thread-local frame, must not move threads
    _not_send: PhantomData<*const ()>,
}

impl StackGuard {
    pub(crate) fn enter(
        activation: usize,
        name: &'static str,
        options: &ContainerOptions,
    ) -> DiResult<Self> {
        RESOLUTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();

            // Circular detection BEFORE pushing the new frame
            if options.detect_cycles && stack.iter().any(|f| f.activation == activation) {
                let mut path: Vec<&'static str> = stack.iter().map(|f| f.name).collect();
                path.push(name);
                return Err(DiError::Circular(path));
            }

            if stack.len() >= options.max_resolution_depth {
                return Err(DiError::DepthExceeded(options.max_resolution_depth));
            }

            stack.push(Frame { activation, name });
            Ok(Self {
                _not_send: PhantomData,
            })
        })
    }
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        RESOLUTION_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}
