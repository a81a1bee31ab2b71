//! Shared helpers for integration tests.
#![allow(dead_code)]

use flowgate::FlowError;
use std::cell::RefCell;
use std::rc::Rc;

/// Records every invocation of a completion callback.
pub struct Outcomes<R> {
    calls: Rc<RefCell<Vec<Result<R, FlowError>>>>,
}

impl<R: 'static> Outcomes<R> {
    pub fn new() -> Self {
        Self {
            calls: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn callback(&self) -> impl FnOnce(Result<R, FlowError>) + 'static {
        let calls = Rc::clone(&self.calls);
        move |result| calls.borrow_mut().push(result)
    }

    pub fn count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn error(&self) -> Option<String> {
        self.calls
            .borrow()
            .iter()
            .find_map(|call| call.as_ref().err().map(ToString::to_string))
    }

    /// Asserts the callback fired exactly once and returns what it got.
    pub fn single(&self) -> Result<R, FlowError> {
        let mut calls = self.calls.borrow_mut();
        assert_eq!(calls.len(), 1, "callback should fire exactly once");
        calls.remove(0)
    }
}

impl<R: Clone + 'static> Outcomes<R> {
    pub fn value(&self) -> Option<R> {
        self.calls
            .borrow()
            .iter()
            .find_map(|call| call.as_ref().ok().cloned())
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
