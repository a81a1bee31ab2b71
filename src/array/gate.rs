//! Gates holding sequences, with mapping helpers.

use super::limit::{map_limit, Done};
use crate::core::Gate;
use crate::error::BoxError;
use std::cell::RefCell;
use std::rc::Rc;

/// A gate holding a `Vec<T>`, with bounded-concurrency mapping over its value.
///
/// Both helpers read the gate first; reading an unresolved gate aborts the
/// machine and the helper does nothing further.
pub struct ArrayGate<T> {
    gate: Gate<Vec<T>>,
}

impl<T> Clone for ArrayGate<T> {
    fn clone(&self) -> Self {
        Self {
            gate: self.gate.clone(),
        }
    }
}

impl<T: Clone + 'static> Gate<Vec<T>> {
    pub fn array(&self) -> ArrayGate<T> {
        ArrayGate { gate: self.clone() }
    }
}

impl<T: Clone + 'static> ArrayGate<T> {
    pub fn gate(&self) -> &Gate<Vec<T>> {
        &self.gate
    }

    /// Map every element with at most `limit` mappings in flight.
    pub fn map<U, M, C>(&self, limit: usize, mapper: M, callback: C)
    where
        U: 'static,
        M: FnMut(T, Done<U>) + 'static,
        C: FnOnce(Result<Vec<U>, BoxError>) + 'static,
    {
        let Ok(items) = self.gate.get() else {
            return;
        };
        map_limit(items, limit, mapper, callback);
    }

    /// Map elements one at a time; the mapper also receives the previous
    /// element's result (`None` for the first element).
    pub fn each<U, M, C>(&self, mut mapper: M, callback: C)
    where
        U: Clone + 'static,
        M: FnMut(T, Done<U>, Option<U>) + 'static,
        C: FnOnce(Result<Vec<U>, BoxError>) + 'static,
    {
        let Ok(items) = self.gate.get() else {
            return;
        };
        let previous: Rc<RefCell<Option<U>>> = Rc::new(RefCell::new(None));
        map_limit(
            items,
            1,
            move |item, done: Done<U>| {
                let last = previous.borrow().clone();
                let record = Rc::clone(&previous);
                let tracked: Done<U> = Box::new(move |result: Result<U, BoxError>| {
                    if let Ok(value) = &result {
                        *record.borrow_mut() = Some(value.clone());
                    }
                    done(result);
                });
                mapper(item, tracked, last);
            },
            callback,
        );
    }
}
