//! Callback-driven mapping with bounded concurrency.

use crate::error::BoxError;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// Completion handle given to the mapper for one element.
pub type Done<U> = Box<dyn FnOnce(Result<U, BoxError>)>;

struct Run<T, U, C> {
    pending: VecDeque<(usize, T)>,
    results: Vec<Option<U>>,
    in_flight: usize,
    finished: usize,
    callback: Option<C>,
}

struct Shared<T, U, M, C> {
    limit: usize,
    state: RefCell<Run<T, U, C>>,
    mapper: RefCell<M>,
    pumping: Cell<bool>,
}

/// Apply `mapper` to every item with at most `limit` mappings in flight.
///
/// The mapper receives an item and a [`Done`] handle; it may complete the
/// handle synchronously or later. `callback` fires exactly once, with the
/// results in input order or with the first error reported. A `limit` of 0
/// behaves as 1.
///
/// ```rust
/// use flowgate::array::map_limit;
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let out = Rc::new(RefCell::new(None));
/// let sink = out.clone();
/// map_limit(
///     vec![1, 2, 3],
///     2,
///     |n: i32, done| done(Ok(n * 10)),
///     move |result| *sink.borrow_mut() = Some(result.unwrap()),
/// );
/// assert_eq!(*out.borrow(), Some(vec![10, 20, 30]));
/// ```
pub fn map_limit<T, U, M, C>(items: Vec<T>, limit: usize, mapper: M, callback: C)
where
    T: 'static,
    U: 'static,
    M: FnMut(T, Done<U>) + 'static,
    C: FnOnce(Result<Vec<U>, BoxError>) + 'static,
{
    if items.is_empty() {
        callback(Ok(Vec::new()));
        return;
    }

    let count = items.len();
    let shared = Rc::new(Shared {
        limit: limit.max(1),
        state: RefCell::new(Run {
            pending: items.into_iter().enumerate().collect(),
            results: (0..count).map(|_| None).collect(),
            in_flight: 0,
            finished: 0,
            callback: Some(callback),
        }),
        mapper: RefCell::new(mapper),
        pumping: Cell::new(false),
    });
    pump(&shared);
}

/// Launch items until `limit` are in flight. Re-entrant calls from a mapper
/// that completes synchronously return at once; the outer call keeps going.
fn pump<T, U, M, C>(shared: &Rc<Shared<T, U, M, C>>)
where
    T: 'static,
    U: 'static,
    M: FnMut(T, Done<U>) + 'static,
    C: FnOnce(Result<Vec<U>, BoxError>) + 'static,
{
    if shared.pumping.get() {
        return;
    }
    shared.pumping.set(true);
    loop {
        let next = {
            let mut state = shared.state.borrow_mut();
            if state.callback.is_none() || state.in_flight >= shared.limit {
                None
            } else {
                let next = state.pending.pop_front();
                if next.is_some() {
                    state.in_flight += 1;
                }
                next
            }
        };
        let Some((index, item)) = next else {
            break;
        };
        let owner = Rc::clone(shared);
        let done: Done<U> = Box::new(move |result| settle(&owner, index, result));
        (shared.mapper.borrow_mut())(item, done);
    }
    shared.pumping.set(false);
}

fn settle<T, U, M, C>(shared: &Rc<Shared<T, U, M, C>>, index: usize, result: Result<U, BoxError>)
where
    T: 'static,
    U: 'static,
    M: FnMut(T, Done<U>) + 'static,
    C: FnOnce(Result<Vec<U>, BoxError>) + 'static,
{
    let outcome = {
        let mut state = shared.state.borrow_mut();
        if state.callback.is_none() {
            return;
        }
        state.in_flight -= 1;
        match result {
            Err(err) => state.callback.take().map(|callback| (callback, Err(err))),
            Ok(value) => {
                state.results[index] = Some(value);
                state.finished += 1;
                if state.finished == state.results.len() {
                    let results: Vec<U> = state.results.drain(..).flatten().collect();
                    state.callback.take().map(|callback| (callback, Ok(results)))
                } else {
                    None
                }
            }
        }
    };

    match outcome {
        Some((callback, result)) => callback(result),
        None => pump(shared),
    }
}
