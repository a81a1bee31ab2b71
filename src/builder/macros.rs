//! Macros for ergonomic statement construction.

/// Build a [`Flow`](crate::Flow) from guards followed by an action.
///
/// Guards are anything convertible into a [`Guard`](crate::Guard): a `bool`,
/// a gate (by reference or by value), or a predicate wrapped with
/// [`when`](crate::when). An unguarded statement is written `flow![=> action]`.
///
/// # Example
///
/// ```
/// use flowgate::{flow, when};
///
/// let unguarded = flow![=> || println!("starts immediately")];
/// let guarded = flow![true, when(|| 1 < 2) => || println!("eligible")];
///
/// assert_eq!(unguarded.guard_count(), 0);
/// assert_eq!(guarded.guard_count(), 2);
/// ```
#[macro_export]
macro_rules! flow {
    ($($guard:expr),* => $action:expr) => {
        $crate::Flow::new()$(.when($guard))*.then($action)
    };
}

#[cfg(test)]
mod tests {
    use crate::when;

    #[test]
    fn flow_macro_keeps_guard_order() {
        let spec = flow![false, when(|| true), true => || ()];
        assert_eq!(spec.guard_count(), 3);
        assert!(spec.has_action());
    }

    #[test]
    fn flow_macro_supports_unguarded_statements() {
        let spec = flow![=> || Ok::<(), String>(())];
        assert_eq!(spec.guard_count(), 0);
        assert!(spec.has_action());
    }
}
