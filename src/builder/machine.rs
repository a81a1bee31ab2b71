//! Builder for constructing and starting flow machines.

use crate::builder::definition::{Definition, Gates};
use crate::builder::error::{BuildError, StatementError};
use crate::builder::flow::Flow;
use crate::config::MachineConfig;
use crate::core::statement::Statement;
use crate::core::{GateSlot, Owner};
use crate::error::FlowError;
use crate::machine::{Callback, MachineCore, MachineHandle, MachineRegistry, Scheduler};
use std::rc::Rc;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Builder for flow machines with a fluent API.
///
/// `R` is the type of the resolver gate, delivered to the completion
/// callback on success.
pub struct MachineBuilder<R> {
    config: MachineConfig,
    registry: Option<MachineRegistry>,
    callback: Option<Callback<R>>,
}

impl<R: Clone + 'static> MachineBuilder<R> {
    pub fn new() -> Self {
        Self {
            config: MachineConfig::default(),
            registry: None,
            callback: None,
        }
    }

    /// Trace gate and statement transitions at `debug` level.
    pub fn debug(mut self, enabled: bool) -> Self {
        self.config.debug = enabled;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.config.label = Some(label.into());
        self
    }

    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    /// Allocate the machine id from `registry` instead of the global one.
    pub fn registry(mut self, registry: MachineRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the completion callback (required). It fires at most once.
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(Result<R, FlowError>) + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Build the machine from `definition` and run its first scheduling pass.
    ///
    /// Structural problems are returned as [`BuildError`]; everything that
    /// goes wrong afterwards reaches the completion callback.
    pub fn start(self, definition: Definition) -> Result<MachineHandle, BuildError> {
        let (names, body) = definition.into_parts();
        if names.is_empty() {
            return Err(BuildError::NoGates);
        }
        let Some(callback) = self.callback else {
            return Err(BuildError::MissingCallback);
        };

        let registry = self
            .registry
            .unwrap_or_else(|| MachineRegistry::global().clone());
        let owner = Owner::new(registry.next_id());
        let id = owner.id;
        let MachineConfig { debug, label } = self.config;

        if debug {
            tracing::debug!(machine = id, gates = ?names, "DEFINE");
        }

        let resolver = names.len() - 1;
        let slots: Vec<Rc<GateSlot>> = names
            .into_iter()
            .enumerate()
            .map(|(index, name)| {
                let slot = if index == resolver {
                    GateSlot::typed::<R>(owner.clone(), index, name, true)
                } else {
                    GateSlot::new(owner.clone(), index, name, false)
                };
                Rc::new(slot)
            })
            .collect();

        let core = Rc::new(MachineCore::new(id, label, debug, slots.clone(), callback));
        let scheduler: Rc<dyn Scheduler> = core.clone();

        let prepared = body(&Gates::new(slots, Rc::clone(&scheduler)))
            .and_then(|flows| validate(flows, &owner))
            .and_then(|statements| {
                if statements.iter().any(Statement::is_unguarded) {
                    Ok(statements)
                } else {
                    Err(BuildError::NoUnguardedStatement)
                }
            });

        match prepared {
            Ok(statements) => {
                core.install(statements);
                core.start();
                Ok(MachineHandle::new(scheduler))
            }
            Err(error) => {
                // Gate handles may have escaped the body; they must not reach the callback.
                core.discard();
                Err(error)
            }
        }
    }
}

impl<R: Clone + 'static> Default for MachineBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Check every flow, reporting all problems at once, then build statements.
fn validate(flows: Vec<Flow>, owner: &Owner) -> Result<Vec<Statement>, BuildError> {
    let checks: Vec<Validation<(), NonEmptyVec<StatementError>>> = flows
        .iter()
        .enumerate()
        .map(|(index, flow)| flow.check(index, owner))
        .collect();

    if let Validation::Failure(errors) = Validation::all_vec(checks) {
        return Err(BuildError::InvalidStatements(
            errors.iter().cloned().collect(),
        ));
    }

    flows
        .into_iter()
        .enumerate()
        .map(|(index, flow)| flow.into_statement(index))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| BuildError::InvalidStatements(vec![error]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow;
    use std::cell::RefCell;

    fn recorder<R: 'static>() -> (Rc<RefCell<Vec<Result<R, FlowError>>>>, impl FnOnce(Result<R, FlowError>)) {
        let results = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&results);
        (results, move |result| sink.borrow_mut().push(result))
    }

    #[test]
    fn builder_rejects_zero_gates() {
        let (_, callback) = recorder::<()>();
        let result = MachineBuilder::new()
            .on_complete(callback)
            .start(Definition::positional(0, |_| Ok(Vec::new())));

        assert!(matches!(result, Err(BuildError::NoGates)));
    }

    #[test]
    fn builder_requires_callback() {
        let result = MachineBuilder::<()>::new().start(Definition::new(["done"], |gates| {
            let done = gates.gate::<()>(0)?;
            Ok(vec![flow![=> move || done.set(())]])
        }));

        assert!(matches!(result, Err(BuildError::MissingCallback)));
    }

    #[test]
    fn builder_requires_an_unguarded_statement() {
        let (results, callback) = recorder::<()>();
        let result = MachineBuilder::new()
            .on_complete(callback)
            .start(Definition::new(["done"], |gates| {
                let done = gates.gate::<()>(0)?;
                Ok(vec![flow![true => move || done.set(())]])
            }));

        assert!(matches!(result, Err(BuildError::NoUnguardedStatement)));
        assert!(results.borrow().is_empty());
    }

    #[test]
    fn builder_accumulates_statement_errors() {
        let (_, callback) = recorder::<()>();
        let result = MachineBuilder::new()
            .on_complete(callback)
            .start(Definition::new(["done"], |_| {
                Ok(vec![Flow::new(), Flow::new().when(true), Flow::new().then(|| ())])
            }));

        match result {
            Err(BuildError::InvalidStatements(errors)) => assert_eq!(
                errors,
                vec![
                    StatementError::MissingAction { statement: 0 },
                    StatementError::MissingAction { statement: 1 },
                ]
            ),
            other => panic!("Expected InvalidStatements, got {other:?}"),
        }
    }

    #[test]
    fn builder_rejects_resolver_of_wrong_type() {
        let (_, callback) = recorder::<u32>();
        let result = MachineBuilder::new()
            .on_complete(callback)
            .start(Definition::new(["done"], |gates| {
                let done = gates.gate::<String>(0)?;
                Ok(vec![flow![=> move || done.set(String::new())]])
            }));

        assert!(matches!(
            result,
            Err(BuildError::ResolverTypeMismatch { .. })
        ));
    }

    #[test]
    fn registry_assigns_ids() {
        let registry = MachineRegistry::new();
        let (results, callback) = recorder::<u8>();
        let handle = MachineBuilder::new()
            .registry(registry.clone())
            .label("ids")
            .on_complete(callback)
            .start(Definition::new(["done"], |gates| {
                let done = gates.gate::<u8>(0)?;
                Ok(vec![flow![=> move || done.set(9)]])
            }))
            .unwrap();

        assert_eq!(handle.id(), 1);
        assert_eq!(registry.issued(), 1);
        assert_eq!(handle.snapshot().label.as_deref(), Some("ids"));
        assert_eq!(results.borrow().len(), 1);
    }
}
