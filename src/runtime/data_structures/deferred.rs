use crate::{
    lang::source_buffer::SourceLocation,
    runtime::{
        data_structures::value::Value,
        error::{self, ErrorKind, ScriptError},
    },
};
use gc::{Finalize, Gc, GcCell, Trace};
use std::{future::Future, pin::Pin};
use tokio::{sync::Mutex, task::JoinHandle};

/// A boxed future that stays on the current thread.  Forcing is recursive, so the evaluator's
/// entry points return these rather than plain `async fn` futures.
pub type LocalFuture<T> = Pin<Box<dyn Future<Output = T>>>;

/// Internal state shared by every clone of a deferred value.
#[derive(Debug, Trace, Finalize)]
struct DeferredState {
    /// Filled exactly once with the outcome of the computation.
    outcome: GcCell<Option<error::Result<Value>>>,

    /// The running computation, taken by whichever reader first waits for the outcome.  The rest
    /// queue on the lock until that reader has stored the outcome.
    #[unsafe_ignore_trace]
    task: Mutex<Option<JoinHandle<error::Result<Value>>>>,
}

/// A value that may not have been computed yet.  Every slot of a local stack and every binding of a
/// scope frame holds one of these, even when the value is a literal that was known up front.
///
/// A deferred value settles exactly once, either to a value or to an error, and every clone sees
/// the same outcome.  Computations are started as soon as they are created as tasks on the
/// current `LocalSet`, so a computation nobody waits for still runs to completion.
#[derive(Clone, Debug, Trace, Finalize)]
pub struct Deferred {
    state: Gc<DeferredState>,
}

impl Deferred {
    /// A deferred value that is already settled to a value.
    pub fn settled(value: Value) -> Deferred {
        Deferred::from_outcome(Ok(value))
    }

    /// A deferred value that is already settled to an error.
    pub fn rejected(error: ScriptError) -> Deferred {
        Deferred::from_outcome(Err(error))
    }

    fn from_outcome(outcome: error::Result<Value>) -> Deferred {
        Deferred {
            state: Gc::new(DeferredState {
                outcome: GcCell::new(Some(outcome)),
                task: Mutex::new(None),
            }),
        }
    }

    /// Start a computation on the current `LocalSet`.  Must be called from within one.
    pub fn spawn<F>(computation: F) -> Deferred
    where
        F: Future<Output = error::Result<Value>> + 'static,
    {
        let handle = tokio::task::spawn_local(computation);

        Deferred {
            state: Gc::new(DeferredState {
                outcome: GcCell::new(None),
                task: Mutex::new(Some(handle)),
            }),
        }
    }

    /// Start a computation whose errors are reported against the given location unless they
    /// already carry one.
    pub fn spawn_at<F>(location: &SourceLocation, computation: F) -> Deferred
    where
        F: Future<Output = error::Result<Value>> + 'static,
    {
        let location = location.clone();

        Deferred::spawn(async move { computation.await.map_err(|error| error.or_location(&location)) })
    }

    /// Derive a new deferred value from this one once it settles.  Errors pass straight through.
    pub fn then<F>(&self, location: &SourceLocation, transform: F) -> Deferred
    where
        F: FnOnce(Value) -> error::Result<Value> + 'static,
    {
        let source = self.clone();

        Deferred::spawn_at(location, async move { transform(source.get().await?) })
    }

    /// Has the computation finished?
    pub fn is_settled(&self) -> bool {
        self.state.outcome.borrow().is_some()
    }

    fn outcome(&self) -> Option<error::Result<Value>> {
        self.state.outcome.borrow().clone()
    }

    /// Wait for the outcome.  Any number of readers may wait at once, the first one to arrive
    /// collects the task's result and the rest share it.
    pub async fn get(&self) -> error::Result<Value> {
        if let Some(outcome) = self.outcome() {
            return outcome;
        }

        let mut task = self.state.task.lock().await;

        if let Some(outcome) = self.outcome() {
            return outcome;
        }

        let outcome = match task.take() {
            Some(handle) => match handle.await {
                Ok(outcome) => outcome,
                Err(join_error) => Err(join_error.into()),
            },

            None => ScriptError::new_as_result(
                ErrorKind::Internal,
                None,
                "Deferred value has no computation.".to_string(),
            ),
        };

        *self.state.outcome.borrow_mut() = Some(outcome.clone());
        outcome
    }
}

/// Wait for every one of the deferred values to settle, then hand back their values in order.  If
/// any of them failed the first failure by position is returned, but only after all of them have
/// settled.
pub async fn settle_all(deferreds: &[Deferred]) -> error::Result<Vec<Value>> {
    let mut outcomes = Vec::with_capacity(deferreds.len());

    for deferred in deferreds {
        outcomes.push(deferred.get().await);
    }

    outcomes.into_iter().collect()
}
