//! Sequence backend for stores with server-side atomic scripting.

use std::sync::Arc;

use async_trait::async_trait;
use snafu::ensure;
use tracing::info;
use tracing::trace;

use crate::error::InvalidStepSnafu;
use crate::error::SequenceError;
use crate::pure::is_valid_step;
use crate::script::script_args;
use crate::script::NEXT_VALUE_SCRIPT;
use crate::script::NEXT_VALUE_WITH_DEFAULT_SCRIPT;
use crate::sequence::InitialValueSupplier;
use crate::sequence::Sequence;
use crate::store::ScriptStore;

/// Sequence backed by an atomic server-side script.
///
/// One round trip performs "increment if exists, else initialize". Pushing
/// the exists-branch and the mutation into a single server-side unit
/// eliminates the check-then-act race a client-side probe would open up,
/// regardless of how many clients call concurrently.
pub struct ScriptedSequence<S: ScriptStore + ?Sized> {
    store: Arc<S>,
    key: String,
    initial_value: InitialValueSupplier,
}

impl<S: ScriptStore + ?Sized> ScriptedSequence<S> {
    /// Create a sequence over `key`.
    ///
    /// `initial_value` is consulted only when the key has never been written
    /// and no explicit default is supplied.
    pub fn new(
        store: Arc<S>,
        key: impl Into<String>,
        initial_value: impl Fn() -> i64 + Send + Sync + 'static,
    ) -> Self {
        let key = key.into();
        assert!(!key.is_empty(), "SEQUENCE: key must not be empty");
        Self {
            store,
            key,
            initial_value: Box::new(initial_value),
        }
    }
}

#[async_trait]
impl<S: ScriptStore + ?Sized> Sequence for ScriptedSequence<S> {
    fn key(&self) -> &str {
        &self.key
    }

    async fn current_value(&self) -> Result<i64, SequenceError> {
        match self.store.get_counter(&self.key).await? {
            Some(value) => Ok(value),
            None => Ok((self.initial_value)()),
        }
    }

    async fn raw_next(&self, step: i64, default: Option<i64>) -> Result<Option<i64>, SequenceError> {
        ensure!(is_valid_step(step), InvalidStepSnafu { step });

        let script = match default {
            Some(_) => NEXT_VALUE_WITH_DEFAULT_SCRIPT,
            None => NEXT_VALUE_SCRIPT,
        };
        let args = script_args(step, default);
        let result = self.store.eval_counter_script(script, &self.key, &args).await?;
        if let Some(value) = result {
            trace!(key = %self.key, value, "generated next sequence value");
        }
        Ok(result)
    }

    async fn reset(&self) -> Result<(), SequenceError> {
        self.store.delete_counter(&self.key).await?;
        info!(key = %self.key, "sequence reset, key deleted");
        Ok(())
    }

    async fn force_set(&self, value: i64) -> Result<(), SequenceError> {
        self.store.set_counter(&self.key, value).await?;
        info!(key = %self.key, value, "sequence value forcibly set");
        Ok(())
    }
}
