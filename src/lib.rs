//! Distributed sequence and counter generation over remote atomic stores.
//!
//! Produces monotonically increasing integers shared across processes. The
//! remote store holds the only copy of each counter; this crate implements
//! the client-side protocol for reading, initializing, and incrementing it
//! safely under concurrency, with race-free first-use initialization.
//!
//! Two backends implement the same [`Sequence`] contract:
//!
//! - [`ScriptedSequence`] — for stores that execute a short atomic script
//!   server-side, fusing "increment if exists, else initialize" into one
//!   round trip.
//! - [`LockedCounter`] — for stores exposing only a bare atomic integer: a
//!   no-lock fast path through the native atomic add, plus a slow path
//!   guarded by a distributed mutex for lazy first-use initialization.
//!
//! Store access goes through the traits in this crate ([`ScriptStore`],
//! [`AtomicStore`], [`DistributedMutex`]); nothing here talks to a concrete
//! server. Failures are never retried internally — callers needing
//! resilience retry above this layer.
//!
//! # Example
//!
//! ```ignore
//! use seqstore::{ScriptedSequence, Sequence};
//!
//! let sequence = ScriptedSequence::new(store, "order_id", || 100);
//! let id = sequence.next(1).await?;
//! ```

mod error;
mod locked;
pub mod pure;
mod script;
mod scripted;
mod sequence;
mod store;
pub mod test_support;
mod types;

pub use error::SequenceError;
pub use locked::LockedCounter;
pub use locked::LockedCounterConfig;
pub use script::script_args;
pub use script::NEXT_VALUE_SCRIPT;
pub use script::NEXT_VALUE_WITH_DEFAULT_SCRIPT;
pub use scripted::ScriptedSequence;
pub use sequence::InitialValueSupplier;
pub use sequence::Sequence;
pub use store::AtomicStore;
pub use store::DistributedMutex;
pub use store::ScriptStore;
pub use store::StoreError;
pub use types::now_unix_ms;
pub use types::MutexLease;
