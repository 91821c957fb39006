//! Authoritative match server: owns every live match, applies moves in turn
//! order and pushes the resulting state to the affected connections.
//!
//! The transport is left to the embedder. It feeds decoded requests into a
//! [`Dispatcher`] and drains whatever the [`Notifier`] emits.

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use clock::*;
pub use config::*;
pub use dispatcher::*;
pub use error::*;
pub use notifier::*;
pub use registry::*;

mod clock;
mod config;
mod dispatcher;
mod error;
mod notifier;
mod registry;

/// A panicking holder leaves the data consistent, so poisoning is ignored.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
