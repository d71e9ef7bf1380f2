//! Core types shared across the metadata model.
//!
//! This module provides the foundation the rest of the crate builds on:
//!
//! - [`MetadataError`] - typed errors for the single-writer population phase
//! - [`SharedFailure`] - a clonable captured failure, re-raised identically
//!   to every caller of a memoization cell
//! - [`AggregateFailure`] - the combined error reported by strict-mode
//!   artifact collection
//! - [`ModelLock`] / [`run_under_model_lock`] - the opaque execution boundary
//!   that serializes artifact realization with the wider build model

pub mod error;
pub mod model_lock;

pub use error::{AggregateFailure, MetadataError, SharedFailure};
pub use model_lock::{DirectModelLock, ModelLock, run_under_model_lock};
