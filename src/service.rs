//! Main entry point for reserva.
//!
//! This module provides the [`Reserva`] struct, a thin facade over the
//! engine coordinator that returns the unified [`Error`](crate::Error)
//! type.

use crate::error::Result;
use reserva_concurrency::ConflictClassifier;
use reserva_engine::{
    BookingReceipt, ExecuteOptions, MutationStep, TransactionCoordinator, ValidationPipeline,
};
use reserva_core::BookingRequest;
use reserva_storage::TransactionalStore;
use std::sync::Arc;

/// The reserva coordinator facade.
///
/// Wraps a [`TransactionCoordinator`] over any transactional store. The
/// caller supplies rules, steps, and options per call; the facade owns
/// nothing mutable and is safe to share across threads.
///
/// # Example
///
/// ```ignore
/// use reserva::prelude::*;
///
/// let store = MemStore::new();
/// let reserva = Reserva::new(Arc::new(store.clone()));
///
/// let receipt = reserva.execute(
///     &request,
///     &pipeline,
///     &steps,
///     &ExecuteOptions::new(IsolationGuarantee::Serializable),
/// )?;
/// ```
pub struct Reserva {
    coordinator: TransactionCoordinator,
}

impl Reserva {
    /// Facade over a store with the default conflict classifier.
    pub fn new(store: Arc<dyn TransactionalStore>) -> Self {
        Reserva {
            coordinator: TransactionCoordinator::new(store),
        }
    }

    /// Facade with a custom conflict classifier.
    pub fn with_classifier(
        store: Arc<dyn TransactionalStore>,
        classifier: Box<dyn ConflictClassifier>,
    ) -> Self {
        Reserva {
            coordinator: TransactionCoordinator::with_classifier(store, classifier),
        }
    }

    /// Run one coordinated execution.
    ///
    /// See [`TransactionCoordinator::execute`] for the attempt semantics;
    /// this wrapper only converts the error type.
    pub fn execute(
        &self,
        request: &BookingRequest,
        pipeline: &ValidationPipeline,
        steps: &[Box<dyn MutationStep>],
        options: &ExecuteOptions,
    ) -> Result<BookingReceipt> {
        self.coordinator
            .execute(request, pipeline, steps, options)
            .map_err(Into::into)
    }
}
