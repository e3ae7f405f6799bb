//! Rate-limited sequential execution
//!
//! The sequencer runs independent fetch operations one at a time, each
//! through the retry engine, and waits between consecutive operations so the
//! upstream rate limits are respected. Unlike the concurrent pipelines, order
//! of completion always equals order of submission.

use std::fmt::Display;
use std::future::Future;

use crate::utils::retry::{execute_with_retry, DelayRange, RetryPolicy};

/// Attempt budget for each sequenced operation
pub const SEQUENCED_MAX_ATTEMPTS: u32 = 20;

/// Sink receiving each successful result together with its arguments
pub type Sink<'a, A, T> = &'a mut dyn FnMut(T, &A);

/// Sequential runner with a fixed or randomized inter-call delay
#[derive(Debug, Clone, Copy)]
pub struct Sequencer {
    retry: RetryPolicy,
    inter_delay: DelayRange,
}

impl Sequencer {
    /// Create a sequencer with the standard per-operation retry budget
    pub fn new(inter_delay: DelayRange) -> Self {
        Self {
            retry: RetryPolicy::new(SEQUENCED_MAX_ATTEMPTS),
            inter_delay,
        }
    }

    /// Override the retry policy used for every operation
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Run `operation` once per argument, strictly in order.
    ///
    /// Operations that exhaust their retries are skipped. When `on_each` is
    /// given every result is handed to it and nothing is accumulated;
    /// otherwise the results are returned in input order.
    pub async fn run<A, T, E, F, Fut>(
        &self,
        args: Vec<A>,
        mut operation: F,
        mut on_each: Option<Sink<'_, A, T>>,
    ) -> Vec<T>
    where
        A: Clone,
        F: FnMut(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let total = args.len();
        let mut values = Vec::new();

        for (index, arg) in args.into_iter().enumerate() {
            if index > 0 {
                self.inter_delay.wait().await;
            }

            let result = execute_with_retry(&self.retry, || operation(arg.clone())).await;

            let Some(value) = result else {
                tracing::warn!(index = index + 1, total, "Sequenced operation exhausted, skipping");
                continue;
            };

            match on_each.as_mut() {
                Some(sink) => (*sink)(value, &arg),
                None => values.push(value),
            }

            tracing::info!(index = index + 1, total, "Sequenced operation completed");
        }

        values
    }

    /// Run all operations and collect the successful results
    pub async fn collect<A, T, E, F, Fut>(&self, args: Vec<A>, operation: F) -> Vec<T>
    where
        A: Clone,
        F: FnMut(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.run(args, operation, None).await
    }

    /// Run all operations, handing each result to `sink` instead of collecting
    pub async fn for_each<A, T, E, F, Fut, S>(&self, args: Vec<A>, operation: F, mut sink: S)
    where
        A: Clone,
        F: FnMut(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        S: FnMut(T, &A),
    {
        let sink: Sink<'_, A, T> = &mut sink;
        self.run(args, operation, Some(sink)).await;
    }
}
