// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live document subscriptions with explicit disposers.
//!
//! A subscription is a background task that reads one document, delivers the
//! first result, and then re-reads on an interval, delivering again only when
//! the observed value changes. Without an interval it delivers once and ends.

use crate::error::AppError;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Disposer for a running subscription.
///
/// `cancel` stops the task. Dropping an uncancelled subscription stops it too.
#[derive(Debug)]
pub struct Subscription {
    collection: &'static str,
    uid: String,
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn collection(&self) -> &'static str {
        self.collection
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Whether the underlying task has ended (one-shot delivered, or cancelled).
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    pub fn cancel(mut self) {
        self.abort();
    }

    fn abort(&mut self) {
        if let Some(handle) = self.handle.take() {
            tracing::debug!(collection = self.collection, uid = %self.uid, "Subscription cancelled");
            handle.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.abort();
    }
}

/// What the last delivery looked like, for change detection.
#[derive(PartialEq)]
enum Observed<T> {
    Value(Option<T>),
    Failed,
}

/// Start watching one document.
///
/// `fetch` performs a single read; `deliver` receives each distinct result.
/// A repeated failure is delivered once, until a value arrives again.
pub fn watch_document<T, F, Fut, D>(
    collection: &'static str,
    uid: &str,
    interval: Option<Duration>,
    fetch: F,
    mut deliver: D,
) -> Subscription
where
    T: Clone + PartialEq + Send + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Option<T>, AppError>> + Send + 'static,
    D: FnMut(Result<Option<T>, AppError>) + Send + 'static,
{
    let task_uid = uid.to_string();

    let handle = tokio::spawn(async move {
        let mut last: Option<Observed<T>> = None;

        loop {
            let result = fetch().await;
            let observed = match &result {
                Ok(value) => Observed::Value(value.clone()),
                Err(_) => Observed::Failed,
            };

            if last.as_ref() != Some(&observed) {
                deliver(result);
                last = Some(observed);
            } else {
                tracing::trace!(collection, uid = %task_uid, "Snapshot unchanged");
            }

            match interval {
                Some(interval) => tokio::time::sleep(interval).await,
                None => break,
            }
        }
    });

    Subscription {
        collection,
        uid: uid.to_string(),
        handle: Some(handle),
    }
}
