//! Interceptor registries for the request and response sides of the pipeline

use crate::config::RequestConfig;
use crate::error::{Error, Result};
use crate::response::Response;
use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

type FulfilledFn<T> = dyn Fn(T) -> BoxFuture<'static, Result<T>> + Send + Sync;
type RejectedFn<T> = dyn Fn(Error) -> BoxFuture<'static, Result<T>> + Send + Sync;

/// A success handler with an optional failure handler.
///
/// The failure handler receives the error produced by the stages before this
/// one and may recover by returning `Ok`.
pub struct Interceptor<T> {
    fulfilled: Arc<FulfilledFn<T>>,
    rejected: Option<Arc<RejectedFn<T>>>,
}

impl<T: Send + 'static> Interceptor<T> {
    pub fn new<F, Fut>(fulfilled: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            fulfilled: Arc::new(move |value| fulfilled(value).boxed()),
            rejected: None,
        }
    }

    /// Interceptor from a synchronous function.
    pub fn map<F>(f: F) -> Self
    where
        F: Fn(T) -> Result<T> + Send + Sync + 'static,
    {
        Self::new(move |value| std::future::ready(f(value)))
    }

    /// Interceptor that only handles failures; successes pass through.
    pub fn rejection<G, Fut>(rejected: G) -> Self
    where
        G: Fn(Error) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self::new(|value| async move { Ok(value) }).on_rejected(rejected)
    }

    pub fn on_rejected<G, Fut>(mut self, rejected: G) -> Self
    where
        G: Fn(Error) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        self.rejected = Some(Arc::new(move |err| rejected(err).boxed()));
        self
    }

    pub fn handles_rejection(&self) -> bool {
        self.rejected.is_some()
    }

    pub async fn fulfill(&self, value: T) -> Result<T> {
        (self.fulfilled)(value).await
    }

    /// Hand `err` to the failure handler, or return it unchanged when there is none.
    pub async fn reject(&self, err: Error) -> Result<T> {
        match &self.rejected {
            Some(rejected) => rejected(err).await,
            None => Err(err),
        }
    }

    /// Route the outcome of the previous stage to the matching handler.
    pub async fn settle(&self, outcome: Result<T>) -> Result<T> {
        match outcome {
            Ok(value) => self.fulfill(value).await,
            Err(err) => self.reject(err).await,
        }
    }
}

impl<T> Clone for Interceptor<T> {
    fn clone(&self) -> Self {
        Self {
            fulfilled: Arc::clone(&self.fulfilled),
            rejected: self.rejected.clone(),
        }
    }
}

impl<T> fmt::Debug for Interceptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptor")
            .field("rejected", &self.rejected.is_some())
            .finish()
    }
}

/// Handle returned by [`InterceptorManager::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterceptorId(usize);

impl InterceptorId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Ordered registry of interceptors.
///
/// Ejected entries leave an empty slot behind so ids stay valid.
pub struct InterceptorManager<T> {
    slots: RwLock<Vec<Option<Interceptor<T>>>>,
}

impl<T> Default for InterceptorManager<T> {
    fn default() -> Self {
        Self {
            slots: RwLock::new(Vec::new()),
        }
    }
}

impl<T> InterceptorManager<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, interceptor: Interceptor<T>) -> InterceptorId {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots.push(Some(interceptor));
        let id = InterceptorId(slots.len() - 1);
        tracing::debug!(id = id.0, "interceptor registered");
        id
    }

    /// Remove an interceptor. Unknown or already ejected ids are ignored.
    pub fn eject(&self, id: InterceptorId) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = slots.get_mut(id.0) {
            if slot.take().is_some() {
                tracing::debug!(id = id.0, "interceptor ejected");
            }
        }
    }

    /// Live interceptors in registration order.
    pub fn snapshot(&self) -> Vec<Interceptor<T>> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .flatten()
            .cloned()
            .collect()
    }

    /// Visit live interceptors in registration order. The visitor runs on a
    /// snapshot, so it may register or eject without blocking.
    pub fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(&Interceptor<T>),
    {
        for interceptor in self.snapshot() {
            visit(&interceptor);
        }
    }

    /// Number of live interceptors.
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|slot| slot.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> fmt::Debug for InterceptorManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorManager")
            .field("live", &self.len())
            .finish()
    }
}

/// The two registries owned by a client.
#[derive(Debug, Default)]
pub struct Interceptors {
    pub request: InterceptorManager<RequestConfig>,
    pub response: InterceptorManager<Response>,
}
