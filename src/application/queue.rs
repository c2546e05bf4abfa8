//! Action queue - serializes outbound calls per conversation target
//!
//! Each target key owns a lane: a FIFO of pending actions drained by one
//! worker task. Only the lane's worker ever dequeues, so the head of a lane
//! is the only action in flight for that key. Lanes progress independently.
//!
//! A rate-limited head stays at the head and is retried with the same call
//! after the provider's delay; the rest of its lane waits behind it. A call
//! that panics is settled as an internal error and the lane moves on.
//!
//! Lanes are never retired: every key that has seen an action keeps one
//! parked worker task and an empty channel for the life of the queue.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::FutureExt;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use crate::application::errors::BotError;
use crate::application::events::EventBus;
use crate::domain::traits::{ActionTarget, Transport};

/// Key of the lane used when a target cannot be resolved
pub const FALLBACK_KEY: &str = "";

/// Maps an action target to its lane key
#[async_trait]
pub trait TargetResolver: Send + Sync {
    async fn resolve(&self, target: &ActionTarget) -> Result<String, BotError>;
}

/// Resolves targets through the transport's channel lookup
pub struct TransportResolver(pub Arc<dyn Transport>);

#[async_trait]
impl TargetResolver for TransportResolver {
    async fn resolve(&self, target: &ActionTarget) -> Result<String, BotError> {
        self.0.resolve_channel(target).await
    }
}

/// Outcome of one execution attempt of a lane head
enum Attempt {
    Done,
    RetryAfter(Duration),
}

#[async_trait]
trait Job: Send {
    async fn attempt(&mut self) -> Attempt;

    /// Settle the waiting caller without another attempt
    fn reject(&mut self, error: BotError);
}

/// A deferred call plus the caller waiting on it
struct PendingCall<F, T> {
    call: F,
    reply: Option<oneshot::Sender<Result<T, BotError>>>,
    events: EventBus,
}

#[async_trait]
impl<F, Fut, T> Job for PendingCall<F, T>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, BotError>> + Send,
    T: Send + 'static,
{
    async fn attempt(&mut self) -> Attempt {
        match (self.call)().await {
            Ok(value) => {
                if let Some(reply) = self.reply.take() {
                    let _ = reply.send(Ok(value));
                }
                Attempt::Done
            }
            Err(BotError::RateLimited { retry_after }) => Attempt::RetryAfter(retry_after),
            Err(e) => {
                self.reject(e);
                Attempt::Done
            }
        }
    }

    fn reject(&mut self, error: BotError) {
        self.events.report(error.clone());
        if let Some(reply) = self.reply.take() {
            let _ = reply.send(Err(error));
        }
    }
}

struct QueuedAction {
    id: u64,
    job: Box<dyn Job>,
}

struct Lane {
    sender: mpsc::UnboundedSender<QueuedAction>,
    pending: Arc<AtomicUsize>,
}

/// Per-target serializing scheduler for transport actions
pub struct ActionQueue {
    resolver: Arc<dyn TargetResolver>,
    events: EventBus,
    lanes: Mutex<HashMap<String, Lane>>,
    next_id: AtomicU64,
}

impl ActionQueue {
    pub fn new(resolver: Arc<dyn TargetResolver>, events: EventBus) -> Self {
        Self {
            resolver,
            events,
            lanes: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Resolve the lane key for a target, falling back to the global lane
    pub async fn resolve_key(&self, target: &ActionTarget) -> String {
        match self.resolver.resolve(target).await {
            Ok(key) => key,
            Err(e) => {
                debug!("Target resolution failed ({}), using fallback lane", e);
                FALLBACK_KEY.to_string()
            }
        }
    }

    /// Queue `call` behind every earlier action for the same target and wait
    /// for its outcome.
    ///
    /// `call` may run more than once: each rate-limit failure re-invokes it
    /// after the requested delay.
    pub async fn submit<T, F, Fut>(&self, target: &ActionTarget, call: F) -> Result<T, BotError>
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, BotError>> + Send + 'static,
        T: Send + 'static,
    {
        let key = self.resolve_key(target).await;
        self.submit_keyed(key, call).await
    }

    /// Like [`submit`](Self::submit) with an already resolved key
    pub async fn submit_keyed<T, F, Fut>(&self, key: impl Into<String>, call: F) -> Result<T, BotError>
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, BotError>> + Send + 'static,
        T: Send + 'static,
    {
        let (reply, outcome) = oneshot::channel();
        let action = QueuedAction {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            job: Box::new(PendingCall {
                call,
                reply: Some(reply),
                events: self.events.clone(),
            }),
        };
        self.enqueue(key.into(), action)?;

        outcome
            .await
            .map_err(|_| BotError::Internal("action dropped before completion".to_string()))?
    }

    /// Number of actions waiting or executing under `key`
    pub fn pending(&self, key: &str) -> usize {
        self.lanes
            .lock()
            .ok()
            .and_then(|lanes| lanes.get(key).map(|l| l.pending.load(Ordering::SeqCst)))
            .unwrap_or(0)
    }

    /// Keys that have ever had an action queued
    pub fn keys(&self) -> Vec<String> {
        self.lanes
            .lock()
            .map(|lanes| lanes.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn enqueue(&self, key: String, action: QueuedAction) -> Result<(), BotError> {
        let mut lanes = self
            .lanes
            .lock()
            .map_err(|_| BotError::Internal("Lock poisoned".to_string()))?;

        let action = match lanes.get(&key) {
            Some(lane) => {
                lane.pending.fetch_add(1, Ordering::SeqCst);
                match lane.sender.send(action) {
                    Ok(()) => return Ok(()),
                    // The lane's worker is gone; start a fresh one below.
                    Err(mpsc::error::SendError(action)) => {
                        lane.pending.fetch_sub(1, Ordering::SeqCst);
                        action
                    }
                }
            }
            None => action,
        };

        let (sender, receiver) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(1));
        sender
            .send(action)
            .map_err(|_| BotError::Internal("lane closed on creation".to_string()))?;
        tokio::spawn(drain(key.clone(), receiver, pending.clone()));
        lanes.insert(key, Lane { sender, pending });
        Ok(())
    }
}

/// Lane worker: run the head until it settles, then move to the next.
///
/// Iterative, so a long-lived lane never grows the stack. An idle lane simply
/// waits for its next action; there is no "continue on empty" step that could
/// strand a caller.
async fn drain(key: String, mut receiver: mpsc::UnboundedReceiver<QueuedAction>, pending: Arc<AtomicUsize>) {
    while let Some(mut action) = receiver.recv().await {
        loop {
            let attempt = AssertUnwindSafe(action.job.attempt()).catch_unwind().await;
            match attempt {
                Ok(Attempt::Done) => break,
                Ok(Attempt::RetryAfter(delay)) => {
                    warn!(
                        "Rate limited on lane {:?}, retrying action {} in {:?}",
                        key, action.id, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(_) => {
                    error!("Action {} on lane {:?} panicked", action.id, key);
                    action
                        .job
                        .reject(BotError::Internal(format!("action {} panicked", action.id)));
                    break;
                }
            }
        }
        pending.fetch_sub(1, Ordering::SeqCst);
    }
    debug!("Lane {:?} closed", key);
}
