//! Queued transport primitives
//!
//! Every outbound call is routed through the [`ActionQueue`] under the lane
//! of its first argument. Presence changes are not conversation scoped and go
//! straight to the transport.

use std::future::Future;
use std::sync::Arc;

use crate::application::errors::BotError;
use crate::application::queue::ActionQueue;
use crate::domain::entities::{Message, User};
use crate::domain::traits::{ActionTarget, Transport};

#[derive(Clone)]
pub struct Actions {
    transport: Arc<dyn Transport>,
    queue: Arc<ActionQueue>,
}

impl Actions {
    pub fn new(transport: Arc<dyn Transport>, queue: Arc<ActionQueue>) -> Self {
        Self { transport, queue }
    }

    pub fn queue(&self) -> &Arc<ActionQueue> {
        &self.queue
    }

    pub fn current_user(&self) -> Option<User> {
        self.transport.current_user()
    }

    async fn queued<T, F, Fut>(&self, target: ActionTarget, call: F) -> Result<T, BotError>
    where
        F: Fn(Arc<dyn Transport>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, BotError>> + Send + 'static,
        T: Send + 'static,
    {
        let transport = self.transport.clone();
        self.queue.submit(&target, move || call(transport.clone())).await
    }

    pub async fn send_message(
        &self,
        target: impl Into<ActionTarget>,
        text: impl Into<String>,
    ) -> Result<Message, BotError> {
        let target = target.into();
        let text = text.into();
        let to = target.clone();
        self.queued(target, move |transport| {
            let (to, text) = (to.clone(), text.clone());
            async move { transport.send_message(&to, &text).await }
        })
        .await
    }

    /// Replace the content of `message`
    pub async fn update_message(&self, message: &Message, text: impl Into<String>) -> Result<Message, BotError> {
        let text = text.into();
        let original = message.clone();
        self.queued(ActionTarget::from(message), move |transport| {
            let (original, text) = (original.clone(), text.clone());
            async move { transport.edit_message(&original, &text).await }
        })
        .await
    }

    pub async fn delete_message(&self, message: &Message) -> Result<(), BotError> {
        let doomed = message.clone();
        self.queued(ActionTarget::from(message), move |transport| {
            let doomed = doomed.clone();
            async move { transport.delete_message(&doomed).await }
        })
        .await
    }

    pub async fn delete_messages(&self, messages: Vec<Message>) -> Result<(), BotError> {
        let target = messages
            .first()
            .map(ActionTarget::from)
            .unwrap_or(ActionTarget::None);
        self.queued(target, move |transport| {
            let doomed = messages.clone();
            async move { transport.delete_messages(&doomed).await }
        })
        .await
    }

    /// Most recent messages of the target's channel, newest first
    pub async fn fetch_history(&self, target: impl Into<ActionTarget>, limit: usize) -> Result<Vec<Message>, BotError> {
        let target = target.into();
        let from = target.clone();
        self.queued(target, move |transport| {
            let from = from.clone();
            async move { transport.fetch_history(&from, limit).await }
        })
        .await
    }

    pub async fn pin_message(&self, message: &Message) -> Result<(), BotError> {
        let pinned = message.clone();
        self.queued(ActionTarget::from(message), move |transport| {
            let pinned = pinned.clone();
            async move { transport.pin_message(&pinned).await }
        })
        .await
    }

    pub async fn unpin_message(&self, message: &Message) -> Result<(), BotError> {
        let pinned = message.clone();
        self.queued(ActionTarget::from(message), move |transport| {
            let pinned = pinned.clone();
            async move { transport.unpin_message(&pinned).await }
        })
        .await
    }

    pub async fn pinned_messages(&self, target: impl Into<ActionTarget>) -> Result<Vec<Message>, BotError> {
        let target = target.into();
        let from = target.clone();
        self.queued(target, move |transport| {
            let from = from.clone();
            async move { transport.pinned_messages(&from).await }
        })
        .await
    }

    pub async fn set_presence(&self, game: Option<&str>) -> Result<(), BotError> {
        self.transport.set_presence(game).await
    }

    pub fn presence(&self) -> Option<String> {
        self.transport.presence()
    }
}
