use crate::config::Config;
use crate::db::Db;
use std::collections::HashMap;
use std::sync::Arc;
use teloxide::types::Message;
use tokio::sync::Mutex;

/// Per-user conversational flag. Exactly one value per user lives in the
/// map at any instant, which is what makes the awaiting-input states
/// mutually exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Conversation {
    #[default]
    Idle,
    AwaitingAirtimeInput,
    AwaitingBroadcastInput,
}

/// Transient per-user conversation flags, keyed by user id. Held only in
/// process memory; lost on restart by design.
#[derive(Clone, Default)]
pub struct ConversationMap {
    inner: Arc<Mutex<HashMap<i64, Conversation>>>,
}

impl ConversationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a conversation state, replacing whatever was set before.
    pub async fn set(&self, user_id: i64, conversation: Conversation) {
        let mut conversations = self.inner.lock().await;
        if conversation == Conversation::Idle {
            conversations.remove(&user_id);
        } else {
            conversations.insert(user_id, conversation);
        }
    }

    /// Reads and disarms the user's state in one step, so a text message
    /// is consumed by at most one handler and both the success and the
    /// failure paths return to idle.
    pub async fn take(&self, user_id: i64) -> Conversation {
        self.inner
            .lock()
            .await
            .remove(&user_id)
            .unwrap_or_default()
    }

    pub async fn current(&self, user_id: i64) -> Conversation {
        self.inner
            .lock()
            .await
            .get(&user_id)
            .copied()
            .unwrap_or_default()
    }
}

#[derive(Clone)]
pub struct BotState {
    pub config: Arc<Config>,
    pub db: Arc<Db>,
    pub bot_username: Option<String>,
    pub conversations: ConversationMap,
}

pub fn sender_user_id(msg: &Message) -> Option<i64> {
    msg.from.as_ref().map(|user| user.id.0 as i64)
}

pub fn sender_username(msg: &Message) -> Option<String> {
    msg.from.as_ref().and_then(|user| user.username.clone())
}

pub fn sender_first_name(msg: &Message) -> Option<String> {
    msg.from.as_ref().map(|user| user.first_name.clone())
}

pub fn sender_last_name(msg: &Message) -> Option<String> {
    msg.from.as_ref().and_then(|user| user.last_name.clone())
}

/// Admin check against the configured id list plus the admins table.
/// A store failure only narrows the answer, never widens it.
pub async fn is_admin(state: &BotState, user_id: i64) -> bool {
    if state.config.is_admin(user_id) {
        return true;
    }
    match state.db.is_admin(user_id).await {
        Ok(admin) => admin,
        Err(error) => {
            tracing::warn!(user_id = user_id, error = %error, "Admin lookup failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn defaults_to_idle() {
        let conversations = ConversationMap::new();
        assert_eq!(conversations.current(7).await, Conversation::Idle);
    }

    #[tokio::test]
    async fn arming_replaces_previous_state() {
        let conversations = ConversationMap::new();
        conversations.set(7, Conversation::AwaitingAirtimeInput).await;
        conversations
            .set(7, Conversation::AwaitingBroadcastInput)
            .await;
        assert_eq!(
            conversations.current(7).await,
            Conversation::AwaitingBroadcastInput
        );
    }

    #[tokio::test]
    async fn take_disarms() {
        let conversations = ConversationMap::new();
        conversations.set(7, Conversation::AwaitingAirtimeInput).await;
        assert_eq!(
            conversations.take(7).await,
            Conversation::AwaitingAirtimeInput
        );
        assert_eq!(conversations.take(7).await, Conversation::Idle);
    }

    #[tokio::test]
    async fn states_are_independent_per_user() {
        let conversations = ConversationMap::new();
        conversations.set(1, Conversation::AwaitingAirtimeInput).await;
        conversations
            .set(2, Conversation::AwaitingBroadcastInput)
            .await;
        assert_eq!(
            conversations.take(1).await,
            Conversation::AwaitingAirtimeInput
        );
        assert_eq!(
            conversations.current(2).await,
            Conversation::AwaitingBroadcastInput
        );
    }

    #[tokio::test]
    async fn setting_idle_clears_the_entry() {
        let conversations = ConversationMap::new();
        conversations.set(7, Conversation::AwaitingAirtimeInput).await;
        conversations.set(7, Conversation::Idle).await;
        assert_eq!(conversations.current(7).await, Conversation::Idle);
    }
}
