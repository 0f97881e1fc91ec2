//! Shared test infrastructure
//!
//! Builds a fully wired engine on an in-memory identity store with a
//! recording transport standing in for Telegram.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use ClientBridge::config::Settings;
use ClientBridge::models::event::{ChatContext, InboundMessage, MessagePayload, OutboundAction};
use ClientBridge::services::ServiceFactory;
use ClientBridge::storage::IdentityStore;
use ClientBridge::transport::Transport;
use ClientBridge::utils::errors::{BridgeError, Result};

/// Bootstrap admin seeded into every test context.
pub const ADMIN_ID: i64 = 900;

/// Transport stub that records every delivered action, assigning
/// sequential message ids the way the real platform reports them.
///
/// Chats registered via [`fail_chat`](RecordingTransport::fail_chat) fail
/// delivery instead, which is how tests exercise the failure-notice path.
pub struct RecordingTransport {
    sent: Mutex<Vec<(i64, OutboundAction)>>,
    failing_chats: Mutex<HashSet<i64>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            failing_chats: Mutex::new(HashSet::new()),
        })
    }

    /// Make every delivery to `chat_id` fail from now on.
    pub async fn fail_chat(&self, chat_id: i64) {
        self.failing_chats.lock().await.insert(chat_id);
    }

    /// Snapshot of everything delivered so far, in delivery order.
    pub async fn sent(&self) -> Vec<OutboundAction> {
        self.sent
            .lock()
            .await
            .iter()
            .map(|(_, action)| action.clone())
            .collect()
    }

    /// Delivered actions with the message ids that were reported for them.
    pub async fn sent_with_ids(&self) -> Vec<(i64, OutboundAction)> {
        self.sent.lock().await.clone()
    }

    /// Poll until the recorded actions satisfy `pred`, then return them.
    ///
    /// The dispatcher delivers from worker tasks, so tests must wait rather
    /// than assert immediately after submitting.
    pub async fn wait_for<F>(&self, pred: F) -> Vec<OutboundAction>
    where
        F: Fn(&[OutboundAction]) -> bool,
    {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            let sent = self.sent().await;
            if pred(&sent) {
                return sent;
            }
            if tokio::time::Instant::now() >= deadline {
                panic!("timed out waiting for outbound actions; delivered so far: {:?}", sent);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn deliver(&self, action: &OutboundAction) -> Result<Option<i64>> {
        if self.failing_chats.lock().await.contains(&action.chat_id()) {
            return Err(BridgeError::DeliveryFailed {
                chat_id: action.chat_id(),
                reason: "stub failure".to_string(),
            });
        }
        let mut sent = self.sent.lock().await;
        let message_id = sent.len() as i64 + 1;
        sent.push((message_id, action.clone()));
        Ok(Some(message_id))
    }
}

/// A fully wired engine over an in-memory store.
pub struct TestContext {
    pub services: ServiceFactory,
    pub transport: Arc<RecordingTransport>,
}

pub async fn test_context() -> TestContext {
    let store = IdentityStore::in_memory();
    store.seed_admins(&[ADMIN_ID]).await.unwrap();

    let transport = RecordingTransport::new();
    let transport_port: Arc<dyn Transport> = transport.clone();

    let mut settings = Settings::default();
    settings.bot.token = "12345:test_token".to_string();
    settings.bot.admin_ids = vec![ADMIN_ID];

    let services = ServiceFactory::new(store, transport_port, &settings);
    TestContext {
        services,
        transport,
    }
}

/// Private text message from a client chat.
pub fn private_text(sender_id: i64, display_name: &str, text: &str) -> InboundMessage {
    InboundMessage {
        sender_id,
        display_name: display_name.to_string(),
        context: ChatContext::Private,
        context_id: sender_id,
        payload: MessagePayload::text(text),
        reply_to_client: None,
    }
}

/// Text message from a group member.
pub fn group_text(group_id: i64, sender_id: i64, text: &str) -> InboundMessage {
    InboundMessage {
        sender_id,
        display_name: "Employee".to_string(),
        context: ChatContext::Group,
        context_id: group_id,
        payload: MessagePayload::text(text),
        reply_to_client: None,
    }
}

/// Texts forwarded to `group_id` on behalf of clients, unwrapped from
/// their forward markers, in delivery order.
pub fn group_texts(sent: &[OutboundAction], group_id: i64) -> Vec<String> {
    sent.iter()
        .filter_map(|a| match a {
            OutboundAction::ForwardFromClient { action, .. } => match action.as_ref() {
                OutboundAction::SendText { chat_id, text } if *chat_id == group_id => {
                    Some(text.clone())
                }
                _ => None,
            },
            _ => None,
        })
        .collect()
}

/// Register, approve and bind a client in one step.
pub async fn bind_client(ctx: &TestContext, client_id: i64, display_name: &str, group_id: i64) {
    let approval = &ctx.services.approval_service;
    approval
        .register_or_get_client(client_id, display_name)
        .await
        .unwrap();
    approval.approve(ADMIN_ID, client_id).await.unwrap();
    approval
        .register_group(ADMIN_ID, group_id, "Test Group")
        .await
        .unwrap();
    approval.assign(ADMIN_ID, client_id, group_id).await.unwrap();
}
