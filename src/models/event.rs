//! Relay event model
//!
//! Inbound events as the transport hands them to the engine, the discrete
//! admin actions the command surface produces, and the outbound actions the
//! relay emits for the transport to deliver.

use serde::{Deserialize, Serialize};

/// Conversation context an inbound message arrived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatContext {
    Private,
    Group,
}

/// Type tag of an opaque message payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    Text,
    Photo,
    Video,
    Audio,
    Document,
    Voice,
}

/// An opaque message payload. `content` is the message text for
/// [`PayloadKind::Text`] and the platform file id for every other kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub kind: PayloadKind,
    pub content: String,
    /// Platform caption accompanying a media payload.
    pub caption: Option<String>,
}

impl MessagePayload {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: PayloadKind::Text,
            content: content.into(),
            caption: None,
        }
    }

    pub fn media(kind: PayloadKind, file_id: impl Into<String>, caption: Option<String>) -> Self {
        Self {
            kind,
            content: file_id.into(),
            caption,
        }
    }
}

/// An inbound content message, tagged the way the transport saw it.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub sender_id: i64,
    pub display_name: String,
    pub context: ChatContext,
    /// Chat the message arrived in; equals `sender_id` for private chats.
    pub context_id: i64,
    pub payload: MessagePayload,
    /// Client the message replies to, when the transport could resolve the
    /// reply reference. Only meaningful in group contexts.
    pub reply_to_client: Option<i64>,
}

/// Discrete admin actions accepted by the approval state machine.
///
/// The command surface parses raw text and button input into these; the
/// engine never sees free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminAction {
    Approve { client_id: i64 },
    Reject { client_id: i64 },
    Reset { client_id: i64 },
    Assign { client_id: i64, group_id: i64 },
    RegisterGroup { group_id: i64, title: String },
    DeleteClient { client_id: i64 },
    DeleteGroup { group_id: i64 },
    ListPending,
    ListClients,
    AddAdmin { user_id: i64 },
}

/// Outbound actions the relay emits; the transport delivers them
/// fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundAction {
    /// Plain text to a chat.
    SendText { chat_id: i64, text: String },
    /// Media payload forwarded by file id.
    SendMedia {
        chat_id: i64,
        kind: PayloadKind,
        file_id: String,
        caption: Option<String>,
    },
    /// New-client prompt to one admin; rendered with approve/reject
    /// choices at the transport edge.
    PromptAdminApproval {
        admin_id: i64,
        client_id: i64,
        text: String,
    },
    /// Masked client content to its bound group. Wraps the actual send so
    /// the delivered message id can be linked back to the client for reply
    /// routing.
    ForwardFromClient {
        client_id: i64,
        action: Box<OutboundAction>,
    },
}

impl OutboundAction {
    /// Chat the action is delivered to.
    pub fn chat_id(&self) -> i64 {
        match self {
            OutboundAction::SendText { chat_id, .. } => *chat_id,
            OutboundAction::SendMedia { chat_id, .. } => *chat_id,
            OutboundAction::PromptAdminApproval { admin_id, .. } => *admin_id,
            OutboundAction::ForwardFromClient { action, .. } => action.chat_id(),
        }
    }
}
