//! Message relay implementation
//!
//! Classifies inbound events and turns them into outbound actions: client
//! content is routed to its bound group behind the privacy mask, group
//! replies go back to the bound client verbatim, and admin actions are
//! dispatched to the approval state machine with feedback rendered for the
//! acting admin.
//!
//! The relay never talks to the transport itself; it only emits
//! [`OutboundAction`]s, which keeps the whole engine testable with an
//! injected store.

use tracing::{debug, info, warn};

use crate::models::event::{
    AdminAction, ChatContext, InboundMessage, MessagePayload, OutboundAction, PayloadKind,
};
use crate::services::approval::ApprovalService;
use crate::services::auth::AuthService;
use crate::services::routing::{Destination, Origin, RoutingService};
use crate::storage::IdentityStore;
use crate::utils::errors::{BridgeError, Result};
use crate::utils::mask::mask;

/// Relay engine turning inbound events into outbound actions
#[derive(Debug, Clone)]
pub struct RelayService {
    store: IdentityStore,
    auth: AuthService,
    approval: ApprovalService,
    routing: RoutingService,
}

impl RelayService {
    /// Create a new RelayService instance
    pub fn new(
        store: IdentityStore,
        auth: AuthService,
        approval: ApprovalService,
        routing: RoutingService,
    ) -> Self {
        Self {
            store,
            auth,
            approval,
            routing,
        }
    }

    /// Handle an inbound content message and emit the outbound actions to
    /// deliver.
    pub async fn handle_message(&self, msg: InboundMessage) -> Result<Vec<OutboundAction>> {
        match msg.context {
            ChatContext::Private => self.handle_private_message(msg).await,
            ChatContext::Group => self.handle_group_message(msg).await,
        }
    }

    async fn handle_private_message(&self, msg: InboundMessage) -> Result<Vec<OutboundAction>> {
        // Admins converse through commands and buttons only
        if self.auth.is_admin(msg.sender_id).await {
            debug!(sender_id = msg.sender_id, "Admin content message ignored");
            return Ok(vec![]);
        }

        let (client, created) = self
            .approval
            .register_or_get_client(msg.sender_id, &msg.display_name)
            .await?;

        if created {
            info!(client_id = client.telegram_id, "First contact, prompting admins");
            let mut actions = self.admin_approval_prompts(&client.display_name, client.telegram_id).await;
            actions.push(OutboundAction::SendText {
                chat_id: msg.sender_id,
                text: "⏳ Your request is pending approval. You'll be notified when approved."
                    .to_string(),
            });
            return Ok(actions);
        }

        match self.routing.resolve_destination(client.telegram_id).await? {
            Destination::NotApproved if client.status.is_rejected() => {
                // Rejected clients are dropped silently, no re-prompt
                debug!(client_id = client.telegram_id, "Message from rejected client dropped");
                Ok(vec![])
            }
            Destination::NotApproved => Ok(vec![OutboundAction::SendText {
                chat_id: msg.sender_id,
                text: "⏳ Your request is still pending approval.".to_string(),
            }]),
            Destination::NotBound => Ok(vec![OutboundAction::SendText {
                chat_id: msg.sender_id,
                text: "❌ You are not assigned to any group yet.".to_string(),
            }]),
            Destination::Group(group_id) => {
                info!(
                    client_id = client.telegram_id,
                    group_id = group_id,
                    kind = ?msg.payload.kind,
                    "Forwarding client message to group"
                );
                Ok(vec![
                    Self::masked_forward(
                        group_id,
                        client.telegram_id,
                        &client.display_name,
                        &msg.payload,
                    ),
                    Self::text(msg.sender_id, "✅ Message sent!"),
                ])
            }
        }
    }

    async fn handle_group_message(&self, msg: InboundMessage) -> Result<Vec<OutboundAction>> {
        // Content from unregistered groups is ignored entirely
        if self.store.get_group(msg.context_id).await.is_none() {
            debug!(group_id = msg.context_id, "Message in unregistered group ignored");
            return Ok(vec![]);
        }

        match self
            .routing
            .resolve_origin(msg.context_id, msg.reply_to_client)
            .await?
        {
            Origin::Client(client_id) => {
                info!(
                    group_id = msg.context_id,
                    client_id = client_id,
                    kind = ?msg.payload.kind,
                    "Forwarding group reply to client"
                );
                // Group replies are never masked
                Ok(vec![Self::verbatim_forward(client_id, &msg.payload)])
            }
            Origin::NoBinding => {
                warn!(group_id = msg.context_id, "Group reply with no bound client dropped");
                Ok(vec![OutboundAction::SendText {
                    chat_id: msg.context_id,
                    text: "❌ No client is bound to this group; the reply was not delivered."
                        .to_string(),
                }])
            }
            Origin::Ambiguous => Ok(vec![OutboundAction::SendText {
                chat_id: msg.context_id,
                text: "❌ Several clients are bound here. Reply directly to the client's message."
                    .to_string(),
            }]),
        }
    }

    /// Handle a parsed admin action and emit feedback for the acting admin
    /// plus any client notifications.
    ///
    /// Business failures (authorization, stale state, unknown targets) are
    /// rendered as feedback to `origin_chat` rather than surfaced as
    /// errors; only system failures propagate.
    pub async fn handle_admin_action(
        &self,
        actor_id: i64,
        origin_chat: i64,
        action: AdminAction,
    ) -> Result<Vec<OutboundAction>> {
        let outcome = self.apply_admin_action(actor_id, origin_chat, &action).await;

        match outcome {
            Ok(actions) => Ok(actions),
            Err(BridgeError::NotAuthorized(_)) => {
                warn!(actor_id = actor_id, action = ?action, "Unauthorized admin action");
                Ok(vec![Self::text(origin_chat, "❌ Admin access required!")])
            }
            Err(BridgeError::StaleState {
                client_id, actual, ..
            }) => Ok(vec![Self::text(
                origin_chat,
                format!("⚠️ Client {} was already resolved: {}.", client_id, actual),
            )]),
            Err(BridgeError::UnknownClient { client_id }) => Ok(vec![Self::text(
                origin_chat,
                format!("❌ Client {} not found.", client_id),
            )]),
            Err(BridgeError::UnknownGroup { group_id }) => Ok(vec![Self::text(
                origin_chat,
                format!("❌ Group {} is not registered.", group_id),
            )]),
            Err(BridgeError::InvalidInput(reason)) => {
                Ok(vec![Self::text(origin_chat, format!("❌ {}", reason))])
            }
            Err(e) => Err(e),
        }
    }

    async fn apply_admin_action(
        &self,
        actor_id: i64,
        origin_chat: i64,
        action: &AdminAction,
    ) -> Result<Vec<OutboundAction>> {
        match action {
            AdminAction::Approve { client_id } => {
                self.approval.approve(actor_id, *client_id).await?;
                Ok(vec![
                    Self::text(origin_chat, format!("✅ Client {} approved!", client_id)),
                    Self::text(
                        *client_id,
                        "✅ You are approved! Your messages will be relayed once a group is assigned.",
                    ),
                ])
            }
            AdminAction::Reject { client_id } => {
                self.approval.reject(actor_id, *client_id).await?;
                Ok(vec![
                    Self::text(origin_chat, format!("❌ Client {} rejected.", client_id)),
                    Self::text(*client_id, "❌ Your request was rejected."),
                ])
            }
            AdminAction::Reset { client_id } => {
                self.approval.reset(actor_id, *client_id).await?;
                Ok(vec![
                    Self::text(
                        origin_chat,
                        format!("⏳ Client {} returned to the pending queue.", client_id),
                    ),
                    Self::text(*client_id, "⏳ Your request is pending approval again."),
                ])
            }
            AdminAction::Assign {
                client_id,
                group_id,
            } => {
                self.approval.assign(actor_id, *client_id, *group_id).await?;
                Ok(vec![
                    Self::text(
                        origin_chat,
                        format!("✅ Client {} assigned to group {}.", client_id, group_id),
                    ),
                    Self::text(
                        *client_id,
                        "✅ A group has been assigned. Your messages will now be relayed.",
                    ),
                ])
            }
            AdminAction::RegisterGroup { group_id, title } => {
                let group = self
                    .approval
                    .register_group(actor_id, *group_id, title)
                    .await?;
                Ok(vec![Self::text(
                    origin_chat,
                    format!("✅ Group '{}' registered!", group.title),
                )])
            }
            AdminAction::DeleteClient { client_id } => {
                let deleted = self.approval.delete_client(actor_id, *client_id).await?;
                let text = if deleted {
                    format!("🗑 Client {} deleted.", client_id)
                } else {
                    format!("Client {} was not known.", client_id)
                };
                Ok(vec![Self::text(origin_chat, text)])
            }
            AdminAction::DeleteGroup { group_id } => {
                let unbound = self.approval.delete_group(actor_id, *group_id).await?;
                let text = match unbound {
                    Some(ids) => format!(
                        "🗑 Group {} deregistered; {} client(s) unbound.",
                        group_id,
                        ids.len()
                    ),
                    None => format!("Group {} was not registered.", group_id),
                };
                Ok(vec![Self::text(origin_chat, text)])
            }
            AdminAction::ListPending => {
                let pending = self.approval.list_pending(actor_id).await?;
                let text = if pending.is_empty() {
                    "📋 No pending clients.".to_string()
                } else {
                    let mut lines = vec!["📋 Pending clients (oldest first):".to_string()];
                    for client in pending {
                        lines.push(format!("  {} — {}", client.telegram_id, client.display_name));
                    }
                    lines.join("\n")
                };
                Ok(vec![Self::text(origin_chat, text)])
            }
            AdminAction::ListClients => {
                let clients = self.approval.list_clients(actor_id).await?;
                let text = if clients.is_empty() {
                    "📋 No clients registered yet.".to_string()
                } else {
                    let mut lines = vec!["📋 Clients:".to_string()];
                    for client in clients {
                        lines.push(format!(
                            "  {} — {} ({})",
                            client.telegram_id, client.display_name, client.status
                        ));
                    }
                    lines.join("\n")
                };
                Ok(vec![Self::text(origin_chat, text)])
            }
            AdminAction::AddAdmin { user_id } => {
                let added = self.approval.add_admin(actor_id, *user_id).await?;
                let text = if added {
                    format!("✅ Admin {} added!", user_id)
                } else {
                    format!("Admin {} already exists.", user_id)
                };
                Ok(vec![Self::text(origin_chat, text)])
            }
        }
    }

    /// Notice to the original sender after a transport-level delivery
    /// failure. The state transition that produced the message stands.
    pub fn delivery_failure_notice(&self, sender_chat_id: i64) -> OutboundAction {
        Self::text(
            sender_chat_id,
            "⚠️ Your message could not be delivered. Please try again.",
        )
    }

    async fn admin_approval_prompts(
        &self,
        display_name: &str,
        client_id: i64,
    ) -> Vec<OutboundAction> {
        let text = format!(
            "🆕 New client request:\n\nID: {}\nName: {}",
            client_id, display_name
        );
        self.auth
            .admin_ids()
            .await
            .into_iter()
            .map(|admin_id| OutboundAction::PromptAdminApproval {
                admin_id,
                client_id,
                text: text.clone(),
            })
            .collect()
    }

    fn masked_forward(
        group_id: i64,
        client_id: i64,
        display_name: &str,
        payload: &MessagePayload,
    ) -> OutboundAction {
        let masked = mask(display_name);
        let action = match payload.kind {
            PayloadKind::Text => OutboundAction::SendText {
                chat_id: group_id,
                text: format!("{}: {}", masked, payload.content),
            },
            kind => OutboundAction::SendMedia {
                chat_id: group_id,
                kind,
                file_id: payload.content.clone(),
                caption: Some(match &payload.caption {
                    Some(caption) => format!("{}: {}", masked, caption),
                    None => masked,
                }),
            },
        };

        // Wrapped so the dispatcher can link the delivered message id back
        // to the client for reply routing
        OutboundAction::ForwardFromClient {
            client_id,
            action: Box::new(action),
        }
    }

    fn verbatim_forward(client_id: i64, payload: &MessagePayload) -> OutboundAction {
        match payload.kind {
            PayloadKind::Text => OutboundAction::SendText {
                chat_id: client_id,
                text: payload.content.clone(),
            },
            kind => OutboundAction::SendMedia {
                chat_id: client_id,
                kind,
                file_id: payload.content.clone(),
                caption: payload.caption.clone(),
            },
        }
    }

    fn text(chat_id: i64, text: impl Into<String>) -> OutboundAction {
        OutboundAction::SendText {
            chat_id,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN: i64 = 900;

    fn private_text(sender_id: i64, name: &str, text: &str) -> InboundMessage {
        InboundMessage {
            sender_id,
            display_name: name.to_string(),
            context: ChatContext::Private,
            context_id: sender_id,
            payload: MessagePayload::text(text),
            reply_to_client: None,
        }
    }

    fn group_text(group_id: i64, text: &str) -> InboundMessage {
        InboundMessage {
            sender_id: 555,
            display_name: "Employee".to_string(),
            context: ChatContext::Group,
            context_id: group_id,
            payload: MessagePayload::text(text),
            reply_to_client: None,
        }
    }

    async fn relay() -> RelayService {
        let store = IdentityStore::in_memory();
        store.seed_admins(&[ADMIN]).await.unwrap();
        let auth = AuthService::new(store.clone());
        let approval = ApprovalService::new(store.clone(), auth.clone());
        let routing = RoutingService::new(store.clone());
        RelayService::new(store, auth, approval, routing)
    }

    #[tokio::test]
    async fn test_first_contact_prompts_admins_and_acks() {
        let relay = relay().await;
        let actions = relay
            .handle_message(private_text(1, "Alice", "hello"))
            .await
            .unwrap();

        assert_eq!(actions.len(), 2);
        assert!(matches!(
            actions[0],
            OutboundAction::PromptAdminApproval { admin_id: ADMIN, client_id: 1, .. }
        ));
        assert!(matches!(
            actions[1],
            OutboundAction::SendText { chat_id: 1, .. }
        ));
    }

    #[tokio::test]
    async fn test_pending_content_never_reaches_group() {
        let relay = relay().await;
        relay
            .handle_message(private_text(1, "Alice", "hello"))
            .await
            .unwrap();

        let actions = relay
            .handle_message(private_text(1, "Alice", "anyone there?"))
            .await
            .unwrap();

        // Only the waiting acknowledgment, addressed to the client
        assert_eq!(actions.len(), 1);
        assert!(matches!(
            &actions[0],
            OutboundAction::SendText { chat_id: 1, text } if text.contains("pending")
        ));
    }

    #[tokio::test]
    async fn test_rejected_client_dropped_silently() {
        let relay = relay().await;
        relay
            .handle_message(private_text(1, "Alice", "hello"))
            .await
            .unwrap();
        relay
            .handle_admin_action(ADMIN, ADMIN, AdminAction::Reject { client_id: 1 })
            .await
            .unwrap();

        let actions = relay
            .handle_message(private_text(1, "Alice", "hello again"))
            .await
            .unwrap();
        assert!(actions.is_empty());
    }

    #[tokio::test]
    async fn test_full_scenario_masked_forward_and_unmasked_reply() {
        let relay = relay().await;

        // alice92 sends "hello" while unknown
        relay
            .handle_message(private_text(1, "Alice", "hello"))
            .await
            .unwrap();

        // admin A approves, admin B assigns to registered group G1
        relay
            .handle_admin_action(ADMIN, ADMIN, AdminAction::Approve { client_id: 1 })
            .await
            .unwrap();
        relay
            .handle_admin_action(
                ADMIN,
                -100,
                AdminAction::RegisterGroup {
                    group_id: -100,
                    title: "G1".to_string(),
                },
            )
            .await
            .unwrap();
        relay
            .handle_admin_action(
                ADMIN,
                ADMIN,
                AdminAction::Assign {
                    client_id: 1,
                    group_id: -100,
                },
            )
            .await
            .unwrap();

        // "hi team" reaches exactly G1, masked, and the client is acked
        let actions = relay
            .handle_message(private_text(1, "Alice", "hi team"))
            .await
            .unwrap();
        assert_eq!(
            actions,
            vec![
                OutboundAction::ForwardFromClient {
                    client_id: 1,
                    action: Box::new(OutboundAction::SendText {
                        chat_id: -100,
                        text: "Ali[redacted]: hi team".to_string(),
                    }),
                },
                OutboundAction::SendText {
                    chat_id: 1,
                    text: "✅ Message sent!".to_string(),
                },
            ]
        );

        // group reply goes back verbatim, unmasked
        let actions = relay
            .handle_message(group_text(-100, "hi back"))
            .await
            .unwrap();
        assert_eq!(
            actions,
            vec![OutboundAction::SendText {
                chat_id: 1,
                text: "hi back".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_approved_unbound_client_notified() {
        let relay = relay().await;
        relay
            .handle_message(private_text(1, "Alice", "hello"))
            .await
            .unwrap();
        relay
            .handle_admin_action(ADMIN, ADMIN, AdminAction::Approve { client_id: 1 })
            .await
            .unwrap();

        let actions = relay
            .handle_message(private_text(1, "Alice", "hi team"))
            .await
            .unwrap();
        assert_eq!(actions.len(), 1);
        assert!(matches!(
            &actions[0],
            OutboundAction::SendText { chat_id: 1, text } if text.contains("not assigned")
        ));
    }

    #[tokio::test]
    async fn test_unregistered_group_content_ignored() {
        let relay = relay().await;
        let actions = relay.handle_message(group_text(-200, "hello?")).await.unwrap();
        assert!(actions.is_empty());
    }

    #[tokio::test]
    async fn test_registered_group_without_binding_gets_notice() {
        let relay = relay().await;
        relay
            .handle_admin_action(
                ADMIN,
                -100,
                AdminAction::RegisterGroup {
                    group_id: -100,
                    title: "G1".to_string(),
                },
            )
            .await
            .unwrap();

        let actions = relay.handle_message(group_text(-100, "anyone?")).await.unwrap();
        assert_eq!(actions.len(), 1);
        assert!(matches!(
            &actions[0],
            OutboundAction::SendText { chat_id: -100, text } if text.contains("No client")
        ));
    }

    #[tokio::test]
    async fn test_media_forward_carries_masked_caption() {
        let relay = relay().await;
        relay
            .handle_message(private_text(1, "Alice", "hello"))
            .await
            .unwrap();
        relay
            .handle_admin_action(ADMIN, ADMIN, AdminAction::Approve { client_id: 1 })
            .await
            .unwrap();
        relay
            .handle_admin_action(
                ADMIN,
                -100,
                AdminAction::RegisterGroup {
                    group_id: -100,
                    title: "G1".to_string(),
                },
            )
            .await
            .unwrap();
        relay
            .handle_admin_action(
                ADMIN,
                ADMIN,
                AdminAction::Assign {
                    client_id: 1,
                    group_id: -100,
                },
            )
            .await
            .unwrap();

        let mut msg = private_text(1, "Alice", "");
        msg.payload = MessagePayload::media(PayloadKind::Photo, "file-123", None);
        let actions = relay.handle_message(msg).await.unwrap();
        assert_eq!(
            actions,
            vec![
                OutboundAction::ForwardFromClient {
                    client_id: 1,
                    action: Box::new(OutboundAction::SendMedia {
                        chat_id: -100,
                        kind: PayloadKind::Photo,
                        file_id: "file-123".to_string(),
                        caption: Some("Ali[redacted]".to_string()),
                    }),
                },
                OutboundAction::SendText {
                    chat_id: 1,
                    text: "✅ Message sent!".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_non_admin_action_rejected_without_state_change() {
        let relay = relay().await;
        relay
            .handle_message(private_text(1, "Alice", "hello"))
            .await
            .unwrap();

        let actions = relay
            .handle_admin_action(1, 1, AdminAction::Approve { client_id: 1 })
            .await
            .unwrap();
        assert!(matches!(
            &actions[0],
            OutboundAction::SendText { chat_id: 1, text } if text.contains("Admin access")
        ));

        // Still pending
        let pending = relay.approval.list_pending(ADMIN).await.unwrap();
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test]
    async fn test_stale_resolution_reports_true_state() {
        let relay = relay().await;
        relay
            .handle_message(private_text(1, "Alice", "hello"))
            .await
            .unwrap();
        relay
            .handle_admin_action(ADMIN, ADMIN, AdminAction::Approve { client_id: 1 })
            .await
            .unwrap();

        let actions = relay
            .handle_admin_action(ADMIN, ADMIN, AdminAction::Reject { client_id: 1 })
            .await
            .unwrap();
        assert_eq!(actions.len(), 1);
        assert!(matches!(
            &actions[0],
            OutboundAction::SendText { text, .. } if text.contains("already resolved")
        ));
    }
}
