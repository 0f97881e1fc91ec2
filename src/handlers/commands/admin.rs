//! Admin command handlers
//!
//! Each handler maps one parsed command onto an [`AdminAction`] and runs
//! it on the dispatcher's priority path. Authorization and feedback are
//! the engine's business; unauthorized actors get their refusal from
//! there. The one chat-shape check lives here: registration must be
//! issued from inside the group it registers.

use teloxide::prelude::*;
use teloxide::types::Message;
use tracing::debug;

use crate::models::event::AdminAction;
use crate::services::ServiceFactory;
use crate::utils::errors::{BridgeError, Result};

/// Run a parsed admin action for the sender of `msg`.
pub async fn handle_admin_action(
    msg: &Message,
    services: &ServiceFactory,
    action: AdminAction,
) -> Result<()> {
    let actor_id = actor_of(msg)?;
    debug!(actor_id = actor_id, action = ?action, "Dispatching admin action");
    services
        .dispatcher
        .execute_admin(actor_id, msg.chat.id.0, action)
        .await
}

/// Register the chat the command was issued in as a relay group.
pub async fn handle_register_group(bot: Bot, msg: &Message, services: &ServiceFactory) -> Result<()> {
    let actor_id = actor_of(msg)?;
    let Some((group_id, title)) = register_target(msg) else {
        bot.send_message(
            msg.chat.id,
            "❌ /register must be issued inside the group to register.",
        )
        .await?;
        return Ok(());
    };

    services
        .dispatcher
        .execute_admin(
            actor_id,
            group_id,
            AdminAction::RegisterGroup { group_id, title },
        )
        .await
}

/// Chat to register, or `None` when the command was issued outside a
/// group or supergroup.
fn register_target(msg: &Message) -> Option<(i64, String)> {
    if !(msg.chat.is_group() || msg.chat.is_supergroup()) {
        return None;
    }
    let title = msg
        .chat
        .title()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("Group {}", msg.chat.id.0));
    Some((msg.chat.id.0, title))
}

fn actor_of(msg: &Message) -> Result<i64> {
    msg.from
        .as_ref()
        .map(|user| user.id.0 as i64)
        .ok_or_else(|| BridgeError::InvalidInput("No user in message".to_string()))
}
