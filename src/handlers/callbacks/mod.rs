//! Callback query handlers module
//!
//! Handles the approve/reject inline buttons attached to new-client
//! prompts. Button data is `approve:<client_id>` / `reject:<client_id>`;
//! the engine performs the transition and sends the feedback.

use teloxide::{prelude::*, types::CallbackQuery};
use tracing::{debug, warn};

use crate::models::event::AdminAction;
use crate::services::ServiceFactory;
use crate::utils::errors::Result;

/// Main callback query dispatcher
pub async fn handle_callback_query(
    bot: Bot,
    query: CallbackQuery,
    services: ServiceFactory,
) -> Result<()> {
    let actor_id = query.from.id.0 as i64;

    // Answer first to clear the button's loading state
    if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
        warn!(error = %e, "Failed to answer callback query");
    }

    let Some(data) = query.data else {
        debug!(actor_id = actor_id, "Callback query without data ignored");
        return Ok(());
    };

    let origin_chat = query
        .message
        .as_ref()
        .map(|m| m.chat().id.0)
        .unwrap_or(actor_id);

    let action = match parse_callback(&data) {
        Some(action) => action,
        None => {
            warn!(actor_id = actor_id, data = %data, "Unknown callback action");
            return Ok(());
        }
    };

    services
        .dispatcher
        .execute_admin(actor_id, origin_chat, action)
        .await
}

fn parse_callback(data: &str) -> Option<AdminAction> {
    let (action, id) = data.split_once(':')?;
    let client_id: i64 = id.parse().ok()?;
    match action {
        "approve" => Some(AdminAction::Approve { client_id }),
        "reject" => Some(AdminAction::Reject { client_id }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_callback_data() {
        assert_eq!(
            parse_callback("approve:42"),
            Some(AdminAction::Approve { client_id: 42 })
        );
        assert_eq!(
            parse_callback("reject:-7"),
            Some(AdminAction::Reject { client_id: -7 })
        );
        assert_eq!(parse_callback("approve:nope"), None);
        assert_eq!(parse_callback("ban:42"), None);
        assert_eq!(parse_callback("approve"), None);
    }
}
