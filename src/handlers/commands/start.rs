//! Start command handler
//!
//! First touch point for both admins and clients. An unknown client
//! issuing /start is registered as pending and the admins are prompted,
//! the same as on a first content message.

use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, Message};
use tracing::{info, warn};

use crate::models::client::ClientStatus;
use crate::services::ServiceFactory;
use crate::utils::errors::{BridgeError, Result};

/// Handle /start command
pub async fn handle_start(bot: Bot, msg: Message, services: ServiceFactory) -> Result<()> {
    let user = msg
        .from
        .as_ref()
        .ok_or_else(|| BridgeError::InvalidInput("No user in message".to_string()))?;
    let user_id = user.id.0 as i64;

    if services.auth_service.is_admin(user_id).await {
        bot.send_message(msg.chat.id, "🔧 Admin panel ready. See /help for commands.")
            .await?;
        return Ok(());
    }

    let display_name = user
        .username
        .clone()
        .unwrap_or_else(|| user.first_name.clone());
    let (client, created) = services
        .approval_service
        .register_or_get_client(user_id, &display_name)
        .await?;

    if created {
        info!(client_id = user_id, "Client registered via /start");
        prompt_admins(&bot, &services, user_id, &display_name).await;
        bot.send_message(
            msg.chat.id,
            "⏳ Your request is pending approval.\n\nYou'll be notified when approved.",
        )
        .await?;
        return Ok(());
    }

    let text = match client.status {
        ClientStatus::Pending => "⏳ Your request is still pending approval.",
        ClientStatus::Approved {
            assigned_group: Some(_),
        } => "✅ You are approved! Send any message and it will be forwarded to your group.",
        ClientStatus::Approved {
            assigned_group: None,
        } => "✅ You are approved! You'll be able to send messages once a group is assigned.",
        ClientStatus::Rejected => return Ok(()),
    };
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

async fn prompt_admins(bot: &Bot, services: &ServiceFactory, client_id: i64, display_name: &str) {
    let text = format!(
        "🆕 New client request:\n\nID: {}\nName: {}",
        client_id, display_name
    );
    let prompts = services
        .auth_service
        .admin_ids()
        .await
        .into_iter()
        .map(|admin_id| {
            let keyboard = InlineKeyboardMarkup::new([[
                InlineKeyboardButton::callback("✅ Accept", format!("approve:{}", client_id)),
                InlineKeyboardButton::callback("❌ Reject", format!("reject:{}", client_id)),
            ]]);
            let text = text.clone();
            let bot = bot.clone();
            async move {
                if let Err(e) = bot
                    .send_message(ChatId(admin_id), text)
                    .reply_markup(keyboard)
                    .await
                {
                    warn!(admin_id = admin_id, error = %e, "Failed to prompt admin");
                }
            }
        });
    futures::future::join_all(prompts).await;
}
