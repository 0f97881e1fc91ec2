//! Help command handler

use teloxide::prelude::*;
use teloxide::types::Message;

use crate::services::ServiceFactory;
use crate::utils::errors::Result;

const CLIENT_HELP: &str = "Send any message here and it will be relayed to the team. \
You'll receive replies in this chat.";

const ADMIN_HELP: &str = "🔧 Admin commands:\n\n\
/pending - List clients awaiting approval\n\
/approve <client_id> - Approve a pending client\n\
/reject <client_id> - Reject a pending client\n\
/reset <client_id> - Return a client to the pending queue\n\
/assign <client_id> <group_id> - Bind a client to a registered group\n\
/register - Register the current group (run inside the group)\n\
/deletegroup <group_id> - Deregister a group (clients stay approved)\n\
/deleteclient <client_id> - Delete a client\n\
/listclients - List all clients\n\
/addadmin <user_id> - Add an admin";

/// Handle /help command
pub async fn handle_help(bot: Bot, msg: Message, services: ServiceFactory) -> Result<()> {
    let is_admin = match msg.from.as_ref() {
        Some(user) => services.auth_service.is_admin(user.id.0 as i64).await,
        None => false,
    };

    let text = if is_admin { ADMIN_HELP } else { CLIENT_HELP };
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}
