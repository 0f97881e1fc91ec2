//! Message handlers module
//!
//! Translates incoming Telegram messages into the relay's inbound events
//! and enqueues them on the dispatcher. No relay semantics live here; the
//! engine decides what happens to every message.

use teloxide::{prelude::*, types::Message};
use tracing::debug;

use crate::models::event::{ChatContext, InboundMessage, MessagePayload, PayloadKind};
use crate::services::ServiceFactory;
use crate::utils::errors::Result;

/// Handle an incoming content message
pub async fn handle_message(bot: Bot, msg: Message, services: ServiceFactory) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        debug!(chat_id = ?msg.chat.id, "Message without sender ignored");
        return Ok(());
    };

    let sender_id = user.id.0 as i64;
    let display_name = user
        .username
        .clone()
        .unwrap_or_else(|| user.first_name.clone());

    let context = if msg.chat.is_private() {
        ChatContext::Private
    } else if msg.chat.is_group() || msg.chat.is_supergroup() {
        ChatContext::Group
    } else {
        debug!(chat_id = ?msg.chat.id, "Message from unsupported chat kind ignored");
        return Ok(());
    };

    let Some(payload) = extract_payload(&msg) else {
        if context == ChatContext::Private {
            bot.send_message(msg.chat.id, "❌ Unsupported message type.")
                .await?;
        }
        return Ok(());
    };

    // A group reply addressed at a forwarded message resolves back to the
    // client it was forwarded from
    let reply_to_client = match (context, msg.reply_to_message()) {
        (ChatContext::Group, Some(replied)) => {
            services
                .reply_links
                .lookup(msg.chat.id.0, i64::from(replied.id.0))
                .await
        }
        _ => None,
    };

    let inbound = InboundMessage {
        sender_id,
        display_name,
        context,
        context_id: msg.chat.id.0,
        payload,
        reply_to_client,
    };

    services.dispatcher.submit(inbound).await
}

/// Map a Telegram message onto an opaque relay payload.
fn extract_payload(msg: &Message) -> Option<MessagePayload> {
    let caption = msg.caption().map(str::to_owned);

    if let Some(text) = msg.text() {
        return Some(MessagePayload::text(text));
    }
    if let Some(photos) = msg.photo() {
        // Largest size is last
        let best = photos.last()?;
        return Some(MessagePayload::media(
            PayloadKind::Photo,
            best.file.id.clone(),
            caption,
        ));
    }
    if let Some(video) = msg.video() {
        return Some(MessagePayload::media(
            PayloadKind::Video,
            video.file.id.clone(),
            caption,
        ));
    }
    if let Some(audio) = msg.audio() {
        return Some(MessagePayload::media(
            PayloadKind::Audio,
            audio.file.id.clone(),
            caption,
        ));
    }
    if let Some(document) = msg.document() {
        return Some(MessagePayload::media(
            PayloadKind::Document,
            document.file.id.clone(),
            caption,
        ));
    }
    if let Some(voice) = msg.voice() {
        return Some(MessagePayload::media(
            PayloadKind::Voice,
            voice.file.id.clone(),
            caption,
        ));
    }

    None
}
