//! Transport port and Telegram implementation
//!
//! The engine emits [`OutboundAction`]s; a `Transport` delivers them. The
//! trait keeps the relay and dispatcher independent of Telegram, so tests
//! drive them with a recording stub.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, Message};
use tracing::debug;

use crate::models::event::{OutboundAction, PayloadKind};
use crate::utils::errors::{BridgeError, Result};

/// Outbound delivery port.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver one outbound action, returning the platform message id of
    /// the sent message when the platform reports one. An error is a
    /// delivery failure; the caller decides how to surface it (the core
    /// never retries).
    async fn deliver(&self, action: &OutboundAction) -> Result<Option<i64>>;
}

/// Telegram transport backed by a `teloxide` bot.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    async fn send(
        &self,
        action: &OutboundAction,
    ) -> std::result::Result<Message, teloxide::RequestError> {
        // The forward wrapper only carries routing provenance; the send
        // itself is the inner action
        let action = match action {
            OutboundAction::ForwardFromClient { action, .. } => action.as_ref(),
            other => other,
        };

        let sent = match action {
            OutboundAction::SendText { chat_id, text } => {
                self.bot.send_message(ChatId(*chat_id), text).await?
            }
            OutboundAction::SendMedia {
                chat_id,
                kind,
                file_id,
                caption,
            } => {
                let chat = ChatId(*chat_id);
                let input = InputFile::file_id(file_id.clone());
                match kind {
                    PayloadKind::Photo => {
                        let mut req = self.bot.send_photo(chat, input);
                        if let Some(caption) = caption {
                            req = req.caption(caption.clone());
                        }
                        req.await?
                    }
                    PayloadKind::Video => {
                        let mut req = self.bot.send_video(chat, input);
                        if let Some(caption) = caption {
                            req = req.caption(caption.clone());
                        }
                        req.await?
                    }
                    PayloadKind::Audio => {
                        let mut req = self.bot.send_audio(chat, input);
                        if let Some(caption) = caption {
                            req = req.caption(caption.clone());
                        }
                        req.await?
                    }
                    PayloadKind::Document => {
                        let mut req = self.bot.send_document(chat, input);
                        if let Some(caption) = caption {
                            req = req.caption(caption.clone());
                        }
                        req.await?
                    }
                    PayloadKind::Voice => {
                        let mut req = self.bot.send_voice(chat, input);
                        if let Some(caption) = caption {
                            req = req.caption(caption.clone());
                        }
                        req.await?
                    }
                    // Text payloads are emitted as SendText; treat a stray
                    // one as plain text rather than dropping it
                    PayloadKind::Text => self.bot.send_message(chat, file_id.clone()).await?,
                }
            }
            OutboundAction::PromptAdminApproval {
                admin_id,
                client_id,
                text,
            } => {
                let keyboard = InlineKeyboardMarkup::new([[
                    InlineKeyboardButton::callback("✅ Accept", format!("approve:{}", client_id)),
                    InlineKeyboardButton::callback("❌ Reject", format!("reject:{}", client_id)),
                ]]);
                self.bot
                    .send_message(ChatId(*admin_id), text)
                    .reply_markup(keyboard)
                    .await?
            }
            OutboundAction::ForwardFromClient { .. } => unreachable!("wrapper unwrapped above"),
        };

        Ok(sent)
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn deliver(&self, action: &OutboundAction) -> Result<Option<i64>> {
        let sent = self
            .send(action)
            .await
            .map_err(|e| BridgeError::DeliveryFailed {
                chat_id: action.chat_id(),
                reason: e.to_string(),
            })?;

        debug!(chat_id = action.chat_id(), message_id = sent.id.0, "Outbound action delivered");
        Ok(Some(i64::from(sent.id.0)))
    }
}
