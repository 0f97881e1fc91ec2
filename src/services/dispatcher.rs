//! Relay dispatcher implementation
//!
//! Explicit inbound-event queue in front of the relay engine. Each
//! conversation context gets its own worker task fed by a bounded mpsc
//! channel, which gives per-client FIFO ordering while different contexts
//! proceed concurrently. Workers idle beyond a configured window are
//! evicted and respawned on the next submission. Admin actions are executed
//! on a direct path that never queues behind bulk content.
//!
//! Every transport send runs under a bounded timeout; an elapsed timeout
//! is a delivery failure. Failures produce a notice to the original sender
//! and are never retried here.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, warn};

use crate::models::event::{AdminAction, InboundMessage, OutboundAction};
use crate::services::relay::RelayService;
use crate::storage::ReplyLinks;
use crate::transport::Transport;
use crate::utils::errors::Result;

/// Queueing front-end for the relay engine
#[derive(Clone)]
pub struct RelayDispatcher {
    relay: RelayService,
    transport: Arc<dyn Transport>,
    links: ReplyLinks,
    send_timeout: Duration,
    queue_capacity: usize,
    idle_timeout: Duration,
    workers: Arc<Mutex<HashMap<i64, mpsc::Sender<InboundMessage>>>>,
}

impl RelayDispatcher {
    /// Create a new RelayDispatcher instance
    pub fn new(
        relay: RelayService,
        transport: Arc<dyn Transport>,
        links: ReplyLinks,
        send_timeout: Duration,
        queue_capacity: usize,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            relay,
            transport,
            links,
            send_timeout,
            queue_capacity,
            idle_timeout,
            workers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Enqueue an inbound content message on its context's worker.
    ///
    /// Messages from the same context are processed strictly in the order
    /// they were submitted.
    pub async fn submit(&self, msg: InboundMessage) -> Result<()> {
        let context_id = msg.context_id;
        let sender = self.worker_for(context_id).await;

        if let Err(e) = sender.send(msg).await {
            // Worker evicted or died mid-flight; replace it and retry once
            debug!(context_id = context_id, "Relay worker gone, respawning");
            self.workers.lock().await.remove(&context_id);
            let sender = self.worker_for(context_id).await;
            sender
                .send(e.0)
                .await
                .map_err(|_| crate::utils::errors::BridgeError::InvalidInput(
                    "relay worker unavailable".to_string(),
                ))?;
        }
        Ok(())
    }

    /// Execute an admin action immediately, bypassing the content queues.
    pub async fn execute_admin(
        &self,
        actor_id: i64,
        origin_chat: i64,
        action: AdminAction,
    ) -> Result<()> {
        let actions = self
            .relay
            .handle_admin_action(actor_id, origin_chat, action)
            .await?;
        self.deliver_all(&actions, None).await;
        Ok(())
    }

    /// Number of live per-context workers.
    pub async fn worker_count(&self) -> usize {
        self.workers.lock().await.len()
    }

    async fn worker_for(&self, context_id: i64) -> mpsc::Sender<InboundMessage> {
        let mut workers = self.workers.lock().await;
        if let Some(sender) = workers.get(&context_id) {
            return sender.clone();
        }

        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let dispatcher = self.clone();
        let worker_tx = tx.clone();
        tokio::spawn(async move {
            dispatcher.run_worker(context_id, worker_tx, rx).await;
        });
        debug!(context_id = context_id, "Relay worker spawned");
        workers.insert(context_id, tx.clone());
        tx
    }

    async fn run_worker(
        self,
        context_id: i64,
        tx: mpsc::Sender<InboundMessage>,
        mut rx: mpsc::Receiver<InboundMessage>,
    ) {
        loop {
            match tokio::time::timeout(self.idle_timeout, rx.recv()).await {
                Ok(Some(msg)) => self.process(context_id, msg).await,
                Ok(None) => break,
                Err(_) => {
                    // Deregister before draining so a late sender respawns
                    // a fresh worker instead of feeding a dead channel
                    let mut workers = self.workers.lock().await;
                    if workers
                        .get(&context_id)
                        .is_some_and(|s| s.same_channel(&tx))
                    {
                        workers.remove(&context_id);
                    }
                    drop(workers);

                    rx.close();
                    while let Some(msg) = rx.recv().await {
                        self.process(context_id, msg).await;
                    }
                    debug!(context_id = context_id, "Idle relay worker evicted");
                    break;
                }
            }
        }
        debug!(context_id = context_id, "Relay worker stopped");
    }

    async fn process(&self, context_id: i64, msg: InboundMessage) {
        let notice_chat = msg.context_id;
        match self.relay.handle_message(msg).await {
            Ok(actions) => self.deliver_all(&actions, Some(notice_chat)).await,
            Err(e) => {
                error!(context_id = context_id, error = %e, "Relay failed to handle message");
            }
        }
    }

    /// Deliver actions fire-and-forget, recording reply links for client
    /// forwards. On failure or timeout, send a delivery-failed notice to
    /// `notice_chat` (best effort, no retry) and drop the remaining
    /// actions of the batch.
    async fn deliver_all(&self, actions: &[OutboundAction], notice_chat: Option<i64>) {
        for action in actions {
            let outcome =
                tokio::time::timeout(self.send_timeout, self.transport.deliver(action)).await;
            let failed = match outcome {
                Ok(Ok(message_id)) => {
                    if let OutboundAction::ForwardFromClient { client_id, action: inner } = action {
                        if let Some(message_id) = message_id {
                            self.links
                                .record(inner.chat_id(), message_id, *client_id)
                                .await;
                        }
                    }
                    None
                }
                Ok(Err(e)) => Some(e.to_string()),
                Err(_) => Some("send timed out".to_string()),
            };

            let Some(reason) = failed else { continue };
            warn!(
                chat_id = action.chat_id(),
                reason = %reason,
                "Outbound delivery failed"
            );

            let Some(chat_id) = notice_chat else { continue };
            let notice = self.relay.delivery_failure_notice(chat_id);
            let outcome =
                tokio::time::timeout(self.send_timeout, self.transport.deliver(&notice)).await;
            if !matches!(outcome, Ok(Ok(_))) {
                debug!(chat_id = chat_id, "Failure notice undeliverable");
            }
            // An ack delivered after the failure notice would contradict it
            break;
        }
    }
}
