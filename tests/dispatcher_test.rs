//! Dispatcher ordering, reply linking and delivery-failure behaviour.

#![allow(non_snake_case)]

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::{bind_client, group_texts, private_text, test_context, RecordingTransport};
use ClientBridge::models::event::{ChatContext, InboundMessage, MessagePayload, OutboundAction};
use ClientBridge::services::RelayDispatcher;
use ClientBridge::storage::ReplyLinks;
use ClientBridge::transport::Transport;

#[tokio::test]
async fn test_per_client_messages_keep_submission_order() {
    let ctx = test_context().await;
    bind_client(&ctx, 1, "alice92", -100).await;

    for i in 0..10 {
        ctx.services
            .dispatcher
            .submit(private_text(1, "alice92", &format!("msg {}", i)))
            .await
            .unwrap();
    }

    let sent = ctx
        .transport
        .wait_for(|sent| group_texts(sent, -100).len() >= 10)
        .await;

    let expected: Vec<String> = (0..10)
        .map(|i| format!("ali[redacted]: msg {}", i))
        .collect();
    assert_eq!(group_texts(&sent, -100), expected);
}

#[tokio::test]
async fn test_independent_contexts_both_progress() {
    let ctx = test_context().await;
    bind_client(&ctx, 1, "alice92", -100).await;
    bind_client(&ctx, 2, "bob", -200).await;

    ctx.services
        .dispatcher
        .submit(private_text(1, "alice92", "from alice"))
        .await
        .unwrap();
    ctx.services
        .dispatcher
        .submit(private_text(2, "bob", "from bob"))
        .await
        .unwrap();

    let sent = ctx
        .transport
        .wait_for(|sent| {
            !group_texts(sent, -100).is_empty() && !group_texts(sent, -200).is_empty()
        })
        .await;
    assert_eq!(group_texts(&sent, -100), vec!["ali[redacted]: from alice"]);
    assert_eq!(group_texts(&sent, -200), vec!["bob[redacted]: from bob"]);
}

#[tokio::test]
async fn test_forward_records_reply_link() {
    let ctx = test_context().await;
    bind_client(&ctx, 1, "alice92", -100).await;
    bind_client(&ctx, 2, "bob", -100).await;

    ctx.services
        .dispatcher
        .submit(private_text(1, "alice92", "hello from alice"))
        .await
        .unwrap();
    ctx.transport
        .wait_for(|sent| !group_texts(sent, -100).is_empty())
        .await;

    // The delivered forward's message id maps back to the client
    let delivered = ctx.transport.sent_with_ids().await;
    let (message_id, _) = delivered
        .iter()
        .find(|(_, a)| matches!(a, OutboundAction::ForwardFromClient { client_id: 1, .. }))
        .expect("forward was delivered");
    assert_eq!(
        ctx.services.reply_links.lookup(-100, *message_id).await,
        Some(1)
    );

    // A reply carrying that reference reaches alice, not bob
    let reply = InboundMessage {
        sender_id: 555,
        display_name: "Employee".to_string(),
        context: ChatContext::Group,
        context_id: -100,
        payload: MessagePayload::text("hi alice"),
        reply_to_client: ctx.services.reply_links.lookup(-100, *message_id).await,
    };
    ctx.services.dispatcher.submit(reply).await.unwrap();
    ctx.transport
        .wait_for(|sent| {
            sent.iter().any(|a| {
                matches!(
                    a,
                    OutboundAction::SendText { chat_id: 1, text } if text == "hi alice"
                )
            })
        })
        .await;

    // Without a reference the same group stays ambiguous
    ctx.services
        .dispatcher
        .submit(InboundMessage {
            sender_id: 555,
            display_name: "Employee".to_string(),
            context: ChatContext::Group,
            context_id: -100,
            payload: MessagePayload::text("who is this for?"),
            reply_to_client: None,
        })
        .await
        .unwrap();
    ctx.transport
        .wait_for(|sent| {
            sent.iter().any(|a| {
                matches!(
                    a,
                    OutboundAction::SendText { chat_id: -100, text }
                        if text.contains("Reply directly")
                )
            })
        })
        .await;
}

#[tokio::test]
async fn test_failed_forward_notifies_sender_and_keeps_state() {
    let ctx = test_context().await;
    bind_client(&ctx, 1, "alice92", -100).await;

    // The group is unreachable; the client must hear about it
    ctx.transport.fail_chat(-100).await;
    ctx.services
        .dispatcher
        .submit(private_text(1, "alice92", "hi team"))
        .await
        .unwrap();

    let sent = ctx
        .transport
        .wait_for(|sent| {
            sent.iter().any(|a| {
                matches!(
                    a,
                    OutboundAction::SendText { chat_id: 1, text }
                        if text.contains("could not be delivered")
                )
            })
        })
        .await;
    assert!(sent.iter().all(|a| a.chat_id() != -100));
    // No success ack contradicts the failure notice
    assert!(sent.iter().all(|a| {
        !matches!(a, OutboundAction::SendText { text, .. } if text.contains("Message sent"))
    }));

    // Binding survives the failure; the next message goes through
    let reply = InboundMessage {
        sender_id: 555,
        display_name: "Employee".to_string(),
        context: ChatContext::Group,
        context_id: -100,
        payload: MessagePayload::text("we are here"),
        reply_to_client: None,
    };
    ctx.services.dispatcher.submit(reply).await.unwrap();
    ctx.transport
        .wait_for(|sent| {
            sent.iter().any(|a| {
                matches!(
                    a,
                    OutboundAction::SendText { chat_id: 1, text } if text == "we are here"
                )
            })
        })
        .await;
}

#[tokio::test]
async fn test_idle_worker_evicted_and_respawned() {
    let ctx = test_context().await;
    bind_client(&ctx, 1, "alice92", -100).await;

    let transport = RecordingTransport::new();
    let transport_port: Arc<dyn Transport> = transport.clone();
    let dispatcher = RelayDispatcher::new(
        ctx.services.relay_service.clone(),
        transport_port,
        ReplyLinks::new(),
        Duration::from_secs(1),
        8,
        Duration::from_millis(50),
    );

    dispatcher
        .submit(private_text(1, "alice92", "first"))
        .await
        .unwrap();
    transport
        .wait_for(|sent| !group_texts(sent, -100).is_empty())
        .await;
    assert_eq!(dispatcher.worker_count().await, 1);

    // Idle long enough and the worker goes away
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while dispatcher.worker_count().await != 0 {
        assert!(
            tokio::time::Instant::now() < deadline,
            "idle worker was not evicted"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // The next submission respawns one transparently
    dispatcher
        .submit(private_text(1, "alice92", "second"))
        .await
        .unwrap();
    transport
        .wait_for(|sent| group_texts(sent, -100).len() >= 2)
        .await;
    assert_eq!(dispatcher.worker_count().await, 1);
}
