//! Action queue ordering, isolation and retry behavior
//! Run with: cargo test --test action_queue_test

mod common;

use std::time::{Duration, Instant};

use common::{actions, channel, ensure_init, ScriptedTransport};
use selfbot::{AgentEvent, BotError};

#[tokio::test]
async fn rate_limited_head_is_retried_before_the_rest() {
    ensure_init();
    let transport = ScriptedTransport::new();
    transport.rate_limit("a1", &[Duration::from_millis(50)]);
    let (actions, _) = actions(&transport);

    let start = Instant::now();
    let (a1, a2, a3) = tokio::join!(
        actions.send_message(channel("A"), "a1"),
        actions.send_message(channel("A"), "a2"),
        actions.send_message(channel("A"), "a3"),
    );
    assert!(a1.is_ok() && a2.is_ok() && a3.is_ok());

    let sent = transport.sent();
    assert_eq!(transport.sent_texts(), ["a1", "a2", "a3"]);
    assert!(sent[0].at.duration_since(start) >= Duration::from_millis(50));
    assert_eq!(transport.attempts(), ["a1", "a1", "a2", "a3"]);
}

#[tokio::test]
async fn slow_key_does_not_hold_up_another_key() {
    let transport = ScriptedTransport::new();
    transport.delay("slow", Duration::from_millis(100));
    let (actions, _) = actions(&transport);

    let (slow, fast) = tokio::join!(
        actions.send_message(channel("A"), "slow"),
        actions.send_message(channel("B"), "fast"),
    );
    assert!(slow.is_ok() && fast.is_ok());
    assert_eq!(transport.sent_texts(), ["fast", "slow"]);
}

#[tokio::test]
async fn retrying_key_does_not_hold_up_another_key() {
    let transport = ScriptedTransport::new();
    transport.rate_limit("a", &[Duration::from_millis(80), Duration::from_millis(80)]);
    let (actions, _) = actions(&transport);

    let (a, b) = tokio::join!(
        actions.send_message(channel("A"), "a"),
        actions.send_message(channel("B"), "b"),
    );
    assert!(a.is_ok() && b.is_ok());
    assert_eq!(transport.sent_texts(), ["b", "a"]);
}

#[tokio::test]
async fn same_key_runs_one_at_a_time_in_submission_order() {
    let transport = ScriptedTransport::new();
    let texts: Vec<String> = (0..8).map(|i| format!("m{}", i)).collect();
    for (i, text) in texts.iter().enumerate() {
        // Later messages finish faster; only serialization keeps them in order.
        transport.delay(text, Duration::from_millis(5 * (8 - i as u64)));
    }
    let (actions, _) = actions(&transport);

    // The current-thread test runtime starts spawned tasks in spawn order.
    let handles: Vec<_> = texts
        .iter()
        .map(|text| {
            let actions = actions.clone();
            let text = text.clone();
            tokio::spawn(async move { actions.send_message(channel("A"), text).await })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    assert_eq!(transport.sent_texts(), texts);
    assert_eq!(transport.max_in_flight("A"), 1);
}

#[tokio::test]
async fn failure_rejects_only_the_head_and_reports_it() {
    let transport = ScriptedTransport::new();
    transport.fail("bad");
    let (actions, events) = actions(&transport);
    let mut errors = events.subscribe();

    let (first, bad, last) = tokio::join!(
        actions.send_message(channel("A"), "first"),
        actions.send_message(channel("A"), "bad"),
        actions.send_message(channel("A"), "last"),
    );
    assert!(first.is_ok());
    assert!(matches!(bad, Err(BotError::Transport(_))));
    assert!(last.is_ok());
    assert_eq!(transport.sent_texts(), ["first", "last"]);

    match errors.recv().await.unwrap() {
        AgentEvent::Error(BotError::Transport(msg)) => assert!(msg.contains("bad")),
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn rate_limit_is_retried_once_per_failure_until_success() {
    let transport = ScriptedTransport::new();
    transport.rate_limit("x", &[Duration::from_millis(10); 4]);
    let (actions, events) = actions(&transport);
    let mut errors = events.subscribe();

    actions.send_message(channel("A"), "x").await.unwrap();
    assert_eq!(transport.attempts().len(), 5);
    assert_eq!(transport.sent_texts(), ["x"]);
    // Rate limits never reach the error channel.
    assert!(errors.try_recv().is_err());
}

#[tokio::test]
async fn lane_is_idle_after_draining() {
    let transport = ScriptedTransport::new();
    let (actions, _) = actions(&transport);
    actions.send_message(channel("A"), "one").await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(actions.queue().pending("A"), 0);
    // A later action on the same key still runs.
    actions.send_message(channel("A"), "two").await.unwrap();
    assert_eq!(transport.sent_texts(), ["one", "two"]);
}
