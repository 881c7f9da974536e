use super::*;
use futures::StreamExt;
use std::time::Duration;
use tokio::time::advance;

fn hub() -> StreamHub<u32> {
    StreamHub::new(Duration::from_secs(30), 16)
}

#[tokio::test]
async fn test_second_subscriber_shares_session() {
    let hub = hub();
    let owner = hub.subscribe("k");
    let follower = hub.subscribe("k");

    assert!(owner.is_owner);
    assert!(owner.finisher.is_some());
    assert!(!follower.is_owner);
    assert!(follower.finisher.is_none());
    assert_eq!(hub.subscriber_count("k"), 2);
    assert_eq!(hub.session_count(), 1);
    assert!(hub.is_active("k"));
}

#[tokio::test]
async fn test_subscribers_receive_items_in_order() {
    let hub = hub();
    let mut owner = hub.subscribe("k");
    let follower = hub.subscribe("k");
    let finisher = owner.take_finisher().unwrap();

    for n in 1..=3 {
        assert_eq!(finisher.publish(n), 2);
    }
    finisher.complete();
    finisher.finish();

    assert_eq!(owner.into_items().collect::<Vec<_>>().await, vec![1, 2, 3]);
    assert_eq!(follower.into_items().collect::<Vec<_>>().await, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_late_follower_gets_backlog_first() {
    let hub = hub();
    let mut owner = hub.subscribe("k");
    let finisher = owner.take_finisher().unwrap();

    finisher.publish(1);
    let follower = hub.subscribe("k");
    finisher.publish(2);
    finisher.finish();

    assert_eq!(follower.into_items().collect::<Vec<_>>().await, vec![1, 2]);
}

#[tokio::test]
async fn test_done_session_is_not_shared() {
    let hub = hub();
    let mut first = hub.subscribe("k");
    first.take_finisher().unwrap().finish();

    assert!(!hub.is_active("k"));
    let second = hub.subscribe("k");
    assert!(second.is_owner);
    assert_eq!(hub.session_count(), 1);
    assert_eq!(hub.subscriber_count("k"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_expired_session_is_replaced() {
    let hub = hub();
    let _first = hub.subscribe("k");

    advance(Duration::from_secs(10)).await;
    assert!(!hub.subscribe("k").is_owner);

    advance(Duration::from_secs(21)).await;
    let replacement = hub.subscribe("k");
    assert!(replacement.is_owner);
    assert_eq!(hub.subscriber_count("k"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_expired_sessions_are_pruned() {
    let hub = hub();
    let _a = hub.subscribe("a");
    let _b = hub.subscribe("b");
    assert_eq!(hub.session_count(), 2);

    advance(Duration::from_secs(31)).await;
    let _c = hub.subscribe("c");
    assert_eq!(hub.session_count(), 1);
}

#[tokio::test]
async fn test_full_queue_drops_instead_of_blocking() {
    let hub: StreamHub<u32> = StreamHub::new(Duration::from_secs(30), 2);
    let mut owner = hub.subscribe("k");
    let follower = hub.subscribe("k");
    let finisher = owner.take_finisher().unwrap();

    assert_eq!(finisher.publish(1), 2);
    assert_eq!(finisher.publish(2), 2);
    assert_eq!(finisher.publish(3), 0);
    finisher.finish();

    assert_eq!(follower.into_items().collect::<Vec<_>>().await, vec![1, 2]);
}

#[tokio::test]
async fn test_dropped_finisher_releases_followers() {
    let hub = hub();
    let owner = hub.subscribe("k");
    let follower = hub.subscribe("k");

    drop(owner);

    assert!(follower.into_items().collect::<Vec<_>>().await.is_empty());
    assert!(hub.subscribe("k").is_owner);
}

#[tokio::test]
async fn test_publish_and_complete_by_key() {
    let hub = hub();
    let mut owner = hub.subscribe("k");

    assert_eq!(hub.publish("k", 7), 1);
    assert_eq!(hub.publish("missing", 7), 0);
    hub.complete("k");

    assert_eq!(owner.receiver.recv().await, Some(HubEvent::Item(7)));
    assert_eq!(owner.receiver.recv().await, Some(HubEvent::Complete));
}

#[tokio::test]
async fn test_closed_subscribers_are_removed() {
    let hub = hub();
    let mut owner = hub.subscribe("k");
    let follower = hub.subscribe("k");
    let finisher = owner.take_finisher().unwrap();

    drop(follower);
    assert_eq!(finisher.publish(1), 1);
    assert_eq!(hub.subscriber_count("k"), 1);
}

#[tokio::test]
async fn test_reset_forgets_sessions() {
    let hub = hub();
    let _owner = hub.subscribe("k");
    hub.reset();
    assert_eq!(hub.session_count(), 0);
    assert!(hub.subscribe("k").is_owner);
}
