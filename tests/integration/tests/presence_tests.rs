//! Presence client integration tests
//!
//! Drive a fully wired client (aggregator, in-memory store, cache, and idle
//! queue) against a recording transport under paused tokio time.
//!
//! Run with: cargo test -p integration-tests --test presence_tests

use std::collections::BTreeSet;
use std::time::Duration;

use integration_tests::{
    presence_response, rejected_response, test_config, unique_user_id, user_id, versions,
    TestClient, UserPresence,
};
use presence_client::AggregatorError;
use presence_core::{PresenceRecord, PresenceStatus, RequestParams};
use serde_json::json;

const WINDOW: Duration = Duration::from_millis(2000);
const PAST_WINDOW: Duration = Duration::from_millis(2001);

fn ids_param(value: &str) -> RequestParams {
    RequestParams::from([("ids".to_string(), value.to_string())])
}

// ============================================================================
// Batching
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_end_to_end_current_server() {
    let client = TestClient::connect(versions::CURRENT).unwrap();
    client
        .transport
        .respond(Ok(presence_response(&[UserPresence::new("u1", "online")])));

    client.aggregator.request_presence(user_id("u1")).unwrap();
    client.aggregator.request_presence(user_id("u2")).unwrap();
    tokio::time::sleep(PAST_WINDOW).await;

    assert_eq!(client.transport.fetches(), vec![ids_param("u1,u2")]);
    assert_eq!(
        client.transport.raw_subscriptions(),
        vec![json!(["", {"added": ["u1", "u2"]}])]
    );

    let active = client.store.active_users();
    assert_eq!(active.len(), 2);
    assert_eq!(active.get(&user_id("u1")).unwrap().status, PresenceStatus::Online);
    assert_eq!(active.get(&user_id("u2")).unwrap().status, PresenceStatus::Offline);
    assert_eq!(client.cache.len(), 2);

    // Nothing left pending
    let outcome = client.aggregator.refresh_all_pending().await.unwrap();
    assert_eq!(outcome.requested, 0);
    assert_eq!(client.transport.fetches().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_many_requesters_share_one_fetch() {
    let client = TestClient::connect(versions::CURRENT).unwrap();
    let ids: Vec<_> = (0..5).map(|_| unique_user_id()).collect();

    let mut tasks = Vec::new();
    for n in 0..20 {
        let aggregator = client.aggregator.clone();
        let id = ids[n % ids.len()].clone();
        tasks.push(tokio::spawn(async move {
            aggregator.request_presence(id).unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    tokio::time::sleep(PAST_WINDOW).await;

    let fetches = client.transport.fetches();
    assert_eq!(fetches.len(), 1);

    let requested: BTreeSet<&str> = fetches[0]["ids"].split(',').collect();
    let expected: BTreeSet<&str> = ids.iter().map(|id| id.as_str()).collect();
    assert_eq!(requested, expected);
}

#[tokio::test(start_paused = true)]
async fn test_steady_requests_never_postpone_the_fetch() {
    let client = TestClient::connect(versions::CURRENT).unwrap();
    let start = tokio::time::Instant::now();

    // One request every 100ms for 1.9s
    for _ in 0..19 {
        client.aggregator.request_presence(unique_user_id()).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(client.transport.fetches().is_empty());

    tokio::time::sleep(Duration::from_millis(101)).await;
    assert_eq!(client.transport.fetches().len(), 1);
    assert!(start.elapsed() >= WINDOW);
    assert_eq!(client.transport.fetches()[0]["ids"].split(',').count(), 19);
}

#[tokio::test(start_paused = true)]
async fn test_requests_during_fetch_land_in_next_batch() {
    let client = TestClient::connect(versions::CURRENT).unwrap();
    client.transport.hold();

    client.aggregator.request_presence(user_id("a")).unwrap();
    tokio::time::sleep(PAST_WINDOW).await;
    assert_eq!(client.transport.fetches(), vec![ids_param("a")]);

    // The first fetch is still in flight
    client.aggregator.request_presence(user_id("b")).unwrap();
    client.transport.release();

    tokio::time::sleep(PAST_WINDOW).await;
    assert_eq!(
        client.transport.fetches(),
        vec![ids_param("a"), ids_param("b")]
    );
}

#[tokio::test(start_paused = true)]
async fn test_debounce_window_from_config() {
    let config = test_config(&[("PRESENCE_DEBOUNCE_MS", "500")]).unwrap();
    let client = TestClient::connect_with_config(versions::CURRENT, config).unwrap();

    client.aggregator.request_presence(user_id("a")).unwrap();
    tokio::time::sleep(Duration::from_millis(501)).await;

    assert_eq!(client.transport.fetches().len(), 1);
}

// ============================================================================
// In-flight fetches
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_subscriptions_open_while_fetch_is_held() {
    let client = TestClient::connect(versions::CURRENT).unwrap();
    client.transport.hold();

    client.aggregator.request_presence(user_id("a")).unwrap();
    tokio::time::sleep(PAST_WINDOW).await;
    assert_eq!(client.transport.fetches(), vec![ids_param("a")]);

    let opened = tokio::time::timeout(
        Duration::from_secs(1),
        client
            .aggregator
            .establish_subscriptions(Some(versions::CURRENT.to_string())),
    )
    .await
    .expect("establish should not wait for the fetch")
    .unwrap();

    assert!(!opened.is_empty());
    assert!(client.transport.subscriptions_to("stream-notify-logged") > 0);
}

#[tokio::test(start_paused = true)]
async fn test_push_events_apply_while_fetch_is_held() {
    let client = TestClient::connect(versions::CURRENT).unwrap();
    client.store.login(user_id("me"));
    client.transport.hold();

    client.aggregator.request_presence(user_id("a")).unwrap();
    tokio::time::sleep(PAST_WINDOW).await;

    client
        .aggregator
        .apply_presence(PresenceRecord::new(user_id("me"), PresenceStatus::Busy))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(1)).await;

    assert_eq!(client.store.login_user().unwrap().status, PresenceStatus::Busy);
    assert_eq!(
        client.cache.get(&user_id("me")).unwrap().status,
        PresenceStatus::Busy
    );
    // The held fetch has not delivered anything yet
    assert!(client.cache.get(&user_id("a")).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_refresh_waits_for_in_flight_batch() {
    let client = TestClient::connect(versions::CURRENT).unwrap();
    client.transport.hold();

    client.aggregator.request_presence(user_id("a")).unwrap();
    tokio::time::sleep(PAST_WINDOW).await;
    client.aggregator.request_presence(user_id("b")).unwrap();

    let aggregator = client.aggregator.clone();
    let refresh = tokio::spawn(async move { aggregator.refresh_all_pending().await });
    tokio::time::sleep(Duration::from_millis(1)).await;

    // Fetches never overlap
    assert_eq!(client.transport.fetches(), vec![ids_param("a")]);
    assert!(!refresh.is_finished());

    client.transport.release();
    let outcome = refresh.await.unwrap().unwrap();
    assert_eq!(outcome.requested, 1);
    assert_eq!(
        client.transport.fetches(),
        vec![ids_param("a"), ids_param("b")]
    );

    // The timer armed by "b" finds nothing left
    tokio::time::sleep(PAST_WINDOW).await;
    assert_eq!(client.transport.fetches().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_aborts_held_fetch() {
    let client = TestClient::connect(versions::CURRENT).unwrap();
    client.transport.hold();

    client.aggregator.request_presence(user_id("a")).unwrap();
    tokio::time::sleep(PAST_WINDOW).await;

    let aggregator = client.aggregator.clone();
    let refresh = tokio::spawn(async move { aggregator.refresh_all_pending().await });
    tokio::time::sleep(Duration::from_millis(1)).await;

    tokio::time::timeout(Duration::from_secs(1), client.aggregator.shutdown())
        .await
        .expect("shutdown should not wait for the fetch");
    assert_eq!(refresh.await.unwrap().unwrap_err(), AggregatorError::Closed);

    client.transport.release();
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert!(client.cache.is_empty());
    assert!(client.store.active_users().is_empty());
}

// ============================================================================
// Protocol routing
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_protocol_routing() {
    // (version, expected fetch params, raw stream opened)
    let cases = [
        (versions::LEGACY, None, false),
        (versions::BROADCAST, Some(RequestParams::new()), false),
        (versions::ON_DEMAND, Some(ids_param("u1")), false),
        (versions::STREAMING, Some(ids_param("u1")), true),
    ];

    for (version, expected, raw) in cases {
        let client = TestClient::connect(version).unwrap();

        client.aggregator.request_presence(user_id("u1")).unwrap();
        tokio::time::sleep(PAST_WINDOW).await;

        let expected: Vec<_> = expected.into_iter().collect();
        assert_eq!(client.transport.fetches(), expected, "version {version}");
        assert_eq!(
            !client.transport.raw_subscriptions().is_empty(),
            raw,
            "version {version}"
        );

        client.aggregator.shutdown().await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_rejected_fetch_drops_batch() {
    let client = TestClient::connect(versions::ON_DEMAND).unwrap();
    client.transport.respond(Ok(rejected_response()));

    client.aggregator.request_presence(user_id("a")).unwrap();
    tokio::time::sleep(PAST_WINDOW).await;

    assert_eq!(client.transport.fetches().len(), 1);
    assert!(client.store.active_users().is_empty());
    assert!(client.cache.is_empty());

    // No automatic retry
    tokio::time::sleep(PAST_WINDOW * 3).await;
    assert_eq!(client.transport.fetches().len(), 1);
}

// ============================================================================
// Distribution
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_self_user_updates_while_interacting() {
    let client = TestClient::connect(versions::CURRENT).unwrap();
    client.store.login(user_id("me"));
    client.transport.respond(Ok(presence_response(&[
        UserPresence::new("me", "busy").with_text("on a call"),
        UserPresence::new("friend", "away"),
    ])));

    let gesture = client.idle.begin_interaction();

    client.aggregator.request_presence(user_id("me")).unwrap();
    client.aggregator.request_presence(user_id("friend")).unwrap();
    tokio::time::sleep(PAST_WINDOW).await;

    let login = client.store.login_user().unwrap();
    assert_eq!(login.status, PresenceStatus::Busy);
    assert_eq!(login.status_text.as_deref(), Some("on a call"));
    assert_eq!(client.cache.len(), 2);

    // The active-users update waits for the interaction to end
    assert!(client.store.active_users().is_empty());

    drop(gesture);
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(client.store.active_users().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_unrequested_users_stay_out_of_active_users() {
    let client = TestClient::connect(versions::BROADCAST).unwrap();
    client.transport.respond(Ok(presence_response(&[
        UserPresence::new("a", "online"),
        UserPresence::new("x", "away"),
        UserPresence::new("y", "busy"),
    ])));

    client.aggregator.request_presence(user_id("a")).unwrap();
    client.aggregator.request_presence(user_id("b")).unwrap();
    let outcome = client.aggregator.refresh_all_pending().await.unwrap();
    tokio::time::sleep(Duration::from_millis(1)).await;

    assert_eq!(outcome.delivered, 2);
    let active = client.store.active_users();
    let keys: Vec<&str> = active.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(keys, vec!["a", "b"]);
    assert_eq!(active.get(&user_id("b")).unwrap().status, PresenceStatus::Offline);

    // The cache still learns about everyone the server reported
    assert_eq!(client.cache.len(), 4);
    assert_eq!(
        client.cache.get(&user_id("x")).unwrap().status,
        PresenceStatus::Away
    );
}

#[tokio::test(start_paused = true)]
async fn test_repeated_batches_upsert_cache_rows() {
    let client = TestClient::connect(versions::CURRENT).unwrap();
    client
        .transport
        .respond(Ok(presence_response(&[UserPresence::new("a", "online")])));
    client
        .transport
        .respond(Ok(presence_response(&[UserPresence::new("a", "away")])));

    for _ in 0..2 {
        client.aggregator.request_presence(user_id("a")).unwrap();
        client.aggregator.refresh_all_pending().await.unwrap();
    }

    assert_eq!(client.cache.len(), 1);
    assert_eq!(
        client.cache.get(&user_id("a")).unwrap().status,
        PresenceStatus::Away
    );
}

// ============================================================================
// Subscriptions
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_legacy_resubscribe_survives_reconnects_without_stacking() {
    let client = TestClient::connect(versions::LEGACY).unwrap();

    for _ in 0..4 {
        client.reconnect().await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
    }
    assert_eq!(client.transport.subscriptions_to("activeUsers"), 0);

    // A single timer remains, firing every 5s
    tokio::time::sleep(Duration::from_millis(3001)).await;
    assert_eq!(client.transport.subscriptions_to("activeUsers"), 1);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(client.transport.subscriptions_to("activeUsers"), 2);

    client.aggregator.shutdown().await;
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(client.transport.subscriptions_to("activeUsers"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_server_upgrade_drops_legacy_resubscribe() {
    let client = TestClient::connect(versions::LEGACY).unwrap();
    client.reconnect().await.unwrap();

    client.store.set_server_version(versions::ON_DEMAND);
    client.reconnect().await.unwrap();

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(client.transport.subscriptions_to("activeUsers"), 0);
    assert_eq!(client.transport.subscriptions_to("stream-notify-logged"), 5);
}
