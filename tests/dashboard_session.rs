//! Integration tests for the dashboard session lifecycle.

#![allow(clippy::panic)]

mod common;

use std::time::{Duration, Instant};

use serde_json::json;
use tokio::sync::watch;

use common::{BrokerEvent, MockBroker, TIMEOUT, dead_url};
use sensor_dashboard::bridge::ConnectionState;
use sensor_dashboard::config::BridgeConfig;
use sensor_dashboard::dashboard::{DashboardSession, DashboardState, SensorTopic};

async fn wait_for<F>(rx: &mut watch::Receiver<DashboardState>, pred: F) -> DashboardState
where
    F: FnMut(&DashboardState) -> bool,
{
    match tokio::time::timeout(TIMEOUT, rx.wait_for(pred)).await {
        Ok(Ok(state)) => (*state).clone(),
        Ok(Err(_)) => panic!("dashboard state channel closed"),
        Err(_) => panic!("timed out waiting for dashboard state"),
    }
}

async fn mount_connected(
    broker: &mut MockBroker,
    delay: Duration,
) -> (DashboardSession, watch::Receiver<DashboardState>) {
    let config = BridgeConfig::new(broker.url.clone()).with_reconnect_delay(delay);
    let session = DashboardSession::mount(config);
    broker.expect_connected().await;
    assert_eq!(broker.expect_subscriptions(2).await, vec!["/gas", "/temp"]);
    let mut rx = session.watch();
    let _ = wait_for(&mut rx, |s| s.connected).await;
    (session, rx)
}

#[tokio::test]
async fn readings_update_the_live_panel_only() {
    let mut broker = MockBroker::start().await;
    let (session, mut rx) = mount_connected(&mut broker, Duration::from_secs(60)).await;
    let before = session.view();
    assert_eq!(before.system_status.label, "Connected");

    broker.send_raw(r#"{"op":"publish","topic":"/gas","msg":{"data":3.14159}}"#);
    broker.publish("/temp", json!({ "data": 22.0 }));
    let _ = wait_for(&mut rx, |s| {
        s.readings.get(SensorTopic::Gas).is_some()
            && s.readings.get(SensorTopic::Temperature).is_some()
    })
    .await;

    let view = session.view();
    assert_eq!(view.system_status.gas_level, "3.14");
    assert_eq!(view.system_status.temperature, "22.00°C");
    assert_eq!(
        view.stat_card("Machine Health").map(|c| c.value.as_str()),
        Some("78% avg. health")
    );
    assert_eq!(before.charts, view.charts);

    assert!(session.unmount().await);
}

#[tokio::test]
async fn later_reading_replaces_earlier_one() {
    let mut broker = MockBroker::start().await;
    let (session, mut rx) = mount_connected(&mut broker, Duration::from_secs(60)).await;

    broker.publish("/temp", json!({ "data": 10.0 }));
    broker.publish("/temp", json!({ "data": 130.0 }));
    let state = wait_for(&mut rx, |s| s.readings.temperature() == 130.0).await;
    assert_eq!(state.readings.temperature(), 130.0);

    // Health is not clamped.
    assert_eq!(
        session
            .view()
            .stat_card("Machine Health")
            .map(|c| c.value.clone()),
        Some("-30% avg. health".to_string())
    );
    assert!(session.unmount().await);
}

#[tokio::test]
async fn close_triggers_exactly_one_reconnect_after_delay() {
    let delay = Duration::from_millis(500);
    let mut broker = MockBroker::start().await;
    let (session, mut rx) = mount_connected(&mut broker, delay).await;

    let kicked_at = Instant::now();
    broker.kick();
    let state = wait_for(&mut rx, |s| !s.connected).await;
    assert!(kicked_at.elapsed() < delay);
    assert_eq!(state.reconnect_attempts, 0);
    assert_eq!(session.view().system_status.label, "Disconnected");
    broker.expect_disconnected().await;

    broker.expect_connected().await;
    assert!(kicked_at.elapsed() >= delay);

    // The session subscribes again on the new link.
    assert_eq!(broker.expect_subscriptions(2).await, vec!["/gas", "/temp"]);
    let state = wait_for(&mut rx, |s| s.connected).await;
    assert_eq!(state.reconnect_attempts, 1);
    assert_eq!(session.connection_state(), ConnectionState::Connected);

    broker.publish("/gas", json!({ "data": 0.5 }));
    let _ = wait_for(&mut rx, |s| s.readings.gas() == 0.5).await;

    assert_eq!(broker.event_within(delay * 3).await, None);
    assert!(session.unmount().await);
}

#[tokio::test]
async fn failed_reconnect_is_not_retried() {
    let delay = Duration::from_millis(100);
    let config = BridgeConfig::new(dead_url()).with_reconnect_delay(delay);
    let session = DashboardSession::mount(config);
    let mut rx = session.watch();

    let _ = wait_for(&mut rx, |s| s.reconnect_attempts == 1).await;
    tokio::time::sleep(delay * 6).await;

    let state = session.state();
    assert_eq!(state.reconnect_attempts, 1);
    assert!(!state.connected);
    assert_eq!(session.connection_state(), ConnectionState::Disconnected);
    assert_eq!(session.view().system_status.label, "Disconnected");

    assert!(!session.unmount().await);
}

#[tokio::test]
async fn unmount_unsubscribes_closes_once_and_silences_updates() {
    let mut broker = MockBroker::start().await;
    let (session, mut rx) = mount_connected(&mut broker, Duration::from_millis(100)).await;

    assert!(session.unmount().await);

    let mut unsubscribed = Vec::new();
    loop {
        match broker.next_event().await {
            BrokerEvent::Op(op) if op["op"] == "unsubscribe" => {
                unsubscribed.push(op["topic"].as_str().unwrap_or_default().to_string());
            }
            BrokerEvent::Disconnected => break,
            other => panic!("unexpected broker event {other:?}"),
        }
    }
    unsubscribed.sort();
    assert_eq!(unsubscribed, vec!["/gas", "/temp"]);

    let state = rx.borrow_and_update().clone();
    assert!(!state.connected);
    broker.publish("/gas", json!({ "data": 9.0 }));
    assert!(rx.changed().await.is_err());

    // No reconnect after teardown, even though the delay elapses.
    assert_eq!(broker.event_within(Duration::from_millis(400)).await, None);
}

#[tokio::test]
async fn unmount_cancels_pending_reconnect() {
    let delay = Duration::from_millis(300);
    let mut broker = MockBroker::start().await;
    let (session, mut rx) = mount_connected(&mut broker, delay).await;

    broker.kick();
    let _ = wait_for(&mut rx, |s| !s.connected).await;
    broker.expect_disconnected().await;

    // The link is already gone, so there is nothing left to close.
    assert!(!session.unmount().await);
    assert_eq!(broker.event_within(delay * 2).await, None);
}

#[tokio::test]
async fn shutdown_during_render_stops_before_next_view() {
    let mut broker = MockBroker::start().await;
    let (session, _rx) = mount_connected(&mut broker, Duration::from_secs(60)).await;

    // The session has already moved past the state it was mounted with,
    // so a change is pending when the first view is handed out.
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let mut stop_tx = Some(stop_tx);
    let mut labels = Vec::new();
    let shutdown = async {
        let _ = stop_rx.await;
    };
    let rendered = tokio::time::timeout(
        TIMEOUT,
        session.render_until(shutdown, |view| {
            labels.push(view.system_status.label);
            if let Some(tx) = stop_tx.take() {
                let _ = tx.send(());
            }
        }),
    )
    .await;
    assert!(rendered.is_ok(), "render loop ignored shutdown");
    assert_eq!(labels, vec!["Connected"]);

    assert!(session.unmount().await);
}
