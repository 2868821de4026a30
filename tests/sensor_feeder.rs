//! Integration tests for the sensor feeder.

#![allow(clippy::panic)]

mod common;

use serde_json::json;

use common::{BrokerEvent, MockBroker};
use sensor_dashboard::config::BridgeConfig;
use sensor_dashboard::feeder::{FeedStats, SensorFeeder};

#[tokio::test]
async fn feeder_advertises_and_publishes_recognized_lines() {
    let mut broker = MockBroker::start().await;
    let Ok(feeder) = SensorFeeder::start(&BridgeConfig::new(broker.url.clone())).await else {
        panic!("feeder failed to start");
    };
    broker.expect_connected().await;

    let mut advertised = Vec::new();
    for _ in 0..3 {
        let op = broker.expect_op().await;
        assert_eq!(op["op"], "advertise");
        advertised.push((
            op["topic"].as_str().unwrap_or_default().to_string(),
            op["type"].as_str().unwrap_or_default().to_string(),
        ));
    }
    advertised.sort();
    assert_eq!(
        advertised,
        vec![
            ("/ammonia".to_string(), "std_msgs/Float32".to_string()),
            ("/ammonia_alert".to_string(), "std_msgs/String".to_string()),
            ("/temp".to_string(), "std_msgs/Float32".to_string()),
        ]
    );

    let input: &[u8] = b"Sensor board ready\n\
        Current Temperature: 23.50 C\n\
        Ammonia Level (Analog): 412\n\
        Current Temperature: ??? C\n\
        Critical Ammonia Level\n\
        Simulated Temperature: 30 C\n";
    let Ok(stats) = feeder.run(input).await else {
        panic!("feeding failed");
    };
    assert_eq!(
        stats,
        FeedStats {
            lines: 6,
            published: 4,
            rejected: 1,
        }
    );

    let expected = [
        json!({ "op": "publish", "topic": "/temp", "msg": { "data": 23.5 } }),
        json!({ "op": "publish", "topic": "/ammonia", "msg": { "data": 412.0 } }),
        json!({ "op": "publish", "topic": "/ammonia_alert", "msg": { "data": "Critical Ammonia Level Detected" } }),
        json!({ "op": "publish", "topic": "/temp", "msg": { "data": 30.0 } }),
    ];
    for want in expected {
        assert_eq!(broker.expect_op().await, want);
    }

    assert!(feeder.shutdown().await);
    assert_eq!(broker.next_event().await, BrokerEvent::Disconnected);
}
