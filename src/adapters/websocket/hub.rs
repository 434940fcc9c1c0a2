//! Broadcast hub: the live subscriber set and fan-out of queue events.
//!
//! # Architecture
//!
//! ```text
//!   QueueService ──publish(event)──► BroadcastHub
//!                                     │ serialize once, snapshot registry
//!                                     ├──► conn-a  (send lock, timeout)
//!                                     ├──► conn-b  (send lock, timeout)  ✗ → unregistered
//!                                     └──► conn-c  (send lock, timeout)
//! ```
//!
//! Delivery is best-effort and at-most-once. A connection that fails or
//! stalls is dropped from the registry before `publish` returns; nothing is
//! queued for it and nothing is replayed when it reconnects.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::{Mutex, RwLock};

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::queue::QueueEvent;
use crate::ports::{
    ConnectionId, DeliveryError, PublishReport, QueueEventPublisher, SubscriberConnection,
    SubscriberRegistry,
};

/// Hub tuning.
#[derive(Debug, Clone, Copy)]
pub struct HubConfig {
    /// Upper bound on one delivery to one connection, including the wait for
    /// that connection's send lock.
    pub send_timeout: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            send_timeout: Duration::from_millis(1000),
        }
    }
}

/// A registered connection and its write serialization.
struct Subscriber {
    connection: Arc<dyn SubscriberConnection>,
    send_lock: Mutex<()>,
    removed: AtomicBool,
}

impl Subscriber {
    fn new(connection: Arc<dyn SubscriberConnection>) -> Self {
        Self {
            connection,
            send_lock: Mutex::new(()),
            removed: AtomicBool::new(false),
        }
    }
}

enum Delivery {
    Sent,
    Skipped,
    Failed(ConnectionId, DeliveryError),
}

/// Single-process registry of live subscribers.
///
/// Created once at startup and shared via `Arc`; `shutdown` closes every
/// connection still registered.
pub struct BroadcastHub {
    subscribers: RwLock<HashMap<ConnectionId, Arc<Subscriber>>>,
    config: HubConfig,
}

impl BroadcastHub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Adds a connection. Returns `false` if its id was already registered,
    /// in which case the existing connection is kept.
    pub async fn register(&self, connection: Arc<dyn SubscriberConnection>) -> bool {
        let id = connection.id();
        let mut subscribers = self.subscribers.write().await;
        if subscribers.contains_key(&id) {
            return false;
        }
        subscribers.insert(id, Arc::new(Subscriber::new(connection)));
        tracing::debug!(connection_id = %id, total = subscribers.len(), "Subscriber registered");
        true
    }

    /// Removes a connection. Returns `false` if it was not registered.
    pub async fn unregister(&self, id: ConnectionId) -> bool {
        let removed = self.subscribers.write().await.remove(&id);
        match removed {
            Some(subscriber) => {
                subscriber.removed.store(true, Ordering::SeqCst);
                tracing::debug!(connection_id = %id, "Subscriber unregistered");
                true
            }
            None => false,
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    pub async fn is_registered(&self, id: ConnectionId) -> bool {
        self.subscribers.read().await.contains_key(&id)
    }

    /// Serializes `event` and delivers it to every current subscriber.
    pub async fn publish(&self, event: &QueueEvent) -> Result<PublishReport, DomainError> {
        let text = event.to_json().map_err(|e| {
            tracing::warn!(token_id = %event.token_id, error = %e, "Failed to encode queue event");
            DomainError::new(
                ErrorCode::InternalError,
                format!("Failed to encode queue event: {}", e),
            )
        })?;

        let report = self.broadcast_text(&text).await;
        tracing::debug!(
            token_id = %event.token_id,
            delivered = report.delivered,
            failed = report.failed,
            "Queue event published"
        );
        Ok(report)
    }

    /// Delivers one text frame to every subscriber registered at call time.
    pub async fn broadcast_text(&self, text: &str) -> PublishReport {
        let snapshot: Vec<Arc<Subscriber>> =
            self.subscribers.read().await.values().cloned().collect();

        if snapshot.is_empty() {
            return PublishReport::default();
        }

        let outcomes = join_all(
            snapshot
                .iter()
                .map(|subscriber| self.deliver(subscriber, text)),
        )
        .await;

        let mut report = PublishReport::default();
        let mut failed = Vec::new();
        for outcome in outcomes {
            match outcome {
                Delivery::Sent => report.delivered += 1,
                Delivery::Skipped => {}
                Delivery::Failed(id, error) => {
                    tracing::debug!(connection_id = %id, error = %error, "Delivery failed");
                    failed.push(id);
                }
            }
        }
        report.failed = failed.len();

        if !failed.is_empty() {
            self.drop_failed(&failed).await;
        }

        report
    }

    async fn deliver(&self, subscriber: &Subscriber, text: &str) -> Delivery {
        let id = subscriber.connection.id();
        let attempt = async {
            let _guard = subscriber.send_lock.lock().await;
            if subscriber.removed.load(Ordering::SeqCst) {
                return None;
            }
            Some(subscriber.connection.send_text(text).await)
        };

        match tokio::time::timeout(self.config.send_timeout, attempt).await {
            Ok(None) => Delivery::Skipped,
            Ok(Some(Ok(()))) => Delivery::Sent,
            Ok(Some(Err(error))) => Delivery::Failed(id, error),
            Err(_) => Delivery::Failed(id, DeliveryError::TimedOut),
        }
    }

    async fn drop_failed(&self, ids: &[ConnectionId]) {
        let mut removed = Vec::with_capacity(ids.len());
        {
            let mut subscribers = self.subscribers.write().await;
            for id in ids {
                if let Some(subscriber) = subscribers.remove(id) {
                    subscriber.removed.store(true, Ordering::SeqCst);
                    removed.push(subscriber);
                }
            }
        }

        tracing::info!(count = removed.len(), "Dropped failed subscribers");

        // Closing may block on a dead transport; keep it off the publish path.
        let close_timeout = self.config.send_timeout;
        for subscriber in removed {
            tokio::spawn(async move {
                let _ = tokio::time::timeout(close_timeout, subscriber.connection.close()).await;
            });
        }
    }

    /// Closes and removes every registered connection.
    pub async fn shutdown(&self) {
        let drained: Vec<Arc<Subscriber>> = {
            let mut subscribers = self.subscribers.write().await;
            subscribers.drain().map(|(_, s)| s).collect()
        };

        tracing::info!(count = drained.len(), "Broadcast hub shutting down");

        let close_timeout = self.config.send_timeout;
        join_all(drained.iter().map(|subscriber| async move {
            subscriber.removed.store(true, Ordering::SeqCst);
            let _ = tokio::time::timeout(close_timeout, subscriber.connection.close()).await;
        }))
        .await;
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}

#[async_trait]
impl QueueEventPublisher for BroadcastHub {
    async fn publish(&self, event: &QueueEvent) -> Result<PublishReport, DomainError> {
        BroadcastHub::publish(self, event).await
    }
}

#[async_trait]
impl SubscriberRegistry for BroadcastHub {
    async fn register(&self, connection: Arc<dyn SubscriberConnection>) {
        BroadcastHub::register(self, connection).await;
    }

    async fn unregister(&self, id: ConnectionId) {
        BroadcastHub::unregister(self, id).await;
    }

    async fn subscriber_count(&self) -> usize {
        BroadcastHub::subscriber_count(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{DoctorId, PatientId, Timestamp};
    use crate::domain::queue::{Token, TokenNumber};
    use std::sync::atomic::AtomicUsize;

    #[derive(Clone, Copy)]
    enum Behavior {
        Healthy,
        Broken,
        Stalled,
    }

    struct TestConnection {
        id: ConnectionId,
        behavior: Behavior,
        frames: std::sync::Mutex<Vec<String>>,
        closes: AtomicUsize,
    }

    impl TestConnection {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                id: ConnectionId::new(),
                behavior,
                frames: std::sync::Mutex::new(Vec::new()),
                closes: AtomicUsize::new(0),
            })
        }

        fn frames(&self) -> Vec<String> {
            self.frames.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SubscriberConnection for TestConnection {
        fn id(&self) -> ConnectionId {
            self.id
        }

        async fn send_text(&self, text: &str) -> Result<(), DeliveryError> {
            match self.behavior {
                Behavior::Healthy => {
                    self.frames.lock().unwrap().push(text.to_string());
                    Ok(())
                }
                Behavior::Broken => Err(DeliveryError::Closed),
                Behavior::Stalled => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(())
                }
            }
        }

        async fn close(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn hub() -> BroadcastHub {
        BroadcastHub::new(HubConfig {
            send_timeout: Duration::from_millis(50),
        })
    }

    fn event() -> QueueEvent {
        let token = Token::issue(
            TokenNumber::FIRST,
            DoctorId::new(),
            PatientId::new(),
            Timestamp::now(),
        );
        QueueEvent::token_created(&token, Some("Asha".to_string()))
    }

    #[tokio::test]
    async fn publish_reaches_every_subscriber_once() {
        let hub = hub();
        let conns: Vec<_> = (0..3).map(|_| TestConnection::new(Behavior::Healthy)).collect();
        for conn in &conns {
            assert!(hub.register(conn.clone()).await);
        }

        let report = hub.publish(&event()).await.unwrap();

        assert_eq!(report, PublishReport { delivered: 3, failed: 0 });
        for conn in &conns {
            assert_eq!(conn.frames().len(), 1);
            assert!(conn.frames()[0].contains("\"TOKEN_CREATED\""));
        }
    }

    #[tokio::test]
    async fn broken_subscriber_is_removed_and_others_still_receive() {
        let hub = hub();
        let good_a = TestConnection::new(Behavior::Healthy);
        let broken = TestConnection::new(Behavior::Broken);
        let good_b = TestConnection::new(Behavior::Healthy);
        hub.register(good_a.clone()).await;
        hub.register(broken.clone()).await;
        hub.register(good_b.clone()).await;

        let report = hub.publish(&event()).await.unwrap();

        assert_eq!(report, PublishReport { delivered: 2, failed: 1 });
        assert_eq!(good_a.frames().len(), 1);
        assert_eq!(good_b.frames().len(), 1);
        assert!(!hub.is_registered(broken.id).await);
        assert_eq!(hub.subscriber_count().await, 2);

        // the next publish skips it entirely
        let report = hub.publish(&event()).await.unwrap();
        assert_eq!(report, PublishReport { delivered: 2, failed: 0 });
    }

    #[tokio::test]
    async fn stalled_subscriber_times_out_without_blocking_others() {
        let hub = hub();
        let healthy = TestConnection::new(Behavior::Healthy);
        let stalled = TestConnection::new(Behavior::Stalled);
        hub.register(healthy.clone()).await;
        hub.register(stalled.clone()).await;

        let started = std::time::Instant::now();
        let report = hub.publish(&event()).await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(report, PublishReport { delivered: 1, failed: 1 });
        assert_eq!(healthy.frames().len(), 1);
        assert!(!hub.is_registered(stalled.id).await);
    }

    #[tokio::test]
    async fn late_subscriber_gets_no_replay() {
        let hub = hub();
        let early = TestConnection::new(Behavior::Healthy);
        hub.register(early.clone()).await;

        hub.publish(&event()).await.unwrap();

        let late = TestConnection::new(Behavior::Healthy);
        hub.register(late.clone()).await;
        assert!(late.frames().is_empty());

        hub.publish(&event()).await.unwrap();
        assert_eq!(early.frames().len(), 2);
        assert_eq!(late.frames().len(), 1);
    }

    #[tokio::test]
    async fn per_connection_order_follows_publish_order() {
        let hub = hub();
        let conn = TestConnection::new(Behavior::Healthy);
        hub.register(conn.clone()).await;

        let first = event();
        let second = event();
        hub.publish(&first).await.unwrap();
        hub.publish(&second).await.unwrap();

        let frames = conn.frames();
        assert!(frames[0].contains(&first.token_id.to_string()));
        assert!(frames[1].contains(&second.token_id.to_string()));
    }

    #[tokio::test]
    async fn register_is_idempotent_and_unregister_is_safe_to_repeat() {
        let hub = hub();
        let conn = TestConnection::new(Behavior::Healthy);

        assert!(hub.register(conn.clone()).await);
        assert!(!hub.register(conn.clone()).await);
        assert_eq!(hub.subscriber_count().await, 1);

        hub.publish(&event()).await.unwrap();
        assert_eq!(conn.frames().len(), 1);

        assert!(hub.unregister(conn.id).await);
        assert!(!hub.unregister(conn.id).await);
        assert_eq!(hub.subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_is_empty_report() {
        let report = hub().publish(&event()).await.unwrap();
        assert_eq!(report, PublishReport::default());
    }

    #[tokio::test]
    async fn shutdown_closes_everything() {
        let hub = hub();
        let a = TestConnection::new(Behavior::Healthy);
        let b = TestConnection::new(Behavior::Healthy);
        hub.register(a.clone()).await;
        hub.register(b.clone()).await;

        hub.shutdown().await;

        assert_eq!(hub.subscriber_count().await, 0);
        assert_eq!(a.closes.load(Ordering::SeqCst), 1);
        assert_eq!(b.closes.load(Ordering::SeqCst), 1);
    }
}
