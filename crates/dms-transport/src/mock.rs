//! In-memory mock channel for testing without a real broker.
//!
//! Records all published messages and subscriptions, and lets tests inject
//! fake inbound PUBLISHes that `process_loop` delivers to the registered
//! handler, mirroring the real `MqttChannel`'s contract.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::channel::{Channel, IncomingHandler};
use crate::error::TransportResult;

#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

pub struct MockChannel {
    published: Mutex<Vec<PublishedMessage>>,
    subscriptions: Mutex<Vec<String>>,
    pending_incoming: Mutex<Vec<(String, Vec<u8>)>>,
    on_publish: Mutex<Option<IncomingHandler>>,
    fail_next_process_loop: Mutex<bool>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            subscriptions: Mutex::new(Vec::new()),
            pending_incoming: Mutex::new(Vec::new()),
            on_publish: Mutex::new(None),
            fail_next_process_loop: Mutex::new(false),
        }
    }

    /// Register the handler `process_loop` will deliver inbound publishes to.
    pub fn set_handler(&self, handler: IncomingHandler) {
        *self.on_publish.lock().unwrap() = Some(handler);
    }

    /// Queue a fake inbound PUBLISH; delivered on the next `process_loop` call.
    pub fn inject_incoming(&self, topic: impl Into<String>, payload: impl Into<Vec<u8>>) {
        self.pending_incoming
            .lock()
            .unwrap()
            .push((topic.into(), payload.into()));
    }

    /// Make the next `process_loop` call return `RecvFailed`, simulating a
    /// dropped connection.
    pub fn fail_next_process_loop(&self) {
        *self.fail_next_process_loop.lock().unwrap() = true;
    }

    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published.lock().unwrap().clone()
    }

    pub fn published_to(&self, topic: &str) -> Vec<PublishedMessage> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }

    pub fn last_published(&self) -> Option<PublishedMessage> {
        self.published.lock().unwrap().last().cloned()
    }

    pub fn is_subscribed_to(&self, topic: &str) -> bool {
        self.subscriptions.lock().unwrap().iter().any(|t| t == topic)
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.lock().unwrap().clone()
    }

    pub fn reset(&self) {
        self.published.lock().unwrap().clear();
        self.subscriptions.lock().unwrap().clear();
        self.pending_incoming.lock().unwrap().clear();
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Channel for MockChannel {
    async fn publish(&self, topic: &str, payload: &[u8]) -> TransportResult<()> {
        self.published.lock().unwrap().push(PublishedMessage {
            topic: topic.to_string(),
            payload: payload.to_vec(),
        });
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> TransportResult<()> {
        self.subscriptions.lock().unwrap().push(topic.to_string());
        Ok(())
    }

    async fn process_loop(&mut self) -> TransportResult<()> {
        if std::mem::take(&mut *self.fail_next_process_loop.lock().unwrap()) {
            return Err(crate::error::TransportError::RecvFailed("simulated drop".into()));
        }
        let pending = std::mem::take(&mut *self.pending_incoming.lock().unwrap());
        let handler = self.on_publish.lock().unwrap().clone();
        if let Some(handler) = handler {
            for (topic, payload) in pending {
                handler(topic, payload);
            }
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> TransportResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex as StdMutex};

    #[tokio::test]
    async fn publish_records_messages() {
        let mock = MockChannel::new();
        mock.publish("test/topic", b"hello").await.unwrap();
        mock.publish("test/other", b"world").await.unwrap();

        let msgs = mock.published();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].topic, "test/topic");
        assert_eq!(msgs[0].payload, b"hello");
    }

    #[tokio::test]
    async fn subscribe_records_filters() {
        let mock = MockChannel::new();
        mock.subscribe("a/b/+").await.unwrap();
        assert!(mock.is_subscribed_to("a/b/+"));
        assert!(!mock.is_subscribed_to("x/y"));
    }

    #[tokio::test]
    async fn process_loop_delivers_injected_messages_to_handler() {
        let mut mock = MockChannel::new();
        let received = Arc::new(StdMutex::new(Vec::new()));
        let received_clone = received.clone();
        mock.set_handler(Arc::new(move |topic, payload| {
            received_clone.lock().unwrap().push((topic, payload));
        }));

        mock.inject_incoming("a/b", b"hi".to_vec());
        mock.process_loop().await.unwrap();

        let got = received.lock().unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].0, "a/b");
    }

    #[tokio::test]
    async fn process_loop_can_simulate_a_dropped_connection() {
        let mut mock = MockChannel::new();
        mock.fail_next_process_loop();
        assert!(mock.process_loop().await.is_err());
        assert!(mock.process_loop().await.is_ok());
    }

    #[tokio::test]
    async fn reset_clears_state() {
        let mock = MockChannel::new();
        mock.publish("t", b"d").await.unwrap();
        mock.subscribe("f").await.unwrap();
        mock.reset();
        assert!(mock.published().is_empty());
        assert!(mock.subscriptions().is_empty());
    }
}
