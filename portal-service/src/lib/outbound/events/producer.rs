use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::error::KafkaError;
use rdkafka::producer::FutureProducer;
use rdkafka::producer::FutureRecord;
use rdkafka::util::Timeout;
use thiserror::Error;

use crate::account::errors::EventPublisherError;
use crate::account::events::AccountEvent;
use crate::account::events::PasswordChangedEvent;
use crate::account::events::PasswordResetRequestedEvent;
use crate::account::events::UserRegisteredEvent;
use crate::account::ports::EventPublisher;
use crate::config::Config;
use crate::outbound::events::messages::AccountEventMessage;

/// Failures raised while handing an account event to the broker.
#[derive(Debug, Error)]
pub enum KafkaProducerError {
    #[error("Could not encode account event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Broker rejected account event: {0}")]
    Delivery(#[from] KafkaError),
}

impl From<KafkaProducerError> for EventPublisherError {
    fn from(err: KafkaProducerError) -> Self {
        match err {
            KafkaProducerError::Encode(e) => EventPublisherError::SerializationFailed(e.to_string()),
            KafkaProducerError::Delivery(e) => EventPublisherError::PublishFailed(e.to_string()),
        }
    }
}

/// Publishes account lifecycle events as JSON onto a single topic.
pub struct KafkaEventProducer {
    producer: FutureProducer,
    topic: String,
    delivery_timeout: Duration,
}

impl KafkaEventProducer {
    /// Build an idempotent producer that waits for every in-sync replica
    /// (at-least-once delivery).
    pub fn new(config: &Config) -> Result<Self, anyhow::Error> {
        tracing::info!(
            brokers = %config.kafka.brokers,
            topic = %config.kafka.topic,
            "Initializing Kafka producer for account events"
        );

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.kafka.brokers)
            .set("message.timeout.ms", "30000")
            .set("compression.type", "gzip")
            .set("enable.idempotence", "true")
            .set("acks", "all")
            .set("retries", "10")
            .set("max.in.flight.requests.per.connection", "5")
            .set("retry.backoff.ms", "100")
            .create()?;

        Ok(Self {
            producer,
            topic: config.kafka.topic.clone(),
            delivery_timeout: Duration::from_secs(30),
        })
    }

    async fn send(&self, event: &AccountEvent) -> Result<(), KafkaProducerError> {
        let payload = serde_json::to_vec(&AccountEventMessage::from(event))?;
        let key = event.user_id();

        // Keyed by user so one account's events keep their order.
        let record = FutureRecord::to(&self.topic).key(key).payload(&payload);
        self.producer
            .send(record, Timeout::After(self.delivery_timeout))
            .await
            .map_err(|(e, _)| e)?;

        tracing::debug!(
            topic = %self.topic,
            event_type = %event.event_type(),
            user_id = %key,
            "Account event delivered"
        );
        Ok(())
    }

    async fn publish_event(&self, event: AccountEvent) -> Result<(), EventPublisherError> {
        self.send(&event).await.map_err(|e| {
            tracing::error!(
                event_id = %event.event_id(),
                event_type = %event.event_type(),
                user_id = %event.user_id(),
                error = %e,
                "Failed to publish account event"
            );
            e.into()
        })
    }
}

#[async_trait]
impl EventPublisher for KafkaEventProducer {
    async fn publish_user_registered(
        &self,
        event: &UserRegisteredEvent,
    ) -> Result<(), EventPublisherError> {
        self.publish_event(AccountEvent::UserRegistered(event.clone()))
            .await
    }

    async fn publish_password_changed(
        &self,
        event: &PasswordChangedEvent,
    ) -> Result<(), EventPublisherError> {
        self.publish_event(AccountEvent::PasswordChanged(event.clone()))
            .await
    }

    async fn publish_password_reset_requested(
        &self,
        event: &PasswordResetRequestedEvent,
    ) -> Result<(), EventPublisherError> {
        self.publish_event(AccountEvent::PasswordResetRequested(event.clone()))
            .await
    }
}
