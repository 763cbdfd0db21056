//! Transition publisher.
//!
//! Services report state transitions here after their transaction commits.
//! Delivery (push, email, ...) belongs to whoever implements the trait.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use unibus_common::AppResult;

/// Which approval-gated entity a decision applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalKind {
    Student,
    DriverApplication,
    PaymentProof,
}

impl ApprovalKind {
    /// Snake-case name used in logs and events.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::DriverApplication => "driver_application",
            Self::PaymentProof => "payment_proof",
        }
    }
}

/// State transitions exposed to the notification collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TransportEvent {
    /// A seat on a bus was reserved.
    #[serde(rename_all = "camelCase")]
    ReservationConfirmed {
        reservation_id: String,
        student_id: String,
        bus_id: String,
    },
    /// An active reservation was cancelled by the student or an admin.
    #[serde(rename_all = "camelCase")]
    ReservationCancelled {
        reservation_id: String,
        student_id: String,
        bus_id: String,
        cancelled_by: String,
    },
    /// A passenger asked for a seat on a ride.
    #[serde(rename_all = "camelCase")]
    RideRequested {
        request_id: String,
        ride_id: String,
        passenger_id: String,
        driver_id: String,
    },
    /// The ride owner accepted or rejected a request.
    #[serde(rename_all = "camelCase")]
    RideRequestDecided {
        request_id: String,
        ride_id: String,
        passenger_id: String,
        accepted: bool,
    },
    /// The owner withdrew a ride; its pending requests were rejected.
    #[serde(rename_all = "camelCase")]
    RideCancelled {
        ride_id: String,
        driver_id: String,
        rejected_requests: u64,
    },
    /// An admin approved or rejected an approval-gated entity.
    #[serde(rename_all = "camelCase")]
    ApprovalDecided {
        kind: ApprovalKind,
        entity_id: String,
        approved: bool,
        decided_by: String,
    },
}

impl TransportEvent {
    /// Short name for log lines.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ReservationConfirmed { .. } => "reservation_confirmed",
            Self::ReservationCancelled { .. } => "reservation_cancelled",
            Self::RideRequested { .. } => "ride_requested",
            Self::RideRequestDecided { .. } => "ride_request_decided",
            Self::RideCancelled { .. } => "ride_cancelled",
            Self::ApprovalDecided { .. } => "approval_decided",
        }
    }
}

/// Sink for transition events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish one event.
    async fn publish(&self, event: TransportEvent) -> AppResult<()>;
}

/// Discards every event.
#[derive(Clone, Default)]
pub struct NoOpEventPublisher;

#[async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish(&self, _event: TransportEvent) -> AppResult<()> {
        Ok(())
    }
}

/// Writes every event to the log at info level.
#[derive(Clone, Default)]
pub struct TracingEventPublisher;

#[async_trait]
impl EventPublisher for TracingEventPublisher {
    async fn publish(&self, event: TransportEvent) -> AppResult<()> {
        let payload = serde_json::to_string(&event)
            .map_err(|e| unibus_common::AppError::Internal(e.to_string()))?;
        tracing::info!(event = event.name(), payload = %payload, "Transport event");
        Ok(())
    }
}

/// Wrapper for boxed `EventPublisher` trait object.
pub type EventPublisherService = Arc<dyn EventPublisher>;

/// Publish if a publisher is configured; failures are logged, never returned.
pub(crate) async fn publish_event(publisher: Option<&EventPublisherService>, event: TransportEvent) {
    if let Some(publisher) = publisher {
        let name = event.name();
        if let Err(e) = publisher.publish(event).await {
            tracing::warn!(error = %e, event = name, "Failed to publish transport event");
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Keeps published events for assertions.
    #[derive(Default)]
    pub struct RecordingEventPublisher {
        events: Mutex<Vec<TransportEvent>>,
    }

    impl RecordingEventPublisher {
        pub fn events(&self) -> Vec<TransportEvent> {
            self.events.lock().map(|e| e.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl EventPublisher for RecordingEventPublisher {
        async fn publish(&self, event: TransportEvent) -> AppResult<()> {
            if let Ok(mut events) = self.events.lock() {
                events.push(event);
            }
            Ok(())
        }
    }
}
