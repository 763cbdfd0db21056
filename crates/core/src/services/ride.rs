//! Ride Matching Manager.
//!
//! A student posts a ride offer, other students request a seat, and the
//! ride owner decides each request exactly once.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{DatabaseConnection, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use unibus_common::{AppError, AppResult, IdGenerator};
use unibus_db::{
    entities::{
        ride, ride::RideStatus, ride_request, ride_request::RideRequestStatus,
    },
    repositories::{RideRepository, RideRequestRepository, StudentRepository},
};
use validator::Validate;

use crate::context::CallerContext;
use crate::services::event_publisher::{EventPublisherService, TransportEvent, publish_event};

/// Maximum number of rides returned by the available-rides listing.
const AVAILABLE_RIDES_LIMIT: u64 = 100;

/// Input for posting a ride offer.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PostRideInput {
    #[validate(length(min = 1, max = 256))]
    pub from_location: String,
    #[validate(length(min = 1, max = 256))]
    pub to_location: String,
    /// RFC 3339 timestamp
    pub start_time: String,
    pub end_time: Option<String>,
    #[validate(range(min = 1, max = 64))]
    pub available_seats: i32,
    /// Whole currency units; zero is a free ride
    #[validate(range(min = 0))]
    pub price: i64,
    #[validate(length(max = 2048))]
    pub description: Option<String>,
}

/// Owner decision on a ride request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RideRequestDecision {
    Accept,
    Reject,
}

impl RideRequestDecision {
    const fn target_status(self) -> RideRequestStatus {
        match self {
            Self::Accept => RideRequestStatus::Accepted,
            Self::Reject => RideRequestStatus::Rejected,
        }
    }
}

/// Ride service for business logic.
#[derive(Clone)]
pub struct RideService {
    db: Arc<DatabaseConnection>,
    ride_repo: RideRepository,
    request_repo: RideRequestRepository,
    student_repo: StudentRepository,
    event_publisher: Option<EventPublisherService>,
    id_gen: IdGenerator,
}

impl RideService {
    /// Create a new ride service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        ride_repo: RideRepository,
        request_repo: RideRequestRepository,
        student_repo: StudentRepository,
    ) -> Self {
        Self {
            db,
            ride_repo,
            request_repo,
            student_repo,
            event_publisher: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the event publisher.
    pub fn set_event_publisher(&mut self, event_publisher: EventPublisherService) {
        self.event_publisher = Some(event_publisher);
    }

    /// Publish a ride offer owned by the caller.
    pub async fn post_ride(
        &self,
        caller: &CallerContext,
        input: PostRideInput,
    ) -> AppResult<ride::Model> {
        let (start_time, end_time) = validate_ride_input(&input, Utc::now())?;

        let driver = self.student_repo.get_by_id(&caller.identity).await?;

        let now = Utc::now();
        let model = ride::ActiveModel {
            id: Set(self.id_gen.generate()),
            driver_id: Set(driver.id.clone()),
            from_location: Set(input.from_location.trim().to_string()),
            to_location: Set(input.to_location.trim().to_string()),
            start_time: Set(start_time),
            end_time: Set(end_time),
            available_seats: Set(input.available_seats),
            price: Set(input.price),
            description: Set(input.description.filter(|d| !d.trim().is_empty())),
            status: Set(RideStatus::Available),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };

        let ride = self.ride_repo.create(model).await?;

        tracing::info!(
            ride_id = %ride.id,
            driver_id = %ride.driver_id,
            seats = ride.available_seats,
            price = ride.price,
            "Ride posted"
        );

        Ok(ride)
    }

    /// Available rides departing at or after `now`, earliest first.
    pub async fn list_available_rides(&self, now: DateTime<Utc>) -> AppResult<Vec<ride::Model>> {
        self.ride_repo
            .find_available(now.into(), AVAILABLE_RIDES_LIMIT)
            .await
    }

    /// All rides of a driver, newest first.
    pub async fn list_rides_by_driver(&self, driver_id: &str) -> AppResult<Vec<ride::Model>> {
        self.ride_repo.find_by_driver(driver_id).await
    }

    /// Ask for a seat on a ride.
    ///
    /// Remaining capacity is not checked here; it is enforced when the owner accepts.
    /// The ride row is locked while the request is inserted, so a concurrent
    /// cancellation either sees the new request or is seen by it.
    pub async fn request_seat(
        &self,
        caller: &CallerContext,
        ride_id: &str,
        message: Option<String>,
    ) -> AppResult<ride_request::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let ride = self
            .ride_repo
            .lock_by_id(&txn, ride_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ride {ride_id}")))?;

        if ride.status != RideStatus::Available {
            return Err(AppError::Conflict("Boleia não está disponível".to_string()));
        }

        if ride.driver_id == caller.identity {
            return Err(AppError::Validation(
                "Não pode pedir lugar na sua própria boleia".to_string(),
            ));
        }

        if self
            .request_repo
            .find_pending_by_pair(&txn, ride_id, &caller.identity)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "Já existe um pedido pendente para esta boleia".to_string(),
            ));
        }

        let model = ride_request::ActiveModel {
            id: Set(self.id_gen.generate()),
            ride_id: Set(ride.id.clone()),
            passenger_id: Set(caller.identity.clone()),
            status: Set(RideRequestStatus::Pending),
            message: Set(message.filter(|m| !m.trim().is_empty())),
            created_at: Set(Utc::now().into()),
            decided_at: Set(None),
        };

        let request = self.request_repo.create(&txn, model).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(
            request_id = %request.id,
            ride_id = %ride.id,
            passenger_id = %request.passenger_id,
            "Ride seat requested"
        );

        publish_event(
            self.event_publisher.as_ref(),
            TransportEvent::RideRequested {
                request_id: request.id.clone(),
                ride_id: ride.id,
                passenger_id: request.passenger_id.clone(),
                driver_id: ride.driver_id,
            },
        )
        .await;

        Ok(request)
    }

    /// Requests on one of the caller's rides, newest first.
    pub async fn list_requests(
        &self,
        caller: &CallerContext,
        ride_id: &str,
    ) -> AppResult<Vec<ride_request::Model>> {
        let ride = self.ride_repo.get_by_id(ride_id).await?;
        ensure_owner(&ride, caller)?;

        self.request_repo.find_by_ride(ride_id).await
    }

    /// Accept or reject a pending request on one of the caller's rides.
    ///
    /// The ride row stays locked until commit, so concurrent accepts on the
    /// same ride see each other's results when counting accepted seats.
    pub async fn decide_request(
        &self,
        caller: &CallerContext,
        request_id: &str,
        decision: RideRequestDecision,
    ) -> AppResult<ride_request::Model> {
        let request = self.request_repo.get_by_id(request_id).await?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let ride = self
            .ride_repo
            .lock_by_id(&txn, &request.ride_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ride {}", request.ride_id)))?;
        ensure_owner(&ride, caller)?;

        // Re-read under the ride lock
        let request = self
            .request_repo
            .find_by_id_in(&txn, request_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ride request {request_id}")))?;

        if request.status != RideRequestStatus::Pending {
            return Err(AppError::Conflict(
                "Este pedido já foi decidido".to_string(),
            ));
        }

        if decision == RideRequestDecision::Accept {
            if ride.status.is_terminal() {
                return Err(AppError::Conflict(
                    "Boleia já não aceita passageiros".to_string(),
                ));
            }

            let accepted = self.request_repo.count_accepted(&txn, &ride.id).await?;
            let seats = u64::try_from(ride.available_seats).unwrap_or(0);
            if accepted >= seats {
                return Err(AppError::CapacityExceeded(format!(
                    "boleia com {seats} lugares já preenchidos"
                )));
            }
        }

        let status = decision.target_status();
        let decided_at: DateTime<FixedOffset> = Utc::now().into();
        let rows = self
            .request_repo
            .decide(&txn, request_id, status, decided_at)
            .await?;
        if rows == 0 {
            return Err(AppError::Conflict(
                "Este pedido já foi decidido".to_string(),
            ));
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(
            request_id = %request_id,
            ride_id = %ride.id,
            status = ?status,
            "Ride request decided"
        );

        let decided = ride_request::Model {
            status,
            decided_at: Some(decided_at),
            ..request
        };

        publish_event(
            self.event_publisher.as_ref(),
            TransportEvent::RideRequestDecided {
                request_id: decided.id.clone(),
                ride_id: decided.ride_id.clone(),
                passenger_id: decided.passenger_id.clone(),
                accepted: status == RideRequestStatus::Accepted,
            },
        )
        .await;

        Ok(decided)
    }

    /// Withdraw one of the caller's rides.
    ///
    /// Every pending request on the ride is rejected in the same transaction.
    pub async fn cancel_ride(&self, caller: &CallerContext, ride_id: &str) -> AppResult<ride::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let ride = self.lock_owned_ride(&txn, caller, ride_id).await?;
        if ride.status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "Boleia já está {}",
                status_label(ride.status)
            )));
        }

        let now: DateTime<FixedOffset> = Utc::now().into();
        self.transition(&txn, &ride, RideStatus::Cancelled, now).await?;
        let rejected = self
            .request_repo
            .reject_pending_for_ride(&txn, ride_id, now)
            .await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(ride_id = %ride_id, rejected_requests = rejected, "Ride cancelled");

        publish_event(
            self.event_publisher.as_ref(),
            TransportEvent::RideCancelled {
                ride_id: ride.id.clone(),
                driver_id: ride.driver_id.clone(),
                rejected_requests: rejected,
            },
        )
        .await;

        Ok(ride::Model {
            status: RideStatus::Cancelled,
            updated_at: Some(now),
            ..ride
        })
    }

    /// Mark one of the caller's rides as completed.
    pub async fn complete_ride(
        &self,
        caller: &CallerContext,
        ride_id: &str,
    ) -> AppResult<ride::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let ride = self.lock_owned_ride(&txn, caller, ride_id).await?;
        if ride.status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "Boleia já está {}",
                status_label(ride.status)
            )));
        }

        let now: DateTime<FixedOffset> = Utc::now().into();
        self.transition(&txn, &ride, RideStatus::Completed, now).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(ride_id = %ride_id, "Ride completed");

        Ok(ride::Model {
            status: RideStatus::Completed,
            updated_at: Some(now),
            ..ride
        })
    }

    async fn lock_owned_ride(
        &self,
        txn: &sea_orm::DatabaseTransaction,
        caller: &CallerContext,
        ride_id: &str,
    ) -> AppResult<ride::Model> {
        let ride = self
            .ride_repo
            .lock_by_id(txn, ride_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ride {ride_id}")))?;
        ensure_owner(&ride, caller)?;
        Ok(ride)
    }

    async fn transition(
        &self,
        txn: &sea_orm::DatabaseTransaction,
        ride: &ride::Model,
        to: RideStatus,
        at: DateTime<FixedOffset>,
    ) -> AppResult<()> {
        let rows = self
            .ride_repo
            .transition(txn, &ride.id, &[RideStatus::Available, RideStatus::Full], to, at)
            .await?;
        if rows == 0 {
            return Err(AppError::Conflict("Estado da boleia mudou".to_string()));
        }
        Ok(())
    }
}

fn ensure_owner(ride: &ride::Model, caller: &CallerContext) -> AppResult<()> {
    if ride.driver_id == caller.identity {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Apenas o dono da boleia pode fazer isto".to_string(),
        ))
    }
}

const fn status_label(status: RideStatus) -> &'static str {
    match status {
        RideStatus::Available => "disponível",
        RideStatus::Full => "lotada",
        RideStatus::Completed => "concluída",
        RideStatus::Cancelled => "cancelada",
    }
}

/// Check a ride offer and parse its timestamps.
///
/// `start_time` must lie strictly after `now`; `end_time`, when given, after `start_time`.
pub fn validate_ride_input(
    input: &PostRideInput,
    now: DateTime<Utc>,
) -> AppResult<(DateTime<FixedOffset>, Option<DateTime<FixedOffset>>)> {
    input.validate()?;

    if input.from_location.trim().is_empty() || input.to_location.trim().is_empty() {
        return Err(AppError::Validation(
            "Origem e destino são obrigatórios".to_string(),
        ));
    }

    let start_time = parse_timestamp(&input.start_time, "startTime")?;
    if start_time.with_timezone(&Utc) <= now {
        return Err(AppError::Validation(
            "startTime must be in the future".to_string(),
        ));
    }

    let end_time = match input.end_time.as_deref() {
        Some(raw) if !raw.trim().is_empty() => {
            let end = parse_timestamp(raw, "endTime")?;
            if end <= start_time {
                return Err(AppError::Validation(
                    "endTime must be after startTime".to_string(),
                ));
            }
            Some(end)
        }
        _ => None,
    };

    Ok((start_time, end_time))
}

fn parse_timestamp(raw: &str, field: &str) -> AppResult<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map_err(|e| AppError::Validation(format!("{field} is not a valid ISO-8601 timestamp: {e}")))
}
