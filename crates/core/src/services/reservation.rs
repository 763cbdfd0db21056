//! Reservation Manager.
//!
//! Holds the two bus-seat invariants: a student has at most one active
//! reservation, and a bus never has more active reservations than seats.
//! Occupancy is always derived by counting active rows.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{DatabaseConnection, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use unibus_common::{AppError, AppResult, IdGenerator};
use unibus_db::{
    entities::{bus, bus_reservation, bus_reservation::ReservationStatus},
    repositories::{BusRepository, BusReservationRepository, ScheduleRepository, StudentRepository},
};

use crate::context::CallerContext;
use crate::services::event_publisher::{EventPublisherService, TransportEvent, publish_event};

/// Input for reserving a seat.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveSeatInput {
    pub bus_id: String,
    pub schedule_id: Option<String>,
}

/// A bus with its current occupancy.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusAvailability {
    #[serde(flatten)]
    pub bus: bus::Model,
    pub occupied: u64,
    pub available: u64,
}

/// Reservation service for business logic.
#[derive(Clone)]
pub struct ReservationService {
    db: Arc<DatabaseConnection>,
    reservation_repo: BusReservationRepository,
    bus_repo: BusRepository,
    student_repo: StudentRepository,
    schedule_repo: ScheduleRepository,
    event_publisher: Option<EventPublisherService>,
    id_gen: IdGenerator,
}

impl ReservationService {
    /// Create a new reservation service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        reservation_repo: BusReservationRepository,
        bus_repo: BusRepository,
        student_repo: StudentRepository,
        schedule_repo: ScheduleRepository,
    ) -> Self {
        Self {
            db,
            reservation_repo,
            bus_repo,
            student_repo,
            schedule_repo,
            event_publisher: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the event publisher.
    pub fn set_event_publisher(&mut self, event_publisher: EventPublisherService) {
        self.event_publisher = Some(event_publisher);
    }

    /// Reserve a seat on a bus for the calling student.
    ///
    /// The student row and then the bus row are locked for the duration of
    /// the transaction, so two reservations racing for the last seat of a bus
    /// are serialized and the loser sees the updated count.
    pub async fn reserve_seat(
        &self,
        caller: &CallerContext,
        input: ReserveSeatInput,
    ) -> AppResult<bus_reservation::Model> {
        let student_id = caller.identity.as_str();

        if let Some(ref schedule_id) = input.schedule_id {
            let schedule = self.schedule_repo.find_by_id(schedule_id).await?;
            let belongs_to_bus = schedule
                .as_ref()
                .is_some_and(|s| s.bus_id.as_deref() == Some(input.bus_id.as_str()));
            if !belongs_to_bus {
                return Err(AppError::Validation(
                    "Horário não pertence a este autocarro".to_string(),
                ));
            }
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.student_repo
            .lock_by_id(&txn, student_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Student {student_id}")))?;

        if self
            .reservation_repo
            .find_active_by_student_in(&txn, student_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Você já tem uma reserva ativa".to_string()));
        }

        let bus = self
            .bus_repo
            .lock_by_id(&txn, &input.bus_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Bus {}", input.bus_id)))?;

        if !bus.is_active {
            return Err(AppError::Conflict(format!(
                "Autocarro {} não está em serviço",
                bus.number
            )));
        }

        let occupied = self
            .reservation_repo
            .count_active_by_bus(&txn, &bus.id)
            .await?;
        if occupied >= capacity_of(&bus) {
            tracing::debug!(bus_id = %bus.id, occupied, capacity = bus.capacity, "Bus is full");
            return Err(AppError::CapacityExceeded(format!(
                "autocarro {} sem lugares livres",
                bus.number
            )));
        }

        let model = bus_reservation::ActiveModel {
            id: Set(self.id_gen.generate()),
            student_id: Set(student_id.to_string()),
            bus_id: Set(bus.id.clone()),
            schedule_id: Set(input.schedule_id),
            status: Set(ReservationStatus::Active),
            created_at: Set(Utc::now().into()),
            cancelled_at: Set(None),
            cancelled_by: Set(None),
        };
        let reservation = self.reservation_repo.insert(&txn, model).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(
            reservation_id = %reservation.id,
            student_id = %student_id,
            bus_id = %bus.id,
            occupied = occupied + 1,
            "Seat reserved"
        );

        publish_event(
            self.event_publisher.as_ref(),
            TransportEvent::ReservationConfirmed {
                reservation_id: reservation.id.clone(),
                student_id: reservation.student_id.clone(),
                bus_id: reservation.bus_id.clone(),
            },
        )
        .await;

        Ok(reservation)
    }

    /// Cancel the calling student's active reservation.
    ///
    /// Cancelling with nothing active is a no-op.
    pub async fn cancel_reservation(&self, caller: &CallerContext) -> AppResult<()> {
        self.cancel_active(&caller.identity, &caller.identity).await
    }

    /// Admin override: cancel another student's active reservation.
    pub async fn cancel_reservation_for(
        &self,
        caller: &CallerContext,
        student_id: &str,
    ) -> AppResult<()> {
        caller.require_admin()?;
        self.cancel_active(student_id, &caller.identity).await
    }

    async fn cancel_active(&self, student_id: &str, cancelled_by: &str) -> AppResult<()> {
        let Some(active) = self
            .reservation_repo
            .find_active_by_student(student_id)
            .await?
        else {
            tracing::debug!(student_id = %student_id, "No active reservation to cancel");
            return Ok(());
        };

        let rows = self
            .reservation_repo
            .cancel_active(student_id, cancelled_by, Utc::now().into())
            .await?;

        if rows > 0 {
            tracing::info!(
                reservation_id = %active.id,
                student_id = %student_id,
                bus_id = %active.bus_id,
                cancelled_by = %cancelled_by,
                "Reservation cancelled"
            );

            publish_event(
                self.event_publisher.as_ref(),
                TransportEvent::ReservationCancelled {
                    reservation_id: active.id,
                    student_id: student_id.to_string(),
                    bus_id: active.bus_id,
                    cancelled_by: cancelled_by.to_string(),
                },
            )
            .await;
        }

        Ok(())
    }

    /// The calling student's active reservation, if any.
    pub async fn get_active_reservation(
        &self,
        caller: &CallerContext,
    ) -> AppResult<Option<bus_reservation::Model>> {
        self.reservation_repo
            .find_active_by_student(&caller.identity)
            .await
    }

    /// Active reservation count per bus id.
    pub async fn get_occupancy_counts(&self) -> AppResult<HashMap<String, u64>> {
        self.reservation_repo.occupancy_counts().await
    }

    /// Active buses with occupied and free seat counts.
    pub async fn list_bus_availability(&self) -> AppResult<Vec<BusAvailability>> {
        let buses = self.bus_repo.find_all(true).await?;
        let counts = self.reservation_repo.occupancy_counts().await?;

        Ok(buses
            .into_iter()
            .map(|bus| {
                let occupied = counts.get(&bus.id).copied().unwrap_or(0);
                let available = capacity_of(&bus).saturating_sub(occupied);
                BusAvailability {
                    bus,
                    occupied,
                    available,
                }
            })
            .collect())
    }
}

fn capacity_of(bus: &bus::Model) -> u64 {
    u64::try_from(bus.capacity).unwrap_or(0)
}
