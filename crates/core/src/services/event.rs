//! Campus events with paid transport.
//!
//! A booking is priced from the event's fee table at booking time. Payment
//! is settled by an admin verifying an uploaded proof.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, Set, TransactionTrait};
use serde::Deserialize;
use unibus_common::{AppError, AppResult, IdGenerator};
use unibus_db::{
    entities::{
        event, event_booking,
        event_booking::{PaymentStatus, TripType},
        payment_proof,
        student::ApprovalStatus,
    },
    repositories::{EventBookingRepository, EventRepository, PaymentProofRepository},
};
use validator::Validate;

use crate::context::CallerContext;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventInput {
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[validate(length(max = 4096))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 256))]
    pub venue: String,
    /// RFC 3339 timestamp
    pub event_date: String,
    #[validate(range(min = 0))]
    pub fee_one_way: i64,
    #[validate(range(min = 0))]
    pub fee_return_only: i64,
    #[validate(range(min = 0))]
    pub fee_round_trip: i64,
}

/// Event service for business logic.
#[derive(Clone)]
pub struct EventService {
    db: Arc<DatabaseConnection>,
    event_repo: EventRepository,
    booking_repo: EventBookingRepository,
    proof_repo: PaymentProofRepository,
    id_gen: IdGenerator,
}

impl EventService {
    /// Create a new event service.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        event_repo: EventRepository,
        booking_repo: EventBookingRepository,
        proof_repo: PaymentProofRepository,
    ) -> Self {
        Self {
            db,
            event_repo,
            booking_repo,
            proof_repo,
            id_gen: IdGenerator::new(),
        }
    }

    pub async fn create_event(
        &self,
        caller: &CallerContext,
        input: CreateEventInput,
    ) -> AppResult<event::Model> {
        caller.require_admin()?;
        input.validate()?;

        let event_date = DateTime::parse_from_rfc3339(input.event_date.trim()).map_err(|e| {
            AppError::Validation(format!("eventDate is not a valid ISO-8601 timestamp: {e}"))
        })?;

        let model = event::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(input.title.trim().to_string()),
            description: Set(input.description.filter(|d| !d.trim().is_empty())),
            venue: Set(input.venue.trim().to_string()),
            event_date: Set(event_date),
            fee_one_way: Set(input.fee_one_way),
            fee_return_only: Set(input.fee_return_only),
            fee_round_trip: Set(input.fee_round_trip),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
        };

        let event = self.event_repo.create(model).await?;
        tracing::info!(event_id = %event.id, title = %event.title, "Event created");
        Ok(event)
    }

    /// Active events from `now` on, soonest first.
    pub async fn list_upcoming(&self, now: DateTime<Utc>) -> AppResult<Vec<event::Model>> {
        self.event_repo.find_upcoming(now.into()).await
    }

    /// Book transport to an event for the caller.
    pub async fn book(
        &self,
        caller: &CallerContext,
        event_id: &str,
        trip_type: TripType,
    ) -> AppResult<event_booking::Model> {
        let event = self.event_repo.get_by_id(event_id).await?;
        if !event.is_active {
            return Err(AppError::Conflict("Evento não está disponível".to_string()));
        }

        if self
            .booking_repo
            .find_by_pair(event_id, &caller.identity)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "Já tem uma reserva para este evento".to_string(),
            ));
        }

        let model = event_booking::ActiveModel {
            id: Set(self.id_gen.generate()),
            event_id: Set(event.id.clone()),
            student_id: Set(caller.identity.clone()),
            trip_type: Set(trip_type),
            price: Set(event.fee_for(trip_type)),
            payment_status: Set(PaymentStatus::AwaitingPayment),
            created_at: Set(Utc::now().into()),
        };

        let booking = self.booking_repo.create(model).await?;

        tracing::info!(
            booking_id = %booking.id,
            event_id = %event.id,
            student_id = %booking.student_id,
            price = booking.price,
            "Event booked"
        );

        Ok(booking)
    }

    /// Attach a payment proof to one of the caller's bookings.
    pub async fn submit_payment_proof(
        &self,
        caller: &CallerContext,
        booking_id: &str,
        file_reference: &str,
    ) -> AppResult<payment_proof::Model> {
        let file_reference = file_reference.trim();
        if file_reference.is_empty() {
            return Err(AppError::Validation("fileReference required".to_string()));
        }

        let booking = self.booking_repo.get_by_id(booking_id).await?;
        if booking.student_id != caller.identity {
            return Err(AppError::Forbidden(
                "Reserva pertence a outro estudante".to_string(),
            ));
        }

        match booking.payment_status {
            PaymentStatus::Approved => {
                return Err(AppError::Conflict("Pagamento já aprovado".to_string()));
            }
            PaymentStatus::Pending => {
                return Err(AppError::Conflict(
                    "Já existe um comprovativo em análise".to_string(),
                ));
            }
            PaymentStatus::AwaitingPayment | PaymentStatus::Rejected => {}
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let model = payment_proof::ActiveModel {
            id: Set(self.id_gen.generate()),
            booking_id: Set(booking.id.clone()),
            file_reference: Set(file_reference.to_string()),
            status: Set(ApprovalStatus::Pending),
            approved_by: Set(None),
            approved_at: Set(None),
            rejection_reason: Set(None),
            created_at: Set(Utc::now().into()),
        };
        let proof = self.proof_repo.insert(&txn, model).await?;
        self.booking_repo
            .set_payment_status(&txn, &booking.id, PaymentStatus::Pending)
            .await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(proof_id = %proof.id, booking_id = %booking.id, "Payment proof submitted");

        Ok(proof)
    }

    /// The caller's bookings, newest first.
    pub async fn list_my_bookings(
        &self,
        caller: &CallerContext,
    ) -> AppResult<Vec<event_booking::Model>> {
        self.booking_repo.find_by_student(&caller.identity).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_event(id: &str, is_active: bool) -> event::Model {
        event::Model {
            id: id.to_string(),
            title: "Semana Académica".to_string(),
            description: None,
            venue: "Estádio 11 de Novembro".to_string(),
            event_date: (Utc::now() + Duration::days(7)).into(),
            fee_one_way: 1500,
            fee_return_only: 1500,
            fee_round_trip: 2500,
            is_active,
            created_at: Utc::now().into(),
        }
    }

    fn create_test_booking(
        id: &str,
        student_id: &str,
        trip_type: TripType,
        price: i64,
        payment_status: PaymentStatus,
    ) -> event_booking::Model {
        event_booking::Model {
            id: id.to_string(),
            event_id: "ev1".to_string(),
            student_id: student_id.to_string(),
            trip_type,
            price,
            payment_status,
            created_at: Utc::now().into(),
        }
    }

    fn create_test_proof(id: &str) -> payment_proof::Model {
        payment_proof::Model {
            id: id.to_string(),
            booking_id: "bk1".to_string(),
            file_reference: "uploads/receipt-1.pdf".to_string(),
            status: ApprovalStatus::Pending,
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
            created_at: Utc::now().into(),
        }
    }

    fn service_with(db: MockDatabase) -> EventService {
        let db = Arc::new(db.into_connection());
        EventService::new(
            db.clone(),
            EventRepository::new(db.clone()),
            EventBookingRepository::new(db.clone()),
            PaymentProofRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_book_prices_from_fee_table() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_event("ev1", true)]])
            .append_query_results([Vec::<event_booking::Model>::new()])
            .append_query_results([[create_test_booking(
                "bk1",
                "s1",
                TripType::RoundTrip,
                2500,
                PaymentStatus::AwaitingPayment,
            )]]);

        let service = service_with(db);
        let booking = service
            .book(&CallerContext::student("s1"), "ev1", TripType::RoundTrip)
            .await
            .unwrap();

        assert_eq!(booking.price, 2500);
        assert_eq!(booking.payment_status, PaymentStatus::AwaitingPayment);
    }

    #[tokio::test]
    async fn test_book_inactive_event_is_conflict() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_event("ev1", false)]]);

        let service = service_with(db);
        let result = service
            .book(&CallerContext::student("s1"), "ev1", TripType::OneWay)
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_book_twice_is_conflict() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_event("ev1", true)]])
            .append_query_results([[create_test_booking(
                "bk1",
                "s1",
                TripType::OneWay,
                1500,
                PaymentStatus::AwaitingPayment,
            )]]);

        let service = service_with(db);
        let result = service
            .book(&CallerContext::student("s1"), "ev1", TripType::RoundTrip)
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_submit_payment_proof_marks_booking_pending() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_booking(
                "bk1",
                "s1",
                TripType::OneWay,
                1500,
                PaymentStatus::AwaitingPayment,
            )]])
            .append_query_results([[create_test_proof("p1")]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }]);

        let service = service_with(db);
        let proof = service
            .submit_payment_proof(&CallerContext::student("s1"), "bk1", " uploads/receipt-1.pdf ")
            .await
            .unwrap();

        assert_eq!(proof.status, ApprovalStatus::Pending);
        assert_eq!(proof.booking_id, "bk1");
    }

    #[tokio::test]
    async fn test_submit_payment_proof_for_other_students_booking_is_forbidden() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[
            create_test_booking(
                "bk1",
                "s2",
                TripType::OneWay,
                1500,
                PaymentStatus::AwaitingPayment,
            ),
        ]]);

        let service = service_with(db);
        let result = service
            .submit_payment_proof(&CallerContext::student("s1"), "bk1", "uploads/x.pdf")
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_submit_payment_proof_after_approval_is_conflict() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[
            create_test_booking("bk1", "s1", TripType::OneWay, 1500, PaymentStatus::Approved),
        ]]);

        let service = service_with(db);
        let result = service
            .submit_payment_proof(&CallerContext::student("s1"), "bk1", "uploads/x.pdf")
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_submit_blank_reference_is_validation_error() {
        let service = service_with(MockDatabase::new(DatabaseBackend::Postgres));

        let result = service
            .submit_payment_proof(&CallerContext::student("s1"), "bk1", "  ")
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_event_requires_admin() {
        let service = service_with(MockDatabase::new(DatabaseBackend::Postgres));
        let input = CreateEventInput {
            title: "Gala".to_string(),
            description: None,
            venue: "Talatona".to_string(),
            event_date: (Utc::now() + Duration::days(3)).to_rfc3339(),
            fee_one_way: 1000,
            fee_return_only: 1000,
            fee_round_trip: 1800,
        };

        let result = service
            .create_event(&CallerContext::student("s1"), input)
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
