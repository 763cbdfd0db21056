//! Approval Workflow.
//!
//! One three-state gate (`pending`, `approved`, `rejected`) shared by student
//! registrations, driver applications and payment proofs. Each entity plugs in
//! through an [`ApprovalStore`] that knows how to persist a decision and apply
//! its side effects in the same transaction.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{DatabaseConnection, TransactionTrait};
use unibus_common::{AppError, AppResult, IdGenerator};
use unibus_db::{
    entities::{
        driver_application, event_booking::PaymentStatus, payment_proof, student,
        student::ApprovalStatus,
    },
    repositories::{
        ApprovalChange, DriverApplicationRepository, EventBookingRepository,
        PaymentProofRepository, StudentRepository, VehicleDescriptor,
    },
};

use crate::context::CallerContext;
use crate::services::event_publisher::{
    ApprovalKind, EventPublisherService, TransportEvent, publish_event,
};

/// Default page size for pending queues.
pub const DEFAULT_PENDING_LIMIT: u64 = 50;

/// Persistence for one approval-gated entity.
#[async_trait]
pub trait ApprovalStore: Send + Sync {
    /// Entity row type.
    type Entity: Send + Sync;

    /// Kind reported in events and logs.
    const KIND: ApprovalKind;

    /// Look up an entity by id.
    async fn find(&self, id: &str) -> AppResult<Option<Self::Entity>>;

    /// Current approval status of an entity.
    fn status(entity: &Self::Entity) -> ApprovalStatus;

    /// Pending entities, oldest first.
    async fn find_pending(&self, limit: u64, offset: u64) -> AppResult<Vec<Self::Entity>>;

    /// Persist a decision with its side effects, atomically.
    ///
    /// Returns `None` when the entity was no longer pending.
    async fn apply_decision(
        &self,
        id: &str,
        change: &ApprovalChange,
    ) -> AppResult<Option<Self::Entity>>;
}

/// Approve/reject/list operations over a store.
#[derive(Clone)]
pub struct ApprovalWorkflow<S> {
    store: S,
    event_publisher: Option<EventPublisherService>,
}

impl<S: ApprovalStore> ApprovalWorkflow<S> {
    /// Create a workflow over the given store.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self {
            store,
            event_publisher: None,
        }
    }

    /// Set the event publisher.
    pub fn set_event_publisher(&mut self, event_publisher: EventPublisherService) {
        self.event_publisher = Some(event_publisher);
    }

    /// Approve a pending entity.
    pub async fn approve(&self, caller: &CallerContext, id: &str) -> AppResult<S::Entity> {
        caller.require_admin()?;
        self.decide(caller, id, ApprovalStatus::Approved, None).await
    }

    /// Reject a pending entity with a non-empty reason.
    pub async fn reject(
        &self,
        caller: &CallerContext,
        id: &str,
        reason: &str,
    ) -> AppResult<S::Entity> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::Validation("reason required".to_string()));
        }
        caller.require_admin()?;
        self.decide(caller, id, ApprovalStatus::Rejected, Some(reason.to_string()))
            .await
    }

    /// Pending entities, oldest first.
    pub async fn get_pending(
        &self,
        caller: &CallerContext,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<S::Entity>> {
        caller.require_admin()?;
        self.store.find_pending(limit, offset).await
    }

    async fn decide(
        &self,
        caller: &CallerContext,
        id: &str,
        status: ApprovalStatus,
        reason: Option<String>,
    ) -> AppResult<S::Entity> {
        let entity = self.store.find(id).await?.ok_or_else(|| {
            AppError::NotFound(format!("{} {id}", S::KIND.as_str()))
        })?;

        let current = S::status(&entity);
        if current != ApprovalStatus::Pending {
            return Err(AppError::Conflict(format!(
                "{} {id} is already {}",
                S::KIND.as_str(),
                current.as_str()
            )));
        }

        let change = ApprovalChange {
            status,
            decided_by: caller.identity.clone(),
            reason,
            decided_at: Utc::now().into(),
        };

        let decided = self
            .store
            .apply_decision(id, &change)
            .await?
            .ok_or_else(|| {
                AppError::Conflict(format!("{} {id} was decided concurrently", S::KIND.as_str()))
            })?;

        tracing::info!(
            kind = S::KIND.as_str(),
            entity_id = %id,
            status = status.as_str(),
            decided_by = %caller.identity,
            "Approval decided"
        );

        publish_event(
            self.event_publisher.as_ref(),
            TransportEvent::ApprovalDecided {
                kind: S::KIND,
                entity_id: id.to_string(),
                approved: status == ApprovalStatus::Approved,
                decided_by: caller.identity.clone(),
            },
        )
        .await;

        Ok(decided)
    }
}

/// Student registrations. Approval issues a QR identifier.
#[derive(Clone)]
pub struct StudentApprovalStore {
    db: Arc<DatabaseConnection>,
    student_repo: StudentRepository,
    id_gen: IdGenerator,
}

impl StudentApprovalStore {
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>, student_repo: StudentRepository) -> Self {
        Self {
            db,
            student_repo,
            id_gen: IdGenerator::new(),
        }
    }
}

#[async_trait]
impl ApprovalStore for StudentApprovalStore {
    type Entity = student::Model;

    const KIND: ApprovalKind = ApprovalKind::Student;

    async fn find(&self, id: &str) -> AppResult<Option<student::Model>> {
        self.student_repo.find_by_id(id).await
    }

    fn status(entity: &student::Model) -> ApprovalStatus {
        entity.approval_status
    }

    async fn find_pending(&self, limit: u64, offset: u64) -> AppResult<Vec<student::Model>> {
        self.student_repo.find_pending(limit, offset).await
    }

    async fn apply_decision(
        &self,
        id: &str,
        change: &ApprovalChange,
    ) -> AppResult<Option<student::Model>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if self.student_repo.decide(&txn, id, change).await? == 0 {
            return Ok(None);
        }

        if change.status == ApprovalStatus::Approved {
            let qr_code = self.id_gen.generate_qr_code();
            self.student_repo.assign_qr_code(&txn, id, &qr_code).await?;
        }

        let student = self.student_repo.lock_by_id(&txn, id).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(student)
    }
}

/// Driver applications. Approval copies the vehicle onto the student.
#[derive(Clone)]
pub struct DriverApplicationApprovalStore {
    db: Arc<DatabaseConnection>,
    application_repo: DriverApplicationRepository,
    student_repo: StudentRepository,
}

impl DriverApplicationApprovalStore {
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        application_repo: DriverApplicationRepository,
        student_repo: StudentRepository,
    ) -> Self {
        Self {
            db,
            application_repo,
            student_repo,
        }
    }
}

#[async_trait]
impl ApprovalStore for DriverApplicationApprovalStore {
    type Entity = driver_application::Model;

    const KIND: ApprovalKind = ApprovalKind::DriverApplication;

    async fn find(&self, id: &str) -> AppResult<Option<driver_application::Model>> {
        self.application_repo.find_by_id(id).await
    }

    fn status(entity: &driver_application::Model) -> ApprovalStatus {
        entity.status
    }

    async fn find_pending(
        &self,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<driver_application::Model>> {
        self.application_repo.find_pending(limit, offset).await
    }

    async fn apply_decision(
        &self,
        id: &str,
        change: &ApprovalChange,
    ) -> AppResult<Option<driver_application::Model>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if self.application_repo.decide(&txn, id, change).await? == 0 {
            return Ok(None);
        }

        let application = self
            .application_repo
            .find_by_id_in(&txn, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("driver_application {id}")))?;

        if change.status == ApprovalStatus::Approved {
            let vehicle = VehicleDescriptor {
                make: application.vehicle_make.clone(),
                model: application.vehicle_model.clone(),
                color: application.vehicle_color.clone(),
                plate: application.vehicle_plate.clone(),
            };
            self.student_repo
                .set_vehicle(&txn, &application.student_id, &vehicle)
                .await?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Some(application))
    }
}

/// Event payment proofs. A decision settles the owning booking.
#[derive(Clone)]
pub struct PaymentProofApprovalStore {
    db: Arc<DatabaseConnection>,
    proof_repo: PaymentProofRepository,
    booking_repo: EventBookingRepository,
}

impl PaymentProofApprovalStore {
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        proof_repo: PaymentProofRepository,
        booking_repo: EventBookingRepository,
    ) -> Self {
        Self {
            db,
            proof_repo,
            booking_repo,
        }
    }
}

#[async_trait]
impl ApprovalStore for PaymentProofApprovalStore {
    type Entity = payment_proof::Model;

    const KIND: ApprovalKind = ApprovalKind::PaymentProof;

    async fn find(&self, id: &str) -> AppResult<Option<payment_proof::Model>> {
        self.proof_repo.find_by_id(id).await
    }

    fn status(entity: &payment_proof::Model) -> ApprovalStatus {
        entity.status
    }

    async fn find_pending(&self, limit: u64, offset: u64) -> AppResult<Vec<payment_proof::Model>> {
        self.proof_repo.find_pending(limit, offset).await
    }

    async fn apply_decision(
        &self,
        id: &str,
        change: &ApprovalChange,
    ) -> AppResult<Option<payment_proof::Model>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if self.proof_repo.decide(&txn, id, change).await? == 0 {
            return Ok(None);
        }

        let proof = self
            .proof_repo
            .find_by_id_in(&txn, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("payment_proof {id}")))?;

        let payment_status = if change.status == ApprovalStatus::Approved {
            PaymentStatus::Approved
        } else {
            PaymentStatus::Rejected
        };
        self.booking_repo
            .set_payment_status(&txn, &proof.booking_id, payment_status)
            .await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Some(proof))
    }
}

/// Student registration approvals.
pub type StudentApprovalService = ApprovalWorkflow<StudentApprovalStore>;
/// Driver elevation approvals.
pub type DriverApprovalService = ApprovalWorkflow<DriverApplicationApprovalStore>;
/// Payment proof verification.
pub type PaymentApprovalService = ApprovalWorkflow<PaymentProofApprovalStore>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::event_publisher::testing::RecordingEventPublisher;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use unibus_common::QR_CODE_PREFIX;

    fn create_test_student(id: &str, status: ApprovalStatus) -> student::Model {
        student::Model {
            id: id.to_string(),
            account_id: id.to_string(),
            full_name: "Ana Silva".to_string(),
            student_number: format!("2024{id}"),
            university: "ISPTEC".to_string(),
            approval_status: status,
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
            vehicle_make: None,
            vehicle_model: None,
            vehicle_color: None,
            vehicle_plate: None,
            qr_code: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_application(id: &str, status: ApprovalStatus) -> driver_application::Model {
        driver_application::Model {
            id: id.to_string(),
            student_id: "s1".to_string(),
            vehicle_make: "Toyota".to_string(),
            vehicle_model: "Corolla".to_string(),
            vehicle_color: "Branco".to_string(),
            vehicle_plate: "LD-12-34-AB".to_string(),
            status,
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
            created_at: Utc::now().into(),
        }
    }

    fn create_test_proof(id: &str, status: ApprovalStatus) -> payment_proof::Model {
        payment_proof::Model {
            id: id.to_string(),
            booking_id: "bk1".to_string(),
            file_reference: "uploads/receipt-1.pdf".to_string(),
            status,
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
            created_at: Utc::now().into(),
        }
    }

    fn exec_rows(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn student_workflow(db: MockDatabase) -> StudentApprovalService {
        let db = Arc::new(db.into_connection());
        ApprovalWorkflow::new(StudentApprovalStore::new(
            db.clone(),
            StudentRepository::new(db),
        ))
    }

    #[tokio::test]
    async fn test_reject_with_blank_reason_touches_nothing() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let workflow = ApprovalWorkflow::new(StudentApprovalStore::new(
            db.clone(),
            StudentRepository::new(db.clone()),
        ));

        let result = workflow
            .reject(&CallerContext::admin("admin1"), "s1", "   ")
            .await;

        match result {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "reason required"),
            other => panic!("Expected Validation, got {other:?}"),
        }

        drop(workflow);
        let db = Arc::try_unwrap(db).ok().unwrap();
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn test_approve_requires_admin() {
        let workflow = student_workflow(MockDatabase::new(DatabaseBackend::Postgres));

        let result = workflow.approve(&CallerContext::student("s2"), "s1").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_approve_unknown_student_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<student::Model>::new()]);
        let workflow = student_workflow(db);

        let result = workflow.approve(&CallerContext::admin("admin1"), "nope").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_approve_student_issues_qr_code() {
        let mut approved = create_test_student("s1", ApprovalStatus::Approved);
        approved.approved_by = Some("admin1".to_string());
        approved.qr_code = Some(format!("{QR_CODE_PREFIX}ABC"));

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_student("s1", ApprovalStatus::Pending)]])
            .append_exec_results([exec_rows(1), exec_rows(1)])
            .append_query_results([[approved]]);

        let recorder = Arc::new(RecordingEventPublisher::default());
        let mut workflow = student_workflow(db);
        workflow.set_event_publisher(recorder.clone());

        let student = workflow
            .approve(&CallerContext::admin("admin1"), "s1")
            .await
            .unwrap();

        assert_eq!(student.approval_status, ApprovalStatus::Approved);
        assert!(student.qr_code.unwrap().starts_with(QR_CODE_PREFIX));
        assert!(matches!(
            recorder.events().as_slice(),
            [TransportEvent::ApprovalDecided { kind: ApprovalKind::Student, approved: true, .. }]
        ));
    }

    #[tokio::test]
    async fn test_reapproving_is_conflict() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_student("s1", ApprovalStatus::Approved)]]);
        let workflow = student_workflow(db);

        let result = workflow.approve(&CallerContext::admin("admin1"), "s1").await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_lost_race_is_conflict() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_student("s1", ApprovalStatus::Pending)]])
            .append_exec_results([exec_rows(0)]);
        let workflow = student_workflow(db);

        let result = workflow
            .reject(&CallerContext::admin("admin1"), "s1", "Documento ilegível")
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_reject_student_records_trimmed_reason() {
        let mut rejected = create_test_student("s1", ApprovalStatus::Rejected);
        rejected.rejection_reason = Some("Documento ilegível".to_string());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_student("s1", ApprovalStatus::Pending)]])
            .append_exec_results([exec_rows(1)])
            .append_query_results([[rejected]]);
        let workflow = student_workflow(db);

        let student = workflow
            .reject(&CallerContext::admin("admin1"), "s1", "  Documento ilegível ")
            .await
            .unwrap();

        assert_eq!(student.approval_status, ApprovalStatus::Rejected);
        assert_eq!(student.rejection_reason.as_deref(), Some("Documento ilegível"));
        assert!(student.qr_code.is_none());
    }

    #[tokio::test]
    async fn test_approve_driver_application_sets_vehicle() {
        let mut approved = create_test_application("a1", ApprovalStatus::Approved);
        approved.approved_by = Some("admin1".to_string());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_application("a1", ApprovalStatus::Pending)]])
            .append_exec_results([exec_rows(1)])
            .append_query_results([[approved]])
            .append_exec_results([exec_rows(1)]);
        let db = Arc::new(db.into_connection());
        let workflow = ApprovalWorkflow::new(DriverApplicationApprovalStore::new(
            db.clone(),
            DriverApplicationRepository::new(db.clone()),
            StudentRepository::new(db.clone()),
        ));

        let application = workflow
            .approve(&CallerContext::admin("admin1"), "a1")
            .await
            .unwrap();
        assert_eq!(application.status, ApprovalStatus::Approved);
        assert_eq!(application.approved_by.as_deref(), Some("admin1"));
    }

    #[tokio::test]
    async fn test_reject_payment_proof_settles_booking() {
        let mut rejected = create_test_proof("p1", ApprovalStatus::Rejected);
        rejected.rejection_reason = Some("Valor errado".to_string());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_proof("p1", ApprovalStatus::Pending)]])
            .append_exec_results([exec_rows(1)])
            .append_query_results([[rejected]])
            .append_exec_results([exec_rows(1)]);
        let db = Arc::new(db.into_connection());
        let workflow = ApprovalWorkflow::new(PaymentProofApprovalStore::new(
            db.clone(),
            PaymentProofRepository::new(db.clone()),
            EventBookingRepository::new(db),
        ));

        let proof = workflow
            .reject(&CallerContext::admin("admin1"), "p1", "Valor errado")
            .await
            .unwrap();

        assert_eq!(proof.status, ApprovalStatus::Rejected);
        assert_eq!(proof.booking_id, "bk1");
    }

    #[tokio::test]
    async fn test_get_pending_requires_admin() {
        let workflow = student_workflow(MockDatabase::new(DatabaseBackend::Postgres));

        let result = workflow
            .get_pending(&CallerContext::student("s1"), DEFAULT_PENDING_LIMIT, 0)
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_get_pending_oldest_first() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![
            create_test_student("s1", ApprovalStatus::Pending),
            create_test_student("s2", ApprovalStatus::Pending),
        ]]);
        let workflow = student_workflow(db);

        let pending = workflow
            .get_pending(&CallerContext::admin("admin1"), DEFAULT_PENDING_LIMIT, 0)
            .await
            .unwrap();

        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].id, "s1");
    }
}
