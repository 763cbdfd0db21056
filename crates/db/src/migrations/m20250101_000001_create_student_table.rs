//! Create student table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Student::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Student::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Student::AccountId).string_len(64).not_null().unique_key())
                    .col(ColumnDef::new(Student::FullName).string_len(256).not_null())
                    .col(ColumnDef::new(Student::StudentNumber).string_len(64).not_null().unique_key())
                    .col(ColumnDef::new(Student::University).string_len(256).not_null())
                    .col(
                        ColumnDef::new(Student::ApprovalStatus)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Student::ApprovedBy).string_len(64))
                    .col(ColumnDef::new(Student::ApprovedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Student::RejectionReason).text())
                    .col(ColumnDef::new(Student::VehicleMake).string_len(128))
                    .col(ColumnDef::new(Student::VehicleModel).string_len(128))
                    .col(ColumnDef::new(Student::VehicleColor).string_len(64))
                    .col(ColumnDef::new(Student::VehiclePlate).string_len(32))
                    .col(ColumnDef::new(Student::QrCode).string_len(64).unique_key())
                    .col(
                        ColumnDef::new(Student::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Student::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Index: (approval_status, created_at) - oldest-first pending queue
        manager
            .create_index(
                Index::create()
                    .name("idx_student_approval_status_created_at")
                    .table(Student::Table)
                    .col(Student::ApprovalStatus)
                    .col(Student::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // A rejected student always carries a reason
        manager
            .get_connection()
            .execute_unprepared(
                r"
                ALTER TABLE student
                ADD CONSTRAINT chk_student_rejection_reason
                CHECK (approval_status <> 'rejected' OR length(trim(rejection_reason)) > 0);
                ",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Student::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Student {
    Table,
    Id,
    AccountId,
    FullName,
    StudentNumber,
    University,
    ApprovalStatus,
    ApprovedBy,
    ApprovedAt,
    RejectionReason,
    VehicleMake,
    VehicleModel,
    VehicleColor,
    VehiclePlate,
    QrCode,
    CreatedAt,
    UpdatedAt,
}
