//! Create `driver_application` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DriverApplication::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DriverApplication::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DriverApplication::StudentId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DriverApplication::VehicleMake)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DriverApplication::VehicleModel)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DriverApplication::VehicleColor)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DriverApplication::VehiclePlate)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DriverApplication::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(DriverApplication::ApprovedBy).string_len(64))
                    .col(ColumnDef::new(DriverApplication::ApprovedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(DriverApplication::RejectionReason).text())
                    .col(
                        ColumnDef::new(DriverApplication::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_driver_application_student")
                            .from(DriverApplication::Table, DriverApplication::StudentId)
                            .to(Student::Table, Student::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (status, created_at) - oldest-first pending queue
        manager
            .create_index(
                Index::create()
                    .name("idx_driver_application_status_created_at")
                    .table(DriverApplication::Table)
                    .col(DriverApplication::Status)
                    .col(DriverApplication::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // One pending application per student
        manager
            .get_connection()
            .execute_unprepared(
                r"
                CREATE UNIQUE INDEX IF NOT EXISTS uq_driver_application_pending_student
                ON driver_application (student_id)
                WHERE status = 'pending';
                ",
            )
            .await?;

        // A rejected application always carries a reason
        manager
            .get_connection()
            .execute_unprepared(
                r"
                ALTER TABLE driver_application
                ADD CONSTRAINT chk_driver_application_rejection_reason
                CHECK (status <> 'rejected' OR length(trim(rejection_reason)) > 0);
                ",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DriverApplication::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum DriverApplication {
    Table,
    Id,
    StudentId,
    VehicleMake,
    VehicleModel,
    VehicleColor,
    VehiclePlate,
    Status,
    ApprovedBy,
    ApprovedAt,
    RejectionReason,
    CreatedAt,
}

#[derive(Iden)]
enum Student {
    Table,
    Id,
}
