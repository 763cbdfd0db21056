//! Create `bus_reservation` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BusReservation::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BusReservation::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BusReservation::StudentId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(BusReservation::BusId).string_len(32).not_null())
                    .col(ColumnDef::new(BusReservation::ScheduleId).string_len(32))
                    .col(
                        ColumnDef::new(BusReservation::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(BusReservation::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(BusReservation::CancelledAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(BusReservation::CancelledBy).string_len(64))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bus_reservation_student")
                            .from(BusReservation::Table, BusReservation::StudentId)
                            .to(Student::Table, Student::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bus_reservation_bus")
                            .from(BusReservation::Table, BusReservation::BusId)
                            .to(Bus::Table, Bus::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bus_reservation_schedule")
                            .from(BusReservation::Table, BusReservation::ScheduleId)
                            .to(Schedule::Table, Schedule::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (bus_id, status) - occupancy aggregation
        manager
            .create_index(
                Index::create()
                    .name("idx_bus_reservation_bus_status")
                    .table(BusReservation::Table)
                    .col(BusReservation::BusId)
                    .col(BusReservation::Status)
                    .to_owned(),
            )
            .await?;

        // At most one active reservation per student
        manager
            .get_connection()
            .execute_unprepared(
                r"
                CREATE UNIQUE INDEX IF NOT EXISTS uq_bus_reservation_active_student
                ON bus_reservation (student_id)
                WHERE status = 'active';
                ",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BusReservation::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum BusReservation {
    Table,
    Id,
    StudentId,
    BusId,
    ScheduleId,
    Status,
    CreatedAt,
    CancelledAt,
    CancelledBy,
}

#[derive(Iden)]
enum Student {
    Table,
    Id,
}

#[derive(Iden)]
enum Bus {
    Table,
    Id,
}

#[derive(Iden)]
enum Schedule {
    Table,
    Id,
}
