//! Create `ride` and `ride_request` tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Ride::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Ride::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Ride::DriverId).string_len(32).not_null())
                    .col(ColumnDef::new(Ride::FromLocation).string_len(256).not_null())
                    .col(ColumnDef::new(Ride::ToLocation).string_len(256).not_null())
                    .col(
                        ColumnDef::new(Ride::StartTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Ride::EndTime).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Ride::AvailableSeats)
                            .integer()
                            .not_null()
                            .check(Expr::col(Ride::AvailableSeats).gte(1)),
                    )
                    .col(
                        ColumnDef::new(Ride::Price)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Ride::Price).gte(0)),
                    )
                    .col(ColumnDef::new(Ride::Description).text())
                    .col(
                        ColumnDef::new(Ride::Status)
                            .string_len(16)
                            .not_null()
                            .default("available"),
                    )
                    .col(
                        ColumnDef::new(Ride::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Ride::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ride_driver")
                            .from(Ride::Table, Ride::DriverId)
                            .to(Student::Table, Student::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (status, start_time) - upcoming available rides
        manager
            .create_index(
                Index::create()
                    .name("idx_ride_status_start_time")
                    .table(Ride::Table)
                    .col(Ride::Status)
                    .col(Ride::StartTime)
                    .to_owned(),
            )
            .await?;

        // Index: driver_id (rides by driver)
        manager
            .create_index(
                Index::create()
                    .name("idx_ride_driver_id")
                    .table(Ride::Table)
                    .col(Ride::DriverId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RideRequest::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RideRequest::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RideRequest::RideId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(RideRequest::PassengerId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RideRequest::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(RideRequest::Message).text())
                    .col(
                        ColumnDef::new(RideRequest::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(RideRequest::DecidedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ride_request_ride")
                            .from(RideRequest::Table, RideRequest::RideId)
                            .to(Ride::Table, Ride::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ride_request_passenger")
                            .from(RideRequest::Table, RideRequest::PassengerId)
                            .to(Student::Table, Student::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (ride_id, status) - owner inbox and accepted counts
        manager
            .create_index(
                Index::create()
                    .name("idx_ride_request_ride_status")
                    .table(RideRequest::Table)
                    .col(RideRequest::RideId)
                    .col(RideRequest::Status)
                    .to_owned(),
            )
            .await?;

        // One outstanding request per (ride, passenger)
        manager
            .get_connection()
            .execute_unprepared(
                r"
                CREATE UNIQUE INDEX IF NOT EXISTS uq_ride_request_pending_pair
                ON ride_request (ride_id, passenger_id)
                WHERE status = 'pending';
                ",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RideRequest::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Ride::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Ride {
    Table,
    Id,
    DriverId,
    FromLocation,
    ToLocation,
    StartTime,
    EndTime,
    AvailableSeats,
    Price,
    Description,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum RideRequest {
    Table,
    Id,
    RideId,
    PassengerId,
    Status,
    Message,
    CreatedAt,
    DecidedAt,
}

#[derive(Iden)]
enum Student {
    Table,
    Id,
}
