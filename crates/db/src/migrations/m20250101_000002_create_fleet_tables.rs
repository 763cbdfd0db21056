//! Create route, bus and schedule tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Route::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Route::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Route::Name).string_len(128).not_null())
                    .col(ColumnDef::new(Route::Origin).string_len(256).not_null())
                    .col(ColumnDef::new(Route::Destination).string_len(256).not_null())
                    .col(
                        ColumnDef::new(Route::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Bus::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Bus::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Bus::Number).string_len(32).not_null().unique_key())
                    .col(
                        ColumnDef::new(Bus::Capacity)
                            .integer()
                            .not_null()
                            .check(Expr::col(Bus::Capacity).gte(0)),
                    )
                    .col(ColumnDef::new(Bus::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Bus::RouteId).string_len(32))
                    .col(
                        ColumnDef::new(Bus::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bus_route")
                            .from(Bus::Table, Bus::RouteId)
                            .to(Route::Table, Route::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Schedule::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Schedule::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Schedule::RouteId).string_len(32).not_null())
                    .col(ColumnDef::new(Schedule::BusId).string_len(32))
                    .col(
                        ColumnDef::new(Schedule::DayOfWeek)
                            .small_integer()
                            .not_null()
                            .check(Expr::col(Schedule::DayOfWeek).between(0, 6)),
                    )
                    .col(ColumnDef::new(Schedule::DepartureTime).time().not_null())
                    .col(ColumnDef::new(Schedule::IsActive).boolean().not_null().default(true))
                    .col(
                        ColumnDef::new(Schedule::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_schedule_route")
                            .from(Schedule::Table, Schedule::RouteId)
                            .to(Route::Table, Route::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_schedule_bus")
                            .from(Schedule::Table, Schedule::BusId)
                            .to(Bus::Table, Bus::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (route_id, day_of_week) - timetable lookup
        manager
            .create_index(
                Index::create()
                    .name("idx_schedule_route_day")
                    .table(Schedule::Table)
                    .col(Schedule::RouteId)
                    .col(Schedule::DayOfWeek)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Schedule::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Bus::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Route::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Route {
    Table,
    Id,
    Name,
    Origin,
    Destination,
    CreatedAt,
}

#[derive(Iden)]
enum Bus {
    Table,
    Id,
    Number,
    Capacity,
    IsActive,
    RouteId,
    CreatedAt,
}

#[derive(Iden)]
enum Schedule {
    Table,
    Id,
    RouteId,
    BusId,
    DayOfWeek,
    DepartureTime,
    IsActive,
    CreatedAt,
}
