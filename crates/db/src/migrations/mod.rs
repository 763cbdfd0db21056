//! Database migrations.
//!
//! Schema migrations for the transport database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_student_table;
mod m20250101_000002_create_fleet_tables;
mod m20250101_000003_create_bus_reservation_table;
mod m20250101_000004_create_ride_tables;
mod m20250101_000005_create_driver_application_table;
mod m20250101_000006_create_event_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_student_table::Migration),
            Box::new(m20250101_000002_create_fleet_tables::Migration),
            Box::new(m20250101_000003_create_bus_reservation_table::Migration),
            Box::new(m20250101_000004_create_ride_tables::Migration),
            Box::new(m20250101_000005_create_driver_application_table::Migration),
            Box::new(m20250101_000006_create_event_tables::Migration),
        ]
    }
}
