//! Ride offer entity (student carpool).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ride lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum RideStatus {
    #[sea_orm(string_value = "available")]
    Available,
    #[sea_orm(string_value = "full")]
    Full,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl RideStatus {
    /// Completed and cancelled rides never change again.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ride")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Student offering the ride
    pub driver_id: String,

    pub from_location: String,

    pub to_location: String,

    pub start_time: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub end_time: Option<DateTimeWithTimeZone>,

    /// Seats offered to passengers
    pub available_seats: i32,

    /// Whole currency units; 0 is a free (solidarity) ride
    pub price: i64,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    pub status: RideStatus,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::DriverId",
        to = "super::student::Column::Id",
        on_delete = "Cascade"
    )]
    Driver,
    #[sea_orm(has_many = "super::ride_request::Entity")]
    RideRequest,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Driver.def()
    }
}

impl Related<super::ride_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RideRequest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
