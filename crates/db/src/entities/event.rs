//! Campus event entity (transport is sold per event).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::event_booking::TripType;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub title: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    pub venue: String,

    pub event_date: DateTimeWithTimeZone,

    // Fee table, whole currency units
    pub fee_one_way: i64,
    pub fee_return_only: i64,
    pub fee_round_trip: i64,

    pub is_active: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::event_booking::Entity")]
    EventBooking,
}

impl Related<super::event_booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EventBooking.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Price of a trip of the given type for this event.
    #[must_use]
    pub const fn fee_for(&self, trip_type: TripType) -> i64 {
        match trip_type {
            TripType::OneWay => self.fee_one_way,
            TripType::ReturnOnly => self.fee_return_only,
            TripType::RoundTrip => self.fee_round_trip,
        }
    }
}
