//! Payment proof entity attached to an event booking.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::student::ApprovalStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_proof")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub booking_id: String,

    /// Opaque reference to the uploaded receipt
    pub file_reference: String,

    pub status: ApprovalStatus,

    #[sea_orm(nullable)]
    pub approved_by: Option<String>,

    #[sea_orm(nullable)]
    pub approved_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(column_type = "Text", nullable)]
    pub rejection_reason: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::event_booking::Entity",
        from = "Column::BookingId",
        to = "super::event_booking::Column::Id",
        on_delete = "Cascade"
    )]
    EventBooking,
}

impl Related<super::event_booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EventBooking.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
