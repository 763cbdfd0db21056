//! Student entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Three-state approval gate shared by students, driver applications and payment proofs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum ApprovalStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl ApprovalStatus {
    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "student")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Account identity this student profile belongs to
    #[sea_orm(unique)]
    pub account_id: String,

    pub full_name: String,

    #[sea_orm(unique)]
    pub student_number: String,

    pub university: String,

    pub approval_status: ApprovalStatus,

    /// Admin who decided the registration
    #[sea_orm(nullable)]
    pub approved_by: Option<String>,

    #[sea_orm(nullable)]
    pub approved_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(column_type = "Text", nullable)]
    pub rejection_reason: Option<String>,

    // Vehicle descriptor, set once a driver application is approved
    #[sea_orm(nullable)]
    pub vehicle_make: Option<String>,
    #[sea_orm(nullable)]
    pub vehicle_model: Option<String>,
    #[sea_orm(nullable)]
    pub vehicle_color: Option<String>,
    #[sea_orm(nullable)]
    pub vehicle_plate: Option<String>,

    /// Opaque QR payload, issued on approval
    #[sea_orm(unique, nullable)]
    pub qr_code: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bus_reservation::Entity")]
    BusReservation,
    #[sea_orm(has_many = "super::ride::Entity")]
    Ride,
}

impl Related<super::bus_reservation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BusReservation.def()
    }
}

impl Related<super::ride::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ride.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether the student has a registered vehicle (i.e. was elevated to driver).
    #[must_use]
    pub const fn is_driver(&self) -> bool {
        self.vehicle_plate.is_some()
    }
}
