//! Bus entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bus")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Fleet number painted on the bus (e.g. "TF-001")
    #[sea_orm(unique)]
    pub number: String,

    /// Seats available for reservation
    pub capacity: i32,

    pub is_active: bool,

    #[sea_orm(nullable)]
    pub route_id: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::route::Entity",
        from = "Column::RouteId",
        to = "super::route::Column::Id",
        on_delete = "SetNull"
    )]
    Route,
    #[sea_orm(has_many = "super::bus_reservation::Entity")]
    BusReservation,
}

impl Related<super::route::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Route.def()
    }
}

impl Related<super::bus_reservation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BusReservation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
