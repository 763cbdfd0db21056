//! Fleet management: routes, buses and timetables. Admin only.

use chrono::{NaiveTime, Utc};
use sea_orm::Set;
use serde::Deserialize;
use unibus_common::{AppError, AppResult, IdGenerator};
use unibus_db::{
    entities::{bus, route, schedule},
    repositories::{BusRepository, RouteRepository, ScheduleRepository},
};
use validator::Validate;

use crate::context::CallerContext;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRouteInput {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(length(min = 1, max = 256))]
    pub origin: String,
    #[validate(length(min = 1, max = 256))]
    pub destination: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBusInput {
    #[validate(length(min = 1, max = 32))]
    pub number: String,
    #[validate(range(min = 1, max = 200))]
    pub capacity: i32,
    pub route_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleInput {
    pub route_id: String,
    pub bus_id: Option<String>,
    /// 0 = Sunday
    #[validate(range(min = 0, max = 6))]
    pub day_of_week: i16,
    /// `HH:MM`, 24-hour clock
    pub departure_time: String,
}

/// Fleet service for business logic.
#[derive(Clone)]
pub struct FleetService {
    route_repo: RouteRepository,
    bus_repo: BusRepository,
    schedule_repo: ScheduleRepository,
    id_gen: IdGenerator,
}

impl FleetService {
    /// Create a new fleet service.
    #[must_use]
    pub const fn new(
        route_repo: RouteRepository,
        bus_repo: BusRepository,
        schedule_repo: ScheduleRepository,
    ) -> Self {
        Self {
            route_repo,
            bus_repo,
            schedule_repo,
            id_gen: IdGenerator::new(),
        }
    }

    pub async fn create_route(
        &self,
        caller: &CallerContext,
        input: CreateRouteInput,
    ) -> AppResult<route::Model> {
        caller.require_admin()?;
        input.validate()?;

        let model = route::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name.trim().to_string()),
            origin: Set(input.origin.trim().to_string()),
            destination: Set(input.destination.trim().to_string()),
            created_at: Set(Utc::now().into()),
        };

        let route = self.route_repo.create(model).await?;
        tracing::info!(route_id = %route.id, name = %route.name, "Route created");
        Ok(route)
    }

    pub async fn list_routes(&self) -> AppResult<Vec<route::Model>> {
        self.route_repo.find_all().await
    }

    pub async fn create_bus(
        &self,
        caller: &CallerContext,
        input: CreateBusInput,
    ) -> AppResult<bus::Model> {
        caller.require_admin()?;
        input.validate()?;

        if let Some(route_id) = input.route_id.as_deref() {
            self.route_repo.get_by_id(route_id).await?;
        }

        let model = bus::ActiveModel {
            id: Set(self.id_gen.generate()),
            number: Set(input.number.trim().to_string()),
            capacity: Set(input.capacity),
            is_active: Set(true),
            route_id: Set(input.route_id),
            created_at: Set(Utc::now().into()),
        };

        let bus = self.bus_repo.create(model).await?;
        tracing::info!(bus_id = %bus.id, number = %bus.number, capacity = bus.capacity, "Bus created");
        Ok(bus)
    }

    /// Enable or disable reservations on a bus.
    ///
    /// Existing reservations are kept when a bus is disabled.
    pub async fn set_bus_active(
        &self,
        caller: &CallerContext,
        bus_id: &str,
        is_active: bool,
    ) -> AppResult<bus::Model> {
        caller.require_admin()?;

        let bus = self.bus_repo.set_active(bus_id, is_active).await?;
        tracing::info!(bus_id = %bus.id, is_active, "Bus availability changed");
        Ok(bus)
    }

    pub async fn list_buses(&self, active_only: bool) -> AppResult<Vec<bus::Model>> {
        self.bus_repo.find_all(active_only).await
    }

    pub async fn create_schedule(
        &self,
        caller: &CallerContext,
        input: CreateScheduleInput,
    ) -> AppResult<schedule::Model> {
        caller.require_admin()?;
        input.validate()?;

        let departure_time = parse_departure_time(&input.departure_time)?;
        self.route_repo.get_by_id(&input.route_id).await?;
        if let Some(bus_id) = input.bus_id.as_deref() {
            self.bus_repo.get_by_id(bus_id).await?;
        }

        let model = schedule::ActiveModel {
            id: Set(self.id_gen.generate()),
            route_id: Set(input.route_id),
            bus_id: Set(input.bus_id),
            day_of_week: Set(input.day_of_week),
            departure_time: Set(departure_time),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
        };

        let schedule = self.schedule_repo.create(model).await?;
        tracing::info!(
            schedule_id = %schedule.id,
            route_id = %schedule.route_id,
            day_of_week = schedule.day_of_week,
            "Schedule created"
        );
        Ok(schedule)
    }

    pub async fn list_schedules(&self, route_id: &str) -> AppResult<Vec<schedule::Model>> {
        self.route_repo.get_by_id(route_id).await?;
        self.schedule_repo.find_by_route(route_id).await
    }
}

fn parse_departure_time(raw: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|_| AppError::Validation(format!("departureTime must be HH:MM, got {raw:?}")))
}
