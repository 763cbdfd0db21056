//! Create `event`, `event_booking` and `payment_proof` tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Event::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Event::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Event::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Event::Description).text())
                    .col(ColumnDef::new(Event::Venue).string_len(256).not_null())
                    .col(ColumnDef::new(Event::EventDate).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Event::FeeOneWay).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Event::FeeReturnOnly).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Event::FeeRoundTrip).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Event::IsActive).boolean().not_null().default(true))
                    .col(
                        ColumnDef::new(Event::CreatedAt)
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
                    .table(EventBooking::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EventBooking::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EventBooking::EventId).string_len(32).not_null())
                    .col(ColumnDef::new(EventBooking::StudentId).string_len(32).not_null())
                    .col(ColumnDef::new(EventBooking::TripType).string_len(16).not_null())
                    .col(ColumnDef::new(EventBooking::Price).big_integer().not_null())
                    .col(
                        ColumnDef::new(EventBooking::PaymentStatus)
                            .string_len(24)
                            .not_null()
                            .default("awaiting_payment"),
                    )
                    .col(
                        ColumnDef::new(EventBooking::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_booking_event")
                            .from(EventBooking::Table, EventBooking::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_booking_student")
                            .from(EventBooking::Table, EventBooking::StudentId)
                            .to(Student::Table, Student::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (event_id, student_id) - one booking per event
        manager
            .create_index(
                Index::create()
                    .name("idx_event_booking_event_student")
                    .table(EventBooking::Table)
                    .col(EventBooking::EventId)
                    .col(EventBooking::StudentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PaymentProof::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaymentProof::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PaymentProof::BookingId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(PaymentProof::FileReference)
                            .string_len(1024)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentProof::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(PaymentProof::ApprovedBy).string_len(64))
                    .col(ColumnDef::new(PaymentProof::ApprovedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(PaymentProof::RejectionReason).text())
                    .col(
                        ColumnDef::new(PaymentProof::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_proof_booking")
                            .from(PaymentProof::Table, PaymentProof::BookingId)
                            .to(EventBooking::Table, EventBooking::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (status, created_at) - oldest-first pending queue
        manager
            .create_index(
                Index::create()
                    .name("idx_payment_proof_status_created_at")
                    .table(PaymentProof::Table)
                    .col(PaymentProof::Status)
                    .col(PaymentProof::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // A rejected proof always carries a reason
        manager
            .get_connection()
            .execute_unprepared(
                r"
                ALTER TABLE payment_proof
                ADD CONSTRAINT chk_payment_proof_rejection_reason
                CHECK (status <> 'rejected' OR length(trim(rejection_reason)) > 0);
                ",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PaymentProof::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EventBooking::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Event::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Event {
    Table,
    Id,
    Title,
    Description,
    Venue,
    EventDate,
    FeeOneWay,
    FeeReturnOnly,
    FeeRoundTrip,
    IsActive,
    CreatedAt,
}

#[derive(Iden)]
enum EventBooking {
    Table,
    Id,
    EventId,
    StudentId,
    TripType,
    Price,
    PaymentStatus,
    CreatedAt,
}

#[derive(Iden)]
enum PaymentProof {
    Table,
    Id,
    BookingId,
    FileReference,
    Status,
    ApprovedBy,
    ApprovedAt,
    RejectionReason,
    CreatedAt,
}

#[derive(Iden)]
enum Student {
    Table,
    Id,
}
