//! ID generation utilities.

use ulid::Ulid;
use uuid::Uuid;

/// Prefix carried by every QR payload issued to students.
pub const QR_CODE_PREFIX: &str = "UNB-";

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// ULIDs are lexicographically sortable, so ordering rows by ID
    /// approximates ordering by creation time.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate an opaque QR identifier for a student.
    ///
    /// The payload carries no meaning beyond identity; scanners look it up.
    #[must_use]
    pub fn generate_qr_code(&self) -> String {
        // Random, no time component
        format!(
            "{QR_CODE_PREFIX}{}",
            Uuid::new_v4().simple().to_string().to_uppercase()
        )
    }
}
