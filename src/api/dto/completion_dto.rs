//! Write-path DTOs.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{ActivityCompletionRecord, StudentProgress};

/// Response body for `POST /activity-completions` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
pub struct RecordCompletionResponse {
    /// The stored log row.
    pub record: ActivityCompletionRecord,
    /// The student's progress in the game after this attempt.
    pub progress: StudentProgress,
}
