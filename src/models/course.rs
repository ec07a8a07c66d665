use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A weekly training course. `id` comes from the club's export and is
/// stable across re-imports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub training_type: String,
    pub weekday: String,
    pub start_time: String,
    pub end_time: String,
    /// `None` means the course has no known start.
    pub first_schedule: Option<NaiveDate>,
    /// `None` means no end date was recorded.
    pub last_schedule: Option<NaiveDate>,
    pub trainer_names: String,
}
