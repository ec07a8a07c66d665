use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A member was present at a course on a date. Absence has no row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Participation {
    pub member_id: i64,
    pub course_id: i64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantDto {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub notes: String,
    pub present: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AttendanceRequest {
    pub present: bool,
}
