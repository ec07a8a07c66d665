use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Member {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    /// `None` when the sign-up date is unknown; such members count as
    /// active from the beginning of time.
    pub sign_up_date: Option<NaiveDate>,
    /// `None` when the membership has not been cancelled.
    pub cancellation_date: Option<NaiveDate>,
    pub age: i32,
    pub notes: String,
}

impl Member {
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.sign_up_date.is_none_or(|d| d <= date)
            && self.cancellation_date.is_none_or(|d| d >= date)
    }
}

/// Enrollment edge between a member and a course.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, FromRow,
)]
pub struct MemberCourse {
    pub member_id: i64,
    pub course_id: i64,
}
