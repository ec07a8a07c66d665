use chrono::{Duration, NaiveDate};
use sqlx::SqlitePool;

use crate::calendar::Occurrences;
use crate::db::repository;
use crate::error::AppError;
use crate::models::Course;

/// How far around today a course schedule may reach and still be listed.
const ACTIVE_WINDOW_DAYS: i64 = 8;

pub struct CourseService {
    db: SqlitePool,
}

impl CourseService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn list_active(&self, today: NaiveDate) -> Result<Vec<Course>, AppError> {
        let window = Duration::days(ACTIVE_WINDOW_DAYS);
        let courses =
            repository::fetch_courses_active_between(&self.db, today - window, today + window)
                .await?;
        Ok(courses)
    }

    pub async fn occurrences(
        &self,
        course_id: i64,
        today: NaiveDate,
    ) -> Result<Occurrences, AppError> {
        let course = repository::find_course_by_id(&self.db, course_id)
            .await?
            .ok_or(AppError::NotFound)?;
        Ok(Occurrences::for_course_day(&course.weekday, today)?)
    }
}
