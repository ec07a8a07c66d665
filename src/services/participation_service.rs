use std::collections::HashSet;

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::{debug, error};

use crate::calendar::format_date;
use crate::db::repository;
use crate::error::AppError;
use crate::models::{ParticipantDto, Participation};

pub const EXPORT_HEADER: [&str; 3] = ["Date", "CourseID", "MemberID"];

pub struct ParticipationService {
    db: SqlitePool,
}

impl ParticipationService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Members enrolled in the course and active on `date`, each flagged
    /// with whether they attended.
    pub async fn participants(
        &self,
        course_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<ParticipantDto>, AppError> {
        let member_ids = repository::fetch_member_ids_for_course(&self.db, course_id).await?;
        let members = repository::fetch_members_by_ids(&self.db, &member_ids, Some(date)).await?;
        let present: HashSet<i64> = repository::fetch_participations(&self.db, course_id, date)
            .await?
            .into_iter()
            .map(|p| p.member_id)
            .collect();

        Ok(members
            .into_iter()
            .map(|member| ParticipantDto {
                present: present.contains(&member.id),
                id: member.id,
                first_name: member.first_name,
                last_name: member.last_name,
                phone: member.phone,
                notes: member.notes,
            })
            .collect())
    }

    /// Marks a member present (idempotent insert) or absent (delete).
    pub async fn set_attendance(
        &self,
        course_id: i64,
        date: NaiveDate,
        member_id: i64,
        present: bool,
    ) -> Result<(), AppError> {
        if present {
            let participation = Participation {
                member_id,
                course_id,
                date,
            };
            repository::upsert_participation(&self.db, &participation).await?;
        } else {
            let removed =
                repository::delete_participation(&self.db, member_id, course_id, date).await?;
            if !removed {
                debug!(
                    "member {} was not marked present for course {} on {}",
                    member_id, course_id, date
                );
            }
        }
        Ok(())
    }

    pub async fn export_csv(
        &self,
        min_date: NaiveDate,
        max_date: NaiveDate,
    ) -> Result<String, AppError> {
        let participations =
            repository::fetch_participations_between(&self.db, min_date, max_date).await?;
        render_export(&participations)
    }
}

fn render_export(participations: &[Participation]) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADER).map_err(export_failed)?;
    for p in participations {
        writer
            .write_record([
                format_date(p.date),
                p.course_id.to_string(),
                p.member_id.to_string(),
            ])
            .map_err(export_failed)?;
    }

    let bytes = writer.into_inner().map_err(|e| export_failed(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| {
        error!("export produced invalid UTF-8: {}", e);
        AppError::InternalServerError
    })
}

fn export_failed<E: std::fmt::Display>(err: E) -> AppError {
    error!("failed to write export: {}", err);
    AppError::InternalServerError
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;
    use crate::models::{Member, MemberCourse};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn renders_header_only_for_empty_export() {
        assert_eq!(render_export(&[]).unwrap(), "Date,CourseID,MemberID\n");
    }

    #[tokio::test]
    async fn test_set_attendance_is_idempotent() {
        let pool = connect_in_memory().await.unwrap();
        let service = ParticipationService::new(pool.clone());
        let day = date(2024, 1, 8);

        service.set_attendance(5, day, 1, true).await.unwrap();
        service.set_attendance(5, day, 1, true).await.unwrap();
        assert_eq!(repository::fetch_participations(&pool, 5, day).await.unwrap().len(), 1);

        service.set_attendance(5, day, 1, false).await.unwrap();
        service.set_attendance(5, day, 1, false).await.unwrap();
        assert!(repository::fetch_participations(&pool, 5, day).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_participants_flags_presence_for_active_members() {
        let pool = connect_in_memory().await.unwrap();
        let day = date(2024, 1, 8);

        for (id, name, cancelled) in [(1, "Anna", None), (2, "Ben", None), (3, "Cem", Some(date(2023, 12, 31)))] {
            let member = Member {
                id,
                first_name: name.to_string(),
                last_name: String::new(),
                email: String::new(),
                phone: String::new(),
                sign_up_date: None,
                cancellation_date: cancelled,
                age: 0,
                notes: String::new(),
            };
            repository::upsert_member(&pool, &member).await.unwrap();
        }
        let mut tx = pool.begin().await.unwrap();
        for member_id in [1, 2, 3] {
            repository::insert_enrollment(&mut tx, &MemberCourse { member_id, course_id: 5 })
                .await
                .unwrap();
        }
        tx.commit().await.unwrap();

        let service = ParticipationService::new(pool);
        service.set_attendance(5, day, 2, true).await.unwrap();

        let participants = service.participants(5, day).await.unwrap();
        let flags: Vec<(&str, bool)> = participants
            .iter()
            .map(|p| (p.first_name.as_str(), p.present))
            .collect();
        assert_eq!(flags, vec![("Anna", false), ("Ben", true)]);
    }

    #[tokio::test]
    async fn test_export_sorted_by_date_course_member() {
        let pool = connect_in_memory().await.unwrap();
        let service = ParticipationService::new(pool);

        service.set_attendance(7, date(2024, 1, 20), 1, true).await.unwrap();
        service.set_attendance(3, date(2024, 1, 20), 9, true).await.unwrap();
        service.set_attendance(3, date(2024, 1, 20), 2, true).await.unwrap();
        service.set_attendance(3, date(2024, 1, 5), 4, true).await.unwrap();
        service.set_attendance(3, date(2024, 2, 1), 4, true).await.unwrap();

        let csv = service
            .export_csv(date(2024, 1, 1), date(2024, 1, 31))
            .await
            .unwrap();
        assert_eq!(
            csv,
            "Date,CourseID,MemberID\n\
             2024-01-05,3,4\n\
             2024-01-20,3,2\n\
             2024-01-20,3,9\n\
             2024-01-20,7,1\n"
        );
    }
}
