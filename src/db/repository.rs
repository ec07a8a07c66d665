use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use crate::models::{Course, Member, MemberCourse, Participation};

const COURSE_COLUMNS: &str = "id, name, location, training_type, weekday, start_time, end_time, first_schedule, last_schedule, trainer_names";
const MEMBER_COLUMNS: &str = "id, first_name, last_name, email, phone, sign_up_date, cancellation_date, age, notes";

pub async fn upsert_course(db: &SqlitePool, course: &Course) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO courses
            (id, name, location, training_type, weekday, start_time, end_time,
            first_schedule, last_schedule, trainer_names)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            location = excluded.location,
            training_type = excluded.training_type,
            weekday = excluded.weekday,
            start_time = excluded.start_time,
            end_time = excluded.end_time,
            first_schedule = excluded.first_schedule,
            last_schedule = excluded.last_schedule,
            trainer_names = excluded.trainer_names
        "#,
    )
    .bind(course.id)
    .bind(&course.name)
    .bind(&course.location)
    .bind(&course.training_type)
    .bind(&course.weekday)
    .bind(&course.start_time)
    .bind(&course.end_time)
    .bind(course.first_schedule)
    .bind(course.last_schedule)
    .bind(&course.trainer_names)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn find_course_by_id(db: &SqlitePool, id: i64) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn fetch_all_courses(db: &SqlitePool) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses ORDER BY id ASC, start_time ASC"
    ))
    .fetch_all(db)
    .await
}

/// Courses whose schedule overlaps `[from, until]`. Missing bounds are open.
pub async fn fetch_courses_active_between(
    db: &SqlitePool,
    from: NaiveDate,
    until: NaiveDate,
) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        r#"
        SELECT {COURSE_COLUMNS}
        FROM courses
        WHERE (first_schedule IS NULL OR first_schedule <= ?1)
          AND (last_schedule IS NULL OR last_schedule >= ?2)
        ORDER BY id ASC, start_time ASC
        "#
    ))
    .bind(until)
    .bind(from)
    .fetch_all(db)
    .await
}

pub async fn upsert_member(db: &SqlitePool, member: &Member) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO members
            (id, first_name, last_name, email, phone, sign_up_date,
            cancellation_date, age, notes)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(id) DO UPDATE SET
            first_name = excluded.first_name,
            last_name = excluded.last_name,
            email = excluded.email,
            phone = excluded.phone,
            sign_up_date = excluded.sign_up_date,
            cancellation_date = excluded.cancellation_date,
            age = excluded.age,
            notes = excluded.notes
        "#,
    )
    .bind(member.id)
    .bind(&member.first_name)
    .bind(&member.last_name)
    .bind(&member.email)
    .bind(&member.phone)
    .bind(member.sign_up_date)
    .bind(member.cancellation_date)
    .bind(member.age)
    .bind(&member.notes)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn find_member_by_id(db: &SqlitePool, id: i64) -> Result<Option<Member>, sqlx::Error> {
    sqlx::query_as::<_, Member>(&format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = ?"))
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Members with the given ids, sorted by name. With `active_on`, only
/// members signed up on or before and not cancelled before that date.
pub async fn fetch_members_by_ids(
    db: &SqlitePool,
    ids: &[i64],
    active_on: Option<NaiveDate>,
) -> Result<Vec<Member>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {MEMBER_COLUMNS} FROM members WHERE id IN ("
    ));
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    if let Some(date) = active_on {
        query
            .push(" AND (sign_up_date IS NULL OR sign_up_date <= ")
            .push_bind(date)
            .push(") AND (cancellation_date IS NULL OR cancellation_date >= ")
            .push_bind(date)
            .push(")");
    }
    query.push(" ORDER BY first_name ASC, last_name ASC, id ASC");

    query.build_query_as::<Member>().fetch_all(db).await
}

pub async fn fetch_member_ids_for_course(
    db: &SqlitePool,
    course_id: i64,
) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT member_id FROM member_courses WHERE course_id = ? ORDER BY member_id",
    )
    .bind(course_id)
    .fetch_all(db)
    .await
}

pub async fn fetch_enrollments(db: &SqlitePool) -> Result<Vec<MemberCourse>, sqlx::Error> {
    sqlx::query_as::<_, MemberCourse>(
        "SELECT member_id, course_id FROM member_courses ORDER BY member_id, course_id",
    )
    .fetch_all(db)
    .await
}

/// Removes every enrollment. Meant to run inside the transaction that
/// inserts the replacement set.
pub async fn clear_enrollments(conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM member_courses")
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn insert_enrollment(
    conn: &mut SqliteConnection,
    edge: &MemberCourse,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO member_courses (member_id, course_id) VALUES (?1, ?2) ON CONFLICT DO NOTHING",
    )
    .bind(edge.member_id)
    .bind(edge.course_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn upsert_participation(
    db: &SqlitePool,
    participation: &Participation,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO participations (member_id, course_id, date)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(member_id, course_id, date) DO NOTHING
        "#,
    )
    .bind(participation.member_id)
    .bind(participation.course_id)
    .bind(participation.date)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn delete_participation(
    db: &SqlitePool,
    member_id: i64,
    course_id: i64,
    date: NaiveDate,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM participations WHERE member_id = ?1 AND course_id = ?2 AND date = ?3",
    )
    .bind(member_id)
    .bind(course_id)
    .bind(date)
    .execute(db)
    .await?
    .rows_affected();

    Ok(result > 0)
}

pub async fn fetch_participations(
    db: &SqlitePool,
    course_id: i64,
    date: NaiveDate,
) -> Result<Vec<Participation>, sqlx::Error> {
    sqlx::query_as::<_, Participation>(
        "SELECT member_id, course_id, date FROM participations WHERE course_id = ?1 AND date = ?2",
    )
    .bind(course_id)
    .bind(date)
    .fetch_all(db)
    .await
}

pub async fn fetch_participations_between(
    db: &SqlitePool,
    min_date: NaiveDate,
    max_date: NaiveDate,
) -> Result<Vec<Participation>, sqlx::Error> {
    sqlx::query_as::<_, Participation>(
        r#"
        SELECT member_id, course_id, date
        FROM participations
        WHERE date >= ?1 AND date <= ?2
        ORDER BY date ASC, course_id ASC, member_id ASC
        "#,
    )
    .bind(min_date)
    .bind(max_date)
    .fetch_all(db)
    .await
}
