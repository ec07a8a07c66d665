use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query};
use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::routing::post;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::calendar::parse_iso_date;
use crate::error::AppError;
use crate::import::{ImportReport, ImportService};
use crate::models::*;
use crate::services::{CourseService, ParticipationService};
use crate::state::AppState;

/// Upper bound for one import request.
pub const MAX_UPLOAD_BYTES: usize = 32 << 20;

const UPLOAD_FIELD: &str = "files";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportQueryParams {
    min_date: Option<String>,
    max_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FileReport {
    pub file_name: String,
    #[serde(flatten)]
    pub report: ImportReport,
}

#[derive(Debug, Serialize)]
pub struct ImportSummary {
    pub message: String,
    pub files: Vec<FileReport>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/courses", get(list_courses))
        .route("/api/courses/{id}/occurrences", get(course_occurrences))
        .route(
            "/api/courses/{id}/dates/{date}/participants",
            get(list_participants),
        )
        .route(
            "/api/courses/{id}/dates/{date}/participants/{participant_id}/attendance",
            post(set_attendance),
        )
        .route("/api/export", get(export_participations))
        .route("/api/import", post(import_files))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn date_param(value: &str) -> Result<NaiveDate, AppError> {
    parse_iso_date(value).map_err(|e| AppError::BadRequest(format!("Invalid date format: {}", e)))
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    match tokio::fs::read_to_string(&state.config.index_html).await {
        Ok(page) => Ok(Html(page)),
        Err(err) => {
            warn!("cannot serve {:?}: {}", state.config.index_html, err);
            Err(AppError::NotFound)
        }
    }
}

async fn list_courses(State(state): State<AppState>) -> Result<Json<Vec<Course>>, AppError> {
    let courses = CourseService::new(state.db.clone()).list_active(today()).await?;
    Ok(Json(courses))
}

async fn course_occurrences(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<[String; 3]>, AppError> {
    let occurrences = CourseService::new(state.db.clone())
        .occurrences(id, today())
        .await?;
    Ok(Json(occurrences.to_iso_strings()))
}

async fn list_participants(
    State(state): State<AppState>,
    Path((course_id, date)): Path<(i64, String)>,
) -> Result<Json<Vec<ParticipantDto>>, AppError> {
    let date = date_param(&date)?;
    let participants = ParticipationService::new(state.db.clone())
        .participants(course_id, date)
        .await?;
    Ok(Json(participants))
}

async fn set_attendance(
    State(state): State<AppState>,
    Path((course_id, date, participant_id)): Path<(i64, String, i64)>,
    Json(req): Json<AttendanceRequest>,
) -> Result<Json<AttendanceRequest>, AppError> {
    let date = date_param(&date)?;
    ParticipationService::new(state.db.clone())
        .set_attendance(course_id, date, participant_id, req.present)
        .await?;
    Ok(Json(req))
}

async fn export_participations(
    State(state): State<AppState>,
    Query(params): Query<ExportQueryParams>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(min_date), Some(max_date)) = (params.min_date, params.max_date) else {
        return Err(AppError::BadRequest(
            "minDate and maxDate are required".to_string(),
        ));
    };
    let csv = ParticipationService::new(state.db.clone())
        .export_csv(date_param(&min_date)?, date_param(&max_date)?)
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=participations.csv",
            ),
        ],
        csv,
    ))
}

async fn import_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ImportSummary>, AppError> {
    let service = ImportService::new(state.db.clone());
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Unable to parse form: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload.csv").to_string();
        let contents = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Unable to read {}: {}", file_name, e)))?;

        let report = service
            .import_upload(&file_name, contents.to_vec())
            .await
            .map_err(|source| AppError::Import {
                file_name: file_name.clone(),
                source,
            })?;
        files.push(FileReport { file_name, report });
    }

    if files.is_empty() {
        return Err(AppError::BadRequest("No files uploaded".to_string()));
    }

    let names: Vec<&str> = files.iter().map(|f| f.file_name.as_str()).collect();
    let message = format!("Successfully processed files: {}", names.join(", "));
    info!("{}", message);
    Ok(Json(ImportSummary { message, files }))
}
