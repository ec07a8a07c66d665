//! CSV import of the club's course catalog and registration exports.

pub mod columns;
pub mod courses;
pub mod detect;
pub mod roster;

use std::io::{Read, Write};

use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

use crate::db::repository;

pub use courses::CourseBatch;
pub use detect::{FileKind, detect_file_kind};
pub use roster::RosterBatch;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("unable to read upload: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("file has no header row")]
    MissingHeader,

    #[error("unable to determine file type for: {0}")]
    UnrecognizedFileType(String),

    #[error("required column {0:?} is missing")]
    MissingColumn(&'static str),

    #[error("error saving course {id}: {source}")]
    SaveCourse {
        id: i64,
        #[source]
        source: sqlx::Error,
    },

    #[error("error saving member {id}: {source}")]
    SaveMember {
        id: i64,
        #[source]
        source: sqlx::Error,
    },

    #[error("error saving member_course {member_id}-{course_id}: {source}")]
    SaveEnrollment {
        member_id: i64,
        course_id: i64,
        #[source]
        source: sqlx::Error,
    },

    #[error("error replacing member_courses: {0}")]
    ReplaceEnrollments(#[source] sqlx::Error),

    #[error("import task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ImportError {
    /// True when the file itself is at fault rather than the server.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            ImportError::Csv(_)
                | ImportError::MissingHeader
                | ImportError::UnrecognizedFileType(_)
                | ImportError::MissingColumn(_)
        )
    }
}

/// A fully read upload, ready to be written.
#[derive(Debug)]
pub enum ParsedFile {
    Courses(CourseBatch),
    Roster(RosterBatch),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub kind: FileKind,
    pub courses: usize,
    pub members: usize,
    pub enrollments: usize,
    pub skipped_rows: usize,
}

/// Reads a CSV export, detects its kind and collects its rows.
pub fn parse_file<R: Read>(input: R, file_name: &str) -> Result<ParsedFile, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b',')
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let header: Vec<String> = reader
        .headers()?
        .iter()
        .map(columns::normalize_header)
        .collect();
    if header.iter().all(String::is_empty) {
        return Err(ImportError::MissingHeader);
    }

    match detect_file_kind(&header, file_name) {
        FileKind::Courses => courses::read_courses(&header, reader.records()).map(ParsedFile::Courses),
        FileKind::Roster => roster::read_roster(&header, reader.records()).map(ParsedFile::Roster),
        FileKind::Unknown => Err(ImportError::UnrecognizedFileType(file_name.to_string())),
    }
}

/// Copies the upload into a private temporary file and parses it from
/// there. The file is removed when this returns, whatever the outcome.
fn stage_and_parse(file_name: &str, contents: &[u8]) -> Result<ParsedFile, ImportError> {
    let mut staged = tempfile::Builder::new()
        .prefix("csv-upload-")
        .suffix(".csv")
        .tempfile()?;
    staged.write_all(contents)?;
    staged.flush()?;
    let file = staged.reopen()?;
    parse_file(file, file_name)
}

pub struct ImportService {
    db: SqlitePool,
}

impl ImportService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn import_upload(
        &self,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<ImportReport, ImportError> {
        let name = file_name.to_string();
        let parsed = tokio::task::spawn_blocking(move || stage_and_parse(&name, &contents)).await??;
        let report = self.apply(parsed).await?;
        info!("imported {}: {:?}", file_name, report);
        Ok(report)
    }

    pub async fn apply(&self, parsed: ParsedFile) -> Result<ImportReport, ImportError> {
        match parsed {
            ParsedFile::Courses(batch) => self.write_courses(batch).await,
            ParsedFile::Roster(batch) => self.write_roster(batch).await,
        }
    }

    async fn write_courses(&self, batch: CourseBatch) -> Result<ImportReport, ImportError> {
        info!(
            "Writing {} courses ({} rows skipped)",
            batch.courses.len(),
            batch.skipped
        );
        for course in &batch.courses {
            repository::upsert_course(&self.db, course)
                .await
                .map_err(|source| ImportError::SaveCourse {
                    id: course.id,
                    source,
                })?;
        }

        Ok(ImportReport {
            kind: FileKind::Courses,
            courses: batch.courses.len(),
            members: 0,
            enrollments: 0,
            skipped_rows: batch.skipped,
        })
    }

    async fn write_roster(&self, batch: RosterBatch) -> Result<ImportReport, ImportError> {
        info!(
            "Writing {} members and {} enrollments ({} rows skipped)",
            batch.members.len(),
            batch.enrollments.len(),
            batch.skipped
        );
        for member in batch.members.values() {
            repository::upsert_member(&self.db, member)
                .await
                .map_err(|source| ImportError::SaveMember {
                    id: member.id,
                    source,
                })?;
        }

        self.replace_enrollments(&batch).await?;

        Ok(ImportReport {
            kind: FileKind::Roster,
            courses: 0,
            members: batch.members.len(),
            enrollments: batch.enrollments.len(),
            skipped_rows: batch.skipped,
        })
    }

    /// Swaps the whole enrollment table for the batch's edges in one
    /// transaction.
    async fn replace_enrollments(&self, batch: &RosterBatch) -> Result<(), ImportError> {
        let mut tx = self
            .db
            .begin()
            .await
            .map_err(ImportError::ReplaceEnrollments)?;

        let removed = repository::clear_enrollments(&mut tx)
            .await
            .map_err(ImportError::ReplaceEnrollments)?;

        for edge in &batch.enrollments {
            repository::insert_enrollment(&mut tx, edge)
                .await
                .map_err(|source| ImportError::SaveEnrollment {
                    member_id: edge.member_id,
                    course_id: edge.course_id,
                    source,
                })?;
        }

        tx.commit().await.map_err(ImportError::ReplaceEnrollments)?;
        info!(
            "Replaced {} enrollments with {}",
            removed,
            batch.enrollments.len()
        );
        Ok(())
    }
}
