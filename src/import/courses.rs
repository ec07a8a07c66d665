use csv::StringRecord;
use tracing::debug;

use super::ImportError;
use super::columns::{cell, header_eq, parse_id};
use crate::models::Course;

/// Markers of the summary rows at the bottom of the course export.
const SUMMARY_MARKERS: [&str; 2] = ["gesamt", "total"];

/// Column positions in the course export. Id and name are always the first
/// two columns; the rest are looked up by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseColumns {
    pub id: usize,
    pub name: usize,
    pub location: Option<usize>,
    pub trainer: Option<usize>,
    pub training_type: Option<usize>,
    pub weekday: Option<usize>,
    pub start: Option<usize>,
    pub end: Option<usize>,
}

impl CourseColumns {
    pub fn from_header<S: AsRef<str>>(header: &[S]) -> Self {
        let mut columns = Self {
            id: 0,
            name: 1,
            location: None,
            trainer: None,
            training_type: None,
            weekday: None,
            start: None,
            end: None,
        };
        for (i, name) in header.iter().enumerate() {
            let name = name.as_ref();
            if header_eq(name, "Ort") {
                columns.location = Some(i);
            } else if header_eq(name, "Trainer") {
                columns.trainer = Some(i);
            } else if header_eq(name, "Sparte") {
                columns.training_type = Some(i);
            } else if header_eq(name, "Wochentag") {
                columns.weekday = Some(i);
            } else if header_eq(name, "Start") {
                columns.start = Some(i);
            } else if header_eq(name, "Ende") {
                columns.end = Some(i);
            }
        }
        columns
    }
}

#[derive(Debug, Default)]
pub struct CourseBatch {
    pub courses: Vec<Course>,
    pub skipped: usize,
}

/// Builds a course from one export row, or `None` for blank, summary and
/// other non-data rows.
pub fn parse_course_row(record: &StringRecord, columns: &CourseColumns) -> Option<Course> {
    let raw_id = cell(record, Some(columns.id));
    if raw_id.is_empty() || is_summary(raw_id) {
        return None;
    }
    let id = parse_id(raw_id)?;

    Some(Course {
        id,
        name: cell(record, Some(columns.name)).to_string(),
        location: cell(record, columns.location).to_string(),
        training_type: cell(record, columns.training_type).to_string(),
        weekday: cell(record, columns.weekday).to_string(),
        start_time: cell(record, columns.start).to_string(),
        end_time: cell(record, columns.end).to_string(),
        first_schedule: None,
        // TODO: wire up the "letzter Termin" column once the export fills it reliably
        last_schedule: None,
        trainer_names: cell(record, columns.trainer).to_string(),
    })
}

fn is_summary(value: &str) -> bool {
    let lower = value.to_lowercase();
    SUMMARY_MARKERS.iter().any(|marker| lower.contains(marker))
}

pub fn read_courses<S, I>(header: &[S], records: I) -> Result<CourseBatch, ImportError>
where
    S: AsRef<str>,
    I: IntoIterator<Item = Result<StringRecord, csv::Error>>,
{
    let columns = CourseColumns::from_header(header);
    let mut batch = CourseBatch::default();

    for record in records {
        let record = record?;
        match parse_course_row(&record, &columns) {
            Some(course) => batch.courses.push(course),
            None => {
                debug!("skipping non-course row: {:?}", record.get(columns.id));
                batch.skipped += 1;
            }
        }
    }

    Ok(batch)
}
