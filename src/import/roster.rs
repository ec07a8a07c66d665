use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::{debug, warn};

use super::ImportError;
use super::columns::{cell, header_contains, header_eq, parse_id};
use crate::calendar::parse_date;
use crate::models::{Member, MemberCourse};

const MEMBER_ID_COLUMN: &str = "Mitgliedsnummer";
const COURSE_ID_COLUMN: &str = "Kurs Id";

/// Column positions in the registration export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterColumns {
    pub sign_up: Option<usize>,
    pub cancellation: Option<usize>,
    pub member_id: usize,
    pub first_name: Option<usize>,
    pub last_name: Option<usize>,
    pub phone: Option<usize>,
    pub message: Option<usize>,
    pub office_notes: Option<usize>,
    pub age: Option<usize>,
    pub email: Option<usize>,
    pub course_id: usize,
}

impl RosterColumns {
    pub fn from_header<S: AsRef<str>>(header: &[S]) -> Result<Self, ImportError> {
        let mut sign_up = None;
        let mut cancellation = None;
        let mut member_id = None;
        let mut first_name = None;
        let mut last_name = None;
        let mut phone = None;
        let mut message = None;
        let mut office_notes = None;
        let mut age = None;
        let mut email = None;
        let mut course_id = None;

        for (i, name) in header.iter().enumerate() {
            let name = name.as_ref();
            if header_eq(name, "Datum") {
                sign_up = Some(i);
            } else if header_eq(name, "Kündigungsdatum") {
                cancellation = Some(i);
            } else if header_eq(name, MEMBER_ID_COLUMN) {
                member_id = Some(i);
            } else if header_contains(name, "vorname") {
                first_name = Some(i);
            } else if header_contains(name, "nachname") {
                last_name = Some(i);
            } else if header_eq(name, "Erreichbarkeit per Telefon") {
                phone = Some(i);
            } else if header_eq(name, "Mitteilung") {
                message = Some(i);
            } else if header_eq(name, "Notizen Büro") {
                office_notes = Some(i);
            } else if header_eq(name, "Alter") {
                age = Some(i);
            } else if header_eq(name, "E-Mail-Adresse") {
                email = Some(i);
            } else if header_eq(name, COURSE_ID_COLUMN) {
                course_id = Some(i);
            }
        }

        Ok(Self {
            sign_up,
            cancellation,
            member_id: member_id.ok_or(ImportError::MissingColumn(MEMBER_ID_COLUMN))?,
            first_name,
            last_name,
            phone,
            message,
            office_notes,
            age,
            email,
            course_id: course_id.ok_or(ImportError::MissingColumn(COURSE_ID_COLUMN))?,
        })
    }
}

/// Members and enrollment edges collected from one registration file.
/// A member appearing several times keeps the data of its last row.
#[derive(Debug, Default)]
pub struct RosterBatch {
    pub members: BTreeMap<i64, Member>,
    pub enrollments: BTreeSet<MemberCourse>,
    pub skipped: usize,
}

impl RosterBatch {
    pub fn add_row(&mut self, record: &StringRecord, columns: &RosterColumns) {
        let raw_member_id = cell(record, Some(columns.member_id));
        let Some(member_id) = parse_id(raw_member_id) else {
            debug!("skipping roster row without member id: {:?}", raw_member_id);
            self.skipped += 1;
            return;
        };

        let member = Member {
            id: member_id,
            first_name: cell(record, columns.first_name).to_string(),
            last_name: cell(record, columns.last_name).to_string(),
            email: cell(record, columns.email).to_string(),
            phone: cell(record, columns.phone).to_string(),
            sign_up_date: optional_date(cell(record, columns.sign_up)),
            cancellation_date: optional_date(cell(record, columns.cancellation)),
            age: cell(record, columns.age).parse().unwrap_or(0),
            notes: format!(
                "{} {}",
                cell(record, columns.message),
                cell(record, columns.office_notes)
            )
            .trim()
            .to_string(),
        };
        self.members.insert(member_id, member);

        let raw_course_id = cell(record, Some(columns.course_id));
        match parse_id(raw_course_id) {
            Some(course_id) => {
                self.enrollments.insert(MemberCourse {
                    member_id,
                    course_id,
                });
            }
            None => debug!(
                "member {} has no usable course id: {:?}",
                member_id, raw_course_id
            ),
        }
    }
}

fn optional_date(value: &str) -> Option<NaiveDate> {
    if value.is_empty() {
        return None;
    }
    match parse_date(value) {
        Ok(date) => Some(date),
        Err(err) => {
            warn!("{}", err);
            None
        }
    }
}

pub fn read_roster<S, I>(header: &[S], records: I) -> Result<RosterBatch, ImportError>
where
    S: AsRef<str>,
    I: IntoIterator<Item = Result<StringRecord, csv::Error>>,
{
    let columns = RosterColumns::from_header(header)?;
    let mut batch = RosterBatch::default();
    for record in records {
        batch.add_row(&record?, &columns);
    }
    Ok(batch)
}
