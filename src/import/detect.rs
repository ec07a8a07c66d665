use serde::Serialize;

use super::columns::header_eq;

const ROSTER_COLUMN: &str = "Alter";
const COURSE_COLUMN: &str = "Trainer";
const COURSE_FILE_HINT: &str = "trainingsstatistik";
const ROSTER_FILE_HINT: &str = "trainingsanmeldungen";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// Course catalog (`TrainingsStatistik`).
    Courses,
    /// Members with their course registrations (`Trainingsanmeldungen`).
    Roster,
    Unknown,
}

/// Decides what an uploaded file contains. The header wins when exactly one
/// of its marker columns is present; otherwise the file name decides.
pub fn detect_file_kind<I, S>(header: I, file_name: &str) -> FileKind
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut has_roster_column = false;
    let mut has_course_column = false;
    for name in header {
        let name = name.as_ref();
        if header_eq(name, ROSTER_COLUMN) {
            has_roster_column = true;
        } else if header_eq(name, COURSE_COLUMN) {
            has_course_column = true;
        }
    }

    match (has_roster_column, has_course_column) {
        (true, false) => FileKind::Roster,
        (false, true) => FileKind::Courses,
        _ => kind_from_file_name(file_name),
    }
}

fn kind_from_file_name(file_name: &str) -> FileKind {
    let lower = file_name.to_lowercase();
    if lower.contains(COURSE_FILE_HINT) {
        FileKind::Courses
    } else if lower.contains(ROSTER_FILE_HINT) {
        FileKind::Roster
    } else {
        FileKind::Unknown
    }
}
