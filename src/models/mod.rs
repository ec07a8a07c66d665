pub mod course;
pub mod member;
pub mod participation;

pub use course::Course;
pub use member::{Member, MemberCourse};
pub use participation::{AttendanceRequest, ParticipantDto, Participation};
