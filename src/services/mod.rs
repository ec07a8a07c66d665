pub mod course_service;
pub mod participation_service;

pub use course_service::CourseService;
pub use participation_service::ParticipationService;
