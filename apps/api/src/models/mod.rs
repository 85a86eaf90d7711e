pub mod analysis;
pub mod job_description;
pub mod resume;
pub mod template;
pub mod user;
