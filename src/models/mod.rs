pub mod advisory;
pub mod orchestration;
pub mod report;
pub mod user;
