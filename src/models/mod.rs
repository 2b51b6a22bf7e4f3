pub mod employer;
pub mod insert_report;
pub mod report;
pub mod vacancy;
