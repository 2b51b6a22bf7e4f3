pub mod employer_service;
pub mod hh_service;
pub mod ingest_service;
pub mod report_service;
pub mod vacancy_service;
