pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod models;
pub mod outcome;
pub mod services;
pub mod utils;

use crate::config::Config;
use crate::error::Result;
use crate::services::{
    employer_service::EmployerService,
    hh_service::HhService,
    ingest_service::{IngestOptions, IngestService},
    report_service::ReportService,
    vacancy_service::VacancyService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub employer_service: EmployerService,
    pub vacancy_service: VacancyService,
    pub report_service: ReportService,
    pub ingest_service: IngestService<HhService>,
}

impl AppState {
    pub fn new(pool: PgPool, config: &Config) -> Result<Self> {
        let hh_service = HhService::new(&config.hh)?;

        let employer_service = EmployerService::new(pool.clone());
        let vacancy_service = VacancyService::new(pool.clone());
        let report_service = ReportService::new(pool.clone());
        let ingest_service = IngestService::new(
            hh_service,
            employer_service.clone(),
            vacancy_service.clone(),
            IngestOptions {
                fetch_employer_details: config.fetch_employer_details,
                concurrency: config.fetch_concurrency,
            },
        );

        Ok(Self {
            pool,
            employer_service,
            vacancy_service,
            report_service,
            ingest_service,
        })
    }
}
