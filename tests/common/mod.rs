#![allow(dead_code)]

use sqlx::PgPool;
use vacancy_harvester::database::schema;
use vacancy_harvester::models::employer::NewEmployer;
use vacancy_harvester::models::vacancy::NewVacancy;
use vacancy_harvester::services::{
    employer_service::EmployerService, report_service::ReportService,
    vacancy_service::VacancyService,
};

pub struct Services {
    pub employers: EmployerService,
    pub vacancies: VacancyService,
    pub reports: ReportService,
}

pub async fn setup(pool: &PgPool) -> Services {
    schema::ensure_schema(pool).await.expect("schema");
    Services {
        employers: EmployerService::new(pool.clone()),
        vacancies: VacancyService::new(pool.clone()),
        reports: ReportService::new(pool.clone()),
    }
}

pub fn employer(id: &str, name: &str) -> NewEmployer {
    NewEmployer {
        employer_id: id.to_string(),
        name: name.to_string(),
        url: String::new(),
        open_vacancies: 0,
    }
}

pub fn vacancy(name: &str, employer_id: &str, salary: Option<i32>) -> NewVacancy {
    NewVacancy {
        name: name.to_string(),
        description: "no description".to_string(),
        salary,
        published_at: None,
        employer_id: employer_id.to_string(),
        url: format!(
            "https://hh.ru/vacancy/{}-{}",
            employer_id,
            name.to_lowercase().replace(' ', "-")
        ),
    }
}
