use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct CompanyVacancyCount {
    pub company_name: String,
    pub vacancy_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct VacancyListing {
    pub vacancy_name: String,
    pub company_name: Option<String>,
    pub salary: Option<i32>,
    pub url: String,
}
