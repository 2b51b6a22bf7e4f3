use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Employer {
    pub id: i32,
    pub employer_id: String,
    pub name: String,
    pub url: String,
    pub open_vacancies: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct NewEmployer {
    #[validate(length(min = 1))]
    pub employer_id: String,
    #[validate(length(min = 1))]
    pub name: String,
    pub url: String,
    #[validate(range(min = 0))]
    pub open_vacancies: i32,
}
