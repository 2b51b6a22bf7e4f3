use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

pub const NO_DESCRIPTION: &str = "no description";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Vacancy {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub salary: Option<i32>,
    pub published_at: Option<NaiveDate>,
    pub employer_id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct NewVacancy {
    #[validate(length(min = 1))]
    pub name: String,
    pub description: String,
    pub salary: Option<i32>,
    pub published_at: Option<NaiveDate>,
    #[validate(length(min = 1))]
    pub employer_id: String,
    #[validate(length(min = 1))]
    pub url: String,
}
