use crate::models::report::{CompanyVacancyCount, VacancyListing};
use crate::models::vacancy::Vacancy;
use crate::outcome::{Failure, Outcome};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{error, instrument};

const VACANCY_COLUMNS: &str = "id, name, description, salary, published_at, employer_id, url";

#[derive(Clone)]
pub struct ReportService {
    pool: PgPool,
}

impl ReportService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn companies_and_vacancy_counts(&self) -> Outcome<Vec<CompanyVacancyCount>> {
        let rows = sqlx::query_as::<_, CompanyVacancyCount>(
            r#"
            SELECT e.name AS company_name, COUNT(v.id) AS vacancy_count
            FROM employers e
            LEFT JOIN vacancies v USING (employer_id)
            GROUP BY e.name
            ORDER BY e.name
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        rows_outcome("companies_and_vacancy_counts", rows)
    }

    #[instrument(skip(self))]
    pub async fn all_vacancies(&self) -> Outcome<Vec<VacancyListing>> {
        let rows = sqlx::query_as::<_, VacancyListing>(
            r#"
            SELECT v.name AS vacancy_name, e.name AS company_name, v.salary, v.url
            FROM vacancies v
            LEFT JOIN employers e USING (employer_id)
            ORDER BY v.name, v.id
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        rows_outcome("all_vacancies", rows)
    }

    #[instrument(skip(self))]
    pub async fn average_salary(&self) -> Outcome<i64> {
        let average = sqlx::query_scalar::<_, Option<Decimal>>(
            "SELECT ROUND(AVG(salary)) FROM vacancies",
        )
        .fetch_one(&self.pool)
        .await;

        match average {
            Ok(Some(value)) => match value.to_i64() {
                Some(rounded) => Outcome::Found(rounded),
                None => {
                    error!(%value, "Average salary does not fit in i64");
                    Outcome::Failed(Failure::Decode(format!("average salary {} out of range", value)))
                }
            },
            Ok(None) => Outcome::Empty,
            Err(err) => {
                error!(error = %err, query = "average_salary", "Report query failed");
                Outcome::Failed(err.into())
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn vacancies_above_average_salary(&self) -> Outcome<Vec<Vacancy>> {
        let sql = format!(
            r#"
            SELECT {VACANCY_COLUMNS}
            FROM vacancies
            WHERE salary > (SELECT AVG(salary) FROM vacancies)
            ORDER BY name, id
            "#
        );
        let rows = sqlx::query_as::<_, Vacancy>(&sql)
            .fetch_all(&self.pool)
            .await;
        rows_outcome("vacancies_above_average_salary", rows)
    }

    /// Vacancies whose name contains `keyword`, case-sensitively. LIKE
    /// wildcards in the keyword match literally.
    #[instrument(skip(self))]
    pub async fn vacancies_matching_keyword(&self, keyword: &str) -> Outcome<Vec<Vacancy>> {
        if keyword.is_empty() {
            return Outcome::Failed(Failure::InvalidInput(
                "keyword must not be empty".to_string(),
            ));
        }

        let sql = format!(
            r#"
            SELECT {VACANCY_COLUMNS}
            FROM vacancies
            WHERE name LIKE $1 ESCAPE '\'
            ORDER BY name, id
            "#
        );
        let rows = sqlx::query_as::<_, Vacancy>(&sql)
            .bind(format!("%{}%", escape_like(keyword)))
            .fetch_all(&self.pool)
            .await;
        rows_outcome("vacancies_matching_keyword", rows)
    }
}

fn rows_outcome<T>(query: &str, rows: Result<Vec<T>, sqlx::Error>) -> Outcome<Vec<T>> {
    match rows {
        Ok(rows) => Outcome::from_rows(rows),
        Err(err) => {
            error!(error = %err, query, "Report query failed");
            Outcome::Failed(err.into())
        }
    }
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("Python"), "Python");
        assert_eq!(escape_like("100%"), r"100\%");
        assert_eq!(escape_like("snake_case"), r"snake\_case");
        assert_eq!(escape_like(r"C:\dev"), r"C:\\dev");
    }
}
