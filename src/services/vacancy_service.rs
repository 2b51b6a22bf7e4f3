use crate::error::Result;
use crate::models::insert_report::{InsertReport, SkipReason};
use crate::models::vacancy::NewVacancy;
use crate::utils::validation::validate_row;
use sqlx::{Connection, PgPool};
use tracing::{info, instrument, warn};

#[derive(Clone)]
pub struct VacancyService {
    pool: PgPool,
}

impl VacancyService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, batch), fields(batch_size = batch.len()))]
    pub async fn insert_vacancies(&self, batch: &[NewVacancy]) -> Result<InsertReport> {
        let mut report = InsertReport::default();
        let mut tx = self.pool.begin().await?;

        for vacancy in batch {
            if let Err(reason) = validate_row(vacancy) {
                warn!(url = %vacancy.url, %reason, "Skipping invalid vacancy");
                report.skip(vacancy.url.clone(), SkipReason::Invalid(reason));
                continue;
            }

            let mut savepoint = Connection::begin(&mut *tx).await?;
            let inserted = sqlx::query(
                r#"
                INSERT INTO vacancies (name, description, salary, published_at, employer_id, url)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(&vacancy.name)
            .bind(&vacancy.description)
            .bind(vacancy.salary)
            .bind(vacancy.published_at)
            .bind(&vacancy.employer_id)
            .bind(&vacancy.url)
            .execute(&mut *savepoint)
            .await;

            match inserted {
                Ok(_) => {
                    savepoint.commit().await?;
                    report.inserted += 1;
                }
                Err(err) => {
                    let Some(reason) = SkipReason::from_db_error(&err) else {
                        return Err(err.into());
                    };
                    savepoint.rollback().await?;
                    warn!(
                        url = %vacancy.url,
                        employer_id = %vacancy.employer_id,
                        ?reason,
                        "Vacancy rejected by the store"
                    );
                    report.skip(vacancy.url.clone(), reason);
                }
            }
        }

        tx.commit().await?;
        info!(
            inserted = report.inserted,
            skipped = report.skipped.len(),
            "Vacancy batch committed"
        );
        Ok(report)
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vacancies")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
