use crate::error::Result;
use crate::models::employer::{Employer, NewEmployer};
use crate::models::insert_report::{InsertReport, SkipReason};
use crate::utils::validation::validate_row;
use sqlx::{Connection, PgPool};
use tracing::{info, instrument, warn};

#[derive(Clone)]
pub struct EmployerService {
    pool: PgPool,
}

impl EmployerService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Constraint violations skip the row; any other error rolls back the batch.
    #[instrument(skip(self, batch), fields(batch_size = batch.len()))]
    pub async fn insert_employers(&self, batch: &[NewEmployer]) -> Result<InsertReport> {
        let mut report = InsertReport::default();
        let mut tx = self.pool.begin().await?;

        for employer in batch {
            if let Err(reason) = validate_row(employer) {
                warn!(employer_id = %employer.employer_id, %reason, "Skipping invalid employer");
                report.skip(employer.employer_id.clone(), SkipReason::Invalid(reason));
                continue;
            }

            let mut savepoint = Connection::begin(&mut *tx).await?;
            let inserted = sqlx::query(
                r#"
                INSERT INTO employers (employer_id, name, url, open_vacancies)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(&employer.employer_id)
            .bind(&employer.name)
            .bind(&employer.url)
            .bind(employer.open_vacancies)
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
                    warn!(employer_id = %employer.employer_id, ?reason, "Employer rejected by the store");
                    report.skip(employer.employer_id.clone(), reason);
                }
            }
        }

        tx.commit().await?;
        info!(
            inserted = report.inserted,
            skipped = report.skipped.len(),
            "Employer batch committed"
        );
        Ok(report)
    }

    pub async fn get_by_employer_id(&self, employer_id: &str) -> Result<Option<Employer>> {
        let employer = sqlx::query_as::<_, Employer>(
            r#"
            SELECT id, employer_id, name, url, open_vacancies
            FROM employers
            WHERE employer_id = $1
            "#,
        )
        .bind(employer_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(employer)
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
