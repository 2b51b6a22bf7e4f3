use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::dto::hh_dto::{normalize_employer, normalize_vacancy, EmployerSummary};
use crate::models::employer::NewEmployer;
use crate::models::insert_report::InsertReport;
use crate::models::vacancy::NewVacancy;
use crate::outcome::{Failure, Outcome};
use crate::services::employer_service::EmployerService;
use crate::services::hh_service::JobBoardSource;
use crate::services::vacancy_service::VacancyService;

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub fetch_employer_details: bool,
    pub concurrency: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            fetch_employer_details: true,
            concurrency: 4,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GatherStats {
    pub search_failure: Option<Failure>,
    pub employers_found: usize,
    pub duplicate_employer_ids: usize,
    pub detail_failures: usize,
    pub employers_skipped: usize,
    pub vacancy_fetch_failures: usize,
    pub vacancies_skipped: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HarvestBatch {
    pub employers: Vec<NewEmployer>,
    pub vacancies: Vec<NewVacancy>,
    pub stats: GatherStats,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreReport {
    pub employers: InsertReport,
    pub vacancies: InsertReport,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub keyword: String,
    pub gather: GatherStats,
    pub store: StoreReport,
}

#[derive(Clone)]
pub struct IngestService<S> {
    source: S,
    employer_service: EmployerService,
    vacancy_service: VacancyService,
    options: IngestOptions,
}

impl<S: JobBoardSource> IngestService<S> {
    pub fn new(
        source: S,
        employer_service: EmployerService,
        vacancy_service: VacancyService,
        options: IngestOptions,
    ) -> Self {
        Self {
            source,
            employer_service,
            vacancy_service,
            options,
        }
    }

    /// Runs a full ingestion for one keyword. Never fails; problems are
    /// counted in the returned report and logged.
    #[instrument(skip(self))]
    pub async fn ingest_keyword(&self, keyword: &str) -> IngestReport {
        let batch = self.gather(keyword).await;
        let store = self.store(&batch).await;

        info!(
            employers_found = batch.stats.employers_found,
            employers_inserted = store.employers.inserted,
            employers_skipped = batch.stats.employers_skipped + store.employers.skipped.len(),
            vacancies_inserted = store.vacancies.inserted,
            vacancies_skipped = batch.stats.vacancies_skipped + store.vacancies.skipped.len(),
            failed = store.error.is_some(),
            "Ingestion finished"
        );

        IngestReport {
            keyword: keyword.to_string(),
            gather: batch.stats,
            store,
        }
    }

    pub async fn gather(&self, keyword: &str) -> HarvestBatch {
        let mut batch = HarvestBatch::default();

        let found = match self.source.search_employers(keyword).await {
            Outcome::Found(found) => found,
            Outcome::Empty => {
                info!(keyword, "No employers found");
                return batch;
            }
            Outcome::Failed(failure) => {
                warn!(keyword, %failure, "Employer search failed");
                batch.stats.search_failure = Some(failure);
                return batch;
            }
        };

        batch.stats.employers_found = found.len();
        let employers = dedupe_by_id(found);
        batch.stats.duplicate_employer_ids = batch.stats.employers_found - employers.len();
        if batch.stats.duplicate_employer_ids > 0 {
            debug!(
                duplicates = batch.stats.duplicate_employer_ids,
                "Dropped duplicate employer ids"
            );
        }

        let concurrency = self.options.concurrency.max(1);
        let source = &self.source;

        let records: Vec<(String, Value)> = if self.options.fetch_employer_details {
            stream::iter(employers.iter())
                .map(|summary| async move {
                    let detail = source.get_employer_detail(&summary.id).await;
                    (summary.id.clone(), detail)
                })
                .buffered(concurrency)
                .collect::<Vec<_>>()
                .await
                .into_iter()
                .map(|(id, detail)| match detail {
                    Outcome::Found(record) => (id, record),
                    Outcome::Empty | Outcome::Failed(_) => {
                        batch.stats.detail_failures += 1;
                        (id, Value::Null)
                    }
                })
                .collect()
        } else {
            employers
                .iter()
                .map(|summary| (summary.id.clone(), summary.raw.clone()))
                .collect()
        };

        for (employer_id, record) in &records {
            match normalize_employer(employer_id, record) {
                Ok(employer) => batch.employers.push(employer),
                Err(e) => {
                    warn!(%employer_id, error = %e, "Skipping employer");
                    batch.stats.employers_skipped += 1;
                }
            }
        }

        let pages: Vec<(String, Outcome<Vec<Value>>)> = stream::iter(employers.iter())
            .map(|summary| async move {
                let page = source.list_vacancies(&summary.id).await;
                (summary.id.clone(), page)
            })
            .buffered(concurrency)
            .collect()
            .await;

        for (employer_id, page) in pages {
            match page {
                Outcome::Found(items) => {
                    for item in &items {
                        match normalize_vacancy(item) {
                            Ok(vacancy) => batch.vacancies.push(vacancy),
                            Err(e) => {
                                warn!(%employer_id, error = %e, "Skipping vacancy");
                                batch.stats.vacancies_skipped += 1;
                            }
                        }
                    }
                }
                Outcome::Empty => debug!(%employer_id, "Employer has no open vacancies"),
                Outcome::Failed(failure) => {
                    warn!(%employer_id, %failure, "Could not list vacancies");
                    batch.stats.vacancy_fetch_failures += 1;
                }
            }
        }

        batch
    }

    pub async fn store(&self, batch: &HarvestBatch) -> StoreReport {
        let mut report = StoreReport::default();

        if !batch.employers.is_empty() {
            match self.employer_service.insert_employers(&batch.employers).await {
                Ok(inserted) => report.employers = inserted,
                Err(e) => {
                    error!(error = %e, connection = e.is_connection(), "Employer batch aborted");
                    report.error = Some(e.to_string());
                    return report;
                }
            }
        }

        if !batch.vacancies.is_empty() {
            match self.vacancy_service.insert_vacancies(&batch.vacancies).await {
                Ok(inserted) => report.vacancies = inserted,
                Err(e) => {
                    error!(error = %e, connection = e.is_connection(), "Vacancy batch aborted");
                    report.error = Some(e.to_string());
                }
            }
        }

        report
    }
}

fn dedupe_by_id(employers: Vec<EmployerSummary>) -> Vec<EmployerSummary> {
    let mut seen = HashSet::new();
    employers
        .into_iter()
        .filter(|employer| seen.insert(employer.id.clone()))
        .collect()
}
