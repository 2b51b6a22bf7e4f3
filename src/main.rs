use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use vacancy_harvester::{
    config::{get_config, init_config},
    database::{pool::create_pool, schema},
    outcome::Outcome,
    AppState,
};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    init_config()?;
    let config = get_config();

    let cli_keywords: Vec<String> = std::env::args()
        .skip(1)
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();
    let keywords = if cli_keywords.is_empty() {
        config.search_keywords.clone()
    } else {
        cli_keywords
    };
    if keywords.is_empty() {
        anyhow::bail!("No search keywords given (pass them as arguments or set SEARCH_KEYWORDS)");
    }

    let connect_options = config.database.connect_options()?;
    let database_name = config.database.database_name()?;
    if let Err(e) = schema::ensure_database(&connect_options, &database_name).await {
        warn!(error = %e, "Could not ensure database exists, trying to connect anyway");
    }

    let pool = create_pool(&config.database).await?;
    let result = run(&pool, &keywords).await;
    pool.close().await;
    info!("Database pool closed");
    result
}

async fn run(pool: &sqlx::PgPool, keywords: &[String]) -> anyhow::Result<()> {
    let config = get_config();
    if let Err(e) = schema::ensure_schema(pool).await {
        error!(error = %e, "Schema initialization failed, continuing with existing tables");
    }

    let app_state = AppState::new(pool.clone(), config)?;

    for keyword in keywords {
        let report = app_state.ingest_service.ingest_keyword(keyword).await;
        if let Some(failure) = &report.gather.search_failure {
            warn!(%keyword, %failure, "Nothing ingested");
        }
        if let Some(err) = &report.store.error {
            error!(%keyword, error = %err, "Ingestion did not complete");
        }
    }

    let reports = &app_state.report_service;

    for row in log_outcome("companies_and_vacancy_counts", reports.companies_and_vacancy_counts().await) {
        info!(company = %row.company_name, vacancies = row.vacancy_count, "Company");
    }

    for row in log_outcome("all_vacancies", reports.all_vacancies().await) {
        info!(
            vacancy = %row.vacancy_name,
            company = row.company_name.as_deref().unwrap_or("-"),
            salary = ?row.salary,
            url = %row.url,
            "Vacancy"
        );
    }

    match reports.average_salary().await {
        Outcome::Found(average) => info!(average, "Average salary"),
        Outcome::Empty => info!("No salaries recorded"),
        Outcome::Failed(failure) => warn!(%failure, "Average salary unavailable"),
    }

    for row in log_outcome(
        "vacancies_above_average_salary",
        reports.vacancies_above_average_salary().await,
    ) {
        info!(vacancy = %row.name, salary = ?row.salary, url = %row.url, "Above average");
    }

    let report_keyword = config
        .report_keyword
        .clone()
        .unwrap_or_else(|| keywords[0].clone());
    for row in log_outcome(
        "vacancies_matching_keyword",
        reports.vacancies_matching_keyword(&report_keyword).await,
    ) {
        info!(keyword = %report_keyword, vacancy = %row.name, url = %row.url, "Keyword match");
    }

    Ok(())
}

fn log_outcome<T>(report: &str, outcome: Outcome<Vec<T>>) -> Vec<T> {
    match &outcome {
        Outcome::Found(rows) => info!(report, rows = rows.len(), "Report ready"),
        Outcome::Empty => info!(report, "Report is empty"),
        Outcome::Failed(failure) => warn!(report, %failure, "Report failed"),
    }
    outcome.into_rows()
}
