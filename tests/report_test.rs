mod common;

use sqlx::PgPool;
use vacancy_harvester::models::report::CompanyVacancyCount;
use vacancy_harvester::outcome::{Failure, Outcome};

async fn seed_salaries(services: &common::Services) {
    services
        .employers
        .insert_employers(&[common::employer("1", "Acme"), common::employer("2", "Globex")])
        .await
        .unwrap();
    services
        .vacancies
        .insert_vacancies(&[
            common::vacancy("Junior Developer", "1", Some(1000)),
            common::vacancy("Middle Developer", "1", Some(2000)),
            common::vacancy("Senior Developer", "2", Some(3000)),
            common::vacancy("Intern", "2", None),
        ])
        .await
        .unwrap();
}

#[sqlx::test(migrations = false)]
async fn empty_tables_report_empty(pool: PgPool) {
    let services = common::setup(&pool).await;
    let reports = &services.reports;

    assert!(reports.companies_and_vacancy_counts().await.is_empty());
    assert!(reports.all_vacancies().await.is_empty());
    assert_eq!(reports.average_salary().await, Outcome::Empty);
    assert!(reports.vacancies_above_average_salary().await.is_empty());
    assert!(reports.vacancies_matching_keyword("Python").await.is_empty());
}

#[sqlx::test(migrations = false)]
async fn average_ignores_missing_salaries(pool: PgPool) {
    let services = common::setup(&pool).await;
    seed_salaries(&services).await;

    assert_eq!(services.reports.average_salary().await, Outcome::Found(2000));
}

#[sqlx::test(migrations = false)]
async fn average_is_rounded(pool: PgPool) {
    let services = common::setup(&pool).await;
    services
        .employers
        .insert_employers(&[common::employer("1", "Acme")])
        .await
        .unwrap();
    services
        .vacancies
        .insert_vacancies(&[
            common::vacancy("A", "1", Some(1000)),
            common::vacancy("B", "1", Some(1001)),
        ])
        .await
        .unwrap();

    assert_eq!(services.reports.average_salary().await, Outcome::Found(1001));
}

#[sqlx::test(migrations = false)]
async fn only_the_top_salary_is_above_average(pool: PgPool) {
    let services = common::setup(&pool).await;
    seed_salaries(&services).await;

    let above = services.reports.vacancies_above_average_salary().await.into_rows();
    assert_eq!(above.len(), 1);
    assert_eq!(above[0].name, "Senior Developer");
    assert_eq!(above[0].salary, Some(3000));
    assert_eq!(above[0].employer_id, "2");
}

#[sqlx::test(migrations = false)]
async fn counts_are_grouped_per_company(pool: PgPool) {
    let services = common::setup(&pool).await;
    seed_salaries(&services).await;
    services
        .employers
        .insert_employers(&[common::employer("3", "Initech")])
        .await
        .unwrap();

    let counts = services.reports.companies_and_vacancy_counts().await.into_rows();
    assert_eq!(
        counts,
        vec![
            CompanyVacancyCount {
                company_name: "Acme".into(),
                vacancy_count: 2,
            },
            CompanyVacancyCount {
                company_name: "Globex".into(),
                vacancy_count: 2,
            },
            CompanyVacancyCount {
                company_name: "Initech".into(),
                vacancy_count: 0,
            },
        ]
    );
}

#[sqlx::test(migrations = false)]
async fn all_vacancies_lists_salary_and_company(pool: PgPool) {
    let services = common::setup(&pool).await;
    seed_salaries(&services).await;

    let rows = services.reports.all_vacancies().await.into_rows();
    assert_eq!(rows.len(), 4);
    let intern = rows.iter().find(|r| r.vacancy_name == "Intern").unwrap();
    assert_eq!(intern.company_name.as_deref(), Some("Globex"));
    assert_eq!(intern.salary, None);
    assert!(intern.url.starts_with("https://hh.ru/vacancy/"));
}

#[sqlx::test(migrations = false)]
async fn keyword_match_is_a_case_sensitive_substring(pool: PgPool) {
    let services = common::setup(&pool).await;
    services
        .employers
        .insert_employers(&[common::employer("1", "Acme")])
        .await
        .unwrap();
    services
        .vacancies
        .insert_vacancies(&[
            common::vacancy("Python Developer", "1", Some(1000)),
            common::vacancy("Java Developer", "1", Some(1000)),
            common::vacancy("python scripting", "1", None),
        ])
        .await
        .unwrap();

    let matched = services
        .reports
        .vacancies_matching_keyword("Python")
        .await
        .into_rows();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].name, "Python Developer");

    let developers = services
        .reports
        .vacancies_matching_keyword("Developer")
        .await
        .into_rows();
    let names: Vec<&str> = developers.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["Java Developer", "Python Developer"]);
}

#[sqlx::test(migrations = false)]
async fn keyword_wildcards_match_literally(pool: PgPool) {
    let services = common::setup(&pool).await;
    services
        .employers
        .insert_employers(&[common::employer("1", "Acme")])
        .await
        .unwrap();
    services
        .vacancies
        .insert_vacancies(&[
            common::vacancy("100% remote", "1", None),
            common::vacancy("1000 bonus", "1", None),
        ])
        .await
        .unwrap();

    let matched = services
        .reports
        .vacancies_matching_keyword("100%")
        .await
        .into_rows();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].name, "100% remote");

    assert_eq!(
        services.reports.vacancies_matching_keyword("").await,
        Outcome::Failed(Failure::InvalidInput("keyword must not be empty".into()))
    );
}
