use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::HhConfig;
use crate::dto::hh_dto::{EmployerSummary, HhPage};
use crate::error::{Error, Result};
use crate::outcome::{Failure, Outcome};

// Implementations report failures as `Outcome::Failed` instead of erroring.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobBoardSource: Send + Sync {
    async fn search_employers(&self, keyword: &str) -> Outcome<Vec<EmployerSummary>>;

    async fn get_employer_detail(&self, employer_id: &str) -> Outcome<Value>;

    async fn list_vacancies(&self, employer_id: &str) -> Outcome<Vec<Value>>;
}

#[derive(Clone)]
pub struct HhService {
    client: Client,
    base_url: Url,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl HhService {
    pub const PER_PAGE: u32 = 100;

    const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

    pub fn new(config: &HhConfig) -> Result<Self> {
        let mut base_url = Url::parse(&config.base_url)
            .map_err(|e| Error::Config(format!("Invalid HH_API_BASE_URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "HH_API_BASE_URL cannot be a base: {}",
                config.base_url
            )));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            max_retries: config.max_retries,
            retry_base_delay: config.retry_base_delay,
        })
    }

    fn join(&self, path: &str) -> std::result::Result<Url, Failure> {
        self.base_url
            .join(path)
            .map_err(|e| Failure::InvalidInput(e.to_string()))
    }

    fn employer_search_url(&self, keyword: &str) -> std::result::Result<Url, Failure> {
        let mut url = self.join("employers")?;
        url.query_pairs_mut()
            .append_pair("text", keyword)
            .append_pair("page", "0")
            .append_pair("per_page", &Self::PER_PAGE.to_string());
        Ok(url)
    }

    fn employer_detail_url(&self, employer_id: &str) -> std::result::Result<Url, Failure> {
        let mut url = self.join("employers/")?;
        url.path_segments_mut()
            .map_err(|_| Failure::InvalidInput("base url cannot take path segments".into()))?
            .pop_if_empty()
            .push(employer_id);
        Ok(url)
    }

    fn vacancies_url(&self, employer_id: &str) -> std::result::Result<Url, Failure> {
        let mut url = self.join("vacancies")?;
        url.query_pairs_mut().append_pair("employer_id", employer_id);
        Ok(url)
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.retry_base_delay
            .saturating_mul(factor)
            .min(Self::MAX_RETRY_DELAY)
    }

    async fn send_with_retry(&self, url: &Url) -> std::result::Result<Response, Failure> {
        let attempts = self.max_retries.saturating_add(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.client.get(url.clone()).send().await {
                Ok(resp) if resp.status() == StatusCode::OK => return Ok(resp),
                Ok(resp) => {
                    let status = resp.status();
                    if is_transient_status(status) && attempt < attempts {
                        let delay = retry_after(&resp).unwrap_or_else(|| self.backoff(attempt));
                        warn!(%url, %status, attempt, ?delay, "Transient status from job board, retrying");
                        sleep(delay).await;
                        continue;
                    }
                    warn!(
                        %url,
                        %status,
                        reason = status.canonical_reason().unwrap_or("unknown"),
                        "Request was not successful"
                    );
                    return Err(Failure::Status(status.as_u16()));
                }
                Err(err) => {
                    let transient = err.is_timeout() || err.is_connect();
                    if transient && attempt < attempts {
                        let delay = self.backoff(attempt);
                        warn!(%url, error = %err, attempt, ?delay, "Request failed, retrying");
                        sleep(delay).await;
                        continue;
                    }
                    warn!(%url, error = %err, "Request failed");
                    return Err(Failure::from(err));
                }
            }
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, url: Url) -> std::result::Result<T, Failure> {
        let resp = self.send_with_retry(&url).await?;
        resp.json::<T>().await.map_err(|err| {
            warn!(%url, error = %err, "Failed to decode job board response");
            Failure::from(err)
        })
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn retry_after(resp: &Response) -> Option<Duration> {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .map(|delay| delay.min(HhService::MAX_RETRY_DELAY))
}

fn require_input(field: &str, value: &str) -> std::result::Result<(), Failure> {
    if value.trim().is_empty() {
        warn!(field, "Refusing to query the job board with a blank value");
        Err(Failure::InvalidInput(format!("{} must not be empty", field)))
    } else {
        Ok(())
    }
}

#[async_trait]
impl JobBoardSource for HhService {
    #[instrument(skip(self))]
    async fn search_employers(&self, keyword: &str) -> Outcome<Vec<EmployerSummary>> {
        if let Err(failure) = require_input("keyword", keyword) {
            return Outcome::Failed(failure);
        }
        let url = match self.employer_search_url(keyword.trim()) {
            Ok(url) => url,
            Err(failure) => return Outcome::Failed(failure),
        };
        let page: HhPage = match self.fetch(url).await {
            Ok(page) => page,
            Err(failure) => return Outcome::Failed(failure),
        };

        if let Some(found) = page.found {
            if found > page.items.len() as u64 {
                debug!(
                    found,
                    returned = page.items.len(),
                    pages = ?page.pages,
                    "Employer search is limited to the first page"
                );
            }
        }

        let employers: Vec<EmployerSummary> = page
            .items
            .into_iter()
            .filter_map(|item| match EmployerSummary::from_item(item) {
                Ok(summary) => Some(summary),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed employer search item");
                    None
                }
            })
            .collect();

        if employers.is_empty() {
            info!("No employers matched the keyword");
        }
        Outcome::from_rows(employers)
    }

    #[instrument(skip(self))]
    async fn get_employer_detail(&self, employer_id: &str) -> Outcome<Value> {
        if let Err(failure) = require_input("employer_id", employer_id) {
            return Outcome::Failed(failure);
        }
        let url = match self.employer_detail_url(employer_id.trim()) {
            Ok(url) => url,
            Err(failure) => return Outcome::Failed(failure),
        };
        match self.fetch::<Value>(url).await {
            Ok(Value::Null) => Outcome::Empty,
            Ok(detail) => Outcome::Found(detail),
            Err(failure) => Outcome::Failed(failure),
        }
    }

    #[instrument(skip(self))]
    async fn list_vacancies(&self, employer_id: &str) -> Outcome<Vec<Value>> {
        if let Err(failure) = require_input("employer_id", employer_id) {
            return Outcome::Failed(failure);
        }
        let url = match self.vacancies_url(employer_id.trim()) {
            Ok(url) => url,
            Err(failure) => return Outcome::Failed(failure),
        };
        match self.fetch::<HhPage>(url).await {
            Ok(page) => Outcome::from_rows(page.items),
            Err(failure) => Outcome::Failed(failure),
        }
    }
}
