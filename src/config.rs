use crate::error::{Error, Result};
use dotenvy::dotenv;
use sqlx::postgres::PgConnectOptions;
use std::env;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// Options for the configured database. `DATABASE_URL` wins over the
    /// individual `DB_*` values when both are present.
    pub fn connect_options(&self) -> Result<PgConnectOptions> {
        if let Some(url) = &self.url {
            return PgConnectOptions::from_str(url)
                .map_err(|e| Error::Config(format!("Invalid DATABASE_URL: {}", e)));
        }
        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name))
    }

    pub fn database_name(&self) -> Result<String> {
        match &self.url {
            Some(_) => self
                .connect_options()?
                .get_database()
                .map(str::to_string)
                .ok_or_else(|| Error::Config("DATABASE_URL has no database name".to_string())),
            None => Ok(self.name.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HhConfig {
    pub base_url: String,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub hh: HhConfig,
    pub fetch_concurrency: usize,
    pub fetch_employer_details: bool,
    pub search_keywords: Vec<String>,
    pub report_keyword: Option<String>,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let fetch_concurrency: usize = get_env_parse_or("FETCH_CONCURRENCY", 4)?;
        if fetch_concurrency == 0 {
            return Err(Error::Config(
                "FETCH_CONCURRENCY must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").ok(),
                host: get_env_or("DB_HOST", "localhost"),
                port: get_env_parse_or("DB_PORT", 5432)?,
                name: get_env_or("DB_NAME", "vacancies"),
                user: get_env_or("DB_USER", "postgres"),
                password: get_env_or("DB_PASSWORD", ""),
                max_connections: get_env_parse_or("DB_MAX_CONNECTIONS", 5)?,
            },
            hh: HhConfig {
                base_url: get_env_or("HH_API_BASE_URL", "https://api.hh.ru/"),
                user_agent: get_env_or("HH_USER_AGENT", "vacancy-harvester/0.1"),
                request_timeout: Duration::from_secs(get_env_parse_or(
                    "HH_REQUEST_TIMEOUT_SECS",
                    30,
                )?),
                max_retries: get_env_parse_or("HH_MAX_RETRIES", 3)?,
                retry_base_delay: Duration::from_millis(get_env_parse_or(
                    "HH_RETRY_BASE_DELAY_MS",
                    500,
                )?),
            },
            fetch_concurrency,
            fetch_employer_details: get_env_parse_or("FETCH_EMPLOYER_DETAILS", true)?,
            search_keywords: parse_keywords(&get_env_or("SEARCH_KEYWORDS", "python")),
            report_keyword: env::var("REPORT_KEYWORD").ok().filter(|k| !k.trim().is_empty()),
        })
    }
}

pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn database_config(url: Option<&str>) -> DatabaseConfig {
        DatabaseConfig {
            url: url.map(str::to_string),
            host: "db.internal".into(),
            port: 5433,
            name: "hh_data".into(),
            user: "etl".into(),
            password: "secret".into(),
            max_connections: 2,
        }
    }

    #[test]
    fn keywords_are_trimmed_and_blanks_dropped() {
        assert_eq!(
            parse_keywords(" python, rust ,,  "),
            vec!["python".to_string(), "rust".to_string()]
        );
        assert!(parse_keywords("").is_empty());
    }

    #[test]
    fn discrete_params_build_options() {
        let config = database_config(None);
        let options = config.connect_options().unwrap();
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 5433);
        assert_eq!(options.get_database(), Some("hh_data"));
        assert_eq!(config.database_name().unwrap(), "hh_data");
    }

    #[test]
    fn database_url_overrides_params() {
        let config = database_config(Some("postgres://u:p@example.org:6543/from_url"));
        let options = config.connect_options().unwrap();
        assert_eq!(options.get_host(), "example.org");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(config.database_name().unwrap(), "from_url");
    }

    #[test]
    fn bad_database_url_is_config_error() {
        let config = database_config(Some("not a url"));
        assert!(matches!(config.connect_options(), Err(Error::Config(_))));
    }
}
