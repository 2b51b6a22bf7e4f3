use crate::error::{Error, Result};
use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, Executor, PgConnection, PgPool};
use tracing::{error, info, instrument, warn};

const MAINTENANCE_DATABASE: &str = "postgres";

const DUPLICATE_DATABASE: &str = "42P04";

const CREATE_EMPLOYERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS employers (
        id SERIAL PRIMARY KEY,
        employer_id VARCHAR NOT NULL UNIQUE,
        name VARCHAR NOT NULL,
        url VARCHAR NOT NULL DEFAULT '',
        open_vacancies INTEGER NOT NULL DEFAULT 0
    )
"#;

const CREATE_VACANCIES_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS vacancies (
        id SERIAL PRIMARY KEY,
        name VARCHAR NOT NULL,
        description TEXT,
        salary INTEGER,
        published_at DATE,
        employer_id VARCHAR NOT NULL,
        url VARCHAR NOT NULL,
        CONSTRAINT fk_employer_id FOREIGN KEY (employer_id)
            REFERENCES employers (employer_id) ON DELETE CASCADE
    )
"#;

/// Creates `name` on the server behind `options` unless it already exists.
/// Returns `true` when the database was created by this call.
#[instrument(skip(options))]
pub async fn ensure_database(options: &PgConnectOptions, name: &str) -> Result<bool> {
    validate_database_name(name)?;

    let maintenance = options.clone().database(MAINTENANCE_DATABASE);
    let mut conn = PgConnection::connect_with(&maintenance)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to connect to maintenance database");
            Error::from(e)
        })?;

    let result = create_if_missing(&mut conn, name).await;

    if let Err(e) = conn.close().await {
        warn!(error = %e, "Failed to close maintenance connection cleanly");
    }

    match result {
        Ok(created) => {
            if created {
                info!(database = name, "Created database");
            }
            Ok(created)
        }
        Err(e) => {
            error!(error = %e, database = name, "Failed to create database");
            Err(e)
        }
    }
}

async fn create_if_missing(conn: &mut PgConnection, name: &str) -> Result<bool> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(name)
            .fetch_one(&mut *conn)
            .await?;
    if exists {
        return Ok(false);
    }

    // CREATE DATABASE cannot be parameterized; the name is validated above.
    let sql = format!(r#"CREATE DATABASE "{}""#, name);
    match conn.execute(sql.as_str()).await {
        Ok(_) => Ok(true),
        Err(sqlx::Error::Database(db_err))
            if db_err.code().as_deref() == Some(DUPLICATE_DATABASE) =>
        {
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

fn validate_database_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= 63
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::Config(format!("Invalid database name: {:?}", name)))
    }
}

#[instrument(skip(pool))]
pub async fn ensure_employers_table(pool: &PgPool) -> Result<()> {
    pool.execute(CREATE_EMPLOYERS_TABLE).await.map_err(|e| {
        error!(error = %e, "Failed to create employers table");
        Error::from(e)
    })?;
    Ok(())
}

#[instrument(skip(pool))]
pub async fn ensure_vacancies_table(pool: &PgPool) -> Result<()> {
    pool.execute(CREATE_VACANCIES_TABLE).await.map_err(|e| {
        error!(error = %e, "Failed to create vacancies table");
        Error::from(e)
    })?;
    Ok(())
}

pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    ensure_employers_table(pool).await?;
    ensure_vacancies_table(pool).await?;
    info!("Schema is up to date");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_names_are_restricted() {
        assert!(validate_database_name("hh_vacancies").is_ok());
        assert!(validate_database_name("db2024").is_ok());
        assert!(validate_database_name("").is_err());
        assert!(validate_database_name("bad-name").is_err());
        assert!(validate_database_name(r#"x"; DROP DATABASE y; --"#).is_err());
        assert!(validate_database_name(&"a".repeat(64)).is_err());
    }
}
