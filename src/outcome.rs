use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Failure {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("remote returned status {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("database error: {0}")]
    Database(String),
}

impl From<reqwest::Error> for Failure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Failure::Timeout
        } else if err.is_decode() {
            Failure::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Failure::Status(status.as_u16())
        } else {
            Failure::Transport(err.to_string())
        }
    }
}

impl From<sqlx::Error> for Failure {
    fn from(err: sqlx::Error) -> Self {
        Failure::Database(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Outcome<T> {
    Found(T),
    Empty,
    Failed(Failure),
}

impl<T> Outcome<T> {
    pub fn is_empty(&self) -> bool {
        matches!(self, Outcome::Empty)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn map<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Outcome::Found(value) => Outcome::Found(f(value)),
            Outcome::Empty => Outcome::Empty,
            Outcome::Failed(failure) => Outcome::Failed(failure),
        }
    }
}

impl<T> Outcome<Vec<T>> {
    pub fn from_rows(rows: Vec<T>) -> Self {
        if rows.is_empty() {
            Outcome::Empty
        } else {
            Outcome::Found(rows)
        }
    }

    pub fn into_rows(self) -> Vec<T> {
        match self {
            Outcome::Found(rows) => rows,
            Outcome::Empty | Outcome::Failed(_) => Vec::new(),
        }
    }
}
