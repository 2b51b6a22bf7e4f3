use serde::Serialize;

const NOT_NULL_VIOLATION: &str = "23502";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    Invalid(String),
    Duplicate,
    MissingEmployer,
    Rejected(String),
}

impl SkipReason {
    pub fn from_db_error(err: &sqlx::Error) -> Option<Self> {
        let sqlx::Error::Database(db_err) = err else {
            return None;
        };
        if db_err.is_unique_violation() {
            Some(SkipReason::Duplicate)
        } else if db_err.is_foreign_key_violation() {
            Some(SkipReason::MissingEmployer)
        } else if db_err.is_check_violation() || db_err.code().as_deref() == Some(NOT_NULL_VIOLATION)
        {
            Some(SkipReason::Rejected(db_err.message().to_string()))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    pub key: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InsertReport {
    pub inserted: usize,
    pub skipped: Vec<SkippedRow>,
}

impl InsertReport {
    pub fn skip(&mut self, key: impl Into<String>, reason: SkipReason) {
        self.skipped.push(SkippedRow {
            key: key.into(),
            reason,
        });
    }

    pub fn skipped_with(&self, reason: &SkipReason) -> usize {
        self.skipped.iter().filter(|row| &row.reason == reason).count()
    }

    pub fn attempted(&self) -> usize {
        self.inserted + self.skipped.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_reason() {
        let mut report = InsertReport {
            inserted: 2,
            ..Default::default()
        };
        report.skip("1", SkipReason::Duplicate);
        report.skip("2", SkipReason::Duplicate);
        report.skip("3", SkipReason::MissingEmployer);

        assert_eq!(report.attempted(), 5);
        assert_eq!(report.skipped_with(&SkipReason::Duplicate), 2);
        assert_eq!(report.skipped_with(&SkipReason::MissingEmployer), 1);
    }

    #[test]
    fn non_database_errors_are_not_row_rejections() {
        assert_eq!(SkipReason::from_db_error(&sqlx::Error::PoolTimedOut), None);
        assert_eq!(SkipReason::from_db_error(&sqlx::Error::RowNotFound), None);
    }
}
