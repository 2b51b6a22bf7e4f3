use crate::models::employer::NewEmployer;
use crate::models::vacancy::{NewVacancy, NO_DESCRIPTION};
use crate::utils::time::parse_published_date;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct HhPage {
    #[serde(default)]
    pub items: Vec<Value>,
    pub found: Option<u64>,
    pub pages: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployerSummary {
    pub id: String,
    pub name: String,
    #[serde(skip)]
    pub raw: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("record is not a non-empty JSON object")]
    NotAnObject,

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{0}` is out of range")]
    OutOfRange(&'static str),
}

impl EmployerSummary {
    pub fn from_item(item: Value) -> Result<Self, NormalizeError> {
        if !item.is_object() {
            return Err(NormalizeError::NotAnObject);
        }
        let id = item
            .get("id")
            .and_then(id_from_value)
            .ok_or(NormalizeError::MissingField("id"))?;
        let name = non_empty_str(&item, "name")
            .ok_or(NormalizeError::MissingField("name"))?
            .to_string();
        Ok(Self { id, name, raw: item })
    }
}

/// Ids arrive as strings from hh.ru but as numbers from some mirrors.
fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty_str<'a>(record: &'a Value, field: &str) -> Option<&'a str> {
    record
        .get(field)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

pub fn normalize_employer(employer_id: &str, record: &Value) -> Result<NewEmployer, NormalizeError> {
    match record.as_object() {
        Some(obj) if !obj.is_empty() => {}
        _ => return Err(NormalizeError::NotAnObject),
    }

    let name = non_empty_str(record, "name").ok_or(NormalizeError::MissingField("name"))?;
    let url = non_empty_str(record, "alternate_url")
        .or_else(|| non_empty_str(record, "url"))
        .unwrap_or_default();
    let open_vacancies = match record.get("open_vacancies").and_then(|v| v.as_i64()) {
        Some(count) => {
            i32::try_from(count).map_err(|_| NormalizeError::OutOfRange("open_vacancies"))?
        }
        None => 0,
    };

    Ok(NewEmployer {
        employer_id: employer_id.to_string(),
        name: name.to_string(),
        url: url.to_string(),
        open_vacancies,
    })
}

pub fn normalize_vacancy(record: &Value) -> Result<NewVacancy, NormalizeError> {
    if !record.is_object() {
        return Err(NormalizeError::NotAnObject);
    }

    let name = non_empty_str(record, "name").ok_or(NormalizeError::MissingField("name"))?;
    let employer_id = record
        .get("employer")
        .and_then(|employer| employer.get("id"))
        .and_then(id_from_value)
        .ok_or(NormalizeError::MissingField("employer.id"))?;
    let url = non_empty_str(record, "alternate_url")
        .ok_or(NormalizeError::MissingField("alternate_url"))?;

    let description = record
        .get("snippet")
        .and_then(|snippet| non_empty_str(snippet, "responsibility"))
        .or_else(|| non_empty_str(record, "description"))
        .unwrap_or(NO_DESCRIPTION);

    Ok(NewVacancy {
        name: name.to_string(),
        description: description.to_string(),
        salary: salary_lower_bound(record)?,
        published_at: non_empty_str(record, "published_at").and_then(parse_published_date),
        employer_id,
        url: url.to_string(),
    })
}

fn salary_lower_bound(record: &Value) -> Result<Option<i32>, NormalizeError> {
    let Some(from) = record.get("salary").and_then(|salary| salary.get("from")) else {
        return Ok(None);
    };
    let value = match (from.as_i64(), from.as_f64()) {
        (Some(whole), _) => whole,
        (None, Some(fractional)) => fractional.round() as i64,
        (None, None) => return Ok(None),
    };
    i32::try_from(value)
        .map(Some)
        .map_err(|_| NormalizeError::OutOfRange("salary.from"))
}
