use validator::Validate;

pub fn validate_row<T: Validate>(row: &T) -> Result<(), String> {
    row.validate().map_err(|errors| {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let codes: Vec<&str> = errs.iter().map(|e| e.code.as_ref()).collect();
                format!("{} ({})", field, codes.join(", "))
            })
            .collect();
        fields.sort();
        format!("invalid fields: {}", fields.join("; "))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::employer::NewEmployer;

    #[test]
    fn reports_every_bad_field() {
        let row = NewEmployer {
            employer_id: String::new(),
            name: String::new(),
            url: String::new(),
            open_vacancies: -1,
        };
        let message = validate_row(&row).unwrap_err();
        assert!(message.contains("employer_id (length)"));
        assert!(message.contains("name (length)"));
        assert!(message.contains("open_vacancies (range)"));
    }

    #[test]
    fn accepts_a_complete_row() {
        let row = NewEmployer {
            employer_id: "42".into(),
            name: "Acme".into(),
            url: String::new(),
            open_vacancies: 3,
        };
        assert!(validate_row(&row).is_ok());
    }
}
