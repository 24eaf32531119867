//! CSV bulk intake.
//!
//! Files carry a header row naming `name`, `phone`, and `email` in any order
//! and any case. Extra columns are ignored and blank rows are skipped. Every
//! row is validated before anything is returned, so an import either takes
//! the whole file or nothing.
use crate::error::{LeadError, LeadResult};
use crate::lead::{Campaign, NewLead};
use csv::{ReaderBuilder, StringRecord};
use std::io::Read;

const REQUIRED_COLUMNS: [&str; 3] = ["name", "phone", "email"];

/// Template offered by `leadcall sample-csv`.
pub fn sample_csv() -> String {
    let mut text = REQUIRED_COLUMNS.join(",");
    text.push('\n');
    text.push_str("John Doe,+15551234567,john.doe@example.com\n");
    text.push_str("Jane Smith,+15559876543,jane.smith@example.com\n");
    text
}

struct ColumnMap {
    name: usize,
    phone: usize,
    email: usize,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> LeadResult<Self> {
        let find = |column: &str| {
            headers
                .iter()
                .position(|header| header.trim().eq_ignore_ascii_case(column))
                .ok_or_else(|| {
                    LeadError::Validation(format!("missing required column {column:?}"))
                })
        };
        Ok(Self {
            name: find("name")?,
            phone: find("phone")?,
            email: find("email")?,
        })
    }

    fn lead(&self, record: &StringRecord, campaign: Campaign) -> NewLead {
        let field = |idx: usize| record.get(idx).unwrap_or_default();
        NewLead::new(field(self.name), field(self.phone), field(self.email))
            .with_campaign(campaign)
    }
}

/// Parse and validate leads from CSV text.
pub fn read_leads<R: Read>(input: R, campaign: Campaign) -> LeadResult<Vec<NewLead>> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);
    let headers = reader
        .headers()
        .map_err(|err| LeadError::Validation(format!("read CSV header: {err}")))?
        .clone();
    let columns = ColumnMap::from_headers(&headers)?;

    let mut leads = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let fallback_line = idx as u64 + 2;
        let record =
            result.map_err(|err| LeadError::Validation(format!("line {fallback_line}: {err}")))?;
        if record.iter().all(|value| value.is_empty()) {
            continue;
        }
        let line = record
            .position()
            .map(|pos| pos.line())
            .unwrap_or(fallback_line);
        let lead = columns
            .lead(&record, campaign)
            .validated()
            .map_err(|err| LeadError::Validation(format!("line {line}: {err}")))?;
        leads.push(lead);
    }
    if leads.is_empty() {
        return Err(LeadError::Validation(
            "CSV contains no lead rows".to_string(),
        ));
    }
    tracing::debug!(rows = leads.len(), "parsed CSV leads");
    Ok(leads)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_match_in_any_order_and_case() {
        let csv = "Email,Extra,NAME,Phone\n\
                   asha@example.com,x,Asha Rao,+918985985974\n";
        let leads = read_leads(csv.as_bytes(), Campaign::Marketing).expect("parse");
        assert_eq!(
            leads,
            vec![NewLead::new("Asha Rao", "+918985985974", "asha@example.com")
                .with_campaign(Campaign::Marketing)]
        );
    }

    #[test]
    fn blank_rows_are_skipped() {
        let csv = "name,phone,email\n\
                   Asha,+918985985974,asha@example.com\n\
                   ,,\n\
                   \n\
                   Ravi,9876543210,ravi@example.com\n";
        let leads = read_leads(csv.as_bytes(), Campaign::Feedback).expect("parse");
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[1].name, "Ravi");
    }

    #[test]
    fn invalid_row_fails_whole_file_and_names_the_line() {
        let csv = "name,phone,email\n\
                   Asha,+918985985974,asha@example.com\n\
                   Ravi,,ravi@example.com\n";
        let err = read_leads(csv.as_bytes(), Campaign::Feedback).expect_err("bad row");
        assert_eq!(err.kind(), "validation");
        assert!(err.to_string().starts_with("line 3:"), "{err}");
    }

    #[test]
    fn missing_column_is_reported() {
        let err = read_leads("name,email\nAsha,a@b.co\n".as_bytes(), Campaign::Feedback)
            .expect_err("no phone column");
        assert!(err.to_string().contains("\"phone\""), "{err}");
    }

    #[test]
    fn header_only_file_is_rejected() {
        assert!(read_leads("name,phone,email\n".as_bytes(), Campaign::Feedback).is_err());
    }

    #[test]
    fn sample_template_parses() {
        let leads = read_leads(sample_csv().as_bytes(), Campaign::Feedback).expect("sample");
        assert_eq!(leads.len(), 2);
    }
}
