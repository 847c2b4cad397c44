//! Parsing helpers for timestamps and workout fields.

use chrono::{DateTime, Local, NaiveDate, TimeZone};

use dailies_core::EventField;

/// Parse a datetime string (ISO-8601 or YYYY-MM-DD) into epoch milliseconds.
///
/// A bare date means local noon on that day, which sits inside the day's
/// window regardless of DST transitions.
pub fn parse_timestamp(value: &str) -> anyhow::Result<i64> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.timestamp_millis());
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let naive = date
            .and_hms_opt(12, 0, 0)
            .ok_or_else(|| anyhow::anyhow!("Invalid date value: {}", value))?;
        let local = Local
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| anyhow::anyhow!("Date does not exist locally: {}", value))?;
        return Ok(local.timestamp_millis());
    }

    Err(anyhow::anyhow!(
        "Invalid date/time (expected ISO-8601 or YYYY-MM-DD): {}",
        value
    ))
}

/// Parse `--field` values, accepting repeated flags and comma-separated lists.
pub fn parse_event_fields(values: &[String]) -> anyhow::Result<Vec<EventField>> {
    let mut fields = Vec::new();
    for value in values {
        for part in value.split(',').map(str::trim).filter(|part| !part.is_empty()) {
            fields.push(part.parse::<EventField>()?);
        }
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_rfc3339() {
        assert_eq!(
            parse_timestamp("2024-01-10T12:00:00Z").unwrap(),
            1_704_888_000_000
        );
        assert_eq!(
            parse_timestamp("2024-01-10T14:00:00+02:00").unwrap(),
            1_704_888_000_000
        );
    }

    #[test]
    fn test_parse_timestamp_date_is_local_noon() {
        let millis = parse_timestamp("2024-01-10").unwrap();
        let local = Local.timestamp_millis_opt(millis).unwrap();
        assert_eq!(local.date_naive(), NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_parse_event_fields() {
        let fields =
            parse_event_fields(&["weight,numReps".to_string(), "duration-seconds".to_string()])
                .unwrap();
        assert_eq!(
            fields,
            vec![EventField::Weight, EventField::NumReps, EventField::DurationSeconds]
        );
        assert!(parse_event_fields(&["calories".to_string()]).is_err());
    }
}
