use crate::transform::columns;
use crate::types::RawRecord;

fn base_values(stop_id: &str, pid: &str) -> Vec<(&'static str, String)> {
    [
        (columns::STOP_ID, stop_id),
        (columns::PID, pid),
        ("ori", "CA0371100"),
        ("agency", "SD"),
        (columns::EXP_YEARS, "8"),
        (columns::DATE_STOP, "2022-01-25"),
        (columns::TIME_STOP, "10:10:05"),
        (columns::STOP_DURATION, "15"),
        (columns::STOP_IN_RESPONSE_TO_CFS, "0"),
        ("officer_assignment_key", "1"),
        (
            columns::ASSIGNMENT,
            "Patrol, traffic enforcement, field operations",
        ),
        (columns::INTERSECTION, ""),
        (columns::ADDRESS_BLOCK, "400.0"),
        (columns::LAND_MARK, ""),
        (columns::ADDRESS_STREET, "Elm St"),
        (columns::HIGHWAY_EXIT, ""),
        ("isschool", "0"),
        (columns::SCHOOL_NAME, ""),
        (columns::ADDRESS_CITY, "San Diego"),
        (columns::BEAT, "521"),
        ("beat_name", "Pacific Beach 521"),
        ("isstudent", "0"),
        (columns::PERCEIVED_LIMITED_ENGLISH, "0"),
        (columns::PERCEIVED_AGE, "30"),
        (columns::PERCEIVED_GENDER, "Female"),
        (columns::GEND, "2"),
        (columns::GEND_NC, ""),
        (columns::PERCEIVED_LGBT, "No"),
        (columns::GENDER_NONCONFORMING, ""),
    ]
    .into_iter()
    .map(|(column, value)| (column, value.to_string()))
    .collect()
}

/// A well-formed stop row for `stop_id` and `pid`.
pub fn stop_record(stop_id: &str, pid: &str) -> RawRecord {
    base_values(stop_id, pid).into_iter().collect()
}

/// A stop row with some columns replaced or added.
pub fn stop_record_with(stop_id: &str, pid: &str, overrides: &[(&str, &str)]) -> RawRecord {
    let mut values: Vec<(String, String)> = base_values(stop_id, pid)
        .into_iter()
        .map(|(column, value)| (column.to_string(), value))
        .collect();

    for (column, value) in overrides {
        values.retain(|(existing, _)| existing != column);
        values.push((column.to_string(), value.to_string()));
    }

    values.into_iter().collect()
}

/// A stop row lacking `column`.
pub fn stop_record_without(stop_id: &str, pid: &str, column: &str) -> RawRecord {
    base_values(stop_id, pid)
        .into_iter()
        .filter(|(name, _)| *name != column)
        .collect()
}

/// CSV text with a header and one well-formed row per `(stop_id, pid)`.
pub fn stop_csv(ids: &[(&str, &str)]) -> String {
    let header: Vec<&str> = base_values("", "")
        .into_iter()
        .map(|(column, _)| column)
        .collect();

    let mut csv = header.join(",");
    csv.push('\n');

    for (stop_id, pid) in ids {
        let row: Vec<String> = base_values(stop_id, pid)
            .into_iter()
            .map(|(_, value)| quote(&value))
            .collect();
        csv.push_str(&row.join(","));
        csv.push('\n');
    }

    csv
}

fn quote(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
