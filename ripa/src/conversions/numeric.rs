use crate::error::{ErrorKind, EtlError, EtlResult};
use crate::etl_error;

/// Parses an integer field.
///
/// Empty text (after trimming) is a missing value. Integral float spellings such as `"12.0"`
/// are accepted since exported spreadsheets often write whole numbers that way. Values must fit
/// the index's 32-bit `integer` type.
pub fn parse_integer(field: &str, value: &str) -> EtlResult<Option<i64>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }

    if let Ok(parsed) = value.parse::<i64>() {
        return match i32::try_from(parsed) {
            Ok(_) => Ok(Some(parsed)),
            Err(_) => Err(out_of_range(field, value)),
        };
    }

    match value.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() && parsed.fract() == 0.0 => {
            if parsed < f64::from(i32::MIN) || parsed > f64::from(i32::MAX) {
                return Err(out_of_range(field, value));
            }
            Ok(Some(parsed as i64))
        }
        Ok(_) => Err(etl_error!(
            ErrorKind::ConversionError,
            "Integer field holds a fractional value",
            format!("field `{field}` has value `{value}`")
        )),
        Err(err) => Err(etl_error!(
            ErrorKind::ConversionError,
            "Integer field could not be parsed",
            format!("field `{field}` has value `{value}`"),
            source: err
        )),
    }
}

/// Truncates a numeric literal toward zero and renders it as an integer string.
///
/// `"400.0"` becomes `"400"` and `"12.7"` becomes `"12"`. Values outside the `i64` range are
/// rejected.
pub fn truncate_to_integer_text(field: &str, value: &str) -> EtlResult<String> {
    let value = value.trim();
    let parsed = value.parse::<f64>().map_err(|err| {
        etl_error!(
            ErrorKind::ConversionError,
            "Numeric field could not be parsed",
            format!("field `{field}` has value `{value}`"),
            source: err
        )
    })?;

    if !parsed.is_finite() {
        return Err(etl_error!(
            ErrorKind::ConversionError,
            "Numeric field is not finite",
            format!("field `{field}` has value `{value}`")
        ));
    }

    // `i64::MAX as f64` rounds up to 2^63, so the upper bound is exclusive.
    let truncated = parsed.trunc();
    if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return Err(out_of_range(field, value));
    }

    Ok((truncated as i64).to_string())
}

fn out_of_range(field: &str, value: &str) -> EtlError {
    etl_error!(
        ErrorKind::ConversionError,
        "Numeric field is out of range",
        format!("field `{field}` has value `{value}`")
    )
}
