use log::warn;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parses a stored decimal column into a `Decimal`.
///
/// Money columns are stored as TEXT. Legacy rows written by earlier tooling
/// may carry float formatting, so on a failed exact parse we fall back
/// through `f64` before giving up and logging.
pub fn parse_stored_decimal(value_str: &str, field_name: &str) -> Decimal {
    match Decimal::from_str(value_str) {
        Ok(d) => d,
        Err(_) => match f64::from_str(value_str) {
            Ok(f_val) => match Decimal::from_f64(f_val) {
                Some(d) => d,
                None => {
                    warn!(
                        "Failed to convert {} '{}' (parsed as f64: {}) to Decimal. Falling back to ZERO.",
                        field_name, value_str, f_val
                    );
                    Decimal::ZERO
                }
            },
            Err(e) => {
                warn!(
                    "Failed to parse {} '{}' as a decimal (err: {}). Falling back to ZERO.",
                    field_name, value_str, e
                );
                Decimal::ZERO
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_exact_decimal_text() {
        assert_eq!(parse_stored_decimal("10050.25", "balance"), dec!(10050.25));
    }

    #[test]
    fn falls_back_through_f64_for_float_formatting() {
        assert_eq!(parse_stored_decimal("1e2", "balance"), dec!(100));
    }

    #[test]
    fn malformed_input_parses_to_zero() {
        assert_eq!(parse_stored_decimal("not-a-number", "balance"), Decimal::ZERO);
    }
}
