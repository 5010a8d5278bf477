use actix_web::dev::{Payload, ServiceRequest};
use actix_web::web::Bytes;
use bigdecimal::{BigDecimal, RoundingMode, Zero};
use futures_util::stream::{self};
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}

pub fn get_header_value(req: &ServiceRequest, header_name: &str) -> Option<String> {
    req.headers()
        .get(header_name)
        .and_then(|h| h.to_str().ok())
        .map(|h| h.to_string())
}

pub fn bytes_to_payload(buf: Bytes) -> Payload {
    let stream = stream::once(async move { Ok::<_, actix_web::error::PayloadError>(buf) });
    Payload::Stream {
        payload: Box::pin(stream),
    }
}

/// Currency presentation: two decimals, half-up.
pub fn round_currency(value: &BigDecimal) -> BigDecimal {
    let rounded = value.with_scale_round(2, RoundingMode::HalfUp);
    // Zero comes back at scale 0 and would render as "0".
    if rounded.is_zero() {
        return BigDecimal::new(0.into(), 2);
    }
    rounded
}

/// Amount in minor units (cents) for gateways that expect integers.
pub fn to_minor_units(value: &BigDecimal) -> Option<i64> {
    use bigdecimal::ToPrimitive;
    (round_currency(value) * BigDecimal::from(100)).to_i64()
}

pub fn from_minor_units(value: i64) -> BigDecimal {
    BigDecimal::new(value.into(), 2)
}

/// Accepts `"150.00"` or `150.00` without going through binary floating point.
pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let text = match value {
        serde_json::Value::String(text) => text,
        serde_json::Value::Number(number) => number.to_string(),
        other => {
            return Err(serde::de::Error::custom(format!(
                "invalid amount: {}",
                other
            )))
        }
    };
    BigDecimal::from_str(text.trim()).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::{from_minor_units, round_currency, to_minor_units};
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    #[test]
    fn test_round_currency_half_up() {
        let value = BigDecimal::from_str("10.005").unwrap();
        assert_eq!(round_currency(&value).to_string(), "10.01");
        let value = BigDecimal::from_str("7").unwrap();
        assert_eq!(round_currency(&value).to_string(), "7.00");
    }

    #[test]
    fn test_round_currency_keeps_two_decimals_for_zero() {
        assert_eq!(round_currency(&BigDecimal::from(0)).to_string(), "0.00");
        let value = BigDecimal::from_str("0.004").unwrap();
        assert_eq!(round_currency(&value).to_string(), "0.00");
        let value = BigDecimal::from_str("100.00").unwrap() - BigDecimal::from_str("100.00").unwrap();
        assert_eq!(round_currency(&value).to_string(), "0.00");
    }

    #[test]
    fn test_minor_unit_conversion() {
        let value = BigDecimal::from_str("150.25").unwrap();
        assert_eq!(to_minor_units(&value), Some(15025));
        assert_eq!(from_minor_units(15025), value);
    }
}
