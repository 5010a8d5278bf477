//! Commission and shop tax on top of a service's base price.
//!
//! Values are kept at full precision; `PriceBreakdown` rounds to two decimals
//! only when serialised.
use bigdecimal::BigDecimal;
use serde::{Serialize, Serializer};
use utoipa::ToSchema;

use crate::utils::round_currency;

fn currency_serialize<S>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&round_currency(value).to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    #[schema(value_type = String)]
    #[serde(serialize_with = "currency_serialize")]
    pub base_price: BigDecimal,
    #[schema(value_type = String)]
    #[serde(serialize_with = "currency_serialize")]
    pub commission_rate: BigDecimal,
    #[schema(value_type = String)]
    #[serde(serialize_with = "currency_serialize")]
    pub tax_rate: BigDecimal,
    #[schema(value_type = String)]
    #[serde(serialize_with = "currency_serialize")]
    pub commission: BigDecimal,
    #[schema(value_type = String)]
    #[serde(serialize_with = "currency_serialize")]
    pub tax: BigDecimal,
    #[schema(value_type = String)]
    #[serde(serialize_with = "currency_serialize")]
    pub total: BigDecimal,
}

pub fn breakdown(
    base_price: &BigDecimal,
    commission_rate_pct: &BigDecimal,
    tax_rate_pct: &BigDecimal,
) -> PriceBreakdown {
    let commission = (base_price * commission_rate_pct) / BigDecimal::from(100);
    let tax = (base_price * tax_rate_pct) / BigDecimal::from(100);
    let total = base_price + &commission + &tax;
    PriceBreakdown {
        base_price: base_price.clone(),
        commission_rate: commission_rate_pct.clone(),
        tax_rate: tax_rate_pct.clone(),
        commission,
        tax,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::breakdown;
    use crate::constants::DEFAULT_COMMISSION_RATE;
    use bigdecimal::BigDecimal;
    use quickcheck_macros::quickcheck;
    use std::str::FromStr;

    #[test]
    fn test_default_commission_with_shop_tax() {
        let base = BigDecimal::from(100);
        let commission = BigDecimal::from(DEFAULT_COMMISSION_RATE);
        let result = breakdown(&base, &commission, &BigDecimal::from(15));
        assert_eq!(result.commission, BigDecimal::from(8));
        assert_eq!(result.tax, BigDecimal::from(15));
        assert_eq!(result.total, BigDecimal::from(123));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["commission"], "8.00");
        assert_eq!(json["tax"], "15.00");
        assert_eq!(json["total"], "123.00");
    }

    #[test]
    fn test_no_intermediate_rounding() {
        let base = BigDecimal::from_str("0.05").unwrap();
        let result = breakdown(&base, &BigDecimal::from(8), &BigDecimal::from(15));
        assert_eq!(result.commission, BigDecimal::from_str("0.004").unwrap());
        assert_eq!(result.tax, BigDecimal::from_str("0.0075").unwrap());
        assert_eq!(result.total, BigDecimal::from_str("0.0615").unwrap());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["total"], "0.06");
    }

    #[test]
    fn test_zero_tax_renders_two_decimals() {
        let base = BigDecimal::from(100);
        let result = breakdown(&base, &BigDecimal::from(8), &BigDecimal::from(0));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["taxRate"], "0.00");
        assert_eq!(json["tax"], "0.00");
        assert_eq!(json["total"], "108.00");
    }

    #[quickcheck]
    fn commission_and_tax_are_proportional(base_cents: u32, tax_pct: u8) -> bool {
        let base = BigDecimal::new(base_cents.into(), 2);
        let commission = BigDecimal::from(DEFAULT_COMMISSION_RATE);
        let result = breakdown(&base, &commission, &BigDecimal::from(tax_pct));
        let hundred = BigDecimal::from(100);
        &result.commission * &hundred == &base * &BigDecimal::from(8)
            && &result.tax * &hundred == &base * &BigDecimal::from(tax_pct)
            && result.total >= result.base_price
    }
}
