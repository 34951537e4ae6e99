//! Currency-safe arithmetic shared by all pricing code.
//!
//! Amounts, quantities and percentages are `Decimal` throughout. Values
//! arriving from the browser as JSON numbers pass through [`to_money`] once,
//! at the boundary, so NaN/infinity can never reach the calculations.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Reported amounts carry two decimal places
pub const MONEY_SCALE: u32 = 2;

/// Quantities, rates and dimensions are stored with four places
pub const QUANTITY_SCALE: u32 = 4;

/// Discount percentages are stored with two places
pub const PERCENT_SCALE: u32 = 2;

/// Tax rates are stored with four places
pub const TAX_RATE_SCALE: u32 = 4;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Convert a raw JSON number into a money value.
///
/// NaN, infinities, values outside the `Decimal` range and negative zero all
/// become zero.
pub fn to_money(value: f64) -> Decimal {
    if !value.is_finite() {
        return Decimal::ZERO;
    }

    match Decimal::from_f64(value) {
        Some(d) if d.is_zero() => Decimal::ZERO,
        Some(d) => d,
        None => Decimal::ZERO,
    }
}

/// Clamp a percentage into [0, 100]
pub fn clamp_percent(percent: Decimal) -> Decimal {
    percent.clamp(Decimal::ZERO, HUNDRED)
}

/// Floor a value at zero
pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

fn saturated(negative: bool) -> Decimal {
    if negative {
        Decimal::MIN
    } else {
        Decimal::MAX
    }
}

/// `a × b`, pinned to `Decimal::MAX`/`MIN` instead of overflowing
pub fn mul_saturating(a: Decimal, b: Decimal) -> Decimal {
    a.checked_mul(b)
        .unwrap_or_else(|| saturated(a.is_sign_negative() != b.is_sign_negative()))
}

/// `a + b`, pinned to `Decimal::MAX`/`MIN` instead of overflowing
pub fn add_saturating(a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b).unwrap_or_else(|| saturated(a.is_sign_negative()))
}

/// Sum that saturates rather than panicking on absurd form input
pub fn sum_saturating<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    values.into_iter().fold(Decimal::ZERO, add_saturating)
}

/// `amount × percent / 100`
///
/// Near the top of the `Decimal` range the division happens first so the
/// product still fits.
pub fn percent_of(amount: Decimal, percent: Decimal) -> Decimal {
    match amount.checked_mul(percent) {
        Some(product) => product / HUNDRED,
        None => mul_saturating(amount / HUNDRED, percent),
    }
}

/// `amount × (1 − percent/100)` with the percentage clamped to [0, 100],
/// so a discount can neither invert nor exceed the amount.
pub fn apply_discount(amount: Decimal, percent: Decimal) -> Decimal {
    percent_of(amount, HUNDRED - clamp_percent(percent))
}

/// Round to [`MONEY_SCALE`] places, midpoint away from zero
pub fn round_money(amount: Decimal) -> Decimal {
    round_half_up(amount, MONEY_SCALE)
}

fn round_half_up(value: Decimal, scale: u32) -> Decimal {
    let rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        Decimal::ZERO
    } else {
        rounded
    }
}

/// Round a quantity, rate or dimension to [`QUANTITY_SCALE`] places
pub fn round_quantity(value: Decimal) -> Decimal {
    round_half_up(value, QUANTITY_SCALE)
}

/// Round a discount percentage to [`PERCENT_SCALE`] places
pub fn round_percent(value: Decimal) -> Decimal {
    round_half_up(value, PERCENT_SCALE)
}

pub fn round_tax_rate(value: Decimal) -> Decimal {
    round_half_up(value, TAX_RATE_SCALE)
}

/// Read a loosely-typed form value: numbers and numeric strings are
/// accepted, anything else is `None`.
fn from_json_value(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => {
            let repr = n.to_string();
            repr.parse::<Decimal>()
                .ok()
                .or_else(|| n.as_f64().filter(|v| v.is_finite()).map(to_money))
        }
        serde_json::Value::String(s) => s.trim().parse::<Decimal>().ok(),
        _ => None,
    }
}

/// `#[serde(deserialize_with = "money::lenient::deserialize")]` for amounts
/// typed into the quote form. Missing, null or garbage values become zero.
pub mod lenient {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(value
            .as_ref()
            .and_then(super::from_json_value)
            .map(|d| if d.is_zero() { Decimal::ZERO } else { d })
            .unwrap_or(Decimal::ZERO))
    }
}

/// Optional variant of [`lenient`]: missing, null or garbage values become
/// `None` so the caller's default applies.
pub mod lenient_option {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(super::from_json_value))
    }
}
