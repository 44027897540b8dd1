use std::{
    fmt,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Fraction digits of [`Money`] (minor units).
const MONEY_SCALE: u32 = 2;
/// Fraction digits of [`UnitCost`] (micro units).
const UNIT_COST_SCALE: u32 = 6;
/// Micro units per minor unit (the 4 guard digits of [`UnitCost`]).
const GUARD: i64 = 10_000;

/// Signed money amount represented as **integer minor units** (cents).
///
/// Use this type for **all** monetary values crossing the engine boundary.
/// Amounts arrive and leave as plain decimal strings (never binary floats):
///
/// ```rust
/// use engine::Money;
///
/// let amount: Money = "10.50".parse().unwrap();
/// assert_eq!(amount.minor(), 1050);
/// assert_eq!(amount.to_string(), "10.50");
/// ```
///
/// Parsing accepts `.` or `,` as decimal separator and rejects more than 2
/// fraction digits:
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!("10".parse::<Money>().unwrap().minor(), 1000);
/// assert!("12.345".parse::<Money>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a new amount from integer minor units.
    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns `true` if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Multiplies the amount by an integer quantity.
    pub fn times(self, quantity: i64) -> Result<Money, EngineError> {
        self.0
            .checked_mul(quantity)
            .map(Money)
            .ok_or_else(|| EngineError::InvalidAmount("amount too large".to_string()))
    }

    /// Returns `pct` percent of the amount, rounded half-up at the minor unit.
    ///
    /// The intermediate product is carried in i128, so the only rounding step
    /// is the final division:
    ///
    /// ```rust
    /// use engine::{Money, Percent};
    ///
    /// let gross: Money = "1000.00".parse().unwrap();
    /// let rate: Percent = "5".parse().unwrap();
    /// assert_eq!(gross.percent_of(rate).to_string(), "50.00");
    /// ```
    #[must_use]
    pub fn percent_of(self, pct: Percent) -> Money {
        let numer = i128::from(self.0) * i128::from(pct.hundredths());
        Money(div_round_half_up(numer, 10_000) as i64)
    }

    /// Rounds a total expressed in micro units (from [`UnitCost`] math) down
    /// to minor units, half-up. This is the single presentation-time rounding
    /// step for chained unit-cost computations.
    pub fn from_micro_total(micro: i128) -> Result<Money, EngineError> {
        let minor = div_round_half_up(micro, i128::from(GUARD));
        i64::try_from(minor)
            .map(Money)
            .map_err(|_| EngineError::InvalidAmount("amount too large".to_string()))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_scaled(i128::from(self.0), MONEY_SCALE))
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl FromStr for Money {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_scaled(s, MONEY_SCALE).map(|v| {
            Money(v as i64)
        })
    }
}

/// Per-unit cost represented as **integer micro units** (6 fraction digits).
///
/// Landed unit cost is the result of a division (`expenses / quantity`), so
/// it is carried with 4 guard digits beyond the minor unit and rounded to
/// [`Money`] only at presentation. All chained computations (COGS totals)
/// stay in micro units until the final rounding step.
///
/// ```rust
/// use engine::{Money, UnitCost};
///
/// // 1.00 of freight spread over 3 received units.
/// let spread = UnitCost::allocate("1.00".parse().unwrap(), 3).unwrap();
/// assert_eq!(spread.micro(), 333_333);
/// assert_eq!(spread.to_string(), "0.333333");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct UnitCost(i64);

impl UnitCost {
    pub const ZERO: UnitCost = UnitCost(0);

    /// Creates a unit cost from raw micro units.
    #[must_use]
    pub const fn from_micro(micro: i64) -> Self {
        Self(micro)
    }

    /// Returns the raw value in micro units.
    #[must_use]
    pub const fn micro(self) -> i64 {
        self.0
    }

    /// Widens a minor-unit amount to an exact micro-unit cost.
    pub fn from_money(money: Money) -> Result<UnitCost, EngineError> {
        money
            .minor()
            .checked_mul(GUARD)
            .map(UnitCost)
            .ok_or_else(|| EngineError::InvalidAmount("unit cost too large".to_string()))
    }

    /// Spreads `total` over `quantity` units: the one rounded division of the
    /// landed-cost pipeline, rounded half-up at the micro unit.
    pub fn allocate(total: Money, quantity: i64) -> Result<UnitCost, EngineError> {
        if quantity <= 0 {
            return Err(EngineError::InvalidQuantity(
                "allocation quantity must be > 0".to_string(),
            ));
        }
        let micro = div_round_half_up(
            i128::from(total.minor()) * i128::from(GUARD),
            i128::from(quantity),
        );
        i64::try_from(micro)
            .map(UnitCost)
            .map_err(|_| EngineError::InvalidAmount("unit cost too large".to_string()))
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: UnitCost) -> Option<UnitCost> {
        self.0.checked_add(rhs.0).map(UnitCost)
    }

    /// Exact micro-unit total for `quantity` units. Round with
    /// [`Money::from_micro_total`] only after summing across lots.
    #[must_use]
    pub fn total_for(self, quantity: i64) -> i128 {
        i128::from(self.0) * i128::from(quantity)
    }

    /// Rounds to minor units, half-up. Presentation only.
    #[must_use]
    pub fn to_money(self) -> Money {
        Money(div_round_half_up(i128::from(self.0), i128::from(GUARD)) as i64)
    }
}

impl fmt::Display for UnitCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_scaled(i128::from(self.0), UNIT_COST_SCALE))
    }
}

impl FromStr for UnitCost {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_scaled(s, UNIT_COST_SCALE).map(|v| UnitCost(v as i64))
    }
}

/// Percentage represented as **integer hundredths of a percent**.
///
/// Used both for commission-rule values (`"5"` = 5%) and for margins
/// (`"16.67"` = 16.67%). Parsing rejects more than 2 fraction digits so a
/// stored rule value round-trips exactly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Percent(i64);

impl Percent {
    pub const ZERO: Percent = Percent(0);

    /// Creates a percentage from raw hundredths (`500` = 5%).
    #[must_use]
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Self(hundredths)
    }

    /// Returns the raw value in hundredths of a percent.
    #[must_use]
    pub const fn hundredths(self) -> i64 {
        self.0
    }

    /// `numer / denom * 100`, rounded half-up at the second fraction digit.
    ///
    /// Returns [`Percent::ZERO`] when `denom` is zero rather than dividing by
    /// zero (the margin-of-a-free-invoice case).
    #[must_use]
    pub fn ratio(numer: Money, denom: Money) -> Percent {
        if denom.is_zero() {
            return Percent::ZERO;
        }
        let scaled = i128::from(numer.minor()) * 10_000;
        Percent(div_round_half_up(scaled, i128::from(denom.minor())) as i64)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_scaled(i128::from(self.0), 2))
    }
}

impl FromStr for Percent {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_scaled(s, 2).map(|v| Percent(v as i64))
    }
}

/// Division rounding half away from zero. `d` must be positive.
fn div_round_half_up(n: i128, d: i128) -> i128 {
    debug_assert!(d > 0);
    if n >= 0 {
        (n + d / 2) / d
    } else {
        -((-n + d / 2) / d)
    }
}

/// Parses a decimal string into an integer scaled by `10^scale`.
///
/// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`.
/// Rejects empty/invalid strings and more than `scale` fraction digits.
fn parse_scaled(s: &str, scale: u32) -> Result<i128, EngineError> {
    let empty = || EngineError::InvalidAmount("empty amount".to_string());
    let invalid = || EngineError::InvalidAmount(format!("invalid amount: {s}"));
    let overflow = || EngineError::InvalidAmount("amount too large".to_string());

    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(empty());
    }

    let (sign, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
        (-1i128, stripped)
    } else if let Some(stripped) = trimmed.strip_prefix('+') {
        (1i128, stripped)
    } else {
        (1i128, trimmed)
    };

    let rest = rest.trim();
    if rest.is_empty() {
        return Err(empty());
    }

    let rest = rest.replace(',', ".");
    let mut parts = rest.split('.');
    let int_str = parts.next().ok_or_else(invalid)?;
    let frac_str = parts.next();

    if parts.next().is_some() {
        return Err(invalid());
    }

    if int_str.is_empty() || !int_str.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let int_part: i128 = int_str.parse().map_err(|_| invalid())?;

    let frac_part: i128 = match frac_str {
        None | Some("") => 0,
        Some(frac) => {
            if !frac.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            if frac.len() as u32 > scale {
                return Err(EngineError::InvalidAmount(format!(
                    "too many decimals (max {scale}): {s}"
                )));
            }
            let digits: i128 = frac.parse().map_err(|_| invalid())?;
            digits * 10i128.pow(scale - frac.len() as u32)
        }
    };

    let total = int_part
        .checked_mul(10i128.pow(scale))
        .and_then(|v| v.checked_add(frac_part))
        .ok_or_else(overflow)?;
    let signed = total.checked_mul(sign).ok_or_else(overflow)?;
    if i64::try_from(signed).is_err() {
        return Err(overflow());
    }
    Ok(signed)
}

/// Formats an integer scaled by `10^scale` as a plain decimal string.
fn format_scaled(value: i128, scale: u32) -> String {
    let sign = if value < 0 { "-" } else { "" };
    let abs = value.unsigned_abs();
    let base = 10u128.pow(scale);
    let int_part = abs / base;
    let frac_part = abs % base;
    format!("{sign}{int_part}.{frac_part:0width$}", width = scale as usize)
}
