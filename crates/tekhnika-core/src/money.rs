//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A 17% discount on 2 999,90 ₽ computed in floats drifts by a kopeck     │
//! │  depending on evaluation order.                                         │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Kopecks                                          │
//! │    299990 kopecks × 1700 bps → exact integer math, explicit rounding    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Prices arrive from the storefront API as decimals. They are converted once
//! at the edge with [`Money::from_decimal`] and never touch `f64`.
//!
//! Arithmetic saturates at the `i64` bounds; it never panics or wraps.
//!
//! ## Usage
//! ```rust
//! use tekhnika_core::money::Money;
//!
//! let price = Money::from_rubles(24_990);
//! let doubled = price * 2;
//! assert_eq!(doubled.kopecks(), 4_998_000);
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in kopecks (1/100 of a ruble).
///
/// ## Design Decisions
/// - **i64 (signed)**: differences (savings, refunds) can be negative
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serialized as the raw kopeck count** so cart snapshots stay exact
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Product.price ──► calculate_final_price() ──► CartLine.unit_price     │
/// │                                                      │                  │
/// │                                                      ▼                  │
/// │                        CartTotals.subtotal / savings / total            │
/// │                                                      │                  │
/// │                                                      ▼                  │
/// │                                              Order.total               │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from kopecks (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use tekhnika_core::money::Money;
    ///
    /// let price = Money::from_kopecks(1099);
    /// assert_eq!(price.kopecks(), 1099);
    /// ```
    #[inline]
    pub const fn from_kopecks(kopecks: i64) -> Self {
        Money(kopecks)
    }

    /// Creates a Money value from whole rubles.
    #[inline]
    pub const fn from_rubles(rubles: i64) -> Self {
        Money(rubles * 100)
    }

    /// Creates a Money value from rubles and kopecks.
    ///
    /// For negative amounts only the ruble part carries the sign:
    /// `from_rubles_kopecks(-5, 50)` is -5.50 ₽.
    #[inline]
    pub const fn from_rubles_kopecks(rubles: i64, kopecks: i64) -> Self {
        if rubles < 0 {
            Money(rubles * 100 - kopecks)
        } else {
            Money(rubles * 100 + kopecks)
        }
    }

    /// Converts a decimal ruble amount (as sent by the storefront API).
    ///
    /// Fractions of a kopeck are rounded half away from zero. Returns `None`
    /// when the amount does not fit in an `i64` kopeck count.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use tekhnika_core::money::Money;
    ///
    /// let price = Money::from_decimal(Decimal::new(1999_995, 3)).unwrap(); // 1999.995
    /// assert_eq!(price.kopecks(), 200_000);
    /// ```
    pub fn from_decimal(rubles: Decimal) -> Option<Self> {
        rubles
            .checked_mul(Decimal::ONE_HUNDRED)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .map(Money)
    }

    /// Returns the amount as a decimal ruble value with two places.
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Returns the value in kopecks.
    #[inline]
    pub const fn kopecks(&self) -> i64 {
        self.0
    }

    /// Returns the whole-ruble portion.
    #[inline]
    pub const fn rubles(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the kopeck portion (always 0-99).
    #[inline]
    pub const fn kopecks_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.saturating_abs())
    }

    /// Clamps negative amounts to zero.
    #[inline]
    pub const fn non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use tekhnika_core::money::Money;
    ///
    /// let unit_price = Money::from_rubles(4_990);
    /// assert_eq!(unit_price.multiply_quantity(3), Money::from_rubles(14_970));
    /// ```
    ///
    /// Saturates at the `i64` bounds instead of overflowing.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// ## Arguments
    /// * `discount_bps` - Discount in basis points (2000 = 20%)
    ///
    /// The discount amount is rounded half-up to the kopeck before it is
    /// subtracted. The result may be negative for rates above 100%; callers
    /// that display prices clamp it.
    ///
    /// ## Example
    /// ```rust
    /// use tekhnika_core::money::Money;
    ///
    /// let price = Money::from_rubles(1000);
    /// assert_eq!(price.apply_percentage_discount(2000), Money::from_rubles(800));
    /// ```
    pub fn apply_percentage_discount(&self, discount_bps: i64) -> Money {
        // i128 keeps large prices times large rates from overflowing
        let discount_amount = (self.0 as i128 * discount_bps as i128 + 5000) / 10000;
        let discounted = (self.0 as i128 - discount_amount).clamp(i64::MIN as i128, i64::MAX as i128);
        Money::from_kopecks(discounted as i64)
    }

    /// Share of `whole` that `part` represents, in whole percent, rounded
    /// half-up. Used for the "-17%" badge on product cards.
    pub fn percent_of(part: Money, whole: Money) -> u32 {
        if whole.0 <= 0 || part.0 <= 0 {
            return 0;
        }
        ((part.0 as i128 * 100 + whole.0 as i128 / 2) / whole.0 as i128) as u32
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows the amount as `1234.50 ₽`. Use the front end for localized output.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}.{:02} ₽",
            sign,
            self.rubles().unsigned_abs(),
            self.kopecks_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_kopecks() {
        let money = Money::from_kopecks(1099);
        assert_eq!(money.kopecks(), 1099);
        assert_eq!(money.rubles(), 10);
        assert_eq!(money.kopecks_part(), 99);
    }

    #[test]
    fn test_from_rubles_kopecks() {
        assert_eq!(Money::from_rubles_kopecks(10, 99).kopecks(), 1099);
        assert_eq!(Money::from_rubles_kopecks(-5, 50).kopecks(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_kopecks(1099).to_string(), "10.99 ₽");
        assert_eq!(Money::from_rubles(24_990).to_string(), "24990.00 ₽");
        assert_eq!(Money::from_kopecks(-550).to_string(), "-5.50 ₽");
        assert_eq!(Money::zero().to_string(), "0.00 ₽");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_rubles(10);
        let b = Money::from_rubles(5);

        assert_eq!(a + b, Money::from_rubles(15));
        assert_eq!(a - b, Money::from_rubles(5));
        assert_eq!(a * 3, Money::from_rubles(30));

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total, Money::from_rubles(20));
    }

    #[test]
    fn test_arithmetic_saturates() {
        let max = Money::from_kopecks(i64::MAX);
        let min = Money::from_kopecks(i64::MIN);

        assert_eq!(max + Money::from_kopecks(1), max);
        assert_eq!(min - Money::from_kopecks(1), min);
        assert_eq!(max.multiply_quantity(2), max);
        assert_eq!(max * 3, max);
        assert_eq!(min.abs(), max);
        assert_eq!(vec![max, max].into_iter().sum::<Money>(), max);
        assert_eq!(max.apply_percentage_discount(-10_000), max);
        assert_eq!(min.to_string().chars().next(), Some('-'));
    }

    #[test]
    fn test_percentage_discount_rounds_half_up() {
        // 999.99 ₽ at 15% = 149.9985 ₽ off → 150.00 ₽ off
        let price = Money::from_kopecks(99_999);
        assert_eq!(price.apply_percentage_discount(1500).kopecks(), 84_999);
    }

    #[test]
    fn test_from_decimal() {
        assert_eq!(
            Money::from_decimal(Decimal::new(1000, 0)),
            Some(Money::from_rubles(1000))
        );
        assert_eq!(
            Money::from_decimal(Decimal::new(2499_90, 2)),
            Some(Money::from_kopecks(249_990))
        );
        // 0.005 ₽ rounds away from zero to one kopeck
        assert_eq!(
            Money::from_decimal(Decimal::new(5, 3)),
            Some(Money::from_kopecks(1))
        );
        assert_eq!(Money::from_decimal(Decimal::MAX), None);
    }

    #[test]
    fn test_to_decimal() {
        assert_eq!(Money::from_kopecks(249_990).to_decimal(), Decimal::new(2499_90, 2));
    }

    #[test]
    fn test_non_negative() {
        assert_eq!(Money::from_kopecks(-1).non_negative(), Money::zero());
        assert_eq!(Money::from_kopecks(7).non_negative(), Money::from_kopecks(7));
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(Money::percent_of(Money::from_rubles(200), Money::from_rubles(1000)), 20);
        assert_eq!(Money::percent_of(Money::from_rubles(1), Money::from_rubles(3)), 33);
        assert_eq!(Money::percent_of(Money::from_rubles(1), Money::zero()), 0);
    }
}
