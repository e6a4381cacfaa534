//! # Money
//!
//! Integer currency amounts and the percentage arithmetic used by pricing.
//! Rupiah has no minor unit in practice, so one unit is one Rupiah and no
//! floats are involved anywhere:
//!
//! ```text
//! Rp 100.000 at 20% off  →  100000 - round(100000 × 20 / 100)  →  80000
//! ```
//!
//! ```rust
//! use topup_core::money::Money;
//!
//! let price = Money::from_units(15_000);
//! let doubled = price * 2;
//! assert_eq!(doubled.units(), 30_000);
//! assert_eq!(doubled.to_string(), "Rp 30.000");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

/// Whole Rupiah. Stored as SQLite INTEGER and serialized as a bare number.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units)
    }

    #[inline]
    pub const fn units(&self) -> i64 {
        self.0
    }

    pub const fn zero() -> Self {
        Money(0)
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Only adjustments go below zero; catalog prices never do.
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the discount amount for a whole-number percentage.
    ///
    /// ## Rounding
    /// Half rounds up, matching standard rounding of the fractional
    /// discount: `(amount * pct + 50) / 100`. Computed in i128 so large
    /// amounts cannot overflow the intermediate product.
    ///
    /// ## Example
    /// ```rust
    /// use topup_core::money::Money;
    ///
    /// // 15% of 1,003 = 150.45 → 150
    /// assert_eq!(Money::from_units(1_003).percentage_of(15).units(), 150);
    /// // 50% of 3 = 1.5 → 2
    /// assert_eq!(Money::from_units(3).percentage_of(50).units(), 2);
    /// ```
    pub fn percentage_of(&self, percent: u8) -> Money {
        let amount = (self.0 as i128 * percent as i128 + 50) / 100;
        Money::from_units(amount as i64)
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// ## Example
    /// ```rust
    /// use topup_core::money::Money;
    ///
    /// let price = Money::from_units(100_000);
    /// assert_eq!(price.apply_percentage_discount(20).units(), 80_000);
    /// ```
    pub fn apply_percentage_discount(&self, percent: u8) -> Money {
        *self - self.percentage_of(percent)
    }
}

impl Money {
    /// Formats with a currency symbol and `.` thousands separators,
    /// e.g. `"Rp 1.250.000"`.
    pub fn format_with(&self, symbol: &str) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.0.unsigned_abs().to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        format!("{}{} {}", sign, symbol, grouped)
    }
}

/// Indonesian grouping with the Rupiah symbol: `Rp 1.250.000`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_with("Rp"))
    }
}

macro_rules! money_op {
    ($op:ident, $method:ident, $assign:ident, $assign_method:ident, $sym:tt) => {
        impl $op for Money {
            type Output = Money;

            #[inline]
            fn $method(self, rhs: Money) -> Money {
                Money(self.0 $sym rhs.0)
            }
        }

        impl $assign for Money {
            #[inline]
            fn $assign_method(&mut self, rhs: Money) {
                *self = *self $sym rhs;
            }
        }
    };
}

money_op!(Add, add, AddAssign, add_assign, +);
money_op!(Sub, sub, SubAssign, sub_assign, -);

/// Scales by a package count.
impl Mul<i64> for Money {
    type Output = Money;

    #[inline]
    fn mul(self, count: i64) -> Money {
        Money(self.0 * count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_units() {
        let money = Money::from_units(86_000);
        assert_eq!(money.units(), 86_000);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_units(0).to_string(), "Rp 0");
        assert_eq!(Money::from_units(999).to_string(), "Rp 999");
        assert_eq!(Money::from_units(1_000).to_string(), "Rp 1.000");
        assert_eq!(Money::from_units(100_000).to_string(), "Rp 100.000");
        assert_eq!(Money::from_units(1_250_000).to_string(), "Rp 1.250.000");
        assert_eq!(Money::from_units(-5_500).to_string(), "-Rp 5.500");
    }

    #[test]
    fn test_format_with_symbol() {
        assert_eq!(Money::from_units(80_000).format_with("IDR"), "IDR 80.000");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_units(10_000);
        let b = Money::from_units(2_500);

        assert_eq!((a + b).units(), 12_500);
        assert_eq!((a - b).units(), 7_500);
        assert_eq!((a * 3).units(), 30_000);

        let mut c = a;
        c += b;
        c -= Money::from_units(500);
        assert_eq!(c.units(), 12_000);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        // 10% of 15 = 1.5 → 2
        assert_eq!(Money::from_units(15).percentage_of(10).units(), 2);
        // 10% of 14 = 1.4 → 1
        assert_eq!(Money::from_units(14).percentage_of(10).units(), 1);
        // 10% of 16 = 1.6 → 2
        assert_eq!(Money::from_units(16).percentage_of(10).units(), 2);
    }

    #[test]
    fn test_percentage_discount_bounds() {
        let price = Money::from_units(12_345);
        assert_eq!(price.apply_percentage_discount(0), price);
        assert_eq!(price.apply_percentage_discount(100), Money::zero());
    }

    #[test]
    fn test_large_amount_does_not_overflow() {
        let price = Money::from_units(i64::MAX / 2);
        let discounted = price.apply_percentage_discount(50);
        assert!(discounted.is_positive());
        assert!(discounted <= price);
    }

    #[test]
    fn test_zero_and_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_units(1).is_positive());
        assert!(Money::from_units(-1).is_negative());
        assert_eq!(Money::default(), Money::zero());
    }
}
