//! Decimal rounding used by the metrics check.

use bigdecimal::{BigDecimal, RoundingMode};

/// Rounds `value` to `places` fractional digits, ties to the even neighbour.
pub fn round_half_even(value: &BigDecimal, places: u32) -> BigDecimal {
    value.with_scale_round(i64::from(places), RoundingMode::HalfEven)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(text: &str) -> BigDecimal {
        BigDecimal::from_str(text).unwrap()
    }

    #[test]
    fn rounds_down_below_the_midpoint() {
        assert_eq!(round_half_even(&dec("5.149"), 1), dec("5.1"));
    }

    #[test]
    fn ties_go_to_the_even_digit() {
        assert_eq!(round_half_even(&dec("2.25"), 1), dec("2.2"));
        assert_eq!(round_half_even(&dec("2.35"), 1), dec("2.4"));
        assert_eq!(round_half_even(&dec("0.5"), 0), dec("0"));
        assert_eq!(round_half_even(&dec("1.5"), 0), dec("2"));
    }

    #[test]
    fn pads_values_with_fewer_digits() {
        assert_eq!(round_half_even(&dec("12.34"), 3), dec("12.340"));
    }
}
