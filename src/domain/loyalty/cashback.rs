//! Cashback computation.
//!
//! All money math here runs on f64 major units, so every input passes the
//! safe-number guard and every output is rounded to two decimals with a
//! small epsilon compensating floating-point drift before the final round.

use super::LoyaltyProgram;

/// Epsilon added before rounding so values like 4999.9999999 settle on the
/// intended cent.
const ROUNDING_EPSILON: f64 = 1e-9;

/// Normalizes a possibly-invalid numeric input.
///
/// NaN and infinities are coerced to 0 with a logged warning rather than
/// propagating invalid state into persisted balances. Negative amounts are
/// clamped to 0 the same way.
pub fn safe_number(value: f64, field: &str) -> f64 {
    if !value.is_finite() {
        tracing::warn!(field, %value, "non-finite numeric input coerced to 0");
        return 0.0;
    }
    if value < 0.0 {
        tracing::warn!(field, %value, "negative numeric input coerced to 0");
        return 0.0;
    }
    value
}

/// Parses an amount string from an external payload.
///
/// Empty, non-numeric, or malformed inputs (e.g. two decimal points) parse
/// as 0 with a logged warning.
pub fn parse_amount(raw: &str, field: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) => safe_number(value, field),
        Err(_) => {
            tracing::warn!(field, raw, "malformed numeric input coerced to 0");
            0.0
        }
    }
}

/// Rounds to two decimal places, drift-compensated.
pub fn round2(value: f64) -> f64 {
    ((value + ROUNDING_EPSILON) * 100.0).round() / 100.0
}

/// Computes the cashback a program grants for an invoice amount.
///
/// Returns 0 below the program's minimum purchase amount; otherwise the
/// program percentage of the amount, clamped to the per-invoice cap when one
/// is set, rounded to two decimals.
pub fn calculate_cashback(program: &LoyaltyProgram, invoice_amount: f64) -> f64 {
    let amount = safe_number(invoice_amount, "invoice_amount");
    let percentage = safe_number(program.cashback_percentage, "cashback_percentage");
    let minimum = safe_number(program.minimum_purchase_amount, "minimum_purchase_amount");

    if amount < minimum {
        return 0.0;
    }

    let mut cashback = amount * percentage / 100.0;
    if let Some(cap) = program.maximum_cashback_amount {
        let cap = safe_number(cap, "maximum_cashback_amount");
        if cap > 0.0 && cashback > cap {
            cashback = cap;
        }
    }
    round2(cashback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::TenantId;
    use proptest::prelude::*;

    fn program(percentage: f64, minimum: f64, cap: Option<f64>) -> LoyaltyProgram {
        let mut p = LoyaltyProgram::default_for_tenant(TenantId::new());
        p.cashback_percentage = percentage;
        p.minimum_purchase_amount = minimum;
        p.maximum_cashback_amount = cap;
        p
    }

    #[test]
    fn below_minimum_earns_nothing() {
        let p = program(5.0, 10_000.0, Some(5_000.0));
        assert_eq!(calculate_cashback(&p, 9_999.0), 0.0);
        assert_eq!(calculate_cashback(&p, 0.0), 0.0);
    }

    #[test]
    fn at_minimum_earns_percentage() {
        let p = program(5.0, 10_000.0, Some(5_000.0));
        assert_eq!(calculate_cashback(&p, 10_000.0), 500.0);
    }

    #[test]
    fn large_amount_clamps_to_cap() {
        let p = program(5.0, 10_000.0, Some(5_000.0));
        // 5% of 200,000 is 10,000, clamped to the 5,000 cap
        assert_eq!(calculate_cashback(&p, 200_000.0), 5_000.0);
    }

    #[test]
    fn uncapped_program_does_not_clamp() {
        let p = program(5.0, 10_000.0, None);
        assert_eq!(calculate_cashback(&p, 200_000.0), 10_000.0);
    }

    #[test]
    fn result_rounds_to_two_decimals() {
        let p = program(2.5, 0.0, None);
        // 2.5% of 333.33 = 8.33325 -> 8.33
        assert_eq!(calculate_cashback(&p, 333.33), 8.33);
    }

    #[test]
    fn nan_inputs_coerce_to_zero() {
        let p = program(5.0, 10_000.0, Some(5_000.0));
        assert_eq!(calculate_cashback(&p, f64::NAN), 0.0);

        let broken = program(f64::NAN, 0.0, None);
        assert_eq!(calculate_cashback(&broken, 20_000.0), 0.0);
    }

    #[test]
    fn infinite_amount_coerces_to_zero() {
        let p = program(5.0, 10_000.0, Some(5_000.0));
        assert_eq!(calculate_cashback(&p, f64::INFINITY), 0.0);
    }

    #[test]
    fn negative_amount_coerces_to_zero() {
        let p = program(5.0, 0.0, None);
        assert_eq!(calculate_cashback(&p, -100.0), 0.0);
    }

    #[test]
    fn parse_amount_handles_malformed_input() {
        assert_eq!(parse_amount("123.45", "amount"), 123.45);
        assert_eq!(parse_amount("", "amount"), 0.0);
        assert_eq!(parse_amount("12.3.4", "amount"), 0.0);
        assert_eq!(parse_amount("abc", "amount"), 0.0);
        assert_eq!(parse_amount(" 10 ", "amount"), 10.0);
    }

    #[test]
    fn round2_settles_drifted_values() {
        assert_eq!(round2(4999.999999999), 5000.0);
        assert_eq!(round2(8.33325), 8.33);
        assert_eq!(round2(0.005), 0.01);
    }

    proptest! {
        // Cashback is monotonically non-decreasing in the invoice amount up
        // to the cap, then constant.
        #[test]
        fn cashback_is_monotone(a in 0.0f64..1_000_000.0, b in 0.0f64..1_000_000.0) {
            let p = program(5.0, 10_000.0, Some(5_000.0));
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(calculate_cashback(&p, lo) <= calculate_cashback(&p, hi));
        }

        #[test]
        fn cashback_never_exceeds_cap(amount in 0.0f64..10_000_000.0) {
            let p = program(5.0, 10_000.0, Some(5_000.0));
            prop_assert!(calculate_cashback(&p, amount) <= 5_000.0);
        }

        #[test]
        fn cashback_is_never_negative(amount in proptest::num::f64::ANY) {
            let p = program(5.0, 10_000.0, Some(5_000.0));
            prop_assert!(calculate_cashback(&p, amount) >= 0.0);
        }
    }
}
