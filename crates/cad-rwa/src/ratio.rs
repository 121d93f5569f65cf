/// CET1 ratio = capital / total RWA.
///
/// Returns 0 when `total_rwa` is not positive so an empty portfolio never
/// divides by zero.
pub fn cet1_ratio(cet1_capital: f64, total_rwa: f64) -> f64 {
    if total_rwa > 0.0 {
        cet1_capital / total_rwa
    } else {
        0.0
    }
}

/// Total RWA at which `cet1_capital` yields exactly `target_ratio`.
///
/// `target_ratio` must be > 0 (caller precondition).
pub fn required_total_rwa(cet1_capital: f64, target_ratio: f64) -> f64 {
    cet1_capital / target_ratio
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_of_capital_over_rwa() {
        assert!((cet1_ratio(140.0, 1_000.0) - 0.14).abs() < 1e-12);
    }

    #[test]
    fn ratio_is_zero_without_rwa() {
        assert_eq!(cet1_ratio(140.0, 0.0), 0.0);
        assert_eq!(cet1_ratio(140.0, -1.0), 0.0);
    }

    #[test]
    fn required_rwa_inverts_ratio() {
        assert_eq!(required_total_rwa(52_500.0, 0.15), 350_000.0);
        assert!((required_total_rwa(140.0, 0.10) - 1_400.0).abs() < 1e-9);
    }
}
