pub struct StatsHelper;

impl StatsHelper {
    /// `numerator / denominator`, or 0 when the denominator is not positive.
    pub fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
        if denominator > 0.0 {
            numerator / denominator
        } else {
            0.0
        }
    }

    /// Percentage change from `reference` to `value`; `None` for a zero reference.
    pub fn percent_change(reference: f64, value: f64) -> Option<f64> {
        if reference == 0.0 {
            return None;
        }
        Some((value - reference) / reference * 100.0)
    }
}
