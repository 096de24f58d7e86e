//! Budget-adaptive plan sizing.

use coh_01_fixed_point::{q_div, to_int_floor, Round};
use shared_types::Q18;

use crate::config::PlannerConfig;
use crate::errors::PlannerResult;

/// Compute `(m, H)` from the remaining budget.
///
/// `m = clamp(floor(b / b_unit), 1, m_max)` and likewise for `H`; a zero
/// budget disables planning entirely and returns `(0, 0)`.
pub fn adaptive_params(b: Q18, config: &PlannerConfig) -> PlannerResult<(u32, u32)> {
    config.validate()?;
    if b <= 0 {
        return Ok((0, 0));
    }
    let m = to_int_floor(q_div(b, config.b_unit_q, Round::Down)?)
        .clamp(1, config.m_max as i64) as u32;
    let h = to_int_floor(q_div(b, config.h_unit_q, Round::Down)?)
        .clamp(1, config.h_max as i64) as u32;
    Ok((m, h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use coh_01_fixed_point::ONE_Q18;

    #[test]
    fn test_zero_budget_disables_planning() {
        assert_eq!(adaptive_params(0, &PlannerConfig::default()).unwrap(), (0, 0));
    }

    #[test]
    fn test_scaling_monotone_in_budget() {
        let config = PlannerConfig::default();
        let (m_low, h_low) = adaptive_params(ONE_Q18, &config).unwrap();
        let (m_high, h_high) = adaptive_params(100 * ONE_Q18, &config).unwrap();
        assert!(m_high >= m_low);
        assert!(h_high >= h_low);
    }

    #[test]
    fn test_caps_respected() {
        let config = PlannerConfig::default();
        let (m, h) = adaptive_params(10_000 * ONE_Q18, &config).unwrap();
        assert_eq!(m, config.m_max);
        assert_eq!(h, config.h_max);
    }

    #[test]
    fn test_tiny_budget_floors_at_one() {
        let config = PlannerConfig::default();
        let (m, h) = adaptive_params(ONE_Q18 / 2, &config).unwrap();
        assert_eq!((m, h), (1, 1));
    }
}
