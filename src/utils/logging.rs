use log::warn;
use std::time::Duration;

/// Warns when the margin of a freshly rebuilt neighbor list is not positive,
/// which means the next step will rebuild again.
pub fn warn_if_margin_exhausted(list: &str, margin: f32) {
    if margin <= 0.0 {
        warn!("{list}: rebuilt neighbor list has no margin ({margin:.3e} m)");
    }
}

/// Warns when a single step ran longer than `budget`.
pub fn warn_if_step_budget_exceeded(duration: Duration, budget: Duration) {
    if duration > budget {
        warn!(
            "step exceeded budget: {:.2} ms > {:.2} ms",
            duration.as_secs_f32() * 1000.0,
            budget.as_secs_f32() * 1000.0
        );
    }
}
