/// Compute X (action index) and Y (response ms) bounds for the
/// results chart
pub fn compute_chart_params(coords: &[(f64, f64)]) -> (f64, f64) {
    let mut highest_ms = 0.0;
    for &(_, ms) in coords {
        if ms > highest_ms {
            highest_ms = ms;
        }
    }
    if highest_ms < 1.0 {
        highest_ms = 1.0;
    }

    let mut last_action = match coords.last() {
        Some(x) => x.0,
        None => 1.0,
    };
    if last_action < 1.0 {
        last_action = 1.0;
    }

    (last_action, highest_ms.round())
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
