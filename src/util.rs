pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

pub fn std_dev(data: &[f64]) -> Option<f64> {
    match (mean(data), data.len()) {
        (Some(data_mean), count) if count > 0 => {
            let variance = data
                .iter()
                .map(|value| {
                    let diff = data_mean - *value;

                    diff * diff
                })
                .sum::<f64>()
                / count as f64;

            Some(variance.sqrt())
        }
        _ => None,
    }
}

/// Clamp a raw metric into the 0-100 score range.
pub fn clamp_pct(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Percentage of `part` out of `whole`, 0.0 when `whole` is zero.
pub fn pct(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[10., 20., 30., 15., 22.]), Some(19.4));
        assert_eq!(mean(&[15., 7., 55., 12., 4.]), Some(18.6));
    }

    #[test]
    fn test_mean_empty_slice() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_std_dev() {
        assert_eq!(
            std_dev(&[100., 120., 90., 102., 94.]),
            Some(10.322790320451151)
        );
        assert_eq!(std_dev(&[15., 7., 55.]), Some(20.997354330698162));
    }

    #[test]
    fn test_std_dev_single_value() {
        assert_eq!(std_dev(&[42.0]), Some(0.0));
    }

    #[test]
    fn test_std_dev_empty_slice() {
        assert_eq!(std_dev(&[]), None);
    }

    #[test]
    fn test_std_dev_identical_values() {
        assert_eq!(std_dev(&[700.0, 700.0, 700.0]), Some(0.0));
    }

    #[test]
    fn test_clamp_pct_bounds() {
        assert_eq!(clamp_pct(-12.5), 0.0);
        assert_eq!(clamp_pct(0.0), 0.0);
        assert_eq!(clamp_pct(55.5), 55.5);
        assert_eq!(clamp_pct(100.0), 100.0);
        assert_eq!(clamp_pct(240.0), 100.0);
    }

    #[test]
    fn test_pct() {
        assert_eq!(pct(4, 8), 50.0);
        assert_eq!(pct(8, 8), 100.0);
        assert_eq!(pct(0, 8), 0.0);
    }

    #[test]
    fn test_pct_zero_whole() {
        assert_eq!(pct(3, 0), 0.0);
    }
}
