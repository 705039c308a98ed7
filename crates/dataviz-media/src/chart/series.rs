//! Numeric helpers for the chart: resampling, axis bounds, labels.

/// Resample `values` onto `count` evenly spaced positions by linear
/// interpolation.
///
/// The first and last samples are exactly `values[0]` and
/// `values[len - 1]`, whatever the ratio between the two lengths.
pub fn resample(values: &[f64], count: usize) -> Vec<f64> {
    let n = values.len();
    match (n, count) {
        (0, _) | (_, 0) => return Vec::new(),
        (_, 1) => return vec![values[0]],
        (1, _) => return vec![values[0]; count],
        _ => {}
    }

    let last = n - 1;
    let step = last as f64 / (count - 1) as f64;

    (0..count)
        .map(|i| {
            if i == count - 1 {
                return values[last];
            }
            let pos = i as f64 * step;
            let idx = pos.floor() as usize;
            if idx >= last {
                return values[last];
            }
            let frac = pos - idx as f64;
            values[idx] + (values[idx + 1] - values[idx]) * frac
        })
        .collect()
}

/// Y-axis range covering `values` with symmetric padding.
///
/// Padding is `padding_ratio` of the value range. A flat series gets 10%
/// of its magnitude (or 1.0 around zero) so the line never sits on the
/// frame edge.
pub fn y_bounds(values: &[f64], padding_ratio: f64) -> (f64, f64) {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }

    let range = max - min;
    let padding = if range > 0.0 {
        range * padding_ratio
    } else {
        let magnitude = max.abs() * 0.1;
        if magnitude > 0.0 {
            magnitude
        } else {
            1.0
        }
    };

    (min - padding, max + padding)
}

/// Format a value with thousands separators and two decimals
/// (`43500.0` -> `"43,500.00"`).
pub fn format_value(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let is_zero = fixed.bytes().all(|b| b == b'0' || b == b'.');
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_preserves_endpoints() {
        for values in [
            vec![3.4, 3.2, 3.5],
            vec![0.1, 0.7],
            vec![42000.0, 43500.0, 41000.0, 44999.99, 43000.01],
        ] {
            for count in [2, 3, 7, 90, 91] {
                let samples = resample(&values, count);
                assert_eq!(samples.len(), count);
                assert_eq!(samples[0], values[0]);
                assert_eq!(samples[count - 1], *values.last().unwrap());
            }
        }
    }

    #[test]
    fn test_resample_interpolates_linearly() {
        let samples = resample(&[0.0, 10.0], 5);
        assert_eq!(samples, vec![0.0, 2.5, 5.0, 7.5, 10.0]);
    }

    #[test]
    fn test_resample_hits_original_points_when_aligned() {
        // 3 points onto 5 samples: original points land on 0, 2, 4
        let samples = resample(&[3.4, 3.2, 3.5], 5);
        assert!((samples[2] - 3.2).abs() < 1e-12);
        assert!((samples[1] - 3.3).abs() < 1e-12);
    }

    #[test]
    fn test_y_bounds_pad_symmetrically() {
        let (lo, hi) = y_bounds(&[3.4, 3.2, 3.5], 0.2);
        assert!((lo - 3.14).abs() < 1e-9);
        assert!((hi - 3.56).abs() < 1e-9);
    }

    #[test]
    fn test_y_bounds_flat_series() {
        let (lo, hi) = y_bounds(&[5.0, 5.0], 0.2);
        assert!(lo < 5.0 && hi > 5.0);
        let (lo, hi) = y_bounds(&[0.0, 0.0], 0.2);
        assert_eq!((lo, hi), (-1.0, 1.0));
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(3.5), "3.50");
        assert_eq!(format_value(43500.0), "43,500.00");
        assert_eq!(format_value(1234567.891), "1,234,567.89");
        assert_eq!(format_value(999.999), "1,000.00");
        assert_eq!(format_value(-1234.5), "-1,234.50");
        assert_eq!(format_value(-0.001), "0.00");
        assert_eq!(format_value(0.0), "0.00");
    }
}
