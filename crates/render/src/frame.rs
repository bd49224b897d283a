use tempgraph_config::ChartConfig;
use tempgraph_core::{ChartFrame, Sample};

/// Label shown until the first reading arrives.
pub const PLACEHOLDER: &str = "Waiting for data...";

/// Share of the data span added above and below an auto-scaled y-axis.
const AUTO_SCALE_PADDING: f64 = 0.1;

/// Build the chart state for one window snapshot.
///
/// Point `i` is `(i, value_i)`; the x-axis spans `[0, len]` so it follows the
/// window as it fills and stops growing at capacity.
pub fn build_frame(snapshot: &[Sample], latest: Option<&Sample>, chart: &ChartConfig) -> ChartFrame {
    let label = match latest {
        Some(sample) => format!("Current: {:.1}{}", sample.value, chart.unit),
        None => PLACEHOLDER.to_string(),
    };

    let points: Vec<(f64, f64)> = snapshot
        .iter()
        .enumerate()
        .map(|(i, s)| (i as f64, s.value))
        .collect();

    ChartFrame {
        label,
        updated_at: latest.map(|s| s.timestamp),
        x_range: (0.0, snapshot.len() as f64),
        y_range: value_range(snapshot, chart),
        points,
    }
}

fn value_range(snapshot: &[Sample], chart: &ChartConfig) -> (f64, f64) {
    let fixed = (chart.y_min, chart.y_max);
    if !chart.auto_scale || snapshot.is_empty() {
        return fixed;
    }

    let (lo, hi) = snapshot
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
            (lo.min(s.value), hi.max(s.value))
        });

    // A flat line still gets a visible band around it.
    let pad = if hi > lo { (hi - lo) * AUTO_SCALE_PADDING } else { 1.0 };
    (lo - pad, hi + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    fn samples(values: &[f64]) -> Vec<Sample> {
        let now = Local::now();
        values.iter().map(|&value| Sample { timestamp: now, value }).collect()
    }

    #[test]
    fn empty_window_shows_placeholder() {
        let frame = build_frame(&[], None, &ChartConfig::default());
        assert_eq!(frame.label, PLACEHOLDER);
        assert!(frame.points.is_empty());
        assert_eq!(frame.x_range, (0.0, 0.0));
        assert_eq!(frame.y_range, (-50.0, 100.0));
        assert_eq!(frame.updated_at, None);
    }

    #[test]
    fn label_uses_one_decimal_and_unit() {
        let window = samples(&[20.0, 21.26]);
        let frame = build_frame(&window, window.last(), &ChartConfig::default());
        assert_eq!(frame.label, "Current: 21.3°C");
        assert_eq!(frame.updated_at, Some(window[1].timestamp));
    }

    #[test]
    fn points_are_indexed_from_zero() {
        let window = samples(&[18.0, 18.5, 19.0]);
        let frame = build_frame(&window, window.last(), &ChartConfig::default());
        assert_eq!(frame.points, vec![(0.0, 18.0), (1.0, 18.5), (2.0, 19.0)]);
        assert_eq!(frame.x_range, (0.0, 3.0));
    }

    #[test]
    fn auto_scale_fits_data() {
        let chart = ChartConfig { auto_scale: true, ..ChartConfig::default() };
        let window = samples(&[10.0, 30.0, 20.0]);
        let (lo, hi) = build_frame(&window, window.last(), &chart).y_range;
        assert!((lo - 8.0).abs() < 1e-9);
        assert!((hi - 32.0).abs() < 1e-9);
    }

    #[test]
    fn auto_scale_pads_a_flat_line() {
        let chart = ChartConfig { auto_scale: true, ..ChartConfig::default() };
        let window = samples(&[5.0, 5.0]);
        assert_eq!(build_frame(&window, window.last(), &chart).y_range, (4.0, 6.0));
    }
}
