//! Min/max waveform overview for display

/// Decimate `samples` into `points` windows and return `[min0, max0, min1,
/// max1, ...]`.
///
/// Window `i` covers `[i·N/P, (i+1)·N/P)`. An empty window yields zeros.
pub fn overview(samples: &[f64], points: usize) -> Vec<f64> {
    let n = samples.len();
    let mut out = Vec::with_capacity(points * 2);
    for i in 0..points {
        let start = i * n / points;
        let end = (i + 1) * n / points;
        let window = &samples[start..end];
        if window.is_empty() {
            out.extend_from_slice(&[0.0, 0.0]);
            continue;
        }
        let (min, max) = window
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| {
                (lo.min(s), hi.max(s))
            });
        out.push(min);
        out.push(max);
    }
    out
}
