// crates/clipline-core/src/helpers/time.rs
//
// Human-readable durations for status messages.

/// Format a duration in seconds as a compact human-readable string.
///
/// | Range         | Format       | Example   |
/// |---------------|--------------|-----------|
/// | ≥ 3600 s      | `H:MM:SS`    | `1:04:35` |
/// | ≥ 60 s        | `M:SS`       | `3:07`    |
/// | < 60 s        | `S.Xs`       | `4.2s`    |
///
/// ```
/// use clipline_core::helpers::time::format_duration;
/// assert_eq!(format_duration(4.2),    "4.2s");
/// assert_eq!(format_duration(187.0),  "3:07");
/// assert_eq!(format_duration(3875.0), "1:04:35");
/// ```
pub fn format_duration(secs: f64) -> String {
    let secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
    if secs >= 3600.0 {
        format!(
            "{}:{:02}:{:02}",
            secs as u64 / 3600,
            (secs as u64 % 3600) / 60,
            secs as u64 % 60,
        )
    } else if secs >= 60.0 {
        format!("{}:{:02}", secs as u64 / 60, secs as u64 % 60)
    } else {
        format!("{secs:.1}s")
    }
}

/// Evenly spaced sample times over `[0, duration]`, endpoints included.
///
/// One sample lands at 0. A non-positive duration collapses every sample to 0.
///
/// ```
/// use clipline_core::helpers::time::linspace;
/// assert_eq!(linspace(8.0, 5), vec![0.0, 2.0, 4.0, 6.0, 8.0]);
/// assert_eq!(linspace(8.0, 1), vec![0.0]);
/// ```
pub fn linspace(duration: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![0.0],
        n => {
            let d = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
            let step = d / (n - 1) as f64;
            (0..n).map(|i| step * i as f64).collect()
        }
    }
}
