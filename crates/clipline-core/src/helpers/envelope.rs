// crates/clipline-core/src/helpers/envelope.rs
//
// Waveform envelope math: |sample| → fixed bucket count → normalise to [0, 1].
//
// Lives in core (not clipline-media) so the renderer tests and the probe share
// one definition. Buckets are independent, so they are averaged in parallel;
// each bucket is still summed sequentially in f64, which keeps the output
// bit-identical from run to run regardless of thread scheduling.

use rayon::prelude::*;

/// Downsample `samples` into exactly `buckets` mean-magnitude values, normalised
/// so the loudest bucket is 1.0.
///
/// * `hop = max(1, len / buckets)`; bucket `i` averages `|s|` over
///   `[i * hop, (i + 1) * hop)`. Samples past `buckets * hop` are dropped.
/// * Buckets that fall past the end of a short input are 0.
/// * Non-finite samples count as silence.
/// * Empty input (or zero buckets) yields an empty envelope.
///
/// ```
/// use clipline_core::helpers::envelope::envelope;
/// let env = envelope(&[0.0, 0.5, -1.0, 0.25], 2);
/// assert_eq!(env, vec![0.4, 1.0]);
/// ```
pub fn envelope(samples: &[f32], buckets: usize) -> Vec<f32> {
    if samples.is_empty() || buckets == 0 {
        return Vec::new();
    }
    let hop = (samples.len() / buckets).max(1);

    let means: Vec<f32> = (0..buckets)
        .into_par_iter()
        .map(|i| {
            let start = (i * hop).min(samples.len());
            let end   = ((i + 1) * hop).min(samples.len());
            bucket_mean(&samples[start..end])
        })
        .collect();

    normalize(means)
}

/// Divide every value by the maximum. A maximum of 0 uses 1 as the divisor,
/// so an all-silent envelope stays all zeros.
///
/// ```
/// use clipline_core::helpers::envelope::normalize;
/// assert_eq!(normalize(vec![0.0, 0.0]), vec![0.0, 0.0]);
/// assert_eq!(normalize(vec![1.0, 4.0]), vec![0.25, 1.0]);
/// ```
pub fn normalize(mut values: Vec<f32>) -> Vec<f32> {
    let max = values.iter().copied().fold(0.0_f32, f32::max);
    let divisor = if max > 0.0 { max } else { 1.0 };
    for v in values.iter_mut() {
        *v /= divisor;
    }
    values
}

fn bucket_mean(chunk: &[f32]) -> f32 {
    if chunk.is_empty() {
        return 0.0;
    }
    let sum: f64 = chunk.iter()
        .map(|s| if s.is_finite() { s.abs() as f64 } else { 0.0 })
        .sum();
    (sum / chunk.len() as f64) as f32
}
