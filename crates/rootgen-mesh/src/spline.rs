//! Closed-curve resampling and seam alignment for boundary rings.

use rootgen_math::Point3;

/// Standard Catmull-Rom tension.
const TENSION: f64 = 0.5;

/// Fit a closed Catmull-Rom spline through `ring` and sample it at
/// `samples` points spaced uniformly in chord length.
///
/// The first sample coincides with `ring[0]`. Rings with fewer than three
/// points, or of zero length, are returned unchanged.
pub fn resample_closed_spline(ring: &[Point3], samples: usize) -> Vec<Point3> {
    let n = ring.len();
    if n < 3 || samples == 0 {
        return ring.to_vec();
    }

    // cumulative chord length at the start of each segment, plus the total
    let mut lengths = Vec::with_capacity(n + 1);
    lengths.push(0.0);
    for i in 0..n {
        let seg = (ring[(i + 1) % n] - ring[i]).norm();
        lengths.push(lengths[i] + seg);
    }
    let total = lengths[n];
    if total <= 0.0 || !total.is_finite() {
        return ring.to_vec();
    }

    (0..samples)
        .map(|k| {
            let target = total * k as f64 / samples as f64;
            // last segment whose start is at or before the target
            let seg = lengths[..n].partition_point(|&l| l <= target).saturating_sub(1);
            let span = lengths[seg + 1] - lengths[seg];
            let t = if span > 0.0 {
                ((target - lengths[seg]) / span).clamp(0.0, 1.0)
            } else {
                0.0
            };
            catmull_rom_point(
                ring[(seg + n - 1) % n],
                ring[seg],
                ring[(seg + 1) % n],
                ring[(seg + 2) % n],
                t,
            )
        })
        .collect()
}

/// Catmull-Rom interpolation between `p1` and `p2` at `t` in `[0, 1]`.
fn catmull_rom_point(p0: Point3, p1: Point3, p2: Point3, p3: Point3, t: f64) -> Point3 {
    let t2 = t * t;
    let t3 = t2 * t;
    let tau = TENSION;

    let b0 = -tau * t3 + 2.0 * tau * t2 - tau * t;
    let b1 = (2.0 - tau) * t3 + (tau - 3.0) * t2 + 1.0;
    let b2 = (tau - 2.0) * t3 + (3.0 - 2.0 * tau) * t2 + tau * t;
    let b3 = tau * t3 - tau * t2;

    Point3::from(p0.coords * b0 + p1.coords * b1 + p2.coords * b2 + p3.coords * b3)
}

/// Rotate the order of a closed ring so it starts at the point nearest to
/// `reference`. The point set and cyclic order are unchanged.
pub fn align_seam(ring: &[Point3], reference: &Point3) -> Vec<Point3> {
    let Some(start) = ring
        .iter()
        .enumerate()
        .map(|(i, p)| (i, (p - reference).norm_squared()))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
    else {
        return Vec::new();
    };
    ring[start..].iter().chain(&ring[..start]).copied().collect()
}
