//! Propensity-weighted selection, the kernel's sole source of randomness.
//!
//! Both `execute`'s walker choice and a terminator's readthrough draw go
//! through this module so that a single seeded [`rand::rngs::SmallRng`]
//! drives every stochastic decision a `Polymer` makes, matching the spec's
//! requirement of one reproducible PRNG per polymer.

use rand::Rng;

/// Pick an index in `0..weights.len()` with probability proportional to
/// `weights[i]`.
///
/// Returns `None` if `weights` is empty or every weight is non-positive.
/// Walks a running sum rather than building a cumulative-weight table,
/// since the walker lists this is used on are small (bounded by the number
/// of walkers simultaneously resident on one polymer).
pub fn weighted_index<R: Rng + ?Sized>(rng: &mut R, weights: &[f64]) -> Option<usize> {
    let total: f64 = weights.iter().filter(|w| **w > 0.0).sum();
    if total <= 0.0 {
        return None;
    }
    let mut draw = rng.gen::<f64>() * total;
    for (i, w) in weights.iter().enumerate() {
        if *w <= 0.0 {
            continue;
        }
        if draw < *w {
            return Some(i);
        }
        draw -= w;
    }
    // Floating-point rounding can leave a residual draw smaller than the
    // true total; fall back to the last eligible index.
    weights.iter().rposition(|w| *w > 0.0)
}

/// Draw a uniform sample in `[0, 1)`, used for termination/readthrough
/// resolution.
pub fn uniform<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen::<f64>()
}
