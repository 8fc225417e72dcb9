/// Score assigned when a cosine is undefined (zero or non-finite norm).
pub const DEGENERATE_SCORE: f32 = -1.0;

// Sums run in f64: squaring f32 components near 1e20 overflows and near 1e-25
// underflows, which would turn a valid vector into a zero-norm one.

pub fn l2_norm(v: &[f32]) -> f64 {
    let mut sum = 0.0f64;
    for x in v {
        let x = f64::from(*x);
        sum += x * x;
    }
    sum.sqrt()
}

/// Cosine of `a` and `b` given their precomputed norms, always within `[-1, 1]`.
pub fn cosine_similarity(a: &[f32], b: &[f32], a_norm: f64, b_norm: f64) -> f32 {
    if !usable_norm(a_norm) || !usable_norm(b_norm) {
        return DEGENERATE_SCORE;
    }
    let mut dot = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += f64::from(*x) * f64::from(*y);
    }
    // Divide by each norm in turn; their product can leave the f64 range.
    let score = dot / a_norm / b_norm;
    if score.is_finite() {
        score.clamp(-1.0, 1.0) as f32
    } else {
        DEGENERATE_SCORE
    }
}

fn usable_norm(n: f64) -> bool {
    n.is_finite() && n > 0.0
}
