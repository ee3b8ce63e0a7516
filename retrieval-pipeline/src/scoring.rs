use std::cmp::Ordering;

/// Corpus position paired with its similarity to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranked {
    pub index: usize,
    pub score: f32,
}

/// Cosine similarity of two vectors.
///
/// Returns `0.0` for empty vectors, mismatched dimensions, zero-norm vectors
/// and non-finite results, so such candidates carry no ranking signal.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let (dot, norm_a, norm_b) = a.iter().zip(b).fold(
        (0.0f64, 0.0f64, 0.0f64),
        |(dot, norm_a, norm_b), (x, y)| {
            let (x, y) = (f64::from(*x), f64::from(*y));
            (x.mul_add(y, dot), x.mul_add(x, norm_a), y.mul_add(y, norm_b))
        },
    );

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if !denominator.is_finite() || denominator <= 0.0 {
        return 0.0;
    }

    let similarity = (dot / denominator) as f32;
    if similarity.is_finite() {
        similarity
    } else {
        0.0
    }
}

/// Scores every corpus vector against `query`, best first.
///
/// The sort is stable: equal scores keep their corpus order.
pub fn rank_by_similarity(query: &[f32], corpus: &[Vec<f32>]) -> Vec<Ranked> {
    let mut ranked: Vec<Ranked> = corpus
        .iter()
        .enumerate()
        .map(|(index, vector)| Ranked {
            index,
            score: cosine_similarity(query, vector),
        })
        .collect();

    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    ranked
}

/// Indices of the `top_k` most similar corpus vectors, best first.
///
/// With a threshold, candidates scoring below it are dropped before the cut.
pub fn top_k_indices(
    query: &[f32],
    corpus: &[Vec<f32>],
    top_k: usize,
    threshold: Option<f32>,
) -> Vec<usize> {
    rank_by_similarity(query, corpus)
        .into_iter()
        .filter(|ranked| threshold.map_or(true, |min| ranked.score >= min))
        .take(top_k)
        .map(|ranked| ranked.index)
        .collect()
}
