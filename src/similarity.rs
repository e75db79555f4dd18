//! TF-IDF cosine similarity between short texts
//!
//! Tokens are lowercase runs of two or more word characters. Each comparison
//! fits its own vocabulary on the two texts involved, with smoothed idf
//! `ln((1 + n) / (1 + df)) + 1` and l2-normalized vectors.

use std::collections::HashMap;

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .map(str::to_lowercase)
}

fn term_counts(text: &str) -> HashMap<String, f64> {
    let mut counts = HashMap::new();
    for token in tokenize(text) {
        *counts.entry(token).or_insert(0.0) += 1.0;
    }
    counts
}

fn weighted(counts: &HashMap<String, f64>, idf: &HashMap<&str, f64>) -> HashMap<String, f64> {
    let mut vector: HashMap<String, f64> = counts
        .iter()
        .map(|(term, tf)| (term.clone(), tf * idf.get(term.as_str()).copied().unwrap_or(1.0)))
        .collect();

    let norm = vector.values().map(|w| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        vector.values_mut().for_each(|w| *w /= norm);
    }
    vector
}

/// Cosine similarity in [0, 1]; 0 when either text has no tokens
pub fn cosine_similarity(a: &str, b: &str) -> f64 {
    let counts_a = term_counts(a);
    let counts_b = term_counts(b);
    if counts_a.is_empty() || counts_b.is_empty() {
        return 0.0;
    }

    let n_docs = 2.0;
    let mut idf: HashMap<&str, f64> = HashMap::new();
    for term in counts_a.keys().chain(counts_b.keys()) {
        if idf.contains_key(term.as_str()) {
            continue;
        }
        let df = [&counts_a, &counts_b]
            .iter()
            .filter(|counts| counts.contains_key(term))
            .count() as f64;
        idf.insert(term.as_str(), ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0);
    }

    let vec_a = weighted(&counts_a, &idf);
    let vec_b = weighted(&counts_b, &idf);

    let dot: f64 = vec_a
        .iter()
        .filter_map(|(term, wa)| vec_b.get(term).map(|wb| wa * wb))
        .sum();
    dot.clamp(0.0, 1.0)
}

/// Index and similarity of the candidate closest to `query`
pub fn best_match<S: AsRef<str>>(query: &str, candidates: &[S]) -> Option<(usize, f64)> {
    candidates
        .iter()
        .map(|candidate| cosine_similarity(query, candidate.as_ref()))
        .enumerate()
        .fold(None, |best, (idx, sim)| match best {
            Some((_, best_sim)) if best_sim >= sim => best,
            _ => Some((idx, sim)),
        })
}
