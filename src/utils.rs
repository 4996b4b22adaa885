// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Small numeric and formatting helpers.

/// Simple English pluralization.
#[must_use]
pub fn pluralize(word: &str) -> String {
    if word.ends_with('s') || word.ends_with("ch") || word.ends_with("sh") {
        format!("{word}es")
    } else if word.ends_with('y') && !word.ends_with("ey") && !word.ends_with("ay") {
        format!("{}ies", &word[..word.len() - 1])
    } else {
        format!("{word}s")
    }
}

/// `"1 image"`, `"3 images"`.
#[must_use]
pub fn count_noun(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {}", pluralize(word))
    }
}

/// Turn raw classifier scores into probabilities.
///
/// NaN scores become zero. Scores that already sum to roughly one are kept as
/// they are; anything else is treated as logits and softmax-normalized.
#[must_use]
pub fn to_probabilities(scores: &[f32]) -> Vec<f32> {
    let probs: Vec<f32> = scores
        .iter()
        .map(|&v| if v.is_nan() { 0.0 } else { v })
        .collect();

    let sum: f32 = probs.iter().sum();
    if probs.is_empty() || (sum - 1.0).abs() <= 0.1 {
        return probs;
    }

    let max_val = probs.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exp_vals: Vec<f32> = probs.iter().map(|&v| (v - max_val).exp()).collect();
    let exp_sum: f32 = exp_vals.iter().sum();
    if exp_sum > 0.0 {
        exp_vals.iter().map(|&v| v / exp_sum).collect()
    } else {
        probs
    }
}

/// Index and value of the largest element. Ties keep the first index.
#[must_use]
pub fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    values
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
}
