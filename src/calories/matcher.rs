use super::food::FoodCandidate;

/// Fraction of the query's words that occur somewhere in `description`.
/// Both sides are compared lowercased; a word matches as a plain substring.
pub fn word_score(words: &[String], description: &str) -> f64 {
    if words.is_empty() {
        return 0.0;
    }
    let description = description.to_lowercase();
    let matches = words
        .iter()
        .filter(|word| description.contains(word.as_str()))
        .count();
    matches as f64 / words.len() as f64
}

fn query_words(dish_name: &str) -> Vec<String> {
    dish_name
        .to_lowercase()
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}

/// Picks the highest-scoring candidate. Ties go to the earliest candidate, so
/// the upstream ranking decides between equally good matches.
/// Returns `None` only for an empty slice.
pub fn find_best_match<'a>(
    dish_name: &str,
    candidates: &'a [FoodCandidate],
) -> Option<(&'a FoodCandidate, f64)> {
    let words = query_words(dish_name);
    let mut best: Option<(usize, f64)> = None;
    for (idx, candidate) in candidates.iter().enumerate() {
        let score = word_score(&words, &candidate.description);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((idx, score)),
        }
    }
    best.map(|(idx, score)| (&candidates[idx], score))
}
