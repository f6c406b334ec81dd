//! Word-level name matching shared by price lookup, substitutions and
//! categorization.
//!
//! Names are split into lowercase alphanumeric words with a light plural
//! stem, so "Tomatoes" matches "tomato" while "butternut" never matches
//! "butter" and "ice" never matches "rice".

/// Lowercase, stemmed words of `text`.
pub fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(stem)
        .collect()
}

fn stem(word: &str) -> String {
    if let Some(base) = word.strip_suffix("ies").filter(|base| base.len() > 2) {
        return format!("{}y", base);
    }
    if let Some(base) = word.strip_suffix("oes").filter(|base| base.len() > 2) {
        return format!("{}o", base);
    }
    for suffix in ["ches", "shes", "xes"] {
        if word.len() > suffix.len() + 1 && word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    match word.strip_suffix('s') {
        Some(base) if base.len() > 2 && !base.ends_with('s') && !base.ends_with('u') => base.to_string(),
        _ => word.to_string(),
    }
}

/// True when the words of `phrase` appear consecutively in `text`.
pub fn contains_phrase(text: &str, phrase: &str) -> bool {
    let haystack = words(text);
    let needle = words(phrase);
    !needle.is_empty() && haystack.windows(needle.len()).any(|window| window == needle.as_slice())
}

/// Either name contains the other as a whole-word phrase.
pub fn names_overlap(a: &str, b: &str) -> bool {
    contains_phrase(a, b) || contains_phrase(b, a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stems_common_plurals() {
        assert_eq!(words("Tomatoes, Eggs & Cherries"), vec!["tomato", "egg", "cherry"]);
        assert_eq!(words("peaches couscous hummus"), vec!["peach", "couscous", "hummus"]);
        assert!(words("  - ").is_empty());
    }

    #[test]
    fn phrases_match_whole_words_only() {
        assert!(contains_phrase("tinned chopped tomatoes", "chopped tomato"));
        assert!(contains_phrase("Free-range EGGS", "eggs"));
        assert!(!contains_phrase("butternut squash", "butter"));
        assert!(!contains_phrase("ice", "rice"));
        assert!(!contains_phrase("unsalted butter", "salt"));
        assert!(!contains_phrase("chopped tomatoes", "tomato chopped"));
        assert!(!contains_phrase("anything", ""));
    }

    #[test]
    fn overlap_works_in_both_directions() {
        assert!(names_overlap("mince", "beef mince"));
        assert!(names_overlap("Basmati Rice", "rice"));
        assert!(!names_overlap("rice", "ice"));
    }
}
