//! Turns free text into the token sequence the matcher compares against.
//!
//! The rules are deliberately naive: punctuation and markdown emphasis are
//! deleted outright, then every token loses one leading `mr` and one
//! trailing `s`. That is enough to catch `Mr.Wonder`, `Wonder's` and
//! `wonders`, and it also mangles unrelated words (`this` becomes `thi`).

const PUNCTUATION: [char; 8] = ['?', ':', '!', '.', ',', ';', '\'', '"'];
const EMPHASIS_MARKERS: [&str; 2] = ["*", "~~"];
const HONORIFIC_PREFIX: &str = "mr";
const PLURAL_SUFFIX: &str = "s";

pub fn normalize(text: &str) -> Vec<String> {
    let mut cleaned: String = text
        .chars()
        .filter(|c| !PUNCTUATION.contains(c))
        .collect::<String>()
        .to_lowercase();

    for marker in EMPHASIS_MARKERS {
        cleaned = cleaned.replace(marker, "");
    }

    cleaned.split_whitespace().map(normalize_token).collect()
}

/// Applies the prefix and suffix stripping to a single, already lowercased
/// token. A token made only of the affixes collapses to `""`.
pub fn normalize_token(token: &str) -> String {
    let token = token.strip_prefix(HONORIFIC_PREFIX).unwrap_or(token);
    let token = token.strip_suffix(PLURAL_SUFFIX).unwrap_or(token);
    token.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text() {
        assert!(normalize("").is_empty());
        assert!(normalize("   \n\t ").is_empty());
    }

    #[test]
    fn test_punctuation_is_deleted_not_spaced() {
        assert_eq!(normalize("Mr.Wonder is my hero"), vec!["wonder", "i", "my", "hero"]);
        assert_eq!(normalize("wait, what?!"), vec!["wait", "what"]);
    }

    #[test]
    fn test_emphasis_markers() {
        assert_eq!(normalize("I **wonder**"), vec!["i", "wonder"]);
        assert_eq!(normalize("~~wonder~~"), vec!["wonder"]);
        // Unspaced emphasis merges neighbours.
        assert_eq!(normalize("big*wonder*"), vec!["bigwonder"]);
    }

    #[test]
    fn test_possessive_and_plural() {
        assert_eq!(normalize("Wonder's"), vec!["wonder"]);
        assert_eq!(normalize("wonders"), vec!["wonder"]);
        assert_eq!(normalize("this"), vec!["thi"]);
    }

    #[test]
    fn test_affix_only_tokens_become_empty() {
        assert_eq!(normalize_token("s"), "");
        assert_eq!(normalize_token("mr"), "");
        assert_eq!(normalize_token("mrs"), "");
    }

    #[test]
    fn test_only_one_affix_is_stripped() {
        assert_eq!(normalize_token("mrmrwonder"), "mrwonder");
        assert_eq!(normalize_token("wonderss"), "wonders");
    }
}
