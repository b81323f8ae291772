//! Name normalization and the token-sort similarity used for fuzzy
//! person matching.

/// Lowercase, strip everything but alphanumerics, split on whitespace.
pub fn tokens(name: &str) -> Vec<String> {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Tokens sorted and re-joined; "Durbin, Richard" and "Richard Durbin"
/// produce the same key.
pub fn token_sort_key(name: &str) -> String {
    let mut toks = tokens(name);
    toks.sort();
    toks.join(" ")
}

/// Token-sort ratio in `[0, 1]`: normalized Levenshtein similarity of
/// the two token-sorted keys.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let ka = token_sort_key(a);
    let kb = token_sort_key(b);
    if ka.is_empty() && kb.is_empty() {
        return 1.0;
    }
    strsim::normalized_levenshtein(&ka, &kb)
}

/// Deterministic preference between two first-name forms: the longer
/// (more specific) form wins; `Richard` beats `Dick`.
pub fn prefer_longer<'a>(a: &'a str, b: &'a str) -> &'a str {
    if b.len() > a.len() {
        b
    } else {
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_sort_ignores_order_and_punctuation() {
        assert_eq!(token_sort_key("Durbin, Richard J."), token_sort_key("Richard J. Durbin"));
        assert_eq!(tokens("O'Rourke, Beto"), vec!["o", "rourke", "beto"]);
    }

    #[test]
    fn identical_names_score_one() {
        assert_eq!(token_sort_ratio("Chuck Grassley", "Grassley, Chuck"), 1.0);
    }

    #[test]
    fn different_names_score_low() {
        assert!(token_sort_ratio("Chuck Grassley", "Richard Durbin") < 0.5);
    }

    #[test]
    fn near_names_score_high() {
        // Same surname, close given names.
        assert!(token_sort_ratio("Rick Scott", "Rich Scott") > 0.8);
    }

    #[test]
    fn longer_form_wins() {
        assert_eq!(prefer_longer("Dick", "Richard"), "Richard");
        assert_eq!(prefer_longer("Richard", "Dick"), "Richard");
        // Equal lengths keep the incumbent.
        assert_eq!(prefer_longer("Dan", "Don"), "Dan");
    }
}
