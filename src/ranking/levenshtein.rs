use rapidfuzz::distance::levenshtein;

/// Levenshtein edit distance between two strings, counted in chars
/// (unit cost for insertion, deletion and substitution).
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    levenshtein::distance(a.chars(), b.chars())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_distances() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("Yamato", "Yamatoo"), 1);
        assert_eq!(levenshtein_distance("Yamato", "Musashi"), 6);
        assert_eq!(levenshtein_distance("flaw", "lawn"), 2);
    }

    #[test]
    fn test_identity_and_empty() {
        for s in ["", "a", "Des Moines", "Großer Kurfürst"] {
            assert_eq!(levenshtein_distance(s, s), 0);
            assert_eq!(levenshtein_distance("", s), s.chars().count());
            assert_eq!(levenshtein_distance(s, ""), s.chars().count());
        }
    }

    #[test]
    fn test_symmetric() {
        let words = ["Shimakaze", "Shimakze", "Khabarovsk", "Kitakaze", "Z-52", ""];
        for a in words {
            for b in words {
                assert_eq!(levenshtein_distance(a, b), levenshtein_distance(b, a), "{} / {}", a, b);
            }
        }
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        assert_eq!(levenshtein_distance("Großer Kurfürst", "Grosser Kurfurst"), 3);
        assert_eq!(levenshtein_distance("ü", "u"), 1);
    }
}
