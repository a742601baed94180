use crate::models::NgWord;

/// The first NG-word contained in `comment`, if any. Matching is a literal,
/// case-sensitive substring search.
pub fn first_hit<'a>(comment: &str, words: &'a [NgWord]) -> Option<&'a NgWord> {
    let hit = words.iter().find(|w| comment.contains(w.word.as_str()));
    if let Some(word) = hit {
        tracing::debug!(
            ng_word_id = word.id,
            livestream_id = word.livestream_id,
            "Comment matched NG-word"
        );
    }
    hit
}

/// `words` must already be scoped to one (livestream, owner) pair.
pub fn is_spam(comment: &str, words: &[NgWord]) -> bool {
    first_hit(comment, words).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<NgWord> {
        list.iter()
            .enumerate()
            .map(|(i, w)| NgWord {
                id: i as i64 + 1,
                user_id: 1,
                livestream_id: 1,
                word: (*w).to_string(),
                created_at: 0,
            })
            .collect()
    }

    #[test]
    fn test_contained_word_is_spam() {
        assert!(is_spam("hello world", &words(&["world"])));
        assert!(!is_spam("hello", &words(&["world"])));
    }

    #[test]
    fn test_no_words_never_spam() {
        assert!(!is_spam("xx", &[]));
    }

    #[test]
    fn test_prefix_suffix_and_infix_all_match() {
        let ng = words(&["bad"]);
        assert!(is_spam("badge", &ng));
        assert!(is_spam("too bad", &ng));
        assert!(is_spam("a badly made joke", &ng));
    }

    #[test]
    fn test_match_is_case_sensitive_and_literal() {
        assert!(!is_spam("BAD news", &words(&["bad"])));
        assert!(!is_spam("abc", &words(&["a.c"])));
        assert!(is_spam("a.c", &words(&["a.c"])));
    }

    #[test]
    fn test_first_hit_short_circuits_in_list_order() {
        let ng = words(&["nope", "spam", "am"]);
        let hit = first_hit("spam here", &ng).unwrap();
        assert_eq!(hit.word, "spam");
    }
}
