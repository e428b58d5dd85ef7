//! Test helpers for unit tests
//!
//! This module provides shared utilities for unit tests within the CLI crate.
//! For integration tests, see `tests/integration_test_helpers.rs`.

/// Assert that every whitespace-separated word of `words` appears in `message`,
/// ignoring case.
///
/// With `require_same_line`, all words must also appear together on one line.
///
/// # Panics
///
/// Panics with the full message when a word is missing or the words are spread over
/// several lines.
pub fn assert_words_in_message(words: &str, message: &str, require_same_line: bool) {
    let words: Vec<&str> = words.split_whitespace().collect();
    let lowered: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
    let message_lwr = message.to_lowercase();

    if let Some(missing) = find_missing_word(&lowered, &message_lwr) {
        panic!("Missing word \"{}\" in a message:\n\n{message}", words[missing]);
    }

    if require_same_line
        && !message_lwr
            .lines()
            .any(|line| find_missing_word(&lowered, line).is_none())
    {
        panic!("Words {words:?} do not appear on the same line in a message:\n\n{message}");
    }
}

fn find_missing_word(words: &[String], text: &str) -> Option<usize> {
    words.iter().position(|word| !text.contains(word.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_found_case_insensitive() {
        assert_words_in_message("hello WORLD", "Hello, world!", false);
    }

    #[test]
    fn test_words_on_same_line() {
        assert_words_in_message("--config <TEXT>", "Options:\n  --config <TEXT>  \n", true);
    }

    #[test]
    #[should_panic(expected = "Missing word \"absent\"")]
    fn test_missing_word() {
        assert_words_in_message("present absent", "only present here", false);
    }

    #[test]
    #[should_panic(expected = "do not appear on the same line")]
    fn test_words_on_different_lines() {
        assert_words_in_message("first second", "first\nsecond", true);
    }
}
