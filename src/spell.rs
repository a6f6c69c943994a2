use tracing::debug;

use crate::engine::SpellDictionary;

/// Correct recognized text word by word.
///
/// Line breaks count as word separators. A word the dictionary accepts is
/// kept; otherwise it is replaced by the first suggestion, or kept as is when
/// there is none. Words are joined back with single spaces.
pub fn correct_text(dict: &dyn SpellDictionary, text: &str) -> String {
    let mut corrected = 0usize;
    let words: Vec<String> = text
        .split_whitespace()
        .map(|word| {
            if dict.is_valid(word) {
                return word.to_string();
            }
            match dict.suggest(word).into_iter().next() {
                Some(suggestion) => {
                    corrected += 1;
                    suggestion
                }
                None => word.to_string(),
            }
        })
        .collect();

    debug!(words = words.len(), corrected, "spell correction done");
    words.join(" ")
}
