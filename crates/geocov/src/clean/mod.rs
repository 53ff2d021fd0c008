//! Free-text cleaning: strips URLs, emoji, mentions and emoticons.

mod cleaner;

pub use cleaner::{CleaningPolicy, TextCleaner};
