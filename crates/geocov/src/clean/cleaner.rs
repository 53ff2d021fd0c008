//! Noise-token removal for post bodies.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::GeocovError;

// No word boundary: links are often glued to the preceding word ("2020https://t.co/x")
static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:https?://|www\.)\S+").unwrap());

// Pictographs, skin-tone modifiers, flags, keycaps, variation selector, ZWJ and tag sequences
static EMOJI_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"[\p{Extended_Pictographic}\p{Emoji_Modifier}\x{1F1E6}-\x{1F1FF}\x{FE0E}\x{FE0F}\x{200D}\x{20E3}\x{E0020}-\x{E007F}]",
    )
    .unwrap()
});

// A word character before and a domain after marks an e-mail address
static MENTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?P<before>\w)?@\w+(?P<domain>\.\w)?").unwrap());

// Matched against whole whitespace-separated tokens
static EMOTICON_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(?:[:;=][-'^o]?[)(\]\[dDpPoO/\\|*3$@]+|[xX8]-?[D)(]|[)(\]\[dD][-'^]?[:;=]|<3+|</3|\^[_.]?\^|-_-|[oO0]_[oO0]|T_T|:'[()])$"#,
    )
    .unwrap()
});

/// How aggressively post text is cleaned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningPolicy {
    /// URLs and emoji only.
    Basic,
    /// Also @-mentions and emoticons.
    #[default]
    Strict,
}

impl fmt::Display for CleaningPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleaningPolicy::Basic => write!(f, "basic"),
            CleaningPolicy::Strict => write!(f, "strict"),
        }
    }
}

impl FromStr for CleaningPolicy {
    type Err = GeocovError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(CleaningPolicy::Basic),
            "strict" => Ok(CleaningPolicy::Strict),
            other => Err(GeocovError::Config(format!(
                "unknown cleaning policy '{}'",
                other
            ))),
        }
    }
}

/// Removes noise tokens from post text.
///
/// Each pass strips emoji, then URLs, then (strict only) mentions and
/// emoticon tokens, and finally collapses whitespace. Passes repeat until
/// the text stops changing, so `clean(clean(x)) == clean(x)`: removing one
/// token can expose another (`http:@a//b.co` becomes a URL once the
/// mention is gone).
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCleaner {
    policy: CleaningPolicy,
}

impl TextCleaner {
    pub fn new(policy: CleaningPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> CleaningPolicy {
        self.policy
    }

    /// Clean a single text value.
    pub fn clean(&self, text: &str) -> String {
        let mut current = self.pass(text);
        loop {
            // A pass never lengthens its input, so this terminates
            let next = self.pass(&current);
            if next == current {
                return current;
            }
            current = next;
        }
    }

    fn pass(&self, text: &str) -> String {
        let text = EMOJI_PATTERN.replace_all(text, " ");
        let text = URL_PATTERN.replace_all(&text, " ");

        let text: Cow<'_, str> = match self.policy {
            CleaningPolicy::Basic => text,
            CleaningPolicy::Strict => {
                let without_mentions = MENTION_PATTERN.replace_all(&text, |caps: &Captures<'_>| {
                    let before = caps.name("before").map_or("", |m| m.as_str());
                    match caps.name("domain") {
                        Some(_) if !before.is_empty() => caps[0].to_string(),
                        Some(domain) => domain.as_str().to_string(),
                        None => before.to_string(),
                    }
                });
                Cow::Owned(
                    without_mentions
                        .split_whitespace()
                        .filter(|token| !EMOTICON_PATTERN.is_match(token))
                        .collect::<Vec<_>>()
                        .join(" "),
                )
            }
        };

        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}
