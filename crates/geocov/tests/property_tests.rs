//! Property-based tests for cleaning, labeling and checkpoints.
//!
//! # Running Property Tests
//!
//! ```bash
//! cargo test -p geocov --test property_tests
//!
//! # More cases
//! PROPTEST_CASES=10000 cargo test -p geocov --test property_tests
//! ```

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use regex::Regex;

use geocov::prune::{read_pruned, write_pruned};
use geocov::{CleaningPolicy, Post, PrunedBatch, TextCleaner, TopicAnnotator};

// =============================================================================
// Test Strategies
// =============================================================================

/// Post-like text mixing words, links, mentions, emoji and emoticons.
fn post_text() -> impl Strategy<Value = String> {
    let token = prop_oneof![
        "[a-zA-Z0-9]{1,10}",
        "https?://[a-z]{1,8}\\.(com|co|org)(/[a-z0-9]{0,6})?",
        "www\\.[a-z]{2,8}\\.net",
        "[a-z0-9_]{1,6}(https?://|www\\.)[a-z]{1,8}\\.com",
        "@[a-zA-Z_]{1,10}",
        "[a-zA-Z]{1,4}@[a-zA-Z_]{1,10}",
        Just("😀".to_string()),
        Just("🇬🇧".to_string()),
        Just("👍🏽".to_string()),
        Just(":)".to_string()),
        Just(";-D".to_string()),
        Just("<3".to_string()),
        Just("5G".to_string()),
        Just("chip".to_string()),
        "[.,!?\"'()]{1,2}",
    ];
    prop::collection::vec((token, prop_oneof![Just(" "), Just(""), Just("  "), Just("\n")]), 0..12)
        .prop_map(|parts| {
            parts
                .into_iter()
                .map(|(token, sep)| format!("{}{}", token, sep))
                .collect::<String>()
        })
}

fn any_text() -> impl Strategy<Value = String> {
    prop_oneof![post_text(), ".{0,60}"]
}

fn timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    (1_500_000_000i64..1_700_000_000, 0u32..1000).prop_map(|(secs, millis)| {
        Utc.timestamp_opt(secs, millis * 1_000_000).unwrap()
    })
}

fn post() -> impl Strategy<Value = Post> {
    (
        "[0-9]{1,19}",
        timestamp(),
        "[a-zA-Z0-9_]{1,15}",
        prop::option::of(0u64..10_000_000),
        prop::option::of(0u64..10_000),
        prop::option::of("#[a-z]{2,10}( #[a-z]{2,10})?"),
        prop::option::of(any::<bool>()),
        post_text(),
    )
        .prop_map(
            |(id, created_at, author_handle, followers, favorites, hashtags, verified, text)| Post {
                id,
                created_at,
                author_handle,
                author_follower_count: followers,
                author_following_count: followers.map(|n| n / 2),
                reshare_count: favorites,
                favorite_count: favorites,
                hashtags,
                author_verified: verified,
                text: text.trim().to_string(),
            },
        )
}

fn url_pattern() -> Regex {
    Regex::new(r"(?i)(?:https?://|www\.)\S").unwrap()
}

fn emoji_pattern() -> Regex {
    Regex::new(r"[\p{Extended_Pictographic}\p{Emoji_Modifier}\x{1F1E6}-\x{1F1FF}]").unwrap()
}

// =============================================================================
// Cleaning
// =============================================================================

proptest! {
    #[test]
    fn prop_cleaning_is_idempotent(text in any_text()) {
        for policy in [CleaningPolicy::Basic, CleaningPolicy::Strict] {
            let cleaner = TextCleaner::new(policy);
            let once = cleaner.clean(&text);
            prop_assert_eq!(cleaner.clean(&once), once);
        }
    }

    #[test]
    fn prop_cleaned_text_has_no_urls_or_emoji(text in post_text()) {
        let cleaned = TextCleaner::new(CleaningPolicy::Basic).clean(&text);
        prop_assert!(!url_pattern().is_match(&cleaned), "url left in {:?}", cleaned);
        prop_assert!(!emoji_pattern().is_match(&cleaned), "emoji left in {:?}", cleaned);
    }

    #[test]
    fn prop_strict_cleaning_removes_mentions(text in post_text()) {
        let cleaned = TextCleaner::new(CleaningPolicy::Strict).clean(&text);
        let mention = Regex::new(r"(^|\s)@\w").unwrap();
        prop_assert!(!mention.is_match(&cleaned), "mention left in {:?}", cleaned);
    }

    #[test]
    fn prop_cleaned_text_is_trimmed(text in any_text()) {
        let cleaned = TextCleaner::default().clean(&text);
        prop_assert_eq!(cleaned.trim(), cleaned.as_str());
        prop_assert!(!cleaned.contains("  "));
    }
}

// =============================================================================
// Labeling
// =============================================================================

proptest! {
    #[test]
    fn prop_labeling_is_deterministic(posts in prop::collection::vec(post(), 0..20)) {
        let annotator = TopicAnnotator::default();
        let first = annotator.annotate(PrunedBatch::new("k", posts.clone()), &["five_g", "microchip"]).unwrap();
        let second = annotator.annotate(PrunedBatch::new("k", posts.clone()), &["five_g", "microchip"]).unwrap();

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(&first.posts, &posts);
        for topic in ["five_g", "microchip"] {
            prop_assert_eq!(first.label(topic).unwrap().len(), first.len());
        }
    }

    #[test]
    fn prop_microchip_label_matches_substring(posts in prop::collection::vec(post(), 1..10)) {
        let annotated = TopicAnnotator::default()
            .annotate(PrunedBatch::new("k", posts), &["microchip"])
            .unwrap();
        let labels = annotated.label("microchip").unwrap();
        for (post, hit) in annotated.posts.iter().zip(labels) {
            prop_assert_eq!(*hit, post.text.to_lowercase().contains("chip"));
        }
    }
}

// =============================================================================
// Checkpoints
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_checkpoint_round_trip(posts in prop::collection::vec(post(), 0..15)) {
        // Repeated ids are dropped on read, so keep the first of each
        let mut seen = std::collections::HashSet::new();
        let posts: Vec<Post> = posts.into_iter().filter(|p| seen.insert(p.id.clone())).collect();

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("original_k.csv");
        let batch = PrunedBatch::new("k", posts);
        write_pruned(&path, &batch).unwrap();

        let (loaded, skipped) = read_pruned(&path, "k").unwrap();
        prop_assert_eq!(skipped, 0);
        prop_assert_eq!(loaded, batch);
    }
}
