//! Keyword router - sends recency-sensitive prompts to live-search providers

use anyhow::Result;
use regex::{Regex, RegexBuilder};

/// Which adapter set a prompt should use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The prompt asks about current events; use providers with live search
    Live,
    /// Static knowledge is enough
    Static,
}

/// Case-insensitive substring match over a fixed keyword list
#[derive(Debug, Clone)]
pub struct KeywordRouter {
    pattern: Option<Regex>,
}

impl KeywordRouter {
    pub fn new<I, S>(keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let alternatives: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .map(|k| regex::escape(&k))
            .collect();

        // An empty alternation would match every prompt
        let pattern = if alternatives.is_empty() {
            None
        } else {
            Some(
                RegexBuilder::new(&alternatives.join("|"))
                    .case_insensitive(true)
                    .build()?,
            )
        };

        Ok(Self { pattern })
    }

    /// Any keyword occurring anywhere in the prompt selects `Route::Live`
    pub fn route(&self, prompt: &str) -> Route {
        match &self.pattern {
            Some(pattern) if pattern.is_match(prompt) => Route::Live,
            _ => Route::Static,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_live_keywords;
    use proptest::prelude::*;

    fn router() -> KeywordRouter {
        KeywordRouter::new(default_live_keywords()).unwrap()
    }

    #[test]
    fn test_keyword_selects_live() {
        assert_eq!(router().route("What is the latest iPhone?"), Route::Live);
        assert_eq!(router().route("Latest news"), Route::Live);
        assert_eq!(router().route("UPCOMING elections"), Route::Live);
    }

    #[test]
    fn test_no_keyword_selects_static() {
        assert_eq!(router().route("Explain photosynthesis"), Route::Static);
    }

    #[test]
    fn test_substring_match() {
        // "currently" contains "current"
        assert_eq!(router().route("Who is currently leading?"), Route::Live);
    }

    #[test]
    fn test_keywords_are_literal() {
        let router = KeywordRouter::new(["c++", "a.b"]).unwrap();
        assert_eq!(router.route("learning C++"), Route::Live);
        assert_eq!(router.route("axb"), Route::Static);
    }

    #[test]
    fn test_empty_keyword_list_never_matches() {
        let router = KeywordRouter::new(Vec::<String>::new()).unwrap();
        assert_eq!(router.route("latest"), Route::Static);
        let router = KeywordRouter::new(["", "  "]).unwrap();
        assert_eq!(router.route("anything"), Route::Static);
    }

    proptest! {
        #[test]
        fn prop_match_ignores_case(prefix in "[a-z ]{0,10}", upper in proptest::bool::ANY) {
            let keyword = if upper { "TRENDING" } else { "Trending" };
            let prompt = format!("{}{} topics", prefix, keyword);
            prop_assert_eq!(router().route(&prompt), Route::Live);
        }
    }
}
