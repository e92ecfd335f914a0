//! Content-type matching for XML request bodies.
//!
//! A [`ContentTypePattern`] is tested against the *essence* of a
//! `Content-Type` header, meaning the `type/subtype` pair with any
//! parameters such as `; charset=utf-8` removed. Matching is always
//! case-insensitive.
//!
//! Layers are normally given an explicit pattern. Layers built without one
//! consult the process-wide pattern, see [`set_global_pattern`].

use std::{fmt, sync::Arc};

use arc_swap::ArcSwap;
use http::{header::CONTENT_TYPE, HeaderMap};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// Token characters permitted in a MIME type or subtype prefix.
const TOKEN: &str = r"[\w!#$%&*`\-.^~]";

/// Matches `<type>/xml` and `<type>/<token>+xml`, such as `text/xml`,
/// `application/xml`, `application/atom+xml` or
/// `application/vnd.google-earth.kml+xml`.
#[derive(Clone)]
pub struct ContentTypePattern {
    regex: Regex,
}

impl fmt::Debug for ContentTypePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContentTypePattern").field(&self.regex.as_str()).finish()
    }
}

impl Default for ContentTypePattern {
    fn default() -> Self {
        static DEFAULT: Lazy<Regex> = Lazy::new(|| {
            let pattern = format!("^{TOKEN}+/({TOKEN}+\\+)?xml$");

            match RegexBuilder::new(&pattern).case_insensitive(true).build() {
                Ok(regex) => regex,
                Err(e) => unreachable!("default XML content-type pattern is invalid: {e}"),
            }
        });

        ContentTypePattern { regex: DEFAULT.clone() }
    }
}

impl From<Regex> for ContentTypePattern {
    fn from(regex: Regex) -> Self {
        ContentTypePattern { regex }
    }
}

impl ContentTypePattern {
    /// Compile a custom pattern. The pattern is applied case-insensitively
    /// to the content-type essence, it is not anchored automatically.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(ContentTypePattern {
            regex: RegexBuilder::new(pattern).case_insensitive(true).build()?,
        })
    }

    /// Test a raw content-type value, ignoring parameters and surrounding whitespace.
    #[must_use]
    pub fn matches(&self, content_type: &str) -> bool {
        self.regex.is_match(essence(content_type))
    }

    /// Test the `Content-Type` header of a request. Missing or non-ASCII
    /// headers never match.
    #[must_use]
    pub fn matches_headers(&self, headers: &HeaderMap) -> bool {
        match headers.get(CONTENT_TYPE).map(|v| v.to_str()) {
            Some(Ok(value)) => self.matches(value),
            _ => false,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// Strip parameters such as `; charset=utf-8` from a content-type value.
fn essence(content_type: &str) -> &str {
    match content_type.split_once(';') {
        Some((bare, _)) => bare.trim(),
        None => content_type.trim(),
    }
}

static GLOBAL: Lazy<ArcSwap<ContentTypePattern>> = Lazy::new(|| ArcSwap::from_pointee(ContentTypePattern::default()));

/// Replace the process-wide pattern used by layers without an explicit pattern.
///
/// This must be called before serving traffic. Requests already being matched
/// may observe either the old or the new pattern.
pub fn set_global_pattern(pattern: ContentTypePattern) {
    log::debug!("Setting global XML content-type pattern to {}", pattern.as_str());

    GLOBAL.store(Arc::new(pattern));
}

/// Restore the process-wide pattern to [`ContentTypePattern::default`].
pub fn reset_global_pattern() {
    GLOBAL.store(Arc::new(ContentTypePattern::default()));
}

/// Current process-wide pattern.
#[must_use]
pub fn global_pattern() -> Arc<ContentTypePattern> {
    GLOBAL.load_full()
}
