use std::sync::Arc;

use http::Extensions;
use serde_json::{Map, Value};

/// Per-request record of what happened to the request body.
///
/// Stored in the request [`Extensions`]. Any component that takes the body
/// for parsing must set [`consumed`](Self::is_consumed) so later body parsers
/// leave the request alone.
#[derive(Debug, Clone)]
pub struct BodyContext {
    consumed: bool,
    value: Value,
    raw: Option<Arc<str>>,
}

impl Default for BodyContext {
    fn default() -> Self {
        BodyContext {
            consumed: false,
            value: Value::Object(Map::new()),
            raw: None,
        }
    }
}

impl BodyContext {
    /// A context for a body already parsed by some other component.
    #[must_use]
    pub fn consumed_with(value: Value) -> Self {
        BodyContext {
            consumed: true,
            value,
            raw: None,
        }
    }

    /// Look up the context of a request, if any component created one.
    #[must_use]
    pub fn get(extensions: &Extensions) -> Option<&BodyContext> {
        extensions.get::<BodyContext>()
    }

    /// Get the context of a request, inserting a fresh one if missing.
    pub fn get_or_insert(extensions: &mut Extensions) -> &mut BodyContext {
        extensions.get_or_insert_default::<BodyContext>()
    }

    #[inline]
    #[must_use]
    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    #[inline]
    pub fn mark_consumed(&mut self) {
        self.consumed = true;
    }

    /// The parsed body, or an empty object if nothing was parsed.
    #[inline]
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    #[inline]
    pub fn set_value(&mut self, value: Value) {
        self.value = value;
    }

    /// Raw text the parsed value was produced from.
    #[inline]
    #[must_use]
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    #[inline]
    pub fn set_raw(&mut self, raw: impl Into<Arc<str>>) {
        self.raw = Some(raw.into());
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_to_empty_object() {
        let mut ext = Extensions::new();
        assert!(BodyContext::get(&ext).is_none());

        let ctx = BodyContext::get_or_insert(&mut ext);
        assert!(!ctx.is_consumed());
        assert_eq!(ctx.value(), &json!({}));
        assert_eq!(ctx.raw(), None);
    }

    #[test]
    fn test_get_or_insert_keeps_existing() {
        let mut ext = Extensions::new();
        ext.insert(BodyContext::consumed_with(json!("fake data")));

        let ctx = BodyContext::get_or_insert(&mut ext);
        assert!(ctx.is_consumed());
        assert_eq!(ctx.value(), &json!("fake data"));
    }
}
