//! XML-to-object conversion.
//!
//! The body layer does not know how XML maps onto a [`Value`], it delegates
//! to an [`XmlParser`]. The default is [`XmlToValue`], which follows the
//! conventions of the xml2js family of converters.

use serde_json::Value;

use crate::error::BoxError;

mod convert;

pub use convert::{ConvertOptions, XmlError, XmlToValue};

/// Converts a complete XML document into a structured value.
pub trait XmlParser: Send + Sync + 'static {
    fn parse(&self, text: &str) -> Result<Value, BoxError>;
}

impl<F> XmlParser for F
where
    F: Fn(&str) -> Result<Value, BoxError> + Send + Sync + 'static,
{
    #[inline]
    fn parse(&self, text: &str) -> Result<Value, BoxError> {
        (self)(text)
    }
}

impl XmlParser for XmlToValue {
    #[inline]
    fn parse(&self, text: &str) -> Result<Value, BoxError> {
        Ok(self.convert(text)?)
    }
}
