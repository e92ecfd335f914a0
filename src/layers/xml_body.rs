//! Parses XML request bodies into a [`BodyContext`] for downstream handlers.
//!
//! ```ignore
//! let mut router = Router::new();
//! router.post_service("/feed", XmlBodyLayer::new().default_handle_error().layer(feed.into_service()))?;
//! ```

use std::{future::Ready, sync::Arc};

use http::StatusCode;
use serde::Deserialize;
use tower_layer::Stack;

use crate::{
    body::BodyError,
    content_type::{self, ContentTypePattern},
    context::BodyContext,
    error::BoxError,
    layers::handle_error::HandleErrorLayer,
    service::{Service, ServiceFuture},
    xml::{XmlParser, XmlToValue},
    Error, IntoResponse, Layer, Request, Response,
};

#[derive(Debug, thiserror::Error)]
pub enum XmlBodyError {
    /// The content-type announced XML but the body was empty or only whitespace.
    #[error("Length Required")]
    EmptyBody,

    #[error("Malformed XML body: {0}")]
    Malformed(#[source] BoxError),

    #[error(transparent)]
    Body(#[from] BodyError),
}

impl XmlBodyError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            XmlBodyError::EmptyBody => StatusCode::LENGTH_REQUIRED,
            XmlBodyError::Malformed(_) => StatusCode::BAD_REQUEST,
            XmlBodyError::Body(e) => e.status(),
        }
    }
}

impl IntoResponse for XmlBodyError {
    fn into_response(self) -> Response {
        Error::from(self).into_response()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct XmlBodyOptions {
    /// Strip leading and trailing whitespace from the body before checking
    /// whether it is empty and parsing it.
    pub trim: bool,
}

impl Default for XmlBodyOptions {
    fn default() -> Self {
        XmlBodyOptions { trim: true }
    }
}

#[derive(Clone)]
struct Shared {
    options: XmlBodyOptions,
    pattern: Option<ContentTypePattern>,
    parser: Arc<dyn XmlParser>,
}

/// Layer that buffers and parses request bodies whose content-type matches
/// an XML pattern, see the [module docs](self).
#[must_use]
#[derive(Clone)]
pub struct XmlBodyLayer {
    shared: Arc<Shared>,
}

impl Default for XmlBodyLayer {
    fn default() -> Self {
        XmlBodyLayer::new()
    }
}

fn render_error(e: Error) -> Ready<Response> {
    std::future::ready(e.into_response())
}

impl XmlBodyLayer {
    /// Create a layer with default options, the [`XmlToValue`] parser and
    /// the process-wide content-type pattern.
    pub fn new() -> Self {
        XmlBodyLayer::with_options(XmlBodyOptions::default())
    }

    pub fn with_options(options: XmlBodyOptions) -> Self {
        XmlBodyLayer {
            shared: Arc::new(Shared {
                options,
                pattern: None,
                parser: Arc::new(XmlToValue::default()),
            }),
        }
    }

    /// Whether to trim the body before the empty check and parsing.
    ///
    /// Default to `true`
    pub fn trim(mut self, trim: bool) -> Self {
        Arc::make_mut(&mut self.shared).options.trim = trim;
        self
    }

    /// Use this pattern instead of the process-wide one.
    pub fn with_pattern(mut self, pattern: ContentTypePattern) -> Self {
        Arc::make_mut(&mut self.shared).pattern = Some(pattern);
        self
    }

    /// Replace the XML-to-object converter.
    pub fn with_parser(mut self, parser: impl XmlParser) -> Self {
        Arc::make_mut(&mut self.shared).parser = Arc::new(parser);
        self
    }

    #[must_use]
    pub fn options(&self) -> XmlBodyOptions {
        self.shared.options
    }

    /// Stack a [`HandleErrorLayer`] on top that renders body errors
    /// (411, 400, ...) as responses.
    pub fn default_handle_error(self) -> Stack<XmlBodyLayer, HandleErrorLayer<fn(Error) -> Ready<Response>>> {
        Stack::new(self, HandleErrorLayer::new(render_error as fn(Error) -> Ready<Response>))
    }
}

impl<S> Layer<S> for XmlBodyLayer {
    type Service = XmlBody<S>;

    fn layer(&self, inner: S) -> Self::Service {
        XmlBody {
            inner: Arc::new(inner),
            shared: self.shared.clone(),
        }
    }
}

pub struct XmlBody<S> {
    inner: Arc<S>,
    shared: Arc<Shared>,
}

impl<S> Clone for XmlBody<S> {
    fn clone(&self) -> Self {
        XmlBody {
            inner: self.inner.clone(),
            shared: self.shared.clone(),
        }
    }
}

impl Shared {
    fn matches(&self, req: &Request) -> bool {
        match self.pattern {
            Some(ref pattern) => pattern.matches_headers(req.headers()),
            None => content_type::global_pattern().matches_headers(req.headers()),
        }
    }
}

impl<S> Service<Request> for XmlBody<S>
where
    S: Service<Request, Error: Into<Error>>,
{
    type Response = S::Response;
    type Error = Error;

    fn call(&self, mut req: Request) -> impl ServiceFuture<Self::Response, Self::Error> {
        let inner = self.inner.clone();
        let shared = self.shared.clone();

        async move {
            if BodyContext::get(req.extensions()).is_some_and(BodyContext::is_consumed) {
                log::trace!("Request body already consumed, skipping XML parsing");
                return inner.call(req).await.map_err(Into::into);
            }

            if !shared.matches(&req) {
                return inner.call(req).await.map_err(Into::into);
            }

            BodyContext::get_or_insert(req.extensions_mut()).mark_consumed();

            let raw = req.body_mut().to_string_lossy().await.map_err(XmlBodyError::from)?;
            let text = if shared.options.trim { raw.trim() } else { raw.as_str() };

            if text.is_empty() {
                log::debug!("Rejecting empty XML body on {}", req.uri().path());
                return Err(XmlBodyError::EmptyBody.into());
            }

            let value = match shared.parser.parse(text) {
                Ok(value) => value,
                Err(e) => {
                    log::debug!("Rejecting malformed XML body on {}: {e}", req.uri().path());
                    return Err(XmlBodyError::Malformed(e).into());
                }
            };

            let ctx = BodyContext::get_or_insert(req.extensions_mut());
            ctx.set_value(value);
            ctx.set_raw(text);

            inner.call(req).await.map_err(Into::into)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use serde_json::{json, Value};

    use super::*;
    use crate::{body::Body, service::service_fn};

    const ITEMS_XML: &str = "<list><item>item1</item><item>item2</item><item>item3</item></list>";

    /// Inner service that hands back the request's body context.
    fn echo_ctx() -> impl Service<Request, Response = BodyContext, Error = Infallible> {
        service_fn(|req: Request| async move {
            Ok::<_, Infallible>(BodyContext::get(req.extensions()).cloned().unwrap_or_default())
        })
    }

    fn xml_request(content_type: Option<&'static str>, body: impl Into<Body>) -> Request {
        let mut builder = http::Request::post("/");
        if let Some(ct) = content_type {
            builder = builder.header(http::header::CONTENT_TYPE, ct);
        }
        builder.body(body.into()).unwrap()
    }

    fn layer() -> XmlBodyLayer {
        XmlBodyLayer::new().with_pattern(ContentTypePattern::default())
    }

    #[tokio::test]
    async fn test_parses_matching_body() {
        let svc = layer().layer(echo_ctx());

        let ctx = svc.call(xml_request(Some("application/vendor-spec+xml"), ITEMS_XML)).await.unwrap();

        assert!(ctx.is_consumed());
        assert_eq!(ctx.value(), &json!({ "list": { "item": ["item1", "item2", "item3"] } }));
        assert_eq!(ctx.raw(), Some(ITEMS_XML));
    }

    #[tokio::test]
    async fn test_charset_parameter_ignored() {
        let svc = layer().layer(echo_ctx());

        let ctx = svc.call(xml_request(Some("text/xml; charset=utf-8"), "<a>1</a>")).await.unwrap();
        assert_eq!(ctx.value(), &json!({ "a": "1" }));
    }

    #[tokio::test]
    async fn test_skips_without_content_type() {
        let svc = layer().layer(echo_ctx());

        let ctx = svc.call(xml_request(None, ITEMS_XML)).await.unwrap();
        assert!(!ctx.is_consumed());
        assert_eq!(ctx.value(), &json!({}));
    }

    #[tokio::test]
    async fn test_skips_other_content_types() {
        let svc = layer().layer(echo_ctx());

        let ctx = svc.call(xml_request(Some("application/json"), r#"{"a":1}"#)).await.unwrap();
        assert!(!ctx.is_consumed());
    }

    #[tokio::test]
    async fn test_empty_body_is_411() {
        let svc = layer().layer(echo_ctx());

        let err = svc.call(xml_request(Some("application/xml"), Body::empty())).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::LENGTH_REQUIRED);
    }

    #[tokio::test]
    async fn test_whitespace_body_is_411() {
        let svc = layer().layer(echo_ctx());

        let err = svc.call(xml_request(Some("application/xml"), "   ")).await.unwrap_err();
        assert!(matches!(err, Error::XmlBody(XmlBodyError::EmptyBody)));
    }

    #[tokio::test]
    async fn test_whitespace_body_without_trim_is_parsed() {
        let svc = layer().trim(false).layer(echo_ctx());

        let err = svc.call(xml_request(Some("application/xml"), "   ")).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_body_is_400_with_cause() {
        let svc = layer().layer(echo_ctx());

        let err = svc.call(xml_request(Some("application/vendor-spec+xml"), "<xml>this is invalid")).await.unwrap_err();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        match err {
            Error::XmlBody(e @ XmlBodyError::Malformed(_)) => assert!(std::error::Error::source(&e).is_some()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_deeply_nested_body_is_400() {
        let svc = layer().layer(echo_ctx());

        let depth = 100_000;
        let deep = format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));

        let err = svc.call(xml_request(Some("application/xml"), deep)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_already_consumed_left_alone() {
        let svc = layer().layer(echo_ctx());

        let mut req = xml_request(Some("application/xml"), ITEMS_XML);
        req.extensions_mut().insert(BodyContext::consumed_with(json!("fake data")));

        let ctx = svc.call(req).await.unwrap();
        assert_eq!(ctx.value(), &json!("fake data"));
        assert_eq!(ctx.raw(), None);
    }

    #[tokio::test]
    async fn test_transport_error_propagated() {
        let svc = layer().layer(echo_ctx());

        let body = Body::stream(futures::stream::iter(vec![
            Ok(http_body::Frame::data(bytes::Bytes::from_static(b"<list>"))),
            Err(BodyError::StreamAborted),
        ]));

        let err = svc.call(xml_request(Some("application/xml"), body)).await.unwrap_err();
        assert!(matches!(err, Error::XmlBody(XmlBodyError::Body(BodyError::StreamAborted))));
    }

    #[tokio::test]
    async fn test_custom_parser() {
        let svc = layer()
            .with_parser(|text: &str| -> Result<Value, BoxError> { Ok(json!({ "len": text.len() })) })
            .layer(echo_ctx());

        let ctx = svc.call(xml_request(Some("text/xml"), "  <a/>  ")).await.unwrap();
        assert_eq!(ctx.value(), &json!({ "len": 4 }));
    }

    #[tokio::test]
    async fn test_custom_pattern() {
        let svc = XmlBodyLayer::new()
            .with_pattern(ContentTypePattern::new("custom/mime").unwrap())
            .layer(echo_ctx());

        let ctx = svc.call(xml_request(Some("application/xml"), ITEMS_XML)).await.unwrap();
        assert!(!ctx.is_consumed());

        let ctx = svc.call(xml_request(Some("custom/mime"), ITEMS_XML)).await.unwrap();
        assert_eq!(ctx.value(), &json!({ "list": { "item": ["item1", "item2", "item3"] } }));
    }

    #[tokio::test]
    async fn test_default_handle_error_renders_status() {
        let svc = layer()
            .default_handle_error()
            .layer(service_fn(|_req: Request| async { Ok::<_, Infallible>(().into_response()) }));

        let resp = svc.call(xml_request(Some("application/xml"), "")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::LENGTH_REQUIRED);

        let resp = svc.call(xml_request(Some("application/xml"), "<a>")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = svc.call(xml_request(Some("application/xml"), "<a/>")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn test_options_deserialize() {
        let options: XmlBodyOptions = serde_json::from_str("{}").unwrap();
        assert!(options.trim);

        let options: XmlBodyOptions = serde_json::from_str(r#"{ "trim": false }"#).unwrap();
        assert!(!XmlBodyLayer::with_options(options).options().trim);
    }
}
