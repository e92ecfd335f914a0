//! The process-wide pattern is shared state, so this lives in its own test binary.

use std::convert::Infallible;

use ftl_xml_body::{
    body::Body, global_pattern, reset_global_pattern, set_global_pattern, service::service_fn, BodyContext,
    ContentTypePattern, Layer, Request, Service, XmlBodyLayer,
};
use http::header::CONTENT_TYPE;
use serde_json::json;

const ITEMS_XML: &str = "<list><item>item1</item><item>item2</item><item>item3</item></list>";

fn post(content_type: &str) -> Request {
    http::Request::post("/").header(CONTENT_TYPE, content_type).body(Body::from(ITEMS_XML)).unwrap()
}

#[tokio::test]
async fn test_global_pattern_override() {
    let svc = XmlBodyLayer::new().layer(service_fn(|req: Request| async move {
        Ok::<_, Infallible>(BodyContext::get(req.extensions()).cloned().unwrap_or_default())
    }));

    assert!(global_pattern().matches("application/xml"));

    set_global_pattern(ContentTypePattern::new(r"custom/mime").unwrap());
    assert!(global_pattern().matches("custom/mime"));
    assert!(!global_pattern().matches("application/xml"));

    // layers built before the change see it too
    let ctx = svc.call(post("application/xml")).await.unwrap();
    assert!(!ctx.is_consumed());
    assert_eq!(ctx.value(), &json!({}));

    let ctx = svc.call(post("custom/mime")).await.unwrap();
    assert_eq!(ctx.value(), &json!({ "list": { "item": ["item1", "item2", "item3"] } }));

    reset_global_pattern();
    assert!(global_pattern().matches("application/xml"));
}
