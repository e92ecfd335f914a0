use core::future::Future;
use std::{convert::Infallible, ops::Deref};

use http::{HeaderMap, Method, Uri};
use serde_json::Value;

use crate::{body::Body, context::BodyContext, router::MatchedPath, Error, Request, RequestParts};

pub trait FromRequestParts: Sized + Send + 'static {
    type Rejection: Into<Error> + Send + 'static;

    fn from_request_parts(parts: &mut RequestParts) -> impl Future<Output = Result<Self, Self::Rejection>> + Send;
}

mod private {
    #[derive(Debug, Clone, Copy)]
    pub enum ViaParts {}

    #[derive(Debug, Clone, Copy)]
    pub enum ViaRequest {}
}

pub trait FromRequest<Z = private::ViaRequest>: Sized + Send + 'static {
    type Rejection: Into<Error> + Send + 'static;

    fn from_request(req: Request) -> impl Future<Output = Result<Self, Self::Rejection>> + Send;
}

impl FromRequest for Request {
    type Rejection = Infallible;

    fn from_request(req: Request) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        futures::future::ok(req)
    }
}

impl FromRequest for Body {
    type Rejection = Infallible;

    fn from_request(req: Request) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        futures::future::ok(req.into_body())
    }
}

impl<T> FromRequest<private::ViaParts> for T
where
    T: FromRequestParts,
{
    type Rejection = <Self as FromRequestParts>::Rejection;

    fn from_request(req: Request) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        async move {
            let (mut parts, _) = req.into_parts();
            Self::from_request_parts(&mut parts).await
        }
    }
}

macro_rules! impl_from_parts_cloned {
    ($($ty:ty => |$parts:ident| $e:expr,)*) => {$(
        impl FromRequestParts for $ty {
            type Rejection = Infallible;

            fn from_request_parts(
                $parts: &mut RequestParts,
            ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
                futures::future::ok($e)
            }
        }
    )*};
}

impl_from_parts_cloned! {
    Method => |parts| parts.method.clone(),
    Uri => |parts| parts.uri.clone(),
    HeaderMap => |parts| parts.headers.clone(),
}

/// The parsed XML body of a request.
///
/// Holds an empty object when no body parser consumed the request, so
/// handlers can be mounted with or without an [`XmlBodyLayer`](crate::layers::xml_body::XmlBodyLayer)
/// in front of them.
#[derive(Debug, Clone, PartialEq)]
#[repr(transparent)]
pub struct Xml(pub Value);

impl Deref for Xml {
    type Target = Value;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts for Xml {
    type Rejection = Infallible;

    fn from_request_parts(parts: &mut RequestParts) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        futures::future::ok(Xml(match BodyContext::get(&parts.extensions) {
            Some(ctx) => ctx.value().clone(),
            None => BodyContext::default().into_value(),
        }))
    }
}

impl FromRequestParts for MatchedPath {
    type Rejection = Error;

    fn from_request_parts(parts: &mut RequestParts) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        futures::future::ready(match parts.extensions.get::<MatchedPath>() {
            Some(path) => Ok(path.clone()),
            None => Err(Error::MissingExtension),
        })
    }
}

impl FromRequestParts for BodyContext {
    type Rejection = Infallible;

    fn from_request_parts(parts: &mut RequestParts) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        futures::future::ok(BodyContext::get(&parts.extensions).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_xml_defaults_to_empty_object() {
        let (mut parts, _) = Request::new(Body::empty()).into_parts();

        let Xml(value) = Xml::from_request_parts(&mut parts).await.unwrap();
        assert_eq!(value, json!({}));
    }

    #[tokio::test]
    async fn test_xml_reads_context() {
        let mut req = Request::new(Body::empty());
        req.extensions_mut().insert(BodyContext::consumed_with(json!({ "a": "1" })));

        let xml = <Xml as FromRequest<_>>::from_request(req).await.unwrap();
        assert_eq!(xml["a"], "1");
    }
}
