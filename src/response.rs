use bytes::Bytes;
use http::{
    header::{HeaderMap, HeaderName, HeaderValue},
    response::Parts,
    StatusCode,
};
use std::{borrow::Cow, convert::Infallible};

use crate::{body::Body, Response};

pub trait IntoResponseParts {
    fn into_response_parts(self, parts: &mut Parts);
}

pub trait IntoResponse {
    #[must_use]
    fn into_response(self) -> Response;
}

impl IntoResponseParts for () {
    #[inline]
    fn into_response_parts(self, _parts: &mut Parts) {}
}

impl IntoResponseParts for StatusCode {
    #[inline]
    fn into_response_parts(self, parts: &mut Parts) {
        parts.status = self;
    }
}

impl IntoResponseParts for HeaderMap {
    #[inline]
    fn into_response_parts(self, parts: &mut Parts) {
        parts.headers.extend(self);
    }
}

impl<const N: usize> IntoResponseParts for [(HeaderName, HeaderValue); N] {
    #[inline]
    fn into_response_parts(self, parts: &mut Parts) {
        parts.headers.reserve(N);
        for (name, value) in self {
            parts.headers.append(name, value);
        }
    }
}

impl IntoResponse for Response {
    #[inline]
    fn into_response(self) -> Response {
        self
    }
}

impl IntoResponse for () {
    #[inline]
    fn into_response(self) -> Response {
        Response::default()
    }
}

impl IntoResponse for Infallible {
    #[inline]
    fn into_response(self) -> Response {
        match self {}
    }
}

impl IntoResponse for StatusCode {
    #[inline]
    fn into_response(self) -> Response {
        let mut resp = Response::new(Body::empty());
        *resp.status_mut() = self;
        resp
    }
}

impl<T, E> IntoResponse for Result<T, E>
where
    T: IntoResponse,
    E: IntoResponse,
{
    #[inline]
    fn into_response(self) -> Response {
        match self {
            Ok(ok) => ok.into_response(),
            Err(err) => err.into_response(),
        }
    }
}

macro_rules! impl_into_response {
    ($($t:ident),*) => {
        #[allow(non_snake_case)]
        impl<R, $($t,)*> IntoResponse for (R, $($t,)*)
        where
            R: IntoResponse,
            $($t: IntoResponseParts,)*
        {
            fn into_response(self) -> Response {
                let (res, $($t,)*) = self;
                let (mut parts, body) = res.into_response().into_parts();
                $($t.into_response_parts(&mut parts);)*
                Response::from_parts(parts, body)
            }
        }
    };
}

impl_into_response!(A);
impl_into_response!(A, B);
impl_into_response!(A, B, C);

impl IntoResponse for Bytes {
    #[inline]
    fn into_response(self) -> Response {
        Response::new(self.into())
    }
}

impl IntoResponse for Vec<u8> {
    #[inline]
    fn into_response(self) -> Response {
        Response::new(self.into())
    }
}

impl IntoResponse for String {
    #[inline]
    fn into_response(self) -> Response {
        Response::new(self.into())
    }
}

impl IntoResponse for &'static str {
    #[inline]
    fn into_response(self) -> Response {
        Bytes::from_static(self.as_bytes()).into_response()
    }
}

impl IntoResponse for Cow<'static, str> {
    #[inline]
    fn into_response(self) -> Response {
        match self {
            Cow::Borrowed(s) => s.into_response(),
            Cow::Owned(s) => s.into_response(),
        }
    }
}

impl IntoResponse for serde_json::Value {
    #[inline]
    fn into_response(self) -> Response {
        crate::body::Json::new(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_tuple() {
        let resp = ("nope", StatusCode::LENGTH_REQUIRED).into_response();
        assert_eq!(resp.status(), StatusCode::LENGTH_REQUIRED);
    }

    #[test]
    fn test_unit_is_ok() {
        assert_eq!(().into_response().status(), StatusCode::OK);
    }
}
