use bytes::Bytes;
use headers::{ContentType, HeaderMapExt as _};
use http::StatusCode;

use crate::{IntoResponse, Response};

use super::Body;

#[must_use]
#[derive(Clone)]
pub struct Json {
    inner: Result<Bytes, ()>,
}

impl Json {
    pub fn new<T: serde::Serialize>(value: T) -> Json {
        match Self::try_new(value) {
            Ok(resp) => resp,
            Err(e) => {
                log::error!("JSON Reply error: {e}");
                Json { inner: Err(()) }
            }
        }
    }

    pub fn try_new<T: serde::Serialize>(value: T) -> Result<Json, serde_json::Error> {
        Ok(Json {
            inner: Ok(Bytes::from(serde_json::to_vec(&value)?)),
        })
    }
}

impl IntoResponse for Json {
    fn into_response(self) -> Response {
        match self.inner {
            Ok(body) => {
                let mut resp = Response::new(Body::from(body));
                resp.headers_mut().typed_insert(ContentType::json());
                resp
            }
            Err(()) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}
