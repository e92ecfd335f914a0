use std::sync::Arc;

use http_body::Body as _;

use crate::{
    body::BodyError,
    service::{Service, ServiceFuture},
    Layer, Request,
};

/// Caps how many body bytes downstream readers may consume.
#[must_use]
pub struct LimitReqBody<S = ()> {
    inner: Arc<S>,
    limit: u64,
    reject: bool,
}

impl<S> Clone for LimitReqBody<S> {
    fn clone(&self) -> Self {
        LimitReqBody {
            inner: self.inner.clone(),
            limit: self.limit,
            reject: self.reject,
        }
    }
}

impl LimitReqBody {
    /// Create a new `LimitReqBody` layer with the specified limit, with
    /// the request being rejected if the body size is known to exceed the limit.
    ///
    /// This behavior can be changed with the [`reject`](Self::reject) method.
    pub fn new(limit: u64) -> Self {
        Self {
            inner: Arc::new(()),
            limit,
            reject: true,
        }
    }

    /// Reject the request up front when the body's size hint already exceeds the limit.
    ///
    /// Default to `true`
    pub fn reject(mut self, reject: bool) -> Self {
        self.reject = reject;
        self
    }
}

impl<S> Layer<S> for LimitReqBody {
    type Service = LimitReqBody<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LimitReqBody {
            inner: Arc::new(inner),
            limit: self.limit,
            reject: self.reject,
        }
    }
}

impl<S> Service<Request> for LimitReqBody<S>
where
    S: Service<Request, Error: From<BodyError>>,
{
    type Response = S::Response;
    type Error = S::Error;

    fn call(&self, req: Request) -> impl ServiceFuture<Self::Response, Self::Error> {
        let inner = self.inner.clone();
        let (limit, reject) = (self.limit, self.reject);

        async move {
            let (parts, body) = req.into_parts();

            if reject && body.size_hint().lower() > limit {
                log::debug!("Rejecting request body of at least {} bytes", body.size_hint().lower());
                return Err(BodyError::LengthLimitError.into());
            }

            inner.call(Request::from_parts(parts, body.limit(limit))).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{body::Body, service::service_fn, Error};
    use http::StatusCode;

    fn read_body() -> impl Service<Request, Response = usize, Error = Error> {
        service_fn(|mut req: Request| async move { Ok::<_, Error>(req.body_mut().collect_bytes().await?.len()) })
    }

    #[tokio::test]
    async fn test_known_size_rejected() {
        let svc = LimitReqBody::new(4).layer(read_body());

        let err = svc.call(Request::new(Body::from("<a>1</a>"))).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_within_limit() {
        let svc = LimitReqBody::new(64).layer(read_body());

        assert_eq!(svc.call(Request::new(Body::from("<a>1</a>"))).await.unwrap(), 8);
    }

    #[tokio::test]
    async fn test_limit_enforced_while_reading() {
        let svc = LimitReqBody::new(4).reject(false).layer(read_body());

        let err = svc.call(Request::new(Body::from("<a>1</a>"))).await.unwrap_err();
        assert!(matches!(err, Error::Body(BodyError::LengthLimitError)));
    }
}
