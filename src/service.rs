use std::{future::Future, ops::Deref, sync::Arc};

use futures::{future::BoxFuture, FutureExt as _, TryFutureExt as _};
use hyper::body::Incoming;

use crate::{body::Body, error::BoxError, Request, Response};

pub trait ServiceFuture<R, E>: Future<Output = Result<R, E>> + Send + 'static {}

impl<T, R, E> ServiceFuture<R, E> for T where T: Future<Output = Result<R, E>> + Send + 'static {}

pub trait Service<Req>: Send + Sync + 'static {
    type Response;
    type Error;

    fn call(&self, req: Req) -> impl ServiceFuture<Self::Response, Self::Error>;
}

impl<R, T> Service<R> for T
where
    T: Deref<Target: Service<R>> + Send + Sync + 'static,
{
    type Response = <<T as Deref>::Target as Service<R>>::Response;
    type Error = <<T as Deref>::Target as Service<R>>::Error;

    #[inline]
    fn call(&self, req: R) -> impl ServiceFuture<Self::Response, Self::Error> {
        (**self).call(req)
    }
}

/// Service built from an async closure, see [`service_fn`].
#[derive(Clone, Copy)]
pub struct ServiceFn<F>(F);

/// Wrap a closure returning a future as a [`Service`].
pub fn service_fn<F>(f: F) -> ServiceFn<F> {
    ServiceFn(f)
}

impl<F, Req, Fut, R, E> Service<Req> for ServiceFn<F>
where
    F: Fn(Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    type Response = R;
    type Error = E;

    #[inline]
    fn call(&self, req: Req) -> impl ServiceFuture<Self::Response, Self::Error> {
        (self.0)(req)
    }
}

/// Adapts a [`Service`] over [`Request`] into a hyper service accepting
/// [`Incoming`] bodies.
pub struct HyperService<S>(Arc<S>);

impl<S> Clone for HyperService<S> {
    fn clone(&self) -> Self {
        HyperService(self.0.clone())
    }
}

impl<S> HyperService<S> {
    pub fn new(service: S) -> Self {
        HyperService(Arc::new(service))
    }
}

impl<S> hyper::service::Service<http::Request<Incoming>> for HyperService<S>
where
    S: Service<Request, Response = Response, Error: Into<BoxError>>,
{
    type Response = Response;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<Response, BoxError>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let (parts, body) = req.into_parts();

        self.0.call(Request::from_parts(parts, Body::from(body))).map_err(Into::into).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IntoResponse;
    use std::convert::Infallible;

    #[tokio::test]
    async fn test_service_fn_through_arc() {
        let svc = Arc::new(service_fn(|req: Request| async move {
            Ok::<_, Infallible>(req.uri().path().to_owned().into_response())
        }));

        let resp = svc.call(Request::new(Body::empty())).await.unwrap();
        assert_eq!(resp.status(), http::StatusCode::OK);
    }
}
