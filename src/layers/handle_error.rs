use std::{convert::Infallible, future::Future, sync::Arc};

use crate::{
    service::{Service, ServiceFuture},
    IntoResponse, Layer, Response,
};

/// Converts errors from the inner service into responses using the given callback,
/// producing a service that never fails.
pub struct HandleErrorLayer<F, S = ()> {
    inner: S,
    cb: Arc<F>,
}

impl<F, S: Clone> Clone for HandleErrorLayer<F, S> {
    fn clone(&self) -> Self {
        HandleErrorLayer {
            inner: self.inner.clone(),
            cb: self.cb.clone(),
        }
    }
}

impl<F> HandleErrorLayer<F> {
    pub fn new(cb: F) -> Self {
        HandleErrorLayer {
            inner: (),
            cb: Arc::new(cb),
        }
    }
}

impl<F, S> Layer<S> for HandleErrorLayer<F> {
    type Service = HandleErrorLayer<F, S>;

    fn layer(&self, inner: S) -> Self::Service {
        HandleErrorLayer {
            inner,
            cb: self.cb.clone(),
        }
    }
}

impl<F, S, Req, R, Fut> Service<Req> for HandleErrorLayer<F, S>
where
    S: Service<Req, Response: IntoResponse + Send, Error: Send>,
    F: Fn(S::Error) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    type Response = Response;
    type Error = Infallible;

    fn call(&self, req: Req) -> impl ServiceFuture<Self::Response, Self::Error> {
        let cb = self.cb.clone();
        let fut = self.inner.call(req);

        async move {
            let e = match fut.await {
                Ok(resp) => return Ok(resp.into_response()),
                Err(e) => e,
            };

            Ok(cb(e).await.into_response())
        }
    }
}
