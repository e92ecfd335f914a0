use core::future::{Future, IntoFuture};
use std::{convert::Infallible, marker::PhantomData, sync::Arc};

use futures::future::BoxFuture;

use crate::{
    extract::{FromRequest, FromRequestParts},
    service::{Service, ServiceFuture},
    Error, IntoResponse, Request, Response,
};

pub trait Handler<T>: Clone + Send + Sync + 'static {
    fn call(self, req: Request) -> impl Future<Output = Response> + Send + 'static;

    /// Turn the handler into a [`Service`], for wrapping it in layers.
    fn into_service(self) -> HandlerService<Self, T> {
        HandlerService {
            handler: self,
            _marker: PhantomData,
        }
    }
}

impl<Func, R, Fut, Res> Handler<((),)> for Func
where
    Func: FnOnce() -> R + Clone + Send + Sync + 'static,
    R: IntoFuture<IntoFuture = Fut> + Send,
    Fut: Future<Output = Res> + Send,
    Res: IntoResponse,
{
    fn call(self, _req: Request) -> impl Future<Output = Response> + Send + 'static {
        async move { self().await.into_response() }
    }
}

fn reject(rejection: impl Into<Error>) -> Response {
    rejection.into().into_response()
}

macro_rules! impl_handler {
    ([$($t:ident),*], $last:ident) => {
        // NOTE: The `Z` parameter avoid conflicts, and is not used.
        impl<Func, R, Fut, Res, Z, $($t,)* $last> Handler<(Z, $($t,)* $last,)> for Func
        where
            Func: FnOnce($($t,)* $last) -> R + Clone + Send + Sync + 'static,
            R: IntoFuture<IntoFuture = Fut> + Send,
            Fut: Future<Output = Res> + Send,
            Res: IntoResponse,
            $($t: FromRequestParts + Send,)*
            $last: FromRequest<Z> + Send,
        {
            #[allow(non_snake_case)]
            fn call(self, req: Request) -> impl Future<Output = Response> + Send + 'static {
                async move {
                    #[allow(unused_mut)]
                    let (mut parts, body) = req.into_parts();

                    $(
                        let $t = match $t::from_request_parts(&mut parts).await {
                            Ok(t) => t,
                            Err(rejection) => return reject(rejection),
                        };
                    )*

                    let $last = match $last::from_request(Request::from_parts(parts, body)).await {
                        Ok(t) => t,
                        Err(rejection) => return reject(rejection),
                    };

                    self($($t,)* $last).await.into_response()
                }
            }
        }
    };
}

all_the_tuples!(impl_handler);

/// A [`Handler`] driven as an infallible [`Service`].
pub struct HandlerService<H, T> {
    handler: H,
    _marker: PhantomData<fn() -> T>,
}

impl<H: Clone, T> Clone for HandlerService<H, T> {
    fn clone(&self) -> Self {
        HandlerService {
            handler: self.handler.clone(),
            _marker: PhantomData,
        }
    }
}

impl<H, T> Service<Request> for HandlerService<H, T>
where
    H: Handler<T>,
    T: 'static,
{
    type Response = Response;
    type Error = Infallible;

    fn call(&self, req: Request) -> impl ServiceFuture<Self::Response, Self::Error> {
        let fut = Handler::call(self.handler.clone(), req);

        async move { Ok(fut.await) }
    }
}

/// A type-erased route target, equivalent to `Arc<dyn Service<Request, ...>>`.
pub(crate) struct BoxedErasedHandler(Arc<dyn ErasedHandler>);

impl Clone for BoxedErasedHandler {
    fn clone(&self) -> Self {
        BoxedErasedHandler(self.0.clone())
    }
}

pub(crate) trait ErasedHandler: Send + Sync + 'static {
    fn call(&self, req: Request) -> BoxFuture<'static, Response>;
}

struct MakeErasedService<S>(S);

impl<S> ErasedHandler for MakeErasedService<S>
where
    S: Service<Request, Response: IntoResponse, Error: IntoResponse>,
{
    fn call(&self, req: Request) -> BoxFuture<'static, Response> {
        let fut = Service::call(&self.0, req);

        Box::pin(async move {
            match fut.await {
                Ok(resp) => resp.into_response(),
                Err(e) => e.into_response(),
            }
        })
    }
}

impl BoxedErasedHandler {
    pub fn erase<T: 'static>(handler: impl Handler<T>) -> Self {
        Self::erase_service(handler.into_service())
    }

    pub fn erase_service<S>(service: S) -> Self
    where
        S: Service<Request, Response: IntoResponse, Error: IntoResponse>,
    {
        BoxedErasedHandler(Arc::new(MakeErasedService(service)))
    }

    pub fn call(&self, req: Request) -> BoxFuture<'static, Response> {
        ErasedHandler::call(&*self.0, req)
    }
}

#[cfg(test)]
mod tests {
    use http::{Method, StatusCode};

    use super::*;
    use crate::{body::Body, extract::Xml};

    #[tokio::test]
    async fn test_handler_extractors() {
        async fn echo(method: Method, Xml(value): Xml) -> String {
            format!("{method} {value}")
        }

        let resp = BoxedErasedHandler::erase(echo).call(Request::new(Body::empty())).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = resp.into_body().collect_bytes().await.unwrap();
        assert_eq!(body, "GET {}");
    }

    #[tokio::test]
    async fn test_erased_service_error_rendered() {
        let svc = crate::service::service_fn(|_req: Request| async { Err::<Response, _>(Error::NotFound) });

        let resp = BoxedErasedHandler::erase_service(svc).call(Request::new(Body::empty())).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
