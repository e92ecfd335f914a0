use std::{collections::HashMap, convert::Infallible, sync::Arc};

use futures::{future::BoxFuture, FutureExt};
use http::Method;

use crate::{
    handler::{BoxedErasedHandler, Handler},
    service::{Service, ServiceFuture},
    Error, IntoResponse, Request, Response,
};

type InnerRouter = matchit::Router<NodeId>;

type NodeId = u64;

struct Route {
    path: Arc<str>,
    handler: BoxedErasedHandler,
}

/// Path of the route that matched the request, inserted into request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedPath(pub Arc<str>);

#[derive(Debug, thiserror::Error)]
pub enum InsertError {
    #[error("Path must start with /: {0}")]
    MissingSlash(String),

    #[error(transparent)]
    Conflict(#[from] matchit::InsertError),
}

/// Routes requests by method and path to handlers or layered services.
///
/// A body parsing layer can wrap the whole router, or only the
/// services mounted on individual routes.
#[derive(Default)]
pub struct Router {
    get: InnerRouter,
    post: InnerRouter,
    put: InnerRouter,
    delete: InnerRouter,
    patch: InnerRouter,
    any: InnerRouter,
    routes: HashMap<NodeId, Route, rustc_hash::FxRandomState>,
    counter: u64,
}

macro_rules! impl_add_route {
    ($($method:ident => $service:ident,)*) => {$(
        pub fn $method<H, T>(&mut self, path: impl AsRef<str>, handler: H) -> Result<&mut Self, InsertError>
        where
            H: Handler<T>,
            T: 'static,
        {
            self.insert(stringify!($method), path.as_ref(), BoxedErasedHandler::erase(handler))
        }

        pub fn $service<S>(&mut self, path: impl AsRef<str>, service: S) -> Result<&mut Self, InsertError>
        where
            S: Service<Request, Response: IntoResponse, Error: IntoResponse>,
        {
            self.insert(stringify!($method), path.as_ref(), BoxedErasedHandler::erase_service(service))
        }
    )*};
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Router::default()
    }

    fn table(&mut self, method: &str) -> &mut InnerRouter {
        match method {
            "get" => &mut self.get,
            "post" => &mut self.post,
            "put" => &mut self.put,
            "delete" => &mut self.delete,
            "patch" => &mut self.patch,
            _ => &mut self.any,
        }
    }

    fn insert(&mut self, method: &str, path: &str, handler: BoxedErasedHandler) -> Result<&mut Self, InsertError> {
        if !path.starts_with('/') {
            return Err(InsertError::MissingSlash(path.to_owned()));
        }

        let id = self.counter;
        self.table(method).insert(path, id)?;
        self.counter += 1;

        self.routes.insert(id, Route {
            path: Arc::from(path),
            handler,
        });

        log::trace!("Added {} route {path}", method.to_uppercase());

        Ok(self)
    }

    fn match_route(&self, method: &Method, path: &str) -> Option<&Route> {
        let mut any = false;

        let router = match *method {
            Method::GET => &self.get,
            Method::POST => &self.post,
            Method::PUT => &self.put,
            Method::DELETE => &self.delete,
            Method::PATCH => &self.patch,
            _ => {
                any = true;
                &self.any
            }
        };

        let id = match router.at(path) {
            Ok(match_) => Some(*match_.value),
            // fallback to any if not already matching on any
            Err(_) if !any => self.any.at(path).ok().map(|match_| *match_.value),
            _ => None,
        }?;

        self.routes.get(&id)
    }

    impl_add_route! {
        get => get_service,
        post => post_service,
        put => put_service,
        delete => delete_service,
        patch => patch_service,
        any => any_service,
    }
}

impl Service<Request> for Router {
    type Response = Response;
    type Error = Infallible;

    fn call(&self, req: Request) -> impl ServiceFuture<Self::Response, Self::Error> {
        let (mut parts, body) = req.into_parts();

        let fut: BoxFuture<'static, Response> = match self.match_route(&parts.method, parts.uri.path()) {
            Some(route) => {
                parts.extensions.insert(MatchedPath(route.path.clone()));

                route.handler.call(Request::from_parts(parts, body))
            }
            None => {
                log::trace!("No route for {} {}", parts.method, parts.uri.path());

                futures::future::ready(Error::NotFound.into_response()).boxed()
            }
        };

        fut.map(Ok)
    }
}
