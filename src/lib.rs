//! XML request body parsing for ftl-style services.
//!
//! [`XmlBodyLayer`] buffers request bodies whose `Content-Type` names an XML
//! type, converts them to a [`serde_json::Value`] and stores the result in
//! the request's [`BodyContext`]. Handlers read it with the [`Xml`](extract::Xml)
//! extractor.

#![warn(clippy::perf, clippy::style, clippy::must_use_candidate)]
#![allow(clippy::manual_async_fn)]

extern crate tracing as log;

pub extern crate http;

#[macro_use]
mod macros;

pub mod body;
pub mod content_type;
pub mod context;
pub mod error;
pub mod extract;
pub mod handler;
pub mod layers;
pub mod response;
pub mod router;
pub mod service;
pub mod xml;

pub use http::request::Parts as RequestParts;
pub use http::response::Parts as ResponseParts;
pub type Request = http::Request<body::Body>;
pub type Response = http::Response<body::Body>;

pub use crate::content_type::{global_pattern, reset_global_pattern, set_global_pattern, ContentTypePattern};
pub use crate::context::BodyContext;
pub use crate::error::Error;
pub use crate::extract::{FromRequest, Xml};
pub use crate::layers::xml_body::{XmlBodyLayer, XmlBodyOptions};
pub use crate::response::IntoResponse;
pub use crate::router::Router;
pub use crate::service::{HyperService, Service};
pub use tower_layer::Layer;
