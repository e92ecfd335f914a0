pub use tower_layer::{layer_fn, Identity, Layer, LayerFn, Stack};

pub mod handle_error;
pub mod limit_req_body;
pub mod xml_body;
