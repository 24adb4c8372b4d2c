//! API layer for the ApoloBilling attribute engine
//!
//! JSON-RPC and plain JSON handlers in front of `AttributeService`.

#![forbid(unsafe_code)]

pub mod dto;
pub mod handlers;

pub use dto::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use handlers::{configure_attributes, configure_health, configure_jsonrpc};

use actix_web::web;

/// Configure every route served by the engine
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_jsonrpc).service(
        web::scope("/api/v1")
            .configure(configure_health)
            .configure(configure_attributes),
    );
}
