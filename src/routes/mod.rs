//! Route definitions.

pub mod api;

pub use api::create_router;
