//! Completion layer: the backend seam, the gateway, and its error type.
//!
//! - [`gateway`] : the [`CompletionBackend`] trait implemented by
//!   [`CompletionClient`](crate::CompletionClient) (and by test doubles), the
//!   [`CompletionGateway`] that pins the tutor temperature, and the tagged
//!   [`GatewayReply`] that callers render.
//! - [`error`] : [`CompletionError`], the classification of every transport,
//!   HTTP, and payload failure.

pub mod error;
pub mod gateway;

pub use error::CompletionError;
pub use gateway::{CompletionBackend, CompletionFuture, CompletionGateway, GatewayReply};
