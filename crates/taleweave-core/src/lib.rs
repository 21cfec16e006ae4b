//! Core types and the contribution pipeline for Taleweave.
//!
//! This crate has no HTTP or database dependencies. Storage
//! backends implement [`store::StoryStore`]; transports drive
//! [`pipeline::Pipeline`].

// Store impls use native `async fn`; the trait spells out `Send` bounds.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod identity;
pub mod limiter;
pub mod moderation;
pub mod pipeline;
pub mod slug;
pub mod store;
pub mod story;
pub mod text;

pub use error::{Error, Result};
pub use pipeline::Pipeline;
