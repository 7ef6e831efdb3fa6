//! # API Module
//!
//! HTTP endpoints served by the local listener while an authorization is in
//! flight. Spotify redirects the browser to [`callback`] once the user has
//! granted (or refused) access.
//!
//! ```rust,ignore
//! use axum::{Router, routing::get};
//! use crate_digger::api::callback;
//!
//! let app = Router::new().route("/callback", get(callback));
//! ```

mod callback;

pub use callback::{CallbackSlot, callback};
