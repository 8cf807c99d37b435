//! Helper functions for pages
//!
//! Formatting, URL and HTML helpers shared by the page renderer, the
//! static generator and the server.

mod date;
mod html;
mod list;
mod share;
mod url;

pub use date::*;
pub use html::*;
pub use list::*;
pub use share::*;
pub use url::*;
