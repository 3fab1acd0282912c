//! Output rendering for collected rows

pub mod json;
pub mod text;

pub use json::{render_json_string, Snapshot};
pub use text::render_exposition;
