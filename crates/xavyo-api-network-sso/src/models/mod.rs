//! Rendered pages

pub mod responses;

pub use responses::{html_escape, render_error_page, render_login_prompt};
