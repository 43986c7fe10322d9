//! HTTP surface: one page with a topic form, served by axum.

pub mod page;
pub mod routes;

pub use page::render_page;
pub use routes::{router, TopicForm};
