//! axum routes.
//!
//! * `GET /`       : empty form.
//! * `POST /`      : form field `topic`; runs the pipeline and renders the
//!   page with its outcome.  A missing field counts as empty.
//! * `GET /static/*`: files under the configured static directory
//!   (synthesized audio lives there).

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Form, State},
    response::Html,
    routing::get,
    Router,
};
use serde::Deserialize;
use tower_http::services::ServeDir;

use crate::pipeline::{PipelineOutcome, RequestPipeline};
use crate::web::page::render_page;

#[derive(Debug, Deserialize)]
pub struct TopicForm {
    #[serde(default)]
    pub topic: String,
}

/// Build the application router around a shared pipeline.
pub fn router(pipeline: Arc<RequestPipeline>, static_dir: &Path) -> Router {
    Router::new()
        .route("/", get(index).post(explain))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(pipeline)
}

async fn index() -> Html<String> {
    Html(render_page("", &PipelineOutcome::empty()))
}

async fn explain(
    State(pipeline): State<Arc<RequestPipeline>>,
    Form(form): Form<TopicForm>,
) -> Html<String> {
    let outcome = pipeline.handle(&form.topic).await;
    Html(render_page(form.topic.trim(), &outcome))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
