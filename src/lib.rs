//! Topic Explainer: ask a language model to explain a topic, render the
//! answer as HTML and optionally read it aloud.
//!
//! Modules, leaf first:
//!
//! * [`config`]  : TOML settings and platform paths.
//! * [`llm`]     : prompt building, Gemini client, retry on rate limits.
//! * [`text`]    : markdown → HTML and speech sanitizing.
//! * [`tts`]     : speech engine abstraction and `espeak-ng` backend.
//! * [`pipeline`]: per-request orchestration.
//! * [`web`]     : axum routes and the HTML page.

pub mod config;
pub mod llm;
pub mod pipeline;
pub mod text;
pub mod tts;
pub mod web;
