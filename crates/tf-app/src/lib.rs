//! Texforge: generation job lifecycle and polling engine for a
//! ComfyUI-compatible diffusion backend.
//!
//! Submits texture-generation workflows, polls for the rendered result
//! on a bounded per-job schedule, persists fetched images under
//! deterministic names and hands them to a downstream consumer.

pub mod client;
pub mod complete;
pub mod config;
pub mod consumer;
pub mod engine;
pub mod error;
pub mod events;
pub mod session;
pub mod store;
pub mod submit;
pub mod workflow;
