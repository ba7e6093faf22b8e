//! Data models module
//!
//! Defines provider-neutral generation types and the Gemini wire format

pub mod gemini;
pub mod generation;

pub use generation::{GenerationConfig, GenerationRequest, GenerationResult, MediaPart, Modality, Part};
