//! # loop-extract
//!
//! Boundary with the external fact-producing service.
//!
//! - [`FactExtractor`] is the contract the rest of the loop depends on
//! - [`GeminiExtractor`] implements it against the Gemini `generateContent`
//!   REST endpoint
//! - [`prompt`] renders the instruction and capture text
//! - [`response`] unwraps the response envelope and the inner fact JSON

#![deny(unsafe_code)]

pub mod errors;
pub mod extractor;
pub mod gemini;
pub mod prompt;
pub mod response;

pub use errors::{ExtractError, Result};
pub use extractor::FactExtractor;
pub use gemini::{GeminiConfig, GeminiExtractor};
