//! # agenda-loop
//!
//! Capture-to-agenda pipeline. Wires the extraction adapter to the temporal
//! store and exposes the agenda views.
//!
//! - **Pipeline**: [`Pipeline::ingest`] extracts facts from a capture and
//!   versions them into the store at one shared timestamp
//! - **Errors**: [`LoopError`] folds every crate error into the four kinds a
//!   caller branches on (validation, transport, malformed response, storage)
//! - **Logging**: [`init_logging`] installs the stderr subscriber from settings

#![deny(unsafe_code)]

pub mod errors;
pub mod pipeline;

pub use errors::{LoopError, Result};
pub use pipeline::{Pipeline, init_logging};

pub use loop_core::{Capture, CaptureId, Category, ContextFact, FactIdentity, ValidationError};
pub use loop_extract::{ExtractError, FactExtractor, GeminiConfig, GeminiExtractor};
pub use loop_settings::LoopSettings;
pub use loop_store::{AgendaResolver, ContextFactRecord, ContextFactStore, FactView, StoreError};
