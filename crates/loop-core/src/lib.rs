//! # loop-core
//!
//! Foundation types shared by every agenda-loop crate.
//!
//! - **Captures**: [`Capture`] and the [`CaptureId`] newtype for upstream input
//! - **Facts**: [`ContextFact`] candidates, their [`Category`] tag and [`FactIdentity`]
//! - **Errors**: [`ValidationError`] for candidate fields that fail coercion
//! - **Timestamps**: fixed-width RFC 3339 codec used by the store ([`time`])
//! - **Logging**: [`logging::init_subscriber`] for the `tracing` stderr subscriber

#![deny(unsafe_code)]

pub mod capture;
pub mod category;
pub mod errors;
pub mod fact;
pub mod logging;
pub mod time;

pub use capture::{Capture, CaptureId};
pub use category::Category;
pub use errors::ValidationError;
pub use fact::{ContextFact, FactIdentity};
