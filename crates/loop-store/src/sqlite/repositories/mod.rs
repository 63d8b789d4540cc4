//! Stateless repositories over the fact tables.

pub mod fact;
