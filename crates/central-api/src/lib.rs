//! central-api: Shared types for the instance console
//!
//! Contains instance input drafts, lifecycle outcome events and list
//! summaries shared between the core engine and the console binary.

pub mod events;
pub mod requests;
pub mod responses;
