//! Trait definitions for Radarly operations.
//!
//! Each entity type implements the traits it supports, encapsulating
//! endpoint differences in the implementations.

mod fetch;
mod find;
mod search;
mod update;

pub use fetch::Fetch;
pub use find::Find;
pub use search::{Search, SearchSource};
pub use update::Update;
