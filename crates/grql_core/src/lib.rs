//! Core utilities for grql.
//!
//! This crate provides foundational types used throughout grql:
//! - `location`: Source location tracking
//! - `path`: Result-tree paths for error reporting
//! - `naming`: snake/camel name-convention normalization

pub mod location;
pub mod naming;
pub mod path;

pub use location::Location;
pub use naming::{to_camel_case, to_snake_case};
pub use path::PathSegment;
