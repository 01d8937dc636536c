//! Data models for the slide library.
//!
//! These models match the JSON documents kept in the drive and the taskpane's request bodies.

mod account;
mod slide;
mod tag;

pub use account::*;
pub use slide::*;
pub use tag::*;
