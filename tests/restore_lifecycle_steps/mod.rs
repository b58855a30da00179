//! Step definitions for restore lifecycle scenarios.

pub mod world;

mod given;
mod then;
mod when;
