//! Escape sequences, colors and text formatting.

pub mod boxes;
pub mod color;
pub mod escape_codes;
pub mod links;
pub mod styling;
