//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout, drawn from the session projection
//! - `input`: keyboard event handling
//! - `styles`: colors and text styling

pub mod input;
pub mod render;
pub mod styles;
