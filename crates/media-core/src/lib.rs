//! Tagreel media core contracts.
//!
//! This crate contains the frame, stream, and surface contracts shared by
//! the capture and render crates without coupling them to a concrete
//! playback or encoding backend.

pub mod frame;
pub mod sink;
pub mod stream;
pub mod surface;

pub use frame::*;
pub use sink::*;
pub use stream::*;
pub use surface::*;
