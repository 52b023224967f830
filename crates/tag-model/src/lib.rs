//! Tagreel Tag Model
//!
//! Defines the core data contracts for clip and montage export:
//! - **Events:** Tagged moments on a match video and the documents holding them
//! - **Filters:** The criteria that select which events to export
//! - **Clips:** Padded capture windows around each selected event
//! - **Encoding:** Container, MIME type, and bitrate of an export job
//!
//! All times are seconds from the start of the source video.

pub mod clip;
pub mod encoding;
pub mod event;
pub mod filter;

pub use clip::*;
pub use encoding::*;
pub use event::*;
pub use filter::*;
