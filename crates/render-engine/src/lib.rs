//! Tagreel Render Engine
//!
//! Turns tagged events into exported video: per-event clips recorded from
//! the playback surface, or a single montage composited on a canvas with
//! title cards, transitions and an end card.
//!
//! # Pipeline Architecture
//!
//! ```text
//! events ──▶ filter ──▶ plan_clips ──┐
//!                                    ├── seek ──▶ title card ──▶ live frames ──▶ fade
//! playback surface ──────────────────┘                    │
//!                                                         ▼
//!                                              canvas capture stream
//!                                                         │
//!                                                   ClipRecorder
//!                                                         │
//!                                             end card ──▶ finalizer ──▶ FileSink
//! ```

pub mod canvas;
pub mod clips;
pub mod compositor;
pub mod finalizer;
pub mod montage;
pub mod snapshot;

pub use canvas::RasterCanvas;
pub use clips::*;
pub use compositor::*;
pub use finalizer::*;
pub use montage::*;
pub use snapshot::*;
