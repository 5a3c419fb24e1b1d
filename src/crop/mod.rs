//! Cropping a captured frame into the fixed-size upload image.
//!
//! | Operation | Where |
//! |---|---|
//! | **Open** | [`CropSession::open`] mounts a surface via a [`CropEngine`] |
//! | **Adjust** | [`CropSession::adjust`] with a [`CropAction`] (move, zoom, rotate, flip, select) |
//! | **Finalize** | [`CropSession::finalize`] → `size`×`size` JPEG, Lanczos3 resampling |
//! | **Close** | [`CropSession::close`], or drop |
//!
//! The module is split into:
//! - **Calculations**: Pure selection geometry (unit testable)
//! - **Parameters**: Options, output shape, actions
//! - **Engine**: [`CropEngine`] / [`CropSurface`] traits + [`RustCropEngine`]
//! - **Session**: Lifecycle wrapper the state machine owns

pub mod calculations;
pub mod engine;
mod params;
pub mod rust_engine;
pub mod session;

pub use engine::{CropEngine, CropError, CropSurface};
pub use params::{CropAction, CropBox, CropOptions, DragMode, OutputSpec, Quality};
pub use rust_engine::RustCropEngine;
pub use session::CropSession;
