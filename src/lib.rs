//! # fen-capture
//!
//! Photograph a chessboard, crop it to a square, send it to a recognition
//! service and show the position it returns as FEN.
//!
//! # Architecture: One Machine, Three Resources
//!
//! The heart of the crate is [`machine::CaptureMachine`], a synchronous state
//! machine that owns everything scarce in the flow:
//!
//! ```text
//! Idle → CameraOpen → ImageCaptured → Submitting → Completed
//!            │              │              │
//!       camera session  crop session  submission in flight
//! ```
//!
//! At most one of those resources is alive at any moment. Every state change
//! goes through a single step that tears down what the next state does not
//! own, so error paths, retakes and shutdown cannot leak a running camera or
//! a mounted crop surface.
//!
//! The machine never awaits. Work that has to wait is returned as an
//! [`machine::Effect`]; [`driver`] runs those effects on tokio and feeds the
//! results back as epoch-tagged events, which is how late results from an
//! abandoned attempt get recognized and dropped.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`machine`] | Capture lifecycle: states, intents, effects, epochs |
//! | [`driver`] | Event loop executing effects and publishing snapshots |
//! | [`camera`] | Camera device trait, session acquire/release, frame capture |
//! | [`crop`] | Crop engine traits, selection geometry, finalize to 512×512 JPEG |
//! | [`submit`] | Prediction service trait, multipart HTTP client, response classification |
//! | [`error`] | Failure taxonomy shown to the user |
//! | [`types`] | Frames, normalized images, FEN results |
//! | [`config`] | `config.toml` loading, stock defaults, merging and validation |
//! | [`output`] | CLI rendering of states, boards and notifications |
//!
//! # Design Decisions
//!
//! ## Effects Instead of Callbacks
//!
//! Camera acquisition and submission complete asynchronously. Rather than
//! letting their callbacks mutate state, the machine hands out an effect
//! tagged with its current epoch and only accepts a completion carrying the
//! same epoch. A reply that arrives after the user retook, cancelled or left
//! is discarded; a camera session that arrives late is released on the spot.
//!
//! ## Narrow Capability Traits
//!
//! The camera ([`camera::CameraDevice`]), crop widget ([`crop::CropEngine`])
//! and recognition service ([`submit::PredictionService`]) are traits. The
//! CLI plugs in a file-backed camera, the pure-Rust crop engine and the HTTP
//! client; tests plug in recording mocks.
//!
//! ## No Retry
//!
//! A failed submission goes to the error view; the user decides whether to
//! start over. The client makes exactly one request per submission.

pub mod camera;
pub mod config;
pub mod crop;
pub mod driver;
pub mod error;
pub mod machine;
pub mod output;
pub mod submit;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
