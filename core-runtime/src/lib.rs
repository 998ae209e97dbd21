//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the audio sync core:
//! - Logging and tracing infrastructure
//! - Event bus system for progress and log delivery
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the scan and sync passes depend
//! on. It establishes the logging conventions and the event broadcasting
//! mechanism used to relay progress from worker threads to observers.

pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
pub use events::{CoreEvent, EventBus, ScanEvent, SyncEvent};
