pub mod app;
pub mod camera;
pub mod config;
pub mod display;
pub mod error;
pub mod exposure;
pub mod gpio;
pub mod overlay;
pub mod photocell;
pub mod storage;
pub mod trigger;

pub use app::{Hardware, ShutdownHandle, ShutdownReason, ShuttercamApp, TickReport};
pub use camera::{CalibrationTable, Camera, CapturedPhoto, StillCommandCamera};
pub use config::ShuttercamConfig;
pub use display::{FramebufferSurface, HeadlessSurface, OverlaySlot, OverlaySurface};
pub use error::{Result, ShuttercamError};
pub use exposure::{Baseline, ExposureController, ExposureSetting};
pub use overlay::{OverlayThrottler, StatusRenderer};
pub use photocell::{MeanFilter, MedianFilter, PhotocellFilter, PhotocellSampler};
pub use storage::PhotoIndexAllocator;
pub use trigger::{TriggerDebouncer, TriggerOutcome};
