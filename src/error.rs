use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShuttercamError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorError),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Display error: {0}")]
    Display(#[from] DisplayError),

    #[error("Calibration error: {0}")]
    Calibration(#[from] CalibrationError),

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

impl ShuttercamError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<S: Into<String>>(component: S, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Failures on the GPIO-facing side of the trigger and photocell
#[derive(Error, Debug)]
pub enum SensorError {
    #[error("GPIO {pin} access failed: {details}")]
    Gpio { pin: u32, details: String },

    #[error("GPIO {pin} reported unexpected value '{value}'")]
    InvalidLevel { pin: u32, value: String },

    #[error("Photocell on GPIO {pin} stayed low for {waited:?}")]
    Stalled { pin: u32, waited: Duration },

    #[error("Photocell sampling worker disconnected")]
    WorkerDisconnected,

    #[error("Failed to spawn photocell sampling worker: {details}")]
    WorkerSpawn { details: String },
}

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to launch capture command '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Capture command exited with {status}: {stderr}")]
    CommandFailed { status: String, stderr: String },

    #[error("Capture output missing at {path}")]
    MissingOutput { path: String },

    #[error("Post-processing failed for {path}: {details}")]
    PostProcess { path: String, details: String },
}

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("Framebuffer error: {details}")]
    Framebuffer { details: String },

    #[error("Format conversion error: {details}")]
    FormatConversion { details: String },

    #[error("Font error: {details}")]
    Font { details: String },
}

#[derive(Error, Debug)]
pub enum CalibrationError {
    #[error("Failed to read calibration asset {path}: {details}")]
    Read { path: String, details: String },

    #[error("Calibration entry {width}x{height} has {actual} grid points, expected {expected}")]
    GridSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Duplicate calibration entry for {width}x{height}")]
    Duplicate { width: u32, height: u32 },
}

pub type Result<T> = std::result::Result<T, ShuttercamError>;
