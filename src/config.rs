use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ShuttercamConfig {
    pub camera: CameraConfig,
    pub trigger: TriggerConfig,
    pub photocell: PhotocellConfig,
    pub exposure: ExposureConfig,
    pub overlay: OverlayConfig,
    pub storage: StorageConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CameraConfig {
    /// Resolution of saved photos (width, height)
    #[serde(default = "default_photo_resolution")]
    pub photo_resolution: (u32, u32),

    /// Resolution of the live preview and overlay surfaces
    #[serde(default = "default_preview_resolution")]
    pub preview_resolution: (u32, u32),

    /// JPEG quality for saved photos (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Analog gain passed to the still command (1.5 ~ ISO 150)
    #[serde(default = "default_gain")]
    pub gain: f32,

    /// Still capture command (rpicam-still compatible arguments)
    #[serde(default = "default_still_command")]
    pub still_command: String,

    /// Run the live preview stream underneath the overlays
    #[serde(default = "default_preview_enabled")]
    pub preview_enabled: bool,

    /// Preview stream command (rpicam-vid compatible arguments, MJPEG on stdout)
    #[serde(default = "default_preview_command")]
    pub preview_command: String,

    /// Preview frame rate
    #[serde(default = "default_preview_framerate")]
    pub preview_framerate: u32,

    /// Fisheye remap table produced by the offline calibration tool
    #[serde(default = "default_calibration_path")]
    pub calibration_path: Option<String>,

    /// Rotation applied to saved photos
    #[serde(default = "default_photo_rotation")]
    pub rotation: Option<Rotation>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TriggerConfig {
    /// BCM pin number of the shutter button
    #[serde(default = "default_trigger_pin")]
    pub pin: u32,

    /// Button pulls the line low when pressed
    #[serde(default = "default_active_low")]
    pub active_low: bool,

    /// Minimum spacing between reported edges in milliseconds
    #[serde(default = "default_bounce_ms")]
    pub bounce_ms: u64,

    /// Minimum spacing between completed triggers in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Hold time that turns a press into a long press, in milliseconds
    #[serde(default = "default_long_press_ms")]
    pub long_press_ms: u64,

    /// What a long press does
    #[serde(default = "default_long_press_action")]
    pub long_press_action: LongPressAction,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PhotocellConfig {
    /// BCM pin number of the RC discharge/sense line
    #[serde(default = "default_photocell_pin")]
    pub pin: u32,

    /// Sampling strategy
    #[serde(default = "default_sampler_kind")]
    pub sampler: SamplerKind,

    /// Smoothing strategy
    #[serde(default = "default_filter_kind")]
    pub filter: FilterKind,

    /// Unit reported by the polled sampler
    #[serde(default = "default_reading_unit")]
    pub reading_unit: ReadingUnit,

    /// Time the line is held low to discharge the capacitor, in milliseconds
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Maximum time a discharge cycle may wait for the line to rise, in milliseconds
    #[serde(default = "default_stall_timeout_ms")]
    pub stall_timeout_ms: u64,

    /// Token queue capacity between the counting worker and the main loop
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Readings averaged by the mean filter
    #[serde(default = "default_mean_window")]
    pub mean_window: usize,

    /// Raw readings retained by the median filter
    #[serde(default = "default_median_history")]
    pub median_history: usize,

    /// Length of the median window (odd)
    #[serde(default = "default_median_window")]
    pub median_window: usize,

    /// Readings required before the median filter reports a value
    #[serde(default = "default_median_min_samples")]
    pub median_min_samples: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ExposureConfig {
    /// Mapping from filtered reading to camera parameter
    #[serde(default = "default_exposure_policy")]
    pub policy: ExposurePolicyKind,

    /// Reading mapped to the fastest shutter speed
    #[serde(default = "default_min_reading")]
    pub min_reading: f64,

    /// Reading mapped to the slowest shutter speed
    #[serde(default = "default_max_reading")]
    pub max_reading: f64,

    /// Fastest shutter speed in microseconds
    #[serde(default = "default_min_shutter_us")]
    pub min_shutter_us: u32,

    /// Shutter speed range above the fastest speed, in microseconds
    #[serde(default = "default_shutter_span_us")]
    pub shutter_span_us: u32,

    /// Reading delta from the baseline that saturates compensation
    #[serde(default = "default_compensation_span")]
    pub compensation_span: f64,

    /// Output scale of the compensation mapping
    #[serde(default = "default_compensation_scale")]
    pub compensation_scale: CompensationScale,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct OverlayConfig {
    /// Push overlays to the framebuffer (false runs headless)
    #[serde(default = "default_overlay_enabled")]
    pub enabled: bool,

    /// Framebuffer device path
    #[serde(default = "default_framebuffer_device")]
    pub framebuffer_device: String,

    /// Minimum interval between status overlay replacements in milliseconds
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    /// How long the focus/recalibration indicator stays up, in milliseconds
    #[serde(default = "default_indicator_flash_ms")]
    pub indicator_flash_ms: u64,

    /// How long a captured photo stays on screen for review, in milliseconds (0 disables)
    #[serde(default = "default_review_ms")]
    pub review_ms: u64,

    /// Path to TrueType font used for status text
    #[serde(default = "default_font_path")]
    pub font_path: String,

    /// Font size for status text
    #[serde(default = "default_font_size")]
    pub font_size: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StorageConfig {
    /// Directory holding captured photos and the log file
    #[serde(default = "default_photo_dir")]
    pub photo_dir: String,

    /// Fixed photo filename prefix
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Fixed photo filename extension (without dot)
    #[serde(default = "default_file_extension")]
    pub file_extension: String,

    /// Log file name inside the photo directory
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SystemConfig {
    /// Control tick interval in milliseconds
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Stop on any key press in the controlling terminal
    #[serde(default = "default_keyboard_exit")]
    pub keyboard_exit: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Rotation {
    pub fn degrees(&self) -> u32 {
        match self {
            Rotation::Rotate90 => 90,
            Rotation::Rotate180 => 180,
            Rotation::Rotate270 => 270,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LongPressAction {
    /// Long press recalibrates the photocell baseline
    Recalibrate,
    /// Long press is treated like any other press
    Ignore,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SamplerKind {
    Polled,
    Threaded,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Median,
    Mean,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReadingUnit {
    Milliseconds,
    Seconds,
}

impl ReadingUnit {
    pub fn from_duration(&self, elapsed: Duration) -> f64 {
        match self {
            ReadingUnit::Milliseconds => elapsed.as_secs_f64() * 1000.0,
            ReadingUnit::Seconds => elapsed.as_secs_f64(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExposurePolicyKind {
    ShutterSpeed,
    Compensation,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompensationScale {
    /// round(delta * 25), range -25..=25
    Symmetric,
    /// round(delta * 50) - 25, range -75..=25
    Offset,
}

impl ShuttercamConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("shuttercam.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default(
                "camera.photo_resolution",
                vec![default_photo_resolution().0, default_photo_resolution().1],
            )?
            .set_default(
                "camera.preview_resolution",
                vec![
                    default_preview_resolution().0,
                    default_preview_resolution().1,
                ],
            )?
            .set_default("camera.jpeg_quality", default_jpeg_quality() as i64)?
            .set_default("camera.gain", default_gain() as f64)?
            .set_default("camera.still_command", default_still_command())?
            .set_default("camera.preview_enabled", default_preview_enabled())?
            .set_default("camera.preview_command", default_preview_command())?
            .set_default(
                "camera.preview_framerate",
                default_preview_framerate() as i64,
            )?
            .set_default("camera.calibration_path", "remap.json")?
            .set_default("camera.rotation", "Rotate180")?
            .set_default("trigger.pin", default_trigger_pin())?
            .set_default("trigger.active_low", default_active_low())?
            .set_default("trigger.bounce_ms", default_bounce_ms() as i64)?
            .set_default("trigger.debounce_ms", default_debounce_ms() as i64)?
            .set_default("trigger.long_press_ms", default_long_press_ms() as i64)?
            .set_default("trigger.long_press_action", "recalibrate")?
            .set_default("photocell.pin", default_photocell_pin())?
            .set_default("photocell.sampler", "polled")?
            .set_default("photocell.filter", "median")?
            .set_default("photocell.reading_unit", "milliseconds")?
            .set_default("photocell.settle_ms", default_settle_ms() as i64)?
            .set_default(
                "photocell.stall_timeout_ms",
                default_stall_timeout_ms() as i64,
            )?
            .set_default(
                "photocell.queue_capacity",
                default_queue_capacity() as i64,
            )?
            .set_default("photocell.mean_window", default_mean_window() as i64)?
            .set_default(
                "photocell.median_history",
                default_median_history() as i64,
            )?
            .set_default("photocell.median_window", default_median_window() as i64)?
            .set_default(
                "photocell.median_min_samples",
                default_median_min_samples() as i64,
            )?
            .set_default("exposure.policy", "shutter_speed")?
            .set_default("exposure.min_reading", default_min_reading())?
            .set_default("exposure.max_reading", default_max_reading())?
            .set_default("exposure.min_shutter_us", default_min_shutter_us())?
            .set_default("exposure.shutter_span_us", default_shutter_span_us())?
            .set_default("exposure.compensation_span", default_compensation_span())?
            .set_default("exposure.compensation_scale", "symmetric")?
            .set_default("overlay.enabled", default_overlay_enabled())?
            .set_default("overlay.framebuffer_device", default_framebuffer_device())?
            .set_default("overlay.min_interval_ms", default_min_interval_ms() as i64)?
            .set_default(
                "overlay.indicator_flash_ms",
                default_indicator_flash_ms() as i64,
            )?
            .set_default("overlay.review_ms", default_review_ms() as i64)?
            .set_default("overlay.font_path", default_font_path())?
            .set_default("overlay.font_size", default_font_size() as f64)?
            .set_default("storage.photo_dir", default_photo_dir())?
            .set_default("storage.file_prefix", default_file_prefix())?
            .set_default("storage.file_extension", default_file_extension())?
            .set_default("storage.log_file", default_log_file())?
            .set_default("system.tick_ms", default_tick_ms() as i64)?
            .set_default("system.keyboard_exit", default_keyboard_exit())?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // Add environment variables with SHUTTERCAM_ prefix
            .add_source(
                Environment::with_prefix("SHUTTERCAM")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: ShuttercamConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (pw, ph) = self.camera.photo_resolution;
        let (vw, vh) = self.camera.preview_resolution;
        if pw == 0 || ph == 0 || vw == 0 || vh == 0 {
            return Err(ConfigError::Message(
                "Camera resolutions must be greater than 0".to_string(),
            ));
        }

        if self.camera.jpeg_quality == 0 || self.camera.jpeg_quality > 100 {
            return Err(ConfigError::Message(
                "JPEG quality must be between 1 and 100".to_string(),
            ));
        }

        if self.camera.preview_enabled && self.camera.preview_framerate == 0 {
            return Err(ConfigError::Message(
                "Preview framerate must be greater than 0".to_string(),
            ));
        }

        if self.system.tick_ms == 0 {
            return Err(ConfigError::Message(
                "Tick interval must be greater than 0".to_string(),
            ));
        }

        if self.exposure.min_reading >= self.exposure.max_reading {
            return Err(ConfigError::Message(
                "Exposure min_reading must be below max_reading".to_string(),
            ));
        }

        if self.exposure.compensation_span <= 0.0 {
            return Err(ConfigError::Message(
                "Exposure compensation_span must be positive".to_string(),
            ));
        }

        let photocell = &self.photocell;
        if photocell.median_window == 0 || photocell.median_window % 2 == 0 {
            return Err(ConfigError::Message(
                "Median window must be odd and greater than 0".to_string(),
            ));
        }

        if photocell.median_history < photocell.median_window {
            return Err(ConfigError::Message(
                "Median history must hold at least one full window".to_string(),
            ));
        }

        if photocell.median_min_samples < 2 || photocell.median_min_samples > photocell.median_history
        {
            return Err(ConfigError::Message(
                "Median min_samples must be between 2 and median_history".to_string(),
            ));
        }

        if photocell.mean_window == 0 {
            return Err(ConfigError::Message(
                "Mean window must be greater than 0".to_string(),
            ));
        }

        if photocell.queue_capacity == 0 {
            return Err(ConfigError::Message(
                "Photocell queue capacity must be greater than 0".to_string(),
            ));
        }

        if photocell.stall_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "Photocell stall timeout must be greater than 0".to_string(),
            ));
        }

        if self.overlay.min_interval_ms == 0 {
            return Err(ConfigError::Message(
                "Overlay min_interval_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Control tick interval
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.system.tick_ms)
    }
}

impl Default for ShuttercamConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            trigger: TriggerConfig::default(),
            photocell: PhotocellConfig::default(),
            exposure: ExposureConfig::default(),
            overlay: OverlayConfig::default(),
            storage: StorageConfig::default(),
            system: SystemConfig::default(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            photo_resolution: default_photo_resolution(),
            preview_resolution: default_preview_resolution(),
            jpeg_quality: default_jpeg_quality(),
            gain: default_gain(),
            still_command: default_still_command(),
            preview_enabled: default_preview_enabled(),
            preview_command: default_preview_command(),
            preview_framerate: default_preview_framerate(),
            calibration_path: default_calibration_path(),
            rotation: default_photo_rotation(),
        }
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            pin: default_trigger_pin(),
            active_low: default_active_low(),
            bounce_ms: default_bounce_ms(),
            debounce_ms: default_debounce_ms(),
            long_press_ms: default_long_press_ms(),
            long_press_action: default_long_press_action(),
        }
    }
}

impl Default for PhotocellConfig {
    fn default() -> Self {
        Self {
            pin: default_photocell_pin(),
            sampler: default_sampler_kind(),
            filter: default_filter_kind(),
            reading_unit: default_reading_unit(),
            settle_ms: default_settle_ms(),
            stall_timeout_ms: default_stall_timeout_ms(),
            queue_capacity: default_queue_capacity(),
            mean_window: default_mean_window(),
            median_history: default_median_history(),
            median_window: default_median_window(),
            median_min_samples: default_median_min_samples(),
        }
    }
}

impl Default for ExposureConfig {
    fn default() -> Self {
        Self {
            policy: default_exposure_policy(),
            min_reading: default_min_reading(),
            max_reading: default_max_reading(),
            min_shutter_us: default_min_shutter_us(),
            shutter_span_us: default_shutter_span_us(),
            compensation_span: default_compensation_span(),
            compensation_scale: default_compensation_scale(),
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            enabled: default_overlay_enabled(),
            framebuffer_device: default_framebuffer_device(),
            min_interval_ms: default_min_interval_ms(),
            indicator_flash_ms: default_indicator_flash_ms(),
            review_ms: default_review_ms(),
            font_path: default_font_path(),
            font_size: default_font_size(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            photo_dir: default_photo_dir(),
            file_prefix: default_file_prefix(),
            file_extension: default_file_extension(),
            log_file: default_log_file(),
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            keyboard_exit: default_keyboard_exit(),
        }
    }
}

// Default value functions
fn default_photo_resolution() -> (u32, u32) {
    (3264, 2448)
}
fn default_preview_resolution() -> (u32, u32) {
    (640, 480)
}
fn default_jpeg_quality() -> u8 {
    90
}
fn default_gain() -> f32 {
    1.5
}
fn default_still_command() -> String {
    "rpicam-still".to_string()
}
fn default_preview_enabled() -> bool {
    true
}
fn default_preview_command() -> String {
    "rpicam-vid".to_string()
}
fn default_preview_framerate() -> u32 {
    24
}
fn default_calibration_path() -> Option<String> {
    Some("remap.json".to_string())
}
fn default_photo_rotation() -> Option<Rotation> {
    Some(Rotation::Rotate180)
}

fn default_trigger_pin() -> u32 {
    25
}
fn default_active_low() -> bool {
    true
}
fn default_bounce_ms() -> u64 {
    100
}
fn default_debounce_ms() -> u64 {
    200
}
fn default_long_press_ms() -> u64 {
    2000
}
fn default_long_press_action() -> LongPressAction {
    LongPressAction::Recalibrate
}

fn default_photocell_pin() -> u32 {
    18
}
fn default_sampler_kind() -> SamplerKind {
    SamplerKind::Polled
}
fn default_filter_kind() -> FilterKind {
    FilterKind::Median
}
fn default_reading_unit() -> ReadingUnit {
    ReadingUnit::Milliseconds
}
fn default_settle_ms() -> u64 {
    100
}
fn default_stall_timeout_ms() -> u64 {
    10_000
}
fn default_queue_capacity() -> usize {
    1024
}
fn default_mean_window() -> usize {
    3
}
fn default_median_history() -> usize {
    11
}
fn default_median_window() -> usize {
    5
}
fn default_median_min_samples() -> usize {
    6
}

fn default_exposure_policy() -> ExposurePolicyKind {
    ExposurePolicyKind::ShutterSpeed
}
fn default_min_reading() -> f64 {
    20.0
}
fn default_max_reading() -> f64 {
    300.0
}
fn default_min_shutter_us() -> u32 {
    2000
}
fn default_shutter_span_us() -> u32 {
    1_250_000
}
fn default_compensation_span() -> f64 {
    0.025
}
fn default_compensation_scale() -> CompensationScale {
    CompensationScale::Symmetric
}

fn default_overlay_enabled() -> bool {
    true
}
fn default_framebuffer_device() -> String {
    "/dev/fb0".to_string()
}
fn default_min_interval_ms() -> u64 {
    3000
}
fn default_indicator_flash_ms() -> u64 {
    250
}
fn default_review_ms() -> u64 {
    2500
}
fn default_font_path() -> String {
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono-Bold.ttf".to_string()
}
fn default_font_size() -> f32 {
    24.0
}

fn default_photo_dir() -> String {
    "/media/sd-sda1/photos".to_string()
}
fn default_file_prefix() -> String {
    "IMG_".to_string()
}
fn default_file_extension() -> String {
    "JPG".to_string()
}
fn default_log_file() -> String {
    "cam.log".to_string()
}

fn default_tick_ms() -> u64 {
    41
} // ~24 fps preview refresh
fn default_keyboard_exit() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ShuttercamConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.trigger.pin, 25);
        assert_eq!(config.photocell.pin, 18);
        assert_eq!(config.camera.rotation, Some(Rotation::Rotate180));
        assert_eq!(config.tick_interval(), Duration::from_millis(41));
        assert!(config.camera.preview_enabled);
        assert_eq!(config.camera.preview_framerate, 24);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = ShuttercamConfig::load_from_file("/nonexistent/shuttercam.toml").unwrap();
        assert_eq!(config, ShuttercamConfig::default());
    }

    #[test]
    fn test_load_overrides_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[photocell]
sampler = "threaded"
filter = "mean"
reading_unit = "seconds"

[exposure]
policy = "compensation"
compensation_scale = "offset"

[trigger]
long_press_action = "ignore"
"#
        )
        .unwrap();

        let config = ShuttercamConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.photocell.sampler, SamplerKind::Threaded);
        assert_eq!(config.photocell.filter, FilterKind::Mean);
        assert_eq!(config.photocell.reading_unit, ReadingUnit::Seconds);
        assert_eq!(config.exposure.policy, ExposurePolicyKind::Compensation);
        assert_eq!(config.exposure.compensation_scale, CompensationScale::Offset);
        assert_eq!(config.trigger.long_press_action, LongPressAction::Ignore);
        // Untouched sections keep their defaults
        assert_eq!(config.storage.file_prefix, "IMG_");
    }

    #[test]
    fn test_config_validation() {
        let mut config = ShuttercamConfig::default();

        config.exposure.min_reading = 300.0;
        assert!(config.validate().is_err());
        config.exposure.min_reading = 20.0;

        config.photocell.median_window = 4;
        assert!(config.validate().is_err());
        config.photocell.median_window = 5;

        config.photocell.median_history = 3;
        assert!(config.validate().is_err());
        config.photocell.median_history = 11;

        config.camera.preview_resolution = (0, 480);
        assert!(config.validate().is_err());
        config.camera.preview_resolution = (640, 480);

        config.camera.preview_framerate = 0;
        assert!(config.validate().is_err());
        config.camera.preview_enabled = false;
        assert!(config.validate().is_ok());
        config.camera.preview_framerate = 24;
        config.camera.preview_enabled = true;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_reading_unit_conversion() {
        let elapsed = Duration::from_millis(160);
        assert!((ReadingUnit::Milliseconds.from_duration(elapsed) - 160.0).abs() < 1e-9);
        assert!((ReadingUnit::Seconds.from_duration(elapsed) - 0.16).abs() < 1e-9);
    }

    #[test]
    fn test_default_config_serializes_to_toml() {
        let rendered = toml::to_string_pretty(&ShuttercamConfig::default()).unwrap();
        assert!(rendered.contains("[photocell]"));
        assert!(rendered.contains("sampler = \"polled\""));
    }
}
