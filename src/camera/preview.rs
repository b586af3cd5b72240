use super::still::exposure_args;
use crate::config::{CameraConfig, Rotation};
use crate::error::CameraError;
use crate::exposure::ExposureSetting;
use crate::overlay::Bitmap;
use parking_lot::Mutex;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const SOI: [u8; 2] = [0xFF, 0xD8];
const EOI: [u8; 2] = [0xFF, 0xD9];
/// Partial frames larger than this are discarded
const MAX_PENDING_BYTES: usize = 8 * 1024 * 1024;
const READ_CHUNK: usize = 64 * 1024;

/// Splits a concatenated MJPEG byte stream into individual JPEG frames
#[derive(Debug, Default)]
pub struct MjpegSplitter {
    buffer: Vec<u8>,
}

impl MjpegSplitter {
    /// Feed bytes read from the stream; returns every frame completed by them
    pub fn push(&mut self, data: &[u8]) -> Vec<Vec<u8>> {
        self.buffer.extend_from_slice(data);
        let mut frames = Vec::new();

        loop {
            let Some(start) = find_marker(&self.buffer, 0, SOI) else {
                // A marker may straddle two reads
                let keep = usize::from(self.buffer.last() == Some(&0xFF));
                self.buffer.drain(..self.buffer.len() - keep);
                break;
            };

            let Some(end) = find_marker(&self.buffer, start + 2, EOI) else {
                self.buffer.drain(..start);
                if self.buffer.len() > MAX_PENDING_BYTES {
                    warn!("Preview frame exceeded {} bytes, dropping it", MAX_PENDING_BYTES);
                    self.buffer.clear();
                }
                break;
            };

            frames.push(self.buffer[start..end + 2].to_vec());
            self.buffer.drain(..end + 2);
        }

        frames
    }
}

fn find_marker(buffer: &[u8], from: usize, marker: [u8; 2]) -> Option<usize> {
    buffer
        .get(from..)?
        .windows(2)
        .position(|window| window == marker)
        .map(|offset| offset + from)
}

#[derive(Debug, Clone)]
struct PreviewFrame {
    sequence: u64,
    jpeg: Arc<Vec<u8>>,
}

/// Live preview from an rpicam-vid compatible command streaming MJPEG on stdout
///
/// The still command needs the sensor to itself, so the stream is stopped for the
/// duration of each capture and started again afterwards.
pub struct PreviewStream {
    program: String,
    leading_args: Vec<String>,
    resolution: (u32, u32),
    framerate: u32,
    gain: f32,
    rotation: Option<Rotation>,
    child: Option<Child>,
    reader: Option<JoinHandle<()>>,
    latest: Arc<Mutex<Option<PreviewFrame>>>,
    last_taken: u64,
}

impl PreviewStream {
    pub fn new(config: &CameraConfig) -> Self {
        let mut parts = config.preview_command.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_else(|| "rpicam-vid".to_string());

        Self {
            program,
            leading_args: parts.collect(),
            resolution: config.preview_resolution,
            framerate: config.preview_framerate,
            gain: config.gain,
            rotation: config.rotation,
            child: None,
            reader: None,
            latest: Arc::new(Mutex::new(None)),
            last_taken: 0,
        }
    }

    /// Arguments for a stream using `exposure`
    pub fn preview_args(&self, exposure: Option<ExposureSetting>) -> Vec<String> {
        let mut args = self.leading_args.clone();
        args.extend([
            "-t".to_string(),
            "0".to_string(),
            "--nopreview".to_string(),
            "--codec".to_string(),
            "mjpeg".to_string(),
            "--width".to_string(),
            self.resolution.0.to_string(),
            "--height".to_string(),
            self.resolution.1.to_string(),
            "--framerate".to_string(),
            self.framerate.to_string(),
            "--gain".to_string(),
            format!("{:.2}", self.gain),
        ]);

        if let Some(rotation) = self.rotation {
            args.push("--rotation".to_string());
            args.push(rotation.degrees().to_string());
        }

        args.extend(exposure_args(exposure));
        args.push("-o".to_string());
        args.push("-".to_string());
        args
    }

    pub fn is_running(&self) -> bool {
        self.child.is_some()
    }

    /// Launch the stream; a running stream is left alone
    pub fn start(&mut self, exposure: Option<ExposureSetting>) -> Result<(), CameraError> {
        if self.child.is_some() {
            return Ok(());
        }

        let args = self.preview_args(exposure);
        debug!("Running {} {}", self.program, args.join(" "));

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CameraError::Launch {
                command: self.program.clone(),
                source,
            })?;

        if let Some(stdout) = child.stdout.take() {
            self.reader = Some(tokio::spawn(read_frames(stdout, Arc::clone(&self.latest))));
        }
        self.child = Some(child);

        info!(
            "Preview started at {}x{} {} fps",
            self.resolution.0, self.resolution.1, self.framerate
        );
        Ok(())
    }

    /// Stop the stream and wait for the command to exit
    pub async fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                warn!("Failed to stop preview command: {}", e);
            }
            debug!("Preview stopped");
        }

        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }

    /// Newest JPEG frame not handed out before
    pub fn take_jpeg(&mut self) -> Option<Arc<Vec<u8>>> {
        let frame = self.latest.lock().clone()?;
        if frame.sequence == self.last_taken {
            return None;
        }
        self.last_taken = frame.sequence;
        Some(frame.jpeg)
    }

    /// Newest frame decoded at the preview resolution
    pub fn take_frame(&mut self) -> Option<Bitmap> {
        let jpeg = self.take_jpeg()?;
        decode_frame(&jpeg, self.resolution)
    }
}

async fn read_frames(mut stdout: ChildStdout, latest: Arc<Mutex<Option<PreviewFrame>>>) {
    let mut splitter = MjpegSplitter::default();
    let mut chunk = vec![0u8; READ_CHUNK];
    let mut sequence = 0u64;

    loop {
        match stdout.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                if let Some(jpeg) = splitter.push(&chunk[..n]).pop() {
                    sequence += 1;
                    *latest.lock() = Some(PreviewFrame {
                        sequence,
                        jpeg: Arc::new(jpeg),
                    });
                }
            }
            Err(e) => {
                warn!("Preview stream read failed: {}", e);
                break;
            }
        }
    }

    debug!("Preview stream ended after {} frames", sequence);
}

#[cfg(feature = "imaging")]
fn decode_frame(jpeg: &[u8], size: (u32, u32)) -> Option<Bitmap> {
    use image::imageops::FilterType;
    use image::ImageFormat;

    let decoded = match image::load_from_memory_with_format(jpeg, ImageFormat::Jpeg) {
        Ok(img) => img,
        Err(e) => {
            debug!("Dropping undecodable preview frame: {}", e);
            return None;
        }
    };

    let rgba = if (decoded.width(), decoded.height()) == size {
        decoded.to_rgba8()
    } else {
        decoded.resize_exact(size.0, size.1, FilterType::Triangle).to_rgba8()
    };

    Bitmap::from_rgba(size.0, size.1, rgba.into_raw()).ok()
}

#[cfg(not(feature = "imaging"))]
fn decode_frame(_jpeg: &[u8], _size: (u32, u32)) -> Option<Bitmap> {
    None
}
