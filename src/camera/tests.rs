use super::*;
use crate::config::{CameraConfig, Rotation};
use crate::error::{CalibrationError, CameraError};
use crate::exposure::ExposureSetting;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const FAKE_STILL: &str = r#"args_file="$1"
source_file="$2"
shift 2
echo "$@" > "$args_file"
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; fi
  shift
done
if [ "$source_file" != "-" ]; then
  cp "$source_file" "$out"
else
  printf 'not a jpeg' > "$out"
fi
"#;

/// Records its pid, then becomes a long-running stream that never writes a frame
const FAKE_PREVIEW: &str = r#"echo "preview $$" >> "$1"
exec sleep 30
"#;

/// Notes whether the last recorded preview process is still alive when it runs
const FAKE_STILL_CHECKING_PREVIEW: &str = r#"events="$1"
shift
pid=$(grep '^preview' "$events" | tail -n 1 | cut -d' ' -f2)
if [ -n "$pid" ] && kill -0 "$pid" 2>/dev/null; then
  echo "capture while preview running" >> "$events"
else
  echo "capture" >> "$events"
fi
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; fi
  shift
done
printf 'not a jpeg' > "$out"
"#;

fn identity_entry(width: u32, height: u32) -> CalibrationEntry {
    let mut map_x = Vec::new();
    let mut map_y = Vec::new();
    for y in 0..height {
        for x in 0..width {
            map_x.push(x as f32);
            map_y.push(y as f32);
        }
    }
    CalibrationEntry {
        width,
        height,
        map_x,
        map_y,
    }
}

/// Camera config running the fake still script through `sh`
///
/// The script records its arguments and copies `source` to the output path, or
/// writes a non-JPEG placeholder when there is no source.
fn fake_camera_config(dir: &Path, source: Option<&Path>) -> CameraConfig {
    let script = dir.join("fake_still.sh");
    fs::write(&script, FAKE_STILL).unwrap();
    let source = source.map_or_else(|| "-".to_string(), |p| p.display().to_string());

    CameraConfig {
        still_command: format!(
            "sh {} {} {}",
            script.display(),
            dir.join("args.txt").display(),
            source
        ),
        photo_resolution: (4, 2),
        preview_resolution: (2, 1),
        calibration_path: None,
        ..CameraConfig::default()
    }
}

fn recorded_args(dir: &Path) -> String {
    fs::read_to_string(dir.join("args.txt")).unwrap()
}

/// Wait until `path` holds at least `count` lines
async fn wait_for_lines(path: &Path, count: usize) -> Vec<String> {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let lines: Vec<String> = fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect();
        if lines.len() >= count || Instant::now() >= deadline {
            return lines;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[test]
fn test_identity_remap_preserves_image() {
    let entry = identity_entry(3, 2);
    let src: Vec<u8> = (0..18).collect();
    assert_eq!(entry.remap_rgb(&src), src);
}

#[test]
fn test_remap_interpolates_and_blacks_out_border() {
    let mut entry = identity_entry(2, 1);
    entry.map_x = vec![0.5, 5.0];
    entry.map_y = vec![0.0, 0.0];

    let src = vec![0, 0, 0, 200, 100, 50];
    let dst = entry.remap_rgb(&src);

    assert_eq!(&dst[0..3], &[100, 50, 25]);
    assert_eq!(&dst[3..6], &[0, 0, 0]);
}

#[test]
fn test_calibration_table_from_json() {
    let json = r#"{"entries":[{"width":2,"height":1,"map_x":[0.0,1.0],"map_y":[0.0,0.0]}]}"#;
    let table = CalibrationTable::from_json(json).unwrap();

    assert_eq!(table.resolutions(), vec![(2, 1)]);
    assert!(table.entry((2, 1)).is_some());
    assert!(table.entry((3264, 2448)).is_none());
}

#[test]
fn test_calibration_rejects_bad_grid() {
    let json = r#"{"entries":[{"width":2,"height":2,"map_x":[0.0,1.0],"map_y":[0.0,0.0,1.0,1.0]}]}"#;
    assert!(matches!(
        CalibrationTable::from_json(json),
        Err(CalibrationError::GridSize {
            expected: 4,
            actual: 2,
            ..
        })
    ));
}

#[test]
fn test_calibration_rejects_duplicates() {
    let json = r#"{"entries":[
        {"width":1,"height":1,"map_x":[0.0],"map_y":[0.0]},
        {"width":1,"height":1,"map_x":[0.0],"map_y":[0.0]}
    ]}"#;
    assert!(matches!(
        CalibrationTable::from_json(json),
        Err(CalibrationError::Duplicate { width: 1, height: 1 })
    ));
}

#[test]
fn test_calibration_load_missing_and_malformed() {
    let dir = TempDir::new().unwrap();
    assert!(CalibrationTable::load(dir.path().join("remap.json"))
        .unwrap()
        .is_none());

    let path = dir.path().join("broken.json");
    fs::write(&path, "{not json").unwrap();
    match CalibrationTable::load(&path) {
        Err(CalibrationError::Read { path: reported, .. }) => {
            assert_eq!(reported, path.display().to_string())
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_capture_args_shutter_speed() {
    let config = CameraConfig::default();
    let mut camera = StillCommandCamera::new(&config, None);
    camera.set_exposure(ExposureSetting::ShutterSpeed { micros: 627_000 });

    let args = camera.capture_args(Path::new("/photos/IMG_0001.JPG"));
    let joined = args.join(" ");

    assert!(joined.contains("--width 3264 --height 2448"));
    assert!(joined.contains("--quality 90"));
    assert!(joined.contains("--gain 1.50"));
    assert!(joined.contains("--rotation 180"));
    assert!(joined.contains("--shutter 627000"));
    assert!(!joined.contains("--ev"));
    assert!(joined.ends_with("-o /photos/IMG_0001.JPG"));
}

#[test]
fn test_capture_args_compensation() {
    let config = CameraConfig {
        rotation: Some(Rotation::Rotate90),
        ..CameraConfig::default()
    };
    let mut camera = StillCommandCamera::new(&config, None);
    camera.set_exposure(ExposureSetting::Compensation { value: -3 });

    let joined = camera.capture_args(Path::new("out.jpg")).join(" ");
    assert!(joined.contains("--ev -0.50"));
    assert!(joined.contains("--rotation 90"));
    assert!(!joined.contains("--shutter"));
    assert_eq!(
        camera.exposure(),
        Some(ExposureSetting::Compensation { value: -3 })
    );
}

#[test]
fn test_capture_args_without_exposure_or_rotation() {
    let config = CameraConfig {
        rotation: None,
        ..CameraConfig::default()
    };
    let camera = StillCommandCamera::new(&config, None);
    let joined = camera.capture_args(Path::new("out.jpg")).join(" ");

    assert!(!joined.contains("--rotation"));
    assert!(!joined.contains("--shutter"));
    assert!(!joined.contains("--ev"));
}

#[tokio::test]
async fn test_capture_runs_command() {
    let dir = TempDir::new().unwrap();
    let config = fake_camera_config(dir.path(), None);
    let mut camera = StillCommandCamera::new(&config, None);
    camera.set_exposure(ExposureSetting::ShutterSpeed { micros: 2000 });

    let photo_path = dir.path().join("IMG_0001.JPG");
    let photo = camera.capture(&photo_path).await.unwrap();

    assert_eq!(photo.path, photo_path);
    assert!(photo_path.exists());
    // Output was not a decodable JPEG, so there is nothing to review
    assert!(photo.review.is_none());
    assert!(recorded_args(dir.path()).contains("--shutter 2000"));
}

#[tokio::test]
async fn test_capture_command_failure() {
    let dir = TempDir::new().unwrap();
    let config = CameraConfig {
        still_command: "false".to_string(),
        ..CameraConfig::default()
    };
    let mut camera = StillCommandCamera::new(&config, None);

    let result = camera.capture(&dir.path().join("IMG_0001.JPG")).await;
    assert!(matches!(result, Err(CameraError::CommandFailed { .. })));
}

#[tokio::test]
async fn test_capture_missing_output() {
    let dir = TempDir::new().unwrap();
    let config = CameraConfig {
        still_command: "true".to_string(),
        ..CameraConfig::default()
    };
    let mut camera = StillCommandCamera::new(&config, None);

    let result = camera.capture(&dir.path().join("IMG_0001.JPG")).await;
    assert!(matches!(result, Err(CameraError::MissingOutput { .. })));
}

#[tokio::test]
async fn test_capture_launch_failure() {
    let dir = TempDir::new().unwrap();
    let config = CameraConfig {
        still_command: "/nonexistent/rpicam-still".to_string(),
        ..CameraConfig::default()
    };
    let mut camera = StillCommandCamera::new(&config, None);

    let result = camera.capture(&dir.path().join("IMG_0001.JPG")).await;
    assert!(matches!(result, Err(CameraError::Launch { .. })));
}

#[cfg(feature = "imaging")]
#[tokio::test]
async fn test_capture_with_calibration_rejects_undecodable_photo() {
    let dir = TempDir::new().unwrap();
    let config = fake_camera_config(dir.path(), None);
    let mut camera = StillCommandCamera::new(&config, Some(Arc::new(identity_entry(4, 2))));

    let result = camera.capture(&dir.path().join("IMG_0001.JPG")).await;
    assert!(matches!(result, Err(CameraError::PostProcess { .. })));
}

#[cfg(feature = "imaging")]
#[tokio::test]
async fn test_capture_dewarps_and_builds_review() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source.jpg");
    image::RgbImage::from_pixel(4, 2, image::Rgb([200, 200, 200]))
        .save_with_format(&source, image::ImageFormat::Jpeg)
        .unwrap();

    let config = fake_camera_config(dir.path(), Some(&source));
    // Everything samples outside the image, so the dewarped photo is black
    let mut entry = identity_entry(4, 2);
    entry.map_x = vec![-10.0; 8];
    let mut camera = StillCommandCamera::new(&config, Some(Arc::new(entry)));

    let photo_path = dir.path().join("IMG_0001.JPG");
    let photo = camera.capture(&photo_path).await.unwrap();

    let review = photo.review.expect("decodable photo should have a review copy");
    assert_eq!((review.width(), review.height()), (2, 1));
    assert!(review.pixel(0, 0)[0] < 30);

    let saved = image::load_from_memory_with_format(&fs::read(&photo_path).unwrap(), image::ImageFormat::Jpeg)
        .unwrap()
        .to_rgb8();
    assert_eq!(saved.dimensions(), (4, 2));
    assert!(saved.get_pixel(1, 1)[0] < 30);
}

#[test]
fn test_splitter_extracts_frames_and_skips_garbage() {
    let mut splitter = MjpegSplitter::default();
    let frames = splitter.push(&[0x00, 0x11, 0xFF, 0xD8, 0x05, 0xFF, 0xD9, 0xFF, 0xD8, 0x06, 0xFF, 0xD9, 0x22]);

    assert_eq!(
        frames,
        vec![
            vec![0xFF, 0xD8, 0x05, 0xFF, 0xD9],
            vec![0xFF, 0xD8, 0x06, 0xFF, 0xD9],
        ]
    );
    assert!(splitter.push(&[]).is_empty());
}

#[test]
fn test_splitter_joins_markers_split_across_reads() {
    let mut splitter = MjpegSplitter::default();

    assert!(splitter.push(&[0xFF, 0xD8, 0x01, 0xFF]).is_empty());
    assert_eq!(splitter.push(&[0xD9, 0xFF]), vec![vec![0xFF, 0xD8, 0x01, 0xFF, 0xD9]]);
    assert_eq!(
        splitter.push(&[0xD8, 0x02, 0xFF, 0xD9]),
        vec![vec![0xFF, 0xD8, 0x02, 0xFF, 0xD9]]
    );
}

#[test]
fn test_preview_args() {
    let config = CameraConfig {
        preview_resolution: (320, 240),
        preview_framerate: 15,
        ..CameraConfig::default()
    };
    let preview = PreviewStream::new(&config);

    let joined = preview
        .preview_args(Some(ExposureSetting::ShutterSpeed { micros: 2000 }))
        .join(" ");
    assert!(joined.starts_with("-t 0 --nopreview --codec mjpeg"));
    assert!(joined.contains("--width 320 --height 240"));
    assert!(joined.contains("--framerate 15"));
    assert!(joined.contains("--gain 1.50"));
    assert!(joined.contains("--rotation 180"));
    assert!(joined.contains("--shutter 2000"));
    assert!(joined.ends_with("-o -"));

    let joined = preview.preview_args(None).join(" ");
    assert!(!joined.contains("--shutter"));
    assert!(!joined.contains("--ev"));
}

#[tokio::test]
async fn test_preview_launch_failure() {
    let config = CameraConfig {
        preview_command: "/nonexistent/rpicam-vid".to_string(),
        ..CameraConfig::default()
    };
    let mut camera = StillCommandCamera::new(&config, None);

    let result = camera.start_preview().await;
    assert!(matches!(result, Err(CameraError::Launch { .. })));
    assert!(camera.take_preview_frame().is_none());
}

#[tokio::test]
async fn test_preview_disabled_is_a_no_op() {
    let config = CameraConfig {
        preview_enabled: false,
        preview_command: "/nonexistent/rpicam-vid".to_string(),
        ..CameraConfig::default()
    };
    let mut camera = StillCommandCamera::new(&config, None);

    assert!(camera.start_preview().await.is_ok());
    assert!(camera.take_preview_frame().is_none());
    camera.stop_preview().await;
}

#[tokio::test]
async fn test_preview_stopped_for_capture_and_restarted() {
    let dir = TempDir::new().unwrap();
    let events = dir.path().join("events.txt");
    let preview_script = dir.path().join("fake_preview.sh");
    let still_script = dir.path().join("fake_still.sh");
    fs::write(&preview_script, FAKE_PREVIEW).unwrap();
    fs::write(&still_script, FAKE_STILL_CHECKING_PREVIEW).unwrap();

    let config = CameraConfig {
        still_command: format!("sh {} {}", still_script.display(), events.display()),
        preview_command: format!("sh {} {}", preview_script.display(), events.display()),
        ..CameraConfig::default()
    };
    let mut camera = StillCommandCamera::new(&config, None);

    camera.start_preview().await.unwrap();
    assert_eq!(wait_for_lines(&events, 1).await.len(), 1);

    let photo_path = dir.path().join("IMG_0001.JPG");
    camera.capture(&photo_path).await.unwrap();
    assert!(photo_path.exists());

    let lines = wait_for_lines(&events, 3).await;
    camera.stop_preview().await;

    assert_eq!(lines.len(), 3, "events: {:?}", lines);
    assert!(lines[0].starts_with("preview "));
    assert_eq!(lines[1], "capture");
    assert!(lines[2].starts_with("preview "));
    assert_ne!(lines[0], lines[2]);
}

#[tokio::test]
async fn test_preview_restarted_after_failed_capture() {
    let dir = TempDir::new().unwrap();
    let events = dir.path().join("events.txt");
    let preview_script = dir.path().join("fake_preview.sh");
    fs::write(&preview_script, FAKE_PREVIEW).unwrap();

    let config = CameraConfig {
        still_command: "false".to_string(),
        preview_command: format!("sh {} {}", preview_script.display(), events.display()),
        ..CameraConfig::default()
    };
    let mut camera = StillCommandCamera::new(&config, None);

    camera.start_preview().await.unwrap();
    assert_eq!(wait_for_lines(&events, 1).await.len(), 1);

    let result = camera.capture(&dir.path().join("IMG_0001.JPG")).await;
    assert!(matches!(result, Err(CameraError::CommandFailed { .. })));

    let lines = wait_for_lines(&events, 2).await;
    camera.stop_preview().await;
    assert_eq!(lines.len(), 2, "events: {:?}", lines);
    assert_ne!(lines[0], lines[1]);
}

#[cfg(feature = "imaging")]
#[tokio::test]
async fn test_preview_delivers_scaled_frames() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("frame.jpg");
    image::RgbImage::from_pixel(4, 2, image::Rgb([200, 200, 200]))
        .save_with_format(&source, image::ImageFormat::Jpeg)
        .unwrap();
    let script = dir.path().join("fake_stream.sh");
    fs::write(&script, "cat \"$1\"\ncat \"$1\"\nexec sleep 30\n").unwrap();

    let config = CameraConfig {
        preview_command: format!("sh {} {}", script.display(), source.display()),
        preview_resolution: (2, 1),
        ..CameraConfig::default()
    };
    let mut camera = StillCommandCamera::new(&config, None);
    camera.start_preview().await.unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    let frame = loop {
        if let Some(frame) = camera.take_preview_frame() {
            break Some(frame);
        }
        if Instant::now() >= deadline {
            break None;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    };
    camera.stop_preview().await;

    let frame = frame.expect("stream should deliver a frame");
    assert_eq!((frame.width(), frame.height()), (2, 1));
    assert!(frame.pixel(0, 0)[0] > 150);
}
