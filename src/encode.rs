use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use crate::error::{SnapdeckError, SnapdeckResult};

/// One frame-sequence encode job for the external transcoder.
#[derive(Clone, Debug)]
pub struct ClipEncodeConfig {
    /// Directory holding `frame_%04d.png` files.
    pub frames_dir: PathBuf,
    /// Output clip path (`.webm`).
    pub out_path: PathBuf,
    pub fps: u32,
    /// Number of frames to encode; anything beyond is ignored.
    pub frame_count: u32,
    /// Encoder binary; a bare name resolves via PATH.
    pub ffmpeg: PathBuf,
    /// How often to poll the subprocess for completion.
    pub poll_interval: Duration,
}

impl ClipEncodeConfig {
    pub fn new(
        frames_dir: impl Into<PathBuf>,
        out_path: impl Into<PathBuf>,
        fps: u32,
        frame_count: u32,
    ) -> Self {
        Self {
            frames_dir: frames_dir.into(),
            out_path: out_path.into(),
            fps,
            frame_count,
            ffmpeg: PathBuf::from("ffmpeg"),
            poll_interval: Duration::from_millis(200),
        }
    }

    pub fn validate(&self) -> SnapdeckResult<()> {
        if self.fps == 0 {
            return Err(SnapdeckError::validation("encode fps must be non-zero"));
        }
        if self.frame_count == 0 {
            return Err(SnapdeckError::validation(
                "encode frame count must be non-zero",
            ));
        }
        Ok(())
    }

    fn input_pattern(&self) -> PathBuf {
        self.frames_dir.join("frame_%04d.png")
    }

    /// Arguments handed to the encoder. VP9 with `yuva420p` keeps a straight
    /// alpha channel; `-auto-alt-ref 0` is required for alpha to survive.
    fn args(&self) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-framerate".to_string(),
            self.fps.to_string(),
            "-i".to_string(),
            self.input_pattern().display().to_string(),
            "-frames:v".to_string(),
            self.frame_count.to_string(),
            "-c:v".to_string(),
            "libvpx-vp9".to_string(),
            "-pix_fmt".to_string(),
            "yuva420p".to_string(),
            "-crf".to_string(),
            "30".to_string(),
            "-b:v".to_string(),
            "0".to_string(),
            "-deadline".to_string(),
            "good".to_string(),
            "-cpu-used".to_string(),
            "4".to_string(),
            "-auto-alt-ref".to_string(),
            "0".to_string(),
            self.out_path.display().to_string(),
        ]
    }

    /// The exact command line to run by hand when the encoder is unavailable.
    pub fn manual_command(&self) -> String {
        let mut parts = vec![self.ffmpeg.display().to_string()];
        parts.extend(self.args());
        parts.join(" ")
    }
}

/// What happened to one encode job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodeOutcome {
    /// Clip written; the frame directory has been deleted.
    Encoded,
    /// Encoder binary not found; frames left on disk for a manual run.
    EncoderMissing,
    /// Encoder exited non-zero; frames left on disk for inspection.
    Failed { status: String },
}

fn encoder_available(program: &Path) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Encode a frame sequence into a transparent looping clip.
///
/// The subprocess runs concurrently; this call polls it on a fixed interval
/// rather than blocking, and never fails the run for encoder problems — a
/// missing binary or a non-zero exit leaves the frames on disk and reports
/// the outcome for the caller to log.
pub fn encode_loop_clip(cfg: &ClipEncodeConfig) -> SnapdeckResult<EncodeOutcome> {
    cfg.validate()?;

    if !encoder_available(&cfg.ffmpeg) {
        tracing::warn!(
            frames = %cfg.frames_dir.display(),
            "encoder '{}' not found; frames left on disk. Encode manually with: {}",
            cfg.ffmpeg.display(),
            cfg.manual_command()
        );
        return Ok(EncodeOutcome::EncoderMissing);
    }

    tracing::info!(out = %cfg.out_path.display(), fps = cfg.fps, frames = cfg.frame_count, "encoding clip");

    let mut child = Command::new(&cfg.ffmpeg)
        .args(cfg.args())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| SnapdeckError::encode(format!("failed to spawn encoder: {e}")))?;

    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| SnapdeckError::encode("failed to open encoder stderr (unexpected)"))?;
    let stderr_drain = std::thread::spawn(move || {
        let mut bytes = Vec::new();
        stderr.read_to_end(&mut bytes).map(|_| bytes)
    });

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => std::thread::sleep(cfg.poll_interval),
            Err(e) => {
                return Err(SnapdeckError::encode(format!(
                    "failed to poll encoder: {e}"
                )));
            }
        }
    };

    let stderr_bytes = match stderr_drain.join() {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) => {
            tracing::warn!("could not read encoder stderr: {e}");
            Vec::new()
        }
        Err(_) => {
            tracing::warn!("encoder stderr drain thread panicked");
            Vec::new()
        }
    };

    if !status.success() {
        let stderr_text = String::from_utf8_lossy(&stderr_bytes);
        tracing::warn!(
            status = %status,
            frames = %cfg.frames_dir.display(),
            "encoder failed, frames left on disk: {}",
            stderr_text.trim()
        );
        return Ok(EncodeOutcome::Failed {
            status: status.to_string(),
        });
    }

    tracing::info!(out = %cfg.out_path.display(), "clip encoded");
    if let Err(e) = std::fs::remove_dir_all(&cfg.frames_dir) {
        tracing::warn!(
            frames = %cfg.frames_dir.display(),
            "could not clean up frame directory: {e}"
        );
    }
    Ok(EncodeOutcome::Encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_zero_fps_and_frames() {
        let mut cfg = ClipEncodeConfig::new("frames", "out.webm", 0, 10);
        assert!(cfg.validate().is_err());
        cfg.fps = 30;
        cfg.frame_count = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn args_carry_the_alpha_preserving_codec_settings() {
        let cfg = ClipEncodeConfig::new("frames", "out.webm", 30, 90);
        let args = cfg.args();
        let joined = args.join(" ");
        assert!(joined.contains("-c:v libvpx-vp9"));
        assert!(joined.contains("-pix_fmt yuva420p"));
        assert!(joined.contains("-auto-alt-ref 0"));
        assert!(joined.contains("-frames:v 90"));
        assert!(joined.contains("frame_%04d.png"));
    }

    #[test]
    fn manual_command_starts_with_the_binary() {
        let mut cfg = ClipEncodeConfig::new("frames", "out.webm", 30, 90);
        cfg.ffmpeg = PathBuf::from("/opt/ffmpeg/bin/ffmpeg");
        assert!(cfg.manual_command().starts_with("/opt/ffmpeg/bin/ffmpeg "));
    }

    #[test]
    fn missing_encoder_is_a_non_fatal_outcome() {
        let mut cfg = ClipEncodeConfig::new("frames", "out.webm", 30, 10);
        cfg.ffmpeg = PathBuf::from("/definitely/not/a/real/ffmpeg");
        assert_eq!(
            encode_loop_clip(&cfg).unwrap(),
            EncodeOutcome::EncoderMissing
        );
    }
}
