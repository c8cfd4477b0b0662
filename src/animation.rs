use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::buffer::{AlphaMask, RgbaBuffer};
use crate::compositor;
use crate::encode::{ClipEncodeConfig, EncodeOutcome, encode_loop_clip};
use crate::error::{SnapdeckError, SnapdeckResult};
use crate::output::{self, OutputLayout};
use crate::region::{CaptureLayout, CaptureRegion};
use crate::scene::{InstanceHandle, SceneHost, load_instance};
use crate::scheduler::SchedulerTiming;
use crate::silhouette::{SilhouetteConfig, SilhouettePass};
use crate::work::WorkItem;

/// Shape of one seamless-loop capture.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LoopSpec {
    pub fps: u32,
    /// Frames in the final clip.
    pub frame_count: u32,
    /// Extra frames captured past the end, consumed by the cross-fade.
    pub overlap_frames: u32,
    /// Unrecorded frames that let particles and shader loops reach steady
    /// state before recording starts.
    pub warmup_frames: u32,
    /// Width the stored frames are downscaled to.
    pub target_width: u32,
}

impl Default for LoopSpec {
    fn default() -> Self {
        Self {
            fps: 30,
            frame_count: 90,
            overlap_frames: 15,
            warmup_frames: 30,
            target_width: 512,
        }
    }
}

impl LoopSpec {
    pub fn validate(&self) -> SnapdeckResult<()> {
        if self.fps == 0 {
            return Err(SnapdeckError::validation("loop fps must be non-zero"));
        }
        if self.frame_count == 0 {
            return Err(SnapdeckError::validation(
                "loop frame count must be non-zero",
            ));
        }
        if self.overlap_frames > self.frame_count {
            return Err(SnapdeckError::validation(
                "overlap frames must not exceed the frame count",
            ));
        }
        if self.target_width == 0 {
            return Err(SnapdeckError::validation(
                "loop target width must be non-zero",
            ));
        }
        Ok(())
    }

    fn total_frames(&self) -> u32 {
        self.frame_count + self.overlap_frames
    }
}

/// Captures one subject as a fixed-length, seamlessly loopable transparent
/// clip.
///
/// The alpha mask is captured once from a dedicated disposable instance and
/// reused for every frame: the silhouette shape is assumed constant across
/// the loop, a deliberate approximation that holds for looping card-back
/// animations whose outline never moves.
pub struct AnimationAssembler {
    layout: CaptureLayout,
    output: OutputLayout,
    spec: LoopSpec,
    timing: SchedulerTiming,
    silhouette: SilhouettePass,
    prune_nodes: Vec<String>,
    ffmpeg: PathBuf,
}

impl AnimationAssembler {
    pub fn new(
        layout: CaptureLayout,
        output: OutputLayout,
        spec: LoopSpec,
        timing: SchedulerTiming,
        silhouette: SilhouetteConfig,
        ffmpeg: impl Into<PathBuf>,
    ) -> Self {
        Self {
            layout,
            output,
            spec,
            timing,
            silhouette: SilhouettePass::new(silhouette),
            prune_nodes: Vec::new(),
            ffmpeg: ffmpeg.into(),
        }
    }

    /// Remove scene nodes whose names contain any of these substrings before
    /// capturing.
    pub fn with_prune_nodes(mut self, nodes: Vec<String>) -> Self {
        self.prune_nodes = nodes;
        self
    }

    /// Run the full loop capture for one item.
    pub fn capture_loop(
        &mut self,
        host: &mut dyn SceneHost,
        item: &WorkItem,
    ) -> SnapdeckResult<EncodeOutcome> {
        self.spec.validate()?;

        let (surface_w, surface_h) = host.surface_dimensions();
        let region = self.layout.region_for(item);
        if !region.fits_within(surface_w, surface_h) {
            return Err(SnapdeckError::capture(format!(
                "capture region {region:?} exceeds surface {surface_w}x{surface_h}"
            )));
        }

        // The mask comes from a disposable instance: whitening is
        // irreversible, so the instance used for pixels must be a fresh one.
        tracing::info!(subject = %item.subject, "capturing alpha mask from disposable instance");
        std::thread::sleep(self.timing.settle);
        let mask = {
            let mut disposable = load_instance(host, item, self.timing.load_timeout)?;
            host.configure(disposable.as_mut(), item)?;
            if !self.prune_nodes.is_empty() {
                disposable.remove_nodes_matching(&self.prune_nodes);
            }
            let mask = self.silhouette.capture_mask(host, disposable.as_mut(), region);
            host.destroy(disposable);
            mask?
        };

        std::thread::sleep(self.timing.settle);
        let mut instance = load_instance(host, item, self.timing.load_timeout)?;
        let capture_result = self.capture_with_instance(host, item, instance.as_mut(), region, &mask);
        host.destroy(instance);
        drop(mask);
        capture_result
    }

    fn capture_with_instance(
        &mut self,
        host: &mut dyn SceneHost,
        item: &WorkItem,
        instance: &mut dyn InstanceHandle,
        region: CaptureRegion,
        mask: &AlphaMask,
    ) -> SnapdeckResult<EncodeOutcome> {
        host.configure(instance, item)?;
        if !self.prune_nodes.is_empty() {
            instance.remove_nodes_matching(&self.prune_nodes);
        }

        let frames_dir = self.output.frames_dir(item);
        std::fs::create_dir_all(&frames_dir).with_context(|| {
            format!("failed to create frame directory '{}'", frames_dir.display())
        })?;

        // Unfreeze simulated time at a fixed rate so time-based effects
        // advance exactly one simulated frame per captured frame, and restore
        // the prior clock state whatever the capture does.
        let was_frozen = host.clock().is_frozen();
        host.clock().set_frozen(false);
        host.clock().set_capture_fps(Some(self.spec.fps));

        let recorded = self.record_frames(host, region, mask, &frames_dir);

        host.clock().set_capture_fps(None);
        host.clock().set_frozen(was_frozen);

        let (head, tail) = recorded?;
        self.blend_head(&frames_dir, &head, &tail)?;
        drop(head);
        drop(tail);
        delete_tail_frames(&frames_dir, self.spec.frame_count, self.spec.total_frames());

        let mut encode = ClipEncodeConfig::new(
            &frames_dir,
            self.output.clip_path(item),
            self.spec.fps,
            self.spec.frame_count,
        );
        encode.ffmpeg = self.ffmpeg.clone();
        encode_loop_clip(&encode)
    }

    fn record_frames(
        &mut self,
        host: &mut dyn SceneHost,
        region: CaptureRegion,
        mask: &AlphaMask,
        frames_dir: &Path,
    ) -> SnapdeckResult<(Vec<RgbaBuffer>, Vec<RgbaBuffer>)> {
        let total = self.spec.total_frames();
        tracing::info!(
            total,
            main = self.spec.frame_count,
            overlap = self.spec.overlap_frames,
            warmup = self.spec.warmup_frames,
            "capturing animation frames"
        );

        for _ in 0..self.spec.warmup_frames {
            host.wait_frame();
        }

        let overlap = self.spec.overlap_frames as usize;
        let mut head: Vec<RgbaBuffer> = Vec::with_capacity(overlap);
        let mut tail: Vec<RgbaBuffer> = Vec::with_capacity(overlap);

        for i in 0..total {
            host.wait_frame();
            let rgb = host.read_region(region)?;
            let rgba = compositor::composite_with_mask(&rgb, mask)?;
            drop(rgb);

            // Raw (pre-downscale) pixels for the blend zones only.
            if (i as usize) < overlap {
                head.push(rgba.clone());
            }
            if i >= self.spec.frame_count {
                tail.push(rgba.clone());
            }

            let scaled = compositor::downscale(&rgba, self.spec.target_width)?;
            output::save_png(&frame_path(frames_dir, i), &scaled)?;

            if i % 30 == 0 {
                tracing::debug!(frame = i, total, "frame captured");
            }
        }
        Ok((head, tail))
    }

    /// Cross-fade the overlap region and overwrite the on-disk head frames.
    ///
    /// At `i = 0` the output is the tail frame — a seamless continuation of
    /// the last main frame; as `i` approaches the end of the overlap the
    /// output converges to the originally captured head.
    fn blend_head(
        &self,
        frames_dir: &Path,
        head: &[RgbaBuffer],
        tail: &[RgbaBuffer],
    ) -> SnapdeckResult<()> {
        let overlap = head.len().min(tail.len());
        if overlap == 0 {
            return Ok(());
        }
        tracing::info!(overlap, "cross-fade blending overlap frames");
        for i in 0..overlap {
            let t = i as f32 / overlap as f32;
            let blended = compositor::crossfade(&tail[i], &head[i], t)?;
            let scaled = compositor::downscale(&blended, self.spec.target_width)?;
            output::save_png(&frame_path(frames_dir, i as u32), &scaled)?;
        }
        Ok(())
    }
}

fn delete_tail_frames(frames_dir: &Path, frame_count: u32, total: u32) {
    for i in frame_count..total {
        let path = frame_path(frames_dir, i);
        if let Err(e) = std::fs::remove_file(&path) {
            tracing::warn!(path = %path.display(), "failed to delete tail frame: {e}");
        }
    }
}

fn frame_path(dir: &Path, index: u32) -> PathBuf {
    dir.join(format!("frame_{index:04}.png"))
}
