use std::time::Duration;

use crate::animation::AnimationAssembler;
use crate::checkpoint::CheckpointStore;
use crate::compositor;
use crate::encode::EncodeOutcome;
use crate::error::{SnapdeckError, SnapdeckResult};
use crate::output::OutputLayout;
use crate::region::CaptureLayout;
use crate::scene::{InstanceHandle, SceneHost, load_instance};
use crate::silhouette::{SilhouetteConfig, SilhouettePass};
use crate::work::{Locale, WorkItem};

/// Fixed delays and batch sizes that pace the scheduler.
///
/// Settle delays are real time, not simulation time: they let engine-side
/// destroy/instantiate/render effects finish while the world clock may be
/// frozen.
#[derive(Clone, Debug)]
pub struct SchedulerTiming {
    /// Pause before loading and again after configuring.
    pub settle: Duration,
    /// How long a load may stay pending before the item is abandoned.
    pub load_timeout: Duration,
    /// Force a host resource-reclamation pass after this many completed
    /// items; 0 disables the pass.
    pub reclaim_every: u32,
}

impl Default for SchedulerTiming {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(500),
            load_timeout: Duration::from_secs(30),
            reclaim_every: 50,
        }
    }
}

/// Scheduler phases, logged at every transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Settling,
    Loading,
    Configuring,
    Capturing,
    Persisting,
    Cleanup,
}

/// Counters for one scheduler run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub captured: u64,
    /// Items below the resume cursor, never touched.
    pub skipped_resume: u64,
    /// Items abandoned after a load or configuration failure.
    pub skipped_error: u64,
    /// Animation items whose frames are on disk but whose encode is still
    /// owed (encoder missing or failed); a re-run picks them up.
    pub deferred: u64,
}

/// Single-threaded cooperative driver for still captures.
///
/// One item is in flight at a time; every suspension point is an explicit
/// blocking wait (settle sleep, one-shot load signal). Per-item failures are
/// caught here — the item is logged and skipped, and the cursor still
/// advances so a bad subject cannot wedge the run.
pub struct CaptureScheduler {
    layout: CaptureLayout,
    output: OutputLayout,
    checkpoint: CheckpointStore,
    timing: SchedulerTiming,
    silhouette: SilhouettePass,
    prune_nodes: Vec<String>,
    since_reclaim: u32,
}

impl CaptureScheduler {
    pub fn new(
        layout: CaptureLayout,
        output: OutputLayout,
        checkpoint: CheckpointStore,
        timing: SchedulerTiming,
        silhouette: SilhouetteConfig,
    ) -> Self {
        Self {
            layout,
            output,
            checkpoint,
            timing,
            silhouette: SilhouettePass::new(silhouette),
            prune_nodes: Vec::new(),
            since_reclaim: 0,
        }
    }

    /// Remove scene nodes whose names contain any of these substrings before
    /// capturing (leftover shadows, hover highlights and similar clutter).
    pub fn with_prune_nodes(mut self, nodes: Vec<String>) -> Self {
        self.prune_nodes = nodes;
        self
    }

    /// Drive the full item sequence, resuming past the checkpointed prefix.
    pub fn run(
        &mut self,
        host: &mut dyn SceneHost,
        items: &[WorkItem],
    ) -> SnapdeckResult<RunSummary> {
        let cursor = self.checkpoint.read_cursor()?;
        if cursor > 0 {
            tracing::info!(cursor, "resuming past completed prefix");
        }

        let mut summary = RunSummary::default();
        let mut active_locale: Option<Locale> = None;

        for (index, item) in items.iter().enumerate() {
            if (index as u64) < cursor {
                summary.skipped_resume += 1;
                continue;
            }

            if active_locale != Some(item.locale) {
                tracing::info!(locale = %item.locale, "switching locale");
                host.set_locale(item.locale)?;
                active_locale = Some(item.locale);
            }

            tracing::info!(index, total = items.len(), subject = %item.subject, "handling item");
            match self.run_item(host, item) {
                Ok(()) => summary.captured += 1,
                Err(e) => {
                    tracing::warn!(subject = %item.subject, "item skipped: {e}");
                    summary.skipped_error += 1;
                }
            }

            self.since_reclaim += 1;
            if self.timing.reclaim_every > 0 && self.since_reclaim >= self.timing.reclaim_every {
                tracing::info!(
                    batch = self.timing.reclaim_every,
                    "forcing resource reclamation"
                );
                host.reclaim_resources();
                self.since_reclaim = 0;
            }

            // Written after the item so a crash mid-item re-does it.
            self.checkpoint.write_cursor(index as u64 + 1)?;
        }

        tracing::info!(
            captured = summary.captured,
            skipped_resume = summary.skipped_resume,
            skipped_error = summary.skipped_error,
            "run complete"
        );
        Ok(summary)
    }

    /// Drive a sequence of animated-loop captures.
    ///
    /// Differs from [`run`](Self::run) in cursor policy: a deferred encode
    /// (missing or failing encoder) leaves its frames on disk and must be
    /// re-done, so the cursor only advances while the completed prefix is
    /// unbroken. A missing encoder also ends the run early — every later
    /// item would defer the same way.
    pub fn run_animations(
        &mut self,
        host: &mut dyn SceneHost,
        items: &[WorkItem],
        assembler: &mut AnimationAssembler,
    ) -> SnapdeckResult<RunSummary> {
        let cursor = self.checkpoint.read_cursor()?;
        if cursor > 0 {
            tracing::info!(cursor, "resuming past completed prefix");
        }

        let mut summary = RunSummary::default();
        let mut active_locale: Option<Locale> = None;
        let mut frontier = cursor;

        for (index, item) in items.iter().enumerate() {
            if (index as u64) < cursor {
                summary.skipped_resume += 1;
                continue;
            }

            if active_locale != Some(item.locale) {
                tracing::info!(locale = %item.locale, "switching locale");
                host.set_locale(item.locale)?;
                active_locale = Some(item.locale);
            }

            tracing::info!(index, total = items.len(), subject = %item.subject, "handling animation");
            let mut completed = false;
            let mut stop = false;
            match assembler.capture_loop(host, item) {
                Ok(EncodeOutcome::Encoded) => {
                    summary.captured += 1;
                    completed = true;
                }
                Ok(EncodeOutcome::EncoderMissing) => {
                    summary.deferred += 1;
                    stop = true;
                }
                Ok(EncodeOutcome::Failed { status }) => {
                    tracing::warn!(subject = %item.subject, status = %status, "encode deferred");
                    summary.deferred += 1;
                }
                Err(e) => {
                    tracing::warn!(subject = %item.subject, "item skipped: {e}");
                    summary.skipped_error += 1;
                    completed = true;
                }
            }

            if completed && index as u64 == frontier {
                frontier = index as u64 + 1;
                self.checkpoint.write_cursor(frontier)?;
            }

            self.since_reclaim += 1;
            if self.timing.reclaim_every > 0 && self.since_reclaim >= self.timing.reclaim_every {
                host.reclaim_resources();
                self.since_reclaim = 0;
            }

            if stop {
                tracing::warn!("encoder unavailable, ending animation run early");
                break;
            }
        }

        tracing::info!(
            captured = summary.captured,
            deferred = summary.deferred,
            skipped_error = summary.skipped_error,
            "animation run complete"
        );
        Ok(summary)
    }

    fn run_item(&mut self, host: &mut dyn SceneHost, item: &WorkItem) -> SnapdeckResult<()> {
        self.enter(Phase::Settling, item);
        std::thread::sleep(self.timing.settle);

        self.enter(Phase::Loading, item);
        let mut instance = load_instance(host, item, self.timing.load_timeout)?;

        // From here the instance must go back to the host no matter what.
        let result = self.drive_loaded(host, item, instance.as_mut());

        self.enter(Phase::Cleanup, item);
        host.destroy(instance);
        result
    }

    fn drive_loaded(
        &mut self,
        host: &mut dyn SceneHost,
        item: &WorkItem,
        instance: &mut dyn InstanceHandle,
    ) -> SnapdeckResult<()> {
        self.enter(Phase::Configuring, item);
        host.configure(instance, item)?;
        if !self.prune_nodes.is_empty() {
            instance.remove_nodes_matching(&self.prune_nodes);
        }
        std::thread::sleep(self.timing.settle);

        self.enter(Phase::Capturing, item);
        let (surface_w, surface_h) = host.surface_dimensions();
        let region = self.layout.region_for(item);
        if !region.fits_within(surface_w, surface_h) {
            return Err(SnapdeckError::capture(format!(
                "capture region {region:?} exceeds surface {surface_w}x{surface_h}"
            )));
        }

        // True color first: whitening is irreversible for this instance.
        host.wait_frame();
        let rgb = host.read_region(region)?;
        self.silhouette.whiten(host, instance)?;
        host.wait_frame();
        let alpha_source = host.read_region(region)?;
        let rgba = compositor::composite(&rgb, &alpha_source)?;
        drop(rgb);
        drop(alpha_source);

        self.enter(Phase::Persisting, item);
        self.output.persist_still(item, &rgba)?;
        Ok(())
    }

    fn enter(&self, phase: Phase, item: &WorkItem) {
        tracing::debug!(phase = ?phase, subject = %item.subject, "phase");
    }
}
