use std::sync::mpsc::{Receiver, RecvTimeoutError, SyncSender, sync_channel};
use std::time::Duration;

use crate::buffer::RgbBuffer;
use crate::error::{SnapdeckError, SnapdeckResult};
use crate::region::CaptureRegion;
use crate::work::{Locale, WorkItem};

/// Opaque handle to a material minted by the host engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MaterialKey(pub u64);

/// One renderer under a scene instance, as exposed by the host engine.
pub trait RendererHandle {
    /// Names of every material currently assigned to this renderer.
    fn material_names(&self) -> Vec<String>;

    /// Enable or disable the renderer entirely.
    fn set_enabled(&mut self, enabled: bool);

    /// Replace every material slot with the given material.
    fn replace_materials(&mut self, material: MaterialKey);
}

/// A loaded scene instance. The host owns the underlying engine object; the
/// pipeline only ever holds one instance at a time and hands it back to
/// [`SceneHost::destroy`] when done.
pub trait InstanceHandle {
    /// Depth-first visit of every renderer under this instance, including
    /// inactive ones.
    fn for_each_renderer(&mut self, visit: &mut dyn FnMut(&mut dyn RendererHandle));

    /// Remove every node whose name contains one of the given substrings
    /// (case-insensitive), applied during a single depth-first traversal on
    /// the host side.
    fn remove_nodes_matching(&mut self, needles: &[String]);
}

/// Result of one load request.
pub enum LoadOutcome {
    Loaded(Box<dyn InstanceHandle>),
    Failed(String),
}

impl std::fmt::Debug for LoadOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadOutcome::Loaded(_) => f.write_str("Loaded(..)"),
            LoadOutcome::Failed(msg) => f.debug_tuple("Failed").field(msg).finish(),
        }
    }
}

/// One-shot completion signal handed to the host's asset loader. The loader
/// resolves it exactly once, from whatever thread it finishes on; the
/// scheduler blocks on the paired [`LoadWaiter`].
pub struct LoadSignal {
    tx: SyncSender<LoadOutcome>,
}

impl LoadSignal {
    /// Resolve the pending load. Consumes the signal; a second resolution is
    /// impossible by construction.
    pub fn resolve(self, outcome: LoadOutcome) {
        // The waiter may already have timed out and dropped its receiver.
        let _ = self.tx.send(outcome);
    }
}

/// Scheduler-side half of the one-shot load handoff.
pub struct LoadWaiter {
    rx: Receiver<LoadOutcome>,
}

impl LoadWaiter {
    /// Block until the loader resolves the signal or the timeout elapses.
    pub fn wait(self, timeout: Duration) -> SnapdeckResult<LoadOutcome> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => Ok(outcome),
            Err(RecvTimeoutError::Timeout) => Err(SnapdeckError::capture(format!(
                "load did not complete within {}ms",
                timeout.as_millis()
            ))),
            Err(RecvTimeoutError::Disconnected) => Err(SnapdeckError::capture(
                "load signal dropped without resolving",
            )),
        }
    }
}

/// Create a paired load signal and waiter.
pub fn load_signal() -> (LoadSignal, LoadWaiter) {
    let (tx, rx) = sync_channel(1);
    (LoadSignal { tx }, LoadWaiter { rx })
}

/// Control over the host's simulation clock.
///
/// The world clock is usually frozen during still capture (so nothing moves
/// between the true-color and silhouette reads) and unfrozen with a fixed
/// capture frame rate during animation capture.
pub trait WorldClock {
    fn is_frozen(&self) -> bool;
    fn set_frozen(&mut self, frozen: bool);

    /// Pin simulation time so exactly one simulated frame elapses per rendered
    /// frame at the given rate; `None` restores free-running time.
    fn set_capture_fps(&mut self, fps: Option<u32>);
}

/// The host 3D engine, as seen by the capture pipeline.
///
/// Everything scene-specific lives behind this trait: the pipeline sequences
/// calls, the host talks to the engine. Implementations are expected to be
/// driven from a single thread; only [`LoadSignal::resolve`] may arrive from
/// elsewhere.
pub trait SceneHost {
    /// Current render-surface size in pixels.
    fn surface_dimensions(&self) -> (u32, u32);

    /// Read back a rectangle of the current render surface as opaque RGB.
    fn read_region(&mut self, region: CaptureRegion) -> SnapdeckResult<RgbBuffer>;

    /// Block until the next frame boundary has rendered.
    fn wait_frame(&mut self);

    /// Ask the asset loader to instantiate the subject for `item`. Returns
    /// `false` when the request itself is refused; otherwise the loader
    /// resolves `done` exactly once, possibly much later.
    fn request_load(&mut self, item: &WorkItem, done: LoadSignal) -> bool;

    /// Apply the item's variant configuration (finish, pose, visibility
    /// toggles, text overrides) to a freshly loaded instance.
    fn configure(
        &mut self,
        instance: &mut dyn InstanceHandle,
        item: &WorkItem,
    ) -> SnapdeckResult<()>;

    /// Destroy an instance and release its engine-side resources.
    fn destroy(&mut self, instance: Box<dyn InstanceHandle>);

    /// Switch the active locale and reload localized game data.
    fn set_locale(&mut self, locale: Locale) -> SnapdeckResult<()>;

    /// Create a flat unlit white material for silhouette passes. Called at
    /// most once per pipeline; the pipeline caches the key.
    fn create_flat_white_material(&mut self) -> SnapdeckResult<MaterialKey>;

    /// Force a full engine-side resource reclamation pass. Only ever invoked
    /// between jobs.
    fn reclaim_resources(&mut self);

    /// Access the world clock.
    fn clock(&mut self) -> &mut dyn WorldClock;
}

/// Request a load and block until the host's loader resolves it.
///
/// A refused request, a reported failure and a timeout all surface as errors;
/// the caller decides whether that skips the item or aborts the run.
pub fn load_instance(
    host: &mut dyn SceneHost,
    item: &WorkItem,
    timeout: Duration,
) -> SnapdeckResult<Box<dyn InstanceHandle>> {
    let (signal, waiter) = load_signal();
    if !host.request_load(item, signal) {
        return Err(SnapdeckError::capture(format!(
            "load request refused for {}",
            item.subject
        )));
    }
    match waiter.wait(timeout)? {
        LoadOutcome::Loaded(instance) => Ok(instance),
        LoadOutcome::Failed(msg) => Err(SnapdeckError::capture(format!(
            "load failed for {}: {msg}",
            item.subject
        ))),
    }
}
