#![allow(dead_code)]

use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;

use snapdeck::{
    CaptureRegion, InstanceHandle, LoadOutcome, LoadSignal, Locale, MaterialKey, RendererHandle,
    RgbBuffer, SceneHost, SnapdeckError, SnapdeckResult, WorkItem, WorldClock,
};

/// How much of a capture region the scripted subject covers.
#[derive(Clone, Copy, Debug)]
pub enum Coverage {
    Full,
    LeftHalf,
}

pub struct FakeClock {
    pub frozen: bool,
    pub capture_fps: Option<u32>,
}

impl WorldClock for FakeClock {
    fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    fn set_capture_fps(&mut self, fps: Option<u32>) {
        self.capture_fps = fps;
    }
}

struct ScriptedRenderer {
    whitened: Rc<Cell<bool>>,
    enabled: bool,
}

impl RendererHandle for ScriptedRenderer {
    fn material_names(&self) -> Vec<String> {
        vec!["Body_mat".to_string()]
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn replace_materials(&mut self, _material: MaterialKey) {
        self.whitened.set(true);
    }
}

pub struct ScriptedInstance {
    renderer: ScriptedRenderer,
}

impl ScriptedInstance {
    fn new(whitened: Rc<Cell<bool>>) -> Self {
        Self {
            renderer: ScriptedRenderer {
                whitened,
                enabled: true,
            },
        }
    }
}

impl InstanceHandle for ScriptedInstance {
    fn for_each_renderer(&mut self, visit: &mut dyn FnMut(&mut dyn RendererHandle)) {
        visit(&mut self.renderer);
    }

    fn remove_nodes_matching(&mut self, _needles: &[String]) {}
}

/// Deterministic in-memory scene host for pipeline tests.
///
/// Renders a synthetic subject: a constant color when `still_color` is set,
/// otherwise a color derived from the current frame counter (so animation
/// captures vary frame to frame). After the active instance has been
/// whitened, reads return the white-on-black silhouette instead.
pub struct ScriptedHost {
    pub surface: (u32, u32),
    pub coverage: Coverage,
    pub still_color: Option<[u8; 3]>,
    pub frame: u32,
    pub clock: FakeClock,
    pub loads: u32,
    pub destroys: u32,
    pub reclaims: u32,
    pub material_creations: u32,
    pub locale_switches: Vec<Locale>,
    /// Subjects (by file stem) whose load request is refused outright.
    pub refuse_loads: HashSet<String>,
    /// Subjects whose load completes with a failure.
    pub fail_loads: HashSet<String>,
    /// Subjects whose configuration step fails.
    pub fail_configure: HashSet<String>,
    current_whitened: Option<Rc<Cell<bool>>>,
}

impl ScriptedHost {
    pub fn new(surface: (u32, u32)) -> Self {
        Self {
            surface,
            coverage: Coverage::LeftHalf,
            still_color: None,
            frame: 0,
            clock: FakeClock {
                frozen: true,
                capture_fps: None,
            },
            loads: 0,
            destroys: 0,
            reclaims: 0,
            material_creations: 0,
            locale_switches: Vec::new(),
            refuse_loads: HashSet::new(),
            fail_loads: HashSet::new(),
            fail_configure: HashSet::new(),
            current_whitened: None,
        }
    }

    fn frame_color(&self) -> [u8; 3] {
        self.still_color.unwrap_or([self.frame as u8, 0, 0])
    }
}

impl SceneHost for ScriptedHost {
    fn surface_dimensions(&self) -> (u32, u32) {
        self.surface
    }

    fn read_region(&mut self, region: CaptureRegion) -> SnapdeckResult<RgbBuffer> {
        let whitened = self
            .current_whitened
            .as_ref()
            .map(|c| c.get())
            .unwrap_or(false);
        let color = self.frame_color();

        let mut data = Vec::with_capacity((region.width * region.height * 3) as usize);
        for _y in 0..region.height {
            for x in 0..region.width {
                let covered = match self.coverage {
                    Coverage::Full => true,
                    Coverage::LeftHalf => x < region.width / 2,
                };
                let px = if whitened {
                    if covered { [255, 255, 255] } else { [0, 0, 0] }
                } else {
                    color
                };
                data.extend_from_slice(&px);
            }
        }
        RgbBuffer::from_raw(region.width, region.height, data)
    }

    fn wait_frame(&mut self) {
        self.frame += 1;
    }

    fn request_load(&mut self, item: &WorkItem, done: LoadSignal) -> bool {
        let stem = item.subject.file_stem();
        if self.refuse_loads.contains(&stem) {
            return false;
        }
        if self.fail_loads.contains(&stem) {
            done.resolve(LoadOutcome::Failed("scripted load failure".to_string()));
            return true;
        }
        self.loads += 1;
        let whitened = Rc::new(Cell::new(false));
        self.current_whitened = Some(whitened.clone());
        done.resolve(LoadOutcome::Loaded(Box::new(ScriptedInstance::new(
            whitened,
        ))));
        true
    }

    fn configure(
        &mut self,
        _instance: &mut dyn InstanceHandle,
        item: &WorkItem,
    ) -> SnapdeckResult<()> {
        if self.fail_configure.contains(&item.subject.file_stem()) {
            return Err(SnapdeckError::capture("scripted configure failure"));
        }
        Ok(())
    }

    fn destroy(&mut self, _instance: Box<dyn InstanceHandle>) {
        self.destroys += 1;
        self.current_whitened = None;
    }

    fn set_locale(&mut self, locale: Locale) -> SnapdeckResult<()> {
        self.locale_switches.push(locale);
        Ok(())
    }

    fn create_flat_white_material(&mut self) -> SnapdeckResult<MaterialKey> {
        self.material_creations += 1;
        Ok(MaterialKey(99))
    }

    fn reclaim_resources(&mut self) {
        self.reclaims += 1;
    }

    fn clock(&mut self) -> &mut dyn WorldClock {
        &mut self.clock
    }
}

/// Temp directory unique to one test.
pub fn temp_dir(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("snapdeck_test_{}_{}", name, std::process::id()))
}
