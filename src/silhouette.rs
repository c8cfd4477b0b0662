use crate::buffer::AlphaMask;
use crate::error::SnapdeckResult;
use crate::region::CaptureRegion;
use crate::scene::{InstanceHandle, MaterialKey, RendererHandle, SceneHost};

/// Material handling rules for the silhouette pass.
///
/// Both lists hold case-insensitive name substrings. Keep-listed materials are
/// rendered untouched (translucent overlays, outline/text materials whose own
/// look must survive); disable-listed materials turn their whole renderer off
/// so they cannot pollute the silhouette.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SilhouetteConfig {
    pub keep_materials: Vec<String>,
    pub disable_materials: Vec<String>,
}

impl Default for SilhouetteConfig {
    fn default() -> Self {
        Self {
            keep_materials: vec!["outline".to_string()],
            disable_materials: vec!["shadow".to_string()],
        }
    }
}

enum Action {
    Whiten,
    Keep,
    Disable,
}

/// Derives an alpha mask by destructively whitening a scene instance.
///
/// The flat-white material is created by the host once and cached here; the
/// pass itself is irreversible for the instance, so any later true-color
/// capture of the same subject must come from a freshly loaded instance.
pub struct SilhouettePass {
    cfg: SilhouetteConfig,
    white: Option<MaterialKey>,
}

impl SilhouettePass {
    pub fn new(cfg: SilhouetteConfig) -> Self {
        Self { cfg, white: None }
    }

    fn ensure_white(&mut self, host: &mut dyn SceneHost) -> SnapdeckResult<MaterialKey> {
        if let Some(key) = self.white {
            return Ok(key);
        }
        let key = host.create_flat_white_material()?;
        self.white = Some(key);
        Ok(key)
    }

    /// Replace every renderer's materials with flat white, honoring the
    /// keep/disable lists. Destructive: the instance cannot be used for
    /// true-color capture afterwards.
    pub fn whiten(
        &mut self,
        host: &mut dyn SceneHost,
        instance: &mut dyn InstanceHandle,
    ) -> SnapdeckResult<()> {
        let white = self.ensure_white(host)?;
        apply_white(instance, &self.cfg, white);
        Ok(())
    }

    /// Whiten the instance and capture the binarized silhouette of `region`.
    ///
    /// Waits one frame before whitening (so the instance has rendered fully at
    /// least once) and one frame after (so the white pass is on screen).
    pub fn capture_mask(
        &mut self,
        host: &mut dyn SceneHost,
        instance: &mut dyn InstanceHandle,
        region: CaptureRegion,
    ) -> SnapdeckResult<AlphaMask> {
        host.wait_frame();
        self.whiten(host, instance)?;
        host.wait_frame();
        let silhouette = host.read_region(region)?;
        let mask = AlphaMask::binarize(&silhouette);
        tracing::debug!(width = mask.width, height = mask.height, "alpha mask captured");
        Ok(mask)
    }
}

fn classify(cfg: &SilhouetteConfig, names: &[String]) -> Action {
    for name in names {
        let lower = name.to_lowercase();
        if cfg
            .keep_materials
            .iter()
            .any(|k| lower.contains(&k.to_lowercase()))
        {
            return Action::Keep;
        }
        if cfg
            .disable_materials
            .iter()
            .any(|d| lower.contains(&d.to_lowercase()))
        {
            return Action::Disable;
        }
    }
    Action::Whiten
}

fn apply_white(instance: &mut dyn InstanceHandle, cfg: &SilhouetteConfig, white: MaterialKey) {
    instance.for_each_renderer(&mut |renderer: &mut dyn RendererHandle| {
        match classify(cfg, &renderer.material_names()) {
            Action::Keep => {}
            Action::Disable => renderer.set_enabled(false),
            Action::Whiten => renderer.replace_materials(white),
        }
    });
}
