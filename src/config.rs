use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;

use crate::animation::{AnimationAssembler, LoopSpec};
use crate::checkpoint::CheckpointStore;
use crate::error::{SnapdeckError, SnapdeckResult};
use crate::output::OutputLayout;
use crate::region::CaptureLayout;
use crate::scheduler::{CaptureScheduler, SchedulerTiming};
use crate::silhouette::SilhouetteConfig;
use crate::work::{CardFilter, Finish, Locale};

/// Everything one capture run needs, loadable from a JSON file.
///
/// Defaults mirror the release configuration the pipeline shipped with: all
/// locales, all finishes, 512/256 output widths, the 1920x1080 layout, and a
/// reclamation pass every 50 items.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Keys the checkpoint file; typically the release/patch number.
    pub run_id: String,
    pub destination_root: PathBuf,
    pub locales: Vec<Locale>,
    pub finishes: Vec<Finish>,
    /// Only these card ids when non-empty.
    pub card_ids: Vec<String>,
    /// Only these pack ids when non-empty.
    pub pack_ids: Vec<u32>,
    pub include_mercenaries: bool,
    pub target_widths: Vec<u32>,
    pub use_checkpoint: bool,
    pub reclaim_every: u32,
    pub settle_ms: u64,
    pub load_timeout_ms: u64,
    /// Encoder binary; a bare name resolves via PATH.
    pub ffmpeg: PathBuf,
    pub layout: CaptureLayout,
    pub silhouette: SilhouetteConfig,
    /// Scene nodes removed (by name substring) before every capture.
    pub prune_nodes: Vec<String>,
    pub animation: LoopSpec,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            run_id: "dev".to_string(),
            destination_root: PathBuf::from("captures"),
            locales: Locale::all(),
            finishes: Finish::all(),
            card_ids: Vec::new(),
            pack_ids: Vec::new(),
            include_mercenaries: false,
            target_widths: vec![512, 256],
            use_checkpoint: true,
            reclaim_every: 50,
            settle_ms: 500,
            load_timeout_ms: 30_000,
            ffmpeg: PathBuf::from("ffmpeg"),
            layout: CaptureLayout::fullscreen_1920x1080(),
            silhouette: SilhouetteConfig::default(),
            prune_nodes: vec!["shadow".to_string(), "hover_highlight".to_string()],
            animation: LoopSpec::default(),
        }
    }
}

impl RunConfig {
    pub fn from_path(path: &Path) -> SnapdeckResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read run config '{}'", path.display()))?;
        let cfg: RunConfig = serde_json::from_str(&text)
            .map_err(|e| SnapdeckError::validation(format!("failed to parse run config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> SnapdeckResult<()> {
        if self.locales.is_empty() {
            return Err(SnapdeckError::validation("locale list must be non-empty"));
        }
        if self.finishes.is_empty() {
            return Err(SnapdeckError::validation("finish list must be non-empty"));
        }
        if self.target_widths.iter().any(|w| *w == 0) {
            return Err(SnapdeckError::validation("target widths must be non-zero"));
        }
        if self.use_checkpoint && self.run_id.is_empty() {
            return Err(SnapdeckError::validation(
                "run id must be non-empty when checkpointing is enabled",
            ));
        }
        self.animation.validate()?;
        Ok(())
    }

    /// The locale card backs and packs are captured under (they carry no
    /// localized content, so the first configured locale is used).
    pub fn primary_locale(&self) -> Locale {
        self.locales.first().copied().unwrap_or(Locale::EnUs)
    }

    pub fn timing(&self) -> SchedulerTiming {
        SchedulerTiming {
            settle: Duration::from_millis(self.settle_ms),
            load_timeout: Duration::from_millis(self.load_timeout_ms),
            reclaim_every: self.reclaim_every,
        }
    }

    pub fn checkpoint_store(&self) -> CheckpointStore {
        CheckpointStore::new(&self.destination_root, &self.run_id, self.use_checkpoint)
    }

    pub fn output_layout(&self) -> OutputLayout {
        OutputLayout::new(&self.destination_root, self.target_widths.clone())
    }

    /// Subject filter for card enumeration; predicates are supplied by the
    /// caller because they are code, not configuration.
    pub fn card_filter<'a>(
        &'a self,
        predicates: &'a [&'a dyn Fn(&crate::reference::ReferenceCard) -> bool],
    ) -> CardFilter<'a> {
        CardFilter {
            allow_ids: &self.card_ids,
            include_mercenaries: self.include_mercenaries,
            predicates,
        }
    }

    pub fn scheduler(&self) -> CaptureScheduler {
        CaptureScheduler::new(
            self.layout.clone(),
            self.output_layout(),
            self.checkpoint_store(),
            self.timing(),
            self.silhouette.clone(),
        )
        .with_prune_nodes(self.prune_nodes.clone())
    }

    pub fn assembler(&self) -> AnimationAssembler {
        AnimationAssembler::new(
            self.layout.clone(),
            self.output_layout(),
            self.animation,
            self.timing(),
            self.silhouette.clone(),
            &self.ffmpeg,
        )
        .with_prune_nodes(self.prune_nodes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        RunConfig::default().validate().unwrap();
    }

    #[test]
    fn validation_catches_empty_axes() {
        let mut cfg = RunConfig {
            locales: Vec::new(),
            ..RunConfig::default()
        };
        assert!(cfg.validate().is_err());

        cfg = RunConfig {
            finishes: Vec::new(),
            ..RunConfig::default()
        };
        assert!(cfg.validate().is_err());

        cfg = RunConfig {
            target_widths: vec![512, 0],
            ..RunConfig::default()
        };
        assert!(cfg.validate().is_err());

        cfg = RunConfig {
            run_id: String::new(),
            use_checkpoint: true,
            ..RunConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: RunConfig =
            serde_json::from_str(r#"{"run_id": "229543", "locales": ["enUS"]}"#).unwrap();
        assert_eq!(cfg.run_id, "229543");
        assert_eq!(cfg.locales, vec![Locale::EnUs]);
        assert_eq!(cfg.target_widths, vec![512, 256]);
        assert_eq!(cfg.reclaim_every, 50);
    }
}
