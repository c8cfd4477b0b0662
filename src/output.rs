use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::buffer::RgbaBuffer;
use crate::compositor;
use crate::error::SnapdeckResult;
use crate::work::{SubjectId, WorkItem};

/// Where captured variants land on disk.
///
/// Cards group into one directory per framing/locale combination
/// (`full_cards_enUS`, `bgs_heroes_enUS`, ...); card backs and packs each get
/// a single directory. Inside a variant directory sits the base-resolution
/// PNG plus one subdirectory per requested downscale width.
#[derive(Clone, Debug)]
pub struct OutputLayout {
    root: PathBuf,
    target_widths: Vec<u32>,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>, target_widths: Vec<u32>) -> Self {
        Self {
            root: root.into(),
            target_widths,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for one item's outputs.
    pub fn variant_dir(&self, item: &WorkItem) -> PathBuf {
        let name = match &item.subject {
            SubjectId::Card(_) => {
                let framing = if item.flags.board { "bgs" } else { "full_cards" };
                let hero = if item.flags.hero { "heroes_" } else { "" };
                let no_stats = if item.flags.no_stats { "noStats_" } else { "" };
                format!("{framing}_{hero}{no_stats}{}", item.locale)
            }
            SubjectId::CardBack(_) => "card_backs".to_string(),
            SubjectId::Pack(_) => "card_packs".to_string(),
        };
        self.root.join(name)
    }

    pub fn file_name(&self, item: &WorkItem) -> String {
        format!("{}.png", item.base_name())
    }

    /// Base PNG path for one item.
    pub fn still_path(&self, item: &WorkItem) -> PathBuf {
        self.variant_dir(item).join(self.file_name(item))
    }

    /// Frame directory for one item's in-progress animation.
    pub fn frames_dir(&self, item: &WorkItem) -> PathBuf {
        self.variant_dir(item)
            .join(format!("frames_{}", item.base_name()))
    }

    /// Final encoded clip path for one item.
    pub fn clip_path(&self, item: &WorkItem) -> PathBuf {
        self.variant_dir(item)
            .join(format!("{}.webm", item.base_name()))
    }

    /// Write the base-resolution PNG plus every downscaled width.
    pub fn persist_still(&self, item: &WorkItem, rgba: &RgbaBuffer) -> SnapdeckResult<PathBuf> {
        let dir = self.variant_dir(item);
        let file = self.file_name(item);

        let base_path = dir.join(&file);
        save_png(&base_path, rgba)?;

        for &width in &self.target_widths {
            let scaled = compositor::downscale(rgba, width)?;
            save_png(&dir.join(width.to_string()).join(&file), &scaled)?;
        }
        tracing::info!(path = %base_path.display(), widths = ?self.target_widths, "still persisted");
        Ok(base_path)
    }
}

/// Write an RGBA buffer as a PNG, creating parent directories as needed.
pub fn save_png(path: &Path, rgba: &RgbaBuffer) -> SnapdeckResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        path,
        &rgba.data,
        rgba.width,
        rgba.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("failed to write png '{}'", path.display()))?;
    Ok(())
}
