#![forbid(unsafe_code)]

pub mod animation;
pub mod buffer;
pub mod checkpoint;
pub mod compositor;
pub mod config;
pub mod encode;
pub mod error;
pub mod output;
pub mod reference;
pub mod region;
pub mod scene;
pub mod scheduler;
pub mod silhouette;
pub mod work;

pub use animation::{AnimationAssembler, LoopSpec};
pub use buffer::{AlphaMask, RgbBuffer, RgbaBuffer};
pub use checkpoint::CheckpointStore;
pub use config::RunConfig;
pub use encode::{ClipEncodeConfig, EncodeOutcome, encode_loop_clip};
pub use error::{SnapdeckError, SnapdeckResult};
pub use output::OutputLayout;
pub use reference::{
    FileSource, MetadataSource, ReferenceCard, ReferenceCardBack, parse_card_backs, parse_cards,
    parse_pack_ids,
};
pub use region::{CaptureLayout, CaptureRegion};
pub use scene::{
    InstanceHandle, LoadOutcome, LoadSignal, LoadWaiter, MaterialKey, RendererHandle, SceneHost,
    WorldClock, load_instance, load_signal,
};
pub use scheduler::{CaptureScheduler, RunSummary, SchedulerTiming};
pub use silhouette::{SilhouetteConfig, SilhouettePass};
pub use work::{
    CardFilter, Finish, Locale, SubjectId, VariantFlags, WorkItem, enumerate_card_backs,
    enumerate_cards, enumerate_packs,
};
