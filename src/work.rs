use std::collections::BTreeSet;
use std::fmt;

use crate::reference::{ReferenceCard, ReferenceCardBack};

/// Game locale. Serialized with the upstream spelling (`enUS`, `frFR`, ...),
/// which is also what output directory names embed.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum Locale {
    #[serde(rename = "enUS")]
    EnUs,
    #[serde(rename = "frFR")]
    FrFr,
    #[serde(rename = "jaJP")]
    JaJp,
    #[serde(rename = "deDE")]
    DeDe,
    #[serde(rename = "zhCN")]
    ZhCn,
    #[serde(rename = "zhTW")]
    ZhTw,
    #[serde(rename = "ruRU")]
    RuRu,
    #[serde(rename = "itIT")]
    ItIt,
    #[serde(rename = "esES")]
    EsEs,
    #[serde(rename = "plPL")]
    PlPl,
    #[serde(rename = "ptBR")]
    PtBr,
    #[serde(rename = "thTH")]
    ThTh,
    #[serde(rename = "koKR")]
    KoKr,
    #[serde(rename = "esMX")]
    EsMx,
}

impl Locale {
    pub fn as_str(self) -> &'static str {
        match self {
            Locale::EnUs => "enUS",
            Locale::FrFr => "frFR",
            Locale::JaJp => "jaJP",
            Locale::DeDe => "deDE",
            Locale::ZhCn => "zhCN",
            Locale::ZhTw => "zhTW",
            Locale::RuRu => "ruRU",
            Locale::ItIt => "itIT",
            Locale::EsEs => "esES",
            Locale::PlPl => "plPL",
            Locale::PtBr => "ptBR",
            Locale::ThTh => "thTH",
            Locale::KoKr => "koKR",
            Locale::EsMx => "esMX",
        }
    }

    /// Every supported locale, in release-configuration order.
    pub fn all() -> Vec<Locale> {
        vec![
            Locale::EnUs,
            Locale::FrFr,
            Locale::JaJp,
            Locale::DeDe,
            Locale::ZhCn,
            Locale::ZhTw,
            Locale::RuRu,
            Locale::ItIt,
            Locale::EsEs,
            Locale::PlPl,
            Locale::PtBr,
            Locale::ThTh,
            Locale::KoKr,
            Locale::EsMx,
        ]
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Premium finish of a captured variant.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum Finish {
    Normal,
    Golden,
    Diamond,
    Signature,
}

impl Finish {
    /// File-name suffix for this finish.
    pub fn suffix(self) -> &'static str {
        match self {
            Finish::Normal => "",
            Finish::Golden => "_golden",
            Finish::Diamond => "_diamond",
            Finish::Signature => "_signature",
        }
    }

    pub fn all() -> Vec<Finish> {
        vec![Finish::Normal, Finish::Golden, Finish::Diamond, Finish::Signature]
    }
}

/// Which kind of subject a work item captures.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum SubjectId {
    Card(String),
    CardBack(u32),
    Pack(u32),
}

impl SubjectId {
    /// Stable file-name stem for the subject.
    pub fn file_stem(&self) -> String {
        match self {
            SubjectId::Card(id) => id.clone(),
            SubjectId::CardBack(id) => id.to_string(),
            SubjectId::Pack(id) => id.to_string(),
        }
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectId::Card(id) => write!(f, "card {id}"),
            SubjectId::CardBack(id) => write!(f, "card-back {id}"),
            SubjectId::Pack(id) => write!(f, "pack {id}"),
        }
    }
}

/// Variant axes for one capture job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct VariantFlags {
    pub finish: Finish,
    /// Board-context (battlegrounds-style) framing.
    pub board: bool,
    /// Hero framing instead of the full card.
    pub hero: bool,
    /// Mercenary-style subject: different hero framing and stat overlays.
    pub mercenary: bool,
    /// Strip stat overlays (mercenary subjects only).
    pub no_stats: bool,
}

impl VariantFlags {
    /// Plain still with no variant axes (card backs, packs).
    pub fn still(finish: Finish) -> Self {
        Self {
            finish,
            board: false,
            hero: false,
            mercenary: false,
            no_stats: false,
        }
    }
}

/// One fully-specified capture job.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct WorkItem {
    pub locale: Locale,
    pub subject: SubjectId,
    pub flags: VariantFlags,
}

impl WorkItem {
    /// File-name base (stem plus finish suffix, no extension).
    pub fn base_name(&self) -> String {
        format!("{}{}", self.subject.file_stem(), self.flags.finish.suffix())
    }
}

/// Subject filtering applied before variant expansion.
#[derive(Default)]
pub struct CardFilter<'a> {
    /// Only these ids when non-empty.
    pub allow_ids: &'a [String],
    /// Keep mercenary-set subjects (dropped by default).
    pub include_mercenaries: bool,
    /// Every predicate must pass for a subject to be kept.
    pub predicates: &'a [&'a dyn Fn(&ReferenceCard) -> bool],
}

/// Expand card reference records into the full, deterministic job sequence.
///
/// Iteration order is locale, then subjects sorted by id, then finish in the
/// configured order, then board/hero/no-stats axes. The order is the contract
/// that makes a numeric resume cursor meaningful across runs.
pub fn enumerate_cards(
    cards: &[ReferenceCard],
    locales: &[Locale],
    finishes: &[Finish],
    filter: &CardFilter<'_>,
) -> Vec<WorkItem> {
    let mut sorted: Vec<&ReferenceCard> = cards.iter().filter(|c| !c.is_enchantment()).collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    let mut seen = BTreeSet::new();
    let mut subjects = Vec::new();
    for card in sorted {
        if !seen.insert(card.id.as_str()) {
            continue;
        }
        if card.is_mercenary() && !filter.include_mercenaries {
            continue;
        }
        if !filter.allow_ids.is_empty() && !filter.allow_ids.contains(&card.id) {
            continue;
        }
        if !filter.predicates.iter().all(|p| p(card)) {
            continue;
        }
        subjects.push(card);
    }

    if subjects.is_empty() {
        tracing::info!("no subjects left after filtering, nothing to enumerate");
        return Vec::new();
    }
    tracing::info!(
        subjects = subjects.len(),
        locales = locales.len(),
        "enumerating card capture jobs"
    );

    let mut items = Vec::new();
    for &locale in locales {
        for card in &subjects {
            let board = card.is_board_eligible();

            let mut finishes_for_card: Vec<Finish> = finishes.to_vec();
            if board && card.battlegrounds_normal_dbf_id > 0 {
                finishes_for_card.retain(|f| *f != Finish::Normal);
            } else if board && (card.battlegrounds_premium_dbf_id > 0 || card.is_hero_power()) {
                finishes_for_card.retain(|f| *f != Finish::Golden);
            }
            if !card.available_as_diamond.unwrap_or(false) {
                finishes_for_card.retain(|f| *f != Finish::Diamond);
            }
            if !card.available_as_signature.unwrap_or(false) {
                finishes_for_card.retain(|f| *f != Finish::Signature);
            }

            // Board-eligible subjects are captured only in board context.
            let boards: &[bool] = if board { &[true] } else { &[false] };
            let heroes: &[bool] = if card.is_hero_like() {
                &[false, true]
            } else {
                &[false]
            };
            let no_stats: &[bool] = if card.is_mercenary() {
                &[false, true]
            } else {
                &[false]
            };

            for &finish in &finishes_for_card {
                for &board_flag in boards {
                    for &hero_flag in heroes {
                        for &no_stats_flag in no_stats {
                            items.push(WorkItem {
                                locale,
                                subject: SubjectId::Card(card.id.clone()),
                                flags: VariantFlags {
                                    finish,
                                    board: board_flag,
                                    hero: hero_flag,
                                    mercenary: card.is_mercenary(),
                                    no_stats: no_stats_flag,
                                },
                            });
                        }
                    }
                }
            }
        }
    }
    items
}

/// One job per card back, sorted by id. Card backs carry no localized text,
/// so they are captured once under a single locale.
pub fn enumerate_card_backs(backs: &[ReferenceCardBack], locale: Locale) -> Vec<WorkItem> {
    let mut ids: Vec<u32> = backs.iter().map(|b| b.id).collect();
    ids.sort_unstable();
    ids.dedup();
    ids.into_iter()
        .map(|id| WorkItem {
            locale,
            subject: SubjectId::CardBack(id),
            flags: VariantFlags::still(Finish::Normal),
        })
        .collect()
}

/// One job per pack id, newest first (reverse declaration order).
pub fn enumerate_packs(pack_ids: &[u32], allow: &[u32], locale: Locale) -> Vec<WorkItem> {
    pack_ids
        .iter()
        .filter(|id| allow.is_empty() || allow.contains(id))
        .rev()
        .map(|&id| WorkItem {
            locale,
            subject: SubjectId::Pack(id),
            flags: VariantFlags::still(Finish::Normal),
        })
        .collect()
}
