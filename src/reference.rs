use std::path::Path;

use anyhow::Context as _;

use crate::error::{SnapdeckError, SnapdeckResult};

/// One card record from the reference metadata payload.
///
/// Field names mirror the upstream JSON; anything the payload may omit is
/// optional or defaulted so a partial record never aborts the whole parse.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceCard {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub set: Option<String>,
    #[serde(rename = "type", default)]
    pub card_type: Option<String>,
    #[serde(default)]
    pub rarity: Option<String>,
    #[serde(default)]
    pub cost: Option<i32>,
    #[serde(default)]
    pub attack: Option<i32>,
    #[serde(default)]
    pub health: Option<i32>,
    #[serde(default)]
    pub tech_level: i32,
    #[serde(default)]
    pub battlegrounds_normal_dbf_id: i32,
    #[serde(default)]
    pub battlegrounds_premium_dbf_id: i32,
    #[serde(default)]
    pub available_as_diamond: Option<bool>,
    #[serde(default)]
    pub available_as_signature: Option<bool>,
}

impl ReferenceCard {
    fn type_is(&self, expected: &str) -> bool {
        self.card_type
            .as_deref()
            .is_some_and(|t| t.replace(' ', "_").eq_ignore_ascii_case(expected))
    }

    fn set_is(&self, expected: &str) -> bool {
        self.set
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(expected))
    }

    pub fn is_enchantment(&self) -> bool {
        self.type_is("enchantment")
    }

    /// Subjects that belong to the board-context game mode.
    pub fn is_board_eligible(&self) -> bool {
        self.set_is("battlegrounds")
            || self.tech_level > 0
            || self.battlegrounds_normal_dbf_id > 0
            || self.battlegrounds_premium_dbf_id > 0
    }

    pub fn is_hero_power(&self) -> bool {
        self.type_is("hero_power")
    }

    /// Mercenary-mode subjects (stat layout and framing differ).
    pub fn is_mercenary(&self) -> bool {
        self.set_is("lettuce")
    }

    /// Subjects rendered with the hero framing rather than the full card.
    pub fn is_hero_like(&self) -> bool {
        self.type_is("hero") || self.set_is("hero_skins") || self.is_mercenary()
    }
}

/// One card-back record from the reference metadata payload.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ReferenceCardBack {
    pub id: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Parse the card reference payload. Any malformed payload is fatal for the
/// whole run; there is no partial enumeration.
pub fn parse_cards(json: &str) -> SnapdeckResult<Vec<ReferenceCard>> {
    serde_json::from_str(json)
        .map_err(|e| SnapdeckError::reference(format!("failed to parse card payload: {e}")))
}

pub fn parse_card_backs(json: &str) -> SnapdeckResult<Vec<ReferenceCardBack>> {
    serde_json::from_str(json)
        .map_err(|e| SnapdeckError::reference(format!("failed to parse card-back payload: {e}")))
}

/// Extract pack ids from an enum-like text payload: every maximal run of
/// decimal digits is one id.
pub fn parse_pack_ids(text: &str) -> Vec<u32> {
    let mut ids = Vec::new();
    let mut current: Option<u64> = None;
    for ch in text.chars() {
        match (ch.to_digit(10), current) {
            (Some(d), Some(acc)) => current = Some(acc.saturating_mul(10).saturating_add(d as u64)),
            (Some(d), None) => current = Some(d as u64),
            (None, Some(acc)) => {
                if let Ok(id) = u32::try_from(acc) {
                    ids.push(id);
                }
                current = None;
            }
            (None, None) => {}
        }
    }
    if let Some(acc) = current
        && let Ok(id) = u32::try_from(acc)
    {
        ids.push(id);
    }
    ids
}

/// Fetch reference metadata by locator (URL or path) as text. The network
/// implementation lives outside the crate; [`FileSource`] covers local runs.
pub trait MetadataSource {
    fn fetch(&self, locator: &str) -> SnapdeckResult<String>;
}

/// Reads metadata payloads from the local filesystem.
pub struct FileSource;

impl MetadataSource for FileSource {
    fn fetch(&self, locator: &str) -> SnapdeckResult<String> {
        let path = Path::new(locator);
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read reference file '{}'", path.display()))?;
        Ok(text)
    }
}
