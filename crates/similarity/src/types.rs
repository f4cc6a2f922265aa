//! Request and result types exchanged with the similarity service.

use lostfound_core::matching::{MatchCandidate, MatchSource, MatchType};
use lostfound_core::types::DbId;
use serde::{Deserialize, Serialize};

/// Which side of a pair an item sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Lost,
    Found,
}

impl ItemKind {
    /// Collection name the service indexes items under.
    pub fn collection(self) -> &'static str {
        match self {
            ItemKind::Lost => "lost_items",
            ItemKind::Found => "found_items",
        }
    }
}

/// The features the service embeds for one item.
#[derive(Debug, Clone, Serialize)]
pub struct ItemFeatures {
    pub item_id: DbId,
    pub kind: ItemKind,
    pub name: String,
    pub description: String,
    pub category: String,
    pub image_url: Option<String>,
}

/// One counterpart found for a freshly reported item.
#[derive(Debug, Clone, PartialEq)]
pub struct InstantMatch {
    pub paired_item_id: DbId,
    pub similarity: f64,
    pub match_type: MatchType,
}

impl InstantMatch {
    /// Orient the pair by the reported item's side.
    pub fn into_candidate(self, item_id: DbId, kind: ItemKind) -> MatchCandidate {
        let (lost_item_id, found_item_id) = match kind {
            ItemKind::Lost => (item_id, self.paired_item_id),
            ItemKind::Found => (self.paired_item_id, item_id),
        };
        MatchCandidate {
            lost_item_id,
            found_item_id,
            similarity: self.similarity,
            match_type: self.match_type,
            source: MatchSource::Instant,
        }
    }
}

/// One pair reported by a background pass.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundMatch {
    pub lost_item_id: DbId,
    pub found_item_id: DbId,
    pub similarity: f64,
    pub match_type: MatchType,
}

impl From<BackgroundMatch> for MatchCandidate {
    fn from(m: BackgroundMatch) -> Self {
        MatchCandidate {
            lost_item_id: m.lost_item_id,
            found_item_id: m.found_item_id,
            similarity: m.similarity,
            match_type: m.match_type,
            source: MatchSource::Background,
        }
    }
}

/// Map a service-side match label onto a [`MatchType`].
///
/// The service labels a pair by its strongest signal, optionally prefixed
/// with `strong_`. Anything unrecognised counts as `hybrid`.
pub fn normalize_match_type(label: &str) -> MatchType {
    let label = label.strip_prefix("strong_").unwrap_or(label);
    match label {
        "text_semantic" => MatchType::Text,
        "cross_modal" => MatchType::Hybrid,
        other => MatchType::parse(other).unwrap_or(MatchType::Hybrid),
    }
}
