//! Venue recommendation by item category.
//!
//! Categories are tried in a fixed priority order and the first match wins:
//! luxury maker, furniture, jewelry and watches, art, ceramics, then the
//! general default.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VenueCategory {
    LuxuryMaker,
    Furniture,
    JewelryWatches,
    Art,
    Ceramics,
    General,
}

/// Makers whose pieces belong in high-end rooms. Matched as substrings of the maker.
const LUXURY_MAKERS: &[&str] = &[
    "eames",
    "herman miller",
    "knoll",
    "tiffany",
    "cartier",
    "rolex",
    "patek philippe",
    "hermes",
    "hermès",
    "chanel",
    "louis vuitton",
    "lalique",
    "baccarat",
    "stickley",
    "nakashima",
    "wegner",
    "fabergé",
    "faberge",
];

const FURNITURE_WORDS: &[&str] = &[
    "chair", "table", "desk", "dresser", "cabinet", "sofa", "sideboard", "credenza", "bench",
    "armoire", "bookcase", "stool", "ottoman", "bed", "chest", "lounge",
];

const JEWELRY_WORDS: &[&str] = &[
    "ring", "necklace", "bracelet", "brooch", "earring", "pendant", "jewelry", "jewellery",
    "watch", "wristwatch", "cufflink", "locket",
];

const ART_WORDS: &[&str] = &[
    "painting", "print", "lithograph", "etching", "sculpture", "art", "canvas", "drawing",
    "watercolor", "portrait",
];

const CERAMICS_WORDS: &[&str] = &[
    "vase", "pottery", "ceramic", "porcelain", "stoneware", "earthenware", "bowl", "plate",
    "figurine", "teapot", "jug",
];

struct VenueRule {
    category: VenueCategory,
    matches: fn(&ItemDescriptor) -> bool,
    venues: &'static [&'static str],
}

/// Lowercased maker and tokenized item name
struct ItemDescriptor {
    maker: String,
    words: Vec<String>,
}

impl ItemDescriptor {
    fn new(item_name: &str, maker: Option<&str>) -> Self {
        Self {
            maker: maker.unwrap_or_default().to_lowercase(),
            words: item_name
                .to_lowercase()
                .split(|c: char| !c.is_alphanumeric())
                .filter(|w| !w.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Whole-word match, allowing a plain plural
    fn has_word(&self, keywords: &[&str]) -> bool {
        self.words.iter().any(|word| {
            keywords.iter().any(|kw| {
                word.as_str() == *kw
                    || word.strip_suffix('s').map_or(false, |singular| singular == *kw)
            })
        })
    }
}

fn is_luxury_maker(item: &ItemDescriptor) -> bool {
    !item.maker.is_empty() && LUXURY_MAKERS.iter().any(|m| item.maker.contains(m))
}
fn is_furniture(item: &ItemDescriptor) -> bool {
    item.has_word(FURNITURE_WORDS)
}
fn is_jewelry(item: &ItemDescriptor) -> bool {
    item.has_word(JEWELRY_WORDS)
}
fn is_art(item: &ItemDescriptor) -> bool {
    item.has_word(ART_WORDS)
}
fn is_ceramics(item: &ItemDescriptor) -> bool {
    item.has_word(CERAMICS_WORDS)
}

/// Evaluated top to bottom, first match wins
const RULES: &[VenueRule] = &[
    VenueRule {
        category: VenueCategory::LuxuryMaker,
        matches: is_luxury_maker,
        venues: &["1stDibs", "Christie's", "Sotheby's", "Heritage Auctions"],
    },
    VenueRule {
        category: VenueCategory::Furniture,
        matches: is_furniture,
        venues: &["Chairish", "1stDibs", "LiveAuctioneers", "Facebook Marketplace"],
    },
    VenueRule {
        category: VenueCategory::JewelryWatches,
        matches: is_jewelry,
        venues: &["Ruby Lane", "Heritage Auctions", "eBay", "Etsy"],
    },
    VenueRule {
        category: VenueCategory::Art,
        matches: is_art,
        venues: &["Invaluable", "LiveAuctioneers", "Artsy", "Heritage Auctions"],
    },
    VenueRule {
        category: VenueCategory::Ceramics,
        matches: is_ceramics,
        venues: &["Ruby Lane", "Etsy", "eBay", "Replacements Ltd"],
    },
];

const DEFAULT_VENUES: &[&str] = &["eBay", "Etsy", "LiveAuctioneers", "Ruby Lane"];

pub fn classify(item_name: &str, maker: Option<&str>) -> VenueCategory {
    let item = ItemDescriptor::new(item_name, maker);
    RULES
        .iter()
        .find(|rule| (rule.matches)(&item))
        .map(|rule| rule.category)
        .unwrap_or(VenueCategory::General)
}

impl VenueCategory {
    /// Venues ordered most relevant first
    pub fn venues(&self) -> Vec<String> {
        RULES
            .iter()
            .find(|rule| rule.category == *self)
            .map(|rule| rule.venues)
            .unwrap_or(DEFAULT_VENUES)
            .iter()
            .map(|v| v.to_string())
            .collect()
    }

    pub fn seasonality_note(&self) -> Option<String> {
        match self {
            VenueCategory::Furniture => Some(
                "Furniture sells best in spring and early autumn, when buyers furnish new homes"
                    .to_string(),
            ),
            VenueCategory::JewelryWatches => Some(
                "Jewelry and watch demand peaks ahead of the November-December holidays"
                    .to_string(),
            ),
            _ => None,
        }
    }
}
