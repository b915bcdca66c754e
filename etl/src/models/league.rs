use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How a league scores head-to-head or rotisserie play.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScoringType {
    Head,
    HeadPoint,
    Roto,
    Point,
    Other(String),
}

impl ScoringType {
    pub fn as_str(&self) -> &str {
        match self {
            ScoringType::Head => "head",
            ScoringType::HeadPoint => "headpoint",
            ScoringType::Roto => "roto",
            ScoringType::Point => "point",
            ScoringType::Other(s) => s,
        }
    }
}

impl From<String> for ScoringType {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "head" => ScoringType::Head,
            "headpoint" => ScoringType::HeadPoint,
            "roto" => ScoringType::Roto,
            "point" => ScoringType::Point,
            _ => ScoringType::Other(s),
        }
    }
}

impl From<ScoringType> for String {
    fn from(t: ScoringType) -> Self {
        t.as_str().to_string()
    }
}

/// A scoring category enabled in the league settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatCategory {
    pub stat_id: String,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub enabled: bool,
    pub sort_order: Option<i64>,
    pub position_type: Option<String>,
    pub is_only_display_stat: bool,
    /// Whether the stat translator knows this identifier.
    pub mapped: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeagueSettings {
    pub draft_type: Option<String>,
    pub is_auction_draft: Option<bool>,
    pub uses_playoff: Option<bool>,
    pub playoff_start_week: Option<u32>,
    pub num_playoff_teams: Option<u32>,
    pub waiver_type: Option<String>,
    pub waiver_rule: Option<String>,
    pub uses_faab: Option<bool>,
    pub max_teams: Option<u32>,
    pub trade_end_date: Option<NaiveDate>,
    pub stat_categories: Vec<StatCategory>,
}

/// A fantasy league for one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub league_key: String,
    #[serde(default)]
    pub league_id: Option<String>,
    #[serde(default)]
    pub game_key: Option<String>,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub num_teams: Option<u32>,
    #[serde(default)]
    pub scoring_type: Option<ScoringType>,
    #[serde(default)]
    pub league_type: Option<String>,
    #[serde(default)]
    pub draft_status: Option<String>,
    pub season: String,
    #[serde(default)]
    pub game_code: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub current_week: Option<u32>,
    #[serde(default)]
    pub start_week: Option<u32>,
    #[serde(default)]
    pub end_week: Option<u32>,
    #[serde(default)]
    pub is_finished: bool,
    #[serde(default)]
    pub is_pro_league: bool,
    #[serde(default)]
    pub is_cash_league: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<LeagueSettings>,
}
