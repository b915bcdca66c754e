use serde::{Deserialize, Serialize};

/// Availability status as reported upstream.
///
/// An empty status means the player is active.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlayerStatus {
    #[default]
    Active,
    DayToDay,
    Injured,
    Suspended,
    Inactive,
    Other(String),
}

impl PlayerStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PlayerStatus::Active => "active",
            PlayerStatus::DayToDay => "day_to_day",
            PlayerStatus::Injured => "injured",
            PlayerStatus::Suspended => "suspended",
            PlayerStatus::Inactive => "inactive",
            PlayerStatus::Other(s) => s,
        }
    }

    /// Map an upstream status code (`"GTD"`, `"INJ"`, `"O"`, ...).
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "" | "ACTIVE" => PlayerStatus::Active,
            "DTD" | "GTD" | "DAY_TO_DAY" => PlayerStatus::DayToDay,
            "INJ" | "O" | "OUT" | "INJURED" => PlayerStatus::Injured,
            "SUSP" | "SUSPENDED" => PlayerStatus::Suspended,
            "NA" | "INACTIVE" => PlayerStatus::Inactive,
            _ => PlayerStatus::Other(code.trim().to_string()),
        }
    }
}

impl From<String> for PlayerStatus {
    fn from(s: String) -> Self {
        PlayerStatus::from_code(&s)
    }
}

impl From<PlayerStatus> for String {
    fn from(s: PlayerStatus) -> Self {
        s.as_str().to_string()
    }
}

/// A real-world player as seen by one fantasy game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub player_key: String,
    #[serde(default)]
    pub player_id: Option<String>,
    /// Derived from `player_key`.
    #[serde(default)]
    pub game_key: Option<String>,
    #[serde(default)]
    pub editorial_player_key: Option<String>,
    pub full_name: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    /// Professional team key (`nba.t.13`).
    #[serde(default)]
    pub current_team_key: Option<String>,
    #[serde(default)]
    pub current_team_name: Option<String>,
    #[serde(default)]
    pub current_team_abbr: Option<String>,
    #[serde(default)]
    pub uniform_number: Option<String>,
    #[serde(default)]
    pub display_position: Option<String>,
    #[serde(default)]
    pub primary_position: Option<String>,
    #[serde(default)]
    pub position_type: Option<String>,
    /// Eligible positions in upstream order, without duplicates.
    #[serde(default)]
    pub positions: Vec<String>,
    #[serde(default)]
    pub status: PlayerStatus,
    #[serde(default)]
    pub status_full: Option<String>,
    #[serde(default)]
    pub injury_note: Option<String>,
    #[serde(default)]
    pub is_undroppable: bool,
    #[serde(default)]
    pub headshot_url: Option<String>,
    /// Fantasy team currently rostering the player, when reported.
    #[serde(default)]
    pub owner_team_key: Option<String>,
}

impl Player {
    pub fn is_eligible(&self, position: &str) -> bool {
        self.positions.iter().any(|p| p.eq_ignore_ascii_case(position))
    }
}

/// Append positions keeping the first occurrence of each code.
pub fn push_unique_positions<I, S>(positions: &mut Vec<String>, codes: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for code in codes {
        let code = code.as_ref().trim();
        if !code.is_empty() && !positions.iter().any(|p| p == code) {
            positions.push(code.to_string());
        }
    }
}
