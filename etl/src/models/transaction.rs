use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $text,)+
                    $name::Other(s) => s,
                }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => $name::$variant,)+
                    _ => $name::Other(s),
                }
            }
        }

        impl From<$name> for String {
            fn from(v: $name) -> Self {
                v.as_str().to_string()
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionType {
    Add,
    Drop,
    AddDrop,
    Trade,
    Commish,
    Other(String),
}

string_enum!(TransactionType {
    Add => "add",
    Drop => "drop",
    AddDrop => "add/drop",
    Trade => "trade",
    Commish => "commish",
});

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionStatus {
    Successful,
    Pending,
    Failed,
    Vetoed,
    Other(String),
}

string_enum!(TransactionStatus {
    Successful => "successful",
    Pending => "pending",
    Failed => "failed",
    Vetoed => "vetoed",
});

/// What happened to one player inside a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionRole {
    Added,
    Dropped,
    Traded,
    Other(String),
}

string_enum!(TransactionRole {
    Added => "add",
    Dropped => "drop",
    Traded => "trade",
});

/// One player line of a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionPlayer {
    pub player_key: String,
    #[serde(default)]
    pub player_name: Option<String>,
    pub role: TransactionRole,
    #[serde(default)]
    pub source_type: Option<String>,
    #[serde(default)]
    pub source_team_key: Option<String>,
    #[serde(default)]
    pub source_team_name: Option<String>,
    #[serde(default)]
    pub destination_type: Option<String>,
    #[serde(default)]
    pub destination_team_key: Option<String>,
    #[serde(default)]
    pub destination_team_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_key: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    /// Derived from `transaction_key`.
    #[serde(default)]
    pub league_key: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default = "default_status")]
    pub status: TransactionStatus,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub faab_bid: Option<i64>,
    #[serde(default)]
    pub trader_team_key: Option<String>,
    #[serde(default)]
    pub tradee_team_key: Option<String>,
    #[serde(default)]
    pub trade_note: Option<String>,
    #[serde(default)]
    pub players: Vec<TransactionPlayer>,
}

fn default_status() -> TransactionStatus {
    TransactionStatus::Successful
}

impl Transaction {
    pub fn players_with_role<'a>(&'a self, role: &'a TransactionRole) -> impl Iterator<Item = &'a TransactionPlayer> {
        self.players.iter().filter(move |p| &p.role == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_mapping() {
        assert_eq!(TransactionType::from("add/drop".to_string()), TransactionType::AddDrop);
        assert_eq!(TransactionType::from("TRADE".to_string()), TransactionType::Trade);
        assert_eq!(TransactionType::from("keeper".to_string()).as_str(), "keeper");
        assert_eq!(TransactionRole::from("drop".to_string()), TransactionRole::Dropped);
    }

    #[test]
    fn test_serde_uses_type_field() {
        let t: Transaction = serde_json::from_value(json!({
            "transaction_key": "428.l.1.tr.9",
            "type": "add",
            "timestamp": "2024-11-02T17:00:00Z"
        }))
        .unwrap();
        assert_eq!(t.kind, TransactionType::Add);
        assert_eq!(t.status, TransactionStatus::Successful);
        let v = serde_json::to_value(&t).unwrap();
        assert_eq!(v["type"], json!("add"));
    }
}
