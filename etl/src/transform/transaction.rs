use chrono::DateTime;
use serde_json::Value;

use super::{entity_parts, parse_name, Transformer};
use crate::extract::{indexed_items, split_head_tail, FieldReader};
use crate::models::{
    league_key_of, EntityType, Transaction, TransactionPlayer, TransactionRole, TransactionStatus, TransactionType,
};
use crate::result::{Issue, TransformResult};

/// League transactions with their player lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct TransactionTransformer;

impl Transformer for TransactionTransformer {
    type Output = Transaction;
    const ENTITY: EntityType = EntityType::Transaction;

    fn item_key(&self) -> &'static str {
        "transaction"
    }

    fn transform(&self, raw: &Value) -> TransformResult<Transaction> {
        let parts = match entity_parts(raw, self.item_key()) {
            Ok(parts) => parts,
            Err(issue) => return TransformResult::failed(issue),
        };
        let mut f = FieldReader::new(&parts);

        let Some(transaction_key) = f.natural_key("transaction_key") else {
            return TransformResult::from_issues(None, f.finish());
        };
        let kind = match f.text("type") {
            Some(t) => TransactionType::from(t),
            None => {
                f.push(Issue::structural("transaction has no type").on("type"));
                return TransformResult::from_issues(None, f.finish());
            }
        };

        let timestamp = f.int("timestamp").and_then(|secs| {
            let resolved = DateTime::from_timestamp(secs, 0);
            if resolved.is_none() {
                f.warn("timestamp", format!("timestamp {} is out of range", secs));
            }
            resolved
        });

        let mut players = Vec::new();
        if let Some(container) = f.raw("players") {
            for (i, item) in indexed_items(container, "player").into_iter().enumerate() {
                match read_player(item, &kind, i) {
                    Ok(player) => players.push(player),
                    Err(issue) => f.push(issue),
                }
            }
        }

        let transaction = Transaction {
            league_key: league_key_of(&transaction_key),
            transaction_id: f.text("transaction_id"),
            status: f.text("status").map(TransactionStatus::from).unwrap_or(TransactionStatus::Successful),
            timestamp,
            faab_bid: f.int("faab_bid"),
            trader_team_key: f.text("trader_team_key"),
            tradee_team_key: f.text("tradee_team_key"),
            trade_note: f.text("trade_note"),
            players,
            kind,
            transaction_key,
        };
        TransformResult::from_issues(Some(transaction), f.finish())
    }
}

/// Role implied by the transaction type when a line omits its own.
fn default_role(kind: &TransactionType) -> Option<TransactionRole> {
    match kind {
        TransactionType::Add => Some(TransactionRole::Added),
        TransactionType::Drop => Some(TransactionRole::Dropped),
        TransactionType::Trade => Some(TransactionRole::Traded),
        _ => None,
    }
}

/// One `players` entry: identity head plus `transaction_data`.
fn read_player(item: &Value, kind: &TransactionType, index: usize) -> Result<TransactionPlayer, Issue> {
    let scope = format!("players[{}]", index);
    let parts = split_head_tail(item);
    let head = FieldReader::new(&parts);
    let player_key = match head.raw("player_key").and_then(Value::as_str).map(str::trim) {
        Some(key) if !key.is_empty() => key.to_string(),
        _ => return Err(Issue::coercion("transaction player without player_key skipped").on(scope)),
    };
    let player_name = head.raw("name").map(parse_name).and_then(|n| n.full);

    // `transaction_data` is a one-element list or a bare object.
    let data = head.group("transaction_data").unwrap_or_default();
    let mut d = FieldReader::over(&data);
    let role = d
        .text("type")
        .map(TransactionRole::from)
        .or_else(|| default_role(kind))
        .unwrap_or_else(|| TransactionRole::Other("unknown".to_string()));

    Ok(TransactionPlayer {
        player_key,
        player_name,
        role,
        source_type: d.text("source_type"),
        source_team_key: d.text("source_team_key"),
        source_team_name: d.text("source_team_name"),
        destination_type: d.text("destination_type"),
        destination_team_key: d.text("destination_team_key"),
        destination_team_name: d.text("destination_team_name"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn raw_add_drop() -> Value {
        json!({"transaction": [
            {
                "transaction_key": "428.l.41083.tr.212",
                "transaction_id": "212",
                "type": "add/drop",
                "status": "successful",
                "timestamp": "1730566800"
            },
            {"players": {
                "count": 2,
                "0": {"player": [
                    [{"player_key": "428.p.6512"}, {"player_id": "6512"}, {"name": {"full": "Jalen Williams"}}],
                    {"transaction_data": [{
                        "type": "add",
                        "source_type": "freeagents",
                        "destination_type": "team",
                        "destination_team_key": "428.l.41083.t.3",
                        "destination_team_name": "Splash Bros"
                    }]}
                ]},
                "1": {"player": [
                    [{"player_key": "428.p.5161"}, {"name": {"full": "Gordon Hayward"}}],
                    {"transaction_data": {
                        "type": "drop",
                        "source_type": "team",
                        "source_team_key": "428.l.41083.t.3",
                        "destination_type": "waivers"
                    }}
                ]}
            }}
        ]})
    }

    #[test]
    fn test_transform_add_drop() {
        let r = TransactionTransformer.transform(&raw_add_drop());
        assert!(r.success(), "{:?}", r.errors());
        let t = r.data().unwrap();
        assert_eq!(t.kind, TransactionType::AddDrop);
        assert_eq!(t.status, TransactionStatus::Successful);
        assert_eq!(t.league_key.as_deref(), Some("428.l.41083"));
        assert_eq!(t.timestamp, Some(Utc.timestamp_opt(1730566800, 0).unwrap()));
        assert_eq!(t.players.len(), 2);

        let added = &t.players[0];
        assert_eq!(added.role, TransactionRole::Added);
        assert_eq!(added.player_name.as_deref(), Some("Jalen Williams"));
        assert_eq!(added.destination_team_key.as_deref(), Some("428.l.41083.t.3"));
        assert_eq!(t.players[1].role, TransactionRole::Dropped);
        assert_eq!(t.players[1].destination_type.as_deref(), Some("waivers"));
        assert_eq!(t.players_with_role(&TransactionRole::Added).count(), 1);
    }

    #[test]
    fn test_trade_role_defaults_and_pending_status() {
        let r = TransactionTransformer.transform(&json!({
            "transaction_key": "428.l.1.tr.5",
            "type": "trade",
            "status": "pending",
            "trader_team_key": "428.l.1.t.1",
            "tradee_team_key": "428.l.1.t.2",
            "players": [{"player": [[{"player_key": "428.p.1"}]]}]
        }));
        let t = r.data().unwrap();
        assert_eq!(t.status, TransactionStatus::Pending);
        assert_eq!(t.players[0].role, TransactionRole::Traded);
        assert_eq!(t.trader_team_key.as_deref(), Some("428.l.1.t.1"));
    }

    #[test]
    fn test_missing_type_and_key() {
        let r = TransactionTransformer.transform(&json!({"transaction_key": "428.l.1.tr.5"}));
        assert!(!r.success());
        assert!(r.errors()[0].is_on("type"));

        let r = TransactionTransformer.transform(&json!({"type": "add"}));
        assert!(!r.success());
    }

    #[test]
    fn test_garbage_timestamp_warns() {
        let r = TransactionTransformer.transform(&json!({
            "transaction_key": "428.l.1.tr.6", "type": "drop", "timestamp": "yesterday"
        }));
        assert!(r.success());
        assert!(r.data().unwrap().timestamp.is_none());
        assert!(r.warnings().iter().any(|w| w.is_on("timestamp")));
    }
}
