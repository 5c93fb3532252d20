//! PostgreSQL table-level lock modes, weakest first.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockLevel {
    AccessShare,
    RowShare,
    RowExclusive,
    ShareUpdateExclusive,
    Share,
    ShareRowExclusive,
    Exclusive,
    AccessExclusive,
}

impl LockLevel {
    pub const ALL: [LockLevel; 8] = [
        Self::AccessShare,
        Self::RowShare,
        Self::RowExclusive,
        Self::ShareUpdateExclusive,
        Self::Share,
        Self::ShareRowExclusive,
        Self::Exclusive,
        Self::AccessExclusive,
    ];

    /// 1 (ACCESS SHARE) through 8 (ACCESS EXCLUSIVE).
    pub fn severity(self) -> u8 {
        match self {
            Self::AccessShare => 1,
            Self::RowShare => 2,
            Self::RowExclusive => 3,
            Self::ShareUpdateExclusive => 4,
            Self::Share => 5,
            Self::ShareRowExclusive => 6,
            Self::Exclusive => 7,
            Self::AccessExclusive => 8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::AccessShare => "ACCESS SHARE",
            Self::RowShare => "ROW SHARE",
            Self::RowExclusive => "ROW EXCLUSIVE",
            Self::ShareUpdateExclusive => "SHARE UPDATE EXCLUSIVE",
            Self::Share => "SHARE",
            Self::ShareRowExclusive => "SHARE ROW EXCLUSIVE",
            Self::Exclusive => "EXCLUSIVE",
            Self::AccessExclusive => "ACCESS EXCLUSIVE",
        }
    }

    pub fn blocks_reads(self) -> bool {
        self == Self::AccessExclusive
    }

    pub fn blocks_writes(self) -> bool {
        self >= Self::ShareUpdateExclusive
    }

    pub fn blocks_anything(self) -> bool {
        self.blocks_reads() || self.blocks_writes()
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::AccessShare => "Plain SELECT; conflicts only with ACCESS EXCLUSIVE",
            Self::RowShare => "SELECT FOR UPDATE/SHARE",
            Self::RowExclusive => "INSERT, UPDATE, DELETE",
            Self::ShareUpdateExclusive => {
                "VACUUM, ANALYZE, CREATE INDEX CONCURRENTLY; self-conflicting schema work"
            }
            Self::Share => "CREATE INDEX; blocks concurrent data changes",
            Self::ShareRowExclusive => "CREATE TRIGGER, some ALTER TABLE forms",
            Self::Exclusive => "REFRESH MATERIALIZED VIEW CONCURRENTLY",
            Self::AccessExclusive => "DROP, TRUNCATE, most ALTER TABLE; blocks all access",
        }
    }
}

impl fmt::Display for LockLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severities_are_one_through_eight_in_order() {
        let severities: Vec<u8> = LockLevel::ALL.iter().map(|lock| lock.severity()).collect();
        assert_eq!(severities, (1..=8).collect::<Vec<u8>>());
        assert!(LockLevel::ALL.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn only_access_exclusive_blocks_reads() {
        let readers_blocked: Vec<LockLevel> = LockLevel::ALL
            .into_iter()
            .filter(|lock| lock.blocks_reads())
            .collect();
        assert_eq!(readers_blocked, vec![LockLevel::AccessExclusive]);
    }

    #[test]
    fn write_blocking_starts_at_share_update_exclusive() {
        assert!(!LockLevel::RowExclusive.blocks_writes());
        assert!(LockLevel::ShareUpdateExclusive.blocks_writes());
        assert!(LockLevel::Share.blocks_writes());
    }

    #[test]
    fn serializes_as_screaming_snake_case() {
        let json = serde_json::to_value(LockLevel::ShareRowExclusive).unwrap();
        assert_eq!(json, serde_json::json!("SHARE_ROW_EXCLUSIVE"));
        assert_eq!(LockLevel::ShareRowExclusive.to_string(), "SHARE ROW EXCLUSIVE");
    }
}
