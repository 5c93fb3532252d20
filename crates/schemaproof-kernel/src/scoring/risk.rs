//! Migration Risk Index: fixed points per risky step, capped at 100.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::migration::{MigrationStep, StepKind};

pub const POINTS_DROP_TABLE: u32 = 40;
pub const POINTS_DROP_COLUMN: u32 = 25;
pub const POINTS_RENAME_TABLE: u32 = 15;
pub const POINTS_RENAME_COLUMN: u32 = 10;
pub const POINTS_UNSAFE_TYPE_CHANGE: u32 = 30;
pub const POINTS_SAFE_TYPE_CHANGE: u32 = 10;
pub const POINTS_NOT_NULL_WITHOUT_DEFAULT: u32 = 25;
pub const POINTS_NON_CONCURRENT_INDEX: u32 = 10;
pub const MRI_POINT_CAP: u32 = 100;

/// Widening casts that never lose data.
const SAFE_CASTS: [(&str, &str); 9] = [
    ("int", "float"),
    ("int", "bigint"),
    ("int", "string"),
    ("float", "string"),
    ("bigint", "string"),
    ("boolean", "string"),
    ("id", "string"),
    ("datetime", "string"),
    ("string", "json"),
];

pub fn is_safe_cast(from: &str, to: &str) -> bool {
    let from = from.trim().to_ascii_lowercase();
    let to = to.trim().to_ascii_lowercase();
    if from.is_empty() || to.is_empty() {
        return false;
    }
    from == to || SAFE_CASTS.iter().any(|(f, t)| *f == from && *t == to)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Drops,
    Renames,
    UnsafeTypeChanges,
    SafeTypeChanges,
    NotNullWithoutDefault,
    NonConcurrentIndexes,
    Other,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; 7] = [
        Self::Drops,
        Self::Renames,
        Self::UnsafeTypeChanges,
        Self::SafeTypeChanges,
        Self::NotNullWithoutDefault,
        Self::NonConcurrentIndexes,
        Self::Other,
    ];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTally {
    pub count: usize,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRisk {
    pub index: usize,
    pub kind: StepKind,
    pub uid: String,
    pub category: RiskCategory,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MriBreakdown {
    pub score: f64,
    pub raw_points: u32,
    pub capped_points: u32,
    pub categories: BTreeMap<RiskCategory, CategoryTally>,
    pub steps: Vec<StepRisk>,
}

pub fn assess_step(step: &MigrationStep) -> (RiskCategory, u32) {
    match step.kind {
        StepKind::DropTable => (RiskCategory::Drops, POINTS_DROP_TABLE),
        StepKind::DropColumn => (RiskCategory::Drops, POINTS_DROP_COLUMN),
        StepKind::RenameTable if !step.uid_continuity => {
            (RiskCategory::Renames, POINTS_RENAME_TABLE)
        }
        StepKind::RenameColumn if !step.uid_continuity => {
            (RiskCategory::Renames, POINTS_RENAME_COLUMN)
        }
        StepKind::AlterType => {
            let to = step.to.as_deref().or_else(|| {
                step.field
                    .as_ref()
                    .and_then(|field| field.type_name.as_deref())
            });
            match (step.from.as_deref(), to) {
                (Some(from), Some(to)) if is_safe_cast(from, to) => {
                    (RiskCategory::SafeTypeChanges, POINTS_SAFE_TYPE_CHANGE)
                }
                _ => (RiskCategory::UnsafeTypeChanges, POINTS_UNSAFE_TYPE_CHANGE),
            }
        }
        StepKind::AddColumn
            if step
                .field
                .as_ref()
                .is_some_and(|field| field.is_not_null_without_default()) =>
        {
            (RiskCategory::NotNullWithoutDefault, POINTS_NOT_NULL_WITHOUT_DEFAULT)
        }
        StepKind::AddIndex if !step.concurrent => {
            (RiskCategory::NonConcurrentIndexes, POINTS_NON_CONCURRENT_INDEX)
        }
        _ => (RiskCategory::Other, 0),
    }
}

pub fn migration_risk(steps: &[MigrationStep]) -> MriBreakdown {
    let mut categories: BTreeMap<RiskCategory, CategoryTally> = RiskCategory::ALL
        .into_iter()
        .map(|category| (category, CategoryTally::default()))
        .collect();
    let mut assessed = Vec::with_capacity(steps.len());
    let mut raw_points: u32 = 0;

    for (index, step) in steps.iter().enumerate() {
        let (category, points) = assess_step(step);
        let tally = categories.entry(category).or_default();
        tally.count += 1;
        tally.points = tally.points.saturating_add(points);
        raw_points = raw_points.saturating_add(points);
        assessed.push(StepRisk {
            index,
            kind: step.kind,
            uid: step.target_uid(),
            category,
            points,
        });
    }

    let capped_points = raw_points.min(MRI_POINT_CAP);
    MriBreakdown {
        score: f64::from(capped_points) / f64::from(MRI_POINT_CAP),
        raw_points,
        capped_points,
        categories,
        steps: assessed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::FieldSpec;

    fn step(kind: StepKind) -> MigrationStep {
        MigrationStep::new(kind, "User")
    }

    #[test]
    fn safe_cast_whitelist() {
        assert!(is_safe_cast("Int", "Float"));
        assert!(is_safe_cast("Int", "String"));
        assert!(is_safe_cast("String", "string"));
        assert!(!is_safe_cast("String", "Int"));
        assert!(!is_safe_cast("Float", "Int"));
        assert!(!is_safe_cast("", ""));
    }

    #[test]
    fn alter_type_points_depend_on_cast_safety() {
        let mut safe = step(StepKind::AlterType);
        safe.from = Some("Int".to_string());
        safe.to = Some("Float".to_string());
        assert_eq!(assess_step(&safe), (RiskCategory::SafeTypeChanges, 10));

        let mut unsafe_change = safe.clone();
        unsafe_change.to = Some("Boolean".to_string());
        assert_eq!(assess_step(&unsafe_change), (RiskCategory::UnsafeTypeChanges, 30));

        let unknown = step(StepKind::AlterType);
        assert_eq!(assess_step(&unknown).1, 30);
    }

    #[test]
    fn renames_with_continuity_are_free() {
        let mut rename = step(StepKind::RenameColumn);
        assert_eq!(assess_step(&rename), (RiskCategory::Renames, 10));
        rename.uid_continuity = true;
        assert_eq!(assess_step(&rename), (RiskCategory::Other, 0));

        assert_eq!(assess_step(&step(StepKind::RenameTable)).1, 15);
    }

    #[test]
    fn add_column_only_scores_not_null_without_default() {
        let mut add = step(StepKind::AddColumn).with_column("nickname");
        assert_eq!(assess_step(&add).1, 0);

        add.field = Some(FieldSpec {
            type_name: Some("String".to_string()),
            nullable: Some(false),
            default_value: None,
        });
        assert_eq!(assess_step(&add), (RiskCategory::NotNullWithoutDefault, 25));
    }

    #[test]
    fn concurrent_index_is_free() {
        let mut index = step(StepKind::AddIndex);
        assert_eq!(assess_step(&index).1, 10);
        index.concurrent = true;
        assert_eq!(assess_step(&index).1, 0);
    }

    #[test]
    fn risk_is_capped_at_one() {
        let steps: Vec<MigrationStep> = (0..4).map(|_| step(StepKind::DropTable)).collect();
        let breakdown = migration_risk(&steps);
        assert_eq!(breakdown.raw_points, 160);
        assert_eq!(breakdown.capped_points, 100);
        assert_eq!(breakdown.score, 1.0);
        assert_eq!(breakdown.categories[&RiskCategory::Drops].count, 4);
    }

    #[test]
    fn empty_plan_has_zero_risk_and_all_categories() {
        let breakdown = migration_risk(&[]);
        assert_eq!(breakdown.score, 0.0);
        assert_eq!(breakdown.categories.len(), RiskCategory::ALL.len());
    }
}
