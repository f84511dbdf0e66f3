//! Which profile tabs a viewer gets to see.
//!
//! A category shows up when the viewer is authorized for it *and* it has
//! something to show. Order is always [`ProfileCategory::ALL`]; the filter only
//! removes.

use std::collections::BTreeSet;

use crate::model::absence::AbsenceRecord;
use crate::model::category::ProfileCategory;
use crate::snapshot::Snapshot;

/// Set of categories a viewer may open.
pub type CategorySet = BTreeSet<ProfileCategory>;

/// Whether `category` has content for this player.
///
/// Attendance looks only at absence records; every other category needs at
/// least one of its keys in the snapshot.
#[must_use]
pub fn has_content(category: ProfileCategory, snapshot: &Snapshot, absences: &[AbsenceRecord]) -> bool {
    if category.uses_absences() && !absences.is_empty() {
        return true;
    }
    category
        .field_keys()
        .iter()
        .any(|key| snapshot.contains(*key))
}

/// Categories to render, in display order.
#[must_use]
pub fn visible_categories(
    snapshot: &Snapshot,
    absences: &[AbsenceRecord],
    authorized: &CategorySet,
) -> Vec<ProfileCategory> {
    ProfileCategory::ALL
        .into_iter()
        .filter(|category| authorized.contains(category))
        .filter(|category| has_content(*category, snapshot, absences))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::FieldLog;
    use crate::model::absence::{AbsenceReason, AbsenceType};
    use crate::model::field::FieldKey;
    use chrono::{TimeZone, Utc};

    fn snapshot_with(keys: &[(FieldKey, &str)]) -> Snapshot {
        let mut log = FieldLog::new();
        let at = Utc
            .with_ymd_and_hms(2021, 3, 1, 9, 0, 0)
            .single()
            .expect("valid timestamp");
        for (key, value) in keys {
            log.append(3, *key, *value, at);
        }
        log.snapshot()
    }

    fn one_absence() -> Vec<AbsenceRecord> {
        vec![AbsenceRecord {
            player_id: 3,
            absence_type: AbsenceType::Tutoring,
            date: "2021-02-11".parse().expect("valid date"),
            reason: AbsenceReason::Unexcused,
            description: "missed bus".to_string(),
        }]
    }

    fn everything() -> CategorySet {
        ProfileCategory::ALL.into_iter().collect()
    }

    #[test]
    fn empty_profile_shows_nothing_even_to_authorized_viewer() {
        let visible = visible_categories(&Snapshot::default(), &[], &everything());
        assert!(visible.is_empty());
    }

    #[test]
    fn categories_follow_data_in_fixed_order() {
        let snapshot = snapshot_with(&[
            (FieldKey::Highlights, "https://example.org/clip"),
            (FieldKey::BioAboutMe, "striker"),
            (FieldKey::Gpa, "3.1"),
        ]);
        let visible = visible_categories(&snapshot, &[], &everything());
        assert_eq!(
            visible,
            vec![
                ProfileCategory::Overview,
                ProfileCategory::AcademicPerformance,
                ProfileCategory::Highlights,
            ]
        );
    }

    #[test]
    fn attendance_depends_only_on_absences() {
        let snapshot = snapshot_with(&[(FieldKey::Pushups, "20")]);
        let without = visible_categories(&snapshot, &[], &everything());
        assert!(!without.contains(&ProfileCategory::Attendance));

        let with = visible_categories(&snapshot, &one_absence(), &everything());
        assert_eq!(
            with,
            vec![ProfileCategory::Attendance, ProfileCategory::PhysicalWellness]
        );
    }

    #[test]
    fn unauthorized_categories_are_removed() {
        let snapshot = snapshot_with(&[(FieldKey::BioHobbies, "drawing"), (FieldKey::Bmi, "19.5")]);
        let authorized: CategorySet = [ProfileCategory::PhysicalWellness].into_iter().collect();
        let visible = visible_categories(&snapshot, &one_absence(), &authorized);
        assert_eq!(visible, vec![ProfileCategory::PhysicalWellness]);
    }

    #[test]
    fn no_authorization_means_no_categories() {
        let snapshot = snapshot_with(&[(FieldKey::BioHobbies, "drawing")]);
        let visible = visible_categories(&snapshot, &one_absence(), &CategorySet::new());
        assert!(visible.is_empty());
    }

    #[test]
    fn rejected_numeric_value_does_not_count_as_content() {
        let snapshot = snapshot_with(&[(FieldKey::Gpa, "unknown")]);
        assert!(!has_content(ProfileCategory::AcademicPerformance, &snapshot, &[]));
    }
}
