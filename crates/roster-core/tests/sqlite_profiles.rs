use chrono::{DateTime, TimeZone, Utc};
use roster_core::config::HistoryConfig;
use roster_core::cursor::{Completion, Cursor};
use roster_core::db::query::{self, PlayerFilter, PlayerPages};
use roster_core::db::{SqliteStore, open_store};
use roster_core::error::ProfileError;
use roster_core::model::UserId;
use roster_core::model::absence::{AbsenceReason, AbsenceRecord, AbsenceType};
use roster_core::model::category::ProfileCategory;
use roster_core::model::field::{FieldKey, FieldValue};
use roster_core::model::player::PlayerSummary;
use roster_core::model::role::{RelationshipType, Role, Viewer};
use roster_core::profile::{load_profile, permissions_for};
use rusqlite::Connection;
use tempfile::TempDir;

fn day(month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, month, day, 18, 0, 0)
        .single()
        .expect("valid timestamp")
}

struct Fixture {
    _dir: TempDir,
    conn: Connection,
    admin: UserId,
    donor: UserId,
    keeper: UserId,
    striker: UserId,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().expect("temp dir");
    let conn = open_store(&dir.path().join(".roster/roster.db")).expect("open store");
    let admin = query::add_user(&conn, "Ada", Role::Admin, day(1, 1)).expect("admin");
    let donor = query::add_user(&conn, "Dana", Role::Donor, day(1, 1)).expect("donor");
    let keeper = query::add_user(&conn, "Kai", Role::Player, day(1, 1)).expect("keeper");
    let striker = query::add_user(&conn, "Sam", Role::Player, day(1, 1)).expect("striker");

    let cfg = HistoryConfig::default();
    for (value, at) in [("3.2", day(10, 1)), ("3.6", day(10, 30)), ("3.6", day(10, 15))] {
        query::record_field(&conn, &cfg, keeper, FieldKey::Gpa, value, at).expect("gpa");
    }
    query::record_field(&conn, &cfg, keeper, FieldKey::Pushups, "25", day(9, 3)).expect("pushups");
    query::add_absence(
        &conn,
        &AbsenceRecord {
            player_id: keeper,
            absence_type: AbsenceType::Tutoring,
            date: "2020-10-08".parse().expect("date"),
            reason: AbsenceReason::Excused,
            description: "family trip".to_string(),
        },
        day(10, 9),
    )
    .expect("absence");

    Fixture {
        _dir: dir,
        conn,
        admin,
        donor,
        keeper,
        striker,
    }
}

#[test]
fn admin_profile_resolves_latest_timestamp() {
    let f = fixture();
    let store = SqliteStore::new(&f.conn);
    let profile = load_profile(&store, Viewer::new(f.admin, Role::Admin), f.keeper).expect("admin");

    let gpa = profile.fields.get(FieldKey::Gpa).expect("gpa");
    assert_eq!(gpa.current, FieldValue::Decimal(3.6));
    assert_eq!(gpa.last_updated, day(10, 30));
    assert_eq!(
        profile.categories,
        vec![
            ProfileCategory::AcademicPerformance,
            ProfileCategory::Attendance,
            ProfileCategory::PhysicalWellness,
        ]
    );
    assert_eq!(profile.absences[&AbsenceType::Tutoring][0].description, "family trip");
}

#[test]
fn donor_needs_a_grant() {
    let f = fixture();
    let store = SqliteStore::new(&f.conn);
    let donor = Viewer::new(f.donor, Role::Donor);

    let err = load_profile(&store, donor, f.keeper).expect_err("no grant yet");
    assert!(matches!(err, ProfileError::Forbidden { player, .. } if player == f.keeper));

    query::grant_permission(&f.conn, f.donor, f.keeper, RelationshipType::DonorToPlayer, day(11, 1))
        .expect("grant");
    let profile = load_profile(&store, donor, f.keeper).expect("granted");
    assert_eq!(profile.categories.len(), 3);
    assert_eq!(profile.player.relationship, Some(RelationshipType::DonorToPlayer));

    let err = load_profile(&store, donor, f.striker).expect_err("other player");
    assert!(err.is_forbidden());
}

#[test]
fn missing_and_empty_are_not_forbidden() {
    let f = fixture();
    let store = SqliteStore::new(&f.conn);
    let admin = Viewer::new(f.admin, Role::Admin);

    assert!(load_profile(&store, admin, 9_999).expect_err("missing").is_not_found());

    let empty = load_profile(&store, admin, f.striker).expect("exists");
    assert!(empty.fields.is_empty());
    assert!(empty.categories.is_empty());
}

#[test]
fn cursor_pages_through_sqlite_listing() {
    let f = fixture();
    for i in 0..23 {
        query::add_user(&f.conn, &format!("Walk-on {i:02}"), Role::Player, day(2, 1)).expect("player");
    }
    let store = SqliteStore::new(&f.conn);
    let permissions = permissions_for(&store, Viewer::new(f.admin, Role::Admin)).expect("edges");
    let mut source = PlayerPages::new(&f.conn, &permissions);

    let filter = PlayerFilter {
        role_filter: Some(Role::Player),
        ..PlayerFilter::default()
    };
    let mut cursor: Cursor<PlayerFilter, PlayerSummary, anyhow::Error> = Cursor::new(10, filter);
    let request = cursor.reload();
    assert_eq!(cursor.drive(&mut source, &request), Completion::Applied);
    assert_eq!(cursor.total_pages(), 3);

    let request = cursor.go_to(5).expect("clamped to last page");
    assert_eq!(request.page, 2);
    cursor.drive(&mut source, &request);
    assert_eq!(cursor.visible_data().len(), 5);
    assert!(cursor.next_disabled());

    let narrowed = PlayerFilter {
        phrase: Some("kai".to_string()),
        role_filter: Some(Role::Player),
        related_player_ids: None,
    };
    let stale = cursor.prev().expect("page 1");
    let fresh = cursor.set_keys(narrowed).expect("keys changed");
    assert_eq!(cursor.drive(&mut source, &fresh), Completion::Applied);
    assert_eq!(cursor.drive(&mut source, &stale), Completion::Stale);
    assert_eq!(cursor.total_pages(), 1);
    assert_eq!(cursor.visible_data()[0].id, f.keeper);
}
