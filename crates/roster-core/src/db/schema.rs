//! SQLite schema for the roster store.
//!
//! - `users` holds every account; players are rows with role `Player`
//! - `profile_fields` is the append-only field history. `seq` is the
//!   insertion sequence used to break `created_at_us` ties, and triggers
//!   refuse updates and deletes
//! - `viewing_permissions`, `absences` and `notes` hang off `users`
//! - `store_meta` mirrors the schema version for integrity checks

/// Migration v1: tables, append-only triggers and store metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS users (
    user_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    role TEXT NOT NULL CHECK (role IN ('Admin', 'Player', 'Mentor', 'Parent', 'Donor')),
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS profile_fields (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    player_id INTEGER NOT NULL REFERENCES users(user_id),
    field_key TEXT NOT NULL CHECK (length(field_key) > 0),
    value TEXT NOT NULL,
    created_at_us INTEGER NOT NULL,
    recorded_at_us INTEGER NOT NULL
);

CREATE TRIGGER IF NOT EXISTS profile_fields_no_update
BEFORE UPDATE ON profile_fields
BEGIN
    SELECT RAISE(ABORT, 'profile_fields is append-only');
END;

CREATE TRIGGER IF NOT EXISTS profile_fields_no_delete
BEFORE DELETE ON profile_fields
BEGIN
    SELECT RAISE(ABORT, 'profile_fields is append-only');
END;

CREATE TABLE IF NOT EXISTS viewing_permissions (
    viewer_id INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    related_player_id INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    relationship TEXT NOT NULL CHECK (relationship IN (
        'Player to Player',
        'Mentor to Player',
        'Parent to Player',
        'Donor to Player'
    )),
    created_at_us INTEGER NOT NULL,
    PRIMARY KEY (viewer_id, related_player_id, relationship)
);

CREATE TABLE IF NOT EXISTS absences (
    absence_id INTEGER PRIMARY KEY AUTOINCREMENT,
    player_id INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    absence_type TEXT NOT NULL CHECK (absence_type IN ('School', 'Tutoring', 'Soccer')),
    absence_date TEXT NOT NULL CHECK (absence_date GLOB '[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9]'),
    reason TEXT NOT NULL CHECK (reason IN ('Excused', 'Unexcused')),
    description TEXT NOT NULL DEFAULT '',
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS notes (
    note_id INTEGER PRIMARY KEY AUTOINCREMENT,
    player_id INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    author_id INTEGER NOT NULL REFERENCES users(user_id),
    category TEXT NOT NULL CHECK (category IN ('general', 'soccer', 'academics', 'mentorship')),
    content TEXT NOT NULL CHECK (length(trim(content)) > 0),
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL,
    field_key_wire_version INTEGER NOT NULL DEFAULT 1
);

INSERT OR IGNORE INTO store_meta (id, schema_version, field_key_wire_version)
VALUES (1, 1, 1);
";

/// Migration v2: read-path indexes.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_profile_fields_player_key_created
    ON profile_fields(player_id, field_key, created_at_us, seq);

CREATE INDEX IF NOT EXISTS idx_viewing_permissions_player
    ON viewing_permissions(related_player_id, viewer_id);

CREATE INDEX IF NOT EXISTS idx_absences_player_date
    ON absences(player_id, absence_date DESC);

CREATE INDEX IF NOT EXISTS idx_notes_player_created
    ON notes(player_id, created_at_us DESC);

CREATE INDEX IF NOT EXISTS idx_users_role_name
    ON users(role, name);
";

/// Indexes the read path relies on.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_profile_fields_player_key_created",
    "idx_viewing_permissions_player",
    "idx_absences_player_date",
    "idx_notes_player_created",
    "idx_users_role_name",
];
