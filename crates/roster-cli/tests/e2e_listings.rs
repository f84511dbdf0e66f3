//! E2E tests for the paginated listings: `roster players` and `roster notes`.

use assert_cmd::Command;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

fn roster_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("roster"));
    cmd.current_dir(dir);
    cmd.env("ROSTER_LOG", "error");
    cmd.env("HOME", dir);
    cmd.env("XDG_CONFIG_HOME", dir.join(".config"));
    cmd.env_remove("ROSTER_VIEWER");
    cmd.env_remove("FORMAT");
    cmd
}

fn run_json(dir: &Path, viewer: i64, args: &[&str]) -> Value {
    let output = roster_cmd(dir)
        .args(["--as", &viewer.to_string(), "--json"])
        .args(args)
        .output()
        .expect("command should not crash");
    assert!(
        output.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON")
}

fn add_user(dir: &Path, name: &str, role: &str) -> i64 {
    let output = roster_cmd(dir)
        .args(["user", "add", "--name", name, "--role", role, "--json"])
        .output()
        .expect("user add should not crash");
    assert!(output.status.success());
    let user: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    user["id"].as_i64().expect("user id")
}

fn names(page: &Value) -> Vec<String> {
    page["results"]
        .as_array()
        .expect("results")
        .iter()
        .map(|row| row["name"].as_str().expect("name").to_string())
        .collect()
}

/// Admin plus twelve players, page size 5.
fn setup_team() -> (TempDir, i64, Vec<i64>) {
    let dir = TempDir::new().expect("temp dir");
    roster_cmd(dir.path()).args(["init"]).assert().success();
    std::fs::write(
        dir.path().join(".roster/config.toml"),
        "[pagination]\npage_size = 5\n",
    )
    .expect("write config");

    let admin = add_user(dir.path(), "Admin", "admin");
    let players = (1..=12)
        .map(|n| add_user(dir.path(), &format!("Player {n:02}"), "player"))
        .collect();
    (dir, admin, players)
}

#[test]
fn players_pages_through_the_listing() {
    let (dir, admin, _) = setup_team();

    let first = run_json(dir.path(), admin, &["players", "--role", "player"]);
    assert_eq!(first["page"], 1);
    assert_eq!(first["total_pages"], 3);
    assert_eq!(first["page_size"], 5);
    assert_eq!(
        names(&first),
        vec!["Player 01", "Player 02", "Player 03", "Player 04", "Player 05"]
    );

    let last = run_json(dir.path(), admin, &["players", "--role", "player", "--page", "3"]);
    assert_eq!(names(&last), vec!["Player 11", "Player 12"]);

    // Without a role filter only players are listed; the admin is not.
    let everyone = run_json(dir.path(), admin, &["players", "--page", "3"]);
    assert_eq!(everyone["total_pages"], 3);
    assert_eq!(names(&everyone), vec!["Player 11", "Player 12"]);

    let admins = run_json(dir.path(), admin, &["players", "--role", "admin"]);
    assert_eq!(names(&admins), vec!["Admin"]);
}

#[test]
fn out_of_range_pages_are_clamped() {
    let (dir, admin, _) = setup_team();

    let past_end = run_json(dir.path(), admin, &["players", "--role", "player", "--page", "40"]);
    assert_eq!(past_end["page"], 3);
    assert_eq!(names(&past_end), vec!["Player 11", "Player 12"]);

    let before_start = run_json(dir.path(), admin, &["players", "--role", "player", "--page", "-1"]);
    assert_eq!(before_start["page"], 1);
    assert_eq!(names(&before_start)[0], "Player 01");
}

#[test]
fn donors_only_list_their_linked_players() {
    let (dir, admin, players) = setup_team();
    let donor = add_user(dir.path(), "Dana Donor", "donor");
    for player in [players[2], players[7]] {
        roster_cmd(dir.path())
            .args(["grant", &donor.to_string(), &player.to_string()])
            .assert()
            .success();
    }

    let page = run_json(dir.path(), donor, &["players"]);
    assert_eq!(page["total_pages"], 1);
    assert_eq!(names(&page), vec!["Player 03", "Player 08"]);
    assert_eq!(page["results"][0]["relationship"], "Donor to Player");

    let mine = run_json(dir.path(), donor, &["players", "--mine", "--phrase", "08"]);
    assert_eq!(names(&mine), vec!["Player 08"]);

    // The admin is not linked to anyone, so "mine" is empty.
    let admin_mine = run_json(dir.path(), admin, &["players", "--mine"]);
    assert_eq!(admin_mine["total_pages"], 0);
    assert!(names(&admin_mine).is_empty());
}

#[test]
fn notes_are_paginated_filtered_and_gated() {
    let (dir, admin, players) = setup_team();
    let player = players[0].to_string();
    let mentor = add_user(dir.path(), "Mo Mentor", "mentor");

    for n in 0..7 {
        let category = if n % 2 == 0 { "soccer" } else { "academics" };
        roster_cmd(dir.path())
            .args([
                "--as",
                &admin.to_string(),
                "note",
                "add",
                &player,
                "--category",
                category,
                &format!("note {n}"),
            ])
            .assert()
            .success();
    }

    let first = run_json(dir.path(), admin, &["notes", &player]);
    assert_eq!(first["total_pages"], 2);
    assert_eq!(first["results"].as_array().map(Vec::len), Some(5));

    let soccer = run_json(dir.path(), admin, &["notes", &player, "--category", "soccer"]);
    assert_eq!(soccer["total_pages"], 1);
    assert_eq!(soccer["results"].as_array().map(Vec::len), Some(4));
    assert!(
        soccer["results"]
            .as_array()
            .expect("results")
            .iter()
            .all(|note| note["category"] == "soccer")
    );

    let phrase = run_json(dir.path(), admin, &["notes", &player, "--phrase", "note 3"]);
    assert_eq!(phrase["results"][0]["content"], "note 3");

    let output = roster_cmd(dir.path())
        .args(["--as", &mentor.to_string(), "--json", "notes", &player])
        .output()
        .expect("notes should not crash");
    assert!(!output.status.success());
    let err: Value = serde_json::from_slice(&output.stderr).expect("JSON error");
    assert_eq!(err["error"]["code"], "E2002");

    let output = roster_cmd(dir.path())
        .args(["--as", &admin.to_string(), "--json", "notes", "9999"])
        .output()
        .expect("notes should not crash");
    let err: Value = serde_json::from_slice(&output.stderr).expect("JSON error");
    assert_eq!(err["error"]["code"], "E2001");
}
