//! Integration tests for the fable CLI commands.
#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const OPENING_TURN: &str = "雾气笼罩着港口。
节拍操作：推进
当前景深等级：3
当前时间：1925-12-26 02:00:00
添加地点：{\"name\":\"港口\",\"description\":\"雾中的码头\"}
";

fn fable() -> Command {
    Command::cargo_bin("fable").unwrap()
}

fn save_dir(tmp: &TempDir) -> String {
    tmp.path().join("save").to_str().unwrap().to_string()
}

fn write_turn(tmp: &TempDir, name: &str, text: &str) -> String {
    let path = tmp.path().join(name);
    fs::write(&path, text).unwrap();
    path.to_str().unwrap().to_string()
}

fn read_game(dir: &str) -> serde_json::Value {
    let text = fs::read_to_string(Path::new(dir).join("game.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

// ---------------------------------------------------------------------------
// turn
// ---------------------------------------------------------------------------

#[test]
fn turn_prints_prose_and_saves() {
    let tmp = TempDir::new().unwrap();
    let dir = save_dir(&tmp);
    let file = write_turn(&tmp, "turn.txt", OPENING_TURN);

    fable()
        .args(["turn", &file, "--dir", &dir, "--seed", "1"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("雾气笼罩着港口。")
                .and(predicate::str::contains("4 commands applied"))
                .and(predicate::str::contains("承"))
                .and(predicate::str::contains("节拍操作").not()),
        );

    let game = read_game(&dir);
    assert_eq!(game["narrative"]["storyBeat"], "承");
    assert_eq!(game["currentTime"], "1925-12-26 02:00:00");
    assert_eq!(game["assets"]["locations"][0]["name"], "港口");
    assert!(Path::new(&dir).join("achievements.json").exists());
    assert!(Path::new(&dir).join("rhythm.json").exists());
}

#[test]
fn turn_reads_stdin() {
    let tmp = TempDir::new().unwrap();
    let dir = save_dir(&tmp);

    fable()
        .args(["turn", "-", "--dir", &dir])
        .write_stdin("天亮了。\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("天亮了。").and(predicate::str::contains("0 commands")));

    let game = read_game(&dir);
    assert_eq!(game["narrative"]["storyBeat"], "起");
    assert_eq!(game["currentTime"], "1925-12-27 00:00:00");
}

#[test]
fn turn_json_report() {
    let tmp = TempDir::new().unwrap();
    let dir = save_dir(&tmp);
    let file = write_turn(&tmp, "turn.txt", "节拍操作：飞翔\n景深等级：2\n");

    let output = fable()
        .args(["turn", &file, "--dir", &dir, "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["commandsApplied"], 1);
    assert_eq!(report["validationErrorCount"], 2);
    assert_eq!(report["success"], true);
}

#[test]
fn turn_without_word_count() {
    let tmp = TempDir::new().unwrap();
    let dir = save_dir(&tmp);
    let file = write_turn(&tmp, "turn.txt", "很长的一段故事。\n节拍操作：维持\n景深等级：3\n");

    fable()
        .args(["turn", &file, "--dir", &dir, "--no-word-count"])
        .assert()
        .success();
    assert_eq!(read_game(&dir)["narrative"]["totalWords"], 0);
}

#[test]
fn turn_missing_file() {
    let tmp = TempDir::new().unwrap();
    fable()
        .args(["turn", "nope.txt", "--dir", &save_dir(&tmp)])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn turn_with_corrupt_save_fails() {
    let tmp = TempDir::new().unwrap();
    let dir = save_dir(&tmp);
    fs::create_dir_all(&dir).unwrap();
    fs::write(Path::new(&dir).join("game.json"), "{broken").unwrap();
    let file = write_turn(&tmp, "turn.txt", OPENING_TURN);

    fable()
        .args(["turn", &file, "--dir", &dir])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load session"));
}

// ---------------------------------------------------------------------------
// parse
// ---------------------------------------------------------------------------

#[test]
fn parse_lists_commands_without_saving() {
    let tmp = TempDir::new().unwrap();
    let dir = save_dir(&tmp);
    let file = write_turn(&tmp, "turn.txt", OPENING_TURN);

    fable()
        .args(["parse", &file, "--dir", &dir])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("4 valid, 0 invalid")
                .and(predicate::str::contains("港口")),
        );
    assert!(!Path::new(&dir).join("game.json").exists());
}

#[test]
fn parse_reports_invalid_commands() {
    let tmp = TempDir::new().unwrap();
    let file = write_turn(&tmp, "turn.txt", "注册角色：{\"name\":\"艾米\"}\n景深等级：3\n");

    fable()
        .args(["parse", &file, "--dir", &save_dir(&tmp)])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("description")
                .and(predicate::str::contains("missing beat operation")),
        );
}

#[test]
fn parse_plain_prose() {
    let tmp = TempDir::new().unwrap();
    fable()
        .args(["parse", "-", "--dir", &save_dir(&tmp)])
        .write_stdin("只是故事。")
        .assert()
        .success()
        .stdout(predicate::str::contains("No commands found"));
}

// ---------------------------------------------------------------------------
// status / new
// ---------------------------------------------------------------------------

#[test]
fn status_shows_state_after_turn() {
    let tmp = TempDir::new().unwrap();
    let dir = save_dir(&tmp);
    let file = write_turn(&tmp, "turn.txt", OPENING_TURN);
    fable().args(["turn", &file, "--dir", &dir]).assert().success();

    fable()
        .args(["status", "--dir", &dir])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("承")
                .and(predicate::str::contains("1925-12-26 02:00:00"))
                .and(predicate::str::contains("location"))
                .and(predicate::str::contains("港口")),
        );
}

#[test]
fn status_of_empty_dir_shows_defaults() {
    let tmp = TempDir::new().unwrap();
    fable()
        .args(["status", "--dir", &save_dir(&tmp)])
        .assert()
        .success()
        .stdout(predicate::str::contains("起").and(predicate::str::contains("1925-12-26 00:00:00")));
}

#[test]
fn new_resets_game_but_keeps_achievements() {
    let tmp = TempDir::new().unwrap();
    let dir = save_dir(&tmp);
    let file = write_turn(&tmp, "turn.txt", OPENING_TURN);
    fable()
        .args(["achievement", "define", "初到港口", "--dir", &dir])
        .assert()
        .success();
    fable().args(["turn", &file, "--dir", &dir]).assert().success();

    fable()
        .args(["new", "--dir", &dir])
        .assert()
        .success()
        .stdout(predicate::str::contains("Started"));

    let game = read_game(&dir);
    assert_eq!(game["narrative"]["storyBeat"], "起");
    assert_eq!(game["assets"]["locations"], serde_json::json!([]));

    fable()
        .args(["achievement", "list", "--dir", &dir])
        .assert()
        .success()
        .stdout(predicate::str::contains("初到港口"));
}

// ---------------------------------------------------------------------------
// achievement
// ---------------------------------------------------------------------------

#[test]
fn achievement_lifecycle() {
    let tmp = TempDir::new().unwrap();
    let dir = save_dir(&tmp);

    fable()
        .args(["achievement", "define", "初到港口", "--dir", &dir])
        .assert()
        .success()
        .stdout(predicate::str::contains("Defined"));
    fable()
        .args(["achievement", "define", "初到港口", "--dir", &dir])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    let file = write_turn(&tmp, "turn.txt", "完成成就：初到港口\n节拍操作：维持\n景深等级：3\n");
    fable().args(["turn", &file, "--dir", &dir]).assert().success();

    fable()
        .args(["achievement", "list", "--dir", &dir])
        .assert()
        .success()
        .stdout(predicate::str::contains("completed"));

    fable()
        .args(["achievement", "clear", "--dir", &dir])
        .assert()
        .success();
    fable()
        .args(["achievement", "list", "--dir", &dir])
        .assert()
        .success()
        .stdout(predicate::str::contains("open"));
}

#[test]
fn great_work_carries_across_turns_into_the_epilogue() {
    let tmp = TempDir::new().unwrap();
    let dir = save_dir(&tmp);
    fable()
        .args(["achievement", "define", "救世伟业", "--dir", &dir])
        .assert()
        .success();

    let first = write_turn(&tmp, "first.txt", "完成成就：救世伟业\n节拍操作：推进\n景深等级：3\n");
    let next = write_turn(&tmp, "next.txt", "节拍操作：推进\n景深等级：3\n");
    fable().args(["turn", &first, "--dir", &dir]).assert().success();
    for _ in 0..3 {
        fable().args(["turn", &next, "--dir", &dir]).assert().success();
    }

    let game = read_game(&dir);
    assert_eq!(game["narrative"]["storyBeat"], "后日谈");
    assert_eq!(game["currentTime"], "后日谈");
}

#[test]
fn hidden_achievements_are_not_listed() {
    let tmp = TempDir::new().unwrap();
    let dir = save_dir(&tmp);
    fable()
        .args(["achievement", "define", "秘密", "--hidden", "--dir", &dir])
        .assert()
        .success();

    fable()
        .args(["achievement", "list", "--dir", &dir])
        .assert()
        .success()
        .stdout(predicate::str::contains("No achievements").and(predicate::str::contains("秘密").not()));
}
