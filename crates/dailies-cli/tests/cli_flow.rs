use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_dailies"))
}

struct Sandbox {
    root: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let root = TempDir::new().expect("create temp dir");
        std::fs::create_dir_all(root.path().join("config")).expect("create config dir");
        std::fs::create_dir_all(root.path().join("data")).expect("create data dir");
        Self { root }
    }

    fn config_home(&self) -> PathBuf {
        self.root.path().join("config")
    }

    fn db_path(&self) -> PathBuf {
        self.root.path().join("data").join("dailies.db")
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(bin());
        cmd.env("XDG_CONFIG_HOME", self.config_home())
            .env("XDG_DATA_HOME", self.root.path().join("data"))
            .env("HOME", self.root.path())
            .env_remove("DAILIES_DB")
            .env_remove("DAILIES_CONFIG")
            .env_remove("DAILIES_LOG")
            .env("NO_COLOR", "1");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command().args(args).output().expect("run dailies")
    }

    fn run_ok(&self, args: &[&str]) -> Output {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "dailies {:?} failed: stdout={}, stderr={}",
            args,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        output
    }

    fn run_json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.run_ok(args);
        serde_json::from_slice(&output.stdout).expect("parse json output")
    }

    fn init(&self) {
        let db = self.db_path();
        self.run_ok(&["init", path_str(&db), "--owner", "Alice"]);
    }

    fn add_entity(&self, args: &[&str]) -> String {
        let output = self.run_ok(&[&["entity", "add"][..], args].concat());
        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .trim()
            .strip_prefix("Added entity ")
            .expect("added entity id")
            .to_string()
    }
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("utf-8 path")
}

fn category_ratio(status: &serde_json::Value, category: &str) -> f64 {
    status["categories"]
        .as_array()
        .expect("categories array")
        .iter()
        .find(|entry| entry["category"] == category)
        .and_then(|entry| entry["ratio"].as_f64())
        .expect("category ratio")
}

#[test]
fn test_cli_init_writes_config() {
    let sandbox = Sandbox::new();
    sandbox.init();

    assert!(sandbox.db_path().exists());
    let config_path = sandbox.config_home().join("dailies").join("config.toml");
    let contents = std::fs::read_to_string(&config_path).expect("read config");
    let value: toml::Value = toml::from_str(&contents).expect("parse config");
    assert_eq!(
        value["database"]["path"].as_str(),
        Some(path_str(&sandbox.db_path()))
    );
    assert_eq!(value["owner"]["name"].as_str(), Some("Alice"));
    assert!(value["owner"]["token"]
        .as_str()
        .is_some_and(|token| token.starts_with("local|")));

    let again = sandbox.run(&["init", path_str(&sandbox.db_path())]);
    assert_eq!(again.status.code(), Some(4));
}

#[test]
fn test_cli_add_log_status_flow() {
    let sandbox = Sandbox::new();
    sandbox.init();

    let water = sandbox.add_entity(&[
        "Water",
        "--category",
        "care",
        "--type",
        "genericCompletion",
        "--required",
        "--required-completions",
        "2",
    ]);
    sandbox.add_entity(&[
        "Stretch",
        "--category",
        "care",
        "--type",
        "generic-completion",
        "--required-completions",
        "1",
    ]);
    sandbox.add_entity(&[
        "Kanji",
        "--category",
        "learning",
        "--type",
        "flashCards",
        "--required",
    ]);

    let status = sandbox.run_json(&["status", "--json"]);
    assert_eq!(category_ratio(&status, "care"), 0.0);

    sandbox.run_ok(&["log", "water"]);
    let status = sandbox.run_json(&["status", "--json"]);
    assert_eq!(category_ratio(&status, "care"), 0.5);

    let output = sandbox.run_ok(&["log", &water]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Updated Water"), "stdout={}", stdout);
    assert!(stdout.contains("2/2 completions"), "stdout={}", stdout);

    let status = sandbox.run_json(&["status", "--json"]);
    assert_eq!(category_ratio(&status, "care"), 1.0);
    assert_eq!(category_ratio(&status, "learning"), 0.0);

    sandbox.run_ok(&["log", "kanji", "--reviewed", "99", "--correct", "90"]);
    let status = sandbox.run_json(&["status", "--json"]);
    assert_eq!(category_ratio(&status, "learning"), 0.0);

    sandbox.run_ok(&["log", "kanji", "--reviewed", "100"]);
    let status = sandbox.run_json(&["status", "--json", "--category", "learning"]);
    assert_eq!(status["categories"].as_array().map(Vec::len), Some(1));
    assert_eq!(category_ratio(&status, "learning"), 1.0);

    let events = sandbox.run_json(&["events", "water", "--json"]);
    let events = events.as_array().expect("events array");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["details"]["type"], "genericCompletion");
    assert_eq!(events[0]["details"]["payload"]["numCompletions"], 2);
}

#[test]
fn test_cli_entity_list_show_edit() {
    let sandbox = Sandbox::new();
    sandbox.init();

    let id = sandbox.add_entity(&[
        "Squats",
        "--category",
        "exercise",
        "--type",
        "workout",
        "--field",
        "numSets,numReps",
        "--interval",
        "weekly",
    ]);

    let list = sandbox.run_json(&["entity", "list", "--json", "--type", "workout"]);
    let list = list.as_array().expect("entity array");
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], id.as_str());
    assert_eq!(list[0]["resetAfterInterval"], "weekly");

    let show = sandbox.run_ok(&["entity", "show", "squats"]);
    let stdout = String::from_utf8_lossy(&show.stdout);
    assert!(stdout.contains("Name: Squats"));
    assert!(stdout.contains("Resets: weekly"));
    assert!(stdout.contains("Current: nothing logged"));

    sandbox.run_ok(&["entity", "edit", &id, "--name", "Back Squats", "--required"]);
    let detail = sandbox.run_json(&["entity", "show", &id, "--json"]);
    assert_eq!(detail["entity"]["name"], "Back Squats");
    assert_eq!(detail["entity"]["isRequired"], true);
    assert_eq!(detail["isDone"], false);

    let changed = sandbox.run(&["entity", "edit", &id, "--category", "care"]);
    assert_eq!(changed.status.code(), Some(4));

    let nothing = sandbox.run(&["entity", "edit", &id]);
    assert_eq!(nothing.status.code(), Some(4));
}

#[test]
fn test_cli_rejects_invalid_category_for_type() {
    let sandbox = Sandbox::new();
    sandbox.init();

    let output = sandbox.run(&[
        "entity",
        "add",
        "Kanji",
        "--category",
        "exercise",
        "--type",
        "flashCards",
    ]);
    assert_eq!(output.status.code(), Some(4));

    let list = sandbox.run_json(&["entity", "list", "--json"]);
    assert!(list.as_array().expect("entity array").is_empty());
}

#[test]
fn test_cli_log_rejects_flags_for_other_types() {
    let sandbox = Sandbox::new();
    sandbox.init();
    sandbox.add_entity(&["Run", "--category", "exercise", "--type", "workout"]);

    let output = sandbox.run(&["log", "run", "--reviewed", "10"]);
    assert_eq!(output.status.code(), Some(4));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--reviewed"));

    sandbox.run_ok(&["log", "run", "--distance", "5.2", "--duration", "1800"]);
    let status = sandbox.run_json(&["status", "--json"]);
    assert_eq!(category_ratio(&status, "exercise"), 1.0);
}

#[test]
fn test_cli_backdated_event_is_immutable() {
    let sandbox = Sandbox::new();
    sandbox.init();
    sandbox.add_entity(&[
        "Floss",
        "--category",
        "care",
        "--type",
        "genericCompletion",
        "--required-completions",
        "1",
    ]);

    sandbox.run_ok(&["log", "floss", "--at", "2024-01-10"]);
    let duplicate = sandbox.run(&["log", "floss", "--at", "2024-01-10"]);
    assert_eq!(duplicate.status.code(), Some(4));

    let events = sandbox.run_json(&["events", "floss", "--json"]);
    let event_id = events[0]["id"].as_str().expect("event id").to_string();

    let delete = sandbox.run(&["events", "delete", &event_id]);
    assert_eq!(delete.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&delete.stderr).contains("already ended"));

    sandbox.run_ok(&["log", "floss"]);
    let events = sandbox.run_json(&["events", "floss", "--json"]);
    let current_id = events[0]["id"].as_str().expect("event id").to_string();
    sandbox.run_ok(&["events", "delete", &current_id]);

    let events = sandbox.run_json(&["events", "floss", "--json"]);
    assert_eq!(events.as_array().map(Vec::len), Some(1));

    let regroup = sandbox.run(&["entity", "edit", "floss", "--interval", "weekly"]);
    assert_eq!(regroup.status.code(), Some(4));
    let detail = sandbox.run_json(&["entity", "show", "floss", "--json"]);
    assert_eq!(detail["entity"]["resetAfterInterval"], "daily");
}

#[test]
fn test_cli_status_warns_about_misconfigured_entities() {
    let sandbox = Sandbox::new();
    sandbox.init();

    let add = sandbox.run_ok(&[
        "entity",
        "add",
        "Journal",
        "--category",
        "thinking",
        "--type",
        "genericCompletion",
    ]);
    assert!(String::from_utf8_lossy(&add.stderr).contains("Warning"));

    let status = sandbox.run_ok(&["status"]);
    let stderr = String::from_utf8_lossy(&status.stderr);
    assert!(stderr.contains("Warning"));
    assert!(stderr.contains("Journal"));
    let stdout = String::from_utf8_lossy(&status.stdout);
    assert!(stdout.contains("Thinking"));
}

#[test]
fn test_cli_missing_config_message() {
    let sandbox = Sandbox::new();

    let output = sandbox.run(&["status"]);
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    let expected = sandbox.config_home().join("dailies").join("config.toml");
    assert!(stderr.contains("No config found at"));
    assert!(stderr.contains(path_str(&expected)));
    assert!(stderr.contains("dailies init"));
}

#[test]
fn test_cli_missing_database_message() {
    let sandbox = Sandbox::new();
    let missing = sandbox.root.path().join("missing.db");

    let output = sandbox.run(&["status", "--db", path_str(&missing)]);
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No database found at"));
    assert!(stderr.contains(path_str(&missing)));
}

#[test]
fn test_cli_unknown_entity_is_not_found() {
    let sandbox = Sandbox::new();
    sandbox.init();

    let output = sandbox.run(&["log", "nothing-here"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_cli_check_and_completions() {
    let sandbox = Sandbox::new();
    sandbox.init();

    let check = sandbox.run_ok(&["check"]);
    assert!(String::from_utf8_lossy(&check.stdout).contains("Integrity check: OK"));

    let completions = sandbox.run_ok(&["completions", "bash"]);
    assert!(String::from_utf8_lossy(&completions.stdout).contains("dailies"));
}
