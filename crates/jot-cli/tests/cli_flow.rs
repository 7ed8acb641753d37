use std::fs;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jot_cli::cli::Invocation;
use jot_cli::commands::dispatch;
use jot_cli::config::Config;
use jot_cli::datastore::FileStore;
use jot_cli::open_list;
use jot_cli::prompt::EditPrompt;
use jot_cli::render::Renderer;
use jot_core::{EditRequest, EditResponse};
use tempfile::tempdir;

struct Scripted(Vec<EditResponse>);

impl EditPrompt for Scripted {
    fn ask(&mut self, _request: &EditRequest) -> anyhow::Result<EditResponse> {
        Ok(self.0.remove(0))
    }
}

fn config() -> Config {
    let mut cfg = Config::defaults();
    cfg.apply_overrides([("rc.remove.delay".to_string(), "0".to_string())]);
    cfg
}

fn at(seconds: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap() + Duration::seconds(seconds)
}

fn run(
    dir: &std::path::Path,
    cfg: &Config,
    prompt: &mut dyn EditPrompt,
    args: &[&str],
    now: DateTime<Utc>,
) -> String {
    let store = FileStore::open(dir).expect("open store");
    let mut list = open_list(store, cfg).expect("open list");
    let mut renderer = Renderer::with_writer(Vec::new());
    let inv = Invocation::parse(cfg, args.iter().map(Into::into).collect()).expect("parse");

    dispatch(&mut list, cfg, &mut renderer, prompt, inv, now).expect("dispatch");
    String::from_utf8(renderer.into_inner()).expect("utf8")
}

fn first_id(output: &str) -> u64 {
    output
        .trim()
        .trim_start_matches("Created item ")
        .trim_end_matches('.')
        .parse()
        .expect("created id")
}

#[test]
fn add_toggle_filter_and_sort_through_the_file_store() {
    let temp = tempdir().expect("tempdir");
    let cfg = config();
    let mut prompt = Scripted(vec![]);

    let a = first_id(&run(temp.path(), &cfg, &mut prompt, &["add", "A"], at(0)));
    run(temp.path(), &cfg, &mut prompt, &["add", "B"], at(1));
    assert_eq!(
        run(temp.path(), &cfg, &mut prompt, &["toggle", &a.to_string()], at(2)).trim(),
        format!("Completed item {a}.")
    );

    let listing = run(temp.path(), &cfg, &mut prompt, &["list", "filter:completed"], at(3));
    assert!(listing.contains("[x]"));
    assert!(listing.contains(" A "));
    assert!(!listing.contains(" B "));
    assert!(listing.contains("1 of 2 item(s), filter:completed sort:newest"));

    let sorted = run(temp.path(), &cfg, &mut prompt, &["li", "sort:a-z"], at(4));
    let a_pos = sorted.find(" A ").expect("A listed");
    let b_pos = sorted.find(" B ").expect("B listed");
    assert!(a_pos < b_pos);

    let raw = fs::read_to_string(temp.path().join("todos.json")).expect("read store");
    let stored: serde_json::Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(stored[0]["text"], "B");
    assert_eq!(stored[1]["text"], "A");
    assert_eq!(stored[1]["completed"], true);
}

#[test]
fn blank_add_reports_and_writes_nothing() {
    let temp = tempdir().expect("tempdir");
    let cfg = config();
    let mut prompt = Scripted(vec![]);

    let out = run(temp.path(), &cfg, &mut prompt, &["add", "   "], at(0));
    assert_eq!(out.trim(), "Nothing to add.");
    assert!(!temp.path().join("todos.json").exists());
}

#[test]
fn edit_prompts_when_no_text_is_given() {
    let temp = tempdir().expect("tempdir");
    let cfg = config();
    let mut prompt = Scripted(vec![
        EditResponse::Cancel,
        EditResponse::Replace("  ".to_string()),
        EditResponse::Replace("Walk the dog".to_string()),
    ]);

    let id = first_id(&run(temp.path(), &cfg, &mut prompt, &["add", "Walk", "dog"], at(0)));
    let id_arg = id.to_string();

    for expected in ["unchanged", "unchanged", "Updated"] {
        let out = run(temp.path(), &cfg, &mut prompt, &["edit", &id_arg], at(1));
        assert!(out.contains(expected), "{out}");
    }

    let shown = run(temp.path(), &cfg, &mut prompt, &[&id_arg], at(2));
    assert!(shown.contains("text       Walk the dog"));
}

#[test]
fn delete_reports_missing_ids_and_removes_existing_ones() {
    let temp = tempdir().expect("tempdir");
    let cfg = config();
    let mut prompt = Scripted(vec![]);

    let id = first_id(&run(temp.path(), &cfg, &mut prompt, &["add", "Buy", "milk"], at(0)));
    let out = run(
        temp.path(),
        &cfg,
        &mut prompt,
        &["delete", &id.to_string(), "99"],
        at(1),
    );
    assert!(out.contains("No item 99."));
    assert!(out.contains(&format!("Removing {id} Buy milk")));
    assert!(out.contains("Deleted 1 item(s)."));

    let listing = run(temp.path(), &cfg, &mut prompt, &["list"], at(2));
    assert_eq!(listing.trim(), "No items.");
}

#[test]
fn delete_names_items_hidden_by_the_view() {
    let temp = tempdir().expect("tempdir");
    let mut cfg = config();
    cfg.apply_overrides([("rc.view.filter".to_string(), "completed".to_string())]);
    let mut prompt = Scripted(vec![]);

    let open = first_id(&run(temp.path(), &cfg, &mut prompt, &["add", "Call", "mom"], at(0)));
    let out = run(
        temp.path(),
        &cfg,
        &mut prompt,
        &["delete", &open.to_string(), &open.to_string()],
        at(1),
    );
    assert_eq!(out.matches("Removing").count(), 1);
    assert!(out.contains(&format!("Removing {open} Call mom")));
    assert!(out.contains("Deleted 1 item(s)."));
}

#[test]
fn corrupt_store_starts_empty_and_is_overwritten() {
    let temp = tempdir().expect("tempdir");
    fs::write(temp.path().join("todos.json"), "{oops").expect("seed corrupt file");
    let cfg = config();
    let mut prompt = Scripted(vec![]);

    assert_eq!(
        run(temp.path(), &cfg, &mut prompt, &["stats"], at(0)),
        "total      0\ncompleted  0\nremaining  0\n"
    );

    run(temp.path(), &cfg, &mut prompt, &["add", "fresh"], at(1));
    let exported = run(temp.path(), &cfg, &mut prompt, &["export"], at(2));
    let items: serde_json::Value = serde_json::from_str(&exported).expect("json");
    assert_eq!(items.as_array().map(Vec::len), Some(1));
}
