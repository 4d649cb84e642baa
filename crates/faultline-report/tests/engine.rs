//! End-to-end pipeline tests: classify, select, resolve, render, reload.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Map;

use faultline_core::{EngineConfig, ErrorCategory, Severity};
use faultline_report::{spawn_reload_loop, ChangeEvent, ChangeKind, Engine};

fn write_template(dir: &Path, name: &str, yaml: &str) -> PathBuf {
    let path = dir.join(format!("{name}.yaml"));
    fs::write(&path, yaml).unwrap();
    path
}

fn engine_with_dir(dir: &Path) -> Engine {
    let config = EngineConfig {
        template_dirs: vec![dir.to_path_buf()],
        ..EngineConfig::default()
    };
    Engine::new(config).unwrap()
}

#[test]
fn test_full_pipeline_typescript() {
    let dir = tempfile::tempdir().unwrap();
    write_template(
        dir.path(),
        "typescript",
        "category: typescript\nagent: debug-specialist\ntemplate: |\n  ## Report\n  {{ error_text }}\n  Codes: {% for c in error_codes %}{{ c }}{% endfor %}\n",
    );
    let engine = engine_with_dir(dir.path());

    let text = "TS2322: Type 'string' is not assignable to type 'number'.";
    let (matches, info) = engine.classify_and_extract(text, 0.1);
    assert_eq!(matches[0].category, ErrorCategory::TypeScript);
    assert!(matches[0].severity >= Severity::High);
    assert!(info.error_codes.contains(&"2322".to_string()));
    assert!(!info.suggestions.is_empty());

    let name = engine.select_template(&matches);
    assert_eq!(name, "typescript");

    let mut context = Map::new();
    context.insert("error_text".to_string(), text.into());
    context.insert(
        "error_codes".to_string(),
        serde_json::to_value(&info.error_codes).unwrap(),
    );
    let report = engine.render_report(&name, &context).unwrap();
    assert!(report.contains("TS2322"));
    assert!(report.contains("2322"));
}

#[test]
fn test_empty_input_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with_dir(dir.path());

    let (matches, info) = engine.classify_and_extract("", 0.3);
    assert!(matches.is_empty());
    assert!(info.is_empty());

    // No template on disk at all: the built-in general fallback renders.
    assert_eq!(engine.select_template(&matches), "general");
    let report = engine.render_report("general", &Map::new()).unwrap();
    assert!(!report.trim().is_empty());
}

#[test]
fn test_cycle_renders_with_verbose_note() {
    let dir = tempfile::tempdir().unwrap();
    write_template(dir.path(), "a", "extends: b\ntemplate: |\n  ## A\n  body a\n");
    write_template(dir.path(), "b", "extends: a\ntemplate: |\n  ## B\n  body b\n");
    let engine = engine_with_dir(dir.path());

    assert_eq!(engine.template_diagnostics().len(), 1);

    // Bounded resolution: deps were cleared, body a still renders.
    let mut context = Map::new();
    context.insert("verbose".to_string(), true.into());
    let report = engine.render_report("a", &context).unwrap();
    assert!(report.contains("body a"));
    assert!(!report.contains("body b"));
    assert!(report.contains("cycle"));
}

#[test]
fn test_reload_invalidates_descendants() {
    let dir = tempfile::tempdir().unwrap();
    let base = write_template(
        dir.path(),
        "base",
        "template: |\n  ## Summary\n  old scaffold\n",
    );
    write_template(
        dir.path(),
        "child",
        "extends: base\ntemplate: |\n  ## Extra\n  child section\n",
    );
    let engine = engine_with_dir(dir.path());

    let before = engine.render_report("child", &Map::new()).unwrap();
    assert!(before.contains("old scaffold"));

    fs::write(&base, "template: |\n  ## Summary\n  new scaffold\n").unwrap();
    let stale = engine.reload_template(&base).unwrap();
    assert!(stale.contains(&"base".to_string()));
    assert!(stale.contains(&"child".to_string()));

    let after = engine.render_report("child", &Map::new()).unwrap();
    assert!(after.contains("new scaffold"));
    assert!(after.contains("child section"));
}

#[test]
fn test_reload_user_parent_refreshes_dependents() {
    // The parent only exists in the user directory, so `child` names it by
    // its bare name while the store keys it `user.base`.
    let builtin = tempfile::tempdir().unwrap();
    let user = tempfile::tempdir().unwrap();
    write_template(
        builtin.path(),
        "child",
        "extends: base\ntemplate: |\n  ## Child\n  child section\n",
    );
    let base = write_template(
        user.path(),
        "base",
        "template: |\n  ## Summary\n  old scaffold\n",
    );

    let config = EngineConfig {
        template_dirs: vec![builtin.path().to_path_buf()],
        user_template_dir: Some(user.path().to_path_buf()),
        ..EngineConfig::default()
    };
    let engine = Engine::new(config).unwrap();

    let before = engine.render_report("child", &Map::new()).unwrap();
    assert!(before.contains("old scaffold"));

    fs::write(&base, "template: |\n  ## Summary\n  new scaffold\n").unwrap();
    let stale = engine.reload_template(&base).unwrap();
    assert!(stale.contains(&"child".to_string()));

    let after = engine.render_report("child", &Map::new()).unwrap();
    assert!(after.contains("new scaffold"));
    assert!(after.contains("child section"));
}

#[test]
fn test_user_template_shadowing_via_engine() {
    let builtin = tempfile::tempdir().unwrap();
    let user = tempfile::tempdir().unwrap();
    write_template(builtin.path(), "network", "template: builtin network\n");
    write_template(user.path(), "custom", "template: user custom\n");

    let config = EngineConfig {
        template_dirs: vec![builtin.path().to_path_buf()],
        user_template_dir: Some(user.path().to_path_buf()),
        ..EngineConfig::default()
    };
    let engine = Engine::new(config).unwrap();

    let report = engine.render_report("custom", &Map::new()).unwrap();
    assert!(report.contains("user custom"));
    let report = engine.render_report("network", &Map::new()).unwrap();
    assert!(report.contains("builtin network"));
}

#[test]
fn test_broken_template_falls_back_to_general() {
    let dir = tempfile::tempdir().unwrap();
    write_template(dir.path(), "broken", "template: \"{% if unclosed %}\"\n");
    let engine = engine_with_dir(dir.path());

    let mut context = Map::new();
    context.insert("verbose".to_string(), true.into());
    let report = engine.render_report("broken", &context).unwrap();
    assert!(report.contains("Debug Report"));
    assert!(report.contains("used general fallback"));
}

#[test]
fn test_validate_template() {
    let dir = tempfile::tempdir().unwrap();
    write_template(dir.path(), "ok", "template: fine\n");
    write_template(dir.path(), "dangling", "extends: ghost\ntemplate: body\n");
    let engine = engine_with_dir(dir.path());

    assert!(engine.validate_template("ok").is_empty());
    assert!(!engine.validate_template("dangling").is_empty());
    assert!(!engine.validate_template("missing").is_empty());
}

#[test]
fn test_list_templates() {
    let dir = tempfile::tempdir().unwrap();
    write_template(dir.path(), "b", "category: network\ntemplate: x\n");
    write_template(dir.path(), "a", "category: memory\ntemplate: y\n");
    let engine = engine_with_dir(dir.path());

    let all = engine.list_templates(None);
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].name, "a");
    assert_eq!(engine.list_templates(Some("network")).len(), 1);
}

#[test]
fn test_reload_loop_applies_change_events() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_template(dir.path(), "live", "template: first version\n");
    let engine = Arc::new(engine_with_dir(dir.path()));

    let before = engine.render_report("live", &Map::new()).unwrap();
    assert!(before.contains("first version"));

    let (tx, rx) = crossbeam_channel::unbounded();
    let handle = spawn_reload_loop(Arc::clone(&engine), rx);

    fs::write(&path, "template: second version\n").unwrap();
    tx.send(ChangeEvent {
        path: path.clone(),
        kind: ChangeKind::Modified,
    })
    .unwrap();
    // Duplicate save events inside the debounce window collapse.
    tx.send(ChangeEvent {
        path: path.clone(),
        kind: ChangeKind::Modified,
    })
    .unwrap();
    drop(tx);
    handle.join().unwrap();

    let after = engine.render_report("live", &Map::new()).unwrap();
    assert!(after.contains("second version"));
}

#[test]
fn test_scan_file_through_engine() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("app.log");
    fs::write(&log, "ReferenceError: foo is not defined\n").unwrap();
    let engine = engine_with_dir(dir.path());

    let options = faultline_analysis::ScanOptions::default();
    let outcome = engine.scan_file(&log, &options).unwrap();
    assert_eq!(outcome.matches[0].category, ErrorCategory::JavaScript);
    assert!(Duration::from_secs(0) < engine.config().debounce_window());
}
