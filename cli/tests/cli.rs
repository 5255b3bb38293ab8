use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn tmplc(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tmplc"))
        .arg("--no-color")
        .args(args)
        .output()
        .expect("failed to spawn tmplc")
}

fn project(dir: &Path, template: &str) -> String {
    fs::write(dir.join("page.html"), template).unwrap();
    let settings = dir.join("settings.json");
    fs::write(
        &settings,
        r#"{ "templates": ["page.html"], "compiled_path": "dist/app.js", "minify": { "enabled": false } }"#,
    )
    .unwrap();
    settings.to_string_lossy().into_owned()
}

#[test]
fn golden_files_pass() {
    let golden = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/golden");
    let output = tmplc(&["test", golden]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "{}", stderr);
    assert!(stderr.contains("10 passed, 0 failed"), "{}", stderr);
}

#[test]
fn compile_prints_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("card.html");
    fs::write(&file, r#"{{define "card"}}<b>{{.Title}}</b>{{end}}"#).unwrap();

    let output = tmplc(&["compile", "--no-minify", file.to_str().unwrap()]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        r#"customComponents.define("card",($,$$$)=>{let $$=$;return`<b>${$$.Title}</b>`});"#
    );
}

#[test]
fn flat_flags_build() {
    let dir = tempfile::tempdir().unwrap();
    let settings = project(dir.path(), r#"{{define "p"}}{{.}}{{end}}"#);

    let output = tmplc(&["-s", &settings]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        fs::read_to_string(dir.path().join("dist/app.js")).unwrap(),
        r#"customComponents.define("p",($,$$$)=>{let $$=$;return`${$$}`});"#
    );
}

#[test]
fn serve_flag_writes_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let settings = project(dir.path(), r#"{{define "p"}}P{{end}}"#);

    let output = tmplc(&["-s", &settings, "--serve", "--layout", "p"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        concat!(
            r#"customComponents.define("p",($,$$$)=>{let $$=$;return`P`});"#,
            r#"customComponents.render("p",{"PageTemplate":"","Data":{}});"#
        )
    );
    assert!(!dir.path().join("dist").exists());
}

#[test]
fn unbalanced_end_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let settings = project(dir.path(), "<p>{{end}}</p>");

    let output = tmplc(&["build", "-s", &settings]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("`end` has no open block to close"));
    assert!(!dir.path().join("dist/app.js").exists());
}

#[test]
fn misplaced_warning_fails_the_golden_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("late.test.html"),
        "---\n[[expect_warnings]]\ncontains = \"not a recognised expression\"\nline = 1\n---\n<p>\n{{len .Items}}</p>",
    )
    .unwrap();

    let output = tmplc(&["test", dir.path().to_str().unwrap()]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success(), "{}", stderr);
    assert!(
        stderr.contains("warning #1 sits on line 2, declared for line 1"),
        "{}",
        stderr
    );
    assert!(stderr.contains("emitted: `len` is not a recognised expression"), "{}", stderr);
}
