use std::fs;
use std::path::Path;

use bundler::preprocess::{
    escape_backticks, minify_markup, preprocess, quote_directive_attributes,
    strip_directive_comments,
};
use bundler::{BundleError, Bundler, MinifySettings, ResolvedRoute, Settings, compile_document};
use tmplc::{CompileError, CompileOptions};

const NO_MINIFY: &str = r#""minify": { "enabled": false }"#;

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn load(dir: &Path, settings_json: &str) -> Settings {
    write(dir, "settings.json", settings_json);
    Settings::load(&dir.join("settings.json")).expect("settings failed to load")
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[test]
fn json_settings_with_routers() {
    let settings = Settings::from_json(
        r#"{
            "templates": ["templates"],
            "compiled_path": "dist/app.js",
            "layout": "main",
            "routers": [
                { "name": "site", "layout": "site", "Handle": { "/": { "page": "home" } } }
            ]
        }"#,
    )
    .unwrap();
    assert_eq!(settings.compiled_path, "dist/app.js");
    assert_eq!(settings.routers[0].handle["/"].page, "home");
    assert!(settings.minify.enabled);
    assert!(!settings.minify.js);
}

#[test]
fn toml_settings() {
    let settings = Settings::from_toml(
        r#"
templates = ["a.html"]
compiled_path = "out.js"
registry = "app"

[minify]
enabled = false

[[routers]]
name = "docs"
[routers.handle."/docs"]
layout = "wide"
page = "docs"
"#,
    )
    .unwrap();
    assert_eq!(settings.compile_options().registry, "app");
    assert!(!settings.minify.enabled);
    assert_eq!(
        settings.routers[0].handle["/docs"].layout.as_deref(),
        Some("wide")
    );
}

#[test]
fn settings_without_compiled_path_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "settings.json", r#"{ "templates": [] }"#);
    let err = Settings::load(&dir.path().join("settings.json")).unwrap_err();
    assert!(matches!(err, BundleError::Settings { .. }), "got: {}", err);
}

#[test]
fn directories_expand_to_sorted_template_files() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "t/b.html", "");
    write(dir.path(), "t/a.tmpl", "");
    write(dir.path(), "t/nested/c.gohtml", "");
    write(dir.path(), "t/readme.md", "");
    let settings = load(
        dir.path(),
        r#"{ "templates": ["t"], "compiled_path": "out.js" }"#,
    );

    let names: Vec<String> = settings
        .template_paths()
        .unwrap()
        .iter()
        .map(|p| {
            p.strip_prefix(dir.path().join("t"))
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    assert_eq!(names, ["a.tmpl", "b.html", "nested/c.gohtml"]);
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

#[test]
fn commented_directives_are_removed_whole() {
    assert_eq!(
        strip_directive_comments("a{{ .Name /* who */ }}b"),
        "ab"
    );
    assert_eq!(
        strip_directive_comments("a{{/* note */}}b{{.X}}"),
        "ab{{.X}}"
    );
}

#[test]
fn comment_containing_asterisk_survives_preprocessing() {
    let text = "a{{ .Name /* 2 * 3 */ }}b";
    assert_eq!(strip_directive_comments(text), text);
}

#[test]
fn backticks_are_escaped() {
    assert_eq!(escape_backticks("say `hi`"), "say \\`hi\\`");
}

#[test]
fn preprocess_without_minify() {
    let minify = MinifySettings {
        enabled: false,
        ..MinifySettings::default()
    };
    assert_eq!(
        preprocess("<p>\n  `x` {{/* gone */}}{{.Y}}\n</p>", &minify),
        "<p>\n  \\`x\\` {{.Y}}\n</p>"
    );
}

#[test]
fn minify_keeps_directives() {
    let minified = minify_markup(
        "<div>\n    <p>{{ .Name }}</p>\n</div>",
        &MinifySettings::default(),
    );
    assert!(minified.contains("{{ .Name }}"), "got: {}", minified);
    assert!(!minified.contains('\n'), "got: {}", minified);
}

#[test]
fn directive_attribute_values_stay_quoted() {
    let minify = MinifySettings::default();

    let link = preprocess(r#"<a href="{{.URL}}" class="x y">{{.Name}}</a>"#, &minify);
    assert!(link.contains(r#"href="{{.URL}}""#), "got: {}", link);
    assert!(link.contains(r#"class="x y""#), "got: {}", link);
    assert!(link.contains(">{{.Name}}</a>"), "got: {}", link);

    let input = preprocess(r#"<input value="{{.V}}">"#, &minify);
    assert!(input.contains(r#"value="{{.V}}""#), "got: {}", input);

    let div = preprocess(r#"<div class="{{.Cls}}"></div>"#, &minify);
    assert!(div.contains(r#"class="{{.Cls}}""#), "got: {}", div);
}

#[test]
fn quoting_leaves_text_and_quoted_values_alone() {
    assert_eq!(
        quote_directive_attributes(r#"<a href={{.URL}}/x title="q={{.Q}}">a={{.B}}</a>"#),
        r#"<a href="{{.URL}}/x" title="q={{.Q}}">a={{.B}}</a>"#
    );
    assert_eq!(
        quote_directive_attributes("<input value={{.V}}>"),
        r#"<input value="{{.V}}">"#
    );
}

#[test]
fn compiled_attribute_is_quoted() {
    let document = compile_document(
        Path::new("link.html").to_path_buf(),
        r#"<a class="{{.Classes}}">x</a>"#,
        &CompileOptions::default(),
        &MinifySettings::default(),
    )
    .unwrap();
    assert!(
        document.output.contains(r#"class="${$$.Classes}""#),
        "got: {}",
        document.output
    );
}

// ---------------------------------------------------------------------------
// Bundling
// ---------------------------------------------------------------------------

#[test]
fn build_concatenates_in_settings_order() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "templates/b.html", r#"{{define "b"}}<b>{{.}}</b>{{end}}"#);
    write(dir.path(), "templates/a.html", r#"{{define "a"}}`A`{{end}}"#);
    let settings = load(
        dir.path(),
        &format!(
            r#"{{ "templates": ["templates/b.html", "templates/a.html"], "compiled_path": "dist/js/app.js", {NO_MINIFY} }}"#
        ),
    );

    let (bundle, output_path) = Bundler::new(settings).build().unwrap();
    assert_eq!(output_path, dir.path().join("dist/js/app.js"));
    assert_eq!(bundle.documents.len(), 2);
    assert_eq!(
        fs::read_to_string(output_path).unwrap(),
        concat!(
            r#"customComponents.define("b",($,$$$)=>{let $$=$;return`<b>${$$}</b>`});"#,
            r#"customComponents.define("a",($,$$$)=>{let $$=$;return`\`A\``});"#
        )
    );
}

#[test]
fn unbalanced_end_writes_no_output() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "ok.html", r#"{{define "ok"}}fine{{end}}"#);
    write(dir.path(), "bad.html", "oops{{end}}");
    let settings = load(
        dir.path(),
        &format!(r#"{{ "templates": ["ok.html", "bad.html"], "compiled_path": "out/app.js", {NO_MINIFY} }}"#),
    );

    let err = Bundler::new(settings).build().unwrap_err();
    match err {
        BundleError::Compile { path, error, .. } => {
            assert!(path.ends_with("bad.html"));
            assert_eq!(error, CompileError::UnbalancedEnd { span: 4..11 });
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(!dir.path().join("out/app.js").exists());
    assert!(!dir.path().join("out").exists());
}

#[test]
fn missing_template_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let settings = load(
        dir.path(),
        r#"{ "templates": ["nope.html"], "compiled_path": "out.js" }"#,
    );
    assert!(matches!(
        Bundler::new(settings).compile(),
        Err(BundleError::Read { .. })
    ));
}

#[test]
fn warnings_are_kept_per_document() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "w.html", "{{len .X}}{{.Y}}");
    let settings = load(
        dir.path(),
        &format!(r#"{{ "templates": ["w.html"], "compiled_path": "out.js", {NO_MINIFY} }}"#),
    );
    let bundle = Bundler::new(settings).compile().unwrap();
    assert_eq!(bundle.warning_count(), 1);
    assert_eq!(bundle.artifact(), "${$$.Y}");
}

// ---------------------------------------------------------------------------
// Serve mode
// ---------------------------------------------------------------------------

fn routed_settings() -> Settings {
    Settings::from_json(
        r#"{
            "templates": [],
            "compiled_path": "out.js",
            "layout": "base",
            "routers": [
                {
                    "name": "site",
                    "layout": "site",
                    "handle": {
                        "/": { "page": "home" },
                        "/print": { "layout": "bare", "page": "printable" }
                    }
                }
            ]
        }"#,
    )
    .unwrap()
}

#[test]
fn route_layout_precedence() {
    let settings = routed_settings();
    assert_eq!(
        settings.resolve_route(Some("/"), None, None),
        ResolvedRoute {
            layout: Some("site".into()),
            page: Some("home".into())
        }
    );
    assert_eq!(
        settings.resolve_route(Some("/print"), None, None).layout.as_deref(),
        Some("bare")
    );
    assert_eq!(
        settings.resolve_route(Some("/missing"), None, None),
        ResolvedRoute {
            layout: Some("base".into()),
            page: None
        }
    );
    assert_eq!(
        settings.resolve_route(Some("/"), Some("other"), Some("about")),
        ResolvedRoute {
            layout: Some("other".into()),
            page: Some("about".into())
        }
    );
}

#[test]
fn bootstrap_renders_layout_with_page_context() {
    let route = ResolvedRoute {
        layout: Some("site".into()),
        page: Some("home".into()),
    };
    assert_eq!(
        route.bootstrap("customComponents").unwrap().as_deref(),
        Some(r#"customComponents.render("site",{"PageTemplate":"home","Data":{}});"#)
    );
    assert_eq!(ResolvedRoute::default().bootstrap("x").unwrap(), None);
}

#[test]
fn serve_writes_artifact_then_bootstrap() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "site.html", r#"{{define "site"}}{{template .PageTemplate}}{{end}}"#);
    let settings = load(
        dir.path(),
        &format!(r#"{{ "templates": ["site.html"], "compiled_path": "out.js", "layout": "site", {NO_MINIFY} }}"#),
    );
    let route = settings.resolve_route(None, None, Some("home"));

    let mut out = Vec::new();
    Bundler::new(settings).serve(&route, &mut out).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        concat!(
            r#"customComponents.define("site",($,$$$)=>{let $$=$;return`${customComponents.render($$.PageTemplate)}`});"#,
            r#"customComponents.render("site",{"PageTemplate":"home","Data":{}});"#
        )
    );
    assert!(!dir.path().join("out.js").exists());
}
