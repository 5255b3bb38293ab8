use std::path::{Path, PathBuf};

use serde::Deserialize;

use bundler::{BundleError, CompiledDocument, MinifySettings};
use tmplc::CompileOptions;

const TEST_SUFFIX: &str = ".test.html";

#[derive(Debug, Deserialize)]
pub struct ExpectedWarning {
    /// Substring that must appear in the warning message.
    pub contains: String,

    /// If set, the warning's span must start on this 1-based line of the
    /// preprocessed template.
    #[serde(default)]
    pub line: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Registry object name passed to the compiler.
    #[serde(default)]
    pub registry: Option<String>,

    /// Run the HTML minifier first. Off by default so expectations stay
    /// readable.
    #[serde(default)]
    pub minify: bool,

    /// Expected compiled output (trimmed comparison).
    #[serde(default)]
    pub expect_output: Option<String>,

    /// Expected compile error: its Display string must contain this.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// If present (even empty), warning count and content are checked.
    #[serde(default)]
    pub expect_warnings: Option<Vec<ExpectedWarning>>,
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

impl TestResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_name()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_suffix(TEST_SUFFIX))
                .unwrap_or("?")
        })
    }
}

/// Split a test file into its TOML frontmatter and the template after it.
fn split_frontmatter(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');
    let body = content
        .strip_prefix("---")
        .ok_or("missing opening --- frontmatter delimiter")?;
    let body = body.strip_prefix("\r\n").or_else(|| body.strip_prefix('\n')).unwrap_or(body);

    let (toml_str, rest) = body
        .split_once("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;
    let template = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: TestConfig = toml::from_str(toml_str.trim_end_matches('\r'))
        .map_err(|e| format!("TOML parse error: {}", e))?;
    Ok((config, template))
}

fn run_single_test(path: &Path) -> TestResult {
    let fail = |description: Option<String>, reason: String| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };
    let (config, template) = match split_frontmatter(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("frontmatter error: {}", e)),
    };

    let options = match &config.registry {
        Some(registry) => CompileOptions {
            registry: registry.clone(),
        },
        None => CompileOptions::default(),
    };
    let minify = MinifySettings {
        enabled: config.minify,
        ..MinifySettings::default()
    };
    let result = bundler::compile_document(path.to_path_buf(), template, &options, &minify);

    let description = config.description.clone();
    match check(&config, result) {
        None => TestResult {
            path: path.to_path_buf(),
            description,
            outcome: TestOutcome::Pass,
        },
        Some(reason) => fail(description, reason),
    }
}

/// Compare a compile result against the expectations. `Some(reason)` on
/// mismatch.
fn check(config: &TestConfig, result: Result<CompiledDocument, BundleError>) -> Option<String> {
    let document = match (&config.expect_error, result) {
        (Some(expected), Err(error)) => {
            let message = compile_message(&error);
            return (!message.contains(expected.as_str())).then(|| {
                format!("expected error containing \"{}\", got: {}", expected, message)
            });
        }
        (Some(expected), Ok(_)) => {
            return Some(format!(
                "expected error containing \"{}\", but compilation succeeded",
                expected
            ));
        }
        (None, Err(error)) => return Some(format!("unexpected error: {}", compile_message(&error))),
        (None, Ok(document)) => document,
    };

    if let Some(expected) = &config.expect_output {
        let actual = document.output.trim();
        if actual != expected.trim() {
            return Some(format!(
                "output mismatch\n  expected: {}\n  actual:   {}",
                expected.trim(),
                actual
            ));
        }
    }

    config
        .expect_warnings
        .as_deref()
        .and_then(|expected| check_warnings(&document, expected))
}

fn compile_message(error: &BundleError) -> String {
    match error {
        BundleError::Compile { error, .. } => error.to_string(),
        other => other.to_string(),
    }
}

/// 1-based line number of a byte offset.
fn line_of(text: &str, offset: usize) -> usize {
    text[..offset.min(text.len())].matches('\n').count() + 1
}

fn check_warnings(document: &CompiledDocument, expected: &[ExpectedWarning]) -> Option<String> {
    let actual = &document.warnings;
    let mut problems = Vec::new();

    if actual.len() != expected.len() {
        problems.push(format!(
            "{} warning(s) emitted, {} declared in frontmatter",
            actual.len(),
            expected.len()
        ));
    }

    for (n, (warning, wanted)) in actual.iter().zip(expected).enumerate() {
        let line = line_of(&document.text, warning.span.start);
        if !warning.message.contains(&wanted.contains) {
            problems.push(format!(
                "warning #{} (line {}) lacks \"{}\"",
                n + 1,
                line,
                wanted.contains
            ));
        }
        if let Some(want) = wanted.line.filter(|&want| want != line) {
            problems.push(format!(
                "warning #{} sits on line {}, declared for line {}",
                n + 1,
                line,
                want
            ));
        }
    }

    if problems.is_empty() {
        return None;
    }
    for warning in actual {
        problems.push(format!(
            "  emitted: {} (line {})",
            warning.message,
            line_of(&document.text, warning.span.start)
        ));
    }
    Some(problems.join("\n"))
}

fn discover(path: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(path) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            discover(&path, out);
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(TEST_SUFFIX))
        {
            out.push(path);
        }
    }
}

fn paint(text: &str, code: &str, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    }
}

/// Run one `.test.html` file, or every one beneath a directory. Returns the
/// process exit code.
pub fn run_tests(path: &Path, no_color: bool) -> i32 {
    let files = if path.is_file() {
        vec![path.to_path_buf()]
    } else {
        let mut files = Vec::new();
        discover(path, &mut files);
        files.sort();
        files
    };

    if files.is_empty() {
        eprintln!("no {} files found in {}", TEST_SUFFIX, path.display());
        return 1;
    }

    let mut failures = Vec::new();
    for file in &files {
        let result = run_single_test(file);
        match result.outcome {
            TestOutcome::Pass => eprintln!("  {}  {}", paint("PASS", "32", no_color), result.label()),
            TestOutcome::Fail(_) => {
                eprintln!("  {}  {}", paint("FAIL", "31", no_color), result.label());
                failures.push(result);
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for failure in &failures {
            eprintln!();
            eprintln!("  --- {} ---", failure.path.display());
            if let TestOutcome::Fail(reason) = &failure.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    let failed = failures.len();
    let passed = files.len() - failed;
    eprintln!();
    if failed == 0 {
        eprintln!("test result: {}. {} passed, 0 failed", paint("ok", "32", no_color), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            paint("FAILED", "31", no_color),
            passed,
            failed,
            files.len()
        );
        1
    }
}
