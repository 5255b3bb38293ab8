//! Document preparation before directive compilation.

use std::sync::LazyLock;

use minify_html::Cfg;
use regex::{Captures, Regex};

use crate::settings::MinifySettings;

/// A directive holding a `/* ... */` comment. The comment body may not
/// contain `*`: such directives are left for the compiler, which drops the
/// comment but keeps the rest of the directive.
static DIRECTIVE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{[^{]*(/\*[^*]*\*/)[^}]*\}\}").unwrap());

/// An opening tag.
static START_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[A-Za-z][^<>]*>").unwrap());

/// A quoted run inside a tag, or an unquoted attribute value holding a
/// directive (group 1).
static ATTRIBUTE_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""[^"]*"|'[^']*'|=([^\s"'<>=`]*\{\{[^\s"'<>`]*)"#).unwrap()
});

/// Run every preparation step, in order.
pub fn preprocess(text: &str, minify: &MinifySettings) -> String {
    let text = strip_directive_comments(text);
    let text = minify_markup(&text, minify);
    escape_backticks(&text)
}

/// Delete whole directives that carry a comment.
pub fn strip_directive_comments(text: &str) -> String {
    DIRECTIVE_COMMENT.replace_all(text, "").into_owned()
}

/// Minify HTML, and the CSS/JS inside it when enabled, leaving `{{ ... }}`
/// untouched.
pub fn minify_markup(text: &str, settings: &MinifySettings) -> String {
    if !settings.enabled {
        return text.to_string();
    }

    let mut cfg = Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = settings.keep_comments;
    cfg.minify_css = settings.css;
    cfg.minify_js = settings.js;
    cfg.preserve_brace_template_syntax = true;

    let minified = minify_html::minify(text.as_bytes(), &cfg);
    quote_directive_attributes(&String::from_utf8_lossy(&minified))
}

/// Put quotes back around attribute values that contain a directive. The
/// minifier drops them when the raw value has no spaces, but the rendered
/// value may have some.
pub fn quote_directive_attributes(text: &str) -> String {
    START_TAG
        .replace_all(text, |tag: &Captures<'_>| {
            ATTRIBUTE_VALUE
                .replace_all(&tag[0], |value: &Captures<'_>| match value.get(1) {
                    Some(bare) => format!("=\"{}\"", bare.as_str()),
                    None => value[0].to_string(),
                })
                .into_owned()
        })
        .into_owned()
}

/// Literal text ends up inside JavaScript template literals.
pub fn escape_backticks(text: &str) -> String {
    text.replace('`', "\\`")
}
