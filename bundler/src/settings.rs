use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;
use tmplc::CompileOptions;

use crate::error::BundleError;

/// File extensions picked up when a `templates` entry names a directory.
const TEMPLATE_EXTENSIONS: &[&str] = &["html", "tmpl", "gohtml"];

/// Project settings, read from `settings.json` or a TOML equivalent.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Template files or directories, relative to the settings file.
    #[serde(default)]
    pub templates: Vec<String>,

    /// Destination of the compiled artifact, relative to the settings file.
    pub compiled_path: String,

    /// Default layout for serve mode.
    #[serde(default)]
    pub layout: Option<String>,

    #[serde(default)]
    pub routers: Vec<Router>,

    /// Component registry object the generated code talks to.
    #[serde(default)]
    pub registry: Option<String>,

    #[serde(default)]
    pub minify: MinifySettings,

    #[serde(skip)]
    base_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Router {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub layout: Option<String>,
    /// Request path → route.
    #[serde(default, alias = "Handle")]
    pub handle: BTreeMap<String, Route>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub layout: Option<String>,
    pub page: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MinifySettings {
    pub enabled: bool,
    /// Minify `<style>` contents and `style` attributes.
    pub css: bool,
    /// Minify `<script>` contents. Off unless asked for: scripts may carry
    /// directives the JS minifier does not understand.
    pub js: bool,
    pub keep_comments: bool,
}

impl Default for MinifySettings {
    fn default() -> Self {
        MinifySettings {
            enabled: true,
            css: true,
            js: false,
            keep_comments: false,
        }
    }
}

impl Settings {
    /// Load settings from disk. `.toml` files are read as TOML, everything
    /// else as JSON. Relative paths inside resolve against the file's
    /// directory.
    pub fn load(path: &Path) -> Result<Settings, BundleError> {
        let text = fs::read_to_string(path).map_err(|source| BundleError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let is_toml = path.extension().is_some_and(|ext| ext == "toml");
        let parsed = if is_toml {
            Settings::from_toml(&text)
        } else {
            Settings::from_json(&text)
        };
        let settings = parsed.map_err(|message| BundleError::Settings {
            path: path.to_path_buf(),
            message,
        })?;

        let base_dir = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        debug!("loaded settings from '{}'", path.display());
        Ok(settings.with_base_dir(base_dir))
    }

    pub fn from_json(text: &str) -> Result<Settings, String> {
        serde_json::from_str(text).map_err(|e| e.to_string())
    }

    pub fn from_toml(text: &str) -> Result<Settings, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn output_path(&self) -> PathBuf {
        self.base_dir.join(&self.compiled_path)
    }

    pub fn compile_options(&self) -> CompileOptions {
        match &self.registry {
            Some(registry) => CompileOptions {
                registry: registry.clone(),
            },
            None => CompileOptions::default(),
        }
    }

    /// Expand `templates` into concrete files, keeping the listed order.
    /// Directories contribute their template files, recursively, sorted by
    /// path.
    pub fn template_paths(&self) -> Result<Vec<PathBuf>, BundleError> {
        let mut paths = Vec::new();
        for entry in &self.templates {
            let path = self.base_dir.join(entry);
            if path.is_dir() {
                let mut found = Vec::new();
                collect_templates(&path, &mut found)?;
                found.sort();
                paths.extend(found);
            } else {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

fn collect_templates(dir: &Path, found: &mut Vec<PathBuf>) -> Result<(), BundleError> {
    let read_err = |source| BundleError::Read {
        path: dir.to_path_buf(),
        source,
    };
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if path.is_dir() {
            collect_templates(&path, found)?;
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| TEMPLATE_EXTENSIONS.contains(&ext))
        {
            found.push(path);
        }
    }
    Ok(())
}
