use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info};
use rayon::prelude::*;
use tmplc::{CompileOptions, Compiler, Warning};

use crate::error::BundleError;
use crate::preprocess::preprocess;
use crate::route::ResolvedRoute;
use crate::settings::{MinifySettings, Settings};

/// One compiled template.
#[derive(Debug, Clone)]
pub struct CompiledDocument {
    pub path: PathBuf,
    /// The preprocessed text the compiler saw; warning spans point into it.
    pub text: String,
    pub output: String,
    pub warnings: Vec<Warning>,
}

/// Every template of a project, compiled, in settings order.
#[derive(Debug, Clone, Default)]
pub struct Bundle {
    pub documents: Vec<CompiledDocument>,
}

impl Bundle {
    /// The concatenated artifact.
    pub fn artifact(&self) -> String {
        self.documents.iter().map(|d| d.output.as_str()).collect()
    }

    pub fn warning_count(&self) -> usize {
        self.documents.iter().map(|d| d.warnings.len()).sum()
    }
}

/// Preprocess and compile one template with its own compiler.
pub fn compile_document(
    path: PathBuf,
    raw: &str,
    options: &CompileOptions,
    minify: &MinifySettings,
) -> Result<CompiledDocument, BundleError> {
    let text = preprocess(raw, minify);
    match Compiler::new(options.clone()).compile(&text) {
        Ok(compiled) => {
            for warning in &compiled.warnings {
                debug!("{}: {}", path.display(), warning.message);
            }
            Ok(CompiledDocument {
                path,
                text,
                output: compiled.output,
                warnings: compiled.warnings,
            })
        }
        Err(error) => Err(BundleError::Compile { path, text, error }),
    }
}

/// Compiles a project's templates into one artifact.
pub struct Bundler {
    settings: Settings,
}

impl Bundler {
    pub fn new(settings: Settings) -> Self {
        Bundler { settings }
    }

    /// Read and compile every template. Documents are independent, so they
    /// compile in parallel; the first failure aborts the bundle.
    pub fn compile(&self) -> Result<Bundle, BundleError> {
        let paths = self.settings.template_paths()?;
        info!("compiling {} templates", paths.len());

        let sources = paths
            .into_iter()
            .map(|path| match fs::read_to_string(&path) {
                Ok(raw) => Ok((path, raw)),
                Err(source) => Err(BundleError::Read { path, source }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let options = self.settings.compile_options();
        let minify = &self.settings.minify;
        let documents = sources
            .into_par_iter()
            .map(|(path, raw)| {
                debug!("compiling '{}'", path.display());
                compile_document(path, &raw, &options, minify)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Bundle { documents })
    }

    /// Compile and write the artifact to the configured path. Nothing is
    /// written unless every template compiles.
    pub fn build(&self) -> Result<(Bundle, PathBuf), BundleError> {
        let bundle = self.compile()?;
        let output_path = self.settings.output_path();
        write_artifact(&output_path, &bundle.artifact())?;
        info!(
            "wrote {} templates to '{}'",
            bundle.documents.len(),
            output_path.display()
        );
        Ok((bundle, output_path))
    }

    /// Compile and write the artifact to `out`, followed by the render call
    /// for `route` when it names a layout.
    pub fn serve<W: Write>(
        &self,
        route: &ResolvedRoute,
        out: &mut W,
    ) -> Result<Bundle, BundleError> {
        let bundle = self.compile()?;
        out.write_all(bundle.artifact().as_bytes())?;

        let registry = self.settings.compile_options().registry;
        if let Some(bootstrap) = route.bootstrap(&registry)? {
            out.write_all(bootstrap.as_bytes())?;
        }
        out.flush()?;
        Ok(bundle)
    }
}

fn write_artifact(path: &Path, artifact: &str) -> Result<(), BundleError> {
    let write_err = |source| BundleError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, artifact).map_err(write_err)
}
