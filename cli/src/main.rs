mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::diagnostic::Diagnostic;
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use log::info;

use bundler::{Bundle, BundleError, Bundler, MinifySettings, Settings};
use tmplc::CompileOptions;

const SUBCOMMANDS: &[&str] = &["build", "serve", "compile", "test", "help"];

#[derive(Parser)]
#[command(
    name = "tmplc",
    version,
    about = "Compile brace-directive HTML templates into JavaScript components"
)]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Project settings file (.json or .toml)
    #[arg(short, long, global = true, default_value = "./settings.json")]
    settings: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile every template listed in the settings into the output file
    Build,

    /// Compile the templates and write the artifact to stdout
    Serve(ServeArgs),

    /// Compile a single template file to stdout
    Compile(CompileArgs),

    /// Run .test.html golden files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct ServeArgs {
    /// Layout to render (overrides the route and settings)
    #[arg(long)]
    layout: Option<String>,

    /// Page to render inside the layout (overrides the route)
    #[arg(long)]
    page: Option<String>,

    /// Request path looked up in the settings' routers
    #[arg(long)]
    path: Option<String>,
}

#[derive(clap::Args)]
struct CompileArgs {
    /// Template file to compile
    file: PathBuf,

    /// Component registry object used by the generated code
    #[arg(long, default_value = "customComponents")]
    registry: String,

    /// Skip HTML minification
    #[arg(long)]
    no_minify: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.html file or a directory containing them
    path: PathBuf,
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("tmplc=info,bundler=info"),
    )
    .init();

    let cli = Cli::parse_from(normalize_args(std::env::args().collect()));
    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let code = match cli.command {
        Command::Build => do_build(&cli.settings, color_choice),
        Command::Serve(args) => do_serve(&cli.settings, &args, color_choice),
        Command::Compile(args) => do_compile(&args, color_choice),
        Command::Test(args) => test_runner::run_tests(&args.path, cli.no_color),
    };
    process::exit(code);
}

/// Accept the flat flag style too: `tmplc -s settings.json` builds, and a
/// `--serve` flag becomes the `serve` subcommand.
fn normalize_args(mut args: Vec<String>) -> Vec<String> {
    if let Some(pos) = args.iter().position(|a| a == "--serve") {
        args.remove(pos);
        args.insert(1.min(args.len()), "serve".to_string());
        return args;
    }
    if !args.iter().skip(1).any(|a| SUBCOMMANDS.contains(&a.as_str()))
        && !args.iter().skip(1).any(|a| matches!(a.as_str(), "-V" | "--version" | "-h" | "--help"))
    {
        args.insert(1.min(args.len()), "build".to_string());
    }
    args
}

fn load_settings(path: &Path, color_choice: ColorChoice) -> Option<Settings> {
    match Settings::load(path) {
        Ok(settings) => Some(settings),
        Err(error) => {
            report_error(&error, color_choice);
            None
        }
    }
}

fn do_build(settings_path: &Path, color_choice: ColorChoice) -> i32 {
    let Some(settings) = load_settings(settings_path, color_choice) else {
        return 1;
    };
    match Bundler::new(settings).build() {
        Ok((bundle, output_path)) => {
            emit_warnings(&bundle, color_choice);
            info!("ok: {}", output_path.display());
            0
        }
        Err(error) => {
            report_error(&error, color_choice);
            1
        }
    }
}

fn do_serve(settings_path: &Path, args: &ServeArgs, color_choice: ColorChoice) -> i32 {
    let Some(settings) = load_settings(settings_path, color_choice) else {
        return 1;
    };
    let route = settings.resolve_route(
        args.path.as_deref(),
        args.layout.as_deref(),
        args.page.as_deref(),
    );

    let mut stdout = std::io::stdout();
    match Bundler::new(settings).serve(&route, &mut stdout) {
        Ok(bundle) => {
            emit_warnings(&bundle, color_choice);
            0
        }
        Err(error) => {
            report_error(&error, color_choice);
            1
        }
    }
}

fn do_compile(args: &CompileArgs, color_choice: ColorChoice) -> i32 {
    let raw = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.file.display(), e);
            return 1;
        }
    };

    let options = CompileOptions {
        registry: args.registry.clone(),
    };
    let minify = MinifySettings {
        enabled: !args.no_minify,
        ..MinifySettings::default()
    };

    match bundler::compile_document(args.file.clone(), &raw, &options, &minify) {
        Ok(document) => {
            println!("{}", document.output);
            emit_warnings(
                &Bundle {
                    documents: vec![document],
                },
                color_choice,
            );
            0
        }
        Err(error) => {
            report_error(&error, color_choice);
            1
        }
    }
}

fn emit(files: &SimpleFiles<String, String>, diagnostic: &Diagnostic<usize>, color_choice: ColorChoice) {
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();
    let _ = term::emit_to_write_style(&mut writer.lock(), &config, files, diagnostic);
}

/// Compile errors are rendered against the preprocessed text they point
/// into; everything else is a one-line message.
fn report_error(error: &BundleError, color_choice: ColorChoice) {
    match error {
        BundleError::Compile { path, text, error } => {
            let mut files = SimpleFiles::new();
            let file_id = files.add(path.display().to_string(), text.clone());
            emit(&files, &error.to_diagnostic(file_id), color_choice);
        }
        other => eprintln!("error: {}", other),
    }
}

fn emit_warnings(bundle: &Bundle, color_choice: ColorChoice) {
    let mut files = SimpleFiles::new();
    for document in bundle.documents.iter().filter(|d| !d.warnings.is_empty()) {
        let file_id = files.add(document.path.display().to_string(), document.text.clone());
        for warning in &document.warnings {
            emit(&files, &warning.to_diagnostic(file_id), color_choice);
        }
    }
}
