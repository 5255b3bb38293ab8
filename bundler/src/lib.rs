pub mod bundle;
pub mod error;
pub mod preprocess;
pub mod route;
pub mod settings;

pub use bundle::{Bundle, Bundler, CompiledDocument, compile_document};
pub use error::BundleError;
pub use route::ResolvedRoute;
pub use settings::{MinifySettings, Route, Router, Settings};
