use log::debug;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::BundleError;
use crate::settings::Settings;

/// Layout and page chosen for serve mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub layout: Option<String>,
    pub page: Option<String>,
}

/// Context the layout is rendered with.
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PageContext<'a> {
    page_template: &'a str,
    data: Map<String, Value>,
}

impl Settings {
    /// Look `path` up in the routers. The layout comes from the route, then
    /// its router, then the settings default; explicit `layout`/`page`
    /// arguments win over all of them.
    pub fn resolve_route(
        &self,
        path: Option<&str>,
        layout: Option<&str>,
        page: Option<&str>,
    ) -> ResolvedRoute {
        let mut resolved = ResolvedRoute {
            layout: self.layout.clone().filter(|l| !l.is_empty()),
            page: None,
        };

        if let Some(path) = path {
            let hit = self
                .routers
                .iter()
                .find_map(|router| router.handle.get(path).map(|route| (router, route)));
            if let Some((router, route)) = hit {
                debug!("route '{}' handled by router '{}'", path, router.name);
                if let Some(layout) = route.layout.clone().or_else(|| router.layout.clone()) {
                    resolved.layout = Some(layout);
                }
                resolved.page = Some(route.page.clone());
            }
        }

        if let Some(layout) = layout {
            resolved.layout = Some(layout.to_string());
        }
        if let Some(page) = page {
            resolved.page = Some(page.to_string());
        }
        resolved
    }
}

impl ResolvedRoute {
    /// The statement that renders the layout with its page, or `None` when
    /// no layout is known.
    pub fn bootstrap(&self, registry: &str) -> Result<Option<String>, BundleError> {
        let Some(layout) = &self.layout else {
            return Ok(None);
        };
        let context = PageContext {
            page_template: self.page.as_deref().unwrap_or_default(),
            data: Map::new(),
        };
        Ok(Some(format!(
            "{}.render({},{});",
            registry,
            serde_json::to_string(layout)?,
            serde_json::to_string(&context)?
        )))
    }
}
