//! Rendering of compilation results.

use serde::Serialize;

use designfirst_compiler::{CompiledApi, StaticRoute};

/// The document written by `designfirst compile`.
#[derive(Debug, Serialize)]
pub struct CompileOutput {
    #[serde(flatten)]
    pub api: CompiledApi,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub static_routes: Vec<StaticRoute>,
}

impl CompileOutput {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// One `METHOD PATH -> HANDLER [policies]` line per route, with the
/// method and path columns padded to line up.
pub fn route_table(api: &CompiledApi) -> String {
    let method_width = api.routes.iter().map(|r| r.method.len()).max().unwrap_or(0);
    let path_width = api.routes.iter().map(|r| r.path.len()).max().unwrap_or(0);

    let mut table = String::new();
    for route in &api.routes {
        let mut line = format!(
            "{:<mw$} {:<pw$} -> {}",
            route.method,
            route.path,
            route.handler,
            mw = method_width,
            pw = path_width
        );
        if !route.policies.is_empty() {
            line.push_str(&format!(" [{}]", route.policies.join(", ")));
        }
        table.push_str(line.trim_end());
        table.push('\n');
    }
    table
}
