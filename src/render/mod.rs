//! Render dispatch: named, pluggable formatters over a [`RecordSet`].
//!
//! Renderers are looked up by a case-insensitive format name in a
//! [`RendererRegistry`] populated at startup. An unregistered name is a typed
//! [`RenderError::UnknownFormat`], never a panic.
use std::collections::BTreeMap;

use crate::records::RecordSet;

pub mod grep;
pub mod json;
pub mod pretty;
pub mod table;

/// Format used for console display when none is requested.
pub const DEFAULT_FORMAT: &str = "pretty";

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("output format '{0}' doesn't exist")]
    UnknownFormat(String),
    #[error("failed to serialize {format} output: {reason}")]
    Serialize { format: &'static str, reason: String },
}

/// Which parts of a record set a renderer should include.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderView {
    pub users_only: bool,
    pub tickets: bool,
    pub masterkeys: bool,
}

pub trait Renderer: Send + Sync {
    /// Produce the complete text blob for `records` under `view`. Must be
    /// deterministic for identical inputs.
    fn render(&self, records: &RecordSet, view: &RenderView) -> Result<String, RenderError>;
}

#[derive(Default)]
pub struct RendererRegistry {
    renderers: BTreeMap<String, Box<dyn Renderer>>,
}

impl RendererRegistry {
    /// Empty registry, no formats available.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in `pretty`, `json`, `grep` and `table` formats.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("pretty", Box::new(pretty::PrettyRenderer));
        registry.register("json", Box::new(json::JsonRenderer));
        registry.register("grep", Box::new(grep::GrepRenderer));
        registry.register("table", Box::new(table::TableRenderer));
        registry
    }

    /// Register (or replace) the renderer for `name`.
    pub fn register(&mut self, name: &str, renderer: Box<dyn Renderer>) {
        self.renderers.insert(name.to_lowercase(), renderer);
    }

    pub fn get(&self, name: &str) -> Result<&dyn Renderer, RenderError> {
        let key = name.to_lowercase();
        self.renderers
            .get(&key)
            .map(|r| &**r)
            .ok_or(RenderError::UnknownFormat(key))
    }

    pub fn formats(&self) -> impl Iterator<Item = &str> {
        self.renderers.keys().map(String::as_str)
    }

    /// Look up `format` and render `records` with it.
    pub fn render(
        &self,
        format: &str,
        records: &RecordSet,
        view: &RenderView,
    ) -> Result<String, RenderError> {
        self.get(format)?.render(records, view)
    }
}

impl std::fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.renderers.keys()).finish()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{TimeZone, Utc};

    use crate::{credential::Credential, records::RecordSet, ticket::KerberosTicket};

    pub fn records() -> RecordSet {
        let end = Utc.with_ymd_and_hms(2024, 3, 7, 19, 0, 0).unwrap();
        RecordSet::new(
            vec![
                Credential::new("msv", "CORP", "alice")
                    .with_hostname("WS01")
                    .with_hashes(None, "8846f7eaee8fb117ad06bdd830b7586c")
                    .with_sha1("e8f97fba9104d1ea5047948e6dfb67facd9f5b73"),
                Credential::new("wdigest", "CORP", "alice")
                    .with_hostname("WS01")
                    .with_password("Password1!"),
                Credential::new("msv", "CORP", "WS01$")
                    .with_hostname("WS01")
                    .with_hashes(None, "31d6cfe0d16ae931b73c59d7e0c089c0"),
            ],
            vec![
                KerberosTicket::new("alice", "krbtgt/CORP.LOCAL", "CORP.LOCAL", end)
                    .with_kirbi("alice@krbtgt-CORP.LOCAL.kirbi", b"tgt-bytes"),
            ],
            vec!["{8e8a4b1c-0000-4000-8000-000000000001}:deadbeef".to_string()],
        )
    }
}
