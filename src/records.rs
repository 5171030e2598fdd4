//! RecordSet: the already-parsed output of a dump, handed to renderers and
//! to the [`OutputWriter`](crate::writer::OutputWriter).
//!
//! Typical usage:
//!
//! ```no_run
//! use lsassy_writer::records::RecordSet;
//! # fn main() -> anyhow::Result<()> {
//! let records = RecordSet::from_json_path("/path/to/dump.json")?;
//! println!("{} credentials", records.credentials.len());
//! # Ok(())
//! # }
//! ```
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{credential::Credential, ticket::KerberosTicket};

/// Credentials, Kerberos tickets and DPAPI masterkeys (`GUID:key` lines).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    #[serde(default)]
    pub credentials: Vec<Credential>,
    #[serde(default)]
    pub tickets: Vec<KerberosTicket>,
    #[serde(default)]
    pub masterkeys: Vec<String>,
}

impl RecordSet {
    pub fn new(
        credentials: Vec<Credential>,
        tickets: Vec<KerberosTicket>,
        masterkeys: Vec<String>,
    ) -> Self {
        Self {
            credentials,
            tickets,
            masterkeys,
        }
    }

    /// Credentials worth displaying: entries with a secret, machine accounts
    /// dropped when `users_only`, duplicates collapsed in first-seen order.
    pub fn credentials_view(&self, users_only: bool) -> Vec<&Credential> {
        let mut seen: HashSet<String> = HashSet::new();
        self.credentials
            .iter()
            .filter(|c| c.has_secret())
            .filter(|c| !(users_only && c.is_machine_account()))
            .filter(|c| seen.insert(c.dedup_key()))
            .collect()
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).context("parse record dump")
    }

    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file =
            File::open(&path).with_context(|| format!("open {}", path.as_ref().display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parse {}", path.as_ref().display()))
    }
}
