//! Machine-readable JSON rendering.
//!
//! Tickets are described by their metadata and kirbi filenames; payloads
//! stay on disk.
use serde::Serialize;

use super::{RenderError, RenderView, Renderer};
use crate::{credential::Credential, records::RecordSet, ticket::KerberosTicket};

pub struct JsonRenderer;

#[derive(Serialize)]
struct CredentialEntry<'a> {
    #[serde(rename = "type")]
    account_type: crate::credential::AccountType,
    #[serde(flatten)]
    credential: &'a Credential,
}

#[derive(Serialize)]
struct TicketEntry<'a> {
    client: &'a str,
    server: &'a str,
    domain: &'a str,
    end_time: String,
    files: Vec<&'a str>,
}

impl<'a> From<&'a KerberosTicket> for TicketEntry<'a> {
    fn from(t: &'a KerberosTicket) -> Self {
        Self {
            client: &t.client,
            server: &t.server,
            domain: &t.domain,
            end_time: t.end_time.to_rfc3339(),
            files: t.filenames().collect(),
        }
    }
}

#[derive(Serialize)]
struct Document<'a> {
    credentials: Vec<CredentialEntry<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tickets: Option<Vec<TicketEntry<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    masterkeys: Option<&'a [String]>,
}

impl Renderer for JsonRenderer {
    fn render(&self, records: &RecordSet, view: &RenderView) -> Result<String, RenderError> {
        let doc = Document {
            credentials: records
                .credentials_view(view.users_only)
                .into_iter()
                .map(|c| CredentialEntry {
                    account_type: c.account_type(),
                    credential: c,
                })
                .collect(),
            tickets: view
                .tickets
                .then(|| records.tickets.iter().map(TicketEntry::from).collect()),
            masterkeys: view.masterkeys.then_some(records.masterkeys.as_slice()),
        };
        serde_json::to_string_pretty(&doc).map_err(|e| RenderError::Serialize {
            format: "json",
            reason: e.to_string(),
        })
    }
}
