//! Human-readable, colored rendering for terminal output.
//!
//! One line per deduplicated credential, followed by Kerberos ticket and
//! DPAPI masterkey sections when the view asks for them.
use colored::*;

use super::{RenderError, RenderView, Renderer};
use crate::{credential::Credential, records::RecordSet, ticket::KerberosTicket};

pub struct PrettyRenderer;

/// Title line underlined to the title's width.
fn section_header(title: &str, color: Color) -> String {
    format!(
        "\n{}\n{}\n",
        title.bold().color(color),
        "─".repeat(title.chars().count())
    )
}

fn credential_line(c: &Credential, width: usize) -> String {
    let name = c.down_level_logon_name();
    let pad = " ".repeat(width.saturating_sub(name.chars().count()));
    let mut secrets: Vec<String> = Vec::new();
    if let Some(pw) = c.password() {
        secrets.push(format!("{} {}", "[PWD]".green(), pw.red()));
    }
    if let Some(lm) = c.lm_hash() {
        secrets.push(format!("{} {}", "[LM]".green(), lm));
    }
    if let Some(nt) = c.nt_hash() {
        secrets.push(format!("{} {}", "[NT]".green(), nt));
    }
    if let Some(sha1) = c.sha1() {
        secrets.push(format!("{} {}", "[SHA1]".green(), sha1));
    }
    let host = if c.hostname.is_empty() {
        String::new()
    } else {
        format!("{} ", format!("[{}]", c.hostname).blue())
    };
    let ssp = if c.ssp.is_empty() {
        String::new()
    } else {
        format!("{} ", format!("[{}]", c.ssp).cyan())
    };
    format!(
        "{}{}{}  {}{}",
        host,
        name.bold(),
        pad,
        ssp,
        secrets.join(" | ")
    )
}

fn ticket_line(t: &KerberosTicket) -> String {
    let kind = if t.is_tgt() { "[TGT]" } else { "[TGS]" };
    format!(
        "{} {}@{} - {} - {} {}",
        kind.yellow(),
        t.client,
        t.domain,
        t.server,
        "Exp:".dimmed(),
        t.end_time.format("%Y-%m-%d %H:%M:%S")
    )
}

impl Renderer for PrettyRenderer {
    fn render(&self, records: &RecordSet, view: &RenderView) -> Result<String, RenderError> {
        let mut lines: Vec<String> = Vec::new();
        let creds = records.credentials_view(view.users_only);
        if creds.is_empty() {
            lines.push("No credentials found".dimmed().to_string());
        } else {
            let width = creds
                .iter()
                .map(|c| c.down_level_logon_name().chars().count())
                .max()
                .unwrap_or(0);
            for c in creds {
                lines.push(credential_line(c, width));
            }
        }

        let mut out = lines.join("\n");
        if view.tickets {
            out.push_str(&section_header("Kerberos Tickets", Color::Cyan));
            if records.tickets.is_empty() {
                out.push_str(&"(No tickets)".dimmed().to_string());
            } else {
                let ticket_lines: Vec<String> = records.tickets.iter().map(ticket_line).collect();
                out.push_str(&ticket_lines.join("\n"));
            }
        }
        if view.masterkeys {
            out.push_str(&section_header("DPAPI Masterkeys", Color::Magenta));
            if records.masterkeys.is_empty() {
                out.push_str(&"(No masterkeys)".dimmed().to_string());
            } else {
                out.push_str(&records.masterkeys.join("\n"));
            }
        }
        Ok(out)
    }
}
