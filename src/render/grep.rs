//! Grep-friendly rendering: one tab-separated record per line.
//!
//! Credential rows are
//! `ssp  host  domain  username  password  lm  nt  sha1` with empty columns for
//! missing secrets. Ticket and masterkey rows start with `ticket` and
//! `masterkey` so they can be filtered out with a single pattern.
use csv::{QuoteStyle, Terminator, WriterBuilder};

use super::{RenderError, RenderView, Renderer};
use crate::records::RecordSet;

pub struct GrepRenderer;

fn encode_error(e: impl std::fmt::Display) -> RenderError {
    RenderError::Serialize {
        format: "grep",
        reason: e.to_string(),
    }
}

impl Renderer for GrepRenderer {
    fn render(&self, records: &RecordSet, view: &RenderView) -> Result<String, RenderError> {
        let mut wtr = WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quote_style(QuoteStyle::Never)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        for c in records.credentials_view(view.users_only) {
            wtr.write_record([
                c.ssp.as_str(),
                c.hostname.as_str(),
                c.domain.as_str(),
                c.username.as_str(),
                c.password().unwrap_or_default(),
                c.lm_hash().unwrap_or_default(),
                c.nt_hash().unwrap_or_default(),
                c.sha1().unwrap_or_default(),
            ])
            .map_err(encode_error)?;
        }
        if view.tickets {
            for t in &records.tickets {
                let files: Vec<&str> = t.filenames().collect();
                wtr.write_record([
                    "ticket",
                    t.client.as_str(),
                    t.domain.as_str(),
                    t.server.as_str(),
                    t.expiration_stamp().as_str(),
                    files.join(",").as_str(),
                ])
                .map_err(encode_error)?;
            }
        }
        if view.masterkeys {
            for mk in &records.masterkeys {
                wtr.write_record(["masterkey", mk.as_str()])
                    .map_err(encode_error)?;
            }
        }

        let bytes = wtr.into_inner().map_err(encode_error)?;
        let mut out = String::from_utf8(bytes).map_err(encode_error)?;
        if out.ends_with('\n') {
            out.pop();
        }
        Ok(out)
    }
}
