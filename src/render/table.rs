//! Fixed-width table rendering.
use super::{RenderError, RenderView, Renderer};
use crate::records::RecordSet;

pub struct TableRenderer;

const COLUMN_GAP: &str = "  ";

fn layout(headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }
    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<w$}", cell, w = *w))
            .collect::<Vec<_>>()
            .join(COLUMN_GAP)
            .trim_end()
            .to_string()
    };
    let mut out = Vec::with_capacity(rows.len() + 2);
    out.push(line(headers.to_vec()));
    out.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join(COLUMN_GAP),
    );
    for row in rows {
        out.push(line(row.iter().map(String::as_str).collect()));
    }
    out
}

impl Renderer for TableRenderer {
    fn render(&self, records: &RecordSet, view: &RenderView) -> Result<String, RenderError> {
        let rows: Vec<Vec<String>> = records
            .credentials_view(view.users_only)
            .into_iter()
            .map(|c| {
                vec![
                    c.hostname.clone(),
                    c.domain.clone(),
                    c.username.clone(),
                    c.password().unwrap_or_default().to_string(),
                    c.nt_hash().unwrap_or_default().to_string(),
                ]
            })
            .collect();
        let mut lines = layout(&["Host", "Domain", "Username", "Password", "NT Hash"], &rows);

        if view.tickets {
            let rows: Vec<Vec<String>> = records
                .tickets
                .iter()
                .map(|t| {
                    vec![
                        format!("{}@{}", t.client, t.domain),
                        t.server.clone(),
                        t.end_time.format("%Y-%m-%d %H:%M:%S").to_string(),
                    ]
                })
                .collect();
            lines.push(String::new());
            lines.extend(layout(&["Client", "Server", "Expires"], &rows));
        }
        if view.masterkeys {
            let rows: Vec<Vec<String>> = records
                .masterkeys
                .iter()
                .map(|mk| vec![mk.clone()])
                .collect();
            lines.push(String::new());
            lines.extend(layout(&["Masterkey"], &rows));
        }
        Ok(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::Credential;

    #[test]
    fn aligns_columns() {
        let records = RecordSet::new(
            vec![
                Credential::new("wdigest", "CORP", "alice")
                    .with_hostname("WS01")
                    .with_password("Password1!"),
                Credential::new("msv", "CORP", "bob")
                    .with_hostname("WS01")
                    .with_hashes(None, "31d6cfe0d16ae931b73c59d7e0c089c0"),
            ],
            vec![],
            vec![],
        );
        let out = TableRenderer
            .render(&records, &RenderView::default())
            .unwrap();
        let expected = [
            "Host  Domain  Username  Password    NT Hash".to_string(),
            format!("----  ------  --------  ----------  {}", "-".repeat(32)),
            "WS01  CORP    alice     Password1!".to_string(),
            format!("WS01  CORP    bob{}31d6cfe0d16ae931b73c59d7e0c089c0", " ".repeat(19)),
        ]
        .join("\n");
        assert_eq!(out, expected);
    }

    #[test]
    fn masterkey_section_when_asked() {
        let records = RecordSet::new(vec![], vec![], vec!["A-GUID:deadbeef".to_string()]);
        let view = RenderView {
            masterkeys: true,
            ..RenderView::default()
        };
        let out = TableRenderer.render(&records, &view).unwrap();
        assert!(out.ends_with("Masterkey\n---------------\nA-GUID:deadbeef"));
    }
}
