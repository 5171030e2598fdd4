//! Kerberos tickets recovered upstream, with their kirbi payloads.
//!
//! A ticket may expose several kirbi files (one per cached credential). Each
//! is persisted under a name that embeds the ticket's expiration so that
//! repeated runs fetching the same ticket at different times do not
//! overwrite each other.
use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Extension used by kirbi ticket files.
pub const KIRBI_EXTENSION: &str = ".kirbi";

/// `strftime` layout of the expiration embedded in ticket filenames.
pub const EXPIRATION_FORMAT: &str = "%Y%m%d%H%M%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KerberosTicket {
    #[serde(default)]
    pub client: String,
    #[serde(default)]
    pub server: String,
    #[serde(default)]
    pub domain: String,
    pub end_time: DateTime<Utc>,
    /// Filename -> raw kirbi bytes. Base64 in the JSON dump.
    #[serde(with = "kirbi_base64", default)]
    pub kirbi_data: BTreeMap<String, Vec<u8>>,
}

impl KerberosTicket {
    pub fn new(client: &str, server: &str, domain: &str, end_time: DateTime<Utc>) -> Self {
        Self {
            client: client.to_string(),
            server: server.to_string(),
            domain: domain.to_string(),
            end_time,
            kirbi_data: BTreeMap::new(),
        }
    }

    pub fn with_kirbi(mut self, filename: &str, data: &[u8]) -> Self {
        self.kirbi_data.insert(filename.to_string(), data.to_vec());
        self
    }

    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.kirbi_data.keys().map(String::as_str)
    }

    /// Serialized kirbi payload stored under `filename`.
    pub fn dump(&self, filename: &str) -> Option<&[u8]> {
        self.kirbi_data.get(filename).map(Vec::as_slice)
    }

    pub fn is_tgt(&self) -> bool {
        self.server.to_lowercase().starts_with("krbtgt")
    }

    pub fn expiration_stamp(&self) -> String {
        self.end_time.format(EXPIRATION_FORMAT).to_string()
    }

    /// `<stem>_<YYYYMMDDHHMMSS>.kirbi`, where the stem is the last path
    /// component of `filename` up to its first `.kirbi`. Directory parts are
    /// dropped so the result always stays inside the destination directory.
    pub fn output_file_name(&self, filename: &str) -> String {
        let base = Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("ticket");
        let stem = base.split(KIRBI_EXTENSION).next().unwrap_or(base);
        format!("{}_{}{}", stem, self.expiration_stamp(), KIRBI_EXTENSION)
    }
}

mod kirbi_base64 {
    use std::collections::BTreeMap;

    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error};

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<String, Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let encoded: BTreeMap<&str, String> = map
            .iter()
            .map(|(name, data)| (name.as_str(), STANDARD.encode(data)))
            .collect();
        encoded.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, Vec<u8>>, D::Error> {
        let encoded = BTreeMap::<String, String>::deserialize(deserializer)?;
        encoded
            .into_iter()
            .map(|(name, b64)| {
                STANDARD
                    .decode(b64.as_bytes())
                    .map(|data| (name, data))
                    .map_err(|e| D::Error::custom(format!("kirbi payload is not base64: {e}")))
            })
            .collect()
    }
}
