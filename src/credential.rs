//! Credential data model for secrets recovered upstream from LSASS memory.
//!
//! A `Credential` carries the identity (domain, username, source host and
//! security package) and whatever secret material was decoded for it: a
//! cleartext password, LM/NT hashes and the SHA1 of the NT hash.
//!
//! Use [`Credential::account_type`] to tell user from machine accounts and
//! [`Credential::dedup_key`] to collapse identical entries reported by
//! several security packages.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    User,
    Machine,
}

/// Represents a decoded account entry with its secret material.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(default)]
    pub ssp: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub domain: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lm_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nt_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

impl Credential {
    /// Well-known null LM hash value.
    pub const NULL_HASH_LM: &'static str = "aad3b435b51404eeaad3b435b51404ee";
    /// Well-known null NT hash value.
    pub const NULL_HASH_NT: &'static str = "31d6cfe0d16ae931b73c59d7e0c089c0";

    /// Construct a credential for `username` with no secret material.
    pub fn new(ssp: &str, domain: &str, username: &str) -> Self {
        Self {
            ssp: ssp.to_string(),
            domain: domain.to_string(),
            username: username.to_string(),
            ..Self::default()
        }
    }

    pub fn with_hostname(mut self, hostname: &str) -> Self {
        self.hostname = hostname.to_string();
        self
    }

    pub fn with_password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    pub fn with_hashes(mut self, lm: Option<&str>, nt: &str) -> Self {
        self.lm_hash = lm.map(str::to_string);
        self.nt_hash = Some(nt.to_string());
        self
    }

    pub fn with_sha1(mut self, sha1: &str) -> Self {
        self.sha1 = Some(sha1.to_string());
        self
    }

    /// Machine accounts end with `$`.
    pub fn account_type(&self) -> AccountType {
        if self.username.trim_end().ends_with('$') {
            AccountType::Machine
        } else {
            AccountType::User
        }
    }

    pub fn is_machine_account(&self) -> bool {
        self.account_type() == AccountType::Machine
    }

    /// `DOMAIN\user`, or the bare username when no domain was recovered.
    pub fn down_level_logon_name(&self) -> String {
        if self.domain.is_empty() {
            self.username.clone()
        } else {
            format!("{}\\{}", self.domain, self.username)
        }
    }

    pub fn password(&self) -> Option<&str> {
        non_empty(&self.password)
    }

    /// LM hash, ignoring the null hash.
    pub fn lm_hash(&self) -> Option<&str> {
        non_empty(&self.lm_hash).filter(|h| !h.eq_ignore_ascii_case(Self::NULL_HASH_LM))
    }

    pub fn nt_hash(&self) -> Option<&str> {
        non_empty(&self.nt_hash)
    }

    pub fn sha1(&self) -> Option<&str> {
        non_empty(&self.sha1)
    }

    /// True when any secret field carries a value.
    pub fn has_secret(&self) -> bool {
        self.password().is_some()
            || self.lm_hash().is_some()
            || self.nt_hash().is_some()
            || self.sha1().is_some()
    }

    /// Identity of a credential for deduplication: same account, same
    /// secrets. The security package and source host are not part of it.
    pub fn dedup_key(&self) -> String {
        format!(
            "{}\\{}:{}:{}:{}:{}",
            self.domain.to_lowercase(),
            self.username.to_lowercase(),
            self.password().unwrap_or_default(),
            self.lm_hash().unwrap_or_default(),
            self.nt_hash().unwrap_or_default(),
            self.sha1().unwrap_or_default(),
        )
    }
}
