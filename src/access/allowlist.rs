//! Allowed-UID set
//!
//! Built once at startup and never mutated. Membership is exact string
//! equality after trimming the token.

use super::Decision;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    uids: HashSet<String>,
}

impl AllowList {
    /// Build from any list of UIDs. Entries are trimmed and blanks dropped.
    pub fn new<I, S>(uids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let uids = uids
            .into_iter()
            .map(|u| u.as_ref().trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();
        Self { uids }
    }

    pub fn len(&self) -> usize {
        self.uids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uids.is_empty()
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.uids.contains(uid.trim())
    }

    /// Decide access for one inbound token
    pub fn decide(&self, token: &str) -> Decision {
        if self.contains(token) {
            Decision::Granted
        } else {
            Decision::Denied
        }
    }

    /// UIDs in sorted order, for display and config output
    pub fn sorted(&self) -> Vec<&str> {
        let mut uids: Vec<&str> = self.uids.iter().map(String::as_str).collect();
        uids.sort_unstable();
        uids
    }
}
