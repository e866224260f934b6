//! Access decision and its wire encoding

use std::fmt;

/// Outcome of checking one token against the allow-list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Granted,
    Denied,
}

impl Decision {
    /// Exact bytes written back to the reader
    pub fn wire_line(&self) -> &'static [u8] {
        match self {
            Decision::Granted => b"GRANTED\n",
            Decision::Denied => b"DENIED\n",
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Decision::Granted)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Granted => write!(f, "GRANTED"),
            Decision::Denied => write!(f, "DENIED"),
        }
    }
}
