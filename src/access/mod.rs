//! Access decisions
//!
//! The fixed allow-list of reader UIDs and the two-valued decision sent back
//! over the link for every token.

pub mod allowlist;
pub mod decision;

pub use allowlist::AllowList;
pub use decision::Decision;
