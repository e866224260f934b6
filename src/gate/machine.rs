//! Read / validate / respond state machine
//!
//! Two states. `Idle` is the outer tick: it re-anchors the wait window.
//! `WaitingForToken` polls the link once per step until a line arrives or
//! the window expires. Every decoded line gets exactly one response.

use crate::access::{AllowList, Decision};
use crate::config::{DecodePolicy, DEFAULT_SESSION_TIMEOUT_SECS};
use crate::error::{GateError, Result};
use crate::gate::{AuditLog, Clock, Link};
use log::{debug, info, warn};
use std::convert::Infallible;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Idle,
    WaitingForToken { anchor: Duration },
}

/// Outcome of one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Nothing yet, window still open
    Waiting,
    /// A token was answered
    Decided { token: String, decision: Decision },
    /// Window expired with no data; waiting restarts
    TimedOut,
    /// Undecodable line dropped under `DecodePolicy::Skip`
    Skipped,
}

/// Running totals, reported when the gatekeeper stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateStats {
    pub granted: u64,
    pub denied: u64,
    pub timeouts: u64,
    pub skipped: u64,
}

pub struct Gatekeeper<L, C> {
    link: L,
    clock: C,
    allow_list: AllowList,
    session_timeout: Duration,
    decode_policy: DecodePolicy,
    audit: Option<AuditLog>,
    state: GateState,
    stats: GateStats,
}

impl<L: Link, C: Clock> Gatekeeper<L, C> {
    pub fn new(link: L, clock: C, allow_list: AllowList) -> Self {
        Self {
            link,
            clock,
            allow_list,
            session_timeout: Duration::from_secs(DEFAULT_SESSION_TIMEOUT_SECS),
            decode_policy: DecodePolicy::default(),
            audit: None,
            state: GateState::Idle,
            stats: GateStats::default(),
        }
    }

    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self
    }

    pub fn with_decode_policy(mut self, policy: DecodePolicy) -> Self {
        self.decode_policy = policy;
        self
    }

    pub fn with_audit(mut self, audit: Option<AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn stats(&self) -> GateStats {
        self.stats
    }

    /// Serve until the link fails. Never returns `Ok`.
    pub fn run(&mut self) -> Result<Infallible> {
        loop {
            self.step()?;
        }
    }

    /// Advance by one poll of the link
    pub fn step(&mut self) -> Result<Step> {
        let anchor = match self.state {
            GateState::Idle => {
                let now = self.clock.now();
                self.state = GateState::WaitingForToken { anchor: now };
                now
            }
            GateState::WaitingForToken { anchor } => anchor,
        };

        match self.link.poll_line()? {
            Some(raw) => {
                self.state = GateState::Idle;
                self.handle_line(&raw)
            }
            None => {
                let elapsed = self.clock.now().saturating_sub(anchor);
                if elapsed > self.session_timeout {
                    warn!(
                        "Timeout: no data for {}s, restarting wait",
                        self.session_timeout.as_secs()
                    );
                    self.stats.timeouts += 1;
                    if let Some(audit) = self.audit.as_mut() {
                        audit.record_timeout()?;
                    }
                    self.state = GateState::Idle;
                    Ok(Step::TimedOut)
                } else {
                    Ok(Step::Waiting)
                }
            }
        }
    }

    fn handle_line(&mut self, raw: &[u8]) -> Result<Step> {
        let text = match std::str::from_utf8(raw) {
            Ok(text) => text,
            Err(e) => return self.handle_undecodable(raw, e),
        };

        let token = text.trim();
        info!("Received UID: {}", token);

        let decision = self.allow_list.decide(token);
        self.link.send(decision.wire_line())?;

        match decision {
            Decision::Granted => {
                self.stats.granted += 1;
                info!("Access granted");
            }
            Decision::Denied => {
                self.stats.denied += 1;
                info!("Access denied");
            }
        }

        if let Some(audit) = self.audit.as_mut() {
            audit.record_decision(token, decision)?;
        }

        Ok(Step::Decided {
            token: token.to_string(),
            decision,
        })
    }

    fn handle_undecodable(&mut self, raw: &[u8], err: std::str::Utf8Error) -> Result<Step> {
        match self.decode_policy {
            DecodePolicy::Fatal => Err(GateError::Decode(err)),
            DecodePolicy::Skip => {
                warn!("Dropping undecodable line ({} bytes): {}", raw.len(), err);
                for line in hexdump::hexdump_iter(raw) {
                    debug!("{}", &*line);
                }
                self.stats.skipped += 1;
                Ok(Step::Skipped)
            }
        }
    }
}
