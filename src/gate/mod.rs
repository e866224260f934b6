//! Gatekeeper loop
//!
//! Wires the located port, the allow-list and the optional audit log into a
//! [`Gatekeeper`] that serves until the link fails.

pub mod audit;
pub mod clock;
pub mod link;
pub mod machine;

pub use audit::AuditLog;
pub use clock::{Clock, MonotonicClock};
pub use link::Link;
pub use machine::{GateStats, Gatekeeper};

use crate::config::GatekeeperConfig;
use crate::error::Result;
use crate::serial::{locator, PortInfo};
use log::info;

/// Startup sequence: validate, locate, open the audit log, open the link.
///
/// Nothing is opened when the config is invalid or no device is found.
/// Returns the device path alongside the ready gatekeeper.
pub fn startup<L, C, E, O>(
    config: &GatekeeperConfig,
    clock: C,
    enumerate: E,
    open: O,
) -> Result<(String, Gatekeeper<L, C>)>
where
    L: Link,
    C: Clock,
    E: FnOnce() -> Result<Vec<PortInfo>>,
    O: FnOnce(&str) -> Result<L>,
{
    config.validate()?;

    let path = locator::resolve(config.port.as_deref(), &config.device_pattern, enumerate)?;

    let audit = match config.audit_log.as_deref() {
        Some(audit_path) => {
            let log = AuditLog::open(audit_path)?;
            info!("Audit log: {}", log.path().display());
            Some(log)
        }
        None => None,
    };

    let link = open(&path)?;
    let allow_list = config.allow_list();
    info!(
        "Gatekeeper ready on {} ({} allowed UIDs, {}s wait window)",
        path,
        allow_list.len(),
        config.session_timeout_secs
    );

    let gatekeeper = Gatekeeper::new(link, clock, allow_list)
        .with_session_timeout(config.session_timeout())
        .with_decode_policy(config.on_decode_error)
        .with_audit(audit);

    Ok((path, gatekeeper))
}
