//! Kernel tuning recipes: swappiness and transparent huge pages.

use crate::step::{IdempotentStep, Marker, Probe};

/// Swappiness used when none is given.
pub const DEFAULT_SWAPPINESS: u8 = 1;
/// Transparent huge page mode file.
pub const THP_ENABLED: &str = "/sys/kernel/mm/transparent_hugepage/enabled";
/// Transparent huge page defragmentation file.
pub const THP_DEFRAG: &str = "/sys/kernel/mm/transparent_hugepage/defrag";
/// Boot-time startup script.
pub const RC_LOCAL: &str = "/etc/rc.d/rc.local";

const SWAPPINESS: &str = "/proc/sys/vm/swappiness";
const NEVER_MARKER: &str = "[never]";

/// Writes `amount` to the swappiness file unless it already holds it.
#[must_use]
pub fn swappiness_step(amount: u8) -> IdempotentStep {
    IdempotentStep::new(format!("set swappiness to {amount}"))
        .probe(Probe::present(
            format!("cat {SWAPPINESS}"),
            Marker::exact(amount.to_string()),
        ))
        .run(format!("sh -c 'echo {amount} > {SWAPPINESS}'"))
}

/// Sets both huge page files to `never` and persists the setting in
/// [`RC_LOCAL`].
#[must_use]
pub fn hugepage_step() -> IdempotentStep {
    IdempotentStep::new("disable transparent_hugepage")
        .probe(Probe::present(format!("cat {THP_DEFRAG}"), Marker::text(NEVER_MARKER)))
        .probe(Probe::present(format!("cat {THP_ENABLED}"), Marker::text(NEVER_MARKER)))
        .run(format!("echo never > {THP_ENABLED}"))
        .run(format!("echo never > {THP_DEFRAG}"))
        .nested(boot_line_step(THP_DEFRAG))
        .nested(boot_line_step(THP_ENABLED))
        .run(format!("chmod +x {RC_LOCAL}"))
}

/// Appends `echo never > <path>` to [`RC_LOCAL`] unless the file already
/// mentions `path`.
#[must_use]
pub fn boot_line_step(path: &str) -> IdempotentStep {
    IdempotentStep::new(format!("persist {path} in {RC_LOCAL}"))
        .probe(Probe::present(format!("cat {RC_LOCAL}"), Marker::text(path)))
        .run(format!("echo 'echo never > {path}' >> {RC_LOCAL}"))
}
