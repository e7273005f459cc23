/// Byte progress of an in-flight load. Only constructed through
/// [`ProgressSnapshot::accept`], so `total > 0` and `loaded <= total`
/// always hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    loaded: u64,
    total: u64,
}

impl ProgressSnapshot {
    /// Validates a raw progress report. A report claiming more loaded
    /// bytes than the total, or one with no total at all, carries no
    /// usable ratio and yields `None`.
    pub fn accept(loaded: u64, total: u64) -> Option<Self> {
        if total == 0 || loaded > total {
            return None;
        }
        Some(Self { loaded, total })
    }

    pub fn loaded(&self) -> u64 {
        self.loaded
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Whole percent, floored.
    pub fn percent(&self) -> u8 {
        ((self.loaded as f64 / self.total as f64) * 100.0).floor() as u8
    }
}

/// Rounds a byte count for the progress and document views.
pub fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = 1024.0 * 1024.0;

    let bytes = bytes as f64;
    if bytes >= MIB {
        format!("{:.1} MiB", bytes / MIB)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes / KIB)
    } else {
        format!("{bytes} B")
    }
}
