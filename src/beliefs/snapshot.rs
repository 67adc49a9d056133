//! Snapshot guard.
//!
//! Validates a proposed rewrite of the free-text personality summary so that
//! an overeager rewrite cannot silently discard established traits. The
//! absolute upper character budget is the caller's job
//! ([`crate::utilities::config::EngineConfig::max_snapshot_chars`]).

/// Validates proposed personality-summary rewrites.
#[derive(Debug, Clone)]
pub struct SnapshotGuard {
    /// Minimum absolute length of an acceptable snapshot, in characters.
    pub min_chars: usize,
    /// Minimum `len(new) / len(old)` content-retention ratio.
    pub retention_floor: f64,
}

impl Default for SnapshotGuard {
    fn default() -> Self {
        Self {
            min_chars: 30,
            retention_floor: 0.6,
        }
    }
}

impl SnapshotGuard {
    /// Whether `new_text` may replace `old_text`.
    ///
    /// Rejects empty or too-short replacements and replacements that retain
    /// less than the configured fraction of the prior text's length.
    pub fn validate(&self, old_text: &str, new_text: &str) -> bool {
        let new_len = new_text.chars().count();
        if new_len == 0 || new_len < self.min_chars {
            log::warn!(
                "snapshot rewrite rejected: {} chars is below the {}-char minimum",
                new_len,
                self.min_chars
            );
            return false;
        }
        let old_len = old_text.chars().count();
        if old_len > 0 && (new_len as f64) / (old_len as f64) < self.retention_floor {
            log::warn!(
                "snapshot rewrite rejected: retention {:.2} below floor {:.2}",
                new_len as f64 / old_len as f64,
                self.retention_floor
            );
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OLD: &str = "I have grown cautious about sweeping claims and I weigh \
empirical evidence heavily; my curiosity still outruns my skepticism.";

    #[test]
    fn test_rejects_empty_and_short_rewrites() {
        let guard = SnapshotGuard::default();
        assert!(!guard.validate(OLD, ""));
        assert!(!guard.validate(OLD, "ten chars."));
    }

    #[test]
    fn test_rejects_lossy_rewrites() {
        let guard = SnapshotGuard::default();
        let lossy: String = OLD.chars().take(OLD.chars().count() / 2).collect();
        assert!(lossy.chars().count() >= 30);
        assert!(!guard.validate(OLD, &lossy));
    }

    #[test]
    fn test_accepts_faithful_rewrites() {
        let guard = SnapshotGuard::default();
        let kept: String = OLD.chars().take(OLD.chars().count() * 7 / 10).collect();
        assert!(guard.validate(OLD, &kept));
        assert!(guard.validate(OLD, OLD));
    }

    #[test]
    fn test_growth_is_always_acceptable() {
        let guard = SnapshotGuard::default();
        let grown = format!("{} I have also developed views on governance.", OLD);
        assert!(guard.validate(OLD, &grown));
    }

    #[test]
    fn test_empty_prior_snapshot_only_checks_length() {
        let guard = SnapshotGuard::default();
        assert!(guard.validate("", "a perfectly reasonable opening snapshot"));
        assert!(!guard.validate("", "too short"));
    }
}
