use time::PrimitiveDateTime;

use crate::db::models::TestLaunch;

/// Activity of a test launch, derived from its timestamps and the manual
/// `is_active` flag. `Expired` and `Closed` are terminal: there is no
/// automatic path back to `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LaunchActivity {
    Scheduled,
    Active,
    Expired,
    Closed,
}

impl LaunchActivity {
    pub(crate) fn accepts_submissions(self) -> bool {
        matches!(self, LaunchActivity::Active)
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            LaunchActivity::Scheduled => "scheduled",
            LaunchActivity::Active => "active",
            LaunchActivity::Expired => "expired",
            LaunchActivity::Closed => "closed",
        }
    }
}

/// Derive the current activity from persisted state and the wall clock.
///
/// Precedence: a launch that has not started is scheduled; an elapsed
/// `expires_at` always wins over a manual `is_active = true`; only then does
/// the manual flag decide between active and closed.
pub(crate) fn derive_activity(
    launched_at: Option<PrimitiveDateTime>,
    expires_at: Option<PrimitiveDateTime>,
    is_active: bool,
    now: PrimitiveDateTime,
) -> LaunchActivity {
    match launched_at {
        None => LaunchActivity::Scheduled,
        Some(start) if start > now => LaunchActivity::Scheduled,
        Some(_) => match expires_at {
            Some(end) if end <= now => LaunchActivity::Expired,
            _ if !is_active => LaunchActivity::Closed,
            _ => LaunchActivity::Active,
        },
    }
}

pub(crate) fn activity_of(launch: &TestLaunch, now: PrimitiveDateTime) -> LaunchActivity {
    derive_activity(launch.launched_at, launch.expires_at, launch.is_active, now)
}

/// Clamp a requested manual `is_active` flag against automatic expiry: a
/// teacher may close an active launch at any time, but cannot reopen one
/// whose `expires_at` has already elapsed without moving the deadline.
pub(crate) fn resolve_manual_flag(
    requested: bool,
    expires_at: Option<PrimitiveDateTime>,
    now: PrimitiveDateTime,
) -> bool {
    if let Some(end) = expires_at {
        if end <= now {
            return false;
        }
    }
    requested
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const NOW: PrimitiveDateTime = datetime!(2025-06-07 12:00:00);

    #[test]
    fn unset_launch_time_is_scheduled() {
        assert_eq!(derive_activity(None, None, true, NOW), LaunchActivity::Scheduled);
    }

    #[test]
    fn future_launch_time_is_scheduled() {
        let start = datetime!(2025-06-07 13:00:00);
        assert_eq!(derive_activity(Some(start), None, true, NOW), LaunchActivity::Scheduled);
        // Even an elapsed expiry does not override a future start.
        let end = datetime!(2025-06-07 11:00:00);
        assert_eq!(derive_activity(Some(start), Some(end), true, NOW), LaunchActivity::Scheduled);
    }

    #[test]
    fn started_without_expiry_is_active() {
        let start = datetime!(2025-06-07 10:00:00);
        assert_eq!(derive_activity(Some(start), None, true, NOW), LaunchActivity::Active);
    }

    #[test]
    fn elapsed_expiry_is_expired() {
        let start = datetime!(2025-06-07 10:00:00);
        let end = datetime!(2025-06-07 11:00:00);
        assert_eq!(derive_activity(Some(start), Some(end), true, NOW), LaunchActivity::Expired);
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let start = datetime!(2025-06-07 10:00:00);
        assert_eq!(derive_activity(Some(start), Some(NOW), true, NOW), LaunchActivity::Expired);
    }

    #[test]
    fn future_expiry_is_active() {
        let start = datetime!(2025-06-07 10:00:00);
        let end = datetime!(2025-06-07 13:00:00);
        assert_eq!(derive_activity(Some(start), Some(end), true, NOW), LaunchActivity::Active);
    }

    #[test]
    fn manual_close_wins_while_running() {
        let start = datetime!(2025-06-07 10:00:00);
        assert_eq!(derive_activity(Some(start), None, false, NOW), LaunchActivity::Closed);
        let end = datetime!(2025-06-07 13:00:00);
        assert_eq!(derive_activity(Some(start), Some(end), false, NOW), LaunchActivity::Closed);
    }

    #[test]
    fn expiry_wins_over_manual_flag() {
        let start = datetime!(2025-06-07 10:00:00);
        let end = datetime!(2025-06-07 11:00:00);
        // is_active = true cannot resurrect an expired launch.
        assert_eq!(derive_activity(Some(start), Some(end), true, NOW), LaunchActivity::Expired);
        assert_eq!(derive_activity(Some(start), Some(end), false, NOW), LaunchActivity::Expired);
    }

    #[test]
    fn only_active_accepts_submissions() {
        assert!(LaunchActivity::Active.accepts_submissions());
        assert!(!LaunchActivity::Scheduled.accepts_submissions());
        assert!(!LaunchActivity::Expired.accepts_submissions());
        assert!(!LaunchActivity::Closed.accepts_submissions());
    }

    #[test]
    fn manual_flag_clamped_after_expiry() {
        let past = datetime!(2025-06-07 11:00:00);
        let future = datetime!(2025-06-07 13:00:00);
        assert!(!resolve_manual_flag(true, Some(past), NOW));
        assert!(resolve_manual_flag(true, Some(future), NOW));
        assert!(resolve_manual_flag(true, None, NOW));
        assert!(!resolve_manual_flag(false, Some(future), NOW));
        assert!(!resolve_manual_flag(false, None, NOW));
    }
}
