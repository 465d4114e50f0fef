use dashmap::DashMap;

const MAX_FAILURES: u32 = 5;
const LOCKOUT_MS: i64 = 15 * 60 * 1000;

#[derive(Clone, Copy, Debug, Default)]
struct FailureState {
    failures: u32,
    locked_until_ms: i64,
}

/// Per-account login failure tracking. Lives outside the store files
/// so a lockout decision never touches disk.
pub struct LoginLimiter {
    accounts: DashMap<String, FailureState>,
}

impl LoginLimiter {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    pub fn is_locked(&self, username: &str, now_ms: i64) -> bool {
        match self.accounts.get(username) {
            Some(state) => state.locked_until_ms > now_ms,
            None => false,
        }
    }

    /// Record a failed attempt; the fifth consecutive failure starts
    /// the lockout window.
    pub fn record_failure(&self, username: &str, now_ms: i64) {
        let mut state = self.accounts.entry(username.to_string()).or_default();
        if state.locked_until_ms <= now_ms {
            state.failures += 1;
            if state.failures >= MAX_FAILURES {
                state.locked_until_ms = now_ms + LOCKOUT_MS;
                state.failures = 0;
                log::warn!("Account {} locked out after repeated login failures", username);
            }
        }
    }

    pub fn record_success(&self, username: &str) {
        self.accounts.remove(username);
    }
}

impl Default for LoginLimiter {
    fn default() -> Self {
        Self::new()
    }
}
