use std::time::Duration;

/// Probe budget for identity-provider readiness, mirroring the sign-in
/// script's bounded retry loop.
pub const MAX_ATTEMPTS: u32 = 50;
pub const PROBE_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GateError {
    #[error("identity provider is not configured")]
    NotConfigured,
    #[error("identity provider not ready after {0} attempts")]
    Exhausted(u32),
}

/// Readiness gate for the external identity provider.
///
/// Replaces open-coded polling timers with one explicit check that resolves
/// exactly once: the first successful probe is memoized, so repeated
/// initialization calls are no-ops and never re-register anything. Probe
/// exhaustion is reported to the caller and logged; it does not take the
/// daemon down.
pub struct ProviderGate {
    client_id: Option<String>,
    initialized: bool,
    delay: Duration,
}

impl ProviderGate {
    pub fn new(client_id: Option<String>) -> Self {
        let client_id = client_id
            .filter(|id| !id.trim().is_empty() && !id.contains("YOUR_GOOGLE_CLIENT_ID"));
        ProviderGate {
            client_id,
            initialized: false,
            delay: PROBE_DELAY,
        }
    }

    #[cfg(test)]
    fn with_delay(client_id: Option<String>, delay: Duration) -> Self {
        let mut gate = Self::new(client_id);
        gate.delay = delay;
        gate
    }

    pub fn is_configured(&self) -> bool {
        self.client_id.is_some()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    /// Drives `probe` until it reports ready or the attempt budget runs out.
    /// Once ready, later calls return immediately without probing again.
    pub fn ensure_ready(&mut self, mut probe: impl FnMut() -> bool) -> Result<(), GateError> {
        if self.initialized {
            return Ok(());
        }
        if self.client_id.is_none() {
            return Err(GateError::NotConfigured);
        }

        for attempt in 1..=MAX_ATTEMPTS {
            if probe() {
                self.initialized = true;
                tracing::debug!(attempt, "identity provider ready");
                return Ok(());
            }
            if attempt < MAX_ATTEMPTS {
                std::thread::sleep(self.delay);
            }
        }

        tracing::warn!(
            attempts = MAX_ATTEMPTS,
            "identity provider never became ready; sign-in stays unavailable"
        );
        Err(GateError::Exhausted(MAX_ATTEMPTS))
    }
}
