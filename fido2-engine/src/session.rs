use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Session scoped security posture shared between the unlock/verification flow and every
/// engine invocation.
///
/// The user-verified flag is written once per explicit verification event (biometric,
/// device credential, or vault unlock) and read by each credential operation whose
/// options require verification. It is a single-writer/multiple-reader value; the atomic
/// is only there to avoid a torn read, not to serialize requests, and no lock is ever
/// held across a suspension point.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    user_verified: Arc<AtomicBool>,
}

impl SessionContext {
    /// Create a session in which the user has not yet been verified.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of an explicit user verification event.
    pub fn set_user_verified(&self, verified: bool) {
        self.user_verified.store(verified, Ordering::Release);
    }

    /// Whether the user has performed an explicit verification action this session.
    pub fn is_user_verified(&self) -> bool {
        self.user_verified.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::SessionContext;

    #[test]
    fn verification_state_is_shared_between_clones() {
        let session = SessionContext::new();
        let reader = session.clone();
        assert!(!reader.is_user_verified());

        session.set_user_verified(true);
        assert!(reader.is_user_verified());

        session.set_user_verified(false);
        assert!(!reader.is_user_verified());
    }
}
