use super::CalibrationSession;
use core::fmt::{Display, Formatter};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// The backing storage could not be reached.
    Unavailable,
    /// A stored session could not be decoded.
    Corrupt,
    /// No room for another session.
    Full,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unavailable => write!(f, "session store unavailable"),
            Self::Corrupt => write!(f, "stored session is corrupt"),
            Self::Full => write!(f, "session store is full"),
        }
    }
}

/// Keeps calibration sessions between invocations.
///
/// At most one session exists per device identity; `save` replaces it.
#[allow(async_fn_in_trait)]
pub trait SessionStore {
    async fn load(&mut self, device: &str) -> Result<Option<CalibrationSession>, StoreError>;

    async fn save(&mut self, session: &CalibrationSession) -> Result<(), StoreError>;

    async fn remove(&mut self, device: &str) -> Result<(), StoreError>;
}

/// Single-slot in-memory store, one per device.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Option<CalibrationSession>,
}

impl MemorySessionStore {
    pub const fn new() -> Self {
        Self { session: None }
    }
}

impl SessionStore for MemorySessionStore {
    async fn load(&mut self, device: &str) -> Result<Option<CalibrationSession>, StoreError> {
        Ok(self
            .session
            .as_ref()
            .filter(|s| s.device.as_str() == device)
            .cloned())
    }

    async fn save(&mut self, session: &CalibrationSession) -> Result<(), StoreError> {
        match &self.session {
            Some(current) if current.device != session.device => Err(StoreError::Full),
            _ => {
                self.session.replace(session.clone());
                Ok(())
            }
        }
    }

    async fn remove(&mut self, device: &str) -> Result<(), StoreError> {
        if matches!(&self.session, Some(s) if s.device.as_str() == device) {
            self.session.take();
        }
        Ok(())
    }
}
