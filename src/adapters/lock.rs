use crate::domain::ports::{LockGuard, RegistrationLock};
use crate::utils::error::{CheckinError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Lock shared by every registrar in this process. Clones share the mutex.
#[derive(Debug, Clone, Default)]
pub struct ProcessLock {
    inner: Arc<Mutex<()>>,
}

impl ProcessLock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RegistrationLock for ProcessLock {
    async fn acquire(&self, timeout: Duration) -> Result<LockGuard> {
        match tokio::time::timeout(timeout, self.inner.clone().lock_owned()).await {
            Ok(guard) => Ok(LockGuard::new(move || drop(guard))),
            Err(_) => {
                tracing::warn!("Registration lock not acquired within {:?}", timeout);
                Err(CheckinError::LockTimeout {
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }
}
