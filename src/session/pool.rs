//! Resource pool owning the run's single shared session
//!
//! The pool creates its session lazily on the first `acquire`, hands the same
//! handle to every worker, and closes it once in `release_all`. Construction
//! happens under the pool's gate, so workers racing on the first acquire
//! still produce exactly one session.

use crate::session::{FetchError, FailureKind, Session, SessionFactory};
use crate::{CatalogError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use url::Url;

/// Shared handle to the pool's session
///
/// Every navigation holds the handle's lock, so only one worker drives the
/// session at a time.
pub struct SessionHandle {
    session: Mutex<Box<dyn Session>>,
}

impl SessionHandle {
    fn new(session: Box<dyn Session>) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }

    /// Navigates to `url` under the session lock
    ///
    /// `timeout` bounds the navigation itself; time spent waiting for the
    /// lock does not count against it.
    pub async fn navigate(&self, url: &Url, timeout: Duration) -> std::result::Result<String, FetchError> {
        let mut session = self.session.lock().await;
        match tokio::time::timeout(timeout, session.navigate(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::new(
                FailureKind::Timeout,
                url.as_str(),
                format!("no response within {:?}", timeout),
            )),
        }
    }

    async fn close(&self) {
        self.session.lock().await.close().await;
    }
}

#[derive(Default)]
struct Slot {
    session: Option<Arc<SessionHandle>>,
    released: bool,
}

/// Owner of the 0..1 lazily created session of a run
pub struct ResourcePool {
    factory: Arc<dyn SessionFactory>,
    slot: Mutex<Slot>,
    created: AtomicUsize,
}

impl ResourcePool {
    pub fn new(factory: Arc<dyn SessionFactory>) -> Self {
        Self {
            factory,
            slot: Mutex::new(Slot::default()),
            created: AtomicUsize::new(0),
        }
    }

    /// Returns the shared session, constructing it on first use
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::BackendUnavailable` if the factory cannot build
    /// a session, or if the pool has already been released.
    pub async fn acquire(&self) -> Result<Arc<SessionHandle>> {
        let mut slot = self.slot.lock().await;

        if slot.released {
            return Err(CatalogError::BackendUnavailable {
                message: "resource pool already released".to_string(),
            });
        }

        if let Some(handle) = &slot.session {
            return Ok(handle.clone());
        }

        tracing::debug!("Constructing fetch session");
        self.created.fetch_add(1, Ordering::SeqCst);
        let session = self.factory.create().await.map_err(|e| match e {
            CatalogError::BackendUnavailable { .. } => e,
            other => CatalogError::BackendUnavailable {
                message: other.to_string(),
            },
        })?;

        let handle = Arc::new(SessionHandle::new(session));
        slot.session = Some(handle.clone());
        tracing::info!("Fetch session ready");
        Ok(handle)
    }

    /// Closes the session if one exists
    ///
    /// Idempotent: only the first call closes anything. After release the
    /// pool refuses to construct a new session.
    pub async fn release_all(&self) {
        let handle = {
            let mut slot = self.slot.lock().await;
            slot.released = true;
            slot.session.take()
        };

        if let Some(handle) = handle {
            handle.close().await;
            tracing::info!("Fetch session released");
        }
    }

    /// Number of session construction attempts made by this pool
    pub fn sessions_created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}
