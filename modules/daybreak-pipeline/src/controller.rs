use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use daybreak_common::{DigestError, DigestState};
use daybreak_store::Store;

/// Durable digest lifecycle operations. The store implements this against
/// the `digests` table; tests substitute an in-memory lifecycle.
#[async_trait]
pub trait DigestLifecycle: Send + Sync {
    async fn create(&self) -> Result<i64, DigestError>;
    async fn latest_incomplete(&self) -> Result<(i64, DigestState), DigestError>;
    async fn set_state(&self, digest_id: i64, state: DigestState) -> Result<(), DigestError>;
}

#[async_trait]
impl DigestLifecycle for Store {
    async fn create(&self) -> Result<i64, DigestError> {
        self.create_digest(Utc::now()).await
    }

    async fn latest_incomplete(&self) -> Result<(i64, DigestState), DigestError> {
        let digest = self.latest_incomplete_digest().await?;
        Ok((digest.id, digest.status))
    }

    async fn set_state(&self, digest_id: i64, state: DigestState) -> Result<(), DigestError> {
        self.set_digest_state(digest_id, state, Utc::now()).await
    }
}

/// Gates every pipeline stage on the digest state machine.
///
/// `advance` verifies the latest incomplete digest is in the expected state,
/// runs the stage, and only then moves the digest forward. A failing stage
/// leaves the state untouched; a state mismatch fails before the stage runs.
pub struct DigestController {
    lifecycle: Arc<dyn DigestLifecycle>,
}

impl DigestController {
    pub fn new(lifecycle: Arc<dyn DigestLifecycle>) -> Self {
        Self { lifecycle }
    }

    /// Create a new digest in state CREATED and return its id.
    ///
    /// At most one digest is ever in flight: creation is refused while an
    /// earlier digest has not reached READY.
    pub async fn create(&self) -> Result<i64, DigestError> {
        match self.lifecycle.latest_incomplete().await {
            Ok((digest_id, state)) => Err(DigestError::Validation(format!(
                "digest {digest_id} is still in state {state}"
            ))),
            Err(DigestError::NoIncompleteDigest) => self.lifecycle.create().await,
            Err(e) => Err(e),
        }
    }

    /// Id and state of the newest digest that has not reached READY.
    pub async fn latest_incomplete(&self) -> Result<(i64, DigestState), DigestError> {
        self.lifecycle.latest_incomplete().await
    }

    /// Run `stage` against the active digest, advancing `expected` → `final_state`.
    pub async fn advance<T, F, Fut>(
        &self,
        expected: DigestState,
        final_state: DigestState,
        stage: F,
    ) -> Result<T, DigestError>
    where
        F: FnOnce(i64) -> Fut,
        Fut: Future<Output = Result<T, DigestError>>,
    {
        let (digest_id, actual) = self.lifecycle.latest_incomplete().await?;
        if actual != expected {
            return Err(DigestError::WrongState {
                digest_id,
                actual,
                expected,
            });
        }

        info!(digest_id, from = %expected, to = %final_state, "Running digest stage");
        let result = stage(digest_id).await?;

        self.lifecycle.set_state(digest_id, final_state).await?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// In-memory lifecycle holding a single digest row.
    struct MemoryLifecycle {
        state: Mutex<Option<(i64, DigestState)>>,
    }

    impl MemoryLifecycle {
        fn with_digest(id: i64, state: DigestState) -> Arc<Self> {
            Arc::new(Self {
                state: Mutex::new(Some((id, state))),
            })
        }

        fn current(&self) -> Option<(i64, DigestState)> {
            *self.state.lock().unwrap()
        }
    }

    #[async_trait]
    impl DigestLifecycle for MemoryLifecycle {
        async fn create(&self) -> Result<i64, DigestError> {
            let mut state = self.state.lock().unwrap();
            let id = state.map(|(id, _)| id + 1).unwrap_or(0);
            *state = Some((id, DigestState::Created));
            Ok(id)
        }

        async fn latest_incomplete(&self) -> Result<(i64, DigestState), DigestError> {
            self.current()
                .filter(|(_, s)| *s != DigestState::Ready)
                .ok_or(DigestError::NoIncompleteDigest)
        }

        async fn set_state(&self, digest_id: i64, state: DigestState) -> Result<(), DigestError> {
            *self.state.lock().unwrap() = Some((digest_id, state));
            Ok(())
        }
    }

    #[tokio::test]
    async fn advance_runs_stage_and_moves_state() {
        let lifecycle = MemoryLifecycle::with_digest(3, DigestState::Created);
        let controller = DigestController::new(lifecycle.clone());

        let seen = controller
            .advance(
                DigestState::Created,
                DigestState::ArticlesCollected,
                |id| async move { Ok(id) },
            )
            .await
            .unwrap();

        assert_eq!(seen, 3);
        assert_eq!(
            lifecycle.current(),
            Some((3, DigestState::ArticlesCollected))
        );
    }

    #[tokio::test]
    async fn wrong_state_fails_before_the_stage_runs() {
        let lifecycle = MemoryLifecycle::with_digest(7, DigestState::ArticlesEmbedded);
        let controller = DigestController::new(lifecycle.clone());

        let ran = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let ran_in_stage = ran.clone();

        let err = controller
            .advance(
                DigestState::Created,
                DigestState::ArticlesCollected,
                |_| async move {
                    ran_in_stage.store(true, std::sync::atomic::Ordering::SeqCst);
                    Ok(())
                },
            )
            .await
            .unwrap_err();

        match err {
            DigestError::WrongState {
                digest_id,
                actual,
                expected,
            } => {
                assert_eq!(digest_id, 7);
                assert_eq!(actual, DigestState::ArticlesEmbedded);
                assert_eq!(expected, DigestState::Created);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!ran.load(std::sync::atomic::Ordering::SeqCst));
        // Row untouched.
        assert_eq!(
            lifecycle.current(),
            Some((7, DigestState::ArticlesEmbedded))
        );
    }

    #[tokio::test]
    async fn failing_stage_leaves_state_unchanged() {
        let lifecycle = MemoryLifecycle::with_digest(1, DigestState::ImagesCollected);
        let controller = DigestController::new(lifecycle.clone());

        let err = controller
            .advance::<(), _, _>(
                DigestState::ImagesCollected,
                DigestState::RundownsGenerated,
                |_| async move {
                    Err(DigestError::Summariser {
                        attempts: 3,
                        cause: "malformed response".to_string(),
                    })
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DigestError::Summariser { .. }));
        assert_eq!(
            lifecycle.current(),
            Some((1, DigestState::ImagesCollected))
        );
    }

    #[tokio::test]
    async fn create_refuses_while_a_digest_is_in_flight() {
        let lifecycle = MemoryLifecycle::with_digest(4, DigestState::StoriesGenerated);
        let controller = DigestController::new(lifecycle.clone());

        let err = controller.create().await.unwrap_err();
        assert!(matches!(err, DigestError::Validation(_)));
        assert_eq!(
            lifecycle.current(),
            Some((4, DigestState::StoriesGenerated))
        );
    }

    #[tokio::test]
    async fn create_succeeds_once_the_previous_digest_is_ready() {
        let lifecycle = MemoryLifecycle::with_digest(4, DigestState::Ready);
        let controller = DigestController::new(lifecycle.clone());

        let id = controller.create().await.unwrap();
        assert_eq!(id, 5);
        assert_eq!(lifecycle.current(), Some((5, DigestState::Created)));
    }

    #[tokio::test]
    async fn no_incomplete_digest_is_an_error() {
        let lifecycle = MemoryLifecycle::with_digest(2, DigestState::Ready);
        let controller = DigestController::new(lifecycle);

        let err = controller
            .advance(
                DigestState::Created,
                DigestState::ArticlesCollected,
                |id| async move { Ok(id) },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DigestError::NoIncompleteDigest));
    }
}
