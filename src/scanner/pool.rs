use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Admission-controlled task spawner.
///
/// A fixed pool of permits bounds how many spawned tasks are in flight
/// at once. `spawn` acquires a permit *before* spawning and awaits when
/// the pool is exhausted, so a saturated pool back-pressures the caller
/// instead of piling up tasks or descriptors. The permit travels into
/// the task and is released when the task finishes, whether it returned
/// or died.
#[derive(Clone)]
pub struct BoundedPool {
    permits: Arc<Semaphore>,
    limit: usize,
}

impl BoundedPool {
    pub fn new(limit: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(limit.max(1))),
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Spawn `fut` once a permit is free. The returned handle must be
    /// awaited by the caller's join barrier; a handle that resolves to
    /// `Err` means the task died without producing its result.
    pub async fn spawn<F, T>(&self, fut: F) -> JoinHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .expect("admission semaphore closed");
        tokio::spawn(async move {
            let _permit = permit;
            fut.await
        })
    }
}
