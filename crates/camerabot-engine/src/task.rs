use std::fmt::Display;
use std::future::Future;

use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Spawn a fallible future under a name.
///
/// The returned handle resolves once the inner task is over. An error result
/// or a panic is logged at error level with the task name; nothing is
/// re-raised, so the spawner keeps running.
pub fn spawn_named<F, E>(name: impl Into<String>, future: F) -> JoinHandle<()>
where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let name = name.into();
    let inner = tokio::spawn(future);

    tokio::spawn(async move {
        match inner.await {
            Ok(Ok(())) => debug!(task = %name, "Task finished"),
            Ok(Err(e)) => {
                error!(task = %name, error = %e, "Task \"{}\" raised an exception", name)
            }
            Err(e) if e.is_panic() => error!(task = %name, "Task \"{}\" panicked", name),
            Err(_) => debug!(task = %name, "Task cancelled"),
        }
    })
}
