//! Task dispatcher writing into the durable queue.

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{DomainError, DomainResult};
use crate::ports::{TaskDispatcherPort, TaskRequest};
use crate::storage::TaskQueue;

/// Dispatches tasks by inserting rows into the `tasks` table. A failed
/// insert fails the enclosing task so redelivery re-enqueues the chain.
#[derive(Clone)]
pub struct QueueTaskDispatcher {
    queue: TaskQueue,
}

impl QueueTaskDispatcher {
    pub fn new(queue: TaskQueue) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl TaskDispatcherPort for QueueTaskDispatcher {
    async fn dispatch(&self, task: TaskRequest) -> DomainResult<()> {
        let name = task.name();
        let id = self.queue.enqueue(&task).map_err(|err| DomainError::TaskDispatch {
            task: name.to_string(),
            reason: err.to_string(),
        })?;
        debug!(task = name, task_id = id, "Task dispatched");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    #[tokio::test]
    async fn dispatch_lands_in_the_queue() {
        let queue = TaskQueue::new(Database::open_in_memory().unwrap());
        let dispatcher = QueueTaskDispatcher::new(queue.clone());

        dispatcher
            .dispatch(TaskRequest::ComputeShopScore {
                page_id: "p-1".into(),
            })
            .await
            .unwrap();

        assert_eq!(queue.pending_count().unwrap(), 1);
        let task = queue.claim_next().unwrap().unwrap();
        assert_eq!(task.request.name(), "compute_shop_score");
    }
}
