use super::types::TaskId;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Bounded FIFO of task ids candidate for immediate lease. Membership does
/// not imply the task's dependencies are resolved; the dispatcher filters at
/// lease time.
pub struct ReadyQueue {
    entries: Mutex<VecDeque<TaskId>>,
    capacity: usize,
}

impl ReadyQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Non-blocking push. Returns false when the queue is at capacity; the
    /// caller keeps the task stored and retries later.
    pub fn try_push(&self, id: TaskId) -> bool {
        let mut entries = self.entries.lock().unwrap();
        if entries.len() >= self.capacity {
            return false;
        }
        entries.push_back(id);
        true
    }

    pub fn pop(&self) -> Option<TaskId> {
        self.entries.lock().unwrap().pop_front()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
