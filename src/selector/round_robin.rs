// src/selector/round_robin.rs

use super::{Selector, TasksByUser};
use crate::pipeline::Task;

/// Fair round-robin over users.
///
/// Each pass walks users in name order and takes the head of every non-empty
/// queue, so no user gets a second task while another still has one pending.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundRobin;

impl RoundRobin {
    pub const VERSION: &'static str = "Default Round Robin";
}

impl Selector for RoundRobin {
    fn select(&self, mut capacity: usize, mut tasks_by_user: TasksByUser) -> Vec<Task> {
        let mut selected = Vec::new();
        if capacity == 0 {
            return selected;
        }

        while capacity > 0 && !tasks_by_user.is_empty() {
            // `retain` visits keys in ascending order and drops drained users.
            tasks_by_user.retain(|_, queue| {
                if capacity == 0 {
                    return true;
                }
                if let Some(task) = queue.pop_front() {
                    selected.push(task);
                    capacity -= 1;
                }
                !queue.is_empty()
            });
        }

        selected
    }

    fn version(&self) -> &str {
        Self::VERSION
    }
}
