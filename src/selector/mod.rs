// src/selector/mod.rs

//! Task selection strategies.
//!
//! A [`Selector`] receives the eligible tasks of one stage grouped by owner and
//! picks at most `capacity` of them. Grouping and per-user ordering happen in
//! [`group_by_user`]; selectors never compare tasks themselves.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use crate::pipeline::Task;

pub mod round_robin;

pub use round_robin::RoundRobin;

/// Per-user task queues, keyed (and therefore iterated) by user name.
pub type TasksByUser = BTreeMap<String, VecDeque<Task>>;

/// Strategy that turns grouped candidates into a bounded submission list.
pub trait Selector: Send + Sync + fmt::Debug {
    /// Pick at most `capacity` tasks, in submission order.
    fn select(&self, capacity: usize, tasks_by_user: TasksByUser) -> Vec<Task>;

    /// Identifier logged alongside each scheduling cycle.
    fn version(&self) -> &str;
}

/// Group tasks by owner, each queue sorted by priority then newest first.
pub fn group_by_user(tasks: Vec<Task>) -> TasksByUser {
    let mut grouped: BTreeMap<String, Vec<Task>> = BTreeMap::new();
    for task in tasks {
        grouped.entry(task.user.clone()).or_default().push(task);
    }

    grouped
        .into_iter()
        .map(|(user, mut queue)| {
            queue.sort_by(|a, b| {
                b.priority
                    .cmp(&a.priority)
                    .then_with(|| b.creation_time.cmp(&a.creation_time))
            });
            (user, VecDeque::from(queue))
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::test_support::task;
    use super::*;

    fn ids(queue: &VecDeque<Task>) -> Vec<&str> {
        queue.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn groups_by_user_in_name_order() {
        let grouped = group_by_user(vec![
            task("c1", "carol", 0, 0),
            task("a1", "alice", 0, 0),
            task("b1", "bob", 0, 0),
            task("a2", "alice", 0, 1),
        ]);

        let users: Vec<_> = grouped.keys().map(String::as_str).collect();
        assert_eq!(users, vec!["alice", "bob", "carol"]);
        assert_eq!(grouped["alice"].len(), 2);
    }

    #[test]
    fn higher_priority_first_then_newest() {
        let grouped = group_by_user(vec![
            task("old-low", "alice", 1, 0),
            task("new-low", "alice", 1, 10),
            task("old-high", "alice", 5, 0),
            task("new-high", "alice", 5, 10),
        ]);

        assert_eq!(
            ids(&grouped["alice"]),
            vec!["new-high", "old-high", "new-low", "old-low"]
        );
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(group_by_user(Vec::new()).is_empty());
    }
}
