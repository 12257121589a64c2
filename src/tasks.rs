//! Read-only view of the task list the timer can link to.

use crate::persistence::{Store, TASKS_KEY};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Waiting,
    InProgress,
    Completed,
    Cancelled,
}

/// Statuses offered in the "link a task" picker.
pub const LINKABLE_STATUSES: [TaskStatus; 2] = [TaskStatus::Waiting, TaskStatus::InProgress];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    pub status: TaskStatus,
}

/// Source of task records owned elsewhere in the application.
pub trait TaskRegistry {
    fn all_tasks(&self) -> Vec<Task>;

    fn list_tasks(&self, statuses: &[TaskStatus]) -> Vec<Task> {
        self.all_tasks()
            .into_iter()
            .filter(|task| statuses.contains(&task.status))
            .collect()
    }

    fn lookup(&self, id: &str) -> Option<Task> {
        self.all_tasks().into_iter().find(|task| task.id == id)
    }
}

impl TaskRegistry for Store {
    /// Reads the stored task list, skipping records that don't decode.
    fn all_tasks(&self) -> Vec<Task> {
        let raw: Vec<Value> = self.get(TASKS_KEY, Vec::new());
        raw.into_iter()
            .filter_map(|value| match serde_json::from_value(value) {
                Ok(task) => Some(task),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable task record");
                    None
                }
            })
            .collect()
    }
}

impl TaskRegistry for [Task] {
    fn all_tasks(&self) -> Vec<Task> {
        self.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task(id: &str, status: TaskStatus) -> Task {
        Task {
            id: id.to_string(),
            name: format!("Task {id}"),
            description: None,
            labels: Vec::new(),
            status,
        }
    }

    #[test]
    fn test_list_tasks_filters_by_status() {
        let tasks = vec![
            task("1", TaskStatus::Waiting),
            task("2", TaskStatus::Completed),
            task("3", TaskStatus::InProgress),
            task("4", TaskStatus::Cancelled),
        ];

        let linkable = tasks.as_slice().list_tasks(&LINKABLE_STATUSES);
        let ids: Vec<_> = linkable.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_lookup() {
        let tasks = vec![task("1", TaskStatus::Waiting)];
        assert_eq!(tasks.as_slice().lookup("1").unwrap().name, "Task 1");
        assert!(tasks.as_slice().lookup("gone").is_none());
    }

    #[test]
    fn test_store_registry_reads_task_key() {
        let store = Store::open_in_memory().unwrap();
        store.set(
            TASKS_KEY,
            &json!([
                { "id": "1", "name": "Clean the house", "status": "waiting", "dueDate": "2025-08-28" },
                { "id": "2", "name": "Write report", "status": "in_progress", "labels": ["work"] },
                { "id": "3", "name": "Broken", "status": "someday" },
                { "id": "4", "name": "Done", "status": "completed" },
            ]),
        );

        let all = store.all_tasks();
        assert_eq!(all.len(), 3);

        let linkable = store.list_tasks(&LINKABLE_STATUSES);
        assert_eq!(linkable.len(), 2);
        assert_eq!(linkable[1].labels, vec!["work".to_string()]);
        assert_eq!(store.lookup("4").unwrap().status, TaskStatus::Completed);
    }

    #[test]
    fn test_store_registry_without_tasks() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.all_tasks().is_empty());
        assert!(store.lookup("1").is_none());
    }
}
