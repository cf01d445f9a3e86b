use serde::{Deserialize, Serialize};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub id: u64,
    pub title: String,
    pub is_completed: bool,
}

#[derive(Debug, Default)]
struct TodoState {
    items: Vec<TodoItem>,
    next_id: u64,
}

/// In-memory todo store. Ids are assigned monotonically and never reused,
/// even after deletion.
#[derive(Debug)]
pub struct TodoStore {
    state: Mutex<TodoState>,
}

impl TodoStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TodoState {
                items: Vec::new(),
                next_id: 1,
            }),
        }
    }

    pub fn all(&self) -> Vec<TodoItem> {
        self.state.lock().expect("todo store lock").items.clone()
    }

    pub fn get(&self, id: u64) -> Option<TodoItem> {
        self.state
            .lock()
            .expect("todo store lock")
            .items
            .iter()
            .find(|item| item.id == id)
            .cloned()
    }

    pub fn create(&self, title: impl Into<String>) -> TodoItem {
        let mut state = self.state.lock().expect("todo store lock");
        let item = TodoItem {
            id: state.next_id,
            title: title.into(),
            is_completed: false,
        };
        state.next_id += 1;
        state.items.push(item.clone());
        item
    }

    pub fn update(
        &self,
        id: u64,
        title: Option<String>,
        is_completed: Option<bool>,
    ) -> Option<TodoItem> {
        let mut state = self.state.lock().expect("todo store lock");
        let item = state.items.iter_mut().find(|item| item.id == id)?;
        if let Some(title) = title {
            item.title = title;
        }
        if let Some(done) = is_completed {
            item.is_completed = done;
        }
        Some(item.clone())
    }

    pub fn delete(&self, id: u64) -> bool {
        let mut state = self.state.lock().expect("todo store lock");
        let before = state.items.len();
        state.items.retain(|item| item.id != id);
        state.items.len() != before
    }
}

impl Default for TodoStore {
    fn default() -> Self {
        Self::new()
    }
}
