//! Pure projections from (cache, selection) to the view models the shells
//! paint. Projections are atomic: a malformed task fails the whole tasks
//! view instead of emitting partial rows.

use shared::domain::ItemId;

use crate::{Cache, ClientError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
    pub id: ItemId,
    pub title: String,
    /// Set when this row matches the current selection.
    pub active: bool,
    /// Fragment to hand the router when the row is picked.
    pub fragment: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListsView {
    pub rows: Vec<ListRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub id: ItemId,
    pub title: String,
    pub done: bool,
}

/// Task panel states. `NoTasks` covers an absent or empty reference field
/// and the case where every reference dangles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TasksView {
    NoSelection,
    NoTasks { list_id: ItemId },
    Rows { list_id: ItemId, rows: Vec<TaskRow> },
}

/// One row per cached list with a non-empty title; lists without one are
/// skipped, not errors.
pub fn lists_view(cache: &Cache, selection: &str) -> ListsView {
    let rows = cache
        .lists
        .iter()
        .filter_map(|list| {
            let title = list.title_text()?;
            let fragment = list.item_id.0.to_string();
            Some(ListRow {
                id: list.item_id,
                title: title.to_string(),
                active: fragment == selection,
                fragment,
            })
        })
        .collect();
    ListsView { rows }
}

/// Walks the selected list's `tasks` references in stored order. References
/// whose target is absent from the cached tasks are skipped silently (they
/// are never repaired); an unparsable or uncached selection is `NotFound`.
pub fn tasks_view(cache: &Cache, selection: &str) -> Result<TasksView, ClientError> {
    if selection.is_empty() {
        return Ok(TasksView::NoSelection);
    }
    let not_found = || ClientError::ListNotFound {
        selection: selection.to_string(),
    };
    let list_id = selection.parse::<i64>().map(ItemId).map_err(|_| not_found())?;
    let list = cache.list(list_id).ok_or_else(not_found)?;

    let mut rows = Vec::new();
    for task_id in list.task_refs() {
        let Some(task) = cache.task(task_id) else {
            continue;
        };
        rows.push(TaskRow {
            id: task.item_id,
            title: task.title()?.to_string(),
            done: task.status_is_done()?,
        });
    }
    if rows.is_empty() {
        return Ok(TasksView::NoTasks { list_id });
    }
    Ok(TasksView::Rows { list_id, rows })
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
