//! Backend commands queued from UI to the session worker.

use shared::domain::ItemId;

pub enum BackendCommand {
    CreateList { title: String },
    CreateTask { title: String },
    ToggleTask { task_id: ItemId },
    DeleteTask { task_id: ItemId },
    DeleteList { list_id: ItemId },
    SelectList { fragment: String },
    Back,
    Forward,
    Refresh,
}
