//! Events flowing from the session worker to the UI thread. Each carries a
//! complete view model; the UI swaps its copy and repaints.

use client_core::{ListsView, TasksView};

pub enum UiEvent {
    Lists(ListsView),
    Tasks(TasksView),
}
