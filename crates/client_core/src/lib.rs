//! Client session for the two-pane to-do hierarchy: the state cache, the
//! list/tasks relationship mutator, and the pipelines that sequence every
//! user action as mutate → reload → redraw.

use std::sync::Arc;

use item_store::{ItemStore, StoreError};
use shared::{
    domain::{
        AppId, Item, ItemId, SpaceId, FIELD_STATUS, FIELD_TASKS, FIELD_TITLE, STATUS_DONE,
        STATUS_PENDING,
    },
    error::MalformedItem,
    protocol::FieldsPayload,
};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{error, info};

pub mod router;
pub mod view;

pub use router::Router;
pub use view::{ListRow, ListsView, TaskRow, TasksView};

pub const ORG_NAME: &str = "todo-app-organization";
pub const SPACE_NAME: &str = "todo-app-space";

const RENDER_EVENT_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no cached list matches selection '{selection}'")]
    ListNotFound { selection: String },
    #[error("no cached task with id {task_id}")]
    TaskNotFound { task_id: i64 },
    #[error("pipeline '{pipeline}' cannot run step '{step}'")]
    StepMismatch {
        pipeline: &'static str,
        step: &'static str,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Malformed(#[from] MalformedItem),
}

/// Platform ids this client is configured against: the two app schemas and
/// the option id new tasks start in (the platform does not default category
/// fields on create).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppConfig {
    pub lists_app: AppId,
    pub tasks_app: AppId,
    pub pending_status_option: i64,
}

/// Latest known snapshot of the space's lists and tasks. Reload steps
/// replace a sequence wholesale; nothing patches it in place.
#[derive(Debug, Clone, Default)]
pub struct Cache {
    pub lists: Vec<Item>,
    pub tasks: Vec<Item>,
}

impl Cache {
    pub fn list(&self, list_id: ItemId) -> Option<&Item> {
        self.lists.iter().find(|item| item.item_id == list_id)
    }

    pub fn task(&self, task_id: ItemId) -> Option<&Item> {
        self.tasks.iter().find(|item| item.item_id == task_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Create,
    Mutate,
    Delete,
    ReloadLists,
    ReloadTasks,
    RedrawLists,
    RedrawTasks,
}

impl Step {
    pub fn name(self) -> &'static str {
        match self {
            Step::Create => "create",
            Step::Mutate => "mutate",
            Step::Delete => "delete",
            Step::ReloadLists => "reload-lists",
            Step::ReloadTasks => "reload-tasks",
            Step::RedrawLists => "redraw-lists",
            Step::RedrawTasks => "redraw-tasks",
        }
    }

    fn phase(self) -> Phase {
        match self {
            Step::Create | Step::Mutate | Step::Delete => Phase::Mutating,
            Step::ReloadLists | Step::ReloadTasks => Phase::Reloading,
            Step::RedrawLists | Step::RedrawTasks => Phase::Rendering,
        }
    }
}

/// One pipeline per user action. The step sequences are fixed data; the
/// session's driver executes them strictly in order and stops at the first
/// failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    CreateList,
    CreateTask,
    ToggleTask,
    DeleteTask,
    DeleteList,
    Navigation,
    InitialLoad,
}

impl Pipeline {
    pub fn steps(self) -> &'static [Step] {
        use Step::*;
        match self {
            Pipeline::CreateList => &[Create, ReloadLists, RedrawLists],
            Pipeline::CreateTask => &[Create, Mutate, ReloadLists, ReloadTasks, RedrawTasks],
            Pipeline::ToggleTask => &[Mutate, ReloadTasks, RedrawTasks],
            Pipeline::DeleteTask => &[Delete, ReloadLists, ReloadTasks, RedrawTasks],
            Pipeline::DeleteList => &[Delete, ReloadLists, RedrawLists],
            Pipeline::Navigation => &[RedrawLists, RedrawTasks],
            Pipeline::InitialLoad => &[ReloadLists, ReloadTasks, RedrawLists, RedrawTasks],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Pipeline::CreateList => "create-list",
            Pipeline::CreateTask => "create-task",
            Pipeline::ToggleTask => "toggle-task",
            Pipeline::DeleteTask => "delete-task",
            Pipeline::DeleteList => "delete-list",
            Pipeline::Navigation => "navigation",
            Pipeline::InitialLoad => "initial-load",
        }
    }
}

/// Observable state of the session's pipeline driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Mutating,
    Reloading,
    Rendering,
    Failed,
}

/// Fresh view model emitted by a redraw step. Shells paint these and never
/// read the cache directly.
#[derive(Debug, Clone)]
pub enum RenderEvent {
    Lists(ListsView),
    Tasks(TasksView),
}

#[derive(Debug)]
enum Action {
    CreateList {
        title: String,
    },
    CreateTask {
        title: String,
        created: Option<ItemId>,
    },
    ToggleTask {
        task_id: ItemId,
    },
    DeleteTask {
        task_id: ItemId,
    },
    DeleteList {
        list_id: ItemId,
    },
    Redraw,
}

/// One-time workspace discovery: the first organization (created if none
/// exist), then the dedicated space. The platform seeds every organization
/// with an "Employee Network" space, so when more than one space exists ours
/// is the second; otherwise it is created.
pub async fn bootstrap_workspace(store: &dyn ItemStore) -> Result<SpaceId, ClientError> {
    let organization = match store.organizations().await?.into_iter().next() {
        Some(organization) => organization,
        None => store.create_organization(ORG_NAME).await?,
    };
    info!(org_id = organization.org_id.0, name = %organization.name, "using organization");

    let mut spaces = store.spaces(organization.org_id).await?;
    let space = if spaces.len() > 1 {
        spaces.swap_remove(1)
    } else {
        store.create_space(SPACE_NAME, organization.org_id).await?
    };
    info!(space_id = space.space_id.0, name = %space.name, "using space");
    Ok(space.space_id)
}

/// One client instance: store handle, cache, router, and the pipeline
/// driver. Methods take `&mut self`, so pipelines of one session never
/// interleave. The cross-client staleness of the relation write is the
/// platform's documented consistency model and is kept as is.
pub struct Session {
    store: Arc<dyn ItemStore>,
    space_id: SpaceId,
    config: AppConfig,
    cache: Cache,
    router: Router,
    phase: Phase,
    events: broadcast::Sender<RenderEvent>,
}

impl Session {
    pub fn new(store: Arc<dyn ItemStore>, space_id: SpaceId, config: AppConfig) -> Self {
        let (events, _) = broadcast::channel(RENDER_EVENT_CAPACITY);
        Self {
            store,
            space_id,
            config,
            cache: Cache::default(),
            router: Router::new(),
            phase: Phase::Idle,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RenderEvent> {
        self.events.subscribe()
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Current selection fragment, verbatim; empty when no list is selected.
    pub fn selection(&self) -> &str {
        self.router.current()
    }

    pub fn lists(&self) -> ListsView {
        view::lists_view(&self.cache, self.router.current())
    }

    pub fn tasks(&self) -> Result<TasksView, ClientError> {
        view::tasks_view(&self.cache, self.router.current())
    }

    /// Startup pipeline: fill both caches, then render both panels.
    pub async fn initial_load(&mut self) -> Result<(), ClientError> {
        self.run(Pipeline::InitialLoad, Action::Redraw).await
    }

    pub async fn create_list(&mut self, title: &str) -> Result<(), ClientError> {
        let action = Action::CreateList {
            title: title.to_string(),
        };
        self.run(Pipeline::CreateList, action).await
    }

    /// Creates a task and attaches it to the currently selected list. The
    /// create runs first, so a missing selection leaves the created task
    /// orphaned on the server; there is no rollback.
    pub async fn create_task(&mut self, title: &str) -> Result<(), ClientError> {
        let action = Action::CreateTask {
            title: title.to_string(),
            created: None,
        };
        self.run(Pipeline::CreateTask, action).await
    }

    pub async fn toggle_task(&mut self, task_id: ItemId) -> Result<(), ClientError> {
        self.run(Pipeline::ToggleTask, Action::ToggleTask { task_id })
            .await
    }

    /// Delete-by-id only: the owning list's `tasks` field is not compacted,
    /// so the reference dangles until the list is rewritten.
    pub async fn delete_task(&mut self, task_id: ItemId) -> Result<(), ClientError> {
        self.run(Pipeline::DeleteTask, Action::DeleteTask { task_id })
            .await
    }

    /// Deleting a list does not cascade-delete its tasks.
    pub async fn delete_list(&mut self, list_id: ItemId) -> Result<(), ClientError> {
        self.run(Pipeline::DeleteList, Action::DeleteList { list_id })
            .await
    }

    /// Moves the router to `fragment` and, when that changes the selection,
    /// runs the navigation pipeline. Navigating to the current fragment is a
    /// no-op.
    pub async fn navigate(&mut self, fragment: &str) -> Result<(), ClientError> {
        if self.router.navigate(fragment) {
            return self.run(Pipeline::Navigation, Action::Redraw).await;
        }
        Ok(())
    }

    pub async fn back(&mut self) -> Result<(), ClientError> {
        if self.router.back() {
            return self.run(Pipeline::Navigation, Action::Redraw).await;
        }
        Ok(())
    }

    pub async fn forward(&mut self) -> Result<(), ClientError> {
        if self.router.forward() {
            return self.run(Pipeline::Navigation, Action::Redraw).await;
        }
        Ok(())
    }

    /// Read-modify-write of the list's `tasks` reference field. The current
    /// references come from the local cache, never the server: a stale cache
    /// means the write silently discards references another client added
    /// since the last reload. Last write wins; the new reference is appended
    /// in order with no dedup.
    pub async fn add_task_to_list(
        &mut self,
        list_id: ItemId,
        task_id: ItemId,
    ) -> Result<(), ClientError> {
        let list = self
            .cache
            .list(list_id)
            .ok_or_else(|| ClientError::ListNotFound {
                selection: list_id.0.to_string(),
            })?;
        let mut refs = list.task_refs();
        refs.push(task_id);
        let fields = FieldsPayload::new().references(FIELD_TASKS, refs);
        self.store.update_item_fields(list_id, fields).await?;
        Ok(())
    }

    async fn run(&mut self, pipeline: Pipeline, mut action: Action) -> Result<(), ClientError> {
        for step in pipeline.steps() {
            self.phase = step.phase();
            if let Err(err) = self.run_step(pipeline, *step, &mut action).await {
                self.phase = Phase::Failed;
                error!(
                    pipeline = pipeline.name(),
                    step = step.name(),
                    error = %err,
                    "pipeline step failed; remaining steps skipped"
                );
                return Err(err);
            }
        }
        self.phase = Phase::Idle;
        info!(pipeline = pipeline.name(), "pipeline complete");
        Ok(())
    }

    async fn run_step(
        &mut self,
        pipeline: Pipeline,
        step: Step,
        action: &mut Action,
    ) -> Result<(), ClientError> {
        match (step, &mut *action) {
            (Step::Create, Action::CreateList { title }) => {
                let fields = FieldsPayload::new().text(FIELD_TITLE, title.as_str());
                self.store
                    .create_item(self.config.lists_app, self.space_id, fields)
                    .await?;
            }
            (Step::Create, Action::CreateTask { title, created }) => {
                let fields = FieldsPayload::new()
                    .text(FIELD_TITLE, title.as_str())
                    .category(FIELD_STATUS, self.config.pending_status_option);
                let item = self
                    .store
                    .create_item(self.config.tasks_app, self.space_id, fields)
                    .await?;
                *created = Some(item.item_id);
            }
            (
                Step::Mutate,
                Action::CreateTask {
                    created: Some(task_id),
                    ..
                },
            ) => {
                let task_id = *task_id;
                let list_id = self.selected_list_id()?;
                self.add_task_to_list(list_id, task_id).await?;
            }
            (Step::Mutate, Action::ToggleTask { task_id }) => {
                let task_id = *task_id;
                self.write_toggled_status(task_id).await?;
            }
            (Step::Delete, Action::DeleteTask { task_id }) => {
                self.store.delete_item(*task_id).await?;
            }
            (Step::Delete, Action::DeleteList { list_id }) => {
                self.store.delete_item(*list_id).await?;
            }
            (Step::ReloadLists, _) => {
                self.cache.lists = self
                    .store
                    .filter_items(self.config.lists_app, self.space_id)
                    .await?;
            }
            (Step::ReloadTasks, _) => {
                self.cache.tasks = self
                    .store
                    .filter_items(self.config.tasks_app, self.space_id)
                    .await?;
            }
            (Step::RedrawLists, _) => {
                let lists = self.lists();
                let _ = self.events.send(RenderEvent::Lists(lists));
            }
            (Step::RedrawTasks, _) => {
                let tasks = self.tasks()?;
                let _ = self.events.send(RenderEvent::Tasks(tasks));
            }
            _ => {
                return Err(ClientError::StepMismatch {
                    pipeline: pipeline.name(),
                    step: step.name(),
                });
            }
        }
        Ok(())
    }

    fn selected_list_id(&self) -> Result<ItemId, ClientError> {
        let selection = self.router.current();
        selection
            .parse::<i64>()
            .map(ItemId)
            .map_err(|_| ClientError::ListNotFound {
                selection: selection.to_string(),
            })
    }

    /// Flips the status category by rewriting the field with the opposite
    /// option id, resolved by label from the task's own field config.
    async fn write_toggled_status(&mut self, task_id: ItemId) -> Result<(), ClientError> {
        let task = self
            .cache
            .task(task_id)
            .ok_or(ClientError::TaskNotFound { task_id: task_id.0 })?;
        let target = if task.status_is_done()? {
            STATUS_PENDING
        } else {
            STATUS_DONE
        };
        let option_id = task.status_option_id(target)?;
        let fields = FieldsPayload::new().category(FIELD_STATUS, option_id);
        self.store.update_item_fields(task_id, fields).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
