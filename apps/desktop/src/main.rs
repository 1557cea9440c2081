use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{bootstrap_workspace, AppConfig, Session, TasksView};
use item_store::HttpItemStore;
use shared::domain::{AppId, ItemId};

/// Headless client for the item-platform to-do app: runs the same session
/// pipelines as the GUI, one action per invocation.
#[derive(Parser, Debug)]
struct Args {
    /// Base URL of the item platform API
    #[arg(long)]
    api_base_url: String,
    /// Bearer token attached to every request
    #[arg(long)]
    api_token: Option<String>,
    /// App id of the "lists" schema
    #[arg(long)]
    lists_app_id: i64,
    /// App id of the "tasks" schema
    #[arg(long)]
    tasks_app_id: i64,
    /// Option id new tasks start in
    #[arg(long, default_value_t = 1)]
    pending_status_option: i64,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print all lists in the workspace
    Lists,
    /// Print the tasks of one list
    Tasks { list_id: i64 },
    /// Create a list
    CreateList { title: String },
    /// Create a task in a list
    CreateTask { list_id: i64, title: String },
    /// Flip a task between Pending and Done
    Toggle { task_id: i64 },
    /// Delete a task (its list keeps the dangling reference)
    DeleteTask { task_id: i64 },
    /// Delete a list (its tasks are not cascade-deleted)
    DeleteList { list_id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let store = Arc::new(HttpItemStore::new(&args.api_base_url, args.api_token.clone())?);
    let space_id = bootstrap_workspace(store.as_ref())
        .await
        .context("workspace bootstrap failed")?;
    let mut session = Session::new(
        store,
        space_id,
        AppConfig {
            lists_app: AppId(args.lists_app_id),
            tasks_app: AppId(args.tasks_app_id),
            pending_status_option: args.pending_status_option,
        },
    );
    session.initial_load().await?;

    match args.command {
        Command::Lists => print_lists(&session),
        Command::Tasks { list_id } => {
            session.navigate(&list_id.to_string()).await?;
            print_tasks(&session)?;
        }
        Command::CreateList { title } => {
            session.create_list(&title).await?;
            print_lists(&session);
        }
        Command::CreateTask { list_id, title } => {
            session.navigate(&list_id.to_string()).await?;
            session.create_task(&title).await?;
            print_tasks(&session)?;
        }
        Command::Toggle { task_id } => {
            session.toggle_task(ItemId(task_id)).await?;
            if let Some(task) = session.cache().task(ItemId(task_id)) {
                println!("{}: {}", task.title()?, task.status_label()?);
            }
        }
        Command::DeleteTask { task_id } => {
            session.delete_task(ItemId(task_id)).await?;
            println!("Deleted task {task_id}");
        }
        Command::DeleteList { list_id } => {
            session.delete_list(ItemId(list_id)).await?;
            println!("Deleted list {list_id}");
        }
    }
    Ok(())
}

fn print_lists(session: &Session) {
    let view = session.lists();
    if view.rows.is_empty() {
        println!("(no lists)");
        return;
    }
    for row in view.rows {
        println!("[{}] {}", row.id.0, row.title);
    }
}

fn print_tasks(session: &Session) -> Result<()> {
    match session.tasks()? {
        TasksView::NoSelection => println!("(no list selected)"),
        TasksView::NoTasks { .. } => println!("(No tasks)"),
        TasksView::Rows { rows, .. } => {
            for row in rows {
                let mark = if row.done { "x" } else { " " };
                println!("[{mark}] [{}] {}", row.id.0, row.title);
            }
        }
    }
    Ok(())
}
