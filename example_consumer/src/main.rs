//! Example consumer: a separate Rust project that serves presented records
//! from an in-memory store.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Then try `GET /workspaces?include=tasks:notes&order=title:asc`.

use architect_presenter::{
    common_routes_with_ready, install_global, presenting_routes, validate, AssociationOptions, Condition,
    DeclaredPresenter, FieldOptions, FieldType, FieldValue, FilterOptions, MemoryStore, PresenterCollection,
    PresenterDefinition, PresentingSettings, PresentingState,
};
use chrono::{NaiveDate, TimeZone, Utc};
use std::sync::Arc;
use tokio::net::TcpListener;

fn sample_store() -> MemoryStore {
    let store = MemoryStore::new();
    let created = |day: u32| FieldValue::from(Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).single());
    store.insert("User", 1, [("name", FieldValue::from("Ada")), ("updated_at", created(1))]);
    store.insert("User", 2, [("name", FieldValue::from("Grace")), ("updated_at", created(2))]);
    store.insert(
        "Workspace",
        1,
        [
            ("title", FieldValue::from("Platform")),
            ("user_id", FieldValue::from(1)),
            ("updated_at", created(3)),
        ],
    );
    store.insert(
        "Workspace",
        2,
        [
            ("title", FieldValue::from("Billing")),
            ("user_id", FieldValue::from(2)),
            ("updated_at", created(4)),
        ],
    );
    for (id, workspace_id, title, done) in [(1, 1, "Rotate keys", false), (2, 1, "Ship v2", true), (3, 2, "Invoices", false)] {
        store.insert(
            "Task",
            id,
            [
                ("title", FieldValue::from(title)),
                ("workspace_id", FieldValue::from(workspace_id)),
                ("done", FieldValue::from(done)),
                ("due_on", FieldValue::from(NaiveDate::from_ymd_opt(2024, 4, id as u32))),
                ("updated_at", created(5)),
            ],
        );
    }
    store.belongs_to("Workspace", "user", "User", "user_id");
    store.has_many("Workspace", "tasks", "Task", "workspace_id");
    store.belongs_to("Task", "workspace", "Workspace", "workspace_id");
    store
}

fn presenters(settings: PresentingSettings) -> Result<PresenterCollection, Box<dyn std::error::Error>> {
    let mut collection = PresenterCollection::with_settings(settings);

    let mut workspace = PresenterDefinition::new();
    workspace
        .title("Workspaces")?
        .default_sort_order("updated_at:desc")?
        .field("id", FieldType::Integer, FieldOptions::new())?
        .field("title", FieldType::String, FieldOptions::new().info("display name"))?
        .field("updated_at", FieldType::Datetime, FieldOptions::new())?
        .association("user", "User", AssociationOptions::new())?
        .association("tasks", "Task", AssociationOptions::new())?
        .filter("title", FilterOptions::new(), |scope, value| {
            scope.where_condition(Condition::contains("title", value))
        })?
        .sort_order("updated_at", "updated_at")?
        .sort_order("title", "title")?;
    collection.presents(DeclaredPresenter::new(workspace), &["Workspace"])?;

    let mut task = PresenterDefinition::new();
    task.default_sort_order("updated_at:desc")?
        .field("id", FieldType::Integer, FieldOptions::new())?
        .field("title", FieldType::String, FieldOptions::new())?
        .field("due_on", FieldType::Date, FieldOptions::new())?
        .optional_field_with("notes", FieldType::String, |record| {
            FieldValue::from(format!("task #{}", record.id()))
        })?
        .association("workspace", "Workspace", AssociationOptions::new())?
        .filter("done", FilterOptions::new().default_value("false"), |scope, value| {
            scope.where_condition(Condition::eq("done", value == "true"))
        })?
        .sort_order("updated_at", "updated_at")?;
    collection.presents(DeclaredPresenter::new(task), &["Task"])?;

    let mut user = PresenterDefinition::new();
    user.field("id", FieldType::Integer, FieldOptions::new())?
        .field("name", FieldType::String, FieldOptions::new())?
        .sort_order("updated_at", "updated_at")?;
    collection.presents(DeclaredPresenter::new(user), &["User"])?;

    validate(collection.registry())?;
    Ok(collection)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("architect_presenter=debug")),
        )
        .init();

    let collection = install_global(presenters(PresentingSettings::from_env())?)?;
    let state = PresentingState::new(collection, Arc::new(sample_store()));

    let app = common_routes_with_ready(state.clone()).merge(presenting_routes(state));
    let listener = TcpListener::bind("127.0.0.1:3000").await?;
    let port = listener.local_addr()?.port();
    tracing::info!("Example consumer listening on http://127.0.0.1:{}", port);
    axum::serve(listener, app).await?;
    Ok(())
}
