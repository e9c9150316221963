//! Shared fixtures: a small blog dataset (users, posts, comments) in the
//! in-memory store and presenters for each type.

#![allow(dead_code)]

use architect_presenter::{
    AssociationOptions, BoxScope, Condition, DeclaredPresenter, FieldOptions, FieldType, FieldValue, FilterOptions,
    MemoryStore, PresentParams, PresentedResponse, PresenterCollection, PresenterDefinition, PresentingOptions,
    PresentingSettings, Scope,
};
use chrono::{NaiveDate, TimeZone, Utc};
use tracing_subscriber::EnvFilter;

/// Routes pipeline logs to the test writer; filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn at(day: u32) -> FieldValue {
    FieldValue::from(Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).single())
}

pub fn epoch(day: u32) -> i64 {
    Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0)
        .single()
        .map(|t| t.timestamp())
        .unwrap_or_default()
}

pub fn on(day: u32) -> FieldValue {
    FieldValue::from(NaiveDate::from_ymd_opt(2024, 3, day))
}

/// Users 1-2; posts 1-5 (posts 1, 2 and 4 by user 1, 3 and 5 by user 2;
/// post 5 unpublished); comments 1-2 on post 1, 3 on post 2.
pub fn blog_store() -> MemoryStore {
    init_tracing();
    let store = MemoryStore::new();
    store.insert("User", 1, [("name", FieldValue::from("ann")), ("updated_at", at(1))]);
    store.insert("User", 2, [("name", FieldValue::from("bob")), ("updated_at", at(2))]);

    let posts = [
        (1, "alpha", 1, true),
        (2, "bravo", 1, true),
        (3, "charlie", 2, true),
        (4, "delta", 1, true),
        (5, "echo", 2, false),
    ];
    for (id, title, user_id, published) in posts {
        store.insert(
            "Post",
            id,
            [
                ("title", FieldValue::from(title)),
                ("user_id", FieldValue::from(user_id)),
                ("published", FieldValue::from(published)),
                ("created_on", on(id as u32)),
                ("updated_at", at(10 + id as u32)),
            ],
        );
    }

    let comments = [(1, 1, "first", 5), (2, 1, "second", 3), (3, 2, "third", 4)];
    for (id, post_id, body, rating) in comments {
        store.insert(
            "Comment",
            id,
            [
                ("post_id", FieldValue::from(post_id)),
                ("body", FieldValue::from(body)),
                ("rating", FieldValue::from(rating)),
                ("updated_at", at(20 + id as u32)),
            ],
        );
    }

    store.belongs_to("Post", "user", "User", "user_id");
    store.has_many("Post", "comments", "Comment", "post_id");
    store.belongs_to("Comment", "post", "Post", "post_id");
    store.has_many("User", "posts", "Post", "user_id");
    store
}

pub fn post_definition() -> PresenterDefinition {
    let mut post = PresenterDefinition::new();
    post.default_sort_order("id:asc")
        .and_then(|p| p.field("id", FieldType::Integer, FieldOptions::new()))
        .and_then(|p| p.field("title", FieldType::String, FieldOptions::new()))
        .and_then(|p| p.field("created_on", FieldType::Date, FieldOptions::new()))
        .and_then(|p| p.field("updated_at", FieldType::Datetime, FieldOptions::new()))
        .and_then(|p| {
            p.optional_field_with("title_length", FieldType::Integer, |record| {
                let len = record
                    .attribute("title")
                    .and_then(|t| t.as_str().map(str::len))
                    .unwrap_or_default();
                FieldValue::from(len as i64)
            })
        })
        .and_then(|p| p.association("user", "User", AssociationOptions::new()))
        .and_then(|p| p.association("comments", "Comment", AssociationOptions::new()))
        .and_then(|p| {
            p.filter("published", FilterOptions::new(), |scope: BoxScope, value: &str| {
                scope.where_condition(Condition::eq("published", value == "true"))
            })
        })
        .and_then(|p| {
            p.filter("title", FilterOptions::new(), |scope: BoxScope, value: &str| {
                scope.where_condition(Condition::contains("title", value))
            })
        })
        .and_then(|p| p.sort_order("id", "id"))
        .and_then(|p| p.sort_order("updated_at", "updated_at"))
        .and_then(|p| p.sort_order("title", "title"))
        .expect("post presenter");
    post
}

pub fn comment_definition() -> PresenterDefinition {
    let mut comment = PresenterDefinition::new();
    comment
        .field("id", FieldType::Integer, FieldOptions::new())
        .and_then(|c| c.optional_field("body", FieldType::String))
        .and_then(|c| c.optional_field("rating", FieldType::Integer))
        .and_then(|c| c.association("post", "Post", AssociationOptions::new()))
        .and_then(|c| c.sort_order("updated_at", "updated_at"))
        .expect("comment presenter");
    comment
}

pub fn user_definition() -> PresenterDefinition {
    let mut user = PresenterDefinition::new();
    user.field("id", FieldType::Integer, FieldOptions::new())
        .and_then(|u| u.field("name", FieldType::String, FieldOptions::new()))
        .and_then(|u| u.sort_order("updated_at", "updated_at"))
        .expect("user presenter");
    user
}

pub fn blog_collection() -> PresenterCollection {
    blog_collection_with(PresentingSettings::default())
}

pub fn blog_collection_with(settings: PresentingSettings) -> PresenterCollection {
    let mut collection = PresenterCollection::with_settings(settings);
    collection
        .presents(DeclaredPresenter::new(post_definition()), &["Post"])
        .expect("register posts");
    collection
        .presents(DeclaredPresenter::new(comment_definition()), &["Comment"])
        .expect("register comments");
    collection
        .presents(DeclaredPresenter::new(user_definition()), &["User"])
        .expect("register users");
    collection.finalize_registration();
    collection
}

/// Presents `name` against the store with `params`.
pub fn present(
    collection: &PresenterCollection,
    store: &MemoryStore,
    name: &str,
    params: PresentParams,
) -> PresentedResponse {
    collection
        .presenting(name, PresentingOptions::from(params), |record_type| {
            Box::new(store.scope(record_type)) as BoxScope
        })
        .expect("presenting")
}

pub fn ids(response: &PresentedResponse, key: &str) -> Vec<i64> {
    response
        .get(key)
        .unwrap_or_default()
        .iter()
        .filter_map(|r| r.get("id").and_then(FieldValue::as_i64))
        .collect()
}

/// Ids a scope yields, in order.
pub fn scope_ids(scope: &dyn Scope) -> Vec<i64> {
    scope
        .to_list()
        .expect("to_list")
        .iter()
        .map(|r| r.id())
        .collect()
}
