//! Field resolution, association ids and date normalization on single records.

mod common;

use architect_presenter::presenter::{post_process, FieldDescriptor, Presented, Slot};
use architect_presenter::{
    DeclaredPresenter, FieldOptions, FieldType, FieldValue, Presenter, PresenterDefinition, Record, Related,
};
use common::{blog_store, comment_definition, epoch, post_definition};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn as_json(value: architect_presenter::Struct) -> serde_json::Value {
    FieldValue::Map(value).to_json()
}

#[test]
fn dates_become_strings_and_timestamps_become_epoch() {
    let store = blog_store();
    let mut definition = PresenterDefinition::new();
    definition
        .field("title", FieldType::String, FieldOptions::new())
        .and_then(|d| d.field("created_on", FieldType::Date, FieldOptions::new()))
        .and_then(|d| d.field("updated_at", FieldType::Datetime, FieldOptions::new()))
        .unwrap();
    let presenter = DeclaredPresenter::new(definition);
    let post = store.find("Post", 2).unwrap();

    let out = presenter.present_and_post_process(post.as_ref(), &[], &[]);
    assert_eq!(
        as_json(out),
        json!({"title": "bravo", "created_on": "2024-03-02", "updated_at": epoch(12)})
    );
}

#[test]
fn optional_fields_only_when_requested_and_only_computed_then() {
    let store = blog_store();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut definition = PresenterDefinition::new();
    definition
        .field("id", FieldType::Integer, FieldOptions::new())
        .and_then(|d| {
            d.optional_field_with("expensive", FieldType::Integer, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                FieldValue::from(42)
            })
        })
        .unwrap();
    let presenter = DeclaredPresenter::new(definition);
    let post = store.find("Post", 1).unwrap();

    let plain = presenter.present_and_post_process(post.as_ref(), &[], &[]);
    assert!(!plain.contains_key("expensive"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let requested = presenter.present_and_post_process(post.as_ref(), &["expensive".to_string()], &[]);
    assert_eq!(requested.get("expensive"), Some(&FieldValue::Int(42)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn unrequested_association_uses_foreign_key_column() {
    let store = blog_store();
    let presenter = DeclaredPresenter::new(post_definition());
    let post = store.find("Post", 3).unwrap();

    let out = presenter.present_and_post_process(post.as_ref(), &[], &[]);
    assert_eq!(out.get("user_id"), Some(&FieldValue::Int(2)));
    assert!(!out.contains_key("comment_ids"));
    assert!(!out.contains_key("user"));
    assert!(!out.contains_key("comments"));
}

#[test]
fn requested_associations_write_singular_or_plural_ids() {
    let store = blog_store();
    let presenter = DeclaredPresenter::new(post_definition());
    let post = store.find("Post", 1).unwrap();

    let out = presenter.present_and_post_process(
        post.as_ref(),
        &[],
        &["comments".to_string(), "user".to_string()],
    );
    assert_eq!(
        out.get("comment_ids"),
        Some(&FieldValue::List(vec![FieldValue::Int(1), FieldValue::Int(2)]))
    );
    assert_eq!(out.get("user_id"), Some(&FieldValue::Int(1)));
}

#[test]
fn dynamic_association_values_pass_through() {
    let store = blog_store();
    let mut presented = Presented::new();
    presented.insert("id".into(), Slot::Value(FieldValue::Int(7)));
    presented.insert(
        "tags".into(),
        Slot::Field(FieldDescriptor::Association(
            architect_presenter::presenter::AssociationField::dynamic(|_| {
                Some(Related::Value(FieldValue::from(vec!["a", "b"])))
            }),
        )),
    );
    presented.insert("score".into(), Slot::Field(FieldDescriptor::optional_with(|| FieldValue::from(1.5))));
    let post = store.find("Post", 1).unwrap();

    let out = post_process(presented.clone(), post.as_ref(), &[], &["tags".to_string()]);
    assert_eq!(as_json(out), json!({"id": 7, "tag_ids": ["a", "b"]}));

    let out = post_process(presented, post.as_ref(), &["score".to_string()], &[]);
    assert_eq!(as_json(out), json!({"id": 7, "score": 1.5}));
}

#[test]
fn nested_field_groups_present_as_maps() {
    let store = blog_store();
    let mut definition = PresenterDefinition::new();
    definition
        .field("id", FieldType::Integer, FieldOptions::new())
        .and_then(|d| {
            d.fields_in("meta", |meta| {
                meta.field("created_on", FieldType::Date, FieldOptions::new())?;
                meta.field(
                    "shout",
                    FieldType::String,
                    FieldOptions::new().dynamic(|record| {
                        let title = record.attribute("title").and_then(|t| t.as_str().map(str::to_uppercase));
                        FieldValue::from(title)
                    }),
                )?;
                Ok(())
            })
        })
        .unwrap();
    let presenter = DeclaredPresenter::new(definition);
    let post = store.find("Post", 4).unwrap();

    let out = presenter.present_and_post_process(post.as_ref(), &[], &[]);
    assert_eq!(
        as_json(out),
        json!({"id": 4, "meta": {"created_on": "2024-03-04", "shout": "DELTA"}})
    );
}

#[test]
fn optional_fields_inside_groups_need_a_request() {
    let store = blog_store();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut definition = PresenterDefinition::new();
    definition
        .field("id", FieldType::Integer, FieldOptions::new())
        .and_then(|d| {
            d.fields_in("meta", |meta| {
                meta.field("title", FieldType::String, FieldOptions::new().optional())?;
                meta.field(
                    "weight",
                    FieldType::Integer,
                    FieldOptions::new().optional().dynamic(move |_| {
                        counter.fetch_add(1, Ordering::SeqCst);
                        FieldValue::from(9)
                    }),
                )?;
                meta.field("created_on", FieldType::Date, FieldOptions::new())?;
                Ok(())
            })
        })
        .unwrap();
    let presenter = DeclaredPresenter::new(definition);
    let post = store.find("Post", 1).unwrap();

    let plain = presenter.present_and_post_process(post.as_ref(), &[], &[]);
    assert_eq!(as_json(plain), json!({"id": 1, "meta": {"created_on": "2024-03-01"}}));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let requested = presenter.present_and_post_process(post.as_ref(), &["title".to_string()], &[]);
    assert_eq!(
        as_json(requested),
        json!({"id": 1, "meta": {"title": "alpha", "created_on": "2024-03-01"}})
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn group_present_runs_the_hook_once_and_keeps_order() {
    struct Counting {
        definition: PresenterDefinition,
        hooks: AtomicUsize,
    }

    impl Presenter for Counting {
        fn definition(&self) -> &PresenterDefinition {
            &self.definition
        }

        fn custom_preload(
            &self,
            _records: &[architect_presenter::RecordRef],
            _fields: &[String],
            _associations: &[String],
        ) {
            self.hooks.fetch_add(1, Ordering::SeqCst);
        }
    }

    let store = blog_store();
    let presenter = Counting {
        definition: comment_definition(),
        hooks: AtomicUsize::new(0),
    };
    let comments: Vec<_> = [3, 1, 2]
        .into_iter()
        .filter_map(|id| store.find("Comment", id))
        .collect();

    let out = presenter.group_present(&comments, &["body".to_string()], &[]);
    assert_eq!(presenter.hooks.load(Ordering::SeqCst), 1);
    let ids: Vec<i64> = out.iter().filter_map(|c| c.get("id").and_then(FieldValue::as_i64)).collect();
    assert_eq!(ids, vec![3, 1, 2]);
    assert_eq!(out[0].get("body"), Some(&FieldValue::from("third")));
    assert!(!out[0].contains_key("rating"));
    assert_eq!(out[0].get("post_id"), Some(&FieldValue::Int(2)));
    assert_eq!(comments[0].record_type(), "Comment");
}
