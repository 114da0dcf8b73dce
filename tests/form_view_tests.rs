//! Form view tests against an in-memory backend

mod common;

use common::MockTransport;
use lims::api::Method;
use lims::core::config::Config;
use lims::core::draft::InvestigationDraft;
use lims::core::entity::EntityKind;
use lims::core::route::Route;
use lims::views::form::submit_investigation;
use lims::views::{FormView, SubmitOutcome};
use serde_json::json;

#[tokio::test]
async fn test_missing_required_field_sends_nothing() {
    let mock = MockTransport::new();
    let client = mock.client();
    let mut view = FormView::create(EntityKind::Department, &Config::default());

    match view.submit(&client).await {
        SubmitOutcome::Invalid(errors) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].field, "dptname");
        }
        other => panic!("expected Invalid, got {:?}", other),
    }
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_create_posts_once_and_redirects_to_list() {
    let mock = MockTransport::new();
    mock.on(Method::Post, "/department", 201, json!({"data": {"id": 9}}));
    let client = mock.client();
    let mut view = FormView::create(EntityKind::Department, &Config::default());
    view.set("dptname", "Serology").unwrap();
    view.set("isactive", "no").unwrap();

    match view.submit(&client).await {
        SubmitOutcome::Saved {
            notification,
            redirect,
            delay,
            ..
        } => {
            assert_eq!(notification.message, "Department created successfully");
            assert_eq!(redirect, Route::List(EntityKind::Department));
            assert_eq!(delay.as_millis(), 1500);
        }
        other => panic!("expected Saved, got {:?}", other),
    }

    assert_eq!(mock.count(Method::Post, "/department"), 1);
    let body = mock.requests()[0].body.clone().unwrap();
    assert_eq!(body, json!({"dptname": "Serology", "isactive": false}));
    assert!(view.draft().is_empty());
}

#[tokio::test]
async fn test_server_field_errors_become_notifications() {
    let mock = MockTransport::new();
    mock.on(
        Method::Post,
        "/department",
        422,
        json!({
            "message": "Validation failed",
            "errors": [
                {"field": "dptname", "message": "already exists"},
                {"field": "isactive", "message": "is locked"}
            ]
        }),
    );
    let client = mock.client();
    let mut view = FormView::create(EntityKind::Department, &Config::default());
    view.set("dptname", "Serology").unwrap();

    match view.submit(&client).await {
        SubmitOutcome::Failed(notifications) => {
            let messages: Vec<_> = notifications.iter().map(|n| n.message.as_str()).collect();
            assert_eq!(messages, vec!["dptname: already exists", "isactive: is locked"]);
            assert!(notifications.iter().all(|n| n.is_error()));
        }
        other => panic!("expected Failed, got {:?}", other),
    }
    // The draft survives for a retry
    assert_eq!(view.draft().get("dptname"), Some("Serology"));
}

#[tokio::test]
async fn test_failed_lookup_leaves_other_options_loaded() {
    let mock = MockTransport::new();
    mock.on(
        Method::Get,
        "/department",
        200,
        json!([{"id": 1, "dptname": "Haematology"}, {"id": 2, "dptname": "Biochemistry"}]),
    );
    mock.on(Method::Get, "/specimen", 500, json!({}));
    mock.on(Method::Get, "/subdepartment", 200, json!({"data": []}));
    mock.on(Method::Get, "/instrument", 200, json!({"data": []}));
    let client = mock.client();

    let mut view = FormView::create(EntityKind::Investigation, &Config::default());
    let notifications = view.load_lookups(&client).await;

    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].message, "Failed to fetch specimen types");
    assert_eq!(view.options(EntityKind::Department).len(), 2);
    assert!(view.options(EntityKind::SpecimenType).is_empty());

    // Option labels resolve to ids
    view.set("department", "biochemistry").unwrap();
    assert_eq!(view.draft().get("department"), Some("2"));
}

#[tokio::test]
async fn test_update_prefills_and_puts() {
    let mock = MockTransport::new();
    mock.on(
        Method::Get,
        "/department/4",
        200,
        json!({"data": {"id": 4, "dptname": "Serology", "isactive": true}}),
    );
    mock.on(Method::Put, "/department/4", 200, json!({"message": "ok"}));
    let client = mock.client();

    let mut view = FormView::update(EntityKind::Department, "4", &Config::default());
    view.load_existing(&client).await.unwrap();
    assert_eq!(view.draft().get("dptname"), Some("Serology"));
    view.set("dptname", "Immunology").unwrap();

    match view.submit(&client).await {
        SubmitOutcome::Saved { notification, .. } => {
            assert_eq!(notification.message, "Department updated successfully");
        }
        other => panic!("expected Saved, got {:?}", other),
    }
    assert_eq!(mock.count(Method::Put, "/department/4"), 1);
    assert_eq!(mock.count(Method::Post, "/department"), 0);
}

#[tokio::test]
async fn test_generic_failure_message_without_server_detail() {
    let mock = MockTransport::new();
    mock.on(Method::Post, "/color", 500, json!(null));
    let client = mock.client();
    let mut view = FormView::create(EntityKind::Color, &Config::default());
    view.set("colorname", "Red").unwrap();

    match view.submit(&client).await {
        SubmitOutcome::Failed(notifications) => {
            assert_eq!(notifications.len(), 1);
            assert_eq!(notifications[0].message, "Failed to create color");
        }
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_investigation_draft_submits_whole_tree() {
    let mock = MockTransport::new();
    mock.on(Method::Post, "/investigation", 201, json!({"data": {"id": 31}}));
    let client = mock.client();

    let mut draft = InvestigationDraft::new();
    let fields = EntityKind::Investigation.config().fields;
    for (name, value) in [
        ("testname", "Lipid profile"),
        ("testcode", "LP01"),
        ("department", "1"),
        ("specimen", "2"),
        ("normalprice", "450"),
        ("tat_hours", "4"),
        ("tat_minutes", "30"),
    ] {
        draft.form.set_field(fields, name, value).unwrap();
    }
    let results = "results".parse().unwrap();
    let added = draft
        .add(&results, &[("name".into(), "HDL".into()), ("unit".into(), "mg/dL".into())])
        .unwrap();
    assert_eq!(added.to_string(), "results/0");
    let nested = "results/0/reflex-tests".parse().unwrap();
    draft
        .add(&nested, &[("test_name".into(), "LDL direct".into())])
        .unwrap();

    let outcome = submit_investigation(&client, &draft, &Config::default()).await;
    assert!(matches!(outcome, SubmitOutcome::Saved { .. }), "{:?}", outcome);

    assert_eq!(mock.count(Method::Post, "/investigation"), 1);
    let body = mock.requests()[0].body.clone().unwrap();
    assert_eq!(body["testname"], "Lipid profile");
    assert_eq!(body["department_id"], 1);
    assert_eq!(body["tat"], "4 hour 30 min");
    assert_eq!(body["results"][0]["resultname"], "HDL");
    assert_eq!(body["results"][0]["reflexTests"][0]["testName"], "LDL direct");
}

#[tokio::test]
async fn test_updating_investigation_keeps_nested_items() {
    let mock = MockTransport::new();
    mock.on(
        Method::Get,
        "/investigation/5",
        200,
        json!({"data": {
            "id": 5,
            "testname": "Lipid profile",
            "testcode": "LP01",
            "department_id": 1,
            "specimen_id": 2,
            "normalprice": 450,
            "tat": "4 hour 30 min",
            "results": [{
                "resultname": "HDL",
                "unit": "mg/dL",
                "normalValues": [{"minValue": 40.0, "maxValue": 60.0}]
            }],
            "consumables": [{"name": "Vacutainer", "quantity": 2}]
        }}),
    );
    mock.on(Method::Put, "/investigation/5", 200, json!({"message": "ok"}));
    let client = mock.client();

    let config = EntityKind::Investigation.config();
    let record = client.get_one(config, "5").await.unwrap();
    let draft = InvestigationDraft::from_record("5", &record).unwrap();

    let outcome = submit_investigation(&client, &draft, &Config::default()).await;
    assert!(matches!(outcome, SubmitOutcome::Saved { .. }), "{:?}", outcome);

    assert_eq!(mock.count(Method::Put, "/investigation/5"), 1);
    let put = mock
        .requests()
        .into_iter()
        .find(|r| r.method == Method::Put)
        .unwrap();
    let body = put.body.unwrap();
    assert_eq!(body["results"][0]["resultname"], "HDL");
    assert_eq!(body["results"][0]["normalValues"][0]["minValue"], 40.0);
    assert_eq!(body["results"][0]["normalValues"][0]["gender"], "any");
    assert_eq!(body["consumables"][0]["name"], "Vacutainer");
}
