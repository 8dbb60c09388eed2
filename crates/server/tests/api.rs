use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::Duration;
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::Engine;
use migration::MigratorTrait;
use server::{
    DeliveryError, Notification, NotificationSettings, Notifier, ServerState, TokenSigner,
};

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    failing_device: Option<String>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Vec<DeliveryError> {
        self.sent.lock().unwrap().push(notification.clone());
        self.failing_device
            .iter()
            .map(|device| DeliveryError {
                device: device.clone(),
                reason: "unregistered".to_string(),
            })
            .collect()
    }
}

struct TestApp {
    router: Router,
    token: String,
}

impl TestApp {
    async fn new(notifier: Arc<RecordingNotifier>) -> Self {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let engine = Engine::builder().database(db).build().await.unwrap();
        engine
            .create_user("me@example.com", "secret")
            .await
            .unwrap();

        let state = ServerState::new(engine, TokenSigner::new("test-secret", Duration::hours(1)))
            .notifier(notifier)
            .notifications(NotificationSettings {
                collection: "devices".to_string(),
                dry_run: true,
            });
        let router = server::router(state);

        let mut app = Self {
            router,
            token: String::new(),
        };
        let (status, body) = app
            .send(
                "POST",
                "/login/",
                Some(json!({ "email": "me@example.com", "password": "secret" })),
                false,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        app.token = body["access_token"].as_str().unwrap().to_string();
        app
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        authorized: bool,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if authorized {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", self.token));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }

    async fn call(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send(method, uri, body, true).await
    }

    async fn label(&self, collection: &str, name: &str) -> Value {
        let (status, body) = self
            .call("POST", &format!("/{collection}/"), Some(json!({ "name": name })))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }
}

async fn app() -> TestApp {
    TestApp::new(Arc::new(RecordingNotifier::default())).await
}

fn expense_body(pay_method: &Value, category: &Value, amount: f64) -> Value {
    json!({
        "amount": amount,
        "description": "Groceries",
        "pay_method": pay_method,
        "category": { "$oid": category["_id"]["$oid"] },
        "timestamp": { "$date": 1533124800000_i64 }
    })
}

#[tokio::test]
async fn home_is_public_everything_else_needs_a_token() {
    let app = app().await;

    let (status, body) = app.send("GET", "/", None, false).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "API index page");

    let (status, _) = app.send("GET", "/expenses/", None, false).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut forged = TestApp {
        router: app.router.clone(),
        token: "abc.def".to_string(),
    };
    let (status, _) = forged.send("GET", "/pay_methods/", None, true).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    for value in ["Basic dXNlcjpwYXNz", "Token abc", "Bearer"] {
        let request = Request::builder()
            .uri("/expenses/")
            .header(header::AUTHORIZATION, value)
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{value}");
    }

    forged.token = app.token.clone();
    let (status, body) = forged.send("GET", "/pay_methods/", None, true).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn login_rejects_bad_json_and_bad_credentials() {
    let app = app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/login/")
        .body(Body::from("email=me"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "Missing JSON in request");

    let (status, body) = app
        .send(
            "POST",
            "/login/",
            Some(json!({ "email": "me@example.com", "password": "nope" })),
            false,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Bad login");
}

#[tokio::test]
async fn pay_method_lifecycle() {
    let app = app().await;

    let visa = app.label("pay_methods", "Visa").await;
    assert_eq!(visa["name"], "Visa");
    assert_eq!(visa["instances"], 0);
    assert_eq!(visa["active"], true);
    let id = visa["_id"]["$oid"].as_str().unwrap().to_string();

    let (status, body) = app
        .call("POST", "/pay_methods/", Some(json!({ "name": "Visa" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Name value must be unique");

    let (status, body) = app
        .call(
            "PUT",
            &format!("/pay_methods/{id}"),
            Some(json!({ "name": "Visa Gold", "_id": { "$oid": id }, "instances": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Visa Gold");

    let (status, body) = app.call("GET", &format!("/pay_methods/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Visa Gold");

    let (status, _) = app.call("DELETE", &format!("/pay_methods/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.call("GET", &format!("/pay_methods/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.call("GET", "/pay_methods/not-an-id", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // the name stays taken after a soft delete
    let (status, _) = app
        .call("POST", "/pay_methods/", Some(json!({ "name": "Visa Gold" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // and is free among categories
    app.label("categories", "Visa Gold").await;
}

#[tokio::test]
async fn installments_and_counters() {
    let app = app().await;
    let visa = app.label("pay_methods", "Visa").await;
    let cash = app.label("pay_methods", "Cash").await;
    let food = app.label("categories", "Food").await;

    let (status, body) = app
        .call(
            "POST",
            "/expenses/?payments=3",
            Some(expense_body(&visa, &food, 100.0)),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let created = body.as_array().unwrap();
    assert_eq!(created.len(), 3);
    for expense in created {
        assert_eq!(expense["amount"], 33.333333333333336);
        assert_eq!(expense["pay_method"]["name"], "Visa");
        assert_eq!(expense["category"]["name"], "Food");
        assert_eq!(expense["one_time"], false);
    }
    assert_eq!(created[0]["timestamp"]["$date"], 1533124800000_i64);

    let (_, methods) = app.call("GET", "/pay_methods/", None).await;
    assert_eq!(methods[0]["name"], "Visa");
    assert_eq!(methods[0]["instances"], 3);
    assert_eq!(methods[1]["name"], "Cash");

    // newest first
    let (status, listed) = app.call("GET", "/expenses/", None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = listed.as_array().unwrap().clone();
    assert_eq!(listed.len(), 3);
    assert!(listed[0]["timestamp"]["$date"].as_i64() > listed[1]["timestamp"]["$date"].as_i64());

    // re-point one installment to cash
    let id = listed[0]["_id"]["$oid"].as_str().unwrap().to_string();
    let (status, body) = app
        .call(
            "PUT",
            &format!("/expenses/{id}"),
            Some(json!({ "pay_method": cash })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["pay_method"]["name"], "Cash");
    assert_eq!(body[0]["pay_method"]["instances"], 1);

    let (_, methods) = app.call("GET", "/pay_methods/", None).await;
    assert_eq!(methods[0]["instances"], 2);
    assert_eq!(methods[1]["instances"], 1);

    let cash_id = cash["_id"]["$oid"].as_str().unwrap();
    let (_, filtered) = app
        .call("GET", &format!("/expenses/?pay_method={cash_id}"), None)
        .await;
    assert_eq!(filtered.as_array().unwrap().len(), 1);

    // delete and fetch
    let (status, _) = app.call("DELETE", &format!("/expenses/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.call("GET", &format!("/expenses/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, cash) = app.call("GET", &format!("/pay_methods/{cash_id}"), None).await;
    assert_eq!(cash["instances"], 0);
}

#[tokio::test]
async fn bad_expense_requests() {
    let app = app().await;
    let visa = app.label("pay_methods", "Visa").await;
    let food = app.label("categories", "Food").await;

    let (status, _) = app
        .call(
            "POST",
            "/expenses/?payments=0",
            Some(expense_body(&visa, &food, 100.0)),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut body = expense_body(&visa, &food, 100.0);
    body["category"] = json!({ "$oid": "zz" });
    let (status, _) = app.call("POST", "/expenses/", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // a category where a pay method belongs
    let (status, _) = app
        .call("POST", "/expenses/", Some(expense_body(&food, &food, 10.0)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, listed) = app.call("GET", "/expenses/", None).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn charts_and_monthly_update() {
    let notifier = Arc::new(RecordingNotifier::default());
    let app = TestApp::new(notifier.clone()).await;

    let (status, body) = app.call("GET", "/charts/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (_, body) = app.call("GET", "/monthly_update/", None).await;
    assert_eq!(body["message"], "Empty DB, no monthly update");
    assert!(notifier.sent.lock().unwrap().is_empty());

    let visa = app.label("pay_methods", "Visa").await;
    let food = app.label("categories", "Food").await;
    app.call("POST", "/expenses/", Some(expense_body(&visa, &food, 12.5)))
        .await;

    let (_, charts) = app.call("GET", "/charts/", None).await;
    assert_eq!(
        charts[0],
        json!({ "name": "Expenses by category", "type": "table", "data": [["Food", 12.5]] })
    );
    assert_eq!(charts[2]["type"], "bar");
    assert_eq!(charts[2]["data"], json!([["2018-08", 12.5]]));

    let (status, body) = app.call("GET", "/monthly_update/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Message sent");
    assert_eq!(body["errors"], json!([]));

    let sent = notifier.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].title, "Monthly update");
    assert_eq!(sent[0].message, "Food: 12.5\n");
    assert_eq!(sent[1].message, "Visa: 12.5\n");
    assert_eq!(sent[0].collection, "devices");
    assert!(sent[0].dry_run);
}

#[tokio::test]
async fn monthly_update_reports_delivery_errors() {
    let notifier = Arc::new(RecordingNotifier {
        failing_device: Some("phone".to_string()),
        ..Default::default()
    });
    let app = TestApp::new(notifier).await;

    let visa = app.label("pay_methods", "Visa").await;
    let food = app.label("categories", "Food").await;
    app.call("POST", "/expenses/", Some(expense_body(&visa, &food, 12.5)))
        .await;

    let (_, body) = app.call("GET", "/monthly_update/", None).await;
    assert_eq!(body["message"], "Error occurred, 2 deliveries failed");
    assert_eq!(body["errors"], json!(["phone: unregistered", "phone: unregistered"]));
}
