use std::net::SocketAddr;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use ledgerline::auth::bootstrap;
use ledgerline::config::Config;

pub const ADMIN_PASSWORD: &str = "admin-test-password";

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
}

#[allow(dead_code)]
impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn login(&self, username: &str, password: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("login request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    async fn token_for(&self, username: &str, password: &str) -> String {
        let (body, status) = self.login(username, password).await;
        assert_eq!(status, StatusCode::OK, "login as {username} failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    /// Token for the bootstrapped super admin.
    pub async fn admin_token(&self) -> String {
        self.token_for("admin", ADMIN_PASSWORD).await
    }

    /// Create a service person through the admin and log in as them.
    /// Returns `(person_id, token)`.
    pub async fn service_person(&self, admin: &str, name: &str) -> (String, String) {
        let (body, status) = self
            .post_auth(
                "/api/v1/people",
                admin,
                &json!({ "name": name, "phone": "13800000000", "is_service_person": true }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create service person failed: {body}");
        let person_id = body["id"].as_str().unwrap().to_string();
        let token = self.token_for(name, "123456").await;
        (person_id, token)
    }

    /// Create a service person, promote their login to manager, log in.
    pub async fn manager(&self, admin: &str, name: &str) -> String {
        let (person_id, _) = self.service_person(admin, name).await;
        let (body, status) = self
            .post_auth(
                "/api/v1/admin/managers",
                admin,
                &json!({ "person_id": person_id, "is_manager": true }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "promote manager failed: {body}");
        self.token_for(name, "123456").await
    }

    /// Create a customer as `token` (must not be queued) and return it.
    pub async fn create_customer(&self, token: &str, body: &Value) -> Value {
        let (body, status) = self.post_auth("/api/v1/customers", token, body).await;
        assert_eq!(status, StatusCode::OK, "create customer failed: {body}");
        body
    }

    /// Number of audit rows for a resource type, optionally in one status.
    pub async fn audit_count(&self, resource_type: &str, status: Option<&str>) -> i64 {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM audit_logs
             WHERE resource_type::text = $1
               AND action IN ('create', 'update', 'delete')
               AND ($2::text IS NULL OR status::text = $2)",
        )
        .bind(resource_type)
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .expect("audit count query failed")
    }

    /// `(status, approver_id, resource_id)` of one audit entry.
    pub async fn audit_entry(&self, id: &str) -> (String, Option<Uuid>, Option<Uuid>) {
        sqlx::query_as::<_, (String, Option<Uuid>, Option<Uuid>)>(
            "SELECT status::text, approver_id, resource_id FROM audit_logs WHERE id = $1",
        )
        .bind(Uuid::parse_str(id).unwrap())
        .fetch_one(&self.pool)
        .await
        .expect("audit entry query failed")
    }

    /// Make an authenticated GET request.
    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated POST request with JSON body.
    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated PUT request with JSON body.
    pub async fn put_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("put request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated DELETE request.
    pub async fn delete_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("delete request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

fn database_url_for(base_url: &str, db_name: &str) -> String {
    base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.to_string())
}

/// Spawn a test app with a fresh temporary database.
pub async fn spawn_app() -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let db_name = format!("ledgerline_test_{}", Uuid::now_v7().simple());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url_for(&base_url, "postgres"))
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = database_url_for(&base_url, &db_name);
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    bootstrap::ensure_super_admin(&pool, ADMIN_PASSWORD)
        .await
        .expect("Failed to bootstrap super admin");

    let config = Config {
        database_url: test_url,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        max_body_size: 1_048_576,
        log_level: "warn".to_string(),
        token_ttl_hours: 1,
        admin_password: ADMIN_PASSWORD.to_string(),
    };

    let (app, _state) = ledgerline::build_app(pool.clone(), config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        pool,
        client,
        db_name,
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url_for(&base_url, "postgres"))
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
