mod common;

use reqwest::StatusCode;
use serde_json::json;

// ── Health & Auth ───────────────────────────────────────────────

#[tokio::test]
async fn health_returns_ok() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["x-content-type-options"], "nosniff");
    assert_eq!(resp.text().await.unwrap(), "ok");

    common::cleanup(app).await;
}

#[tokio::test]
async fn oversized_body_is_rejected_before_routing() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/api/v1/auth/login"))
        .header("content-type", "application/json")
        .body(vec![b' '; 2 * 1_048_576])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

    common::cleanup(app).await;
}

#[tokio::test]
async fn bootstrap_admin_can_log_in() {
    let app = common::spawn_app().await;

    let (body, status) = app.login("admin", common::ADMIN_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());
    assert_eq!(body["role"], "super_admin");
    assert_eq!(body["must_change_password"], true);

    common::cleanup(app).await;
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let app = common::spawn_app().await;

    let (_, status) = app.login("admin", "wrong-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, status) = app.login("nobody", "whatever").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

#[tokio::test]
async fn login_is_rate_limited_after_repeated_failures() {
    let app = common::spawn_app().await;

    for _ in 0..5 {
        let (_, status) = app.login("admin", "wrong-password").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    let (_, status) = app.login("admin", common::ADMIN_PASSWORD).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    common::cleanup(app).await;
}

#[tokio::test]
async fn requests_without_token_are_unauthorized() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .get(app.url("/api/v1/customers"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let (_, status) = app.get_auth("/api/v1/customers", "not-a-jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

#[tokio::test]
async fn change_password_clears_forced_change_flag() {
    let app = common::spawn_app().await;
    let admin = app.admin_token().await;

    let (_, status) = app
        .post_auth(
            "/api/v1/auth/change-password",
            &admin,
            &json!({ "old_password": common::ADMIN_PASSWORD, "new_password": "short" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, status) = app
        .post_auth(
            "/api/v1/auth/change-password",
            &admin,
            &json!({ "old_password": common::ADMIN_PASSWORD, "new_password": "a-new-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (body, status) = app.login("admin", "a-new-password").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["must_change_password"], false);

    let (me, status) = app.get_auth("/api/v1/auth/me", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert!(me["user"]["last_password_change"].is_string());
    assert!(me["user"].get("password_hash").is_none());

    common::cleanup(app).await;
}

// ── Approval gate ───────────────────────────────────────────────

#[tokio::test]
async fn manager_mutation_applies_immediately_with_approved_entry() {
    let app = common::spawn_app().await;
    let admin = app.admin_token().await;
    let manager = app.manager(&admin, "Manager Chen").await;

    let customer = app
        .create_customer(&manager, &json!({ "name": "Acme Trading", "credit_rating": "A" }))
        .await;
    assert_eq!(customer["name"], "Acme Trading");
    assert_eq!(customer["credit_rating"], "A");

    assert_eq!(app.audit_count("customer", None).await, 1);
    assert_eq!(app.audit_count("customer", Some("approved")).await, 1);

    let (actor, approver, resource, approved_at_set): (
        uuid::Uuid,
        Option<uuid::Uuid>,
        Option<uuid::Uuid>,
        bool,
    ) = sqlx::query_as(
        "SELECT actor_id, approver_id, resource_id, approved_at IS NOT NULL
         FROM audit_logs WHERE resource_type = 'customer'",
    )
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(approver, Some(actor));
    assert_eq!(resource.map(|r| r.to_string()), customer["id"].as_str().map(String::from));
    assert!(approved_at_set);

    common::cleanup(app).await;
}

#[tokio::test]
async fn service_person_update_is_queued_and_entity_unchanged() {
    let app = common::spawn_app().await;
    let admin = app.admin_token().await;
    let (_, staff) = app.service_person(&admin, "Staff Wu").await;

    let customer = app.create_customer(&admin, &json!({ "name": "Acme" })).await;
    let id = customer["id"].as_str().unwrap();

    let (body, status) = app
        .put_auth(
            &format!("/api/v1/customers/{id}"),
            &staff,
            &json!({ "phone": "023-1234" }),
        )
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["requires_approval"], true);
    assert!(body["log_id"].is_string());

    let (current, _) = app.get_auth(&format!("/api/v1/customers/{id}"), &admin).await;
    assert_eq!(current["phone"], serde_json::Value::Null);
    assert_eq!(current["name"], "Acme");

    assert_eq!(app.audit_count("customer", Some("pending")).await, 1);

    let (pending, status) = app.get_auth("/api/v1/approvals/pending", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending["total"], 1);
    let entry = &pending["items"][0];
    assert_eq!(entry["new_value"], json!({ "phone": "023-1234" }));
    assert_eq!(entry["old_value"]["name"], "Acme");
    assert_eq!(entry["resource_name"], "Acme");
    assert_eq!(entry["actor_username"], "Staff Wu");

    common::cleanup(app).await;
}

#[tokio::test]
async fn approving_update_changes_only_listed_columns() {
    let app = common::spawn_app().await;
    let admin = app.admin_token().await;
    let (_, staff) = app.service_person(&admin, "Staff Wu").await;

    let customer = app
        .create_customer(
            &admin,
            &json!({ "name": "Acme", "contact": "Li", "phone": "111" }),
        )
        .await;
    let id = customer["id"].as_str().unwrap();

    let (queued, _) = app
        .put_auth(&format!("/api/v1/customers/{id}"), &staff, &json!({ "phone": "222" }))
        .await;
    let log_id = queued["log_id"].as_str().unwrap();

    let (body, status) = app
        .post_auth("/api/v1/approvals/approve", &admin, &json!({ "log_id": log_id }))
        .await;
    assert_eq!(status, StatusCode::OK, "approve failed: {body}");
    assert_eq!(body["resource_id"], id);

    let (current, _) = app.get_auth(&format!("/api/v1/customers/{id}"), &admin).await;
    assert_eq!(current["phone"], "222");
    assert_eq!(current["contact"], "Li");
    assert_eq!(current["name"], "Acme");

    let (status_text, approver, _) = app.audit_entry(log_id).await;
    assert_eq!(status_text, "approved");
    assert!(approver.is_some());

    common::cleanup(app).await;
}

#[tokio::test]
async fn approving_pending_customer_create_replays_captured_fields() {
    let app = common::spawn_app().await;
    let admin = app.admin_token().await;
    let (_, staff) = app.service_person(&admin, "Staff Wu").await;

    let (queued, status) = app
        .post_auth(
            "/api/v1/customers",
            &staff,
            &json!({ "name": "Beta Ltd", "tax_number": "91500000MA0001" }),
        )
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let log_id = queued["log_id"].as_str().unwrap();

    let (list, _) = app.get_auth("/api/v1/customers", &admin).await;
    assert_eq!(list["total"], 0);

    let (body, status) = app
        .post_auth("/api/v1/approvals/approve", &admin, &json!({ "log_id": log_id }))
        .await;
    assert_eq!(status, StatusCode::OK, "approve failed: {body}");
    let new_id = body["resource_id"].as_str().unwrap();

    let (customer, status) = app.get_auth(&format!("/api/v1/customers/{new_id}"), &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(customer["name"], "Beta Ltd");
    assert_eq!(customer["tax_number"], "91500000MA0001");

    let (_, _, resource_id) = app.audit_entry(log_id).await;
    assert_eq!(resource_id.map(|r| r.to_string()).as_deref(), Some(new_id));

    common::cleanup(app).await;
}

#[tokio::test]
async fn pending_create_is_replayed_exactly_once() {
    let app = common::spawn_app().await;
    let admin = app.admin_token().await;
    let (_, staff) = app.service_person(&admin, "Staff Wu").await;

    // Sequential: a second approval of the same entry is rejected.
    let (queued, _) = app
        .post_auth("/api/v1/customers", &staff, &json!({ "name": "Gamma Co" }))
        .await;
    let log_id = queued["log_id"].as_str().unwrap();

    let (_, status) = app
        .post_auth("/api/v1/approvals/approve", &admin, &json!({ "log_id": log_id }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, status) = app
        .post_auth("/api/v1/approvals/approve", &admin, &json!({ "log_id": log_id }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Concurrent: racing approvers serialize on the entry's row lock.
    let (queued, _) = app
        .post_auth("/api/v1/customers", &staff, &json!({ "name": "Delta Co" }))
        .await;
    let log_id = queued["log_id"].as_str().unwrap().to_string();

    let mut approvals = tokio::task::JoinSet::new();
    for _ in 0..8 {
        let client = app.client.clone();
        let url = app.url("/api/v1/approvals/approve");
        let token = admin.clone();
        let body = json!({ "log_id": log_id });
        approvals.spawn(async move {
            client
                .post(url)
                .bearer_auth(token)
                .json(&body)
                .send()
                .await
                .expect("approve request failed")
                .status()
        });
    }

    let mut statuses = Vec::new();
    while let Some(status) = approvals.join_next().await {
        statuses.push(status.unwrap());
    }
    let applied = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    assert_eq!(applied, 1, "statuses: {statuses:?}");
    assert!(
        statuses
            .iter()
            .all(|s| *s == StatusCode::OK || *s == StatusCode::CONFLICT),
        "statuses: {statuses:?}"
    );

    let (list, _) = app.get_auth("/api/v1/customers", &admin).await;
    assert_eq!(list["total"], 2);
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(total, 2);

    let (status_text, _, _) = app.audit_entry(&log_id).await;
    assert_eq!(status_text, "approved");

    common::cleanup(app).await;
}

#[tokio::test]
async fn rejecting_leaves_entity_unchanged_and_is_final() {
    let app = common::spawn_app().await;
    let admin = app.admin_token().await;
    let (_, staff) = app.service_person(&admin, "Staff Wu").await;

    let customer = app.create_customer(&admin, &json!({ "name": "Acme" })).await;
    let id = customer["id"].as_str().unwrap();

    let (queued, _) = app
        .put_auth(&format!("/api/v1/customers/{id}"), &staff, &json!({ "name": "Renamed" }))
        .await;
    let log_id = queued["log_id"].as_str().unwrap();

    let (_, status) = app
        .post_auth(
            "/api/v1/approvals/reject",
            &admin,
            &json!({ "log_id": log_id, "reason": "Name is correct" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (current, _) = app.get_auth(&format!("/api/v1/customers/{id}"), &admin).await;
    assert_eq!(current["name"], "Acme");

    let (status_text, approver, _) = app.audit_entry(log_id).await;
    assert_eq!(status_text, "rejected");
    assert!(approver.is_some());

    let (_, status) = app
        .post_auth(
            "/api/v1/approvals/reject",
            &admin,
            &json!({ "log_id": log_id, "reason": "again" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, status) = app
        .post_auth("/api/v1/approvals/approve", &admin, &json!({ "log_id": log_id }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    common::cleanup(app).await;
}

#[tokio::test]
async fn reject_requires_a_reason() {
    let app = common::spawn_app().await;
    let admin = app.admin_token().await;
    let (_, staff) = app.service_person(&admin, "Staff Wu").await;

    let (queued, _) = app
        .post_auth("/api/v1/customers", &staff, &json!({ "name": "Gamma" }))
        .await;
    let log_id = queued["log_id"].as_str().unwrap();

    let (_, status) = app
        .post_auth(
            "/api/v1/approvals/reject",
            &admin,
            &json!({ "log_id": log_id, "reason": "  " }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status_text, _, _) = app.audit_entry(log_id).await;
    assert_eq!(status_text, "pending");

    common::cleanup(app).await;
}

#[tokio::test]
async fn approving_unknown_entry_is_not_found() {
    let app = common::spawn_app().await;
    let admin = app.admin_token().await;

    let (_, status) = app
        .post_auth(
            "/api/v1/approvals/approve",
            &admin,
            &json!({ "log_id": uuid::Uuid::now_v7() }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    common::cleanup(app).await;
}

#[tokio::test]
async fn executor_failure_leaves_entry_pending() {
    let app = common::spawn_app().await;
    let admin = app.admin_token().await;
    let (_, staff) = app.service_person(&admin, "Staff Wu").await;

    let customer = app.create_customer(&admin, &json!({ "name": "Doomed" })).await;
    let id = customer["id"].as_str().unwrap();

    let (queued, _) = app
        .put_auth(&format!("/api/v1/customers/{id}"), &staff, &json!({ "phone": "999" }))
        .await;
    let log_id = queued["log_id"].as_str().unwrap();

    let (_, status) = app.delete_auth(&format!("/api/v1/customers/{id}"), &admin).await;
    assert_eq!(status, StatusCode::OK);

    let (body, status) = app
        .post_auth("/api/v1/approvals/approve", &admin, &json!({ "log_id": log_id }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("not found"));

    let (status_text, approver, _) = app.audit_entry(log_id).await;
    assert_eq!(status_text, "pending");
    assert!(approver.is_none());

    common::cleanup(app).await;
}

#[tokio::test]
async fn service_person_cannot_review_approvals() {
    let app = common::spawn_app().await;
    let admin = app.admin_token().await;
    let (_, staff) = app.service_person(&admin, "Staff Wu").await;

    let (queued, _) = app
        .post_auth("/api/v1/customers", &staff, &json!({ "name": "Acme" }))
        .await;
    let log_id = queued["log_id"].as_str().unwrap();

    let (_, status) = app.get_auth("/api/v1/approvals/pending", &staff).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, status) = app
        .post_auth("/api/v1/approvals/approve", &staff, &json!({ "log_id": log_id }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status_text, _, _) = app.audit_entry(log_id).await;
    assert_eq!(status_text, "pending");

    common::cleanup(app).await;
}

#[tokio::test]
async fn approving_service_person_create_provisions_login() {
    let app = common::spawn_app().await;
    let admin = app.admin_token().await;
    let (_, staff) = app.service_person(&admin, "Staff Wu").await;

    let (queued, status) = app
        .post_auth(
            "/api/v1/people",
            &staff,
            &json!({ "name": "Staff Zhao", "phone": "13900000000", "is_service_person": true }),
        )
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (_, status) = app.login("Staff Zhao", "123456").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, status) = app
        .post_auth(
            "/api/v1/approvals/approve",
            &admin,
            &json!({ "log_id": queued["log_id"] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (body, status) = app.login("Staff Zhao", "123456").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "service_person");
    assert_eq!(body["must_change_password"], true);

    common::cleanup(app).await;
}

#[tokio::test]
async fn pending_delete_is_applied_on_approval() {
    let app = common::spawn_app().await;
    let admin = app.admin_token().await;
    let (_, staff) = app.service_person(&admin, "Staff Wu").await;

    let customer = app.create_customer(&admin, &json!({ "name": "Short-lived" })).await;
    let id = customer["id"].as_str().unwrap();

    let (queued, status) = app.delete_auth(&format!("/api/v1/customers/{id}"), &staff).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (_, status) = app.get_auth(&format!("/api/v1/customers/{id}"), &admin).await;
    assert_eq!(status, StatusCode::OK);

    let (_, status) = app
        .post_auth(
            "/api/v1/approvals/approve",
            &admin,
            &json!({ "log_id": queued["log_id"] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, status) = app.get_auth(&format!("/api/v1/customers/{id}"), &admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    common::cleanup(app).await;
}

#[tokio::test]
async fn failed_immediate_mutation_writes_no_audit_row() {
    let app = common::spawn_app().await;
    let admin = app.admin_token().await;

    let (_, status) = app
        .post_auth(
            "/api/v1/tasks",
            &admin,
            &json!({ "customer_id": uuid::Uuid::now_v7(), "title": "Orphan" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.audit_count("task", None).await, 0);

    let (_, status) = app.post_auth("/api/v1/customers", &admin, &json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.audit_count("customer", None).await, 0);

    common::cleanup(app).await;
}

#[tokio::test]
async fn updating_missing_resource_is_not_found_without_audit_row() {
    let app = common::spawn_app().await;
    let admin = app.admin_token().await;

    let missing = uuid::Uuid::now_v7();
    let (_, status) = app
        .put_auth(&format!("/api/v1/payments/{missing}"), &admin, &json!({ "remark": "x" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.audit_count("payment", None).await, 0);

    common::cleanup(app).await;
}

// ── Audit log listing & purge ───────────────────────────────────

#[tokio::test]
async fn audit_log_pagination_reports_true_total() {
    let app = common::spawn_app().await;
    let admin = app.admin_token().await;
    let (_, staff) = app.service_person(&admin, "Staff Wu").await;

    for i in 0..25 {
        let (_, status) = app
            .post_auth("/api/v1/customers", &staff, &json!({ "name": format!("Queued {i}") }))
            .await;
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    let (page, status) = app
        .get_auth("/api/v1/audit-logs?status=pending&offset=0&limit=20", &staff)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["items"].as_array().unwrap().len(), 20);
    assert_eq!(page["total"], 25);
    assert_eq!(page["items"][0]["resource_name"], "Queued 24");

    let (page, _) = app
        .get_auth("/api/v1/audit-logs?status=pending&offset=20&limit=1000", &staff)
        .await;
    assert_eq!(page["items"].as_array().unwrap().len(), 5);
    assert_eq!(page["limit"], 100);

    let (_, status) = app.get_auth("/api/v1/audit-logs?status=done", &staff).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}

#[tokio::test]
async fn audit_purge_is_super_admin_only() {
    let app = common::spawn_app().await;
    let admin = app.admin_token().await;
    let manager = app.manager(&admin, "Manager Chen").await;

    app.create_customer(&admin, &json!({ "name": "One" })).await;
    app.create_customer(&admin, &json!({ "name": "Two" })).await;

    let entry_id: uuid::Uuid = sqlx::query_scalar(
        "SELECT id FROM audit_logs WHERE resource_type = 'customer' ORDER BY created_at LIMIT 1",
    )
    .fetch_one(&app.pool)
    .await
    .unwrap();

    let path = format!("/api/v1/admin/audit-logs/{entry_id}");
    let (_, status) = app.delete_auth(&path, &manager).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, status) = app.delete_auth(&path, &admin).await;
    assert_eq!(status, StatusCode::OK);
    let (_, status) = app.delete_auth(&path, &admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, status) = app
        .post_auth("/api/v1/admin/audit-logs/clear", &admin, &json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let before = (chrono::Utc::now() + chrono::Duration::hours(1)).to_rfc3339();
    let (body, status) = app
        .post_auth(
            "/api/v1/admin/audit-logs/clear",
            &admin,
            &json!({ "before": before }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["deleted"].as_u64().unwrap() >= 1);
    assert_eq!(app.audit_count("customer", None).await, 0);

    common::cleanup(app).await;
}

// ── Resource specifics ──────────────────────────────────────────

#[tokio::test]
async fn completing_task_stamps_completed_at() {
    let app = common::spawn_app().await;
    let admin = app.admin_token().await;

    let customer = app.create_customer(&admin, &json!({ "name": "Acme" })).await;
    let (task, status) = app
        .post_auth(
            "/api/v1/tasks",
            &admin,
            &json!({ "customer_id": customer["id"], "title": "Monthly VAT filing" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["status"], "pending");
    assert!(task["completed_at"].is_null());

    let (updated, status) = app
        .put_auth(
            &format!("/api/v1/tasks/{}", task["id"].as_str().unwrap()),
            &admin,
            &json!({ "status": "completed" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "completed");
    assert!(updated["completed_at"].is_string());
    assert_eq!(updated["title"], "Monthly VAT filing");

    let (stats, _) = app.get_auth("/api/v1/statistics/tasks", &admin).await;
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["items"][0]["status"], "completed");

    common::cleanup(app).await;
}

#[tokio::test]
async fn agreement_number_is_generated_when_blank() {
    let app = common::spawn_app().await;
    let admin = app.admin_token().await;

    let customer = app.create_customer(&admin, &json!({ "name": "Acme" })).await;

    let (first, status) = app
        .post_auth(
            "/api/v1/agreements",
            &admin,
            &json!({ "customer_id": customer["id"], "fee_type": "monthly", "amount": 300.0 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let number = first["agreement_number"].as_str().unwrap();
    assert!(number.starts_with("AGT"));
    assert_eq!(number.len(), 15);
    assert!(number.ends_with("0001"));

    let (second, _) = app
        .post_auth(
            "/api/v1/agreements",
            &admin,
            &json!({ "customer_id": customer["id"], "agreement_number": "" }),
        )
        .await;
    assert_ne!(second["agreement_number"], first["agreement_number"]);

    let (_, status) = app
        .post_auth(
            "/api/v1/agreements",
            &admin,
            &json!({ "customer_id": customer["id"], "agreement_number": number }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    common::cleanup(app).await;
}

#[tokio::test]
async fn customer_payments_and_statistics() {
    let app = common::spawn_app().await;
    let admin = app.admin_token().await;

    let customer = app.create_customer(&admin, &json!({ "name": "Acme" })).await;
    let id = customer["id"].as_str().unwrap();

    for (date, amount) in [("2026-01-15", 100.0), ("2026-02-15", 250.5)] {
        let (_, status) = app
            .post_auth(
                "/api/v1/payments",
                &admin,
                &json!({
                    "customer_id": id,
                    "amount": amount,
                    "payment_date": date,
                    "period": &date[..7],
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, status) = app
        .post_auth(
            "/api/v1/payments",
            &admin,
            &json!({ "customer_id": id, "amount": 10.0, "payment_date": "2026-03-01", "period": "March" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (payments, _) = app
        .get_auth(&format!("/api/v1/customers/{id}/payments"), &admin)
        .await;
    assert_eq!(payments["total"], 2);

    let (summary, status) = app
        .get_auth(
            "/api/v1/statistics/payments?start_date=2026-02-01&end_date=2026-02-28",
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["count"], 1);
    assert_eq!(summary["total"], 250.5);

    let (overview, _) = app.get_auth("/api/v1/statistics/overview", &admin).await;
    assert_eq!(overview["customer_count"], 1);

    let entry_name: Option<String> = sqlx::query_scalar(
        "SELECT resource_name FROM audit_logs
         WHERE resource_type = 'payment' ORDER BY created_at LIMIT 1",
    )
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(entry_name.as_deref(), Some("2026-01-15 - 100.00"));

    common::cleanup(app).await;
}

#[tokio::test]
async fn representative_is_linked_and_unlinked() {
    let app = common::spawn_app().await;
    let admin = app.admin_token().await;

    let (person, status) = app
        .post_auth(
            "/api/v1/people",
            &admin,
            &json!({ "name": "Legal Rep", "phone": "13700000000" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let person_id = person["id"].as_str().unwrap();

    let customer = app
        .create_customer(&admin, &json!({ "name": "Acme", "representative_id": person_id }))
        .await;
    let customer_id = customer["id"].as_str().unwrap();

    let (person, _) = app.get_auth(&format!("/api/v1/people/{person_id}"), &admin).await;
    assert_eq!(person["representative_customer_ids"], json!([customer_id]));

    let (related, _) = app
        .get_auth(&format!("/api/v1/people/{person_id}/customers"), &admin)
        .await;
    assert_eq!(related["representative"][0]["id"], customer_id);

    let (_, status) = app
        .delete_auth(&format!("/api/v1/customers/{customer_id}"), &admin)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (person, _) = app.get_auth(&format!("/api/v1/people/{person_id}"), &admin).await;
    assert_eq!(person["representative_customer_ids"], json!([]));

    common::cleanup(app).await;
}

#[tokio::test]
async fn customer_enumerations_are_listed() {
    let app = common::spawn_app().await;
    let admin = app.admin_token().await;

    let (types, status) = app.get_auth("/api/v1/customers/types", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert!(types["items"].as_array().unwrap().contains(&json!("limited_company")));

    let (ratings, _) = app.get_auth("/api/v1/customers/credit-ratings", &admin).await;
    assert_eq!(ratings["items"], json!(["A", "B", "C", "D", "M"]));

    common::cleanup(app).await;
}

#[tokio::test]
async fn export_customers_as_csv() {
    let app = common::spawn_app().await;
    let admin = app.admin_token().await;

    app.create_customer(&admin, &json!({ "name": "Comma, Inc" })).await;

    let resp = app
        .client
        .get(app.url("/api/v1/export/customers"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/csv"));
    let body = resp.text().await.unwrap();
    assert!(body.starts_with("id,name,"));
    assert!(body.contains("\"Comma, Inc\""));

    common::cleanup(app).await;
}

// ── Admin ───────────────────────────────────────────────────────

#[tokio::test]
async fn manager_promotion_and_demotion() {
    let app = common::spawn_app().await;
    let admin = app.admin_token().await;
    let (person_id, staff) = app.service_person(&admin, "Staff Wu").await;

    let (_, status) = app.get_auth("/api/v1/admin/users", &staff).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (user, status) = app
        .post_auth(
            "/api/v1/admin/managers",
            &admin,
            &json!({ "person_id": person_id, "is_manager": true }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["role"], "manager");

    let (body, _) = app.login("Staff Wu", "123456").await;
    assert_eq!(body["role"], "manager");

    let (user, status) = app
        .post_auth(
            "/api/v1/admin/managers",
            &admin,
            &json!({ "person_id": person_id, "is_manager": false }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["role"], "service_person");

    let (users, _) = app.get_auth("/api/v1/admin/users", &admin).await;
    let admin_id = users
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["role"] == "super_admin")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();
    let (_, status) = app
        .delete_auth(&format!("/api/v1/admin/users/{admin_id}"), &admin)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}
