use reqwest::StatusCode;
use serde_json::{json, Value};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, bound to an ephemeral port.
        let app = tallybook_api::app::build_app();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn create_account(client: &reqwest::Client, base: &str, code: &str, kind: &str) -> String {
    let res = client
        .post(format!("{base}/accounts"))
        .json(&json!({
            "code": code,
            "name": format!("Account {code}"),
            "account_type": kind,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn create_entry(client: &reqwest::Client, base: &str, body: Value) -> (StatusCode, Value) {
    let res = client
        .post(format!("{base}/journal-entries"))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = res.status();
    (status, res.json().await.unwrap())
}

fn balanced_entry(debit_account: &str, credit_account: &str, amount: &str, reference: &str) -> Value {
    json!({
        "reference": reference,
        "description": format!("entry {reference}"),
        "currency": "USD",
        "lines": [
            { "account_id": debit_account, "debit": amount },
            { "account_id": credit_account, "credit": amount },
        ],
    })
}

/// The read side is eventually consistent (command path vs projection
/// update); poll briefly until the predicate holds.
async fn entry_eventually(
    client: &reqwest::Client,
    base: &str,
    id: &str,
    pred: impl Fn(&Value) -> bool,
) -> Value {
    for _ in 0..50 {
        let res = client
            .get(format!("{base}/journal-entries/{id}"))
            .send()
            .await
            .unwrap();
        if res.status() == StatusCode::OK {
            let body: Value = res.json().await.unwrap();
            if pred(&body["data"]) {
                return body["data"].clone();
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("entry {id} did not reach the expected projection state in time");
}

#[tokio::test]
async fn health_endpoint_is_open() {
    let srv = TestServer::spawn().await;
    let res = reqwest::Client::new()
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn account_tree_assembles_from_flat_creates() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let root_id = create_account(&client, &srv.base_url, "1000", "asset").await;

    // Child referencing the root.
    let res = client
        .post(format!("{}/accounts", srv.base_url))
        .json(&json!({
            "code": "1100",
            "name": "Cash on hand",
            "account_type": "asset",
            "parent_id": root_id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    // Duplicate code is a conflict.
    let res = client
        .post(format!("{}/accounts", srv.base_url))
        .json(&json!({
            "code": "1000",
            "name": "Duplicate",
            "account_type": "asset",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client
        .get(format!("{}/accounts", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let tree = body["data"]["tree"].as_array().unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0]["account"]["code"], "1000");
    assert_eq!(tree[0]["children"][0]["account"]["code"], "1100");
    assert!(body["data"]["warnings"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_account_type_is_rejected() {
    let srv = TestServer::spawn().await;
    let res = reqwest::Client::new()
        .post(format!("{}/accounts", srv.base_url))
        .json(&json!({ "code": "9000", "name": "X", "account_type": "crypto" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn journal_lifecycle_post_unpost_and_balances() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let cash = create_account(&client, &srv.base_url, "1000", "asset").await;
    let revenue = create_account(&client, &srv.base_url, "4000", "income").await;

    let (status, body) = create_entry(
        &client,
        &srv.base_url,
        balanced_entry(&cash, &revenue, "500.00", "JE-1"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    entry_eventually(&client, &srv.base_url, &id, |e| e["status"] == "draft").await;

    // Post it.
    let res = client
        .post(format!("{}/journal-entries/{id}/post", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let entry = entry_eventually(&client, &srv.base_url, &id, |e| e["status"] == "posted").await;
    assert!(entry["posted_at"].is_string());

    // A second post is refused; the first one already won.
    let res = client
        .post(format!("{}/journal-entries/{id}/post", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // Balances are debit-positive.
    let res = client
        .get(format!("{}/ledger/balances/1000", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["balance"], "500.00");

    let res = client
        .get(format!("{}/ledger/balances/4000", srv.base_url))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["balance"], "-500.00");

    // Unposting requires a reason.
    let res = client
        .post(format!("{}/journal-entries/{id}/unpost", srv.base_url))
        .json(&json!({ "reason": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(format!("{}/journal-entries/{id}/unpost", srv.base_url))
        .json(&json!({ "reason": "booked against the wrong period" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    entry_eventually(&client, &srv.base_url, &id, |e| e["status"] == "draft").await;

    // Unpost reversed the balance contributions.
    let res = client
        .get(format!("{}/ledger/balances/1000", srv.base_url))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["balance"], "0.00");

    // The audit trail records the reversal with its reason.
    let res = client
        .get(format!("{}/journal-entries/{id}/audit", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let items = body["data"]["items"].as_array().unwrap();
    let unposted = items.iter().find(|r| r["action"] == "unposted").unwrap();
    assert_eq!(unposted["reason"], "booked against the wrong period");
}

#[tokio::test]
async fn unbalanced_entries_draft_but_refuse_to_post() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let cash = create_account(&client, &srv.base_url, "1000", "asset").await;
    let revenue = create_account(&client, &srv.base_url, "4000", "income").await;

    let (status, body) = create_entry(
        &client,
        &srv.base_url,
        json!({
            "currency": "USD",
            "lines": [
                { "account_id": cash, "debit": "100.00" },
                { "account_id": revenue, "credit": "90.00" },
            ],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let res = client
        .post(format!("{}/journal-entries/{id}/post", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invariant_violation");
    assert!(body["message"].as_str().unwrap().contains("unbalanced"));
}

#[tokio::test]
async fn single_line_entries_are_rejected_at_draft_time() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let cash = create_account(&client, &srv.base_url, "1000", "asset").await;

    let (status, body) = create_entry(
        &client,
        &srv.base_url,
        json!({
            "currency": "USD",
            "lines": [ { "account_id": cash, "debit": "100.00" } ],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn list_supports_search_and_limit() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let cash = create_account(&client, &srv.base_url, "1000", "asset").await;
    let revenue = create_account(&client, &srv.base_url, "4000", "income").await;

    for (reference, amount) in [("RENT-MAR", "1200.00"), ("RENT-APR", "1200.00"), ("PAYROLL", "80.00")] {
        let (status, _) = create_entry(
            &client,
            &srv.base_url,
            balanced_entry(&cash, &revenue, amount, reference),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // Poll until all three drafts are visible.
    for _ in 0..50 {
        let res = client
            .get(format!("{}/journal-entries", srv.base_url))
            .send()
            .await
            .unwrap();
        let body: Value = res.json().await.unwrap();
        if body["data"]["items"].as_array().unwrap().len() == 3 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    let res = client
        .get(format!("{}/journal-entries?search=rent", srv.base_url))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);

    let res = client
        .get(format!("{}/journal-entries?search=rent&limit=1", srv.base_url))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn discarded_drafts_disappear_from_the_surface() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let cash = create_account(&client, &srv.base_url, "1000", "asset").await;
    let revenue = create_account(&client, &srv.base_url, "4000", "income").await;

    let (_, body) = create_entry(
        &client,
        &srv.base_url,
        balanced_entry(&cash, &revenue, "10.00", "SCRAP"),
    )
    .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();
    entry_eventually(&client, &srv.base_url, &id, |e| e["status"] == "draft").await;

    let res = client
        .delete(format!("{}/journal-entries/{id}", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    for _ in 0..50 {
        let res = client
            .get(format!("{}/journal-entries/{id}", srv.base_url))
            .send()
            .await
            .unwrap();
        if res.status() == StatusCode::NOT_FOUND {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("discarded entry was still visible");
}

#[tokio::test]
async fn reconciliation_flow_end_to_end() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let cash = create_account(&client, &srv.base_url, "1000", "asset").await;
    let revenue = create_account(&client, &srv.base_url, "4000", "income").await;

    // Book two deposits into cash.
    for (reference, amount) in [("DEP-1", "300.00"), ("DEP-2", "650.00")] {
        let (_, body) = create_entry(
            &client,
            &srv.base_url,
            balanced_entry(&cash, &revenue, amount, reference),
        )
        .await;
        let id = body["data"]["id"].as_str().unwrap().to_string();
        entry_eventually(&client, &srv.base_url, &id, |e| e["status"] == "draft").await;
        let res = client
            .post(format!("{}/journal-entries/{id}/post", srv.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        entry_eventually(&client, &srv.base_url, &id, |e| e["status"] == "posted").await;
    }

    // Bank account backed by the cash ledger account.
    let res = client
        .post(format!("{}/banking/accounts", srv.base_url))
        .json(&json!({
            "name": "Operating account",
            "ledger_account_code": "1000",
            "currency": "USD",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    let bank_id = body["data"]["id"].as_str().unwrap().to_string();

    // No statement yet: "no data", not a failure.
    let res = client
        .get(format!("{}/banking/accounts/{bank_id}/reconciliation", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // The bank saw only the first deposit; statement is 50.00 above books
    // on its own reckoning of 1000.00.
    let today = chrono::Utc::now().date_naive().to_string();
    let res = client
        .post(format!("{}/banking/accounts/{bank_id}/statements", srv.base_url))
        .json(&json!({
            "statement_date": today,
            "closing_balance": "1000.00",
            "lines": [
                { "posted_on": today, "amount": "300.00", "reference": "DEP-1" },
            ],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .get(format!("{}/banking/accounts/{bank_id}/reconciliation", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let data = &body["data"];
    assert_eq!(data["book_balance"]["amount"], "950.00");
    assert_eq!(data["statement_balance"]["amount"], "1000.00");
    assert_eq!(data["difference"]["amount"], "50.00");
    assert_eq!(data["status"], "statement_higher");
    assert_eq!(data["reconciled_count"], 1);
    assert_eq!(data["unreconciled_count"], 1);

    // Unknown bank account is a plain 404.
    let res = client
        .get(format!(
            "{}/banking/accounts/{}/reconciliation",
            srv.base_url,
            uuid::Uuid::now_v7()
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
