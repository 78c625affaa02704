//! HTTP round trips through the router against an in-memory database.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use beneficio_api::{AppState, create_router};
use beneficio_db::migration::{Migrator, MigratorTrait};
use beneficio_shared::config::LedgerConfig;
use http_body_util::BodyExt;
use rstest::rstest;
use sea_orm::{ConnectOptions, Database};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

async fn app() -> Router {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.expect("Failed to open database");
    Migrator::up(&db, None).await.expect("Failed to migrate");
    create_router(AppState::new(db, &LedgerConfig::default()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, "POST", uri, Some(body)).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, "GET", uri, None).await
}

#[tokio::test]
async fn test_health_reports_database_up() {
    let app = app().await;
    let (status, body) = get(&app, "/api/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "up");
}

#[tokio::test]
async fn test_loan_is_paid_off_through_operations() {
    let app = app().await;
    let producer = Uuid::new_v4();

    let (status, loan) = post(
        &app,
        "/api/v1/obligations",
        json!({ "producerId": producer, "principal": "1000.00" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(loan["status"], "ACTIVE");
    assert_eq!(loan["principalPending"], "1000.00");

    let (status, body) = post(
        &app,
        "/api/v1/obligations/operations",
        json!({ "subjectId": producer, "kind": "PAYMENT_PRINCIPAL", "amount": "999.99" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["postings"][0]["statusAfter"], "ACTIVE");

    let (_, body) = post(
        &app,
        "/api/v1/obligations/operations",
        json!({ "subjectId": producer, "kind": "PAYMENT_PRINCIPAL", "amount": "0.01" }),
    )
    .await;
    assert_eq!(body["postings"][0]["statusAfter"], "COMPLETED");

    let uri = format!("/api/v1/obligations/{}", loan["id"].as_str().unwrap());
    let (_, body) = get(&app, &uri).await;
    assert_eq!(body["status"], "COMPLETED");
    assert_eq!(body["principalPending"], "0.00");

    let (status, body) = post(
        &app,
        "/api/v1/obligations/operations",
        json!({ "subjectId": producer, "kind": "PAYMENT_PRINCIPAL", "amount": "1" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "NoPendingObligations");
}

#[tokio::test]
async fn test_overpayment_reports_structured_detail() {
    let app = app().await;
    let producer = Uuid::new_v4();
    post(
        &app,
        "/api/v1/obligations",
        json!({ "producerId": producer, "principal": "100" }),
    )
    .await;

    let (status, body) = post(
        &app,
        "/api/v1/obligations/operations",
        json!({ "subjectId": producer, "kind": "PAYMENT_PRINCIPAL", "amount": "100.01" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "InsufficientBalance");
    assert!(body["detail"].is_object());

    let (_, listed) = get(&app, &format!("/api/v1/producers/{producer}/obligations")).await;
    assert_eq!(listed[0]["principalPending"], "100.00");
}

#[rstest]
#[case(json!({ "principal": "10" }), "VALIDATION_ERROR")]
#[case(json!({ "producerId": Uuid::nil(), "principal": "ten" }), "InvalidAmount")]
#[case(json!({ "producerId": Uuid::nil(), "principal": "-5" }), "InvalidAmount")]
#[case(json!({ "producerId": Uuid::nil(), "principal": "10", "kind": "mortgage" }), "InvalidRequest")]
#[tokio::test]
async fn test_malformed_obligations_are_rejected(#[case] request: Value, #[case] code: &str) {
    let app = app().await;
    let (status, body) = post(&app, "/api/v1/obligations", request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], code);
}

#[tokio::test]
async fn test_deposit_liquidation_and_void_chain() {
    let app = app().await;
    let producer = Uuid::new_v4();
    let product = Uuid::new_v4();

    let (status, deposit) = post(
        &app,
        "/api/v1/deposits",
        json!({ "producerId": producer, "productId": product, "quantity": "100" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let deposit_id = deposit["depositId"].as_str().unwrap().to_string();

    let (status, liquidation) = post(
        &app,
        "/api/v1/deposits/liquidations",
        json!({
            "producerId": producer,
            "productId": product,
            "quantity": "40",
            "unitPrice": "2.50",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(liquidation["appliedQuantity"], "40.00");
    assert_eq!(liquidation["appliedAmount"], "100.00");
    assert_eq!(liquidation["lines"][0]["remainingAfter"], "60.00");
    let liquidation_id = liquidation["liquidationId"].as_str().unwrap().to_string();

    let (status, body) = post(
        &app,
        "/api/v1/voids",
        json!({ "referenceType": "Deposit", "referenceId": deposit_id }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "HasDependentMovements");
    assert_eq!(
        body["dependents"][0],
        format!("DepositLiquidation#{liquidation_id}")
    );

    let void_liquidation = json!({
        "referenceType": "DepositLiquidation",
        "referenceId": liquidation_id,
    });
    let (status, body) = post(&app, "/api/v1/voids", void_liquidation.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "voided");
    let (_, body) = post(&app, "/api/v1/voids", void_liquidation).await;
    assert_eq!(body["outcome"], "already_voided");

    let (status, _) = post(
        &app,
        "/api/v1/voids",
        json!({ "referenceType": "Deposit", "referenceId": deposit_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = get(&app, &format!("/api/v1/deposits/{deposit_id}")).await;
    assert_eq!(body["status"], "VOIDED");
    let (_, stock) = get(&app, &format!("/api/v1/products/{product}/stock")).await;
    assert_eq!(stock["onHand"], "0.00");
}

#[tokio::test]
async fn test_sale_ships_stock_and_rejects_shortfall() {
    let app = app().await;
    let product = Uuid::new_v4();
    let buyer = Uuid::new_v4();

    post(
        &app,
        "/api/v1/purchases",
        json!({
            "producerId": Uuid::new_v4(),
            "productId": product,
            "quantity": "30",
            "unitPrice": "1.75",
        }),
    )
    .await;
    let (status, commitment) = post(
        &app,
        "/api/v1/sales/commitments",
        json!({ "buyerId": buyer, "productId": product, "quantity": "50", "unitPrice": "3" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(commitment["status"], "PENDING");

    let (status, body) = post(
        &app,
        "/api/v1/sales/liquidations",
        json!({ "buyerId": buyer, "productId": product, "quantity": "31" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "InsufficientInventory");

    let (status, sale) = post(
        &app,
        "/api/v1/sales/liquidations",
        json!({ "buyerId": buyer, "productId": product, "quantity": "30" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sale["appliedAmount"], "90.00");
    assert_eq!(sale["draws"][0]["onHandAfter"], "0.00");

    let uri = format!(
        "/api/v1/sales/commitments/{}",
        commitment["id"].as_str().unwrap()
    );
    let (_, body) = get(&app, &uri).await;
    assert_eq!(body["status"], "PENDING");
}

#[tokio::test]
async fn test_contract_delivery_reports_remaining_quantity() {
    let app = app().await;
    let (status, contract) = post(
        &app,
        "/api/v1/contracts",
        json!({
            "direction": "INCOMING",
            "counterpartyId": Uuid::new_v4(),
            "productId": Uuid::new_v4(),
            "quantity": "100",
            "unitPrice": "210",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(contract["remainingQuantity"], "100.00");
    let contract_id = contract["id"].as_str().unwrap().to_string();

    let (status, body) = post(
        &app,
        "/api/v1/contracts/deliveries",
        json!({ "contractId": contract_id, "quantity": "100", "price": "212.40" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["remainingQuantity"], "0.00");
    assert_eq!(body["contractStatus"], "LIQUIDATED");

    let (status, body) = post(
        &app,
        "/api/v1/contracts/deliveries",
        json!({ "contractId": contract_id, "quantity": "0.01", "price": "212.40" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "ExceedsContractBalance");
}

#[tokio::test]
async fn test_unknown_reference_type_is_rejected() {
    let app = app().await;
    let (status, body) = post(
        &app,
        "/api/v1/voids",
        json!({ "referenceType": "Invoice", "referenceId": Uuid::new_v4() }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidRequest");

    let (status, body) = post(
        &app,
        "/api/v1/voids",
        json!({ "referenceType": "Purchase", "referenceId": Uuid::new_v4() }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "EntityNotFound");
}
