//! Integration tests for `SyncClient` and `Pager`.
//!
//! Uses `wiremock` to stand up a local SOAP endpoint for each test so no
//! real network traffic is made. Covers paging, error propagation, caching,
//! call spacing and the tolerant record normalization.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use sdsync_client::{OrderQuery, PageOptions, SyncClient, SyncError};
use sdsync_core::{Credentials, OrderType, SyncConfig};

const API_PATH: &str = "/api/sellerdynamicsapi.asmx";

/// Config pointed at `server` with spacing, delays and retries disabled.
fn test_config(server: &MockServer) -> SyncConfig {
    let credentials = Credentials::new(
        format!("{}{API_PATH}", server.uri()),
        "retailer-1",
        "ZW5jcnlwdGVk",
    )
    .expect("valid test credentials");
    let mut config = SyncConfig::with_defaults(credentials);
    config.min_call_interval_ms = 0;
    config.inter_page_delay_ms = 0;
    config.max_retries = 0;
    config.retry_backoff_base_ms = 0;
    config.request_timeout_secs = 5;
    config
}

fn test_client(server: &MockServer) -> SyncClient {
    SyncClient::new(&test_config(server)).expect("failed to build test SyncClient")
}

fn soap_response(operation: &str, result_body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <soap:Body>
    <{operation}Response xmlns="https://my.sellerdynamics.com/">
      <{operation}Result>{result_body}</{operation}Result>
    </{operation}Response>
  </soap:Body>
</soap:Envelope>"#
    )
}

fn stock_page(more: bool, items: &str) -> String {
    soap_response(
        "GetStockLevels",
        &format!("<IsError>false</IsError><More>{more}</More><StockLevels>{items}</StockLevels>"),
    )
}

fn stock_item(sku: &str, quantity: &str) -> String {
    format!("<StockLevelItem><SKU>{sku}</SKU><Quantity>{quantity}</Quantity></StockLevelItem>")
}

fn order_page(more: bool, ids: &[&str]) -> String {
    let orders: String = ids
        .iter()
        .map(|id| format!("<Order><OrderId>{id}</OrderId><TotalAmount>10.00</TotalAmount></Order>"))
        .collect();
    soap_response(
        "GetCustomerOrders",
        &format!("<IsError>false</IsError><More>{more}</More><Orders>{orders}</Orders>"),
    )
}

fn product_page(more: bool, ids: &[&str]) -> String {
    let products: String = ids
        .iter()
        .map(|id| format!("<Product><ProductId>{id}</ProductId><SKU>SKU-{id}</SKU></Product>"))
        .collect();
    soap_response(
        "GetProducts",
        &format!("<IsError>false</IsError><More>{more}</More><Products>{products}</Products>"),
    )
}

fn soap_call(operation: &str) -> wiremock::MockBuilder {
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(header(
            "SOAPAction",
            format!("https://my.sellerdynamics.com/{operation}").as_str(),
        ))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

// ---------------------------------------------------------------------------
// Paging
// ---------------------------------------------------------------------------

#[tokio::test]
async fn orders_across_two_pages_are_concatenated_in_order() {
    let server = MockServer::start().await;

    soap_call("GetCustomerOrders")
        .and(body_string_contains("<pageNumber>1</pageNumber>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(order_page(true, &["1", "2"])))
        .expect(1)
        .mount(&server)
        .await;
    soap_call("GetCustomerOrders")
        .and(body_string_contains("<pageNumber>2</pageNumber>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(order_page(false, &["3", "4"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let orders = client
        .get_customer_orders(OrderQuery::new(date(2024, 1, 1), date(2024, 1, 31)))
        .await
        .expect("orders fetch should succeed");

    let ids: Vec<&str> = orders.iter().map(|o| o.order_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4"]);
    assert_eq!(orders[0].total_amount, Decimal::new(1000, 2));
}

#[tokio::test]
async fn stock_levels_across_two_pages_keep_page_order() {
    let server = MockServer::start().await;

    let first_page: String = ["S1", "S2", "S3"].iter().map(|sku| stock_item(sku, "5")).collect();
    soap_call("GetStockLevels")
        .and(body_string_contains("<pageNumber>1</pageNumber>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(stock_page(true, &first_page)))
        .expect(1)
        .mount(&server)
        .await;
    soap_call("GetStockLevels")
        .and(body_string_contains("<pageNumber>2</pageNumber>"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(stock_page(false, &stock_item("S4", "5"))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let levels = client
        .get_all_stock_levels(PageOptions::default())
        .await
        .expect("stock fetch should succeed");

    let skus: Vec<&str> = levels.iter().map(|l| l.sku.as_str()).collect();
    assert_eq!(skus, vec!["S1", "S2", "S3", "S4"]);
}

#[tokio::test]
async fn order_request_carries_filter_parameters() {
    let server = MockServer::start().await;

    soap_call("GetCustomerOrders")
        .and(body_string_contains("<orderType>COMPLETED</orderType>"))
        .and(body_string_contains("<fromDate>2024-02-01</fromDate>"))
        .and(body_string_contains("<toDate>2024-02-29</toDate>"))
        .and(body_string_contains("<pageSize>100</pageSize>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(order_page(false, &["9"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let orders = client
        .get_customer_orders(
            OrderQuery::new(date(2024, 2, 1), date(2024, 2, 29)).with_order_type(OrderType::Completed),
        )
        .await
        .expect("orders fetch should succeed");
    assert_eq!(orders.len(), 1);
}

#[tokio::test]
async fn orders_nested_under_customers_take_customer_details() {
    let server = MockServer::start().await;

    let body = soap_response(
        "GetCustomerOrders",
        "<IsError>false</IsError><More>false</More><Customers>\
         <Customer><CustomerName>Ada Lovelace</CustomerName><CustomerEmail>ada@example.com</CustomerEmail>\
           <Orders><Order><OrderId>A1</OrderId></Order><Order><OrderId>A2</OrderId></Order></Orders></Customer>\
         <Customer><CustomerName>Alan Turing</CustomerName>\
           <Orders><Order><OrderId>T1</OrderId></Order></Orders></Customer>\
         </Customers>",
    );
    soap_call("GetCustomerOrders")
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let orders = client
        .get_customer_orders(OrderQuery::new(date(2024, 1, 1), date(2024, 1, 2)))
        .await
        .expect("orders fetch should succeed");

    assert_eq!(orders.len(), 3);
    assert_eq!(orders[1].customer_name, "Ada Lovelace");
    assert_eq!(orders[1].customer_email, "ada@example.com");
    assert_eq!(orders[2].customer_name, "Alan Turing");
    assert_eq!(orders[2].customer_email, "");
}

#[tokio::test]
async fn legacy_pagination_block_drives_order_paging() {
    let server = MockServer::start().await;

    let page = |ids: &[&str]| {
        let orders: String = ids
            .iter()
            .map(|id| format!("<Order><OrderId>{id}</OrderId></Order>"))
            .collect();
        soap_response(
            "GetCustomerOrders",
            &format!(
                "<IsError>false</IsError>\
                 <Pagination><PageSize>2</PageSize><RecordsAffected>3</RecordsAffected></Pagination>\
                 <Orders>{orders}</Orders>"
            ),
        )
    };
    soap_call("GetCustomerOrders")
        .and(body_string_contains("<pageNumber>1</pageNumber>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page(&["1", "2"])))
        .expect(1)
        .mount(&server)
        .await;
    soap_call("GetCustomerOrders")
        .and(body_string_contains("<pageNumber>2</pageNumber>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page(&["3"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let orders = client
        .get_customer_orders(OrderQuery::new(date(2024, 1, 1), date(2024, 1, 2)))
        .await
        .expect("orders fetch should succeed");
    assert_eq!(orders.len(), 3);
}

#[tokio::test]
async fn products_across_pages() {
    let server = MockServer::start().await;

    soap_call("GetProducts")
        .and(body_string_contains("<pageNumber>1</pageNumber>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page(true, &["1"])))
        .expect(1)
        .mount(&server)
        .await;
    soap_call("GetProducts")
        .and(body_string_contains("<pageNumber>2</pageNumber>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page(false, &["2", "3"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let products = client
        .get_all_products(PageOptions::default())
        .await
        .expect("products fetch should succeed");
    assert_eq!(products.len(), 3);
    assert_eq!(products[2].sku.as_deref(), Some("SKU-3"));
}

#[tokio::test]
async fn start_page_zero_is_sent_as_page_one() {
    let server = MockServer::start().await;

    soap_call("GetStockLevels")
        .and(body_string_contains("<pageNumber>1</pageNumber>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(stock_page(false, &stock_item("A", "1"))))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let stock = client
        .get_all_stock_levels(PageOptions {
            page_size: None,
            start_page: Some(0),
        })
        .await
        .expect("stock fetch should succeed");
    assert_eq!(stock.len(), 1);
}

#[tokio::test]
async fn page_ceiling_stops_a_stuck_more_flag() {
    let server = MockServer::start().await;

    soap_call("GetStockLevels")
        .respond_with(ResponseTemplate::new(200).set_body_string(stock_page(true, &stock_item("A", "1"))))
        .expect(3)
        .mount(&server)
        .await;

    let mut config = test_config(&server);
    config.max_pages = 3;
    let client = SyncClient::new(&config).expect("client");

    let result = client.get_all_stock_levels(PageOptions::default()).await;
    assert!(
        matches!(result, Err(SyncError::PaginationLimit { max_pages: 3, .. })),
        "expected PaginationLimit, got: {result:?}"
    );
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_config_is_rejected_before_any_request() {
    let server = MockServer::start().await;
    let mut config = test_config(&server);
    config.max_pages = 0;

    let result = SyncClient::new(&config);
    assert!(
        matches!(result, Err(SyncError::Configuration(_))),
        "expected Configuration error, got: {:?}",
        result.err()
    );
}

#[tokio::test]
async fn remote_error_rejects_and_is_not_cached() {
    let server = MockServer::start().await;

    let body = soap_response(
        "GetStockLevels",
        "<IsError>true</IsError><ErrorMessage>Invalid credentials</ErrorMessage>",
    );
    soap_call("GetStockLevels")
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(2)
        .mount(&server)
        .await;

    let client = test_client(&server);
    for _ in 0..2 {
        let err = client
            .get_all_stock_levels(PageOptions::default())
            .await
            .expect_err("remote error must reject");
        assert!(matches!(err, SyncError::RemoteBusiness { .. }), "got: {err:?}");
        assert!(err.to_string().contains("Invalid credentials"), "got: {err}");
        assert_eq!(err.remote_message(), Some("Invalid credentials"));
    }
}

#[tokio::test]
async fn error_on_later_page_discards_earlier_pages() {
    let server = MockServer::start().await;

    soap_call("GetStockLevels")
        .and(body_string_contains("<pageNumber>1</pageNumber>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(stock_page(true, &stock_item("A", "1"))))
        .mount(&server)
        .await;
    soap_call("GetStockLevels")
        .and(body_string_contains("<pageNumber>2</pageNumber>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(soap_response(
            "GetStockLevels",
            "<IsError>true</IsError><ErrorMessage>Session expired</ErrorMessage>",
        )))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let result = client.get_all_stock_levels(PageOptions::default()).await;
    assert!(
        matches!(result, Err(SyncError::RemoteBusiness { page: 2, ref message, .. }) if message == "Session expired"),
        "expected RemoteBusiness on page 2, got: {result:?}"
    );
}

#[tokio::test]
async fn soap_fault_with_server_error_status_is_parsed() {
    let server = MockServer::start().await;

    let fault = r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body><soap:Fault><faultcode>soap:Client</faultcode>
    <faultstring>Unable to handle request without a valid action parameter.</faultstring>
  </soap:Fault></soap:Body>
</soap:Envelope>"#;
    soap_call("GetProducts")
        .respond_with(ResponseTemplate::new(500).set_body_string(fault))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let result = client.get_all_products(PageOptions::default()).await;
    match result {
        Err(SyncError::Parse { ref reason, .. }) => {
            assert!(reason.contains("valid action parameter"), "got: {reason}");
        }
        other => panic!("expected Parse error, got: {other:?}"),
    }
}

#[tokio::test]
async fn non_xml_body_is_a_parse_error() {
    let server = MockServer::start().await;

    soap_call("GetStockLevels")
        .respond_with(ResponseTemplate::new(502).set_body_string("<html><body>Bad Gateway"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let result = client.get_all_stock_levels(PageOptions::default()).await;
    assert!(
        matches!(result, Err(SyncError::Parse { page: 1, .. })),
        "expected Parse error, got: {result:?}"
    );
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    let credentials = Credentials::new("http://127.0.0.1:9/api", "retailer-1", "ZW5j").expect("creds");
    let mut config = SyncConfig::with_defaults(credentials);
    config.min_call_interval_ms = 0;
    config.max_retries = 0;
    let client = SyncClient::new(&config).expect("client");

    let result = client.get_all_stock_levels(PageOptions::default()).await;
    assert!(
        matches!(result, Err(SyncError::Transport(_))),
        "expected Transport error, got: {result:?}"
    );
}

#[tokio::test]
async fn timed_out_fetch_is_retried() {
    let server = MockServer::start().await;

    soap_call("GetStockLevels")
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(stock_page(false, &stock_item("SLOW", "1")))
                .set_delay(Duration::from_secs(3)),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    soap_call("GetStockLevels")
        .respond_with(ResponseTemplate::new(200).set_body_string(stock_page(false, &stock_item("FAST", "1"))))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config(&server);
    config.request_timeout_secs = 1;
    config.max_retries = 1;
    let client = SyncClient::new(&config).expect("client");

    let stock = client
        .get_all_stock_levels(PageOptions::default())
        .await
        .expect("retry should succeed");
    assert_eq!(stock[0].sku, "FAST");
}

// ---------------------------------------------------------------------------
// Caching
// ---------------------------------------------------------------------------

#[tokio::test]
async fn second_call_within_ttl_is_served_from_cache() {
    let server = MockServer::start().await;

    soap_call("GetStockLevels")
        .respond_with(ResponseTemplate::new(200).set_body_string(stock_page(false, &stock_item("A", "3"))))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let first = client.get_all_stock_levels(PageOptions::default()).await.expect("first");
    let second = client.get_all_stock_levels(PageOptions::default()).await.expect("second");
    assert_eq!(first, second);
}

#[tokio::test]
async fn different_page_size_is_a_different_cache_entry() {
    let server = MockServer::start().await;

    soap_call("GetStockLevels")
        .respond_with(ResponseTemplate::new(200).set_body_string(stock_page(false, &stock_item("A", "3"))))
        .expect(2)
        .mount(&server)
        .await;

    let client = test_client(&server);
    client.get_all_stock_levels(PageOptions::default()).await.expect("default size");
    client
        .get_all_stock_levels(PageOptions {
            page_size: Some(10),
            start_page: None,
        })
        .await
        .expect("small size");
}

#[tokio::test]
async fn clear_cache_forces_a_refetch() {
    let server = MockServer::start().await;

    soap_call("GetProducts")
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page(false, &["1"])))
        .expect(2)
        .mount(&server)
        .await;

    let client = test_client(&server);
    client.get_all_products(PageOptions::default()).await.expect("first");
    client.clear_cache();
    client.get_all_products(PageOptions::default()).await.expect("after clear");
}

// ---------------------------------------------------------------------------
// Call spacing
// ---------------------------------------------------------------------------

/// Records the arrival time of every request it answers.
struct Recording {
    arrivals: Arc<Mutex<Vec<Instant>>>,
    body: String,
}

impl Respond for Recording {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        self.arrivals
            .lock()
            .expect("arrivals lock")
            .push(Instant::now());
        ResponseTemplate::new(200).set_body_string(self.body.clone())
    }
}

#[tokio::test]
async fn concurrent_calls_to_different_operations_are_spaced() {
    let server = MockServer::start().await;
    let arrivals = Arc::new(Mutex::new(Vec::new()));

    soap_call("GetStockLevels")
        .respond_with(Recording {
            arrivals: Arc::clone(&arrivals),
            body: stock_page(false, &stock_item("A", "1")),
        })
        .expect(1)
        .mount(&server)
        .await;
    soap_call("GetProducts")
        .respond_with(Recording {
            arrivals: Arc::clone(&arrivals),
            body: product_page(false, &["1"]),
        })
        .expect(1)
        .mount(&server)
        .await;

    soap_call("GetCustomerOrders")
        .respond_with(ResponseTemplate::new(200).set_body_string(order_page(false, &["1"])))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config(&server);
    config.min_call_interval_ms = 1_000;
    let client = SyncClient::new(&config).expect("client");

    // Opens the pooled connection so neither measured request pays for setup.
    client
        .get_customer_orders(OrderQuery::new(date(2024, 1, 1), date(2024, 1, 2)))
        .await
        .expect("warm-up fetch");

    let (stock, products) = tokio::join!(
        client.get_all_stock_levels(PageOptions::default()),
        client.get_all_products(PageOptions::default()),
    );
    stock.expect("stock fetch");
    products.expect("products fetch");

    let mut times = arrivals.lock().expect("arrivals lock").clone();
    times.sort();
    assert_eq!(times.len(), 2);
    let gap = times[1] - times[0];
    assert!(gap >= Duration::from_millis(1_000), "calls only {gap:?} apart");
}

#[tokio::test]
async fn concurrent_calls_for_the_same_data_fetch_once() {
    let server = MockServer::start().await;

    soap_call("GetStockLevels")
        .respond_with(
            ResponseTemplate::new(200).set_body_string(stock_page(false, &stock_item("A", "4"))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config(&server);
    config.min_call_interval_ms = 500;
    let client = SyncClient::new(&config).expect("client");

    let (first, second) = tokio::join!(
        client.get_all_stock_levels(PageOptions::default()),
        client.get_all_stock_levels(PageOptions::default()),
    );
    let first = first.expect("first stock fetch");
    let second = second.expect("second stock fetch");

    assert_eq!(first.len(), 1);
    assert_eq!(first, second);
}

// ---------------------------------------------------------------------------
// Normalization through the full stack
// ---------------------------------------------------------------------------

#[tokio::test]
async fn non_numeric_quantity_normalizes_to_zero() {
    let server = MockServer::start().await;

    soap_call("GetStockLevels")
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(stock_page(false, &stock_item("BAD-QTY", "not-a-number"))),
        )
        .mount(&server)
        .await;

    let client = test_client(&server);
    let stock = client
        .get_all_stock_levels(PageOptions::default())
        .await
        .expect("stock fetch should succeed");
    assert_eq!(stock.len(), 1);
    assert_eq!(stock[0].quantity, 0);
    assert_eq!(stock[0].product_name, "Product BAD-QTY");
}

#[tokio::test]
async fn single_record_and_record_list_both_normalize() {
    let server = MockServer::start().await;

    soap_call("GetStockLevels")
        .and(body_string_contains("<pageSize>1</pageSize>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(stock_page(false, &stock_item("ONE", "1"))))
        .mount(&server)
        .await;
    let many = format!("{}{}{}", stock_item("A", "1"), stock_item("B", "2"), stock_item("C", "3"));
    soap_call("GetStockLevels")
        .and(body_string_contains("<pageSize>3</pageSize>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(stock_page(false, &many)))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let one = client
        .get_all_stock_levels(PageOptions {
            page_size: Some(1),
            start_page: None,
        })
        .await
        .expect("single");
    let three = client
        .get_all_stock_levels(PageOptions {
            page_size: Some(3),
            start_page: None,
        })
        .await
        .expect("list");
    assert_eq!(one.len(), 1);
    assert_eq!(three.len(), 3);
    assert_eq!(three[2].quantity, 3);
}

#[tokio::test]
async fn records_without_sku_are_skipped() {
    let server = MockServer::start().await;

    let items = format!(
        "{}<StockLevelItem><Quantity>5</Quantity></StockLevelItem>",
        stock_item("KEEP", "1")
    );
    soap_call("GetStockLevels")
        .respond_with(ResponseTemplate::new(200).set_body_string(stock_page(false, &items)))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let stock = client
        .get_all_stock_levels(PageOptions::default())
        .await
        .expect("stock fetch should succeed");
    assert_eq!(stock.len(), 1);
    assert_eq!(stock[0].sku, "KEEP");
}
