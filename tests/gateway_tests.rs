mod common;

use common::{CountingProcessor, FailingProcessor, item, order, settings};
use invoicebox_commerce::application::payment_link::CheckoutService;
use invoicebox_commerce::config::Settings;
use invoicebox_commerce::domain::ports::GatewayClient;
use invoicebox_commerce::error::{CheckoutError, GatewayError};
use invoicebox_commerce::infrastructure::http_gateway::InvoiceboxHttpClient;
use invoicebox_commerce::infrastructure::in_memory::{InMemoryCurrencies, InMemoryOrderProcessor};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ORDER_PATH: &str = "/v3/billing/api/order/order";

fn settings_for(server: &MockServer) -> Settings {
    Settings {
        api_base_url: server.uri(),
        ..settings()
    }
}

fn service(settings: Settings, processor: InMemoryOrderProcessor) -> CheckoutService {
    let gateway = InvoiceboxHttpClient::from_settings(&settings).unwrap();
    CheckoutService::new(
        settings,
        Box::new(processor),
        Box::new(InMemoryCurrencies::default()),
        Box::new(gateway),
    )
}

fn sample_processor() -> InMemoryOrderProcessor {
    InMemoryOrderProcessor::with_order(order(
        vec![item("1", dec!(500), dec!(2)), item("2", dec!(180), dec!(1))],
        dec!(1180),
    ))
}

#[tokio::test]
async fn test_payment_link_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ORDER_PATH))
        .and(header("authorization", "Bearer token"))
        .and(body_partial_json(json!({
            "merchantId": "shop-1",
            "merchantOrderId": "42",
            "currencyId": "RUB",
            "amount": 1180.0
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"id": "g-1", "paymentUrl": "https://pay.invoicebox.ru/g-1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let processor = sample_processor();
    let service = service(settings_for(&server), processor.clone());

    let link = service.payment_link().await.unwrap();
    assert_eq!(link.as_deref(), Some("https://pay.invoicebox.ru/g-1"));

    let payments = processor.payments().await;
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].order_id, 42);
    assert_eq!(payments[0].amount.value(), dec!(1180));
}

#[tokio::test]
async fn test_gateway_error_status_gives_no_link() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ORDER_PATH))
        .respond_with(ResponseTemplate::new(422).set_body_string("invalid basket"))
        .expect(1)
        .mount(&server)
        .await;

    let mut settings = settings_for(&server);
    settings.debug = true;
    let link = service(settings, sample_processor()).payment_link().await.unwrap();
    assert_eq!(link, None);
}

#[tokio::test]
async fn test_missing_payment_url_gives_no_link() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ORDER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": "g-1"}})))
        .mount(&server)
        .await;

    let link = service(settings_for(&server), sample_processor())
        .payment_link()
        .await
        .unwrap();
    assert_eq!(link, None);
}

#[tokio::test]
async fn test_empty_response_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ORDER_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let settings = settings_for(&server);
    let client = InvoiceboxHttpClient::from_settings(&settings).unwrap();
    let request = service(settings, sample_processor()).prepare().await.unwrap();
    assert_eq!(client.create_order(&request).await.unwrap(), None);
}

#[tokio::test]
async fn test_request_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ORDER_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(3))
                .set_body_json(json!({"data": {"id": "g-1", "paymentUrl": "https://pay/1"}})),
        )
        .mount(&server)
        .await;

    let mut settings = settings_for(&server);
    settings.request_timeout_secs = 1;
    let client = InvoiceboxHttpClient::from_settings(&settings).unwrap();
    let request = service(settings.clone(), sample_processor())
        .prepare()
        .await
        .unwrap();

    match client.create_order(&request).await {
        Err(GatewayError::HttpError(e)) => assert!(e.is_timeout()),
        other => panic!("expected timeout, got {:?}", other),
    }

    let link = service(settings, sample_processor()).payment_link().await.unwrap();
    assert_eq!(link, None);
}

#[tokio::test]
async fn test_missing_credentials_never_calls_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut settings = settings_for(&server);
    settings.merchant_id.clear();
    let processor = sample_processor();
    let result = service(settings, processor.clone()).payment_link().await;

    assert!(matches!(result, Err(CheckoutError::MissingCredentials)));
    assert!(processor.payments().await.is_empty());
}

#[tokio::test]
async fn test_unknown_currency() {
    let server = MockServer::start().await;
    let mut o = order(vec![item("1", dec!(10), dec!(1))], dec!(10));
    o.currency = "XYZ".to_string();

    let result = service(settings_for(&server), InMemoryOrderProcessor::with_order(o))
        .payment_link()
        .await;
    assert!(matches!(result, Err(CheckoutError::UnknownCurrency(c)) if c == "XYZ"));
}

#[tokio::test]
async fn test_overflowing_cart_never_reaches_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let price = Decimal::MAX / dec!(2);
    let o = order(vec![item("1", price, dec!(3))], price);
    let result = service(settings_for(&server), InMemoryOrderProcessor::with_order(o))
        .payment_link()
        .await;
    assert!(matches!(result, Err(CheckoutError::AmountOverflow(_))));
}

#[tokio::test]
async fn test_processor_failure_is_an_error() {
    let server = MockServer::start().await;
    let settings = settings_for(&server);
    let gateway = InvoiceboxHttpClient::from_settings(&settings).unwrap();
    let service = CheckoutService::new(
        settings,
        Box::new(FailingProcessor),
        Box::new(InMemoryCurrencies::default()),
        Box::new(gateway),
    );

    assert!(matches!(
        service.payment_link().await,
        Err(CheckoutError::ProcessorError(_))
    ));
}

#[tokio::test]
async fn test_counting_processor_sees_one_payment_per_checkout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ORDER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"id": "g-1", "paymentUrl": "https://pay/1"}
        })))
        .mount(&server)
        .await;

    let processor = CountingProcessor::new(sample_processor());
    let settings = settings_for(&server);
    let gateway = InvoiceboxHttpClient::from_settings(&settings).unwrap();
    let service = CheckoutService::new(
        settings,
        Box::new(processor.clone()),
        Box::new(InMemoryCurrencies::default()),
        Box::new(gateway),
    );

    service.payment_link().await.unwrap();
    service.payment_link().await.unwrap();

    assert_eq!(processor.inner.payments().await.len(), 2);
    assert_eq!(processor.applies(), 0);
}
