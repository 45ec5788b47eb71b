//! End-to-end tests of the HTTP client against a throwaway axum backend

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use stockscope::models::ClientConfig;
use stockscope::services::{
    HttpResourceClient, MutationCoordinator, QueryCache, QueryData, QueryKey, ResourceClient,
};
use stockscope::AppError;

/// Records `METHOD path?query body` for every request it answers
#[derive(Clone, Default)]
struct Backend {
    log: Arc<Mutex<Vec<String>>>,
}

impl Backend {
    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

type Params = Query<HashMap<String, String>>;

fn param(params: &HashMap<String, String>, name: &str) -> String {
    params.get(name).cloned().unwrap_or_default()
}

fn not_found(detail: String) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": detail }))).into_response()
}

fn toyota() -> Value {
    json!({
        "id": 1,
        "ticker": "7203.T",
        "name": "Toyota Motor Corp",
        "sector": "Automotive",
        "market": "TSE",
        "description": null,
        "is_active": true
    })
}

async fn list_stocks(State(b): State<Backend>) -> Json<Value> {
    b.record("GET /stocks".to_string());
    Json(json!({ "stocks": [toyota()], "total": 1 }))
}

async fn get_stock(State(b): State<Backend>, Path(ticker): Path<String>) -> Response {
    b.record(format!("GET /stocks/{}", ticker));
    if ticker == "7203.T" {
        Json(toyota()).into_response()
    } else {
        not_found(format!("Stock {} not found", ticker))
    }
}

async fn register_stock(State(b): State<Backend>, Json(body): Json<Value>) -> Response {
    b.record(format!("POST /stocks {}", body));
    let stock = json!({
        "id": 2,
        "ticker": body["ticker"],
        "name": body["name"],
    });
    (StatusCode::CREATED, Json(stock)).into_response()
}

async fn refresh_prices(
    State(b): State<Backend>,
    Path(ticker): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    b.record(format!("POST /stocks/{}/fetch {}", ticker, body));
    Json(json!({
        "ticker": ticker,
        "saved_count": 245,
        "message": "Fetched 245 price records"
    }))
}

/// Prices come back the way the backend serializes `Decimal`: as strings
async fn get_prices(
    State(b): State<Backend>,
    Path(ticker): Path<String>,
    Query(params): Params,
) -> Json<Value> {
    b.record(format!("GET /stocks/{}/prices?limit={}", ticker, param(&params, "limit")));
    Json(json!({
        "ticker": ticker,
        "total": 2,
        "prices": [
            {
                "price_date": "2024-03-01",
                "open": "2801.00", "high": "2850.50", "low": "2790.00", "close": "2845.25",
                "volume": 15234000, "adjusted_close": null
            },
            {
                "price_date": "2024-03-04",
                "open": 2845.0, "high": 2870.0, "low": 2831.5, "close": 2866.0,
                "volume": 12001000, "adjusted_close": "2866.00"
            }
        ]
    }))
}

async fn get_technical(
    State(b): State<Backend>,
    Path(ticker): Path<String>,
    Query(params): Params,
) -> Json<Value> {
    b.record(format!("GET /analysis/{}/technical?days={}", ticker, param(&params, "days")));
    if ticker == "SLOW" {
        tokio::time::sleep(Duration::from_secs(2)).await;
    }
    Json(json!([
        {
            "date": "2024-03-01", "open": 2801.0, "high": 2850.5, "low": 2790.0,
            "close": 2845.25, "volume": 15234000.0,
            "SMA_20": null, "SMA_50": null, "RSI_14": null
        },
        {
            "date": "2024-03-04", "open": 2845.0, "high": 2870.0, "low": 2831.5,
            "close": 2866.0, "volume": 12001000.0,
            "SMA_20": 2812.456, "SMA_50": null, "RSI_14": 61.25
        }
    ]))
}

async fn predict(
    State(b): State<Backend>,
    Path(ticker): Path<String>,
    Query(params): Params,
) -> Response {
    let target_days = param(&params, "target_days");
    b.record(format!("POST /analysis/{}/predict?target_days={}", ticker, target_days));
    if ticker == "NEW.T" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Insufficient data. Need at least 100 days" })),
        )
            .into_response();
    }
    Json(json!({
        "ticker": ticker,
        "target_days": target_days.parse::<u32>().unwrap_or(30),
        "predicted_return": 0.0421
    }))
    .into_response()
}

async fn get_news(
    State(b): State<Backend>,
    Path(query): Path<String>,
    Query(params): Params,
) -> Json<Value> {
    b.record(format!("GET /news/{}?limit={}", query, param(&params, "limit")));
    Json(json!({
        "query": query,
        "total": 1,
        "articles": [{
            "title": "Toyota raises full-year outlook",
            "source": "Nikkei",
            "published_at": "2024-03-04T09:00:00",
            "url": "https://news.example/toyota-outlook"
        }]
    }))
}

async fn sentiment(State(b): State<Backend>, Json(body): Json<Value>) -> Json<Value> {
    b.record(format!("POST /analysis/sentiment {}", body));
    Json(json!({ "text": body["text"], "label": "positive", "score": 0.93 }))
}

async fn list_macro(State(b): State<Backend>) -> Json<Value> {
    b.record("GET /macro".to_string());
    Json(json!({ "indicators": [{ "key": "cpi", "name": "Consumer Price Index", "series_id": "CPIAUCSL" }] }))
}

async fn get_macro(
    State(b): State<Backend>,
    Path(key): Path<String>,
    Query(params): Params,
) -> Response {
    b.record(format!("GET /macro/{}?limit={}", key, param(&params, "limit")));
    if key != "cpi" {
        return not_found(format!("Unknown indicator {}", key));
    }
    Json(json!({
        "indicator": "cpi",
        "name": "Consumer Price Index",
        "series_id": "CPIAUCSL",
        "data": [
            { "indicator_date": "2024-01-01", "value": "308.417" },
            { "indicator_date": "2024-02-01", "value": null }
        ],
        "total": 2
    }))
    .into_response()
}

async fn refresh_macro(
    State(b): State<Backend>,
    Path(key): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    b.record(format!("POST /macro/{}/fetch {}", key, body));
    Json(json!({ "indicator": key, "saved_count": 120, "message": null }))
}

async fn health(State(b): State<Backend>) -> Response {
    b.record("GET /health".to_string());
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "detail": "database unreachable" })),
    )
        .into_response()
}

async fn spawn_backend() -> (String, Backend) {
    let backend = Backend::default();
    let api = Router::new()
        .route("/stocks", get(list_stocks).post(register_stock))
        .route("/stocks/{ticker}", get(get_stock))
        .route("/stocks/{ticker}/fetch", post(refresh_prices))
        .route("/stocks/{ticker}/prices", get(get_prices))
        .route("/analysis/sentiment", post(sentiment))
        .route("/analysis/{ticker}/technical", get(get_technical))
        .route("/analysis/{ticker}/predict", post(predict))
        .route("/news/{query}", get(get_news))
        .route("/macro", get(list_macro))
        .route("/macro/{key}", get(get_macro))
        .route("/macro/{key}/fetch", post(refresh_macro))
        .route("/health", get(health));

    let app = Router::new()
        .nest("/api/v1", api)
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/api/v1/", addr), backend)
}

fn client_for(base_url: &str) -> HttpResourceClient {
    HttpResourceClient::new(&ClientConfig::new(base_url).unwrap()).unwrap()
}

#[tokio::test]
async fn test_stock_endpoints() {
    let (base, backend) = spawn_backend().await;
    let client = client_for(&base);

    let list = client.list_stocks().await.unwrap();
    assert_eq!(list.total, 1);
    assert_eq!(list.stocks[0].sector.as_deref(), Some("Automotive"));

    let stock = client.get_stock("7203.T").await.unwrap();
    assert_eq!(stock.name, "Toyota Motor Corp");

    let err = client.get_stock("9999.T").await.unwrap_err();
    assert_eq!(err, AppError::NotFound("Stock 9999.T not found".to_string()));

    let created = client.register_stock(" 6758.T ", "Sony Group").await.unwrap();
    assert_eq!(created.ticker, "6758.T");
    assert!(created.is_active);

    assert_eq!(
        backend.log(),
        vec![
            "GET /stocks",
            "GET /stocks/7203.T",
            "GET /stocks/9999.T",
            r#"POST /stocks {"name":"Sony Group","ticker":"6758.T"}"#,
        ]
    );
}

#[tokio::test]
async fn test_prices_accept_decimal_strings() {
    let (base, backend) = spawn_backend().await;
    let client = client_for(&base);

    let prices = client.get_prices("7203.T", 365).await.unwrap();
    assert_eq!(prices.count, 2);
    assert_eq!(prices.prices[0].close, 2845.25);
    assert_eq!(prices.prices[0].adjusted_close, None);
    assert_eq!(prices.latest().unwrap().adjusted_close, Some(2866.0));

    let refresh = client.refresh_prices("7203.T", "1y").await.unwrap();
    assert_eq!(refresh.count, 245);
    assert!(refresh.prices.is_empty());

    assert_eq!(
        backend.log(),
        vec![
            "GET /stocks/7203.T/prices?limit=365",
            r#"POST /stocks/7203.T/fetch {"period":"1y"}"#,
        ]
    );
}

#[tokio::test]
async fn test_technical_indicators_keep_nulls() {
    let (base, backend) = spawn_backend().await;
    let client = client_for(&base);

    let records = client.get_technical_indicators("7203.T", 180).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].sma_20, None);
    assert_eq!(records[1].sma_20, Some(2812.456));
    assert_eq!(records[1].rsi_14, Some(61.25));
    assert_eq!(backend.log(), vec!["GET /analysis/7203.T/technical?days=180"]);
}

#[tokio::test]
async fn test_prediction_short_history_is_none() {
    let (base, backend) = spawn_backend().await;
    let client = client_for(&base);

    let prediction = client.predict_return("7203.T", 30).await.unwrap().unwrap();
    assert_eq!(prediction.target_days, 30);
    assert_eq!(prediction.predicted_return, 0.0421);

    assert_eq!(client.predict_return("NEW.T", 30).await.unwrap(), None);
    assert_eq!(
        backend.log(),
        vec![
            "POST /analysis/7203.T/predict?target_days=30",
            "POST /analysis/NEW.T/predict?target_days=30",
        ]
    );
}

#[tokio::test]
async fn test_news_sentiment_and_macro() {
    let (base, backend) = spawn_backend().await;
    let client = client_for(&base);

    let news = client.get_news("toyota motor", 5).await.unwrap();
    assert_eq!(news.count, 1);
    assert_eq!(news.articles[0].published.as_deref(), Some("2024-03-04T09:00:00"));
    assert_eq!(news.articles[0].summary, "");

    let sentiment = client.analyze_sentiment("Record profits").await.unwrap();
    assert_eq!(sentiment.label, "positive");

    let indicators = client.list_macro_indicators().await.unwrap();
    assert_eq!(indicators.indicators[0].series_id, "CPIAUCSL");

    let series = client.get_macro_indicator("cpi", 120).await.unwrap();
    assert_eq!(series.data[0].value, Some(308.417));
    assert_eq!(series.data[1].value, None);
    assert_eq!(series.latest_value().map(|(_, v)| v), Some(308.417));

    let err = client.get_macro_indicator("gdp", 120).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let refresh = client.refresh_macro_indicator("cpi", 120).await.unwrap();
    assert_eq!(refresh.saved_count, 120);

    assert_eq!(
        backend.log(),
        vec![
            "GET /news/toyota motor?limit=5",
            r#"POST /analysis/sentiment {"text":"Record profits"}"#,
            "GET /macro",
            "GET /macro/cpi?limit=120",
            "GET /macro/gdp?limit=120",
            r#"POST /macro/cpi/fetch {"limit":120}"#,
        ]
    );
}

#[tokio::test]
async fn test_error_detail_is_surfaced() {
    let (base, _backend) = spawn_backend().await;
    let client = client_for(&base);

    let err = client.health().await.unwrap_err();
    assert_eq!(
        err,
        AppError::Api {
            status: 503,
            detail: "database unreachable".to_string()
        }
    );
    assert!(!err.is_transport());
}

#[tokio::test]
async fn test_timeout_is_classified() {
    let (base, _backend) = spawn_backend().await;
    let config = ClientConfig::new(&base)
        .unwrap()
        .with_timeout(Duration::from_millis(200));
    let client = HttpResourceClient::new(&config).unwrap();

    let err = client.get_technical_indicators("SLOW", 90).await.unwrap_err();
    assert!(matches!(err, AppError::Timeout(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(&format!("http://{}/api/v1", addr));
    let err = client.list_stocks().await.unwrap_err();
    assert!(matches!(err, AppError::Network(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_cache_and_mutations_over_http() {
    let (base, backend) = spawn_backend().await;
    let config = ClientConfig::new(&base).unwrap();
    let client: Arc<dyn ResourceClient> = Arc::new(HttpResourceClient::new(&config).unwrap());
    let cache = QueryCache::new(client.clone(), &config);
    let mutations = MutationCoordinator::new(client, cache.clone());

    let mut indicators = cache.subscribe(QueryKey::technical("7203.T", None)).await;
    let state = indicators.settled().await;
    assert!(matches!(state.data, Some(QueryData::Technical(ref r)) if r.len() == 2));

    mutations.force_refresh("7203.T").await.unwrap();
    assert!(indicators.settled().await.is_ready());

    assert_eq!(
        backend.log(),
        vec![
            "GET /analysis/7203.T/technical?days=90",
            r#"POST /stocks/7203.T/fetch {"period":"1y"}"#,
            "GET /analysis/7203.T/technical?days=90",
        ]
    );
}
