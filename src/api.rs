// src/api.rs
use crate::auth::{SessionUser, Sessions, UserDirectory};
use crate::chart::{self, Timeframe, PAIRS};
use crate::db::PortfolioStore;
use crate::error::{handle_rejection, ApiError};
use crate::filter::{
    filter_admin_transactions, filter_transactions, filter_users, is_known_status,
};
use crate::fixtures;
use crate::models::PortfolioUpsert;
use crate::simulator::QuoteFeed;
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use warp::ws::{Message, WebSocket};
use warp::{Filter, Rejection, Reply};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PortfolioStore>,
    pub users: Arc<UserDirectory>,
    pub sessions: Sessions,
    pub feed: QuoteFeed,
}

#[derive(Deserialize)]
struct SignInRequest {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct ChartQuery {
    pair: Option<String>,
    timeframe: Option<String>,
}

#[derive(Deserialize)]
struct StreamQuery {
    token: Option<String>,
}

#[derive(Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

#[derive(Deserialize)]
struct UserQuery {
    q: Option<String>,
    status: Option<String>,
}

/// Every route, with rejections turned into JSON error replies.
pub fn api(state: AppState) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    routes(state)
        .recover(handle_rejection)
        .with(warp::log("m4capital::api"))
}

pub fn routes(state: AppState) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let sessions = state.sessions.clone();

    let health = warp::path!("health")
        .and(warp::get())
        .map(|| warp::reply::json(&json!({"status": "ok"})));

    let signin = warp::path!("api" / "auth" / "signin")
        .and(warp::post())
        .and(with_users(state.users.clone()))
        .and(with_sessions(sessions.clone()))
        .and(warp::body::json())
        .and_then(signin_handler);

    // The session is checked before the body is read, so a missing session is
    // always a 401 whatever was posted.
    let get_portfolio = warp::path!("api" / "portfolio")
        .and(warp::get())
        .and(with_auth(sessions.clone()))
        .and(with_store(state.store.clone()))
        .and_then(get_portfolio_handler);

    let upsert_portfolio = warp::path!("api" / "portfolio")
        .and(warp::post())
        .and(with_auth(sessions.clone()))
        .and(with_store(state.store.clone()))
        .and(warp::body::json())
        .and_then(upsert_portfolio_handler);

    let quotes = warp::path!("api" / "market" / "quotes")
        .and(warp::get())
        .and(with_auth(sessions.clone()))
        .and(with_feed(state.feed.clone()))
        .and_then(quotes_handler);

    let refresh = warp::path!("api" / "market" / "refresh")
        .and(warp::post())
        .and(with_auth(sessions.clone()))
        .and(with_feed(state.feed.clone()))
        .and_then(refresh_handler);

    // Browsers cannot set headers on a websocket upgrade, so the stream also
    // takes the token from `?token=`.
    let stream = warp::path!("api" / "market" / "stream")
        .and(with_stream_auth(sessions.clone()))
        .and(warp::ws())
        .and(with_feed(state.feed.clone()))
        .map(|user: SessionUser, ws: warp::ws::Ws, feed: QuoteFeed| {
            info!("Quote stream opened for {}", user.email);
            ws.on_upgrade(move |socket| stream_quotes(socket, feed))
        });

    let chart = warp::path!("api" / "market" / "chart")
        .and(warp::get())
        .and(with_auth(sessions.clone()))
        .and(warp::query::<ChartQuery>())
        .and_then(chart_handler);

    let dashboard = warp::path!("api" / "dashboard")
        .and(warp::get())
        .and(with_auth(sessions.clone()))
        .and(warp::query::<SearchQuery>())
        .and_then(dashboard_handler);

    let admin_users = warp::path!("api" / "admin" / "users")
        .and(warp::get())
        .and(with_admin(sessions.clone()))
        .and(warp::query::<UserQuery>())
        .and_then(admin_users_handler);

    let admin_transactions = warp::path!("api" / "admin" / "transactions")
        .and(warp::get())
        .and(with_admin(sessions.clone()))
        .and(warp::query::<SearchQuery>())
        .and_then(admin_transactions_handler);

    let admin_overview = warp::path!("api" / "admin" / "overview")
        .and(warp::get())
        .and(with_admin(sessions))
        .and_then(admin_overview_handler);

    health
        .or(signin)
        .or(get_portfolio)
        .or(upsert_portfolio)
        .or(quotes)
        .or(refresh)
        .or(stream)
        .or(chart)
        .or(dashboard)
        .or(admin_users)
        .or(admin_transactions)
        .or(admin_overview)
}

fn with_store(
    store: Arc<dyn PortfolioStore>,
) -> impl Filter<Extract = (Arc<dyn PortfolioStore>,), Error = Infallible> + Clone {
    warp::any().map(move || store.clone())
}

fn with_users(
    users: Arc<UserDirectory>,
) -> impl Filter<Extract = (Arc<UserDirectory>,), Error = Infallible> + Clone {
    warp::any().map(move || users.clone())
}

fn with_sessions(
    sessions: Sessions,
) -> impl Filter<Extract = (Sessions,), Error = Infallible> + Clone {
    warp::any().map(move || sessions.clone())
}

fn with_feed(feed: QuoteFeed) -> impl Filter<Extract = (QuoteFeed,), Error = Infallible> + Clone {
    warp::any().map(move || feed.clone())
}

fn bearer_token(header: Option<&str>) -> Option<&str> {
    header
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
}

fn resolve_session(sessions: &Sessions, token: Option<&str>) -> Result<SessionUser, Rejection> {
    token
        .filter(|token| !token.is_empty())
        .and_then(|token| sessions.verify(token))
        .ok_or_else(|| warp::reject::custom(ApiError::Unauthorized))
}

/// Resolves the bearer token into a session or rejects with 401.
fn with_auth(
    sessions: Sessions,
) -> impl Filter<Extract = (SessionUser,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let sessions = sessions.clone();
        async move { resolve_session(&sessions, bearer_token(header.as_deref())) }
    })
}

/// Like `with_auth`, falling back to a `token` query parameter.
fn with_stream_auth(
    sessions: Sessions,
) -> impl Filter<Extract = (SessionUser,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and(warp::query::<StreamQuery>())
        .and_then(move |header: Option<String>, query: StreamQuery| {
            let sessions = sessions.clone();
            async move {
                let token = bearer_token(header.as_deref()).or(query.token.as_deref());
                resolve_session(&sessions, token)
            }
        })
}

fn with_admin(
    sessions: Sessions,
) -> impl Filter<Extract = (SessionUser,), Error = Rejection> + Clone {
    with_auth(sessions).and_then(|user: SessionUser| async move {
        if user.is_admin() {
            Ok(user)
        } else {
            warn!("Non-admin {} tried an admin route", user.email);
            Err(warp::reject::custom(ApiError::Forbidden))
        }
    })
}

async fn signin_handler(
    users: Arc<UserDirectory>,
    sessions: Sessions,
    request: SignInRequest,
) -> Result<impl Reply, Rejection> {
    match users.authorize(&request.email, &request.password) {
        Some(user) => {
            let token = sessions.issue(&user).map_err(ApiError::internal)?;
            info!("Signed in {}", user.email);
            Ok(warp::reply::json(&json!({ "token": token, "user": user })))
        }
        None => {
            info!("Failed sign-in for {}", request.email);
            Err(warp::reject::custom(ApiError::InvalidCredentials))
        }
    }
}

async fn get_portfolio_handler(
    user: SessionUser,
    store: Arc<dyn PortfolioStore>,
) -> Result<impl Reply, Rejection> {
    match store.find_by_user(&user.id).await {
        Ok(rows) => {
            info!("Portfolio retrieved for {}.", user.email);
            Ok(warp::reply::json(&rows))
        }
        Err(e) => {
            error!("Portfolio fetch error: {}", e);
            Err(ApiError::internal(e))
        }
    }
}

async fn upsert_portfolio_handler(
    user: SessionUser,
    store: Arc<dyn PortfolioStore>,
    holding: PortfolioUpsert,
) -> Result<impl Reply, Rejection> {
    match store.upsert(&user.id, holding).await {
        Ok(row) => {
            info!("Portfolio row {} saved for {}.", row.symbol, user.email);
            Ok(warp::reply::json(&row))
        }
        Err(e) => {
            error!("Portfolio update error: {}", e);
            Err(ApiError::internal(e))
        }
    }
}

async fn quotes_handler(_user: SessionUser, feed: QuoteFeed) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&feed.snapshot().await))
}

async fn refresh_handler(_user: SessionUser, feed: QuoteFeed) -> Result<impl Reply, Rejection> {
    let quotes = feed.refresh().await;
    debug!("Manual refresh of {} quotes", quotes.len());
    Ok(warp::reply::json(&quotes))
}

async fn stream_quotes(socket: WebSocket, feed: QuoteFeed) {
    let (mut outgoing, mut incoming) = socket.split();
    let mut updates = feed.subscribe();

    let first = json!(feed.snapshot().await).to_string();
    if outgoing.send(Message::text(first)).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(quotes) => {
                    let text = json!(quotes).to_string();
                    if outgoing.send(Message::text(text)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Quote stream lagged, skipped {} updates", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            message = incoming.next() => match message {
                Some(Ok(message)) if message.is_close() => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("Quote stream error: {}", e);
                    break;
                }
                None => break,
            },
        }
    }
    debug!("Quote stream closed");
}

async fn chart_handler(_user: SessionUser, query: ChartQuery) -> Result<impl Reply, Rejection> {
    let timeframe = match query.timeframe.as_deref() {
        Some(raw) => raw
            .parse::<Timeframe>()
            .map_err(|e| warp::reject::custom(ApiError::BadRequest(e)))?,
        None => Timeframe::default(),
    };
    let pair = match query.pair.as_deref() {
        Some(raw) => PAIRS
            .iter()
            .find(|p| p.eq_ignore_ascii_case(raw))
            .copied()
            .ok_or_else(|| {
                warp::reject::custom(ApiError::BadRequest(format!("Unknown pair: {}", raw)))
            })?,
        None => PAIRS[0],
    };

    let points = chart::generate(timeframe.days(), Utc::now(), &mut rand::rng());
    let summary = chart::summarize(&points);
    Ok(warp::reply::json(&json!({
        "pair": pair,
        "timeframe": timeframe.to_string(),
        "points": points,
        "summary": summary,
    })))
}

async fn dashboard_handler(user: SessionUser, query: SearchQuery) -> Result<impl Reply, Rejection> {
    let assets = fixtures::portfolio_assets();
    let total_value: f64 = assets.iter().map(|a| a.value).sum();
    let transactions = fixtures::recent_transactions(Utc::now());
    let matching = filter_transactions(&transactions, query.q.as_deref().unwrap_or(""));

    Ok(warp::reply::json(&json!({
        "user": user,
        "stats": fixtures::dashboard_stats(),
        "portfolio": {
            "assets": assets,
            "totalValue": total_value,
        },
        "transactions": matching,
    })))
}

async fn admin_users_handler(_admin: SessionUser, query: UserQuery) -> Result<impl Reply, Rejection> {
    if let Some(status) = query.status.as_deref() {
        if !is_known_status(status) {
            return Err(warp::reject::custom(ApiError::BadRequest(format!(
                "Unknown status: {}",
                status
            ))));
        }
    }
    let users = fixtures::admin_users();
    let matching = filter_users(&users, query.q.as_deref().unwrap_or(""), query.status.as_deref());
    Ok(warp::reply::json(&matching))
}

async fn admin_transactions_handler(
    _admin: SessionUser,
    query: SearchQuery,
) -> Result<impl Reply, Rejection> {
    let transactions = fixtures::admin_transactions();
    let matching = filter_admin_transactions(&transactions, query.q.as_deref().unwrap_or(""));
    Ok(warp::reply::json(&matching))
}

async fn admin_overview_handler(_admin: SessionUser) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&json!({
        "stats": fixtures::admin_stats(),
        "health": fixtures::system_health(),
        "checkedAt": Utc::now(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryStore;
    use crate::fixtures::{ADMIN_EMAIL, ADMIN_PASSWORD, DEMO_EMAIL, DEMO_PASSWORD};
    use crate::models::MarketQuote;
    use serde_json::Value;
    use std::time::Duration;
    use warp::http::StatusCode;

    fn test_state() -> AppState {
        AppState {
            store: Arc::new(InMemoryStore::new()),
            users: Arc::new(UserDirectory::with_demo_accounts().unwrap()),
            sessions: Sessions::new("test-secret", Duration::from_secs(3600)),
            feed: QuoteFeed::new(fixtures::initial_quotes()),
        }
    }

    fn token_for(state: &AppState, email: &str) -> String {
        let user = state.users.find_by_email(email).unwrap();
        state.sessions.issue(user).unwrap()
    }

    fn body(response: &warp::http::Response<warp::hyper::body::Bytes>) -> Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    fn euro(value: f64) -> Value {
        json!({
            "symbol": "EUR/USD",
            "name": "Euro/US Dollar",
            "balance": 10000,
            "value": value,
            "change24h": 1.0,
        })
    }

    #[tokio::test]
    async fn signin_returns_usable_token() {
        let state = test_state();
        let filter = api(state);

        let response = warp::test::request()
            .method("POST")
            .path("/api/auth/signin")
            .json(&json!({"email": DEMO_EMAIL, "password": DEMO_PASSWORD}))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let signed_in = body(&response);
        assert_eq!(signed_in["user"]["email"], DEMO_EMAIL);
        assert_eq!(signed_in["user"]["role"], "USER");

        let token = signed_in["token"].as_str().unwrap();
        let response = warp::test::request()
            .path("/api/portfolio")
            .header("authorization", format!("Bearer {}", token))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn signin_with_bad_password_is_401() {
        let filter = api(test_state());
        let response = warp::test::request()
            .method("POST")
            .path("/api/auth/signin")
            .json(&json!({"email": DEMO_EMAIL, "password": "wrong"}))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn portfolio_without_session_is_401_whatever_the_payload() {
        let filter = api(test_state());

        let response = warp::test::request()
            .path("/api/portfolio")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body(&response), json!({"error": "Unauthorized"}));

        for payload in [euro(10100.0), json!({}), json!("garbage"), json!([1, 2, 3])] {
            let response = warp::test::request()
                .method("POST")
                .path("/api/portfolio")
                .json(&payload)
                .reply(&filter)
                .await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }

        let response = warp::test::request()
            .method("POST")
            .path("/api/portfolio")
            .header("authorization", "Bearer not-a-token")
            .body("{not json")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn upsert_twice_leaves_one_row_with_latest_value() {
        let state = test_state();
        let token = token_for(&state, DEMO_EMAIL);
        let filter = api(state);

        for value in [10100.0, 10500.0] {
            let response = warp::test::request()
                .method("POST")
                .path("/api/portfolio")
                .header("authorization", format!("Bearer {}", token))
                .json(&euro(value))
                .reply(&filter)
                .await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body(&response)["value"], value);
        }

        let response = warp::test::request()
            .path("/api/portfolio")
            .header("authorization", format!("Bearer {}", token))
            .reply(&filter)
            .await;
        let rows = body(&response);
        let rows = rows.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["symbol"], "EUR/USD");
        assert_eq!(rows[0]["value"], 10500.0);
    }

    #[tokio::test]
    async fn portfolio_is_scoped_to_session_user() {
        let state = test_state();
        let demo = token_for(&state, DEMO_EMAIL);
        let admin = token_for(&state, ADMIN_EMAIL);
        let filter = api(state);

        warp::test::request()
            .method("POST")
            .path("/api/portfolio")
            .header("authorization", format!("Bearer {}", demo))
            .json(&euro(1.0))
            .reply(&filter)
            .await;

        let response = warp::test::request()
            .path("/api/portfolio")
            .header("authorization", format!("Bearer {}", admin))
            .reply(&filter)
            .await;
        assert_eq!(body(&response), json!([]));
    }

    #[tokio::test]
    async fn portfolio_survives_a_restart_with_the_same_store() {
        let before = test_state();
        let token = token_for(&before, DEMO_EMAIL);
        let response = warp::test::request()
            .method("POST")
            .path("/api/portfolio")
            .header("authorization", format!("Bearer {}", token))
            .json(&euro(10500.0))
            .reply(&api(before.clone()))
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        // Same store, freshly built directory and signing-in again.
        let after = AppState {
            store: before.store.clone(),
            ..test_state()
        };
        let token = token_for(&after, DEMO_EMAIL);
        let response = warp::test::request()
            .path("/api/portfolio")
            .header("authorization", format!("Bearer {}", token))
            .reply(&api(after))
            .await;
        let rows = body(&response);
        assert_eq!(rows.as_array().unwrap().len(), 1);
        assert_eq!(rows[0]["value"], 10500.0);
    }

    #[tokio::test]
    async fn malformed_body_with_session_is_500() {
        let state = test_state();
        let token = token_for(&state, DEMO_EMAIL);
        let filter = api(state);

        let response = warp::test::request()
            .method("POST")
            .path("/api/portfolio")
            .header("authorization", format!("Bearer {}", token))
            .json(&json!({"symbol": "EUR/USD"}))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body(&response), json!({"error": "Internal server error"}));
    }

    #[tokio::test]
    async fn refresh_moves_quotes_within_step() {
        let state = test_state();
        let token = token_for(&state, DEMO_EMAIL);
        let before = state.feed.snapshot().await;
        let filter = api(state);

        let response = warp::test::request()
            .method("POST")
            .path("/api/market/refresh")
            .header("authorization", format!("Bearer {}", token))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let after = body(&response);
        let after = after.as_array().unwrap();
        assert_eq!(after.len(), before.len());
        for (old, new) in before.iter().zip(after) {
            assert_eq!(new["symbol"], old.symbol.as_str());
            let price = new["price"].as_f64().unwrap();
            assert!((price - old.price).abs() <= crate::simulator::PRICE_STEP);
        }

        let response = warp::test::request()
            .path("/api/market/quotes")
            .header("authorization", format!("Bearer {}", token))
            .reply(&filter)
            .await;
        assert_eq!(body(&response).as_array().unwrap(), after);
    }

    fn quotes_from(message: &Message) -> Vec<MarketQuote> {
        serde_json::from_str(message.to_str().unwrap()).unwrap()
    }

    fn assert_same_quotes(actual: &[MarketQuote], expected: &[MarketQuote]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert_eq!(a.symbol, e.symbol);
            assert_eq!(a.volume, e.volume);
            assert!((a.price - e.price).abs() < 1e-12);
            assert!((a.change - e.change).abs() < 1e-12);
        }
    }

    #[tokio::test]
    async fn stream_sends_snapshot_then_each_refresh() {
        let state = test_state();
        let token = token_for(&state, DEMO_EMAIL);
        let feed = state.feed.clone();

        let mut client = warp::test::ws()
            .path("/api/market/stream")
            .header("authorization", format!("Bearer {}", token))
            .handshake(api(state))
            .await
            .unwrap();

        let first = client.recv().await.unwrap();
        assert_same_quotes(&quotes_from(&first), &feed.snapshot().await);

        let refreshed = feed.refresh().await;
        let next = client.recv().await.unwrap();
        assert_same_quotes(&quotes_from(&next), &refreshed);
    }

    #[tokio::test]
    async fn stream_accepts_token_in_query() {
        let state = test_state();
        let token = token_for(&state, DEMO_EMAIL);
        let feed = state.feed.clone();

        let mut client = warp::test::ws()
            .path(&format!("/api/market/stream?token={}", token))
            .handshake(api(state))
            .await
            .unwrap();

        let first = client.recv().await.unwrap();
        assert_same_quotes(&quotes_from(&first), &feed.snapshot().await);
    }

    #[tokio::test]
    async fn stream_without_valid_session_is_refused() {
        let state = test_state();

        let refused = warp::test::ws()
            .path("/api/market/stream")
            .handshake(api(state.clone()))
            .await;
        assert!(refused.is_err());

        let refused = warp::test::ws()
            .path("/api/market/stream?token=not-a-token")
            .handshake(api(state))
            .await;
        assert!(refused.is_err());
    }

    #[tokio::test]
    async fn chart_defaults_and_validation() {
        let state = test_state();
        let token = token_for(&state, DEMO_EMAIL);
        let filter = api(state);

        let response = warp::test::request()
            .path("/api/market/chart")
            .header("authorization", format!("Bearer {}", token))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let chart = body(&response);
        assert_eq!(chart["pair"], "EUR/USD");
        assert_eq!(chart["timeframe"], "1D");
        assert_eq!(chart["points"].as_array().unwrap().len(), 31);

        let response = warp::test::request()
            .path("/api/market/chart?pair=gbp/usd&timeframe=1W")
            .header("authorization", format!("Bearer {}", token))
            .reply(&filter)
            .await;
        let chart = body(&response);
        assert_eq!(chart["pair"], "GBP/USD");
        assert_eq!(chart["points"].as_array().unwrap().len(), 91);

        let response = warp::test::request()
            .path("/api/market/chart?timeframe=5Y")
            .header("authorization", format!("Bearer {}", token))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn dashboard_has_totals_and_filtered_transactions() {
        let state = test_state();
        let token = token_for(&state, DEMO_EMAIL);
        let filter = api(state);

        let response = warp::test::request()
            .path("/api/dashboard?q=usd/jpy")
            .header("authorization", format!("Bearer {}", token))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let dashboard = body(&response);
        assert_eq!(dashboard["portfolio"]["totalValue"], 36230.0);
        assert_eq!(dashboard["stats"].as_array().unwrap().len(), 4);
        let transactions = dashboard["transactions"].as_array().unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0]["status"], "FAILED");
    }

    #[tokio::test]
    async fn admin_routes_require_admin_role() {
        let state = test_state();
        let demo = token_for(&state, DEMO_EMAIL);
        let filter = api(state);

        let response = warp::test::request()
            .path("/api/admin/users")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = warp::test::request()
            .path("/api/admin/users")
            .header("authorization", format!("Bearer {}", demo))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn admin_search() {
        let state = test_state();
        let users = state.users.clone();
        let admin = users.authorize(ADMIN_EMAIL, ADMIN_PASSWORD).unwrap();
        let token = state.sessions.issue(&admin).unwrap();
        let filter = api(state);

        let response = warp::test::request()
            .path("/api/admin/users?q=JOHN&status=ACTIVE")
            .header("authorization", format!("Bearer {}", token))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let found = body(&response);
        assert_eq!(found.as_array().unwrap().len(), 1);
        assert_eq!(found[0]["name"], "John Doe");

        let response = warp::test::request()
            .path("/api/admin/users?status=BANNED")
            .header("authorization", format!("Bearer {}", token))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = warp::test::request()
            .path("/api/admin/transactions?q=tx00")
            .header("authorization", format!("Bearer {}", token))
            .reply(&filter)
            .await;
        assert_eq!(body(&response).as_array().unwrap().len(), 4);

        let response = warp::test::request()
            .path("/api/admin/overview")
            .header("authorization", format!("Bearer {}", token))
            .reply(&filter)
            .await;
        let overview = body(&response);
        assert_eq!(overview["health"][2]["status"], "WARNING");
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let filter = api(test_state());
        let response = warp::test::request().path("/api/nothing").reply(&filter).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = warp::test::request().path("/health").reply(&filter).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
