//! End-to-end harness for the Atelier storefront.
//!
//! [`TestApp::spawn`] starts the real storefront router on an ephemeral
//! port with an in-memory session store, pointed at a [`FakeApi`] that
//! serves canned commerce data and records every call it receives. No
//! database or external service is needed.
//!
//! ```rust,ignore
//! let app = TestApp::spawn().await;
//! app.login(SHOPPER_EMAIL).await;
//! let page = app.get("/cart").await;
//! assert!(app.api.calls().iter().any(|c| c == "GET /cart"));
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use atelier_storefront::config::{ApiConfig, SentryConfig, StorefrontConfig};
use atelier_storefront::state::AppState;
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{Next, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_sessions::MemoryStore;

pub const SHOPPER_EMAIL: &str = "mona@example.com";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const PASSWORD: &str = "Secret123!";
pub const SHOPPER_TOKEN: &str = "token-shopper";
pub const ADMIN_TOKEN: &str = "token-admin";

/// Mutable state behind the fake API.
#[derive(Debug, Default)]
pub struct FakeState {
    calls: Vec<String>,
    /// Answer `DELETE /wishlist/{id}` with a 400.
    pub fail_wishlist_remove: bool,
    /// Answer `PUT /admin/orders/{id}/status` with a 400.
    pub fail_status_update: bool,
    pub wishlist: Vec<Value>,
    /// Served by `GET /products` whatever the query.
    pub products: Vec<Value>,
    pub cart: Option<Value>,
    pub orders: Vec<Value>,
}

/// A stand-in for the commerce REST API.
#[derive(Clone)]
pub struct FakeApi {
    state: Arc<Mutex<FakeState>>,
    pub base_url: String,
}

impl FakeApi {
    /// Start the fake API on an ephemeral port.
    pub async fn spawn() -> Self {
        let state = Arc::new(Mutex::new(FakeState::default()));
        let routes = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/signup", post(signup))
            .route("/products", get(list_products))
            .route("/cart", get(get_cart).post(add_to_cart))
            .route("/wishlist", get(get_wishlist))
            .route("/wishlist/{id}", delete(remove_from_wishlist))
            .route("/addresses", get(list_addresses))
            .route("/admin/orders", get(admin_orders))
            .route("/admin/orders/{id}", get(admin_order))
            .route("/admin/orders/{id}/status", put(admin_order_status));
        let router = Router::new()
            .nest("/api/v1", routes)
            .fallback(not_found)
            .layer(from_fn_with_state(state.clone(), record))
            .with_state(state.clone());

        let addr = serve(router).await;
        Self {
            state,
            base_url: format!("http://{addr}/api/v1"),
        }
    }

    /// Lock the state to seed data or flip failure switches.
    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Every call so far as `"METHOD /path"`, relative to the API root.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Whether any call so far starts with `prefix`.
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.calls().iter().any(|c| c.starts_with(prefix))
    }

    /// Forget recorded calls.
    pub fn reset_calls(&self) {
        self.state().calls.clear();
    }
}

type Shared = Arc<Mutex<FakeState>>;

async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    addr
}

async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let path = request
        .uri()
        .path()
        .strip_prefix("/api/v1")
        .unwrap_or_else(|| request.uri().path())
        .to_owned();
    state
        .lock()
        .unwrap()
        .calls
        .push(format!("{} {path}", request.method()));
    next.run(request).await
}

fn fail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "status": "fail", "message": message }))).into_response()
}

fn user(id: &str, name: &str, email: &str, role: &str) -> Value {
    json!({ "_id": id, "name": name, "email": email, "phone": "01012345678", "role": role })
}

/// A product record as the API returns it.
#[must_use]
pub fn product(id: &str, title: &str, price: u32) -> Value {
    json!({
        "_id": id,
        "title": title,
        "slug": title.to_lowercase().replace(' ', "-"),
        "description": format!("{title} description"),
        "quantity": 10,
        "sold": 0,
        "price": price,
        "imageCover": format!("https://img.example.com/{id}.jpg"),
        "images": [],
        "ratingsAverage": 4.0,
        "ratingsQuantity": 2
    })
}

/// A cart holding `lines` of `(product, unit price, quantity)`.
#[must_use]
pub fn cart(lines: &[(&str, &str, u32, u32)]) -> Value {
    let items: Vec<Value> = lines
        .iter()
        .enumerate()
        .map(|(n, (id, title, price, quantity))| {
            json!({
                "_id": format!("line-{n}"),
                "product": product(id, title, *price),
                "quantity": quantity,
                "price": price
            })
        })
        .collect();
    let total: u32 = lines.iter().map(|(_, _, price, qty)| price * qty).sum();
    json!({ "_id": "cart-1", "cartItems": items, "totalCartPrice": total })
}

/// An order placed by the shopper.
#[must_use]
pub fn order(id: &str, status: &str) -> Value {
    json!({
        "_id": id,
        "user": user("u-1", "Mona Adel", SHOPPER_EMAIL, "user"),
        "cartItems": [{
            "_id": "line-0",
            "product": product("p-1", "Linen Shirt", 100),
            "quantity": 2,
            "price": 100
        }],
        "shippingAddress": {
            "details": "12 Nile St",
            "phone": "01012345678",
            "city": "Cairo",
            "postalCode": "11511"
        },
        "status": status,
        "isPaid": false,
        "isDelivered": false,
        "paymentMethodType": "cash",
        "totalOrderPrice": 250,
        "shippingPrice": 50,
        "createdAt": "2026-03-01T10:00:00Z"
    })
}

async fn login(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    if password != PASSWORD {
        return fail(StatusCode::UNAUTHORIZED, "Incorrect email or password");
    }
    match email {
        SHOPPER_EMAIL => Json(json!({
            "data": user("u-1", "Mona Adel", SHOPPER_EMAIL, "user"),
            "token": SHOPPER_TOKEN
        }))
        .into_response(),
        ADMIN_EMAIL => Json(json!({
            "data": user("a-1", "Ada Admin", ADMIN_EMAIL, "admin"),
            "token": ADMIN_TOKEN
        }))
        .into_response(),
        _ => fail(StatusCode::UNAUTHORIZED, "Incorrect email or password"),
    }
}

async fn signup(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default().to_owned();
    let name = body["name"].as_str().unwrap_or_default().to_owned();
    (
        StatusCode::CREATED,
        Json(json!({ "data": user("u-2", &name, &email, "user"), "token": "token-new" })),
    )
        .into_response()
}

async fn get_cart(State(state): State<Shared>) -> Response {
    let cart = state.lock().unwrap().cart.clone();
    cart.map_or_else(
        || fail(StatusCode::NOT_FOUND, "There is no cart for this user"),
        |cart| Json(json!({ "data": cart, "numOfCartItems": 1 })).into_response(),
    )
}

async fn add_to_cart(State(state): State<Shared>) -> Response {
    let cart = cart(&[("p-1", "Linen Shirt", 100, 1)]);
    state.lock().unwrap().cart = Some(cart.clone());
    Json(json!({ "data": cart })).into_response()
}

async fn list_products(State(state): State<Shared>) -> Response {
    let products = state.lock().unwrap().products.clone();
    Json(json!({ "results": products.len(), "data": products })).into_response()
}

async fn get_wishlist(State(state): State<Shared>) -> Response {
    let wishlist = state.lock().unwrap().wishlist.clone();
    Json(json!({ "results": wishlist.len(), "data": wishlist })).into_response()
}

async fn remove_from_wishlist(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut state = state.lock().unwrap();
    if state.fail_wishlist_remove {
        return fail(StatusCode::BAD_REQUEST, "Wishlist is temporarily locked");
    }
    state.wishlist.retain(|p| p["_id"] != id.as_str());
    let ids: Vec<Value> = state.wishlist.iter().map(|p| p["_id"].clone()).collect();
    Json(json!({ "data": ids })).into_response()
}

async fn list_addresses() -> Response {
    Json(json!({ "results": 0, "data": [] })).into_response()
}

async fn admin_orders(State(state): State<Shared>) -> Response {
    let orders = state.lock().unwrap().orders.clone();
    Json(json!({ "results": orders.len(), "data": orders })).into_response()
}

fn find_order(state: &FakeState, id: &str) -> Option<Value> {
    state.orders.iter().find(|o| o["_id"] == id).cloned()
}

async fn admin_order(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    find_order(&state.lock().unwrap(), &id).map_or_else(
        || fail(StatusCode::NOT_FOUND, "No order for this id"),
        |order| Json(json!({ "data": order })).into_response(),
    )
}

async fn admin_order_status(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    if state.fail_status_update {
        return fail(StatusCode::BAD_REQUEST, "This order can no longer change status");
    }
    let Some(order) = state.orders.iter_mut().find(|o| o["_id"] == id.as_str()) else {
        return fail(StatusCode::NOT_FOUND, "No order for this id");
    };
    order["status"] = body["status"].clone();
    Json(json!({ "data": order.clone() })).into_response()
}

async fn not_found() -> Response {
    fail(StatusCode::NOT_FOUND, "Route not found")
}

/// A running storefront and its fake API.
pub struct TestApp {
    pub base_url: String,
    /// Cookie-keeping client that does not follow redirects.
    pub client: reqwest::Client,
    pub api: FakeApi,
}

impl TestApp {
    /// Start a fake API and a storefront wired to it.
    pub async fn spawn() -> Self {
        let api = FakeApi::spawn().await;
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{addr}");

        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/atelier_test"),
            host: Ipv4Addr::LOCALHOST.into(),
            port: addr.port(),
            base_url: base_url.clone(),
            session_secret: SecretString::from("integration-test-secret-".repeat(4)),
            api: ApiConfig {
                base_url: api.base_url.clone(),
                timeout: Some(Duration::from_secs(5)),
            },
            sentry: SentryConfig::default(),
        };
        // Only the readiness probe touches the pool; tests never call it.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/atelier_test")
            .unwrap();
        let state = AppState::new(config, pool).unwrap();
        let static_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../storefront/static");
        let app = atelier_storefront::app(state, MemoryStore::default(), static_dir);

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            base_url,
            client,
            api,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .unwrap()
    }

    /// Sign in and assert the storefront accepted the credentials.
    pub async fn login(&self, email: &str) -> reqwest::Response {
        let response = self
            .post_form("/login", &[("email", email), ("password", PASSWORD)])
            .await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::SEE_OTHER,
            "login for {email} was not accepted"
        );
        response
    }

    /// GET `path` and return the body text.
    pub async fn page(&self, path: &str) -> String {
        let response = self.get(path).await;
        assert_eq!(response.status(), reqwest::StatusCode::OK, "GET {path}");
        response.text().await.unwrap()
    }
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}
