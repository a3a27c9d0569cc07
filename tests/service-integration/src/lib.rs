//! In-process fake of the Listing Service for integration tests.
//!
//! [`FakeService::start`] binds an ephemeral port on localhost and serves
//! the same routes as the real service from an in-memory store. Failure
//! knobs let tests force error statuses and slow responses.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use loppis_client::auth::{AccessToken, Credentials, EmailVerification, Registration, RegistrationReceipt, UserProfile};
use loppis_client::{ClientConfig, ListingService};
use loppis_common::category::Category;
use loppis_common::listing::{Condition, Listing, ListingId, ListingStatus, ListingUpdate, NewListing, UserId};
use serde_json::json;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

#[derive(Default)]
struct Store {
    listings: BTreeMap<ListingId, Listing>,
    categories: Vec<Category>,
    users: Vec<Account>,
    next_id: u64,
    list_requests: usize,
    fail_list: Option<StatusCode>,
    fail_updates: Option<StatusCode>,
    list_delay: Option<Duration>,
    garbage_categories: bool,
}

struct Account {
    profile: UserProfile,
    password: String,
    verification_token: String,
}

type Shared = Arc<Mutex<Store>>;

/// A running fake Listing Service. Stops when dropped.
pub struct FakeService {
    pub base_url: String,
    store: Shared,
    server: JoinHandle<()>,
}

impl FakeService {
    pub async fn start(listings: Vec<Listing>) -> Self {
        tracing_subscriber::fmt::try_init().ok();

        let next_id = listings.iter().map(|l| l.id.0).max().unwrap_or(0) + 1;
        let store = Arc::new(Mutex::new(Store {
            listings: listings.into_iter().map(|l| (l.id, l)).collect(),
            next_id,
            ..Store::default()
        }));

        let app = Router::new()
            .route("/listings/", get(list_listings).post(create_listing))
            .route(
                "/listings/{id}",
                get(get_listing).put(update_listing).delete(delete_listing),
            )
            .route("/categories/", get(categories))
            .route("/auth/register", post(register))
            .route("/auth/login", post(login))
            .route("/auth/me", get(me))
            .route("/auth/verify-email", post(verify_email))
            .with_state(store.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        tracing::debug!(%addr, "fake listing service started");

        Self {
            base_url: format!("http://{addr}"),
            store,
            server,
        }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(&self.base_url).with_timeout(Duration::from_secs(5))
    }

    pub fn client(&self) -> ListingService {
        ListingService::new(self.config()).expect("client")
    }

    /// Server-side copy of a listing.
    pub async fn listing(&self, id: ListingId) -> Option<Listing> {
        self.store.lock().await.listings.get(&id).cloned()
    }

    pub async fn set_categories(&self, categories: Vec<Category>) {
        self.store.lock().await.categories = categories;
    }

    /// Answer `GET /listings/` with `status` until cleared.
    pub async fn fail_list(&self, status: Option<StatusCode>) {
        self.store.lock().await.fail_list = status;
    }

    /// Answer `PUT /listings/{id}` with `status` until cleared.
    pub async fn fail_updates(&self, status: Option<StatusCode>) {
        self.store.lock().await.fail_updates = status;
    }

    pub async fn delay_list(&self, delay: Duration) {
        self.store.lock().await.list_delay = Some(delay);
    }

    /// Serve a 200 with a non-JSON body from `GET /categories/`.
    pub async fn garble_categories(&self) {
        self.store.lock().await.garbage_categories = true;
    }

    pub async fn list_requests(&self) -> usize {
        self.store.lock().await.list_requests
    }
}

impl Drop for FakeService {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// A published listing with sensible defaults.
pub fn listing(id: u64, title: &str, price_sek: u64, seller: u64) -> Listing {
    Listing {
        id: ListingId(id),
        user_id: Some(UserId(seller)),
        title: title.to_string(),
        description: format!("{title}, barely used"),
        price_sek,
        condition: Some(Condition::Good),
        category_id: None,
        category: None,
        city: Some("Stockholm".into()),
        latitude: None,
        longitude: None,
        status: ListingStatus::Published,
        slug: None,
        canonical_url: None,
        images: Vec::new(),
        published_at: Some(Utc::now()),
    }
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

async fn list_listings(State(store): State<Shared>) -> Response {
    let delay = {
        let mut s = store.lock().await;
        s.list_requests += 1;
        if let Some(status) = s.fail_list {
            return detail(status, "listing store unavailable");
        }
        s.list_delay
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let s = store.lock().await;
    Json(s.listings.values().cloned().collect::<Vec<_>>()).into_response()
}

async fn create_listing(State(store): State<Shared>, Json(new): Json<NewListing>) -> Response {
    let mut s = store.lock().await;
    let id = ListingId(s.next_id);
    s.next_id += 1;
    let listing = Listing {
        id,
        user_id: Some(new.user_id),
        title: new.title,
        description: new.description,
        price_sek: new.price_sek,
        condition: Some(new.condition),
        category_id: new.category_id,
        category: None,
        city: new.city,
        latitude: new.latitude,
        longitude: new.longitude,
        status: new.status,
        slug: None,
        canonical_url: None,
        images: Vec::new(),
        published_at: Some(Utc::now()),
    };
    s.listings.insert(id, listing.clone());
    Json(listing).into_response()
}

async fn get_listing(State(store): State<Shared>, Path(id): Path<u64>) -> Response {
    match store.lock().await.listings.get(&ListingId(id)) {
        Some(listing) => Json(listing.clone()).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Listing not found"),
    }
}

async fn update_listing(
    State(store): State<Shared>,
    Path(id): Path<u64>,
    Json(update): Json<ListingUpdate>,
) -> Response {
    let mut s = store.lock().await;
    if let Some(status) = s.fail_updates {
        return detail(status, "update rejected");
    }
    match s.listings.get_mut(&ListingId(id)) {
        Some(listing) => {
            update.apply_to(listing);
            Json(listing.clone()).into_response()
        }
        None => detail(StatusCode::NOT_FOUND, "Listing not found"),
    }
}

async fn delete_listing(State(store): State<Shared>, Path(id): Path<u64>) -> Response {
    match store.lock().await.listings.remove(&ListingId(id)) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => detail(StatusCode::NOT_FOUND, "Listing not found"),
    }
}

async fn categories(State(store): State<Shared>) -> Response {
    let s = store.lock().await;
    if s.garbage_categories {
        return (StatusCode::OK, "<html>maintenance</html>").into_response();
    }
    Json(s.categories.clone()).into_response()
}

async fn register(State(store): State<Shared>, Json(reg): Json<Registration>) -> Response {
    let mut s = store.lock().await;
    if s.users.iter().any(|a| a.profile.email == reg.email) {
        return detail(StatusCode::BAD_REQUEST, "Email already registered");
    }
    let id = UserId(s.users.len() as u64 + 1);
    let verification_token = format!("vt-{id}-{}", Utc::now().timestamp_micros());
    s.users.push(Account {
        profile: UserProfile {
            id,
            email: reg.email,
            name: Some(reg.name),
            city: Some(reg.city),
            email_verified: false,
        },
        password: reg.password,
        verification_token: verification_token.clone(),
    });
    Json(RegistrationReceipt {
        msg: "User registered. Please verify your email.".into(),
        verification_token: Some(verification_token),
    })
    .into_response()
}

async fn login(State(store): State<Shared>, Json(creds): Json<Credentials>) -> Response {
    let s = store.lock().await;
    match s
        .users
        .iter()
        .find(|a| a.profile.email == creds.email && a.password == creds.password)
    {
        Some(a) if !a.profile.email_verified => detail(StatusCode::FORBIDDEN, "Email not verified"),
        Some(a) => Json(AccessToken {
            access_token: format!("token-{}", a.profile.id),
            token_type: "bearer".into(),
        })
        .into_response(),
        None => detail(StatusCode::UNAUTHORIZED, "Invalid credentials"),
    }
}

async fn me(State(store): State<Shared>, headers: HeaderMap) -> Response {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    let s = store.lock().await;
    let account = token.and_then(|t| s.users.iter().find(|a| format!("token-{}", a.profile.id) == t));
    match account {
        Some(a) => Json(a.profile.clone()).into_response(),
        None => detail(StatusCode::UNAUTHORIZED, "Could not validate credentials"),
    }
}

async fn verify_email(State(store): State<Shared>, Json(req): Json<EmailVerification>) -> Response {
    let mut s = store.lock().await;
    match s.users.iter_mut().find(|a| a.profile.email == req.email) {
        Some(a) if a.verification_token == req.token => {
            a.profile.email_verified = true;
            Json(json!({ "msg": "Email verified" })).into_response()
        }
        Some(_) => detail(StatusCode::BAD_REQUEST, "Invalid token"),
        None => detail(StatusCode::NOT_FOUND, "User not found"),
    }
}
