//! Integration tests for the IT helpdesk.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p helpdesk-integration-tests
//! ```
//!
//! Each test spawns the full router on an ephemeral port, backed by the
//! in-memory stores, an in-memory session store and [`FakeIdentityProvider`].
//! No database or identity provider is needed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, header::LOCATION, redirect::Policy};
use url::Url;

use helpdesk_core::{Email, Role};
use helpdesk_web::app::build_router;
use helpdesk_web::db::{MemoryStore, ProfileStore};
use helpdesk_web::identity::{IdentityAssertion, IdentityError, IdentityProvider};
use helpdesk_web::middleware::session_layer;
use helpdesk_web::state::{AppState, StateParts};

/// Authorization endpoint of the fake provider.
pub const FAKE_AUTHORIZE_URL: &str = "https://login.test/authorize";

/// Identity provider that hands out pre-registered assertions.
///
/// Tests register an assertion under a code, then play the provider's part
/// by calling the callback with that code.
#[derive(Default)]
pub struct FakeIdentityProvider {
    assertions: Mutex<HashMap<String, IdentityAssertion>>,
    next_code: AtomicUsize,
}

impl FakeIdentityProvider {
    /// Register an assertion and return the code that redeems it.
    pub fn issue_code(&self, assertion: IdentityAssertion) -> String {
        let code = format!("code-{}", self.next_code.fetch_add(1, Ordering::SeqCst));
        self.assertions
            .lock()
            .expect("assertions lock poisoned")
            .insert(code.clone(), assertion);
        code
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    fn authorization_url(&self, redirect_uri: &str, state: &str, nonce: &str) -> String {
        let mut url = Url::parse(FAKE_AUTHORIZE_URL).expect("valid fake authorize URL");
        url.query_pairs_mut()
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("state", state)
            .append_pair("nonce", nonce);
        url.into()
    }

    async fn exchange_code(
        &self,
        code: &str,
        _redirect_uri: &str,
        _nonce: &str,
    ) -> Result<IdentityAssertion, IdentityError> {
        self.assertions
            .lock()
            .expect("assertions lock poisoned")
            .remove(code)
            .ok_or_else(|| IdentityError::TokenExchange(format!("unknown code {code}")))
    }
}

/// A running helpdesk.
pub struct TestApp {
    pub address: String,
    pub store: Arc<MemoryStore>,
    pub identity: Arc<FakeIdentityProvider>,
}

impl TestApp {
    /// Start the helpdesk on an ephemeral port.
    pub async fn spawn() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let address = format!(
            "http://{}",
            listener.local_addr().expect("listener has an address")
        );

        let store = Arc::new(MemoryStore::new());
        let identity = Arc::new(FakeIdentityProvider::default());

        let state = AppState::from_parts(StateParts {
            base_url: address.clone(),
            profiles: store.clone(),
            tickets: store.clone(),
            identity: identity.clone(),
            page_cache_ttl: Duration::from_secs(60),
            pool: None,
        });
        let sessions = session_layer(tower_sessions::MemoryStore::default(), false);
        let app = build_router(state, sessions);

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test server failed");
        });

        Self {
            address,
            store,
            identity,
        }
    }

    /// Absolute URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.address)
    }

    /// A browser: keeps cookies, does not follow redirects.
    pub fn browser() -> Client {
        Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .expect("Failed to create HTTP client")
    }

    /// GET `path`.
    pub async fn get(&self, client: &Client, path: &str) -> Response {
        client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    /// POST a form to `path`.
    pub async fn post_form(&self, client: &Client, path: &str, form: &[(&str, &str)]) -> Response {
        client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST request failed")
    }

    /// Start sign-in, returning the `state` the provider would echo back.
    pub async fn start_sign_in(&self, client: &Client, callback_url: Option<&str>) -> String {
        let path = callback_url.map_or_else(
            || "/api/auth/signin/azure-ad".to_string(),
            |c| format!("/api/auth/signin/azure-ad?callbackUrl={}", encode(c)),
        );
        let response = self.get(client, &path).await;
        let to = location(&response);
        assert!(to.starts_with(FAKE_AUTHORIZE_URL), "unexpected redirect {to}");

        Url::parse(&to)
            .expect("provider URL parses")
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .expect("provider URL carries state")
    }

    /// Run the whole sign-in flow for `assertion`, returning the callback
    /// response.
    pub async fn sign_in_with(
        &self,
        client: &Client,
        assertion: IdentityAssertion,
        callback_url: Option<&str>,
    ) -> Response {
        let state = self.start_sign_in(client, callback_url).await;
        let code = self.identity.issue_code(assertion);
        self.get(
            client,
            &format!("/api/auth/callback/azure-ad?code={code}&state={state}"),
        )
        .await
    }

    /// Sign `client` in as `email` and return it.
    pub async fn sign_in(&self, email: &str) -> Client {
        let client = Self::browser();
        let response = self
            .sign_in_with(
                &client,
                IdentityAssertion {
                    email: Some(email.to_string()),
                    name: Some(format!("Test {email}")),
                },
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
        client
    }

    /// Sign in as `email` and promote the profile to admin.
    pub async fn sign_in_admin(&self, email: &str) -> Client {
        let client = self.sign_in(email).await;
        self.set_role(email, Role::Admin).await;
        client
    }

    /// Change a profile's role out of band.
    pub async fn set_role(&self, email: &str, role: Role) {
        let email = Email::parse(email).expect("valid email");
        self.store
            .set_role(&email, role)
            .await
            .expect("set_role succeeds")
            .expect("profile exists");
    }

    /// File a ticket as `client` and return its id.
    pub async fn create_ticket(&self, client: &Client, title: &str, priority: &str) -> String {
        let response = self
            .post_form(
                client,
                "/actions/tickets",
                &[
                    ("title", title),
                    ("description", "Details of the problem"),
                    ("priority", priority),
                ],
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        location(&response)
            .strip_prefix("/tickets/")
            .expect("redirects to the new ticket")
            .to_string()
    }
}

/// The `Location` header of a redirect.
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("response has a Location header")
        .to_string()
}

/// Percent-encode a query value.
pub fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
