//! HTTP integration tests
//!
//! The in-process tests drive the full router over the in-memory stores.
//! The `#[ignore]` tests expect a running server at `BASE_URL`.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Request, StatusCode},
    middleware,
    routing::post,
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use local_library::{
    api::{self, CurrentUser},
    config::{AppConfig, BootstrapAdmin},
    models::{Role, User},
    repository::Repository,
    services::{sessions::MemorySessionStore, Services},
    views::{JsonShellRenderer, Page},
    AppState,
};

const BASE_URL: &str = "http://localhost:3000";

struct TestApp {
    router: Router,
    repository: Repository,
    state: AppState,
}

fn test_app_with(config: AppConfig) -> TestApp {
    let repository = Repository::memory();
    let services = Services::new(repository.clone(), Arc::new(MemorySessionStore::new()));
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
        renderer: Arc::new(JsonShellRenderer),
    };
    TestApp {
        router: api::router(state.clone()),
        repository,
        state,
    }
}

fn test_app() -> TestApp {
    test_app_with(AppConfig::default())
}

impl TestApp {
    fn client(&self) -> TestClient {
        TestClient {
            router: self.router.clone(),
            cookie: None,
        }
    }

    async fn add_user(&self, username: &str, password: &str, role: Role) -> User {
        let user = User::new(
            username.to_string(),
            format!("{} Tester", username),
            format!("{}@example.com", username),
            role,
            password,
        );
        self.repository.users.create(&user).await.unwrap();
        user
    }

    /// Client logged in as a fresh user with `role`
    async fn client_as(&self, username: &str, role: Role) -> TestClient {
        self.add_user(username, "secret1", role).await;
        let mut client = self.client();
        let response = client.login(username, "secret1").await;
        assert_eq!(response.location(), "/");
        client
    }
}

/// Cookie-keeping client over the in-process router
struct TestClient {
    router: Router,
    cookie: Option<String>,
}

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl TestResponse {
    fn location(&self) -> &str {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    fn view(&self) -> String {
        let start = self.body.find("data-view=\"").expect("no view in body") + "data-view=\"".len();
        let end = self.body[start..].find('"').unwrap() + start;
        self.body[start..end].to_string()
    }

    fn context(&self) -> Value {
        let tag = "<script type=\"application/json\" id=\"view-context\">";
        let start = self.body.find(tag).expect("no view context in body") + tag.len();
        let end = self.body[start..].find("</script>").unwrap() + start;
        serde_json::from_str(&self.body[start..end]).unwrap()
    }

    fn error_messages(&self) -> Vec<String> {
        self.context()["errors"]
            .as_array()
            .map(|errors| {
                errors
                    .iter()
                    .map(|e| e["message"].as_str().unwrap_or_default().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn form_encode(pairs: &[(&str, &str)]) -> String {
    fn encode(s: &str) -> String {
        s.bytes()
            .map(|b| match b {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                    (b as char).to_string()
                }
                b' ' => "+".to_string(),
                _ => format!("%{:02X}", b),
            })
            .collect()
    }
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

impl TestClient {
    async fn send(&mut self, mut request: Request<Body>) -> TestResponse {
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }

        let response = self.router.clone().oneshot(request).await.unwrap();
        for set_cookie in response.headers().get_all(header::SET_COOKIE) {
            let value = set_cookie.to_str().unwrap();
            if value.contains("Max-Age=0") {
                self.cookie = None;
            } else {
                self.cookie = value.split(';').next().map(str::to_string);
            }
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    async fn get(&mut self, uri: &str) -> TestResponse {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    async fn post(&mut self, uri: &str, pairs: &[(&str, &str)]) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form_encode(pairs)))
            .unwrap();
        self.send(request).await
    }

    async fn login(&mut self, username: &str, password: &str) -> TestResponse {
        self.post("/users/login", &[("username", username), ("password", password)])
            .await
    }

    async fn register(&mut self, username: &str, password: &str) -> TestResponse {
        self.post(
            "/users/register",
            &[
                ("username", username),
                ("fullname", "Alice Liddell"),
                ("email", "alice@example.com"),
                ("password", password),
                ("passwordConfirm", password),
            ],
        )
        .await
    }

    /// Create through a form and return the id from the redirect
    async fn create(&mut self, uri: &str, pairs: &[(&str, &str)]) -> String {
        let response = self.post(uri, pairs).await;
        assert_eq!(response.status, StatusCode::SEE_OTHER, "create failed: {}", response.body);
        response.location().rsplit('/').next().unwrap().to_string()
    }
}

// =========================================================================
// ACCOUNTS
// =========================================================================

#[tokio::test]
async fn test_register_then_login() {
    let app = test_app();
    let mut client = app.client();

    let response = client.register("alice", "secret1").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), "/users/login");

    let page = client.get("/users/login").await;
    assert_eq!(page.view(), "user_login");
    assert_eq!(
        page.context()["messages"][0],
        "Successfully registered. You can log in now!"
    );

    let response = client.login("alice", "secret1").await;
    assert_eq!(response.location(), "/");

    let home = client.get("/catalog").await;
    assert_eq!(home.status, StatusCode::OK);
    let context = home.context();
    assert_eq!(context["is_authenticated"], true);
    assert_eq!(context["current_user"]["username"], "alice");
    assert!(context["current_user"].get("hash").is_none());
    assert!(context["current_user"].get("salt").is_none());

    let alice = app.repository.users.get_by_username("alice").await.unwrap().unwrap();
    assert_eq!(context["current_user"]["id"], alice.id.to_string());
}

#[tokio::test]
async fn test_wrong_password_establishes_no_session() {
    let app = test_app();
    let mut client = app.client();
    client.register("alice", "secret1").await;
    client.get("/users/login").await;

    let response = client.login("alice", "secret2").await;
    assert_eq!(response.location(), "/users/login");

    let page = client.get("/users/login").await;
    assert_eq!(page.context()["messages"][0], "Wrong password");
    assert_eq!(page.context()["is_authenticated"], false);

    let response = client.get("/catalog").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), "/users/login");
}

#[tokio::test]
async fn test_unknown_username_flash() {
    let app = test_app();
    let mut client = app.client();

    client.login("nobody", "secret1").await;
    let page = client.get("/users/login").await;
    assert_eq!(page.context()["messages"][0], "Wrong username");
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = test_app();
    let mut client = app.client();
    client.register("alice", "secret1").await;

    let response = client.register("alice", "other12").await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.view(), "user_form");
    assert!(response.error_messages().contains(&"User already exist".to_string()));

    let stored = app.repository.users.get_by_username("alice").await.unwrap().unwrap();
    assert!(stored.validate_password("secret1"));
}

#[tokio::test]
async fn test_registration_rules() {
    let app = test_app();
    let mut client = app.client();

    let response = client
        .post(
            "/users/register",
            &[
                ("username", "al"),
                ("fullname", "Alice Liddell"),
                ("email", "not-an-email"),
                ("password", "secret1"),
                ("passwordConfirm", "secret2"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let messages = response.error_messages();
    assert!(messages.contains(&"Username must be at least 3 characters long.".to_string()));
    assert!(messages.contains(&"Please enter a valid email address.".to_string()));
    assert!(messages.contains(&"Confirm password wrong".to_string()));
    assert!(response.context()["user"].get("password").is_none());
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = test_app();
    let mut client = app.client_as("alice", Role::Reader).await;

    let response = client.get("/users/logout").await;
    assert_eq!(response.location(), "/");
    assert!(client.cookie.is_none());

    let response = client.get("/catalog").await;
    assert_eq!(response.location(), "/users/login");
}

#[tokio::test]
async fn test_logged_in_user_skips_login_page() {
    let app = test_app();
    let mut client = app.client_as("alice", Role::Reader).await;

    let response = client.get("/users/login").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), "/");
}

#[tokio::test]
async fn test_profile_update_flow() {
    let app = test_app();
    let mut client = app.client_as("alice", Role::Reader).await;
    let alice = app.repository.users.get_by_username("alice").await.unwrap().unwrap();
    let profile = format!("/users/{}", alice.id);

    let response = client
        .post(
            &format!("{}/update", profile),
            &[
                ("username", "alice"),
                ("fullname", "Alice Pleasance"),
                ("email", "alice@example.com"),
                ("password", "newpass"),
                ("passwordConfirm", "newpass"),
                ("role", "2"),
            ],
        )
        .await;
    assert_eq!(response.location(), profile);

    let page = client.get(&profile).await;
    assert_eq!(page.view(), "user_profile");
    assert_eq!(page.context()["messages"][0], "Update user succesfully");
    assert_eq!(page.context()["user"]["fullname"], "Alice Pleasance");

    let updated = app.repository.users.get_by_id(alice.id).await.unwrap();
    assert_ne!(updated.salt, alice.salt);
    assert!(updated.validate_password("newpass"));
    // Owners cannot promote themselves
    assert_eq!(updated.role, Role::Reader as i16);
}

#[tokio::test]
async fn test_profile_of_other_user_is_forbidden() {
    let app = test_app();
    let bob = app.add_user("bob", "secret1", Role::Reader).await;
    let mut client = app.client_as("alice", Role::Reader).await;

    let response = client.get(&format!("/users/{}", bob.id)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.view(), "error");
}

#[tokio::test]
async fn test_profile_requires_login() {
    let app = test_app();
    let bob = app.add_user("bob", "secret1", Role::Reader).await;
    let mut client = app.client();

    let response = client.get(&format!("/users/{}", bob.id)).await;
    assert_eq!(response.location(), "/users/login");
}

// =========================================================================
// ACCESS GATE
// =========================================================================

#[tokio::test]
async fn test_gate_redirects_anonymous_with_flash() {
    let app = test_app();
    let mut client = app.client();

    let response = client.get("/catalog/books").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), "/users/login");

    let page = client.get("/users/login").await;
    assert_eq!(page.context()["messages"][0], "You need to login first!");
}

#[tokio::test]
async fn test_gate_denies_reader_writes() {
    let app = test_app();
    let mut client = app.client_as("reader", Role::Reader).await;

    assert_eq!(client.get("/catalog/authors").await.status, StatusCode::OK);

    let response = client.get("/catalog/author/create").await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.view(), "warning");

    let response = client
        .post("/catalog/genre/create", &[("name", "Fantasy")])
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(app.repository.genres.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_gate_editor_cannot_delete() {
    let app = test_app();
    let mut client = app.client_as("editor", Role::Editor).await;

    let id = client.create("/catalog/genre/create", &[("name", "Fantasy")]).await;
    let response = client.post(&format!("/catalog/genre/{}/delete", id), &[]).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(app.repository.genres.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_bootstrap_admin_can_delete() {
    let app = test_app();
    let services = Services::new(app.repository.clone(), Arc::new(MemorySessionStore::new()));
    services
        .auth
        .ensure_bootstrap_admin(&BootstrapAdmin {
            username: "admin".into(),
            password: "change-me".into(),
            fullname: "Library Admin".into(),
            email: "admin@example.com".into(),
        })
        .await
        .unwrap();

    let mut client = app.client();
    assert_eq!(client.login("admin", "change-me").await.location(), "/");

    let id = client.create("/catalog/genre/create", &[("name", "Fantasy")]).await;
    let response = client.post(&format!("/catalog/genre/{}/delete", id), &[]).await;
    assert_eq!(response.location(), "/catalog/genres");
    assert_eq!(app.repository.genres.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_gate_covers_unknown_catalog_paths() {
    let app = test_app();
    let mut client = app.client();

    let response = client.get("/catalog/secret-report").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), "/users/login");

    let page = client.get("/users/login").await;
    assert_eq!(page.context()["messages"][0], "You need to login first!");

    let mut reader = app.client_as("reader", Role::Reader).await;
    let response = reader.get("/catalog/secret-report").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.view(), "error");
}

#[tokio::test]
async fn test_denial_message_shown_once_on_next_page() {
    let app = test_app();
    let mut client = app.client_as("reader", Role::Reader).await;

    for _ in 0..3 {
        let response = client.get("/catalog/author/create").await;
        assert_eq!(response.status, StatusCode::FORBIDDEN);
    }

    // Each denial is shown on the page that follows it
    let page = client.get("/catalog/authors").await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(
        page.context()["messages"],
        serde_json::json!(["You are not allowed to create catalog records"])
    );

    let page = client.get("/catalog/authors").await;
    assert_eq!(page.context()["messages"], serde_json::json!([]));
}

#[tokio::test]
async fn test_denied_messages_do_not_pile_up() {
    let app = test_app();
    let mut client = app.client_as("reader", Role::Reader).await;

    client.get("/catalog/author/create").await;
    let second = client.get("/catalog/genre/create").await;
    assert_eq!(
        second.context()["messages"],
        serde_json::json!(["You are not allowed to create catalog records"])
    );

    let page = client.get("/catalog").await;
    assert_eq!(
        page.context()["messages"],
        serde_json::json!(["You are not allowed to create catalog records"])
    );
    assert_eq!(client.get("/catalog").await.context()["messages"], serde_json::json!([]));
}

// =========================================================================
// CATALOG
// =========================================================================

async fn seed_author_and_genre(client: &mut TestClient) -> (String, String) {
    let author = client
        .create(
            "/catalog/author/create",
            &[
                ("first_name", "John"),
                ("family_name", "Tolkien"),
                ("date_of_birth", "1892-01-03"),
                ("date_of_death", "1973-09-02"),
            ],
        )
        .await;
    let genre = client.create("/catalog/genre/create", &[("name", "Fantasy")]).await;
    (author, genre)
}

#[tokio::test]
async fn test_author_delete_guarded_by_books() {
    let app = test_app();
    let mut client = app.client_as("admin", Role::Admin).await;
    let (author, genre) = seed_author_and_genre(&mut client).await;

    let book = client
        .create(
            "/catalog/book/create",
            &[
                ("title", "The Hobbit"),
                ("author", author.as_str()),
                ("summary", "There and back again"),
                ("isbn", "9780261102217"),
                ("genre", genre.as_str()),
            ],
        )
        .await;

    let response = client.post(&format!("/catalog/author/{}/delete", author), &[]).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.view(), "author_delete");
    assert_eq!(response.context()["books"][0]["title"], "The Hobbit");
    assert_eq!(app.repository.authors.count().await.unwrap(), 1);

    let response = client.post(&format!("/catalog/book/{}/delete", book), &[]).await;
    assert_eq!(response.location(), "/catalog/books");

    let response = client.post(&format!("/catalog/author/{}/delete", author), &[]).await;
    assert_eq!(response.location(), "/catalog/authors");
    assert_eq!(app.repository.authors.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_genre_create_reuses_case_insensitive_match() {
    let app = test_app();
    let mut client = app.client_as("editor", Role::Editor).await;

    let fiction = client.create("/catalog/genre/create", &[("name", "Fiction")]).await;
    let again = client.create("/catalog/genre/create", &[("name", "fiction")]).await;
    assert_eq!(again, fiction);
    assert_eq!(app.repository.genres.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_book_without_genre_rerenders_form() {
    let app = test_app();
    let mut client = app.client_as("editor", Role::Editor).await;
    let (author, _) = seed_author_and_genre(&mut client).await;

    let response = client
        .post(
            "/catalog/book/create",
            &[
                ("title", "The Hobbit"),
                ("author", author.as_str()),
                ("summary", "There and back again"),
                ("isbn", "9780261102217"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.view(), "book_form");
    assert_eq!(response.error_messages(), vec!["Genre must not be empty"]);

    let book = &response.context()["book"];
    assert_eq!(book["title"], "The Hobbit");
    assert_eq!(book["author"], author);
    assert_eq!(book["summary"], "There and back again");
    assert_eq!(book["isbn"], "9780261102217");
    assert_eq!(response.context()["authors"][0]["name"], "Tolkien, John");
    assert_eq!(app.repository.books.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_book_with_multiple_genres() {
    let app = test_app();
    let mut client = app.client_as("editor", Role::Editor).await;
    let (author, fantasy) = seed_author_and_genre(&mut client).await;
    let classic = client.create("/catalog/genre/create", &[("name", "Classic")]).await;

    let book = client
        .create(
            "/catalog/book/create",
            &[
                ("title", "The Hobbit"),
                ("author", author.as_str()),
                ("summary", "There and back again"),
                ("isbn", "9780261102217"),
                ("genre", fantasy.as_str()),
                ("genre", classic.as_str()),
            ],
        )
        .await;

    let page = client.get(&format!("/catalog/book/{}", book)).await;
    assert_eq!(page.view(), "book_detail");
    let context = page.context();
    assert_eq!(context["book"]["author"]["name"], "Tolkien, John");
    assert_eq!(context["book"]["genre"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_author_form_rules() {
    let app = test_app();
    let mut client = app.client_as("editor", Role::Editor).await;

    let response = client
        .post(
            "/catalog/author/create",
            &[
                ("first_name", ""),
                ("family_name", "Le Guin"),
                ("date_of_birth", "someday"),
            ],
        )
        .await;
    assert_eq!(response.view(), "author_form");
    assert_eq!(
        response.error_messages(),
        vec![
            "First name must be specified.",
            "Family name has non-alphanumeric characters.",
            "Invalid date of birth",
        ]
    );
    assert_eq!(app.repository.authors.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_book_instance_lifecycle() {
    let app = test_app();
    let mut client = app.client_as("admin", Role::Admin).await;
    let (author, genre) = seed_author_and_genre(&mut client).await;
    let book = client
        .create(
            "/catalog/book/create",
            &[
                ("title", "The Hobbit"),
                ("author", author.as_str()),
                ("summary", "There and back again"),
                ("isbn", "9780261102217"),
                ("genre", genre.as_str()),
            ],
        )
        .await;

    let form = client.get("/catalog/bookinstance/create").await;
    assert_eq!(form.context()["possible_status"][0], "Available");

    let copy = client
        .create(
            "/catalog/bookinstance/create",
            &[
                ("book", book.as_str()),
                ("imprint", "Allen & Unwin, 1937"),
                ("status", "Available"),
                ("due_back", "2026-10-19"),
            ],
        )
        .await;

    let page = client.get(&format!("/catalog/bookinstance/{}", copy)).await;
    let instance = &page.context()["book_instance"];
    assert_eq!(instance["due_back_formatted"], "Oct 19, 2026");
    assert_eq!(instance["due_back_yyyy_mm_dd"], "2026-10-19");
    assert_eq!(instance["book_detail"]["title"], "The Hobbit");

    let home = client.get("/catalog").await;
    assert_eq!(home.context()["counts"]["book_instance_available_count"], 1);

    // Copies block the book delete
    let response = client.post(&format!("/catalog/book/{}/delete", book), &[]).await;
    assert_eq!(response.view(), "book_delete");

    let response = client
        .post(&format!("/catalog/bookinstance/{}/delete", copy), &[])
        .await;
    assert_eq!(response.location(), "/catalog/bookinstances");
    assert_eq!(app.repository.book_instances.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_missing_records_are_not_found() {
    let app = test_app();
    let mut client = app.client_as("reader", Role::Reader).await;

    let response = client.get(&format!("/catalog/author/{}", Uuid::new_v4())).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.view(), "error");
    assert!(response.context()["error"]["detail"].is_string());

    let response = client.get("/catalog/book/not-an-id").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = client.get("/no/such/page").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_error_detail_hidden_in_production() {
    let mut config = AppConfig::default();
    config.server.environment = "production".to_string();
    let app = test_app_with(config);
    let mut client = app.client_as("reader", Role::Reader).await;

    let response = client.get(&format!("/catalog/genre/{}", Uuid::new_v4())).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.context().get("error").is_none());
}

#[tokio::test]
async fn test_security_headers_and_cookie_flags() {
    let app = test_app();
    let mut client = app.client();
    client.register("alice", "secret1").await;

    let request = Request::builder()
        .method("POST")
        .uri("/users/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form_encode(&[("username", "alice"), ("password", "secret1")])))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    let csp = response.headers()[header::CONTENT_SECURITY_POLICY].to_str().unwrap();
    assert!(csp.contains("script-src 'self' code.jquery.com cdn.jsdelivr.net"));

    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("library.sid="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age=18000"));
}

#[tokio::test]
async fn test_rendered_view_sees_account_changes_made_by_handler() {
    let app = test_app();
    let mut client = app.client_as("alice", Role::Reader).await;

    let repository = app.repository.clone();
    let rename = Router::new()
        .route(
            "/rename",
            post(move |CurrentUser(current): CurrentUser| {
                let repository = repository.clone();
                async move {
                    let id = current.unwrap().id;
                    let mut user = repository.users.get_by_id(id).await.unwrap();
                    user.fullname = "Alice Pleasance".to_string();
                    repository.users.update(&user).await.unwrap();
                    Page::new("user_profile")
                }
            }),
        )
        .layer(middleware::from_fn_with_state(
            app.state.clone(),
            api::session::session_layer,
        ))
        .layer(middleware::from_fn_with_state(
            app.state.clone(),
            api::responder::render_views,
        ))
        .with_state(app.state.clone());

    let mut renamer = TestClient {
        router: rename,
        cookie: client.cookie.clone(),
    };
    let page = renamer.post("/rename", &[]).await;
    assert_eq!(page.context()["current_user"]["fullname"], "Alice Pleasance");

    let home = client.get("/catalog").await;
    assert_eq!(home.context()["current_user"]["fullname"], "Alice Pleasance");
}

// =========================================================================
// LIVE SERVER
// =========================================================================

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_catalog_requires_login() {
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    let response = client
        .get(format!("{}/catalog/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 303);
    assert_eq!(response.headers()["location"], "/users/login");
}

#[tokio::test]
#[ignore]
async fn test_login_with_bootstrap_admin() {
    let client = reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .unwrap();

    let response = client
        .post(format!("{}/users/login", BASE_URL))
        .form(&[("username", "admin"), ("password", "admin")])
        .send()
        .await
        .expect("Failed to send login request");
    assert!(response.status().is_success());

    let response = client
        .get(format!("{}/catalog", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.url().path().starts_with("/catalog"));
}
