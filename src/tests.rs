//! Integration tests for the bridge-facing HTTP API.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use once_cell::sync::Lazy;
use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::db::{init_database, Repository};
use crate::models::NewTag;
use crate::search::TagSearchIndex;
use crate::testing::{RecordingMessenger, Sent};
use crate::{create_router, AppState};

const API_KEY: &str = "test-api-key";
const GUILD: u64 = 10;
const CHANNEL: u64 = 20;
const BOT_ID: u64 = 4242;

static TRACING: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    state: AppState,
    repo: Repository,
    messenger: Arc<RecordingMessenger>,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_psk(Some(API_KEY.to_string())).await
    }

    async fn with_psk(psk: Option<String>) -> Self {
        Lazy::force(&TRACING);

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");
        let index_path = temp_dir.path().join("index");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Repository::new(pool);

        // Initialize search index
        let search = Arc::new(TagSearchIndex::open(&index_path).expect("Failed to init search"));

        // Create config
        let config = Config {
            api_psk: psk.clone(),
            db_path,
            index_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            log_json: false,
            gateway_url: "http://127.0.0.1:9".to_string(),
            gateway_key: None,
            bot_user_id: BOT_ID,
            owner_ids: vec![],
            reply_timeout: Duration::from_secs(300),
            tag_cache_size: 100,
            autocomplete_cache_size: 100,
            paginator_capacity: 10,
        };

        let messenger = Arc::new(RecordingMessenger::new());
        let state = AppState::build(config, repo.clone(), search, messenger.clone());
        let app = create_router(state.clone());

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        let mut client_builder = Client::builder();
        if let Some(key) = psk {
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert("x-api-key", key.parse().unwrap());
            client_builder = client_builder.default_headers(headers);
        }

        TestFixture {
            client: client_builder.build().unwrap(),
            base_url,
            state,
            repo,
            messenger,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn seed(&self, name: &str, owner_id: u64) {
        self.repo
            .create_tag(&NewTag {
                name: name.to_string(),
                guild_id: GUILD,
                owner_id,
                content: format!("{} content", name),
            })
            .await
            .unwrap();
    }

    /// Poll until the messenger has recorded at least `count` calls.
    async fn wait_for_sent(&self, count: usize) -> Vec<Sent> {
        for _ in 0..200 {
            let sent = self.messenger.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "expected {} outbound messages, got {:?}",
            count,
            self.messenger.sent()
        );
    }

    async fn wait_for_prompt(&self) {
        for _ in 0..200 {
            if self.state.collector.pending() > 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("no prompt is waiting for a reply");
    }
}

fn interaction(user_id: u64, command: Value) -> Value {
    json!({
        "id": format!("interaction-{}", user_id),
        "token": "token",
        "guild_id": GUILD,
        "channel_id": CHANNEL,
        "actor": { "id": user_id, "name": format!("user-{}", user_id) },
        "command": command
    })
}

fn component(user_id: u64, custom_id: &str, value: Option<&str>) -> Value {
    json!({
        "id": format!("component-{}", user_id),
        "token": "token",
        "guild_id": GUILD,
        "channel_id": CHANNEL,
        "actor": { "id": user_id, "name": format!("user-{}", user_id) },
        "custom_id": custom_id,
        "value": value
    })
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_auth_missing_psk() {
    let fixture = TestFixture::new().await;

    // Client without the default header
    let resp = Client::new()
        .get(fixture.url("/api/tags/autocomplete?guild_id=10&query=f"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    assert_eq!(body["error"]["message"], "Missing API key");
}

#[tokio::test]
async fn test_auth_invalid_psk() {
    let fixture = TestFixture::new().await;

    let resp = Client::new()
        .post(fixture.url("/api/messages"))
        .header("x-api-key", "wrong-key")
        .json(&json!({ "id": 1, "channel_id": CHANNEL, "author_id": 1, "content": "hi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Invalid API key");
}

#[tokio::test]
async fn test_auth_bearer_token() {
    let fixture = TestFixture::new().await;

    let resp = Client::new()
        .get(fixture.url("/api/tags/autocomplete?guild_id=10"))
        .bearer_auth(API_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_no_psk_configured_allows_requests() {
    let fixture = TestFixture::with_psk(None).await;

    let resp = fixture
        .client
        .get(fixture.url("/api/tags/autocomplete?guild_id=10&query="))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_create_tag_through_prompt() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .post(
            "/api/interactions",
            interaction(1, json!({ "command": "tags_create", "name": "rules" })),
        )
        .await;
    assert_eq!(resp.status(), 202);

    fixture.wait_for_prompt().await;
    let sent = fixture.wait_for_sent(1).await;
    assert_eq!(
        sent[0].reply().and_then(|r| r.description()),
        Some("Please reply to this message with your tag content within 5 minutes.")
    );

    // A message from someone else does not answer the prompt
    let resp = fixture
        .post(
            "/api/messages",
            json!({ "id": 7, "guild_id": GUILD, "channel_id": CHANNEL, "author_id": 2, "content": "nope" }),
        )
        .await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["delivered"], 0);

    let resp = fixture
        .post(
            "/api/messages",
            json!({ "id": 8, "guild_id": GUILD, "channel_id": CHANNEL, "author_id": 1, "content": "Be nice." }),
        )
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["delivered"], 1);

    let sent = fixture.wait_for_sent(2).await;
    match &sent[1] {
        Sent::ReplyTo {
            message_id, reply, ..
        } => {
            assert_eq!(*message_id, 8);
            assert_eq!(reply.description(), Some("The tag has successfully been created."));
        }
        other => panic!("unexpected message {:?}", other),
    }

    let resp = fixture
        .client
        .get(fixture.url("/api/tags/autocomplete?guild_id=10&query=RU"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"], json!(["rules"]));
}

#[tokio::test]
async fn test_view_missing_tag_reports_error() {
    let fixture = TestFixture::new().await;

    fixture
        .post(
            "/api/interactions",
            interaction(1, json!({ "command": "tags_view", "tag": "nothing", "silent": true })),
        )
        .await;

    let sent = fixture.wait_for_sent(1).await;
    match &sent[0] {
        Sent::Respond(reply) => {
            assert!(reply.ephemeral);
            assert_eq!(reply.description(), Some("That tag does not exist."));
        }
        other => panic!("unexpected message {:?}", other),
    }
}

#[tokio::test]
async fn test_list_and_page_through_components() {
    let fixture = TestFixture::new().await;
    for i in 0..20 {
        fixture.seed(&format!("tag{:02}", i), 1).await;
    }

    fixture
        .post(
            "/api/interactions",
            interaction(1, json!({ "command": "tags_list" })),
        )
        .await;
    let sent = fixture.wait_for_sent(1).await;
    let first = sent[0].reply().unwrap().clone();
    assert_eq!(first.embeds[0].footer.as_deref(), Some("Page 1 / 2"));
    assert!(first.buttons[0].disabled);

    let next_id = first.buttons[2].custom_id.clone();

    // Someone else cannot turn the page
    let resp = fixture
        .post("/api/components", component(2, &next_id, None))
        .await;
    assert_eq!(resp.status(), 202);
    let sent = fixture.wait_for_sent(2).await;
    match &sent[1] {
        Sent::Respond(reply) => {
            assert!(reply.ephemeral);
            assert_eq!(
                reply.description(),
                Some("You do not have permission to interact with this menu.")
            );
        }
        other => panic!("unexpected message {:?}", other),
    }

    fixture
        .post("/api/components", component(1, &next_id, None))
        .await;
    let sent = fixture.wait_for_sent(3).await;
    match &sent[2] {
        Sent::Update(reply) => {
            assert_eq!(reply.embeds[0].footer.as_deref(), Some("Page 2 / 2"));
            assert!(reply.buttons[2].disabled);
        }
        other => panic!("unexpected message {:?}", other),
    }

    // Jump modal then submission
    fixture
        .post("/api/components", component(1, &first.buttons[1].custom_id, None))
        .await;
    let sent = fixture.wait_for_sent(4).await;
    let modal = match &sent[3] {
        Sent::Modal(modal) => modal.clone(),
        other => panic!("unexpected message {:?}", other),
    };
    assert_eq!(modal.label, "Page");

    fixture
        .post("/api/components", component(1, &modal.custom_id, Some("1")))
        .await;
    let sent = fixture.wait_for_sent(5).await;
    match &sent[4] {
        Sent::Update(reply) => {
            assert_eq!(reply.embeds[0].footer.as_deref(), Some("Page 1 / 2"))
        }
        other => panic!("unexpected message {:?}", other),
    }
}

#[tokio::test]
async fn test_image_filter_through_components() {
    let fixture = TestFixture::new().await;

    let mut png = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(6, 6, image::Rgb([30, 60, 90])))
        .write_to(&mut png, image::ImageFormat::Png)
        .unwrap();
    fixture
        .messenger
        .add_file("https://cdn.example/cat.png", png.into_inner());

    let resp = fixture
        .post(
            "/api/interactions",
            interaction(
                1,
                json!({
                    "command": "image_filter",
                    "image": { "url": "https://cdn.example/cat.png", "filename": "cat.png", "size": 120 }
                }),
            ),
        )
        .await;
    assert_eq!(resp.status(), 202);

    let sent = fixture.wait_for_sent(1).await;
    let first = sent[0].reply().unwrap().clone();
    assert_eq!(first.files[0].filename, "processed_image.jpg");
    let sharpen = first
        .buttons
        .iter()
        .find(|b| b.label.as_deref() == Some("Sharpen"))
        .unwrap()
        .custom_id
        .clone();

    let resp = fixture
        .post("/api/components", component(1, &sharpen, None))
        .await;
    assert_eq!(resp.status(), 202);
    let sent = fixture.wait_for_sent(2).await;
    match &sent[1] {
        Sent::Update(reply) => {
            assert_eq!(reply.files.len(), 1);
            assert_eq!(reply.buttons.len(), 10);
        }
        other => panic!("unexpected message {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_component_rejected() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .post("/api/components", component(1, "something-else", None))
        .await;
    assert_eq!(resp.status(), 400);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_kick_through_interaction() {
    let fixture = TestFixture::new().await;

    let mut body = interaction(
        1,
        json!({ "command": "kick", "member": { "id": 2, "name": "spammer" }, "reason": "spam" }),
    );
    body["actor"]["permissions"] = json!({ "kick_members": true });

    let resp = fixture.post("/api/interactions", body).await;
    assert_eq!(resp.status(), 202);

    let sent = fixture.wait_for_sent(2).await;
    assert!(matches!(sent[0], Sent::Kick { user_id: 2, .. }));
    assert_eq!(
        sent[1].reply().and_then(|r| r.description()),
        Some("<@2> has been kicked.")
    );

    let logged = fixture.repo.list_infractions(GUILD, 2).await.unwrap();
    assert_eq!(logged.len(), 1);
}

#[tokio::test]
async fn test_malformed_interaction_rejected() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .post("/api/interactions", json!({ "id": "1", "command": { "command": "tags_view" } }))
        .await;
    assert!(resp.status().is_client_error());
    assert!(fixture.messenger.sent().is_empty());
}

#[tokio::test]
async fn test_router_without_a_socket() {
    let fixture = TestFixture::new().await;
    fixture.seed("rules", 1).await;
    let app = create_router(fixture.state.clone());

    let resp = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/tags/autocomplete?guild_id=10&query=ru")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/tags/autocomplete?guild_id=10&query=ru")
                .header("x-api-key", API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["data"], json!(["rules"]));
}
