use std::net::TcpListener;
use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use once_cell::sync::Lazy;
use uuid::Uuid;

use ctfarena_backend::config::jwt::JwtSettings;
use ctfarena_backend::models::event::{Event, EventRegistration, RegistrationStatus};
use ctfarena_backend::models::user::{User, UserRole, UserStatus};
use ctfarena_backend::run;
use ctfarena_backend::store::{InMemoryRosterStore, RosterStore};
use ctfarena_backend::telemetry::{get_subscriber, init_subscriber};
use ctfarena_backend::Claims;

const TEST_JWT_SECRET: &str = "test-jwt-secret";

// Ensure that the `tracing` stack is only initialised once using `once_cell`
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub struct TestApp {
    pub address: String,
    pub store: Arc<InMemoryRosterStore>,
}

impl TestApp {
    /// Mint a bearer token for the given user, the way the session layer
    /// would.
    pub fn token_for(&self, user: &User) -> String {
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role.clone(),
            status: user.status.clone(),
            exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
        )
        .expect("Failed to encode test token")
    }

    pub async fn seed_event(&self, name: &str) -> Event {
        let event = Event {
            id: Uuid::new_v4(),
            name: name.to_string(),
            starts_at: Utc::now(),
            ends_at: Utc::now() + Duration::days(2),
            created_at: Utc::now(),
        };
        self.store.seed_event(event.clone()).await;
        event
    }

    /// A plain user registered for the event.
    pub async fn seed_player(&self, event_id: Uuid, username: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{}@example.com", username),
            role: UserRole::User,
            status: UserStatus::Active,
            created_at: Utc::now(),
        };
        self.store.seed_user(user.clone()).await;
        self.store
            .seed_registration(EventRegistration {
                id: Uuid::new_v4(),
                event_id,
                user_id: user.id,
                status: RegistrationStatus::Active,
                registered_at: Utc::now(),
            })
            .await;
        user
    }

    pub async fn seed_admin(&self, username: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{}@example.com", username),
            role: UserRole::Admin,
            status: UserStatus::Active,
            created_at: Utc::now(),
        };
        self.store.seed_user(user.clone()).await;
        user
    }
}

pub async fn spawn_app() -> TestApp {
    // The first time `initialize` is invoked the code in `TRACING` is executed.
    // All other invocations will instead skip execution.
    Lazy::force(&TRACING);

    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    // Get port assigned by the OS
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let store = Arc::new(InMemoryRosterStore::new());
    let jwt_settings = JwtSettings::new(TEST_JWT_SECRET.to_string(), 1);

    let server = run(
        listener,
        store.clone() as Arc<dyn RosterStore>,
        jwt_settings,
        None,
    )
    .expect("Failed to bind address");
    // Launch the server as a background task
    let _ = tokio::spawn(server);

    TestApp { address, store }
}
