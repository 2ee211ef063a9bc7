use std::env;

/// Origins allowed to call the API with credentials when `CORS_ORIGINS` is unset.
pub const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:5173", "https://jersey-geeks.web.app"];

/// AppConfig
///
/// Holds the application's entire configuration state, loaded once at startup and
/// immutable afterwards. It is pulled into handlers and extractors via `FromRef`.
///
/// Secrets (the token signing key and database credentials) only ever come from the
/// process environment.
#[derive(Clone)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and which fallbacks are allowed.
    pub env: Env,
    // TCP port the HTTP server binds to.
    pub port: u16,
    // MongoDB connection string.
    pub db_url: String,
    // Database holding the jerseys, carts and users collections.
    pub db_name: String,
    // Shared HMAC secret used to sign and verify bearer tokens.
    pub jwt_secret: String,
    // Browser origins allowed to make credentialed requests.
    pub cors_origins: Vec<String>,
    pub storage: StorageBackend,
}

/// Env
///
/// Defines the runtime context.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// StorageBackend
///
/// Which `Repository` implementation `main` wires up.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum StorageBackend {
    Mongo,
    // In-process store; only accepted in `Env::Local`.
    Memory,
}

impl Default for AppConfig {
    /// Non-panicking configuration for test scaffolding. The signing secret is empty,
    /// so tests that mint tokens must set their own.
    fn default() -> Self {
        Self {
            env: Env::Local,
            port: 5000,
            db_url: "mongodb://localhost:27017".to_string(),
            db_name: "jerseyDB".to_string(),
            jwt_secret: String::new(),
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
            storage: StorageBackend::Memory,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads every parameter from the environment.
    ///
    /// # Panics
    /// Panics if `ACCESS_TOKEN_SECRET` is missing, if production has no database
    /// credentials, if `PORT` is not a port number, or if the in-memory store is
    /// requested outside local mode. The service refuses to start half-configured.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = env::var("ACCESS_TOKEN_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .expect("FATAL: ACCESS_TOKEN_SECRET must be set.");

        let port = match env::var("PORT") {
            Ok(port) => port.parse().expect("FATAL: PORT must be a valid port number."),
            Err(_) => 5000,
        };

        let storage = match env::var("STORE_BACKEND").as_deref() {
            Ok("memory") if env == Env::Local => StorageBackend::Memory,
            Ok("memory") => panic!("FATAL: STORE_BACKEND=memory is only allowed when APP_ENV=local."),
            _ => StorageBackend::Mongo,
        };

        let db_url = Self::resolve_db_url(&env);

        let cors_origins = match env::var("CORS_ORIGINS") {
            Ok(list) => list
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect(),
            Err(_) => DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        Self {
            env,
            port,
            db_url,
            db_name: env::var("DB_NAME").unwrap_or_else(|_| "jerseyDB".to_string()),
            jwt_secret,
            cors_origins,
            storage,
        }
    }

    /// `MONGODB_URI` wins; otherwise the Atlas SRV URI is assembled from `DB_USER`,
    /// `DB_PASS` and `DB_CLUSTER`. Local mode falls back to an unauthenticated
    /// localhost server.
    fn resolve_db_url(env: &Env) -> String {
        if let Ok(uri) = env::var("MONGODB_URI") {
            return uri;
        }

        match (env::var("DB_USER"), env::var("DB_PASS"), env::var("DB_CLUSTER")) {
            (Ok(user), Ok(pass), Ok(cluster)) => format!(
                "mongodb+srv://{user}:{pass}@{cluster}/?retryWrites=true&w=majority"
            ),
            _ if *env == Env::Local => "mongodb://localhost:27017".to_string(),
            _ => panic!("FATAL: MONGODB_URI or DB_USER/DB_PASS/DB_CLUSTER required in production."),
        }
    }
}
