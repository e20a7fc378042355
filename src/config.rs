// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use chrono::TimeDelta;
use sqlx::postgres::PgPoolOptions;

use crate::{
    common::i18n::I18nStore,
    db::{
        memory::{demo_requests, demo_users},
        spawn_change_listener, InMemoryRequestStore, InMemoryUserDirectory, RequestRepository, RequestStore,
        UserDirectory, UserRepository,
    },
    services::{
        auth::AuthService, dashboard_service::DashboardService, events::ChangeFeed,
        request_service::RequestService,
    },
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 5;
const DEFAULT_SESSION_TTL_HOURS: i64 = 168;

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Config {
    /// Sem URL, o app roda com armazenamento em memória.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub planner_password_hash: Option<String>,
    pub bind_addr: String,
    pub store_timeout: Duration,
    pub session_ttl: TimeDelta,
    pub seed_demo_data: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = non_empty("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let store_timeout_secs = match non_empty("STORE_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().context("STORE_TIMEOUT_SECS deve ser um inteiro")?,
            None => DEFAULT_STORE_TIMEOUT_SECS,
        };

        let session_ttl_hours = match non_empty("SESSION_TTL_HOURS") {
            Some(raw) => raw.parse::<i64>().context("SESSION_TTL_HOURS deve ser um inteiro")?,
            None => DEFAULT_SESSION_TTL_HOURS,
        };
        if session_ttl_hours <= 0 {
            anyhow::bail!("SESSION_TTL_HOURS deve ser positivo");
        }

        let seed_demo_data = non_empty("SEED_DEMO_DATA")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "sim"))
            .unwrap_or(false);

        Ok(Self {
            database_url: non_empty("DATABASE_URL"),
            jwt_secret,
            planner_password_hash: non_empty("PLANNER_PASSWORD_HASH"),
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            store_timeout: Duration::from_secs(store_timeout_secs),
            session_ttl: TimeDelta::hours(session_ttl_hours),
            seed_demo_data,
        })
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub i18n_store: Arc<I18nStore>,
    pub auth_service: AuthService,
    pub request_service: RequestService,
    pub dashboard_service: DashboardService,
    pub change_feed: ChangeFeed,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let change_feed = ChangeFeed::default();

        let Some(database_url) = &config.database_url else {
            tracing::warn!("⚠️ DATABASE_URL ausente: usando armazenamento em memória");

            let (users, requests) = if config.seed_demo_data {
                let users = demo_users();
                let requests = demo_requests(&users);
                tracing::info!("🌱 {} moradores e {} chamados de demonstração", users.len(), requests.len());
                (users, requests)
            } else {
                (Vec::new(), Vec::new())
            };

            return Self::from_stores(
                config,
                Arc::new(InMemoryRequestStore::with_requests(requests)),
                Arc::new(InMemoryUserDirectory::with_users(users)),
                change_feed,
            );
        };

        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        sqlx::migrate!()
            .run(&db_pool)
            .await
            .context("Falha ao rodar as migrações do banco de dados")?;

        tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

        if config.seed_demo_data {
            tracing::warn!("SEED_DEMO_DATA só vale para o armazenamento em memória; ignorado");
        }

        spawn_change_listener(db_pool.clone(), change_feed.clone());

        Self::from_stores(
            config,
            Arc::new(RequestRepository::new(db_pool.clone())),
            Arc::new(UserRepository::new(db_pool)),
            change_feed,
        )
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_stores(
        config: &Config,
        requests: Arc<dyn RequestStore>,
        users: Arc<dyn UserDirectory>,
        change_feed: ChangeFeed,
    ) -> anyhow::Result<Self> {
        let i18n_store = Arc::new(I18nStore::load()?);

        let auth_service = AuthService::new(
            users,
            config.jwt_secret.clone(),
            config.planner_password_hash.clone(),
            config.session_ttl,
            config.store_timeout,
        );
        let request_service = RequestService::new(requests.clone(), change_feed.clone(), config.store_timeout);
        let dashboard_service = DashboardService::new(requests, config.store_timeout);

        Ok(Self {
            i18n_store,
            auth_service,
            request_service,
            dashboard_service,
            change_feed,
        })
    }
}
