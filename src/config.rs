// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use chrono::Utc;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{seed, Repositories, SessionStore},
    services::{
        auth::AuthService, document_service::DocumentService, permission_service::PermissionService,
        qr_service::QrService, report_service::ReportService, scanner_service::ScannerService,
        user_service::UserService,
    },
};

pub const DEFAULT_QR_SERVICE_URL: &str = "https://api.qrserver.com/v1/create-qr-code/";

// Configuração lida do ambiente (.env incluso)
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub database_url: Option<String>,
    pub login_delay_ms: u64,
    pub qr_service_url: String,
    pub qr_size: u32,
    pub seed_demo_data: bool,
    pub report_fonts_dir: String,
}

fn var_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{} inválido: '{}'", name, raw)),
        _ => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            bind_addr: var_or("BIND_ADDR", "0.0.0.0:3000".to_string())?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?,
            token_ttl_hours: var_or("TOKEN_TTL_HOURS", 24)?,
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            login_delay_ms: var_or("LOGIN_DELAY_MS", 1000)?,
            qr_service_url: var_or("QR_SERVICE_URL", DEFAULT_QR_SERVICE_URL.to_string())?,
            qr_size: var_or("QR_SIZE", 150)?,
            seed_demo_data: var_or("SEED_DEMO_DATA", true)?,
            report_fonts_dir: var_or("REPORT_FONTS_DIR", "./fonts".to_string())?,
        })
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: Option<PgPool>,
    pub i18n_store: Arc<I18nStore>,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub permission_service: PermissionService,
    pub report_service: ReportService,
    pub document_service: DocumentService,
    pub scanner_service: ScannerService,
}

impl AppState {
    /// Postgres quando DATABASE_URL existe, senão repositórios em memória.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let (repos, db_pool) = match &config.database_url {
            Some(database_url) => {
                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await
                    .context("Falha ao conectar ao banco de dados")?;
                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                sqlx::migrate!()
                    .run(&pool)
                    .await
                    .context("Falha ao rodar as migrações do banco de dados")?;
                tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

                (Repositories::postgres(pool.clone()), Some(pool))
            }
            None => {
                tracing::info!("💾 DATABASE_URL ausente, usando repositórios em memória");
                (Repositories::memory(), None)
            }
        };

        Self::with_repositories(config, repos, db_pool).await
    }

    // --- Monta o gráfico de dependências ---
    pub async fn with_repositories(
        config: Config,
        repos: Repositories,
        db_pool: Option<PgPool>,
    ) -> anyhow::Result<Self> {
        let i18n_store = Arc::new(I18nStore::load()?);
        let qr = QrService::new(config.qr_service_url.clone(), config.qr_size);

        if config.seed_demo_data {
            seed::install(&repos, &qr, Utc::now())
                .await
                .map_err(|e| anyhow::anyhow!("Falha ao instalar dados de demonstração: {}", e))?;
        }

        let auth_service = AuthService::new(
            repos.users.clone(),
            Arc::new(SessionStore::new()),
            config.jwt_secret.clone(),
            chrono::Duration::hours(config.token_ttl_hours),
            Duration::from_millis(config.login_delay_ms),
        );
        let permission_service = PermissionService::new(&repos, qr.clone());
        let scanner_service = ScannerService::new(permission_service.clone(), repos.users.clone());

        Ok(Self {
            i18n_store,
            auth_service,
            user_service: UserService::new(&repos),
            report_service: ReportService::new(&repos),
            document_service: DocumentService::new(config.report_fonts_dir.clone(), qr),
            permission_service,
            scanner_service,
            db_pool,
        })
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            bind_addr: "127.0.0.1:0".into(),
            jwt_secret: "segredo-de-teste".into(),
            token_ttl_hours: 1,
            database_url: None,
            login_delay_ms: 0,
            qr_service_url: DEFAULT_QR_SERVICE_URL.into(),
            qr_size: 150,
            seed_demo_data: true,
            report_fonts_dir: "./fonts".into(),
        }
    }
}
