use std::sync::Arc;
use std::time::Instant;

use crate::clients::{ChromiumRenderer, CloudinaryStorage, PdfShiftRenderer, SmtpMailer};
use crate::config::{Config, RenderBackend};
use crate::db::Store;
use crate::services::invoice::InvoiceSettings;
use crate::services::{
    AdminService, AuthService, Clock, InvoiceRenderer, ItemService, Mailer, NotificationService,
    ObjectStorage, SeaOrmAuthService, SeaOrmItemService, SystemClock, UploadService,
};

/// Shared HTTP client for the renderer and object storage, so both reuse
/// one connection pool.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent(concat!("Marketbook/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

/// The outbound capabilities the pipeline depends on.
#[derive(Clone)]
pub struct Collaborators {
    pub renderer: Arc<dyn InvoiceRenderer>,
    pub mailer: Arc<dyn Mailer>,
    pub storage: Arc<dyn ObjectStorage>,
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    /// Production wiring: the configured render backend, SMTP and Cloudinary.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let timeout = config
            .invoice
            .render_timeout_seconds
            .max(config.storage.request_timeout_seconds);
        let http_client = build_shared_http_client(timeout)?;

        let renderer: Arc<dyn InvoiceRenderer> = match config.invoice.backend {
            RenderBackend::Remote => Arc::new(PdfShiftRenderer::with_shared_client(
                http_client.clone(),
                &config.invoice,
            )),
            RenderBackend::Local => Arc::new(ChromiumRenderer::new(&config.invoice)),
        };

        let mailer = SmtpMailer::new(&config.smtp, config.sender_address())
            .map_err(|e| anyhow::anyhow!("Failed to configure SMTP: {e}"))?;

        Ok(Self {
            renderer,
            mailer: Arc::new(mailer),
            storage: Arc::new(CloudinaryStorage::with_shared_client(
                http_client,
                config.storage.clone(),
            )),
            clock: Arc::new(SystemClock),
        })
    }
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub auth: Arc<dyn AuthService>,

    pub items: Arc<dyn ItemService>,

    pub notifications: Arc<NotificationService>,

    pub admin: Arc<AdminService>,

    pub uploads: Arc<UploadService>,

    pub start_time: Instant,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let collaborators = Collaborators::from_config(&config)?;
        Self::with_collaborators(config, collaborators).await
    }

    pub async fn with_collaborators(
        config: Config,
        collaborators: Collaborators,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Ok(Self::from_parts(config, store, collaborators))
    }

    #[must_use]
    pub fn from_parts(config: Config, store: Store, collaborators: Collaborators) -> Self {
        let Collaborators {
            renderer,
            mailer,
            storage,
            clock,
        } = collaborators;

        let auth = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn AuthService>;

        let items = Arc::new(SeaOrmItemService::new(
            store.clone(),
            renderer,
            mailer,
            clock,
            InvoiceSettings::from(&config.invoice),
        )) as Arc<dyn ItemService>;

        Self {
            notifications: Arc::new(NotificationService::new(store.clone())),
            admin: Arc::new(AdminService::new(store.clone())),
            uploads: Arc::new(UploadService::new(storage, config.server.max_upload_bytes)),
            auth,
            items,
            store,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }
}
