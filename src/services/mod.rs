pub mod admin_service;
pub use admin_service::AdminService;

pub mod auth_service;
pub use auth_service::{AuthError, AuthService};

pub mod auth_service_impl;
pub use auth_service_impl::SeaOrmAuthService;

pub mod clock;
pub use clock::{Clock, SystemClock};

pub mod delivery;
pub use delivery::{DeliveryError, Mailer, OutgoingEmail};

pub mod invoice;
pub use invoice::{InvoiceRenderer, RenderError};

pub mod item_service;
pub use item_service::{ItemError, ItemService};

pub mod item_service_impl;
pub use item_service_impl::SeaOrmItemService;

pub mod notification_service;
pub use notification_service::NotificationService;

pub mod provenance;
pub use provenance::ProvenanceLog;

pub mod scheduler;
pub use scheduler::Scheduler;

pub mod upload;
pub use upload::{ObjectStorage, StorageError, UploadService};

pub mod validation;
