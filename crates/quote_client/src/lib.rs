//! StealthQuote client: REST calls, the live-update socket and artifact storage.
mod api;
mod error;
mod filename;
mod handle;
mod live;
mod persist;
mod settings;

pub use api::{BomApi, ReqwestApi};
pub use error::{ApiError, ArtifactError, ClientError};
pub use filename::{csv_filename, pdf_filename, sanitize_component};
pub use handle::{ClientEvent, ClientHandle};
pub use live::{EventSink, LiveClient, LiveError, SubscriptionId};
pub use persist::{ensure_output_dir, ArtifactWriter, PersistError};
pub use settings::{live_url, ClientSettings, JOB_ID_PLACEHOLDER};
