// Everything that talks to ERPNext or Keycloak. Handlers never build upstream
// requests themselves.
pub mod client;
pub mod credential;
pub mod envelope;
pub mod error;
pub mod normalize;
pub mod region;
pub mod sso;

pub use client::{Endpoint, Enrichment, ErpClient, ListSource, ListStrategy};
pub use credential::{resolve, CredentialKind, HeaderSet};
pub use envelope::{EnvelopeStyle, ListEnvelope};
pub use error::UpstreamError;
pub use normalize::{normalize, NormalizedError};
pub use sso::{ExchangeFailure, ExchangedCredential, SsoClient};
