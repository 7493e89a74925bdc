//! Artifact staging collaborator.
//!
//! The staging protocol itself lives elsewhere. Prepare only needs to open a
//! session: an endpoint the client uploads to and a token authenticating the
//! upload. On completion the staging service hands the client a retrieval
//! token, which comes back opaquely on Run.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::JobError;

/// An opened staging session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingSession {
    /// Endpoint the client stages artifacts to.
    pub endpoint: String,
    /// Token authenticating the session.
    pub session_token: String,
}

/// Opens artifact staging sessions for preparations.
#[async_trait]
pub trait ArtifactStaging: Send + Sync {
    /// Opens a staging session for `preparation_id`.
    async fn begin_session(&self, preparation_id: &str) -> Result<StagingSession, JobError>;
}

/// Staging service at a fixed endpoint, issuing random session tokens.
///
/// # Examples
///
/// ```
/// use jobctl::service::staging::StaticArtifactStaging;
///
/// let staging = StaticArtifactStaging::new("http://localhost:8098");
/// assert_eq!(staging.endpoint(), "http://localhost:8098");
/// ```
#[derive(Debug, Clone)]
pub struct StaticArtifactStaging {
    endpoint: String,
}

impl StaticArtifactStaging {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ArtifactStaging for StaticArtifactStaging {
    async fn begin_session(&self, preparation_id: &str) -> Result<StagingSession, JobError> {
        let session_token = format!("{preparation_id}/{}", Uuid::new_v4());
        Ok(StagingSession {
            endpoint: self.endpoint.clone(),
            session_token,
        })
    }
}
