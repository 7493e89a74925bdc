//! Error types for environment construction and resolution.
//!
//! Every variant describes a malformed or inconsistent submission. None of
//! them are retryable, and the resolver never substitutes a default
//! environment in their place.

use thiserror::Error;

/// Errors raised while building, decoding, or resolving environments.
///
/// # Examples
///
/// ```
/// use jobctl_environments::EnvironmentError;
///
/// let err = EnvironmentError::UnknownEnvironment {
///     environment_id: "env-9".to_string(),
/// };
/// assert_eq!(err.to_string(), "unknown environment id: env-9");
/// ```
#[derive(Error, Debug)]
pub enum EnvironmentError {
    /// A `PROCESS` configuration string did not match the process schema.
    #[error("unable to parse process environment config: {config}")]
    InvalidProcessConfig {
        /// The configuration string as given.
        config: String,
        /// The underlying parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// A transform references an environment id missing from the component table.
    #[error("unknown environment id: {environment_id}")]
    UnknownEnvironment {
        /// The dangling environment id.
        environment_id: String,
    },

    /// The requested transform id is not in the component table.
    #[error("unknown transform id: {transform_id}")]
    UnknownTransform {
        /// The transform id that was looked up.
        transform_id: String,
    },

    /// A transform payload failed to parse as the structure its urn declares.
    #[error("malformed payload for transform {transform_id} ({urn}): {source}")]
    MalformedTransformPayload {
        /// The transform whose payload was rejected.
        transform_id: String,
        /// The transform urn that selected the payload type.
        urn: String,
        /// The underlying parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// An environment payload does not parse as the type its urn declares.
    #[error("malformed payload for environment urn {urn}: {source}")]
    MalformedEnvironmentPayload {
        /// The environment urn.
        urn: String,
        /// The underlying parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// The environment urn is not one of the known environment kinds.
    #[error("unknown environment urn: {urn}")]
    UnknownEnvironmentUrn {
        /// The unrecognized urn.
        urn: String,
    },

    /// A typed payload could not be encoded.
    #[error("failed to encode payload: {0}")]
    Encode(#[source] serde_json::Error),
}
