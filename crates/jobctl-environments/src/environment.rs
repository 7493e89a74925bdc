//! The [`Environment`] descriptor and its typed payloads.
//!
//! An environment is a `{urn, payload}` pair. The urn alone decides which
//! payload structure the bytes hold:
//!
//! | Urn                          | Payload               |
//! |------------------------------|-----------------------|
//! | `beam:env:docker:v1`         | [`DockerPayload`]     |
//! | `beam:env:process:v1`        | [`ProcessPayload`]    |
//! | `beam:env:external:v1`       | [`ExternalPayload`]   |
//! | `beam:env:embedded:v1`       | raw bytes             |

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::codec::{decode_message, encode_message};
use crate::error::EnvironmentError;
use crate::urns;

/// Reference to the runtime that executes a transform.
///
/// # Serialization
///
/// `payload` travels as a base64 string and is omitted when empty.
///
/// # Examples
///
/// ```
/// use jobctl_environments::{Environment, EnvironmentPayload};
/// use jobctl_environments::builder::create_docker_environment;
///
/// let env = create_docker_environment("my/image:1").unwrap();
/// match env.decode().unwrap() {
///     EnvironmentPayload::Docker(docker) => assert_eq!(docker.container_image, "my/image:1"),
///     other => panic!("unexpected payload {other:?}"),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    /// Environment kind.
    pub urn: String,

    /// Kind-specific payload bytes.
    #[serde(default, with = "crate::codec::base64_bytes", skip_serializing_if = "Vec::is_empty")]
    pub payload: Vec<u8>,
}

impl Environment {
    /// Builds an environment whose payload is the encoding of `payload`.
    pub fn from_payload<T: Serialize>(
        urn: impl Into<String>,
        payload: &T,
    ) -> Result<Self, EnvironmentError> {
        Ok(Self {
            urn: urn.into(),
            payload: encode_message(payload).map_err(EnvironmentError::Encode)?,
        })
    }

    /// Decodes the payload according to the urn.
    ///
    /// A payload that does not match its urn's structure is a protocol
    /// violation and is reported, never defaulted.
    pub fn decode(&self) -> Result<EnvironmentPayload, EnvironmentError> {
        let malformed = |source| EnvironmentError::MalformedEnvironmentPayload {
            urn: self.urn.clone(),
            source,
        };
        match self.urn.as_str() {
            urns::DOCKER_ENVIRONMENT_URN => decode_message(&self.payload)
                .map(EnvironmentPayload::Docker)
                .map_err(malformed),
            urns::PROCESS_ENVIRONMENT_URN => decode_message(&self.payload)
                .map(EnvironmentPayload::Process)
                .map_err(malformed),
            urns::EXTERNAL_ENVIRONMENT_URN => decode_message(&self.payload)
                .map(EnvironmentPayload::External)
                .map_err(malformed),
            urns::EMBEDDED_ENVIRONMENT_URN => Ok(EnvironmentPayload::Embedded(self.payload.clone())),
            other => Err(EnvironmentError::UnknownEnvironmentUrn {
                urn: other.to_string(),
            }),
        }
    }
}

/// Typed view over an [`Environment`] payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentPayload {
    /// Container image to launch.
    Docker(DockerPayload),
    /// Local process to launch.
    Process(ProcessPayload),
    /// Out-of-process or loopback service endpoint.
    External(ExternalPayload),
    /// Opaque blob for the embedded test harness.
    Embedded(Vec<u8>),
}

/// Payload of a docker environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DockerPayload {
    /// Container image reference.
    pub container_image: String,
}

/// Payload of a process environment.
///
/// Every field is optional; an absent field means "inherit the executor's
/// default", which is different from a field explicitly set to `""`. Absent
/// fields are left out of the encoded payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProcessPayload {
    /// Target operating system.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,

    /// Target architecture.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,

    /// Command that starts the harness.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Environment variables for the harness process.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
}

/// Network endpoint of a running service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiServiceDescriptor {
    /// Endpoint url.
    pub url: String,
}

/// Payload of an external environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExternalPayload {
    /// Where the external worker pool listens.
    pub endpoint: ApiServiceDescriptor,
}
