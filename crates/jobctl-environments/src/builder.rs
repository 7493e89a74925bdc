//! Construction of [`Environment`] descriptors from a deployment mode.
//!
//! [`EnvironmentFactory::create_or_get_default`] maps a mode tag and an
//! opaque configuration string onto exactly one descriptor:
//!
//! | Mode                    | Descriptor                                        |
//! |-------------------------|---------------------------------------------------|
//! | empty / absent          | the factory's default harness environment         |
//! | `DOCKER` / unrecognized | docker, config is the container image             |
//! | `PROCESS`               | process, config is a JSON [`ProcessConfig`]       |
//! | `EXTERNAL` / `LOOPBACK` | external, config is the endpoint url              |
//! | `EMBEDDED`              | embedded, config bytes are the payload            |
//!
//! Unrecognized tags fall back to docker so callers on newer deployment modes
//! keep getting a container.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::environment::{
    ApiServiceDescriptor, DockerPayload, Environment, ExternalPayload, ProcessPayload,
};
use crate::error::EnvironmentError;
use crate::urns;

/// Deployment mode tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvironmentMode {
    Docker,
    Process,
    External,
    Embedded,
    Loopback,
}

impl EnvironmentMode {
    /// Parses a mode tag. Matching is exact; unknown tags yield `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "DOCKER" => Some(Self::Docker),
            "PROCESS" => Some(Self::Process),
            "EXTERNAL" => Some(Self::External),
            "EMBEDDED" => Some(Self::Embedded),
            "LOOPBACK" => Some(Self::Loopback),
            _ => None,
        }
    }

    /// The tag as accepted by [`from_tag`](Self::from_tag).
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Docker => "DOCKER",
            Self::Process => "PROCESS",
            Self::External => "EXTERNAL",
            Self::Embedded => "EMBEDDED",
            Self::Loopback => "LOOPBACK",
        }
    }
}

impl fmt::Display for EnvironmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Schema of the `PROCESS` configuration string.
///
/// Unknown fields and duplicate environment variable names are rejected.
///
/// ```json
/// { "os": "linux", "arch": "amd64", "command": "/opt/boot", "env": { "K": "V" } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessConfig {
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub arch: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default, deserialize_with = "deserialize_unique_env")]
    pub env: Option<BTreeMap<String, String>>,
}

impl ProcessConfig {
    /// Parses a configuration string.
    pub fn parse(config: &str) -> Result<Self, EnvironmentError> {
        serde_json::from_str(config).map_err(|source| EnvironmentError::InvalidProcessConfig {
            config: config.to_string(),
            source,
        })
    }
}

struct UniqueEnv(BTreeMap<String, String>);

impl<'de> Deserialize<'de> for UniqueEnv {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct UniqueEnvVisitor;

        impl<'de> Visitor<'de> for UniqueEnvVisitor {
            type Value = UniqueEnv;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of environment variable names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut env = BTreeMap::new();
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    if env.contains_key(&key) {
                        return Err(de::Error::custom(format_args!(
                            "duplicate environment variable `{key}`"
                        )));
                    }
                    env.insert(key, value);
                }
                Ok(UniqueEnv(env))
            }
        }

        deserializer.deserialize_map(UniqueEnvVisitor)
    }
}

fn deserialize_unique_env<'de, D>(deserializer: D) -> Result<Option<BTreeMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<UniqueEnv>::deserialize(deserializer).map(|env| env.map(|UniqueEnv(env)| env))
}

/// Creates a docker environment for `container_image`.
pub fn create_docker_environment(container_image: &str) -> Result<Environment, EnvironmentError> {
    Environment::from_payload(
        urns::DOCKER_ENVIRONMENT_URN,
        &DockerPayload {
            container_image: container_image.to_string(),
        },
    )
}

/// Creates an external environment pointing at `url`.
pub fn create_external_environment(url: &str) -> Result<Environment, EnvironmentError> {
    Environment::from_payload(
        urns::EXTERNAL_ENVIRONMENT_URN,
        &ExternalPayload {
            endpoint: ApiServiceDescriptor {
                url: url.to_string(),
            },
        },
    )
}

/// Creates an embedded environment whose payload is `config`, or empty.
pub fn create_embedded_environment(config: Option<&str>) -> Environment {
    Environment {
        urn: urns::EMBEDDED_ENVIRONMENT_URN.to_string(),
        payload: config.unwrap_or_default().as_bytes().to_vec(),
    }
}

/// Creates a process environment from already-structured fields.
///
/// `None` fields are omitted from the payload; `Some("")` is kept as given.
///
/// # Examples
///
/// ```
/// use jobctl_environments::builder::create_process_environment;
/// use jobctl_environments::EnvironmentPayload;
///
/// let env = create_process_environment(Some("linux"), None, Some("/opt/boot"), None).unwrap();
/// let EnvironmentPayload::Process(process) = env.decode().unwrap() else {
///     panic!("expected a process payload");
/// };
/// assert_eq!(process.os.as_deref(), Some("linux"));
/// assert!(process.arch.is_none());
/// assert!(process.env.is_none());
/// ```
pub fn create_process_environment(
    os: Option<&str>,
    arch: Option<&str>,
    command: Option<&str>,
    env: Option<&BTreeMap<String, String>>,
) -> Result<Environment, EnvironmentError> {
    Environment::from_payload(
        urns::PROCESS_ENVIRONMENT_URN,
        &ProcessPayload {
            os: os.map(str::to_string),
            arch: arch.map(str::to_string),
            command: command.map(str::to_string),
            env: env.cloned(),
        },
    )
}

/// Parses a `PROCESS` configuration string and builds the environment.
pub fn create_process_environment_from_config(config: &str) -> Result<Environment, EnvironmentError> {
    let parsed = ProcessConfig::parse(config)?;
    create_process_environment(
        parsed.os.as_deref(),
        parsed.arch.as_deref(),
        parsed.command.as_deref(),
        parsed.env.as_ref(),
    )
}

/// Builds environments, falling back to an injected default harness.
///
/// The default is supplied at construction instead of being derived from
/// ambient process state, so two factories built from the same input always
/// agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentFactory {
    default_environment: Environment,
}

impl EnvironmentFactory {
    /// Creates a factory whose default is `default_environment`.
    pub fn new(default_environment: Environment) -> Self {
        Self {
            default_environment,
        }
    }

    /// Creates a factory whose default is a docker harness running `image`.
    pub fn with_harness_image(image: &str) -> Result<Self, EnvironmentError> {
        create_docker_environment(image).map(Self::new)
    }

    /// The environment used when no mode is given.
    pub fn default_environment(&self) -> &Environment {
        &self.default_environment
    }

    /// Builds the environment for `mode` and `config`.
    ///
    /// # Errors
    ///
    /// [`EnvironmentError::InvalidProcessConfig`] when the mode is `PROCESS`
    /// and the configuration is missing or malformed.
    ///
    /// # Examples
    ///
    /// ```
    /// use jobctl_environments::{urns, EnvironmentFactory};
    ///
    /// let factory = EnvironmentFactory::with_harness_image("harness:latest").unwrap();
    /// assert_eq!(
    ///     factory.create_or_get_default(None, None).unwrap(),
    ///     *factory.default_environment(),
    /// );
    /// let external = factory.create_or_get_default(Some("LOOPBACK"), Some("localhost:50000")).unwrap();
    /// assert_eq!(external.urn, urns::EXTERNAL_ENVIRONMENT_URN);
    /// ```
    pub fn create_or_get_default(
        &self,
        mode: Option<&str>,
        config: Option<&str>,
    ) -> Result<Environment, EnvironmentError> {
        let tag = match mode {
            None | Some("") => return Ok(self.default_environment.clone()),
            Some(tag) => tag,
        };

        match EnvironmentMode::from_tag(tag) {
            Some(EnvironmentMode::Embedded) => Ok(create_embedded_environment(config)),
            Some(EnvironmentMode::External | EnvironmentMode::Loopback) => {
                create_external_environment(config.unwrap_or_default())
            },
            Some(EnvironmentMode::Process) => {
                create_process_environment_from_config(config.unwrap_or_default())
            },
            Some(EnvironmentMode::Docker) => create_docker_environment(config.unwrap_or_default()),
            None => {
                tracing::debug!(mode = tag, "unrecognized environment mode, using docker");
                create_docker_environment(config.unwrap_or_default())
            },
        }
    }
}
