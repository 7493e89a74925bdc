//! Execution environments for jobctl pipelines.
//!
//! This crate answers one question for a submitted pipeline: which runtime
//! environment executes a given transform. It has two halves:
//!
//! - [`builder`] constructs [`Environment`] descriptors from a deployment
//!   mode tag (`DOCKER`, `PROCESS`, `EXTERNAL`, `LOOPBACK`, `EMBEDDED`) and a
//!   mode-specific configuration string.
//! - [`resolver`] recovers the environment bound to a transform by decoding
//!   the transform's typed payload and looking the environment id up in the
//!   pipeline's component table.
//!
//! # Module Organization
//!
//! - [`environment`] - The [`Environment`] descriptor and its typed payloads
//! - [`components`] - Pipeline graph types and the [`ComponentTable`] lookup trait
//! - [`payloads`] - Transform payloads that carry an environment id
//! - [`urns`] - Environment and transform urn constants
//! - [`error`] - [`EnvironmentError`]
//!
//! # Examples
//!
//! ```
//! use jobctl_environments::{resolver, urns, Components, EnvironmentFactory, PTransform};
//! use jobctl_environments::payloads::{ParDoPayload, SdkFunctionSpec};
//!
//! let factory = EnvironmentFactory::with_harness_image("apache/beam_java_sdk:2.9.0").unwrap();
//! let docker = factory.create_or_get_default(Some("DOCKER"), Some("my/image:1")).unwrap();
//!
//! let payload = ParDoPayload {
//!     do_fn: SdkFunctionSpec::with_environment("env-1"),
//!     ..ParDoPayload::default()
//! };
//! let mut components = Components::default();
//! components.environments.insert("env-1".to_string(), docker.clone());
//! components.transforms.insert(
//!     "pardo".to_string(),
//!     PTransform::with_payload("ParDo", urns::PAR_DO_TRANSFORM_URN, &payload).unwrap(),
//! );
//!
//! let resolved = resolver::resolve("pardo", &components).unwrap();
//! assert_eq!(resolved, Some(docker));
//! ```

pub mod builder;
pub mod components;
pub mod environment;
pub mod error;
pub mod payloads;
pub mod resolver;
pub mod urns;

mod codec;

pub use builder::{EnvironmentFactory, EnvironmentMode, ProcessConfig};
pub use components::{ComponentTable, Components, FunctionSpec, PTransform, Pipeline, RehydratedComponents};
pub use environment::{
    ApiServiceDescriptor, DockerPayload, Environment, EnvironmentPayload, ExternalPayload,
    ProcessPayload,
};
pub use error::EnvironmentError;
