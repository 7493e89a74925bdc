//! Pipeline graph types and the component table lookup.
//!
//! The graph's transform semantics belong to the submitter and the executor.
//! This module models just enough of it for environment resolution: each
//! transform's urn and payload, and the table of environments they reference.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::environment::{Environment, EnvironmentPayload};
use crate::error::EnvironmentError;

/// A urn plus its opaque payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FunctionSpec {
    /// Operation kind.
    pub urn: String,

    /// Kind-specific payload bytes (base64 on the JSON wire).
    #[serde(with = "crate::codec::base64_bytes", skip_serializing_if = "Vec::is_empty")]
    pub payload: Vec<u8>,
}

/// One node of the transform graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PTransform {
    /// Human-readable, graph-unique name.
    pub unique_name: String,

    /// Operation kind and payload. Composite transforms may leave it empty.
    pub spec: FunctionSpec,

    /// Ids of child transforms for composites.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subtransforms: Vec<String>,

    /// Local input name to collection id.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, String>,

    /// Local output name to collection id.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, String>,
}

impl PTransform {
    /// Builds a transform whose spec payload is the encoding of `payload`.
    pub fn with_payload<T: Serialize>(
        unique_name: impl Into<String>,
        urn: impl Into<String>,
        payload: &T,
    ) -> Result<Self, EnvironmentError> {
        Ok(Self {
            unique_name: unique_name.into(),
            spec: FunctionSpec {
                urn: urn.into(),
                payload: crate::codec::encode_message(payload).map_err(EnvironmentError::Encode)?,
            },
            ..Self::default()
        })
    }
}

/// Lookup of transforms and environments by id.
///
/// Missing keys are errors: a dangling reference inside a submitted graph
/// is a referential-integrity violation, not an absent binding.
pub trait ComponentTable {
    /// Returns the transform with the given id.
    fn transform(&self, transform_id: &str) -> Result<&PTransform, EnvironmentError>;

    /// Returns the environment with the given id.
    fn environment(&self, environment_id: &str) -> Result<&Environment, EnvironmentError>;
}

/// The component table of a submitted pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Components {
    pub transforms: BTreeMap<String, PTransform>,
    pub environments: BTreeMap<String, Environment>,
}

impl ComponentTable for Components {
    fn transform(&self, transform_id: &str) -> Result<&PTransform, EnvironmentError> {
        self.transforms
            .get(transform_id)
            .ok_or_else(|| EnvironmentError::UnknownTransform {
                transform_id: transform_id.to_string(),
            })
    }

    fn environment(&self, environment_id: &str) -> Result<&Environment, EnvironmentError> {
        self.environments
            .get(environment_id)
            .ok_or_else(|| EnvironmentError::UnknownEnvironment {
                environment_id: environment_id.to_string(),
            })
    }
}

/// A submitted pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Pipeline {
    pub components: Components,
    pub root_transform_ids: Vec<String>,
}

/// Shared, read-only view over a submitted pipeline.
///
/// Cheap to clone and safe to hand to executors running on other tasks.
/// Holds the pipeline once; lookups behave exactly like its [`Components`].
#[derive(Debug, Clone, Default)]
pub struct RehydratedComponents {
    pipeline: Arc<Pipeline>,
}

impl RehydratedComponents {
    /// Wraps a bare component table, as a pipeline without roots.
    pub fn new(components: Components) -> Self {
        Self::from_pipeline(Pipeline {
            components,
            root_transform_ids: Vec::new(),
        })
    }

    /// Takes ownership of `pipeline` without copying its components.
    pub fn from_pipeline(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    /// The pipeline this view was built from.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// The underlying component table.
    pub fn components(&self) -> &Components {
        &self.pipeline.components
    }

    /// Looks up an environment and decodes its payload.
    pub fn decoded_environment(
        &self,
        environment_id: &str,
    ) -> Result<EnvironmentPayload, EnvironmentError> {
        self.components().environment(environment_id)?.decode()
    }
}

impl From<Components> for RehydratedComponents {
    fn from(components: Components) -> Self {
        Self::new(components)
    }
}

impl From<Pipeline> for RehydratedComponents {
    fn from(pipeline: Pipeline) -> Self {
        Self::from_pipeline(pipeline)
    }
}

impl ComponentTable for RehydratedComponents {
    fn transform(&self, transform_id: &str) -> Result<&PTransform, EnvironmentError> {
        self.components().transform(transform_id)
    }

    fn environment(&self, environment_id: &str) -> Result<&Environment, EnvironmentError> {
        self.components().environment(environment_id)
    }
}
