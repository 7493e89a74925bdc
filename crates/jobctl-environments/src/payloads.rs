//! Transform payloads that embed an environment id.
//!
//! Only the fields the resolver and its callers need are modeled. Unknown
//! fields are ignored on decode so newer submitters stay readable.

use serde::{Deserialize, Serialize};

use crate::components::FunctionSpec;

/// A user function plus the environment that must run it.
///
/// An empty `environment_id` means the function is environment-agnostic
/// (for example a well-known window function the runner implements itself).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SdkFunctionSpec {
    /// The function itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<FunctionSpec>,

    /// Id into the component table's environments.
    pub environment_id: String,
}

impl SdkFunctionSpec {
    /// A function spec bound to `environment_id` with no function body.
    pub fn with_environment(environment_id: impl Into<String>) -> Self {
        Self {
            spec: None,
            environment_id: environment_id.into(),
        }
    }
}

/// Payload of per-element processing transforms (ParDo and its splittable form).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParDoPayload {
    pub do_fn: SdkFunctionSpec,
    pub splittable: bool,
}

/// Payload of the grouped-combine family of transforms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CombinePayload {
    pub combine_fn: SdkFunctionSpec,
    pub accumulator_coder_id: String,
}

/// Payload of a source read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReadPayload {
    pub source: SdkFunctionSpec,
    pub bounded: bool,
}

/// Payload of a window-assignment transform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WindowIntoPayload {
    pub window_fn: SdkFunctionSpec,
}
