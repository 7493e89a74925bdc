//! Urn constants for environments and for the transforms that carry an
//! environment id in their payload.

/// Container environment; payload is a [`DockerPayload`](crate::DockerPayload).
pub const DOCKER_ENVIRONMENT_URN: &str = "beam:env:docker:v1";

/// Local process environment; payload is a [`ProcessPayload`](crate::ProcessPayload).
pub const PROCESS_ENVIRONMENT_URN: &str = "beam:env:process:v1";

/// Out-of-process service; payload is an [`ExternalPayload`](crate::ExternalPayload).
pub const EXTERNAL_ENVIRONMENT_URN: &str = "beam:env:external:v1";

/// In-process harness used for testing; payload is raw bytes.
pub const EMBEDDED_ENVIRONMENT_URN: &str = "beam:env:embedded:v1";

pub const COMBINE_PER_KEY_TRANSFORM_URN: &str = "beam:transform:combine_per_key:v1";
pub const COMBINE_PER_KEY_PRECOMBINE_TRANSFORM_URN: &str =
    "beam:transform:combine_per_key_precombine:v1";
pub const COMBINE_PER_KEY_MERGE_ACCUMULATORS_TRANSFORM_URN: &str =
    "beam:transform:combine_per_key_merge_accumulators:v1";
pub const COMBINE_PER_KEY_EXTRACT_OUTPUTS_TRANSFORM_URN: &str =
    "beam:transform:combine_per_key_extract_outputs:v1";
pub const PAR_DO_TRANSFORM_URN: &str = "beam:transform:pardo:v1";
pub const SPLITTABLE_PROCESS_ELEMENTS_URN: &str =
    "beam:transform:sdf_process_keyed_elements:v1";
pub const READ_TRANSFORM_URN: &str = "beam:transform:read:v1";
pub const ASSIGN_WINDOWS_TRANSFORM_URN: &str = "beam:transform:window_into:v1";

/// Transforms that never carry an environment. Listed for callers building
/// graphs; the resolver handles them through its default extractor.
pub const GROUP_BY_KEY_TRANSFORM_URN: &str = "beam:transform:group_by_key:v1";
pub const FLATTEN_TRANSFORM_URN: &str = "beam:transform:flatten:v1";
pub const IMPULSE_TRANSFORM_URN: &str = "beam:transform:impulse:v1";
