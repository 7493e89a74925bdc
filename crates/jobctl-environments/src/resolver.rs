//! Per-transform environment resolution.
//!
//! Resolution dispatches on the transform urn through a fixed registry of
//! extractors. Each extractor decodes the payload type its urn declares and
//! returns the embedded environment id. Urns outside the registry go to a
//! default extractor that reports no environment, so resolution is total.
//!
//! Outcomes:
//!
//! - empty environment id: `Ok(None)`
//! - id present in the component table: `Ok(Some(environment))`
//! - id missing from the table: [`EnvironmentError::UnknownEnvironment`]
//! - payload fails to decode: [`EnvironmentError::MalformedTransformPayload`]
//!
//! Resolution is a pure function of the transform and the table.

use std::collections::BTreeMap;

use crate::codec::decode_message;
use crate::components::{ComponentTable, Components, PTransform};
use crate::environment::Environment;
use crate::error::EnvironmentError;
use crate::payloads::{CombinePayload, ParDoPayload, ReadPayload, WindowIntoPayload};
use crate::urns;

type EnvironmentIdExtractor = fn(&PTransform) -> Result<String, serde_json::Error>;

static KNOWN_EXTRACTORS: &[(&str, EnvironmentIdExtractor)] = &[
    (urns::COMBINE_PER_KEY_TRANSFORM_URN, combine_extractor),
    (urns::COMBINE_PER_KEY_PRECOMBINE_TRANSFORM_URN, combine_extractor),
    (urns::COMBINE_PER_KEY_MERGE_ACCUMULATORS_TRANSFORM_URN, combine_extractor),
    (urns::COMBINE_PER_KEY_EXTRACT_OUTPUTS_TRANSFORM_URN, combine_extractor),
    (urns::PAR_DO_TRANSFORM_URN, par_do_extractor),
    (urns::SPLITTABLE_PROCESS_ELEMENTS_URN, par_do_extractor),
    (urns::READ_TRANSFORM_URN, read_extractor),
    (urns::ASSIGN_WINDOWS_TRANSFORM_URN, window_extractor),
];

fn extractor_for(urn: &str) -> EnvironmentIdExtractor {
    KNOWN_EXTRACTORS
        .iter()
        .find(|(known, _)| *known == urn)
        .map_or(default_extractor as EnvironmentIdExtractor, |(_, extractor)| *extractor)
}

fn default_extractor(_transform: &PTransform) -> Result<String, serde_json::Error> {
    Ok(String::new())
}

fn par_do_extractor(transform: &PTransform) -> Result<String, serde_json::Error> {
    decode_message::<ParDoPayload>(&transform.spec.payload).map(|p| p.do_fn.environment_id)
}

fn combine_extractor(transform: &PTransform) -> Result<String, serde_json::Error> {
    decode_message::<CombinePayload>(&transform.spec.payload).map(|p| p.combine_fn.environment_id)
}

fn read_extractor(transform: &PTransform) -> Result<String, serde_json::Error> {
    decode_message::<ReadPayload>(&transform.spec.payload).map(|p| p.source.environment_id)
}

fn window_extractor(transform: &PTransform) -> Result<String, serde_json::Error> {
    decode_message::<WindowIntoPayload>(&transform.spec.payload).map(|p| p.window_fn.environment_id)
}

/// Returns `true` if the resolver has a payload extractor for `urn`.
pub fn is_known_urn(urn: &str) -> bool {
    KNOWN_EXTRACTORS.iter().any(|(known, _)| *known == urn)
}

/// Extracts the raw environment id from a transform payload.
///
/// Returns `Ok(None)` when the payload carries no environment id.
pub fn environment_id(
    transform_id: &str,
    transform: &PTransform,
) -> Result<Option<String>, EnvironmentError> {
    let urn = transform.spec.urn.as_str();
    let environment_id =
        extractor_for(urn)(transform).map_err(|source| EnvironmentError::MalformedTransformPayload {
            transform_id: transform_id.to_string(),
            urn: urn.to_string(),
            source,
        })?;
    Ok(Some(environment_id).filter(|id| !id.is_empty()))
}

/// Resolves the environment of the transform `transform_id` in `components`.
///
/// # Examples
///
/// ```
/// use jobctl_environments::{resolver, urns, Components, PTransform};
/// use jobctl_environments::payloads::{SdkFunctionSpec, WindowIntoPayload};
///
/// // A well-known window function has no environment.
/// let payload = WindowIntoPayload { window_fn: SdkFunctionSpec::default() };
/// let mut components = Components::default();
/// components.transforms.insert(
///     "window".to_string(),
///     PTransform::with_payload("Window", urns::ASSIGN_WINDOWS_TRANSFORM_URN, &payload).unwrap(),
/// );
/// assert_eq!(resolver::resolve("window", &components).unwrap(), None);
/// ```
pub fn resolve<T>(transform_id: &str, components: &T) -> Result<Option<Environment>, EnvironmentError>
where
    T: ComponentTable + ?Sized,
{
    let transform = components.transform(transform_id)?;
    resolve_transform(transform_id, transform, components)
}

/// Resolves the environment of an already looked-up transform.
pub fn resolve_transform<T>(
    transform_id: &str,
    transform: &PTransform,
    components: &T,
) -> Result<Option<Environment>, EnvironmentError>
where
    T: ComponentTable + ?Sized,
{
    match environment_id(transform_id, transform)? {
        None => {
            tracing::trace!(transform_id, urn = %transform.spec.urn, "transform has no environment");
            Ok(None)
        },
        Some(environment_id) => components.environment(&environment_id).cloned().map(Some),
    }
}

/// Resolves every transform of `components` that has an environment.
///
/// Fails on the first malformed payload or dangling environment id.
pub fn bindings(components: &Components) -> Result<BTreeMap<String, Environment>, EnvironmentError> {
    let mut bound = BTreeMap::new();
    for (transform_id, transform) in &components.transforms {
        if let Some(environment) = resolve_transform(transform_id, transform, components)? {
            bound.insert(transform_id.clone(), environment);
        }
    }
    Ok(bound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_registered_urn_is_known() {
        for (urn, _) in KNOWN_EXTRACTORS {
            assert!(is_known_urn(urn), "{urn} should be known");
        }
        assert!(!is_known_urn(urns::GROUP_BY_KEY_TRANSFORM_URN));
        assert!(!is_known_urn(""));
    }

    #[test]
    fn default_extractor_ignores_payload() {
        let transform = PTransform {
            spec: crate::components::FunctionSpec {
                urn: urns::GROUP_BY_KEY_TRANSFORM_URN.to_string(),
                payload: b"not a payload".to_vec(),
            },
            ..PTransform::default()
        };
        assert_eq!(environment_id("gbk", &transform).unwrap(), None);
    }

    #[test]
    fn empty_payload_has_no_environment() {
        let transform = PTransform {
            spec: crate::components::FunctionSpec {
                urn: urns::PAR_DO_TRANSFORM_URN.to_string(),
                payload: Vec::new(),
            },
            ..PTransform::default()
        };
        assert_eq!(environment_id("pardo", &transform).unwrap(), None);
    }
}
