//! Transform environment resolution tests.
//!
//! Covers every registered transform kind, the empty-id "no binding" case,
//! dangling environment ids, malformed payloads, and determinism.

use jobctl_environments::builder::{create_docker_environment, create_external_environment};
use jobctl_environments::payloads::{
    CombinePayload, ParDoPayload, ReadPayload, SdkFunctionSpec, WindowIntoPayload,
};
use jobctl_environments::{
    resolver, urns, ComponentTable, Components, EnvironmentError, FunctionSpec, PTransform,
    Pipeline, RehydratedComponents,
};
use pretty_assertions::assert_eq;

// ─── Helpers ────────────────────────────────────────────────────────────────

fn components_with_env(env_id: &str) -> Components {
    let mut components = Components::default();
    components.environments.insert(
        env_id.to_string(),
        create_docker_environment("java:harness").unwrap(),
    );
    components
}

fn insert(components: &mut Components, id: &str, transform: PTransform) {
    components.transforms.insert(id.to_string(), transform);
}

fn raw_transform(urn: &str, payload: &[u8]) -> PTransform {
    PTransform {
        unique_name: "raw".to_string(),
        spec: FunctionSpec {
            urn: urn.to_string(),
            payload: payload.to_vec(),
        },
        ..PTransform::default()
    }
}

// ─── Kind-by-kind extraction ────────────────────────────────────────────────

mod extraction {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn pardo_resolves_do_fn_environment() {
        let mut components = components_with_env("env");
        let payload = ParDoPayload {
            do_fn: SdkFunctionSpec::with_environment("env"),
            splittable: false,
        };
        insert(
            &mut components,
            "t",
            PTransform::with_payload("ParDo", urns::PAR_DO_TRANSFORM_URN, &payload).unwrap(),
        );
        let env = resolver::resolve("t", &components).unwrap().unwrap();
        assert_eq!(env.urn, urns::DOCKER_ENVIRONMENT_URN);
    }

    #[test]
    fn splittable_pardo_uses_pardo_payload() {
        let mut components = components_with_env("env");
        let payload = ParDoPayload {
            do_fn: SdkFunctionSpec::with_environment("env"),
            splittable: true,
        };
        insert(
            &mut components,
            "sdf",
            PTransform::with_payload("Sdf", urns::SPLITTABLE_PROCESS_ELEMENTS_URN, &payload)
                .unwrap(),
        );
        assert!(resolver::resolve("sdf", &components).unwrap().is_some());
    }

    #[test]
    fn every_combine_variant_resolves_combine_fn_environment() {
        for urn in [
            urns::COMBINE_PER_KEY_TRANSFORM_URN,
            urns::COMBINE_PER_KEY_PRECOMBINE_TRANSFORM_URN,
            urns::COMBINE_PER_KEY_MERGE_ACCUMULATORS_TRANSFORM_URN,
            urns::COMBINE_PER_KEY_EXTRACT_OUTPUTS_TRANSFORM_URN,
        ] {
            let mut components = components_with_env("env");
            let payload = CombinePayload {
                combine_fn: SdkFunctionSpec::with_environment("env"),
                accumulator_coder_id: "coder".to_string(),
            };
            insert(
                &mut components,
                "combine",
                PTransform::with_payload("Combine", urn, &payload).unwrap(),
            );
            assert!(
                resolver::resolve("combine", &components).unwrap().is_some(),
                "{urn} should resolve"
            );
        }
    }

    #[test]
    fn read_resolves_source_environment() {
        let mut components = components_with_env("env");
        let payload = ReadPayload {
            source: SdkFunctionSpec::with_environment("env"),
            bounded: true,
        };
        insert(
            &mut components,
            "read",
            PTransform::with_payload("Read", urns::READ_TRANSFORM_URN, &payload).unwrap(),
        );
        assert!(resolver::resolve("read", &components).unwrap().is_some());
    }

    #[test]
    fn window_into_resolves_window_fn_environment() {
        let mut components = components_with_env("env");
        let payload = WindowIntoPayload {
            window_fn: SdkFunctionSpec::with_environment("env"),
        };
        insert(
            &mut components,
            "window",
            PTransform::with_payload("Window", urns::ASSIGN_WINDOWS_TRANSFORM_URN, &payload)
                .unwrap(),
        );
        assert!(resolver::resolve("window", &components).unwrap().is_some());
    }
}

// ─── No binding ─────────────────────────────────────────────────────────────

mod no_binding {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn window_with_environment_agnostic_window_fn() {
        let mut components = components_with_env("env");
        let payload = WindowIntoPayload {
            window_fn: SdkFunctionSpec::default(),
        };
        insert(
            &mut components,
            "window",
            PTransform::with_payload("Window", urns::ASSIGN_WINDOWS_TRANSFORM_URN, &payload)
                .unwrap(),
        );
        assert_eq!(resolver::resolve("window", &components).unwrap(), None);
    }

    #[test]
    fn unregistered_urn_has_no_environment() {
        let mut components = components_with_env("env");
        insert(
            &mut components,
            "gbk",
            raw_transform(urns::GROUP_BY_KEY_TRANSFORM_URN, br#"{"doFn":{"environmentId":"env"}}"#),
        );
        assert_eq!(resolver::resolve("gbk", &components).unwrap(), None);
    }

    #[test]
    fn composite_without_spec_has_no_environment() {
        let mut components = Components::default();
        insert(&mut components, "composite", PTransform::default());
        assert_eq!(resolver::resolve("composite", &components).unwrap(), None);
    }
}

// ─── Fatal failures ─────────────────────────────────────────────────────────

mod failures {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn dangling_environment_id_is_fatal() {
        let mut components = components_with_env("env");
        let payload = ParDoPayload {
            do_fn: SdkFunctionSpec::with_environment("missing"),
            splittable: false,
        };
        insert(
            &mut components,
            "t",
            PTransform::with_payload("ParDo", urns::PAR_DO_TRANSFORM_URN, &payload).unwrap(),
        );
        let err = resolver::resolve("t", &components).unwrap_err();
        assert!(matches!(
            err,
            EnvironmentError::UnknownEnvironment { ref environment_id } if environment_id == "missing"
        ));
        assert!(err.to_string().contains("unknown environment id"));
    }

    #[test]
    fn malformed_payload_is_fatal() {
        let mut components = components_with_env("env");
        insert(
            &mut components,
            "t",
            raw_transform(urns::PAR_DO_TRANSFORM_URN, b"\xff\xfe garbage"),
        );
        let err = resolver::resolve("t", &components).unwrap_err();
        assert!(matches!(
            err,
            EnvironmentError::MalformedTransformPayload { ref transform_id, .. } if transform_id == "t"
        ));
    }

    #[test]
    fn wrongly_typed_payload_is_fatal() {
        let mut components = components_with_env("env");
        insert(
            &mut components,
            "t",
            raw_transform(urns::READ_TRANSFORM_URN, br#"{"source":"not-an-object"}"#),
        );
        assert!(resolver::resolve("t", &components).is_err());
    }

    #[test]
    fn unknown_transform_is_fatal() {
        let components = Components::default();
        assert!(matches!(
            resolver::resolve("nope", &components),
            Err(EnvironmentError::UnknownTransform { .. })
        ));
    }
}

// ─── Rehydrated view and bindings ───────────────────────────────────────────

mod views {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pipeline_components() -> Components {
        let mut components = components_with_env("java");
        components.environments.insert(
            "loopback".to_string(),
            create_external_environment("localhost:50000").unwrap(),
        );
        insert(
            &mut components,
            "pardo",
            PTransform::with_payload(
                "ParDo",
                urns::PAR_DO_TRANSFORM_URN,
                &ParDoPayload {
                    do_fn: SdkFunctionSpec::with_environment("java"),
                    splittable: false,
                },
            )
            .unwrap(),
        );
        insert(
            &mut components,
            "read",
            PTransform::with_payload(
                "Read",
                urns::READ_TRANSFORM_URN,
                &ReadPayload {
                    source: SdkFunctionSpec::with_environment("loopback"),
                    bounded: false,
                },
            )
            .unwrap(),
        );
        insert(
            &mut components,
            "gbk",
            raw_transform(urns::GROUP_BY_KEY_TRANSFORM_URN, b""),
        );
        components
    }

    #[test]
    fn rehydrated_view_matches_components() {
        let components = pipeline_components();
        let view = RehydratedComponents::new(components.clone());
        for id in ["pardo", "read", "gbk"] {
            let transform = view.transform(id).unwrap();
            assert_eq!(
                resolver::resolve_transform(id, transform, &view).unwrap(),
                resolver::resolve(id, &components).unwrap()
            );
        }
    }

    #[test]
    fn resolution_is_deterministic() {
        let components = pipeline_components();
        let first = resolver::resolve("read", &components).unwrap();
        for _ in 0..10 {
            assert_eq!(resolver::resolve("read", &components).unwrap(), first);
        }
    }

    #[test]
    fn bindings_skip_transforms_without_environment() {
        let bound = resolver::bindings(&pipeline_components()).unwrap();
        assert_eq!(
            bound.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["pardo", "read"]
        );
        assert_eq!(bound["read"].urn, urns::EXTERNAL_ENVIRONMENT_URN);
    }

    #[test]
    fn view_over_pipeline_shares_one_component_table() {
        let pipeline = Pipeline {
            components: pipeline_components(),
            root_transform_ids: vec!["read".to_string()],
        };
        let view = RehydratedComponents::from_pipeline(pipeline);
        let shared = view.clone();
        assert!(std::ptr::eq(view.components(), &view.pipeline().components));
        assert!(std::ptr::eq(view.components(), shared.components()));
        assert_eq!(view.pipeline().root_transform_ids, vec!["read"]);
        assert_eq!(
            resolver::resolve("read", &view).unwrap().unwrap().urn,
            urns::EXTERNAL_ENVIRONMENT_URN
        );
    }

    #[test]
    fn decoded_environment_from_view() {
        let view = RehydratedComponents::new(pipeline_components());
        assert!(view.decoded_environment("loopback").is_ok());
        assert!(view.decoded_environment("missing").is_err());
    }
}
