#[cfg(test)]
mod tests {
    use std::{path::Path, time::Duration};

    use glide_world::WindowProperty;

    use crate::*;

    #[test]
    fn minimal_effect_parses_with_defaults() {
        let ron = r#"(
            effects: [
                (
                    name: "fade",
                    added: (transitions: [(property: opacity, from: 0.0, to: 1.0, duration: 250)]),
                ),
            ],
        )"#;
        let cfg = load_from_str(ron, None).unwrap();
        assert_eq!(cfg.duration_scale, 1.0);
        let fade = cfg.effect("fade").unwrap();
        assert!(fade.enabled);
        assert!(fade.supersede);
        assert_eq!(fade.windows, WindowMatch::Any);
        let t = &fade.added.as_ref().unwrap().transitions[0];
        assert_eq!(t.from, Some(0.0));
        assert_eq!(t.duration, Duration::from_millis(250));
        assert_eq!(t.curve, Curve::Linear);
        assert_eq!(t.delay, Duration::ZERO);
        assert_eq!(fade.entrance_slot(), slots::ENTRANCE);
    }

    #[test]
    fn property_rule_with_retarget_paths() {
        let ron = r#"(
            duration_scale: 0.5,
            effects: [
                (
                    name: "min",
                    windows: classes(["org.kde.dolphin"]),
                    properties: [
                        (
                            property: minimized,
                            animation: (
                                slot: "shrink",
                                transitions: [(property: scale, to: 0.2, duration: 300, curve: out_cubic)],
                            ),
                            retarget: (to: 0.1, duration: 100),
                            on_unset: retarget((to: 1.0, duration: 200)),
                        ),
                    ],
                ),
            ],
        )"#;
        let cfg = load_from_str(ron, None).unwrap();
        assert_eq!(cfg.duration_scale, 0.5);
        let effect = cfg.effect("min").unwrap();
        assert!(effect.windows.matches("org.kde.dolphin"));
        assert!(!effect.windows.matches("org.kde"));
        let rule = effect.property_rule(WindowProperty::Minimized).unwrap();
        assert_eq!(rule.slot(), "shrink");
        assert_eq!(
            rule.retarget,
            Some(RetargetSpec {
                to: 0.1,
                duration: Duration::from_millis(100)
            })
        );
        assert!(matches!(rule.on_unset, UnsetAction::Retarget(r) if r.to == 1.0));
        assert!(effect.property_rule(WindowProperty::Fullscreen).is_none());
    }

    #[test]
    fn unknown_field_is_a_parse_error_with_location() {
        let ron = "(\n  effects: [\n    (name: \"x\", colour: 3),\n  ],\n)";
        match load_from_str(ron, None) {
            Err(Error::Parse {
                line, excerpt, ..
            }) => {
                assert_eq!(line, 3);
                assert!(excerpt.contains("colour"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn zero_duration_is_rejected() {
        let ron = r#"(effects: [(name: "bad", closed: (transitions: [(property: opacity, to: 0.0, duration: 0)]))])"#;
        let err = load_from_str(ron, None).unwrap_err();
        match &err {
            Error::Validation {
                effect, message, ..
            } => {
                assert_eq!(effect.as_deref(), Some("bad"));
                assert!(message.contains("zero duration"), "{message}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn empty_transitions_are_rejected() {
        let ron = r#"(effects: [(name: "bad", added: (transitions: []))])"#;
        assert!(matches!(
            load_from_str(ron, None),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn duplicate_names_and_bad_scale_are_rejected() {
        let dup = r#"(effects: [(name: "a"), (name: "a")])"#;
        assert!(matches!(
            load_from_str(dup, None),
            Err(Error::Validation { message, .. }) if message.contains("duplicate")
        ));
        let scale = r#"(duration_scale: 0.0, effects: [])"#;
        assert!(matches!(
            load_from_str(scale, None),
            Err(Error::Validation { effect: None, .. })
        ));
    }

    #[test]
    fn builtin_survives_serialization() {
        let builtin = EffectsConfig::builtin();
        let text = to_ron_string(&builtin).unwrap();
        let back = load_from_str(&text, None).unwrap();
        assert_eq!(back, builtin);
    }

    #[test]
    fn builtin_enables_only_logout() {
        let builtin = EffectsConfig::builtin();
        let enabled: Vec<_> = builtin.enabled().map(|e| e.name.as_str()).collect();
        assert_eq!(enabled, vec!["logout"]);
        let logout = builtin.effect("logout").unwrap();
        assert!(logout.windows.matches(LOGOUT_CLASS));
        assert!(!logout.windows.matches("konsole"));
    }

    #[test]
    fn set_enabled_toggles_by_name() {
        let mut cfg = EffectsConfig::builtin();
        assert!(cfg.set_enabled("minimize", true));
        assert!(cfg.effect("minimize").unwrap().enabled);
        assert!(!cfg.set_enabled("missing", true));
    }

    #[test]
    fn missing_file_is_read_error() {
        let path = Path::new("/nonexistent/glide/effects.ron");
        let err = load_from_path(path).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
        assert_eq!(err.path(), Some(path));
    }
}
