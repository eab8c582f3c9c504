use super::*;

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn empty_object_gives_defaults() {
    let s: StudioSettings = serde_json::from_str("{}").unwrap();
    assert_eq!(s, StudioSettings::default());
    assert_eq!(s.gemini_model, "gemini-3-flash-preview");
    assert_eq!(s.font_ready_timeout(), Some(Duration::from_secs(10)));
    assert_eq!(s.compose_opts().logical_width, 768.0);
}

#[test]
fn zero_timeout_means_unbounded() {
    let s: StudioSettings = serde_json::from_str(r#"{"font_ready_timeout_ms":0}"#).unwrap();
    assert_eq!(s.export_opts().font_ready_timeout, None);
}

#[test]
fn unknown_keys_are_rejected() {
    assert!(serde_json::from_str::<StudioSettings>(r#"{"pixelRatio":3}"#).is_err());
}

#[test]
fn api_key_is_never_serialized() {
    let s = StudioSettings {
        api_key: Some("secret".into()),
        ..StudioSettings::default()
    };
    let json = serde_json::to_string(&s).unwrap();
    assert!(!json.contains("secret"));
    assert!(!json.contains("api_key"));
    assert!(!format!("{s:?}").contains("secret"));
}

#[test]
fn env_fills_missing_key_in_order() {
    let s = StudioSettings::default().with_env(|name| match name {
        "GEMINI_API_KEY" => Some(String::new()),
        "API_KEY" => Some("fallback".into()),
        _ => None,
    });
    assert_eq!(s.api_key.as_deref(), Some("fallback"));

    let s = StudioSettings::default().with_env(|name| Some(format!("{name}-value")));
    assert_eq!(s.api_key.as_deref(), Some("GEMINI_API_KEY-value"));

    let s = StudioSettings::default().with_env(no_env);
    assert_eq!(s.api_key, None);
}

#[test]
fn file_key_wins_over_env() {
    let s: StudioSettings = serde_json::from_str(r#"{"api_key":"from-file"}"#).unwrap();
    let s = s.with_env(|_| Some("from-env".into()));
    assert_eq!(s.api_key.as_deref(), Some("from-file"));
}

#[test]
fn from_path_reads_json_and_reports_bad_files() {
    let dir = std::env::temp_dir().join(format!("urdu-post-settings-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let good = dir.join("good.json");
    std::fs::write(&good, r#"{"pixel_ratio":3.0,"output_dir":"out"}"#).unwrap();
    let s = StudioSettings::from_path(&good).unwrap();
    assert_eq!(s.pixel_ratio, 3.0);
    assert_eq!(s.output_dir, PathBuf::from("out"));

    let bad = dir.join("bad.json");
    std::fs::write(&bad, "not json").unwrap();
    assert!(matches!(
        StudioSettings::from_path(&bad),
        Err(PostError::Validation(_))
    ));
    assert!(matches!(
        StudioSettings::from_path(&dir.join("missing.json")),
        Err(PostError::Other(_))
    ));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn validate_rejects_non_positive_ratio() {
    let s = StudioSettings {
        pixel_ratio: 0.0,
        ..StudioSettings::default()
    };
    assert!(matches!(s.validate(), Err(PostError::Validation(_))));
}
