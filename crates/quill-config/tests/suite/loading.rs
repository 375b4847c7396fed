use pretty_assertions::assert_eq;
use quill_config::{ConfigError, ConfigWarning, LoggingConfig, QuillConfig};
use quill_resolve::ResolveOptions;

#[test]
fn empty_config_uses_defaults() {
    let config = QuillConfig::load_from_str("").unwrap();
    assert_eq!(config, QuillConfig::default());
    assert!(config.resolve.varargs);
    assert!(config.resolve.default_params);
    assert!(!config.resolve.named_args_as_leading_map);
    assert_eq!(config.logging.level, "warn");
    assert!(config.logging.stderr);
}

#[test]
fn loads_resolve_and_logging_sections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quill.toml");
    std::fs::write(
        &path,
        r#"
[resolve]
varargs = false
named_args_as_leading_map = true

[logging]
level = "debug"
json = true
"#,
    )
    .unwrap();

    let config = QuillConfig::load_from_path(&path).unwrap();
    assert_eq!(
        config.resolve,
        ResolveOptions {
            varargs: false,
            default_params: true,
            named_args_as_leading_map: true,
        }
    );
    assert_eq!(
        config.logging,
        LoggingConfig {
            level: "debug".to_string(),
            json: true,
            ..LoggingConfig::default()
        }
    );
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.toml");

    let err = QuillConfig::load_from_path(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }), "{err:?}");
    assert!(err.to_string().contains("nope.toml"), "{err}");
}

#[test]
fn unknown_keys_are_reported_not_rejected() {
    let text = r#"
[resolve]
varargz = false

[extra]
answer = 42
"#;
    let (config, diagnostics) = QuillConfig::load_from_str_with_diagnostics(text).unwrap();
    assert_eq!(config, QuillConfig::default());
    assert_eq!(
        diagnostics.unknown_keys,
        vec!["extra".to_string(), "resolve.varargz".to_string()]
    );
    assert!(diagnostics.warnings.is_empty());
}

#[test]
fn invalid_logging_level_is_a_warning() {
    let text = "[logging]\nlevel = \"quill=loud\"\n";
    let (config, diagnostics) = QuillConfig::load_from_str_with_diagnostics(text).unwrap();
    assert_eq!(config.logging.level, "quill=loud");
    assert_eq!(
        diagnostics.warnings,
        vec![ConfigWarning::LoggingLevelInvalid {
            value: "quill=loud".to_string(),
            normalized: "quill=loud".to_string(),
        }]
    );
}

#[test]
fn missing_log_directory_is_a_warning() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("missing").join("quill.log");
    let text = format!("[logging]\nfile = {:?}\n", file.display().to_string());

    let (_, diagnostics) = QuillConfig::load_from_str_with_diagnostics(&text).unwrap();
    assert_eq!(
        diagnostics.warnings,
        vec![ConfigWarning::LoggingFileDirectoryMissing {
            path: dir.path().join("missing"),
        }]
    );
}
