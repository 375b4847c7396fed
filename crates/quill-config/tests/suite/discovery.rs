use std::ffi::OsString;
use std::sync::Mutex;

use quill_config::{discover_config_path, load_for_dir, QuillConfig, QUILL_CONFIG_ENV_VAR};

static ENV_LOCK: Mutex<()> = Mutex::new(());

struct EnvVarGuard {
    key: &'static str,
    prev: Option<OsString>,
}

impl EnvVarGuard {
    fn set(key: &'static str, value: &std::path::Path) -> Self {
        let prev = std::env::var_os(key);
        std::env::set_var(key, value);
        Self { key, prev }
    }

    fn unset(key: &'static str) -> Self {
        let prev = std::env::var_os(key);
        std::env::remove_var(key);
        Self { key, prev }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        match &self.prev {
            Some(v) => std::env::set_var(self.key, v),
            None => std::env::remove_var(self.key),
        }
    }
}

#[test]
fn discovers_quill_toml_then_dotfile() {
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK mutex poisoned");
    let _env = EnvVarGuard::unset(QUILL_CONFIG_ENV_VAR);

    let dir = tempfile::tempdir().unwrap();
    assert_eq!(discover_config_path(dir.path()), None);

    let dotfile = dir.path().join(".quill.toml");
    std::fs::write(&dotfile, "").unwrap();
    assert_eq!(discover_config_path(dir.path()), Some(dotfile));

    let primary = dir.path().join("quill.toml");
    std::fs::write(&primary, "").unwrap();
    assert_eq!(discover_config_path(dir.path()), Some(primary));
}

#[test]
fn env_var_overrides_discovery() {
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK mutex poisoned");

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("quill.toml"), "").unwrap();
    let custom = dir.path().join("custom.toml");
    std::fs::write(&custom, "[resolve]\ndefault_params = false\n").unwrap();
    let _env = EnvVarGuard::set(QUILL_CONFIG_ENV_VAR, std::path::Path::new("custom.toml"));

    let (config, path) = load_for_dir(dir.path()).unwrap();
    assert_eq!(path, Some(custom));
    assert!(!config.resolve.default_params);
}

#[test]
fn load_for_dir_without_config_is_default() {
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK mutex poisoned");
    let _env = EnvVarGuard::unset(QUILL_CONFIG_ENV_VAR);

    let dir = tempfile::tempdir().unwrap();
    let (config, path) = load_for_dir(dir.path()).unwrap();
    assert_eq!(config, QuillConfig::default());
    assert_eq!(path, None);
}
