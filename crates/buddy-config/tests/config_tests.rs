use buddy_config::{Config, ConfigError, ConfigManager};
use buddy_domain::WindowPreset;
use rust_decimal::Decimal;
use tempfile::tempdir;

#[test]
fn default_config_has_non_empty_fields() {
    let cfg = Config::default();

    assert!(!cfg.currency.is_empty());
    assert_eq!(cfg.top_n, 5);
    assert_eq!(cfg.trend_months, 6);
    assert_eq!(cfg.budget_margin, Decimal::new(1, 1));
}

#[test]
fn config_manager_persists_and_loads_config() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::new(dir.path().join("config.json"));

    let mut cfg = Config::default();
    cfg.currency = "EUR".to_string();
    cfg.default_window = WindowPreset::LastYear;
    cfg.budget_margin = Decimal::new(25, 2);

    manager.save(&cfg).expect("save config");
    let loaded = manager.load().expect("load config");

    assert_eq!(loaded, cfg);
    assert!(!dir.path().join("config.json.tmp").exists());
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");

    assert_eq!(manager.load().expect("load"), Config::default());
    assert!(manager.config_path().ends_with("config/config.json"));
}

#[test]
fn partial_file_fills_missing_fields() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "currency": "GBP", "top_n": 10 }"#).expect("write");

    let loaded = ConfigManager::new(path).load().expect("load");
    assert_eq!(loaded.currency, "GBP");
    assert_eq!(loaded.top_n, 10);
    assert_eq!(loaded.trend_months, Config::default_trend_months());
}

#[test]
fn corrupt_file_reports_serde_error() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").expect("write");

    let err = ConfigManager::new(path).load().unwrap_err();
    assert!(matches!(err, ConfigError::Serde(_)));
}

#[test]
fn owner_id_is_assigned_and_kept() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");

    let first = manager.load_or_init().expect("first load");
    let second = manager.load_or_init().expect("second load");

    assert!(first.owner_id.is_some());
    assert_eq!(first.owner_id, second.owner_id);
}
