use std::time::Duration;
use visioncache::config::AppConfig;
use visioncache::optimizer::OutputFormat;

#[test]
fn defaults_match_cache_and_optimizer_defaults() {
    let cfg = AppConfig::default();
    let cc = cfg.cache_config();
    assert_eq!(cc.max_entries, 1000);
    assert_eq!(cc.trim_target(), 900);
    assert_eq!(cc.default_ttl, Duration::from_secs(86_400));
    assert_eq!(cc.sweep_interval, Duration::from_secs(300));
    assert_eq!(cfg.optimizer.options.format, OutputFormat::Jpeg);
    assert_eq!(cfg.logging.level, "info");
}

#[test]
fn loads_explicit_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("visioncache.toml");
    let storage = dir.path().join("store");
    std::fs::write(
        &path,
        format!(
            "[cache]\nreserve = 5\nstorage_dir = {:?}\n\n[optimizer]\nmax_width = 640\nthumbnail_quality = 50\n\n[logging]\nretention = 2\n",
            storage.display().to_string()
        ),
    )
    .unwrap();

    let cfg = AppConfig::from_file(&path).unwrap();
    assert_eq!(cfg.cache.reserve, 5);
    assert_eq!(cfg.storage_dir(), storage);
    assert_eq!(cfg.optimizer.options.max_width, 640);
    assert_eq!(cfg.optimizer.options.max_height, 1024);
    assert_eq!(cfg.optimizer.thumbnail_quality, 50);
    assert_eq!(cfg.logging.retention, 2);
}

#[test]
fn open_cache_uses_configured_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = AppConfig::default();
    cfg.cache.storage_dir = Some(dir.path().to_path_buf());
    let cache = visioncache::open_cache(&cfg).unwrap();
    assert!(cache.is_empty());
    assert_eq!(cache.config().max_entries, 1000);
}

#[test]
fn missing_explicit_file_is_an_error() {
    assert!(AppConfig::from_file(std::path::Path::new("/definitely/not/here.toml")).is_err());
}

#[test]
fn file_logging_writes_app_log() {
    let dir = tempfile::tempdir().unwrap();
    visioncache::logger::configure_logging(dir.path(), "info", 2).unwrap();
    log::info!("hello from the config test");
    log::info!(target: visioncache::logger::METRICS_TARGET, "sample metric");
    assert!(dir.path().join("app.log").exists());
    assert!(dir.path().join("metrics.log").exists());
}
