use mavftp::core::{FtpError, TargetAddress};
use mavftp::infrastructure::FtpConfig;
use std::time::Duration;

#[test]
fn test_save_and_load() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("ftp.json");
    let path = path.to_str().unwrap();

    let config = FtpConfig {
        target: TargetAddress::new(0, 42, 1),
        timeout_ms: 500,
        max_retries: 10,
        exchange_deadline_ms: Some(4000),
        read_chunk_size: 200,
    };
    config.save_to_file(path)?;

    let loaded = FtpConfig::load(path)?;
    assert_eq!(loaded, config);

    let policy = loaded.retry_policy();
    assert_eq!(policy.timeout, Duration::from_millis(500));
    assert_eq!(policy.max_attempts, 10);
    assert_eq!(policy.deadline, Some(Duration::from_secs(4)));
    Ok(())
}

#[test]
fn test_load_rejects_invalid_values() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("bad.json");
    std::fs::write(&path, r#"{ "read_chunk_size": 240 }"#)?;

    let result = FtpConfig::load(path.to_str().unwrap());
    assert!(matches!(result, Err(FtpError::Config(_))));
    Ok(())
}

#[test]
fn test_load_reports_unreadable_files() {
    let result = FtpConfig::load("/definitely/not/here.json");
    assert!(matches!(result, Err(FtpError::Config(msg)) if msg.contains("here.json")));
}

#[test]
fn test_load_or_default_falls_back() -> anyhow::Result<()> {
    assert_eq!(FtpConfig::load_or_default(None), FtpConfig::default());
    assert_eq!(FtpConfig::load_or_default(Some("/no/such/file.json")), FtpConfig::default());

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "not json")?;
    assert_eq!(
        FtpConfig::load_or_default(path.to_str()),
        FtpConfig::default()
    );
    Ok(())
}
