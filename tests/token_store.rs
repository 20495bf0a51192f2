use anyhow::{Context, Result};
use tempfile::tempdir;
use vantage_client::store::{FileTokenStore, TokenStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use vantage_client::ApiError;

#[tokio::test]
async fn file_store_persists_across_instances() -> Result<()> {
    let dir = tempdir().context("failed to create tempdir")?;
    let path = dir.path().join("credentials.json");

    let store = FileTokenStore::new(&path);
    store.store_tokens("acc-1", "ref-1").await?;

    // a fresh instance (fresh process, conceptually) sees the same tokens
    let reopened = FileTokenStore::new(&path);
    assert_eq!(reopened.access_token().await?.as_deref(), Some("acc-1"));
    assert_eq!(reopened.refresh_token().await?.as_deref(), Some("ref-1"));

    Ok(())
}

#[tokio::test]
async fn file_store_writes_the_fixed_keys() -> Result<()> {
    let dir = tempdir().context("failed to create tempdir")?;
    let path = dir.path().join("credentials.json");

    let store = FileTokenStore::new(&path);
    store.store_tokens("acc-1", "ref-1").await?;

    let raw = std::fs::read_to_string(&path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    assert_eq!(parsed[ACCESS_TOKEN_KEY], "acc-1");
    assert_eq!(parsed[REFRESH_TOKEN_KEY], "ref-1");

    Ok(())
}

#[tokio::test]
async fn rotating_the_access_token_keeps_the_refresh_token() -> Result<()> {
    let dir = tempdir().context("failed to create tempdir")?;
    let store = FileTokenStore::new(dir.path().join("credentials.json"));

    store.store_tokens("acc-1", "ref-1").await?;
    store.store_access_token("acc-2").await?;

    assert_eq!(store.access_token().await?.as_deref(), Some("acc-2"));
    assert_eq!(store.refresh_token().await?.as_deref(), Some("ref-1"));

    Ok(())
}

#[tokio::test]
async fn clear_removes_both_tokens_and_is_idempotent() -> Result<()> {
    let dir = tempdir().context("failed to create tempdir")?;
    let path = dir.path().join("credentials.json");
    let store = FileTokenStore::new(&path);

    store.store_tokens("acc-1", "ref-1").await?;
    store.clear().await?;

    assert_eq!(store.access_token().await?, None);
    assert_eq!(store.refresh_token().await?, None);
    assert!(!path.exists());

    // clearing an already-clear store is fine
    store.clear().await?;

    Ok(())
}

#[tokio::test]
async fn missing_file_reads_as_no_tokens() -> Result<()> {
    let dir = tempdir().context("failed to create tempdir")?;
    let store = FileTokenStore::new(dir.path().join("nope").join("credentials.json"));

    assert_eq!(store.access_token().await?, None);
    assert_eq!(store.refresh_token().await?, None);

    Ok(())
}

#[tokio::test]
async fn corrupt_file_surfaces_an_internal_error() -> Result<()> {
    let dir = tempdir().context("failed to create tempdir")?;
    let path = dir.path().join("credentials.json");
    std::fs::write(&path, "not json at all")?;

    let store = FileTokenStore::new(&path);
    let err = store.access_token().await.expect_err("corrupt file");
    assert!(matches!(err, ApiError::Internal(_)), "got {err}");

    Ok(())
}
