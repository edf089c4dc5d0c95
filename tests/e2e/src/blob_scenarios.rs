use crate::test_utils::{expect_error, unique_name, Gateway};
use anyhow::{Context, Result};
use reqwest::StatusCode;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::sleep;

/// Upload, download, delete, then confirm the blob is gone
pub async fn validate_round_trip(gateway: &Gateway) -> Result<()> {
    let blob_name = format!("{}/notes.txt", unique_name("e2e"));
    let content = b"hello";

    let file_url = gateway.upload_ok(&blob_name, content).await?;
    if file_url.is_empty() {
        anyhow::bail!("Upload returned an empty fileUrl");
    }
    println!("Uploaded {} -> {}", blob_name, file_url);

    let response = gateway.download(&blob_name).await?;
    if response.status() != StatusCode::OK {
        anyhow::bail!("Download answered {}", response.status());
    }
    let disposition = response
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !disposition.contains("notes.txt") {
        anyhow::bail!("Unexpected Content-Disposition: {:?}", disposition);
    }
    let body = response.bytes().await.context("Failed to read download body")?;
    if body.as_ref() != content {
        anyhow::bail!("Downloaded content does not match: {:?}", body);
    }

    let response = gateway.delete(&blob_name).await?;
    if response.status() != StatusCode::OK {
        anyhow::bail!("Delete answered {}", response.status());
    }

    let response = gateway.download(&blob_name).await?;
    expect_error(response, StatusCode::NOT_FOUND).await?;

    let response = gateway.delete(&blob_name).await?;
    let message = expect_error(response, StatusCode::NOT_FOUND).await?;
    println!("Second delete rejected: {}", message);
    Ok(())
}

/// Every upload appears in the container listing
pub async fn validate_listing(gateway: &Gateway, container: &str, count: usize) -> Result<()> {
    let prefix = unique_name("listing");
    for i in 0..count {
        gateway
            .upload_ok(&format!("{}/file{}.txt", prefix, i), format!("file {}", i).as_bytes())
            .await?;
    }

    let listing = gateway.list_files(container).await?;
    let listed = listing
        .files
        .iter()
        .filter(|item| item.name.starts_with(&prefix))
        .count();
    if listed != count {
        anyhow::bail!("Expected {} listed blobs under {}, found {}", count, prefix, listed);
    }

    for i in 0..count {
        gateway.delete(&format!("{}/file{}.txt", prefix, i)).await?;
    }
    Ok(())
}

pub async fn validate_metadata(gateway: &Gateway) -> Result<()> {
    let blob_name = unique_name("metadata") + ".txt";
    gateway.upload_ok(&blob_name, b"metadata").await?;

    let mut metadata = BTreeMap::new();
    metadata.insert("author".to_string(), "e2e".to_string());
    metadata.insert("stage".to_string(), "draft".to_string());

    let set = gateway.set_metadata(&blob_name, &metadata).await?;
    if !set.success {
        anyhow::bail!("Setting metadata failed: {}", set.message);
    }

    let read = gateway.get_metadata(&blob_name).await?;
    let data = read.data.context("Metadata response carried no data")?;
    if data != metadata {
        anyhow::bail!("Metadata mismatch: {:?} != {:?}", data, metadata);
    }

    gateway.delete(&blob_name).await?;
    Ok(())
}

/// Copy completes asynchronously on the service, so poll the destination
pub async fn validate_copy_and_snapshot(gateway: &Gateway) -> Result<()> {
    let source = unique_name("copy-source") + ".txt";
    let destination = unique_name("copy-destination") + ".txt";
    gateway.upload_ok(&source, b"copied content").await?;

    let copied = gateway.copy(&source, &destination).await?;
    if !copied.success || copied.data.is_none() {
        anyhow::bail!("Copy failed: {}", copied.message);
    }

    let mut matched = false;
    for _ in 0..30 {
        let response = gateway.download(&destination).await?;
        if response.status() == StatusCode::OK {
            let body = response.bytes().await?;
            if body.as_ref() == b"copied content" {
                matched = true;
                break;
            }
        }
        sleep(Duration::from_secs(1)).await;
    }
    if !matched {
        anyhow::bail!("Copied blob {} never matched its source", destination);
    }

    let snapshot = gateway.snapshot(&source).await?;
    let stamp = snapshot.data.context("Snapshot response carried no data")?;
    if stamp.is_empty() {
        anyhow::bail!("Snapshot returned an empty timestamp");
    }
    println!("Snapshot of {} taken at {}", source, stamp);

    gateway.delete(&source).await?;
    gateway.delete(&destination).await?;
    Ok(())
}

pub async fn validate_rejections(gateway: &Gateway) -> Result<()> {
    let response = gateway.create_directory("   ").await?;
    let message = expect_error(response, StatusCode::BAD_REQUEST).await?;
    if message != "Directory name cannot be empty." {
        anyhow::bail!("Unexpected message: {}", message);
    }

    let response = gateway.create_container("").await?;
    let message = expect_error(response, StatusCode::BAD_REQUEST).await?;
    if message != "Container name cannot be empty." {
        anyhow::bail!("Unexpected message: {}", message);
    }

    let response = gateway.upload("empty.txt", b"").await?;
    expect_error(response, StatusCode::BAD_REQUEST).await?;
    Ok(())
}

/// Directory placeholder shows up in the listing and a repeated container create is not an error
pub async fn validate_directories_and_containers(gateway: &Gateway, container: &str) -> Result<()> {
    let directory = unique_name("dir");
    let response = gateway.create_directory(&directory).await?;
    if response.status() != StatusCode::OK {
        anyhow::bail!("Create directory answered {}", response.status());
    }
    let placeholder = format!("{}/.placeholder", directory);
    let listing = gateway.list_files(container).await?;
    if !listing.files.iter().any(|item| item.name == placeholder) {
        anyhow::bail!("Placeholder {} missing from the listing", placeholder);
    }
    gateway.delete(&placeholder).await?;

    let new_container = unique_name("e2e");
    for _ in 0..2 {
        let response = gateway.create_container(&new_container).await?;
        if response.status() != StatusCode::OK {
            anyhow::bail!("Create container answered {}", response.status());
        }
    }
    Ok(())
}
