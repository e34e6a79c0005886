use anyhow::{anyhow, Result};
use reqwest::StatusCode;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::CONFIG;
use crate::llm::media::{detect_mime_type, download_media, extension_for_mime};
use crate::utils::http::get_http_client;

/// Handle to an object stored in the image bucket.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub storage_key: String,
    pub image_url: String,
}

fn build_public_url(use_ssl: bool, endpoint: &str, port: u16, bucket: &str, key: &str) -> String {
    let protocol = if use_ssl { "https" } else { "http" };
    let is_default_port = (use_ssl && port == 443) || (!use_ssl && port == 80);

    if is_default_port {
        format!("{protocol}://{endpoint}/{bucket}/{key}")
    } else {
        format!("{protocol}://{endpoint}:{port}/{bucket}/{key}")
    }
}

/// Public URL of a stored object, suitable for the UI and external APIs.
pub fn public_image_url(storage_key: &str) -> String {
    build_public_url(
        CONFIG.minio_use_ssl,
        &CONFIG.minio_endpoint,
        CONFIG.minio_port,
        &CONFIG.minio_bucket,
        storage_key,
    )
}

fn bucket_url() -> String {
    build_public_url(
        CONFIG.minio_use_ssl,
        &CONFIG.minio_endpoint,
        CONFIG.minio_port,
        &CONFIG.minio_bucket,
        "",
    )
    .trim_end_matches('/')
    .to_string()
}

fn authorize(request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    let token = CONFIG.minio_api_token.trim();
    if token.is_empty() {
        request
    } else {
        request.bearer_auth(token)
    }
}

async fn ensure_bucket() -> Result<()> {
    let client = get_http_client();
    let response = authorize(client.put(bucket_url())).send().await?;
    let status = response.status();

    // 409 means the bucket already exists, which is the common case.
    if status.is_success() || status == StatusCode::CONFLICT {
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    Err(anyhow!(
        "Failed to ensure bucket {} (status {}): {}",
        CONFIG.minio_bucket,
        status,
        body
    ))
}

/// Stores an image under a fresh UUID key and returns its key and URL.
pub async fn upload_image_bytes(bytes: &[u8], content_type: &str) -> Result<StoredObject> {
    ensure_bucket().await?;

    let storage_key = format!("{}.{}", Uuid::new_v4(), extension_for_mime(content_type));
    let url = format!("{}/{}", bucket_url(), storage_key);

    let client = get_http_client();
    let response = authorize(client.put(&url))
        .header("Content-Type", content_type)
        .body(bytes.to_vec())
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(anyhow!(
            "Image upload for {} failed with status {}: {}",
            storage_key,
            status,
            body
        ));
    }

    let image_url = public_image_url(&storage_key);
    info!("Uploaded image to storage: {}", image_url);

    Ok(StoredObject {
        storage_key,
        image_url,
    })
}

/// Downloads an image from an external URL and re-hosts it in the bucket.
/// Generated images live on the model provider's CDN only briefly, so they
/// are copied into storage before the post row is completed.
pub async fn upload_image_from_url(source_url: &str) -> Result<StoredObject> {
    let bytes = download_media(source_url)
        .await
        .ok_or_else(|| anyhow!("Failed to fetch image from {}", source_url))?;
    let content_type = detect_mime_type(&bytes).unwrap_or_else(|| "image/png".to_string());
    upload_image_bytes(&bytes, &content_type).await
}

/// Fetches a stored object's bytes.
pub async fn download_image(storage_key: &str) -> Result<Vec<u8>> {
    let url = format!("{}/{}", bucket_url(), storage_key);
    let client = get_http_client();
    let response = authorize(client.get(&url)).send().await?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Image download for {} failed with status {}",
            storage_key,
            response.status()
        ));
    }

    Ok(response.bytes().await?.to_vec())
}

/// Removes a stored object. Missing objects are treated as already deleted.
pub async fn delete_image(storage_key: &str) -> Result<()> {
    let url = format!("{}/{}", bucket_url(), storage_key);
    let client = get_http_client();
    let response = authorize(client.delete(&url)).send().await?;
    let status = response.status();

    if status.is_success() || status == StatusCode::NOT_FOUND {
        return Ok(());
    }

    Err(anyhow!(
        "Image delete for {} failed with status {}",
        storage_key,
        status
    ))
}

/// Round-trips a tiny probe object through the bucket. Used by the storage
/// health endpoint to confirm connectivity and credentials.
pub async fn storage_round_trip_probe() -> Result<String> {
    let probe = b"instadream storage probe";
    let stored = upload_image_bytes(probe, "text/plain").await?;

    let fetched = download_image(&stored.storage_key).await?;
    if fetched != probe {
        warn!("Storage probe bytes did not round-trip for {}", stored.storage_key);
        return Err(anyhow!("Storage probe readback mismatch"));
    }

    delete_image(&stored.storage_key).await?;
    Ok(stored.image_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_url_includes_nonstandard_ports() {
        let url = build_public_url(false, "localhost", 9000, "instadream", "abc.png");
        assert_eq!(url, "http://localhost:9000/instadream/abc.png");
    }

    #[test]
    fn public_url_elides_default_ports() {
        let url = build_public_url(true, "cdn.example.com", 443, "instadream", "abc.png");
        assert_eq!(url, "https://cdn.example.com/instadream/abc.png");

        let url = build_public_url(false, "cdn.example.com", 80, "instadream", "abc.png");
        assert_eq!(url, "http://cdn.example.com/instadream/abc.png");
    }
}
