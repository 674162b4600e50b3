use crate::{ObjectHead, ObjectStore, ObjectSummary};
use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Utc};
use layer_models::LayerError;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, instrument};

/// S3-backed object store. Wraps a configured SDK client plus the bucket
/// name so callers never touch raw SDK types.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

fn to_utc(dt: &aws_sdk_s3::primitives::DateTime) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(dt.secs(), dt.subsec_nanos()).unwrap_or_else(Utc::now)
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[instrument(skip(self, body, metadata))]
    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
        metadata: HashMap<String, String>,
    ) -> Result<(), LayerError> {
        let size = body.len();
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .set_metadata(Some(metadata));
        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }

        request.send().await.map_err(|e| LayerError::Storage {
            reason: format!("failed to write object {key}: {}", e.into_service_error()),
        })?;

        info!("Uploaded {} bytes to s3://{}/{}", size, self.bucket, key);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_object(&self, key: &str) -> Result<Vec<u8>, LayerError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service = e.into_service_error();
                if service.is_no_such_key() {
                    LayerError::NotFound {
                        key: key.to_string(),
                    }
                } else {
                    LayerError::Storage {
                        reason: format!("failed to read object {key}: {service}"),
                    }
                }
            })?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| LayerError::Storage {
                reason: format!("failed to read body of {key}: {e}"),
            })?;
        Ok(bytes.into_bytes().to_vec())
    }

    #[instrument(skip(self))]
    async fn head_object(&self, key: &str) -> Result<ObjectHead, LayerError> {
        let output = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service = e.into_service_error();
                if service.is_not_found() {
                    LayerError::NotFound {
                        key: key.to_string(),
                    }
                } else {
                    LayerError::Storage {
                        reason: format!("failed to head object {key}: {service}"),
                    }
                }
            })?;

        Ok(ObjectHead {
            size: output.content_length().unwrap_or(0).max(0) as u64,
            last_modified: output.last_modified().map(to_utc).unwrap_or_else(Utc::now),
            etag: output
                .e_tag()
                .unwrap_or_default()
                .trim_matches('"')
                .to_string(),
            metadata: output.metadata().cloned().unwrap_or_default(),
        })
    }

    #[instrument(skip(self))]
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>, LayerError> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        let mut objects = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| LayerError::Storage {
                reason: format!("failed to list prefix {prefix}: {}", e.into_service_error()),
            })?;
            for object in page.contents() {
                let key = object.key().unwrap_or_default().to_string();
                if key.is_empty() || key.ends_with('/') {
                    continue;
                }
                objects.push(ObjectSummary {
                    key,
                    size: object.size().unwrap_or(0).max(0) as u64,
                    last_modified: object.last_modified().map(to_utc).unwrap_or_else(Utc::now),
                    etag: object
                        .e_tag()
                        .unwrap_or_default()
                        .trim_matches('"')
                        .to_string(),
                });
            }
        }
        Ok(objects)
    }

    #[instrument(skip(self))]
    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, LayerError> {
        let config = PresigningConfig::expires_in(expires_in).map_err(|e| {
            LayerError::PresignFailed {
                reason: e.to_string(),
            }
        })?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(config)
            .await
            .map_err(|e| LayerError::PresignFailed {
                reason: e.into_service_error().to_string(),
            })?;

        Ok(presigned.uri().to_string())
    }
}
