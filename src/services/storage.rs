use crate::error::{RegistrarError, Result};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart, ObjectCannedAcl};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub key: String,
    pub size: u64,
    pub sha256: String,
}

/// Destination for the packaged handler
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Upload the file at `path` under `key`, readable by anyone.
    async fn upload_artifact(&self, path: &Path, key: &str) -> Result<UploadResult>;
}

pub struct S3ArtifactStore {
    client: Client,
    bucket: String,
    chunk_size: usize,
}

impl S3ArtifactStore {
    pub fn new(client: Client, bucket: String, chunk_size: usize) -> Self {
        Self {
            client,
            bucket,
            chunk_size,
        }
    }

    async fn put_single(&self, key: &str, data: Vec<u8>) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .acl(ObjectCannedAcl::PublicRead)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| RegistrarError::Upload(DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }

    /// Multipart upload for artifacts larger than one chunk. `first` is the
    /// chunk already read while deciding which path to take.
    async fn put_multipart<R>(
        &self,
        key: &str,
        first: Vec<u8>,
        reader: &mut R,
        hasher: &mut Sha256,
    ) -> Result<u64>
    where
        R: AsyncRead + Unpin + Send,
    {
        let multipart_upload_res = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| RegistrarError::Upload(DisplayErrorContext(&e).to_string()))?;

        let upload_id = multipart_upload_res
            .upload_id()
            .ok_or_else(|| {
                RegistrarError::MalformedResponse(
                    "CreateMultipartUpload returned no upload id".to_string(),
                )
            })?
            .to_string();

        match self
            .upload_parts(key, &upload_id, first, reader, hasher)
            .await
        {
            Ok((parts, total_size)) => {
                let completed_multipart_upload = CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build();

                self.client
                    .complete_multipart_upload()
                    .bucket(&self.bucket)
                    .key(key)
                    .upload_id(&upload_id)
                    .multipart_upload(completed_multipart_upload)
                    .send()
                    .await
                    .map_err(|e| RegistrarError::Upload(DisplayErrorContext(&e).to_string()))?;

                Ok(total_size)
            }
            Err(e) => {
                if let Err(abort_err) = self
                    .client
                    .abort_multipart_upload()
                    .bucket(&self.bucket)
                    .key(key)
                    .upload_id(&upload_id)
                    .send()
                    .await
                {
                    tracing::warn!(
                        "Failed to abort multipart upload {} for {}: {}",
                        upload_id,
                        key,
                        DisplayErrorContext(&abort_err)
                    );
                }
                Err(e)
            }
        }
    }

    async fn upload_parts<R>(
        &self,
        key: &str,
        upload_id: &str,
        first: Vec<u8>,
        reader: &mut R,
        hasher: &mut Sha256,
    ) -> Result<(Vec<CompletedPart>, u64)>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut completed_parts = Vec::new();
        let mut total_size = 0u64;
        let mut chunk_index = 1;
        let mut pending = Some(first);
        let mut buffer = vec![0u8; self.chunk_size];

        loop {
            let chunk = match pending.take() {
                Some(chunk) => chunk,
                None => {
                    let n = read_chunk(reader, &mut buffer).await?;
                    if n == 0 {
                        break;
                    }
                    hasher.update(&buffer[..n]);
                    buffer[..n].to_vec()
                }
            };

            total_size += chunk.len() as u64;
            tracing::debug!("Uploading part {} ({} bytes) of {}", chunk_index, chunk.len(), key);

            let upload_part_res = self
                .client
                .upload_part()
                .bucket(&self.bucket)
                .key(key)
                .upload_id(upload_id)
                .body(ByteStream::from(chunk))
                .part_number(chunk_index)
                .send()
                .await
                .map_err(|e| RegistrarError::Upload(DisplayErrorContext(&e).to_string()))?;

            completed_parts.push(
                CompletedPart::builder()
                    .e_tag(upload_part_res.e_tag().unwrap_or_default())
                    .part_number(chunk_index)
                    .build(),
            );

            chunk_index += 1;
        }

        Ok((completed_parts, total_size))
    }
}

#[async_trait]
impl ArtifactStore for S3ArtifactStore {
    async fn upload_artifact(&self, path: &Path, key: &str) -> Result<UploadResult> {
        let mut file = tokio::fs::File::open(path).await?;
        let mut hasher = Sha256::new();

        let mut buffer = vec![0u8; self.chunk_size];
        let n = read_chunk(&mut file, &mut buffer).await?;
        hasher.update(&buffer[..n]);
        buffer.truncate(n);

        let size = if n < self.chunk_size {
            tracing::debug!("Uploading {} ({} bytes) in a single request", key, n);
            self.put_single(key, buffer).await?;
            n as u64
        } else {
            tracing::debug!("Artifact exceeds {} bytes, using multipart upload", self.chunk_size);
            self.put_multipart(key, buffer, &mut file, &mut hasher)
                .await?
        };

        let sha256 = hex::encode(hasher.finalize());
        tracing::info!(
            "Uploaded s3://{}/{} ({} bytes, sha256 {})",
            self.bucket,
            key,
            size,
            sha256
        );

        Ok(UploadResult {
            key: key.to_string(),
            size,
            sha256,
        })
    }
}

/// Fill `buffer` from `reader` until it is full or the reader is exhausted.
async fn read_chunk<R>(reader: &mut R, buffer: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut n = 0;
    while n < buffer.len() {
        let read = reader.read(&mut buffer[n..]).await?;
        if read == 0 {
            break;
        }
        n += read;
    }
    Ok(n)
}
