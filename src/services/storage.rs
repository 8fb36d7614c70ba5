use s3::creds::Credentials;
use s3::{Bucket, Region};

/// Client for the R2 media bucket (S3-compatible) holding report photos and
/// synthesized advisory audio.
pub struct R2Client {
    bucket: Box<Bucket>,
    public_base_url: String,
}

impl R2Client {
    pub fn new(
        bucket_name: &str,
        endpoint: &str,
        access_key: &str,
        secret_key: &str,
        public_base_url: &str,
    ) -> Result<Self, StorageError> {
        let region = Region::Custom {
            region: "auto".to_string(),
            endpoint: endpoint.to_string(),
        };

        let credentials =
            Credentials::new(Some(access_key), Some(secret_key), None, None, None)
                .map_err(|e| StorageError::Config(e.to_string()))?;

        let bucket = Bucket::new(bucket_name, region, credentials)
            .map_err(|e| StorageError::Config(e.to_string()))?;

        Ok(Self {
            bucket,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Upload bytes under `key` and return the object's public URL.
    pub async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> Result<String, StorageError> {
        self.bucket
            .put_object_with_content_type(key, data, content_type)
            .await
            .map_err(StorageError::S3)?;
        Ok(self.public_url(key))
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

/// Object key for a report photo.
pub fn report_image_key(report_id: &str, extension: &str) -> String {
    format!("pollution-images/{report_id}.{extension}")
}

/// Object key for an advisory audio clip.
pub fn advisory_audio_key(user_id: &str, audio_id: &str, timestamp: i64) -> String {
    format!("health-audio/{user_id}/{audio_id}_{timestamp}.mp3")
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("S3 operation failed: {0}")]
    S3(#[from] s3::error::S3Error),

    #[error("Storage configuration error: {0}")]
    Config(String),
}
