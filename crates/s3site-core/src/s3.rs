//! aws-sdk-s3 を使った StorageClient 実装
//!
//! SDK は非同期なので、クライアント専用の current-thread ランタイムで
//! 各リクエストをブロッキング実行する。

use std::path::Path;

use aws_config::meta::region::RegionProviderChain;
use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CorsConfiguration, CreateBucketConfiguration, ErrorDocument,
    IndexDocument, WebsiteConfiguration,
};
use aws_sdk_s3::Client;
use serde::{Deserialize, Serialize};
use tokio::runtime::Runtime;
use tracing::{debug, info};

use crate::storage::{BucketRef, StorageClient};
use crate::website::{CorsRule, WebsiteConfig};
use crate::{Error, Result};

/// リージョンが解決できない場合のフォールバック
pub const DEFAULT_REGION: &str = "us-east-1";

/// S3 クライアント設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct S3Settings {
    /// S3 互換サービスのエンドポイント（未指定なら AWS）
    pub endpoint_url: Option<String>,
    /// パススタイル URL を使う（MinIO など）
    pub force_path_style: bool,
    /// リトライを含む最大試行回数
    pub max_attempts: u32,
}

impl Default for S3Settings {
    fn default() -> Self {
        Self {
            endpoint_url: None,
            force_path_style: false,
            max_attempts: 3,
        }
    }
}

/// S3 クライアント
pub struct S3Client {
    runtime: Runtime,
    sdk_config: SdkConfig,
    force_path_style: bool,
    default_client: Client,
}

impl S3Client {
    /// 環境変数（認証情報・リージョン・プロファイル）から SDK 設定を読み込む
    pub fn from_env(settings: &S3Settings) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let region_provider = RegionProviderChain::default_provider().or_else(DEFAULT_REGION);
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .retry_config(RetryConfig::standard().with_max_attempts(settings.max_attempts.max(1)));
        if let Some(endpoint_url) = &settings.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }
        let sdk_config = runtime.block_on(loader.load());

        debug!(
            "S3 client configured (region: {:?}, endpoint: {:?})",
            sdk_config.region(),
            settings.endpoint_url
        );

        let default_client = Self::build_client(&sdk_config, settings.force_path_style, None);

        Ok(Self {
            runtime,
            sdk_config,
            force_path_style: settings.force_path_style,
            default_client,
        })
    }

    fn build_client(sdk_config: &SdkConfig, force_path_style: bool, region: Option<&str>) -> Client {
        let mut builder =
            aws_sdk_s3::config::Builder::from(sdk_config).force_path_style(force_path_style);
        if let Some(region) = region {
            builder = builder.region(Region::new(region.to_string()));
        }
        Client::from_conf(builder.build())
    }

    /// バケットのリージョンに合わせたクライアントを取得
    fn client_for(&self, bucket: BucketRef<'_>) -> Client {
        match bucket.region {
            Some(region) => Self::build_client(&self.sdk_config, self.force_path_style, Some(region)),
            None => self.default_client.clone(),
        }
    }
}

fn storage_error<E: std::error::Error>(action: &str, err: E) -> Error {
    Error::Storage(format!("Failed to {}: {}", action, DisplayErrorContext(err)))
}

impl StorageClient for S3Client {
    fn create_bucket(&self, bucket: BucketRef<'_>, location: Option<&str>) -> Result<()> {
        let client = self.client_for(bucket);

        let mut request = client.create_bucket().bucket(bucket.name);
        if let Some(location) = location {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(location))
                    .build(),
            );
        }

        match self.runtime.block_on(request.send()) {
            Ok(_) => Ok(()),
            Err(err)
                if err
                    .as_service_error()
                    .map(|e| e.is_bucket_already_owned_by_you())
                    .unwrap_or(false) =>
            {
                info!("Bucket '{}' already exists and is owned by you", bucket.name);
                Ok(())
            }
            Err(err) => Err(storage_error(&format!("create bucket '{}'", bucket.name), err)),
        }
    }

    fn put_object(
        &self,
        bucket: BucketRef<'_>,
        key: &str,
        local_path: &Path,
        content_type: Option<&str>,
    ) -> Result<()> {
        let client = self.client_for(bucket);

        let body = self
            .runtime
            .block_on(ByteStream::from_path(local_path))
            .map_err(|e| storage_error(&format!("read {}", local_path.display()), e))?;

        let request = client
            .put_object()
            .bucket(bucket.name)
            .key(key)
            .set_content_type(content_type.map(str::to_string))
            .body(body);

        self.runtime
            .block_on(request.send())
            .map_err(|e| storage_error(&format!("upload '{}'", key), e))?;

        Ok(())
    }

    fn put_bucket_cors(&self, bucket: BucketRef<'_>, rules: &[CorsRule]) -> Result<()> {
        let client = self.client_for(bucket);

        let cors_rules = rules
            .iter()
            .map(|rule| {
                aws_sdk_s3::types::CorsRule::builder()
                    .set_allowed_headers(Some(rule.allowed_headers.clone()))
                    .set_allowed_methods(Some(rule.allowed_methods.clone()))
                    .set_allowed_origins(Some(rule.allowed_origins.clone()))
                    .set_expose_headers(Some(rule.expose_headers.clone()))
                    .max_age_seconds(rule.max_age_seconds)
                    .build()
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| storage_error("build CORS rule", e))?;

        let configuration = CorsConfiguration::builder()
            .set_cors_rules(Some(cors_rules))
            .build()
            .map_err(|e| storage_error("build CORS configuration", e))?;

        self.runtime
            .block_on(
                client
                    .put_bucket_cors()
                    .bucket(bucket.name)
                    .cors_configuration(configuration)
                    .send(),
            )
            .map_err(|e| storage_error(&format!("set CORS on '{}'", bucket.name), e))?;

        Ok(())
    }

    fn put_bucket_policy(&self, bucket: BucketRef<'_>, policy: &str) -> Result<()> {
        let client = self.client_for(bucket);

        self.runtime
            .block_on(
                client
                    .put_bucket_policy()
                    .bucket(bucket.name)
                    .policy(policy)
                    .send(),
            )
            .map_err(|e| storage_error(&format!("set policy on '{}'", bucket.name), e))?;

        Ok(())
    }

    fn put_bucket_website(&self, bucket: BucketRef<'_>, website: &WebsiteConfig) -> Result<()> {
        let client = self.client_for(bucket);

        let index_document = IndexDocument::builder()
            .suffix(&website.index_document)
            .build()
            .map_err(|e| storage_error("build index document", e))?;
        let error_document = ErrorDocument::builder()
            .key(&website.error_document)
            .build()
            .map_err(|e| storage_error("build error document", e))?;

        let configuration = WebsiteConfiguration::builder()
            .index_document(index_document)
            .error_document(error_document)
            .build();

        self.runtime
            .block_on(
                client
                    .put_bucket_website()
                    .bucket(bucket.name)
                    .website_configuration(configuration)
                    .send(),
            )
            .map_err(|e| storage_error(&format!("configure website on '{}'", bucket.name), e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = S3Settings::default();
        assert_eq!(settings.endpoint_url, None);
        assert!(!settings.force_path_style);
        assert_eq!(settings.max_attempts, 3);
    }

    #[test]
    fn test_settings_partial_toml() {
        let settings: S3Settings = toml::from_str("force_path_style = true").unwrap();
        assert!(settings.force_path_style);
        assert_eq!(settings.max_attempts, 3);
    }

    #[test]
    fn test_storage_error_message() {
        let err = storage_error("upload 'a.txt'", std::io::Error::other("boom"));
        let message = err.to_string();
        assert!(message.starts_with("Storage error: Failed to upload 'a.txt'"));
        assert!(message.contains("boom"));
    }
}
