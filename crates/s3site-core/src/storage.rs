use std::path::Path;

use crate::website::{CorsRule, WebsiteConfig};
use crate::Result;

/// 操作対象のバケット（名前とリージョン）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketRef<'a> {
    pub name: &'a str,
    /// None の場合はプロバイダのデフォルトリージョン
    pub region: Option<&'a str>,
}

impl<'a> BucketRef<'a> {
    pub fn new(name: &'a str, region: Option<&'a str>) -> Self {
        Self { name, region }
    }
}

/// オブジェクトストレージクライアントの共通インターフェース
///
/// 各メソッドはリモート呼び出し 1 回に対応する。
pub trait StorageClient {
    /// バケットを作成（location が Some の場合はロケーション制約を付与）
    fn create_bucket(&self, bucket: BucketRef<'_>, location: Option<&str>) -> Result<()>;

    /// ローカルファイルをオブジェクトとしてアップロード
    fn put_object(
        &self,
        bucket: BucketRef<'_>,
        key: &str,
        local_path: &Path,
        content_type: Option<&str>,
    ) -> Result<()>;

    /// CORS 設定を置き換え
    fn put_bucket_cors(&self, bucket: BucketRef<'_>, rules: &[CorsRule]) -> Result<()>;

    /// バケットポリシーを設定
    fn put_bucket_policy(&self, bucket: BucketRef<'_>, policy: &str) -> Result<()>;

    /// 静的ウェブサイトホスティング設定
    fn put_bucket_website(&self, bucket: BucketRef<'_>, website: &WebsiteConfig) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod recording {
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};

    use super::{BucketRef, StorageClient};
    use crate::website::{CorsRule, WebsiteConfig};
    use crate::{Error, Result};

    /// 記録された呼び出し
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        CreateBucket {
            bucket: String,
            region: Option<String>,
            location: Option<String>,
        },
        PutObject {
            bucket: String,
            key: String,
            local_path: PathBuf,
            content_type: Option<String>,
        },
        PutBucketCors {
            bucket: String,
            rules: Vec<CorsRule>,
        },
        PutBucketPolicy {
            bucket: String,
            policy: String,
        },
        PutBucketWebsite {
            bucket: String,
            website: WebsiteConfig,
        },
    }

    /// 呼び出しを記録するテスト用クライアント
    #[derive(Default)]
    pub struct RecordingClient {
        pub calls: RefCell<Vec<Call>>,
        /// このキーへの put_object を失敗させる
        pub fail_on_key: Option<String>,
        /// 全てのバケット操作を失敗させる
        pub fail_bucket_ops: bool,
    }

    impl RecordingClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        pub fn uploaded_keys(&self) -> Vec<String> {
            self.calls
                .borrow()
                .iter()
                .filter_map(|c| match c {
                    Call::PutObject { key, .. } => Some(key.clone()),
                    _ => None,
                })
                .collect()
        }

        fn check_bucket_op(&self) -> Result<()> {
            if self.fail_bucket_ops {
                return Err(Error::Storage("AccessDenied".into()));
            }
            Ok(())
        }
    }

    impl StorageClient for RecordingClient {
        fn create_bucket(&self, bucket: BucketRef<'_>, location: Option<&str>) -> Result<()> {
            self.check_bucket_op()?;
            self.calls.borrow_mut().push(Call::CreateBucket {
                bucket: bucket.name.to_string(),
                region: bucket.region.map(str::to_string),
                location: location.map(str::to_string),
            });
            Ok(())
        }

        fn put_object(
            &self,
            bucket: BucketRef<'_>,
            key: &str,
            local_path: &Path,
            content_type: Option<&str>,
        ) -> Result<()> {
            if self.fail_on_key.as_deref() == Some(key) {
                return Err(Error::Storage(format!("Upload of {} refused", key)));
            }
            self.calls.borrow_mut().push(Call::PutObject {
                bucket: bucket.name.to_string(),
                key: key.to_string(),
                local_path: local_path.to_path_buf(),
                content_type: content_type.map(str::to_string),
            });
            Ok(())
        }

        fn put_bucket_cors(&self, bucket: BucketRef<'_>, rules: &[CorsRule]) -> Result<()> {
            self.check_bucket_op()?;
            self.calls.borrow_mut().push(Call::PutBucketCors {
                bucket: bucket.name.to_string(),
                rules: rules.to_vec(),
            });
            Ok(())
        }

        fn put_bucket_policy(&self, bucket: BucketRef<'_>, policy: &str) -> Result<()> {
            self.check_bucket_op()?;
            self.calls.borrow_mut().push(Call::PutBucketPolicy {
                bucket: bucket.name.to_string(),
                policy: policy.to_string(),
            });
            Ok(())
        }

        fn put_bucket_website(
            &self,
            bucket: BucketRef<'_>,
            website: &WebsiteConfig,
        ) -> Result<()> {
            self.check_bucket_op()?;
            self.calls.borrow_mut().push(Call::PutBucketWebsite {
                bucket: bucket.name.to_string(),
                website: website.clone(),
            });
            Ok(())
        }
    }
}
