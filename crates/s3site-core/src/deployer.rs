//! バケット作成・アップロード・ウェブホスティング設定
//!
//! 公開メソッドは成功/失敗を bool で返す。エラーはログに出力して握りつぶし、
//! 呼び出し側へは伝播しない。

use std::path::Path;

use tracing::{debug, error, info};
use walkdir::WalkDir;

use crate::s3::DEFAULT_REGION;
use crate::storage::{BucketRef, StorageClient};
use crate::website::{public_read_policy, CorsRule, WebsiteConfig};
use crate::{utils, Error, Result};

/// デプロイ操作を StorageClient 上で実行する
pub struct Deployer<C: StorageClient> {
    client: C,
}

impl<C: StorageClient> Deployer<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// バケットを作成
    ///
    /// リージョン未指定（またはデフォルトリージョン）の場合はロケーション制約を付けない。
    pub fn create_bucket(&self, name: &str, region: Option<&str>) -> bool {
        let location = region.filter(|r| *r != DEFAULT_REGION);
        debug!("Creating bucket '{}' (location constraint: {:?})", name, location);

        report(
            self.client
                .create_bucket(BucketRef::new(name, region), location)
                .map(|_| info!("Bucket '{}' is ready", name)),
        )
    }

    /// ファイルまたはディレクトリをアップロード
    pub fn upload(&self, bucket: &str, path: &Path, region: Option<&str>, key: Option<&str>) -> bool {
        if path.is_file() {
            self.upload_file(bucket, path, region, key)
        } else if path.is_dir() {
            self.upload_dir(bucket, path, region, key)
        } else {
            report(Err(Error::UnsupportedPath(path.to_path_buf())))
        }
    }

    /// 単一ファイルをアップロード（キー未指定時はファイルパスをそのままキーにする）
    pub fn upload_file(
        &self,
        bucket: &str,
        filepath: &Path,
        region: Option<&str>,
        key: Option<&str>,
    ) -> bool {
        let key = key
            .map(str::to_string)
            .unwrap_or_else(|| filepath.to_string_lossy().to_string());

        report(self.put_file(BucketRef::new(bucket, region), filepath, &key))
    }

    /// ディレクトリを再帰的にアップロード
    ///
    /// 途中で失敗した場合はそこで中断する。それまでにアップロードしたオブジェクトは残る。
    pub fn upload_dir(
        &self,
        bucket: &str,
        dirpath: &Path,
        region: Option<&str>,
        key: Option<&str>,
    ) -> bool {
        report(
            self.put_dir(BucketRef::new(bucket, region), dirpath, key)
                .map(|keys| {
                    info!(
                        "Uploaded {} file(s) from {} to '{}'",
                        keys.len(),
                        dirpath.display(),
                        bucket
                    )
                }),
        )
    }

    /// CORS・公開ポリシー・静的ウェブサイト設定を適用
    ///
    /// public が有効な場合のみポリシーとウェブサイト設定を行う。
    pub fn set_bucket_web_config(
        &self,
        bucket: &str,
        region: Option<&str>,
        index_doc: Option<&str>,
        error_doc: Option<&str>,
        cors: bool,
        public: bool,
    ) -> bool {
        let target = BucketRef::new(bucket, region);
        report(self.apply_web_config(target, index_doc, error_doc, cors, public))
    }

    fn put_file(&self, bucket: BucketRef<'_>, path: &Path, key: &str) -> Result<()> {
        let content_type = utils::content_type_for(path);
        debug!(
            "Uploading {} -> s3://{}/{} ({:?})",
            path.display(),
            bucket.name,
            key,
            content_type
        );

        self.client
            .put_object(bucket, key, path, content_type.as_deref())?;

        info!("Uploaded s3://{}/{}", bucket.name, key);
        Ok(())
    }

    fn put_dir(&self, bucket: BucketRef<'_>, dirpath: &Path, key: Option<&str>) -> Result<Vec<String>> {
        let prefix = key
            .map(str::to_string)
            .unwrap_or_else(|| dirpath.to_string_lossy().to_string());
        let root = utils::absolutize(dirpath)?;

        let mut uploaded = Vec::new();

        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = entry?;
            // ファイルへのシンボリックリンクは辿ってアップロードする（ディレクトリへのリンクは辿らない）
            if !utils::is_upload_target(&entry) {
                continue;
            }

            let relative_path = entry.path().strip_prefix(&root).map_err(|e| {
                Error::InvalidPath(format!("{}: {}", entry.path().display(), e))
            })?;
            let file_key = utils::object_key(&prefix, relative_path);

            self.put_file(bucket, entry.path(), &file_key)?;
            uploaded.push(file_key);
        }

        Ok(uploaded)
    }

    fn apply_web_config(
        &self,
        bucket: BucketRef<'_>,
        index_doc: Option<&str>,
        error_doc: Option<&str>,
        cors: bool,
        public: bool,
    ) -> Result<()> {
        if cors {
            self.client
                .put_bucket_cors(bucket, &[CorsRule::default()])?;
            info!("CORS configuration applied to '{}'", bucket.name);
        }

        if public {
            self.client
                .put_bucket_policy(bucket, &public_read_policy(bucket.name))?;
            info!("Public-read policy applied to '{}'", bucket.name);

            let website = WebsiteConfig::new(index_doc, error_doc);
            self.client.put_bucket_website(bucket, &website)?;
            info!(
                "Website hosting enabled on '{}' (index: {}, error: {})",
                bucket.name, website.index_document, website.error_document
            );
        }

        Ok(())
    }
}

/// エラーをログに出力し、成功/失敗に変換
fn report(result: Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            error!("{}", e);
            false
        }
    }
}
