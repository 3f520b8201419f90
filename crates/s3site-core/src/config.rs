use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::s3::S3Settings;
use crate::Result;

/// デフォルトの設定ファイル名（カレントディレクトリ）
pub const DEFAULT_CONFIG_FILE: &str = "s3site.toml";

/// バケット名を上書きする環境変数
pub const BUCKET_ENV: &str = "S3SITE_BUCKET";

/// デプロイ設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// デプロイ先バケット名（環境変数優先）
    pub bucket: Option<String>,
    /// リージョン（未指定ならプロバイダのデフォルト）
    pub region: Option<String>,
    /// アップロード元のファイルまたはディレクトリ
    pub source: PathBuf,
    /// オブジェクトキー（ディレクトリの場合はプレフィックス）
    ///
    /// 未指定の場合は upload_key を参照。
    pub key: Option<String>,
    pub index_document: Option<String>,
    pub error_document: Option<String>,
    /// CORS 設定を適用するか
    pub cors: bool,
    /// 公開ポリシーとウェブサイト設定を適用するか
    pub public: bool,
    pub storage: S3Settings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bucket: None,
            region: None,
            source: PathBuf::from("../src/"),
            key: None,
            index_document: Some("chat.html".to_string()),
            error_document: None,
            cors: true,
            public: true,
            storage: S3Settings::default(),
        }
    }
}

impl Config {
    /// 設定ファイルを読み込み（存在しない場合はデフォルト）
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            crate::Error::Config(format!("Failed to read config file: {}", e))
        })?;

        Self::parse(&content)
    }

    /// TOML 文字列から設定を読み込み
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config file: {}", e)))
    }

    /// アップロード時に使うキー
    ///
    /// キー未指定でソースがディレクトリの場合はバケット直下（空プレフィックス）。
    /// 単一ファイルの場合は None のままにし、ファイルパスをキーとして使わせる。
    pub fn upload_key(&self) -> Option<&str> {
        match self.key.as_deref() {
            Some(key) => Some(key),
            None if self.source.is_dir() => Some(""),
            None => None,
        }
    }

    /// バケット名を取得（環境変数優先）
    pub fn resolve_bucket(&self) -> Result<String> {
        env::var(BUCKET_ENV)
            .ok()
            .filter(|name| !name.is_empty())
            .or_else(|| self.bucket.clone())
            .ok_or_else(|| {
                crate::Error::Config(format!(
                    "Bucket name not found in {} or config (use --bucket)",
                    BUCKET_ENV
                ))
            })
    }
}
