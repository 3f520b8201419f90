use serde_json::json;

/// デフォルトのインデックスドキュメント
pub const DEFAULT_INDEX_DOCUMENT: &str = "index.html";

/// デフォルトのエラードキュメント
pub const DEFAULT_ERROR_DOCUMENT: &str = "error.html";

/// CORS ルール
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsRule {
    pub allowed_headers: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_origins: Vec<String>,
    pub expose_headers: Vec<String>,
    pub max_age_seconds: i32,
}

impl Default for CorsRule {
    /// 全オリジンからの GET / PUT を許可するルール
    fn default() -> Self {
        Self {
            allowed_headers: vec!["Authorization".to_string()],
            allowed_methods: vec!["GET".to_string(), "PUT".to_string()],
            allowed_origins: vec!["*".to_string()],
            expose_headers: vec!["GET".to_string(), "PUT".to_string()],
            max_age_seconds: 3000,
        }
    }
}

/// 静的ウェブサイトホスティング設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebsiteConfig {
    /// インデックスドキュメントのサフィックス（例: "index.html"）
    pub index_document: String,
    /// エラードキュメントのキー（例: "error.html"）
    pub error_document: String,
}

impl WebsiteConfig {
    /// 未指定のドキュメント名はデフォルト値で補完
    pub fn new(index_document: Option<&str>, error_document: Option<&str>) -> Self {
        Self {
            index_document: index_document.unwrap_or(DEFAULT_INDEX_DOCUMENT).to_string(),
            error_document: error_document.unwrap_or(DEFAULT_ERROR_DOCUMENT).to_string(),
        }
    }
}

impl Default for WebsiteConfig {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// バケット内の全オブジェクトを公開読み取り可能にするバケットポリシー（JSON）
pub fn public_read_policy(bucket: &str) -> String {
    json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Sid": "PublicReadGetObject",
                "Effect": "Allow",
                "Principal": "*",
                "Action": ["s3:GetObject"],
                "Resource": [format!("arn:aws:s3:::{}/*", bucket)]
            }
        ]
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cors_rule() {
        let rule = CorsRule::default();
        assert_eq!(rule.allowed_headers, vec!["Authorization"]);
        assert_eq!(rule.allowed_methods, vec!["GET", "PUT"]);
        assert_eq!(rule.allowed_origins, vec!["*"]);
        assert_eq!(rule.expose_headers, vec!["GET", "PUT"]);
        assert_eq!(rule.max_age_seconds, 3000);
    }

    #[test]
    fn test_website_config_defaults() {
        let config = WebsiteConfig::new(Some("chat.html"), None);
        assert_eq!(config.index_document, "chat.html");
        assert_eq!(config.error_document, "error.html");

        assert_eq!(WebsiteConfig::default().index_document, "index.html");
    }

    #[test]
    fn test_public_read_policy() {
        let policy = public_read_policy("my-site");
        let value: serde_json::Value = serde_json::from_str(&policy).unwrap();

        assert_eq!(value["Version"], "2012-10-17");
        let statement = &value["Statement"][0];
        assert_eq!(statement["Sid"], "PublicReadGetObject");
        assert_eq!(statement["Effect"], "Allow");
        assert_eq!(statement["Principal"], "*");
        assert_eq!(statement["Action"][0], "s3:GetObject");
        assert_eq!(statement["Resource"][0], "arn:aws:s3:::my-site/*");
    }
}
