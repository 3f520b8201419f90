use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::Result;

/// 拡張子から Content-Type を推測（不明な場合は None）
pub fn content_type_for(path: &Path) -> Option<String> {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
}

/// 相対パスをカレントディレクトリ基準の絶対パスにする（正規化はしない）
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

/// キープレフィックスと相対パスからオブジェクトキーを組み立てる
///
/// 区切り文字は OS に関係なく `/`。プレフィックスが空か `/` で終わる場合は
/// 区切りを追加しない。
pub fn object_key(prefix: &str, relative: &Path) -> String {
    let relative = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");

    if prefix.is_empty() || prefix.ends_with('/') {
        format!("{}{}", prefix, relative)
    } else {
        format!("{}/{}", prefix, relative)
    }
}

/// アップロード対象となるファイルか（ファイルへのシンボリックリンクを含む）
pub fn is_upload_target(entry: &DirEntry) -> bool {
    entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())
}

/// ディレクトリ以下のアップロード対象ファイル数を数える
pub fn count_files(path: &Path) -> Result<usize> {
    let mut count = 0;

    for entry in WalkDir::new(path) {
        if is_upload_target(&entry?) {
            count += 1;
        }
    }

    Ok(count)
}

/// アップロード対象ファイルの合計サイズ（リンク先のサイズで数える）
pub fn calculate_dir_size(path: &Path) -> Result<u64> {
    let mut total_size = 0u64;

    for entry in WalkDir::new(path) {
        let entry = entry?;
        if is_upload_target(&entry) {
            total_size += fs::metadata(entry.path())?.len();
        }
    }

    Ok(total_size)
}

/// バイト数を KB / MB / GB 単位の文字列にする
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut size = bytes as f64 / 1024.0;
    let mut unit = UNITS[0];
    for &next in &UNITS[1..] {
        if size < 1024.0 {
            break;
        }
        size /= 1024.0;
        unit = next;
    }

    format!("{:.2} {}", size, unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_content_type_for() {
        assert_eq!(
            content_type_for(Path::new("site/index.html")).as_deref(),
            Some("text/html")
        );
        assert_eq!(
            content_type_for(Path::new("css/style.css")).as_deref(),
            Some("text/css")
        );
        assert_eq!(
            content_type_for(Path::new("logo.png")).as_deref(),
            Some("image/png")
        );
        assert_eq!(content_type_for(Path::new("data.unknownext")), None);
        assert_eq!(content_type_for(Path::new("Makefile")), None);
    }

    #[test]
    fn test_object_key() {
        assert_eq!(object_key("", Path::new("index.html")), "index.html");
        assert_eq!(object_key("", Path::new("css/style.css")), "css/style.css");
        assert_eq!(object_key("site", Path::new("a/b.txt")), "site/a/b.txt");
        assert_eq!(object_key("site/", Path::new("a/b.txt")), "site/a/b.txt");
        assert_eq!(object_key("../src/", Path::new("chat.html")), "../src/chat.html");
    }

    #[test]
    fn test_absolutize() -> Result<()> {
        let abs = absolutize(Path::new("/var/www"))?;
        assert_eq!(abs, PathBuf::from("/var/www"));

        let rel = absolutize(Path::new("site"))?;
        assert!(rel.is_absolute());
        assert_eq!(rel, env::current_dir()?.join("site"));
        Ok(())
    }

    #[test]
    fn test_count_files_and_size() -> Result<()> {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("css")).unwrap();
        fs::write(temp.path().join("index.html"), b"<html></html>").unwrap();
        fs::write(temp.path().join("css/style.css"), b"body{}").unwrap();

        assert_eq!(count_files(temp.path())?, 2);
        assert_eq!(calculate_dir_size(temp.path())?, 19);
        Ok(())
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1024 * 1024), "1.00 MB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024), "5.00 GB");
    }
}
