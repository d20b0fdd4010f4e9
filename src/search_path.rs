// パス: src/search_path.rs
// 役割: モジュール検索パスとそのエントリ種別（ディレクトリ／zip）を表現する
// 意図: 走査器とファイルシステムホストが同じ規則でエントリを解釈するようにする
// 関連ファイル: src/scanner.rs, src/host/fs.rs, src/config.rs

use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// 検索パスを指定する環境変数名。
pub const SEARCH_PATH_ENV: &str = "AUTOIMP_PATH";

/// 順序付きの検索パス。空文字列のエントリはカレントディレクトリを意味する。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchPath {
    entries: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new<I, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }

    /// `AUTOIMP_PATH` をプラットフォームのパス区切りで分割して読む。未設定なら `None`。
    pub fn from_env() -> Option<Self> {
        env::var_os(SEARCH_PATH_ENV).map(|raw| Self::parse(&raw))
    }

    pub fn parse(raw: &OsStr) -> Self {
        Self::new(env::split_paths(raw))
    }

    pub fn push(&mut self, entry: impl Into<PathBuf>) {
        self.entries.push(entry.into());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    /// 空エントリをカレントディレクトリへ置き換えた実効パスを列挙する。
    pub fn effective_entries(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.entries.iter().map(|entry| {
            if entry.as_os_str().is_empty() {
                PathBuf::from(".")
            } else {
                entry.clone()
            }
        })
    }
}

/// 検索パスの 1 エントリが指すもの。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    ZipArchive,
    /// 存在しない・その他のファイル。走査対象外。
    Other,
}

impl EntryKind {
    pub fn classify(path: &Path) -> Self {
        if path.is_dir() {
            EntryKind::Directory
        } else if is_zip_name(path) && path.exists() {
            EntryKind::ZipArchive
        } else {
            EntryKind::Other
        }
    }
}

fn is_zip_name(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_entry_means_current_directory() {
        let path = SearchPath::new(["", "/opt/lib"]);
        let effective: Vec<PathBuf> = path.effective_entries().collect();
        assert_eq!(effective, vec![PathBuf::from("."), PathBuf::from("/opt/lib")]);
    }

    #[test]
    fn parse_uses_platform_separator() {
        let joined = env::join_paths(["/a", "/b"]).unwrap();
        let path = SearchPath::parse(&joined);
        assert_eq!(path.entries(), &[PathBuf::from("/a"), PathBuf::from("/b")]);
    }

    #[test]
    fn classify_missing_entry_as_other() {
        let kind = EntryKind::classify(Path::new("/definitely/not/here.zip"));
        assert_eq!(kind, EntryKind::Other);
    }
}
