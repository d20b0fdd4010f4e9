// パス: src/scanner.rs
// 役割: 検索パス上の import 可能なトップレベル名を列挙する（import はしない）
// 意図: 遅延束縛の候補集合を、壊れたエントリに影響されずに得る
// 関連ファイル: src/search_path.rs, src/inject.rs, src/host/mod.rs
//! モジュール走査器。
//!
//! 仕様要点:
//! - ディレクトリ内のモジュールファイル（既知の拡張子）と、`__init__` を持つパッケージを拾う。
//! - zip アーカイブも同じ規則でルート直下を走査する。
//! - `mathmodule.so` のような `module` 接尾辞付きの名前は接尾辞を落とした名前も候補にする。
//! - 1 エントリの失敗は `ScanIssue` として記録し、走査は続ける。
//! - 結果は重複なし・辞書順。

use std::collections::{BTreeSet, HashSet};
use std::fs::{self, File};
use std::io;
use std::path::Path;

use tracing::{trace, warn};

use crate::errors::ScanIssue;
use crate::host::Importer;
use crate::name::CanonicalName;
use crate::search_path::{EntryKind, SearchPath};

/// モジュールとして扱うファイル拡張子。
pub const MODULE_EXTENSIONS: &[&str] = &[
    ".py",
    ".pyc",
    ".pyo",
    ".pyw",
    ".pyd",
    ".dll",
    ".so",
    ".ppc.slb",
    ".carbon.slb",
    ".macho.slb",
];

/// ディレクトリをパッケージとみなす目印ファイル。
pub const PACKAGE_MARKERS: &[&str] = &["__init__.py", "__init__.pyc", "__init__.pyo"];

/// 走査規則。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanOptions {
    pub extensions: Vec<String>,
    pub package_markers: Vec<String>,
    /// ホストに静的リンクされている可能性がある名前。`Importer::find` で確認できたものだけ採る。
    pub compiled_modules: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extensions: MODULE_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            package_markers: PACKAGE_MARKERS.iter().map(|s| s.to_string()).collect(),
            compiled_modules: Vec::new(),
        }
    }
}

impl ScanOptions {
    pub fn with_compiled_modules<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.compiled_modules = names.into_iter().map(Into::into).collect();
        self
    }

    /// ファイル名から拡張子を除いた名前。最長一致の拡張子を採る。
    fn module_stem<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        self.extensions
            .iter()
            .filter(|ext| file_name.len() > ext.len() && file_name.ends_with(ext.as_str()))
            .max_by_key(|ext| ext.len())
            .map(|ext| &file_name[..file_name.len() - ext.len()])
    }
}

/// 1 回の走査結果（スナップショット）。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Discovery {
    pub names: BTreeSet<CanonicalName>,
    pub issues: Vec<ScanIssue>,
}

impl Discovery {
    /// 一部のエントリを走査できなかったか。
    pub fn is_partial(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn contains(&self, dotted: &str) -> bool {
        CanonicalName::parse(dotted)
            .map(|name| self.names.contains(&name))
            .unwrap_or(false)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Scanner {
    options: ScanOptions,
}

impl Scanner {
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// 検索パスとホストの組み込み名から候補集合を作る。
    pub fn discover(&self, path: &SearchPath, importer: &dyn Importer) -> Discovery {
        let mut discovery = Discovery::default();
        for entry in path.effective_entries() {
            let scanned = match EntryKind::classify(&entry) {
                EntryKind::Directory => self
                    .scan_directory(&entry)
                    .map_err(|e| ScanIssue::unreadable(&entry, e)),
                EntryKind::ZipArchive => self.scan_archive(&entry),
                EntryKind::Other => {
                    trace!(path = %entry.display(), "skipping search path entry");
                    continue;
                }
            };
            match scanned {
                Ok(stems) => discovery.names.extend(stems),
                Err(issue) => {
                    warn!(%issue, "search path entry skipped");
                    discovery.issues.push(issue);
                }
            }
        }

        for builtin in importer.builtin_module_names() {
            if let Ok(name) = CanonicalName::parse(&builtin) {
                discovery.names.insert(name);
            }
        }
        for candidate in &self.options.compiled_modules {
            let Ok(name) = CanonicalName::parse(candidate) else {
                continue;
            };
            if !discovery.names.contains(&name) && importer.find(&name) {
                discovery.names.insert(name);
            }
        }
        discovery
    }

    fn scan_directory(&self, dir: &Path) -> io::Result<Vec<CanonicalName>> {
        let mut found = Vec::new();
        for dirent in fs::read_dir(dir)? {
            let dirent = dirent?;
            let file_name = dirent.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            let path = dirent.path();
            if path.is_dir() {
                let is_package = self
                    .options
                    .package_markers
                    .iter()
                    .any(|marker| path.join(marker).exists());
                if is_package {
                    push_candidates(&mut found, file_name);
                }
            } else if let Some(stem) = self.options.module_stem(file_name) {
                push_candidates(&mut found, stem);
            }
        }
        Ok(found)
    }

    fn scan_archive(&self, archive_path: &Path) -> Result<Vec<CanonicalName>, ScanIssue> {
        let file = File::open(archive_path).map_err(|e| ScanIssue::unreadable(archive_path, e))?;
        let archive =
            zip::ZipArchive::new(file).map_err(|e| ScanIssue::invalid_archive(archive_path, e))?;
        let entries: HashSet<String> = archive
            .file_names()
            .map(|n| n.replace('\\', "/"))
            .collect();

        let mut found = Vec::new();
        let mut seen_packages = HashSet::new();
        for entry in &entries {
            let trimmed = entry.trim_end_matches('/');
            match trimmed.split_once('/') {
                None => {
                    if let Some(stem) = self.options.module_stem(trimmed) {
                        push_candidates(&mut found, stem);
                    }
                }
                Some((top, _)) => {
                    if !seen_packages.insert(top.to_string()) {
                        continue;
                    }
                    let is_package = self
                        .options
                        .package_markers
                        .iter()
                        .any(|marker| entries.contains(&format!("{top}/{marker}")));
                    if is_package {
                        push_candidates(&mut found, top);
                    }
                }
            }
        }
        Ok(found)
    }
}

/// 名前と、`module` 接尾辞を落とした名前を候補に加える。識別子でないものは捨てる。
fn push_candidates(found: &mut Vec<CanonicalName>, stem: &str) {
    if let Ok(name) = CanonicalName::parse(stem) {
        found.push(name);
    }
    let lower = stem.to_ascii_lowercase();
    if lower.ends_with("module") && stem.len() > "module".len() {
        let short = &stem[..stem.len() - "module".len()];
        if let Ok(name) = CanonicalName::parse(short) {
            found.push(name);
        }
    }
}
