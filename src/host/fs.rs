// パス: src/host/fs.rs
// 役割: 検索パス上のディレクトリ／zip からモジュールソースを読み込むホスト実装
// 意図: CLI や統合テストが実ファイルに対して遅延 import を確認できるようにする
// 関連ファイル: src/host/mod.rs, src/search_path.rs, src/literal.rs
//! ファイルシステムホスト。
//!
//! 仕様要点:
//! - `a.b` は各検索パスで `a/b/__init__.py`（パッケージ）→ `a/b.py` の順に探す。
//! - zip アーカイブ内も同じ規則で探す。
//! - 読み込みはトップレベルのリテラル代入（`NAME = 1` など）のみを評価する。
//! - 先頭の文字列リテラルは `__doc__` になる。
//! - トップレベルの `raise` 行に到達すると初期化失敗として扱う。
//! - それ以外の行は読み飛ばす。

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::PathBuf;

use parking_lot::Mutex;
use tracing::debug;

use super::Importer;
use crate::errors::ImportError;
use crate::literal::{parse_literal, Cursor};
use crate::name::CanonicalName;
use crate::search_path::{EntryKind, SearchPath};
use crate::value::{Module, ModuleOrigin, ModuleRef, Value};

const SOURCE_EXT: &str = "py";
const PACKAGE_INIT: &str = "__init__.py";

/// 検索パス上で見つかったモジュールの所在。
#[derive(Clone, Debug, PartialEq, Eq)]
enum Located {
    File {
        path: PathBuf,
        is_package: bool,
    },
    Archive {
        archive: PathBuf,
        entry: String,
        is_package: bool,
    },
}

impl Located {
    fn is_package(&self) -> bool {
        match self {
            Located::File { is_package, .. } | Located::Archive { is_package, .. } => *is_package,
        }
    }

    fn origin(&self) -> ModuleOrigin {
        match self {
            Located::File { path, .. } => ModuleOrigin::File(path.clone()),
            Located::Archive { archive, entry, .. } => ModuleOrigin::Archive {
                archive: archive.clone(),
                entry: entry.clone(),
            },
        }
    }

    fn display_path(&self) -> String {
        match self {
            Located::File { path, .. } => path.display().to_string(),
            Located::Archive { archive, entry, .. } => format!("{}/{}", archive.display(), entry),
        }
    }

    /// パッケージのサブモジュール検索用ディレクトリ表記。
    fn package_dir(&self) -> Option<String> {
        if !self.is_package() {
            return None;
        }
        let full = self.display_path();
        full.strip_suffix(PACKAGE_INIT)
            .map(|dir| dir.trim_end_matches('/').to_string())
    }

    fn read_source(&self) -> std::io::Result<String> {
        match self {
            Located::File { path, .. } => fs::read_to_string(path),
            Located::Archive { archive, entry, .. } => {
                let file = File::open(archive)?;
                let mut zip = zip::ZipArchive::new(file).map_err(std::io::Error::other)?;
                let mut member = zip.by_name(entry).map_err(std::io::Error::other)?;
                let mut source = String::new();
                member.read_to_string(&mut source)?;
                Ok(source)
            }
        }
    }
}

/// ファイルシステム上のモジュールを読み込むホスト。
pub struct FsImporter {
    search_path: SearchPath,
    // 読み込み済み表。ロック自体が import ロックを兼ねる。
    loaded: Mutex<HashMap<CanonicalName, ModuleRef>>,
}

impl FsImporter {
    pub fn new(search_path: SearchPath) -> Self {
        Self {
            search_path,
            loaded: Mutex::new(HashMap::new()),
        }
    }

    fn locate(&self, name: &CanonicalName) -> Option<Located> {
        let segments = name.segments();
        let rel_dir = segments.join("/");
        let package_entry = format!("{rel_dir}/{PACKAGE_INIT}");
        let module_entry = format!("{rel_dir}.{SOURCE_EXT}");

        for root in self.search_path.effective_entries() {
            match EntryKind::classify(&root) {
                EntryKind::Directory => {
                    let package = root.join(&package_entry);
                    if package.is_file() {
                        return Some(Located::File {
                            path: package,
                            is_package: true,
                        });
                    }
                    let module = root.join(&module_entry);
                    if module.is_file() {
                        return Some(Located::File {
                            path: module,
                            is_package: false,
                        });
                    }
                }
                EntryKind::ZipArchive => {
                    let Ok(file) = File::open(&root) else {
                        continue;
                    };
                    let Ok(zip) = zip::ZipArchive::new(file) else {
                        continue;
                    };
                    for (entry, is_package) in [(&package_entry, true), (&module_entry, false)] {
                        if zip.index_for_name(entry).is_some() {
                            return Some(Located::Archive {
                                archive: root.clone(),
                                entry: entry.clone(),
                                is_package,
                            });
                        }
                    }
                }
                EntryKind::Other => {}
            }
        }
        None
    }

    fn load(&self, name: &CanonicalName, located: &Located) -> Result<ModuleRef, ImportError> {
        let source = located
            .read_source()
            .map_err(|e| ImportError::initialization(name, e.to_string()))?;
        let module = Module::new(name.clone(), located.origin());
        module.set("__file__", Value::str(located.display_path()));
        let package = if located.is_package() {
            name.to_string()
        } else {
            name.parent().map(|p| p.to_string()).unwrap_or_default()
        };
        module.set("__package__", Value::str(package));
        if let Some(dir) = located.package_dir() {
            module.set("__path__", Value::List(vec![Value::str(dir)]));
        }
        execute_literals(&module, &source).map_err(|m| ImportError::initialization(name, m))?;
        Ok(module)
    }

    fn import_locked(
        &self,
        loaded: &mut HashMap<CanonicalName, ModuleRef>,
        name: &CanonicalName,
    ) -> Result<ModuleRef, ImportError> {
        if let Some(module) = loaded.get(name) {
            return Ok(module.clone());
        }
        let parent = match name.parent() {
            Some(parent) => Some(self.import_locked(loaded, &parent)?),
            None => None,
        };
        let located = self
            .locate(name)
            .ok_or_else(|| ImportError::not_found(name))?;
        debug!(module = %name, path = %located.display_path(), "loading module source");
        let module = self.load(name, &located)?;
        loaded.insert(name.clone(), module.clone());
        if let Some(parent) = parent {
            parent.set(name.tail(), Value::Module(module.clone()));
        }
        Ok(module)
    }
}

impl Importer for FsImporter {
    fn import(&self, name: &CanonicalName) -> Result<ModuleRef, ImportError> {
        let mut loaded = self.loaded.lock();
        self.import_locked(&mut loaded, name)
    }

    fn find(&self, name: &CanonicalName) -> bool {
        self.locate(name).is_some()
    }

    fn reload(&self, module: &ModuleRef) -> Result<ModuleRef, ImportError> {
        let _loaded = self.loaded.lock();
        let name = module.name();
        let located = self
            .locate(name)
            .ok_or_else(|| ImportError::not_found(name))?;
        let source = located
            .read_source()
            .map_err(|e| ImportError::initialization(name, e.to_string()))?;
        debug!(module = %name, "reloading module source");
        execute_literals(module, &source).map_err(|m| ImportError::initialization(name, m))?;
        Ok(module.clone())
    }

    fn search_path(&self) -> Vec<PathBuf> {
        self.search_path.entries().to_vec()
    }
}

/// トップレベルのリテラル代入と `raise` を評価する。
fn execute_literals(module: &Module, source: &str) -> Result<(), String> {
    let mut seen_statement = false;
    for (idx, line) in source.lines().enumerate() {
        let lineno = idx + 1;
        if line.starts_with(char::is_whitespace) {
            continue;
        }
        let stmt = line.trim_end();
        if stmt.is_empty() || stmt.starts_with('#') {
            continue;
        }
        let first_statement = !seen_statement;
        seen_statement = true;

        if stmt == "raise" || stmt.starts_with("raise ") {
            return Err(format!("line {lineno}: {stmt}"));
        }
        if first_statement && matches!(stmt.chars().next(), Some('"') | Some('\'')) {
            if let Ok(Value::Str(doc)) = parse_literal(stmt) {
                module.set("__doc__", Value::Str(doc));
            }
            continue;
        }
        if let Some((target, value)) = literal_assignment(stmt) {
            module.set(target, value);
        }
    }
    Ok(())
}

/// `NAME = literal` なら (NAME, 値) を返す。それ以外は `None`。
fn literal_assignment(stmt: &str) -> Option<(&str, Value)> {
    let mut cursor = Cursor::new(stmt);
    let target = cursor.identifier()?;
    cursor.skip_ws();
    if !cursor.rest().starts_with('=') || cursor.rest().starts_with("==") {
        return None;
    }
    cursor.bump();
    parse_literal(cursor.rest()).ok().map(|value| (target, value))
}
