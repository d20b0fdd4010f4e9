// パス: src/host/mod.rs
// 役割: ホストの import 機構を表すトレイトと参照実装のファサード
// 意図: 遅延プロキシがどのホストにも依存せず「いつ import するか」だけを決められるようにする
// 関連ファイル: src/host/registry.rs, src/host/fs.rs, src/proxy.rs
//! ホスト側 import 機構の抽象。
//!
//! - `registry`: メモリ上に登録したモジュールを読み込むホスト
//! - `fs`: 検索パス上のソースファイル／zip から読み込むホスト

mod fs;
mod registry;

use std::path::PathBuf;

use crate::errors::ImportError;
use crate::name::CanonicalName;
use crate::value::ModuleRef;

pub use fs::FsImporter;
pub use registry::{ModuleRegistry, ModuleInit};

/// ホストの import 機構。
///
/// プロキシ層はモジュールの読み込み・キャッシュ・検索パス解決を再実装しない。
/// 実装側はそれらをすべて引き受け、同一モジュールの初期化を高々 1 回に直列化する。
pub trait Importer: Send + Sync {
    /// `name` を import して末端のモジュールを返す。
    ///
    /// 親パッケージを先に import し、子モジュールは親の属性として結び付ける。
    fn import(&self, name: &CanonicalName) -> Result<ModuleRef, ImportError>;

    /// 読み込まずに所在だけを確認する。
    fn find(&self, name: &CanonicalName) -> bool;

    /// 読み込み済みモジュールを再初期化し、新しいモジュールを返す。
    fn reload(&self, module: &ModuleRef) -> Result<ModuleRef, ImportError>;

    /// ホストに組み込まれたトップレベルモジュール名。
    fn builtin_module_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// ホストが既定で使う検索パス。
    fn search_path(&self) -> Vec<PathBuf> {
        Vec::new()
    }
}
