// パス: src/lib.rs
// 役割: クレートルート。各モジュールの配線と活性化 API を公開する
// 意図: 利用者が `activate` 1 回で名前空間へ遅延モジュールを揃えられるようにする
// 関連ファイル: src/inject.rs, src/scanner.rs, src/proxy.rs
//! autoimp (Rust) ルートモジュール
//!
//! 目的:
//! - 検索パス上の import 可能なモジュールをすべて「素の名前」で使えるようにする。
//! - 実際の読み込みは初回アクセスまで遅らせる。
//!
//! 構成（葉から順に）:
//! - `scanner`: import 可能なトップレベル名の列挙
//! - `aliases`: `np` → `numpy` などの静的別名表
//! - `proxy`: 未読み込みモジュールの遅延プロキシ
//! - `inject`: 名前空間へのプロキシ束縛
//! - `host`: ホストの import 機構（トレイトと参照実装）
//! - `introspect` / `repl`: 対話利用のための補助と REPL
//!
//! 方針:
//! - コメント/ドキュメントは日本語、識別子は英語。
//! - 名前空間は明示的に受け渡す（暗黙のグローバルは持たない）。

pub mod aliases;
pub mod config;
pub mod errors;
pub mod host;
pub mod inject;
pub mod introspect;
pub mod literal;
pub mod name;
pub mod namespace;
pub mod proxy;
pub mod repl;
pub mod scanner;
pub mod search_path;
pub mod value;

use std::sync::Arc;

use tracing::debug;

pub use crate::aliases::{default_table, AliasTable};
pub use crate::config::ActivationConfig;
pub use crate::errors::{AccessError, AliasError, ImportError, NameError, ScanIssue};
pub use crate::host::{FsImporter, Importer, ModuleRegistry};
pub use crate::inject::{InjectOptions, InjectReport, Injector, RebindPolicy};
pub use crate::name::CanonicalName;
pub use crate::namespace::Namespace;
pub use crate::proxy::LazyModule;
pub use crate::scanner::{Discovery, ScanOptions, Scanner};
pub use crate::search_path::SearchPath;
pub use crate::value::{Module, ModuleOrigin, ModuleRef, NativeFunction, Value};

/// 活性化 1 回分の結果。
#[derive(Clone, Debug, Default)]
pub struct ActivationReport {
    pub discovery: Discovery,
    pub injection: InjectReport,
}

/// 走査して見つかった全モジュールと別名を、遅延プロキシとして名前空間へ束縛する。
///
/// 既存の束縛は上書きしないため、何度呼んでも結果は変わらない。
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use autoimp::{activate, ActivationConfig, ModuleRegistry, Namespace, Value};
///
/// let host = Arc::new(ModuleRegistry::new());
/// host.define("numpy", |m| {
///     m.set("pi", Value::Float(std::f64::consts::PI));
///     Ok(())
/// })
/// .unwrap();
///
/// let ns = Namespace::new();
/// activate(&ns, host.clone(), &ActivationConfig::default());
/// assert_eq!(host.import_count("numpy"), 0);
///
/// let pi = ns.lookup_path("np.pi").unwrap();
/// assert_eq!(pi, Value::Float(std::f64::consts::PI));
/// assert_eq!(host.import_count("numpy"), 1);
/// ```
pub fn activate(
    namespace: &Namespace,
    importer: Arc<dyn Importer>,
    config: &ActivationConfig,
) -> ActivationReport {
    let search_path = if config.search_path.is_empty() {
        SearchPath::new(importer.search_path())
    } else {
        config.search_path.clone()
    };
    let discovery = Scanner::new(config.scan.clone()).discover(&search_path, importer.as_ref());
    let injection = Injector::new(importer, config.inject.clone()).inject(
        namespace,
        &discovery.names,
        &config.aliases,
    );
    debug!(
        discovered = discovery.names.len(),
        issues = discovery.issues.len(),
        bound = injection.total_bound(),
        "activation finished"
    );
    ActivationReport {
        discovery,
        injection,
    }
}
