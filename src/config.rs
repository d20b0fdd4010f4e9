// パス: src/config.rs
// 役割: 活性化（走査＋注入）に必要な設定をまとめる
// 意図: ライブラリ利用者と CLI が同じ設定構造体を組み立てられるようにする
// 関連ファイル: src/lib.rs, src/search_path.rs, src/bin/autoimp.rs

use crate::aliases::{default_table, AliasTable};
use crate::inject::{InjectOptions, RebindPolicy};
use crate::scanner::ScanOptions;
use crate::search_path::SearchPath;

/// 活性化の設定。既定値は同梱の別名表・標準の走査規則・空の検索パス。
///
/// 検索パスが空のときは `Importer::search_path()` が使われる。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivationConfig {
    pub search_path: SearchPath,
    pub scan: ScanOptions,
    pub inject: InjectOptions,
    pub aliases: AliasTable,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            search_path: SearchPath::default(),
            scan: ScanOptions::default(),
            inject: InjectOptions::default(),
            aliases: default_table().clone(),
        }
    }
}

impl ActivationConfig {
    /// `AUTOIMP_PATH` があれば検索パスに使う。
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(path) = SearchPath::from_env() {
            config.search_path = path;
        }
        config
    }

    pub fn with_search_path(mut self, search_path: SearchPath) -> Self {
        self.search_path = search_path;
        self
    }

    pub fn with_aliases(mut self, aliases: AliasTable) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_scan(mut self, scan: ScanOptions) -> Self {
        self.scan = scan;
        self
    }

    pub fn with_inject(mut self, inject: InjectOptions) -> Self {
        self.inject = inject;
        self
    }

    pub fn with_rebind(mut self, rebind: RebindPolicy) -> Self {
        self.inject.rebind = rebind;
        self
    }
}
