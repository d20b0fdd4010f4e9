// パス: src/inject.rs
// 役割: 走査結果と別名表から遅延プロキシを作り、対象の名前空間へ束縛する
// 意図: 既存の束縛を壊さず、何度実行しても同じ結果になる活性化を提供する
// 関連ファイル: src/proxy.rs, src/namespace.rs, src/aliases.rs, src/lib.rs
//! 名前空間インジェクタ。
//!
//! 仕様要点:
//! - 既に束縛されている名前は決して上書きしない（2 回目以降の実行は何もしない）。
//! - `_` で始まる名前は特例（`__builtin__` など）を除き束縛しない。
//! - ホストの組み込み関数名（`reserved`）と同名のモジュールは束縛しない。
//! - 別名が走査で見つかった正式名と衝突する場合は正式名を優先し、別名は黙って捨てる。
//! - 別名には正式名とは独立したプロキシを作る（昇格状態は共有しない）。

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, trace};

use crate::aliases::AliasTable;
use crate::host::Importer;
use crate::name::CanonicalName;
use crate::namespace::Namespace;
use crate::proxy::{Binding, LazyModule};
use crate::value::Value;

/// 先頭 `_` でも束縛する特別なモジュール名。
pub const SPECIAL_MODULES: &[&str] = &["__builtin__", "__main__", "__future__"];

/// 昇格時に名前空間の束縛をどう扱うか。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RebindPolicy {
    /// 束縛を実モジュールへ差し替える。
    #[default]
    Promote,
    /// プロキシを残し、以降のサブモジュール参照も遅延 import させる。
    KeepProxy,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InjectOptions {
    pub rebind: RebindPolicy,
    /// 束縛対象から外す名前（ホストの組み込み関数など）。
    pub reserved: BTreeSet<String>,
    pub special_modules: BTreeSet<String>,
}

impl Default for InjectOptions {
    fn default() -> Self {
        Self {
            rebind: RebindPolicy::default(),
            reserved: BTreeSet::new(),
            special_modules: SPECIAL_MODULES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl InjectOptions {
    pub fn with_rebind(mut self, rebind: RebindPolicy) -> Self {
        self.rebind = rebind;
        self
    }

    pub fn with_reserved<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved.extend(names.into_iter().map(Into::into));
        self
    }

    fn admits(&self, name: &str) -> bool {
        if self.reserved.contains(name) {
            return false;
        }
        !name.starts_with('_') || self.special_modules.contains(name)
    }
}

/// 1 回の注入で何が起きたかの記録。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct InjectReport {
    pub bound: Vec<String>,
    pub aliases_bound: Vec<String>,
    /// 既存の束縛があったため触らなかった名前。
    pub skipped_existing: Vec<String>,
    /// 命名規則で除外した名前。
    pub filtered: Vec<String>,
    /// 正式名と衝突したため捨てた別名。
    pub aliases_shadowed: Vec<String>,
}

impl InjectReport {
    pub fn total_bound(&self) -> usize {
        self.bound.len() + self.aliases_bound.len()
    }
}

pub struct Injector {
    importer: Arc<dyn Importer>,
    options: InjectOptions,
}

impl Injector {
    pub fn new(importer: Arc<dyn Importer>, options: InjectOptions) -> Self {
        Self { importer, options }
    }

    pub fn options(&self) -> &InjectOptions {
        &self.options
    }

    /// 走査済みの名前と別名をプロキシとして束縛する。
    pub fn inject(
        &self,
        namespace: &Namespace,
        discovered: &BTreeSet<CanonicalName>,
        aliases: &AliasTable,
    ) -> InjectReport {
        let mut report = InjectReport::default();

        for name in discovered {
            let bare = name.to_string();
            if !name.is_top_level() || !self.options.admits(&bare) {
                report.filtered.push(bare);
                continue;
            }
            if self.bind_proxy(namespace, &bare, name) {
                trace!(name = %bare, "bound lazy module");
                report.bound.push(bare);
            } else {
                report.skipped_existing.push(bare);
            }
        }

        for (alias, target) in aliases.aliases() {
            if discovered.iter().any(|name| name.is_top_level() && name.head() == alias) {
                debug!(%alias, %target, "alias shadowed by discovered module");
                report.aliases_shadowed.push(alias.clone());
                continue;
            }
            if self.options.reserved.contains(alias) {
                report.filtered.push(alias.clone());
                continue;
            }
            if self.bind_proxy(namespace, alias, target) {
                trace!(%alias, %target, "bound alias");
                report.aliases_bound.push(alias.clone());
            } else {
                report.skipped_existing.push(alias.clone());
            }
        }

        debug!(
            bound = report.bound.len(),
            aliases = report.aliases_bound.len(),
            skipped = report.skipped_existing.len(),
            "namespace injection finished"
        );
        report
    }

    fn bind_proxy(&self, namespace: &Namespace, bare: &str, target: &CanonicalName) -> bool {
        if namespace.contains(bare) {
            return false;
        }
        let proxy = LazyModule::new(target.clone(), self.importer.clone());
        if self.options.rebind == RebindPolicy::Promote {
            proxy.install(Binding {
                namespace: namespace.downgrade(),
                name: bare.to_string(),
            });
        }
        namespace.bind_if_absent(bare, Value::Proxy(proxy))
    }
}
