// パス: src/proxy.rs
// 役割: 未読み込みモジュールの代役となる遅延プロキシ（昇格とサブモジュール連鎖）
// 意図: 初回アクセスまで import コストを払わず、以降は実モジュールと見分けがつかないようにする
// 関連ファイル: src/namespace.rs, src/host/mod.rs, src/value.rs
//! 遅延プロキシ `LazyModule`。
//!
//! 状態は `Unresolved` → `Resolved(module)` の一方向のみ。
//! - 昇格（promotion）は属性参照・代入・呼び出し・`as_value` などで起きる。
//! - 昇格は状態ロックを保持したまま import するため、並行アクセスでも import は 1 回。
//! - import 失敗は記録しない。次のアクセスで再び import を試みる。
//! - 名前空間に束縛されている場合、昇格時にその束縛を実モジュールへ差し替える。
//! - 実モジュールに無い属性は `path.attr` のサブモジュール import を試み、
//!   成功すれば解決済みの子プロキシとしてキャッシュする。

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::errors::{AccessError, ImportError};
use crate::host::Importer;
use crate::name::CanonicalName;
use crate::namespace::WeakNamespace;
use crate::value::{ModuleRef, Value};

enum ProxyState {
    Unresolved,
    Resolved(ModuleRef),
}

/// 昇格時に書き換える名前空間の束縛。
pub(crate) struct Binding {
    pub(crate) namespace: WeakNamespace,
    pub(crate) name: String,
}

struct ProxyInner {
    path: CanonicalName,
    importer: Arc<dyn Importer>,
    state: Mutex<ProxyState>,
    children: Mutex<BTreeMap<String, LazyModule>>,
    binding: Mutex<Option<Binding>>,
}

/// モジュールの遅延プロキシ。複製は同じプロキシを共有する。
#[derive(Clone)]
pub struct LazyModule {
    inner: Arc<ProxyInner>,
}

impl LazyModule {
    /// 未解決のプロキシを作る。import はまだ行わない。
    pub fn new(path: CanonicalName, importer: Arc<dyn Importer>) -> Self {
        Self::with_state(path, importer, ProxyState::Unresolved)
    }

    fn resolved(path: CanonicalName, importer: Arc<dyn Importer>, module: ModuleRef) -> Self {
        Self::with_state(path, importer, ProxyState::Resolved(module))
    }

    fn with_state(path: CanonicalName, importer: Arc<dyn Importer>, state: ProxyState) -> Self {
        Self {
            inner: Arc::new(ProxyInner {
                path,
                importer,
                state: Mutex::new(state),
                children: Mutex::new(BTreeMap::new()),
                binding: Mutex::new(None),
            }),
        }
    }

    pub fn path(&self) -> &CanonicalName {
        &self.inner.path
    }

    pub fn is_resolved(&self) -> bool {
        matches!(*self.inner.state.lock(), ProxyState::Resolved(_))
    }

    /// 昇格させずに、解決済みならその実モジュールを返す。
    pub fn peek(&self) -> Option<ModuleRef> {
        match &*self.inner.state.lock() {
            ProxyState::Resolved(module) => Some(module.clone()),
            ProxyState::Unresolved => None,
        }
    }

    pub fn ptr_eq(&self, other: &LazyModule) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn install(&self, binding: Binding) {
        *self.inner.binding.lock() = Some(binding);
    }

    /// 昇格。解決済みなら何もせず同じモジュールを返す。
    pub fn resolve(&self) -> Result<ModuleRef, ImportError> {
        let module = {
            let mut state = self.inner.state.lock();
            if let ProxyState::Resolved(module) = &*state {
                return Ok(module.clone());
            }
            debug!(module = %self.inner.path, "promoting lazy module");
            let module = self.inner.importer.import(&self.inner.path)?;
            module.attach_importer(&self.inner.importer);
            *state = ProxyState::Resolved(module.clone());
            module
        };
        self.rebind(&module);
        Ok(module)
    }

    fn rebind(&self, module: &ModuleRef) {
        let Some(binding) = self.inner.binding.lock().take() else {
            return;
        };
        if let Some(namespace) = binding.namespace.upgrade() {
            if namespace.replace_proxy(&binding.name, self, Value::Module(module.clone())) {
                trace!(name = %binding.name, module = %self.inner.path, "namespace binding promoted");
            }
        }
    }

    /// 属性参照。子プロキシ → モジュール属性 → サブモジュール import の順に探す。
    pub fn get_attr(&self, attr: &str) -> Result<Value, AccessError> {
        let module = self.resolve()?;
        if let Some(child) = self.inner.children.lock().get(attr) {
            return Ok(Value::Proxy(child.clone()));
        }
        match module.get(attr) {
            Some(Value::Module(sub)) if self.is_submodule(&sub, attr) => {
                Ok(Value::Proxy(self.adopt_child(attr, sub)))
            }
            Some(value) => Ok(value),
            None => self.import_child(attr, &module),
        }
    }

    fn is_submodule(&self, module: &ModuleRef, attr: &str) -> bool {
        self.inner
            .path
            .child(attr)
            .map(|name| &name == module.name())
            .unwrap_or(false)
    }

    fn adopt_child(&self, attr: &str, module: ModuleRef) -> LazyModule {
        let mut children = self.inner.children.lock();
        children
            .entry(attr.to_string())
            .or_insert_with(|| {
                module.attach_importer(&self.inner.importer);
                LazyModule::resolved(module.name().clone(), self.inner.importer.clone(), module)
            })
            .clone()
    }

    fn import_child(&self, attr: &str, module: &ModuleRef) -> Result<Value, AccessError> {
        let Ok(sub_name) = self.inner.path.child(attr) else {
            return Err(AccessError::no_attribute(module.describe(), attr));
        };
        match self.inner.importer.import(&sub_name) {
            Ok(sub) => {
                debug!(module = %sub_name, "imported submodule on attribute access");
                Ok(Value::Proxy(self.adopt_child(attr, sub)))
            }
            Err(ImportError::NotFound { name }) if name == sub_name => {
                Err(AccessError::no_attribute(module.describe(), attr))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 属性代入。昇格してから実モジュールへ書き込む。
    pub fn set_attr(&self, attr: &str, value: Value) -> Result<(), AccessError> {
        let module = self.resolve()?;
        self.inner.children.lock().remove(attr);
        module.set(attr, value);
        Ok(())
    }

    /// 呼び出し。昇格後、実モジュールへの呼び出しとして扱う。
    pub fn call(&self, args: &[Value]) -> Result<Value, AccessError> {
        let module = self.resolve()?;
        Value::Module(module).call(args)
    }

    /// 再読み込み。未解決なら 1 回だけ読み込む。
    pub fn reload(&self) -> Result<ModuleRef, ImportError> {
        let Some(current) = self.peek() else {
            return self.resolve();
        };
        let fresh = self.inner.importer.reload(&current)?;
        *self.inner.state.lock() = ProxyState::Resolved(fresh.clone());
        Ok(fresh)
    }

    /// 昇格してから属性名（子プロキシ含む）を列挙する。
    pub fn dir(&self) -> Result<Vec<String>, ImportError> {
        let module = self.resolve()?;
        let mut names: BTreeSet<String> = module.attribute_names().into_iter().collect();
        names.extend(self.inner.children.lock().keys().cloned());
        Ok(names.into_iter().collect())
    }
}

impl Display for LazyModule {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.peek() {
            Some(module) => Display::fmt(module.as_ref(), f),
            None => write!(f, "<lazy module '{}'>", self.inner.path),
        }
    }
}

impl Debug for LazyModule {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyModule")
            .field("path", &self.inner.path)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
