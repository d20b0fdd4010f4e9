// パス: src/host/registry.rs
// 役割: メモリ上に登録した初期化関数からモジュールを生成するホスト実装
// 意図: 組み込みモジュールを持つ埋め込み先や、import 回数を観測したいテストで使う
// 関連ファイル: src/host/mod.rs, src/value.rs, tests/proxy_promotion.rs

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use super::Importer;
use crate::errors::{ImportError, NameError};
use crate::name::CanonicalName;
use crate::value::{Module, ModuleOrigin, ModuleRef, Value};

/// モジュール初期化関数。失敗時は利用者向けのメッセージを返す。
///
/// 初期化関数の中から同じレジストリへ import してはならない（import ロック保持中に呼ばれる）。
pub type ModuleInit = Arc<dyn Fn(&Module) -> Result<(), String> + Send + Sync>;

/// 初期化関数の登録表と読み込み済みモジュール表を持つホスト。
///
/// # Examples
/// ```
/// use autoimp::{CanonicalName, Importer, ModuleRegistry, Value};
/// let host = ModuleRegistry::new();
/// host.define("math", |m| {
///     m.set("pi", Value::Float(std::f64::consts::PI));
///     Ok(())
/// })
/// .unwrap();
/// let math = host.import(&CanonicalName::parse("math").unwrap()).unwrap();
/// assert!(math.contains("pi"));
/// assert_eq!(host.import_count("math"), 1);
/// ```
#[derive(Default)]
pub struct ModuleRegistry {
    specs: RwLock<BTreeMap<CanonicalName, ModuleInit>>,
    // 読み込み済み表。ロック自体が import ロックを兼ねる。
    loaded: Mutex<HashMap<CanonicalName, ModuleRef>>,
    counts: Mutex<HashMap<CanonicalName, usize>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 検証済みの名前で初期化関数を登録する。既存の登録は置き換える。
    pub fn register(&self, name: CanonicalName, init: ModuleInit) {
        self.specs.write().insert(name, init);
    }

    /// ドット区切り名で初期化関数を登録する。
    pub fn define<F>(&self, dotted: &str, init: F) -> Result<(), NameError>
    where
        F: Fn(&Module) -> Result<(), String> + Send + Sync + 'static,
    {
        let name = CanonicalName::parse(dotted)?;
        self.register(name, Arc::new(init));
        Ok(())
    }

    /// 実際に初期化関数が走った回数（失敗した試行も含む）。
    pub fn import_count(&self, dotted: &str) -> usize {
        match CanonicalName::parse(dotted) {
            Ok(name) => self.counts.lock().get(&name).copied().unwrap_or(0),
            Err(_) => 0,
        }
    }

    pub fn is_loaded(&self, dotted: &str) -> bool {
        match CanonicalName::parse(dotted) {
            Ok(name) => self.loaded.lock().contains_key(&name),
            Err(_) => false,
        }
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
        let init = self
            .specs
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ImportError::not_found(name))?;

        let module = Module::new(name.clone(), ModuleOrigin::Builtin);
        *self.counts.lock().entry(name.clone()).or_default() += 1;
        debug!(module = %name, "initializing registered module");
        init(&module).map_err(|message| ImportError::initialization(name, message))?;

        loaded.insert(name.clone(), module.clone());
        if let Some(parent) = parent {
            parent.set(name.tail(), Value::Module(module.clone()));
        }
        Ok(module)
    }
}

impl Importer for ModuleRegistry {
    fn import(&self, name: &CanonicalName) -> Result<ModuleRef, ImportError> {
        let mut loaded = self.loaded.lock();
        self.import_locked(&mut loaded, name)
    }

    fn find(&self, name: &CanonicalName) -> bool {
        self.specs.read().contains_key(name)
    }

    fn reload(&self, module: &ModuleRef) -> Result<ModuleRef, ImportError> {
        let _loaded = self.loaded.lock();
        let name = module.name();
        let init = self
            .specs
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ImportError::not_found(name))?;
        *self.counts.lock().entry(name.clone()).or_default() += 1;
        debug!(module = %name, "reloading registered module");
        init(module).map_err(|message| ImportError::initialization(name, message))?;
        Ok(module.clone())
    }

    fn builtin_module_names(&self) -> Vec<String> {
        self.specs
            .read()
            .keys()
            .filter(|name| name.is_top_level())
            .map(|name| name.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> CanonicalName {
        CanonicalName::parse(s).unwrap()
    }

    #[test]
    fn importing_a_submodule_attaches_it_to_the_parent() {
        let host = ModuleRegistry::new();
        host.define("pkg", |_| Ok(())).unwrap();
        host.define("pkg.sub", |m| {
            m.set("x", Value::Int(1));
            Ok(())
        })
        .unwrap();

        let sub = host.import(&name("pkg.sub")).unwrap();
        let pkg = host.import(&name("pkg")).unwrap();
        assert_eq!(pkg.get("sub"), Some(Value::Module(sub)));
        assert_eq!(host.import_count("pkg"), 1);
        assert_eq!(host.import_count("pkg.sub"), 1);
    }

    #[test]
    fn missing_parent_is_reported_by_its_own_name() {
        let host = ModuleRegistry::new();
        host.define("ghost.child", |_| Ok(())).unwrap();
        let err = host.import(&name("ghost.child")).unwrap_err();
        assert_eq!(err, ImportError::not_found(&name("ghost")));
    }

    #[test]
    fn failed_initialization_is_not_cached() {
        let host = ModuleRegistry::new();
        host.define("flaky", |_| Err("boom".to_string())).unwrap();
        assert!(matches!(
            host.import(&name("flaky")),
            Err(ImportError::Initialization { .. })
        ));
        assert!(!host.is_loaded("flaky"));

        host.define("flaky", |_| Ok(())).unwrap();
        assert!(host.import(&name("flaky")).is_ok());
        assert_eq!(host.import_count("flaky"), 2);
    }

    #[test]
    fn reload_reinitializes_in_place() {
        let host = ModuleRegistry::new();
        host.define("counter", |m| {
            let next = match m.get("n") {
                Some(Value::Int(n)) => n + 1,
                _ => 0,
            };
            m.set("n", Value::Int(next));
            Ok(())
        })
        .unwrap();
        let m = host.import(&name("counter")).unwrap();
        let again = host.reload(&m).unwrap();
        assert!(Arc::ptr_eq(&m, &again));
        assert_eq!(m.get("n"), Some(Value::Int(1)));
    }

    #[test]
    fn builtin_names_are_top_level_only() {
        let host = ModuleRegistry::new();
        host.define("a", |_| Ok(())).unwrap();
        host.define("a.b", |_| Ok(())).unwrap();
        host.define("c", |_| Ok(())).unwrap();
        assert_eq!(host.builtin_module_names(), vec!["a", "c"]);
        assert!(host.find(&name("a.b")));
        assert!(!host.find(&name("d")));
    }
}
