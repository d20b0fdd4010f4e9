// パス: src/namespace.rs
// 役割: 利用者が所有する「素の名前 → 値」の束縛環境（Target Namespace）
// 意図: グローバル名前空間の代わりに明示的に受け渡せる共有マップを提供する
// 関連ファイル: src/inject.rs, src/proxy.rs, src/repl/cmd.rs

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::errors::AccessError;
use crate::proxy::LazyModule;
use crate::value::Value;

type Bindings = RwLock<BTreeMap<String, Value>>;

/// 共有される名前空間ハンドル。複製は同じ束縛表を指す。
#[derive(Clone, Default)]
pub struct Namespace {
    inner: Arc<Bindings>,
}

/// プロキシが保持する弱参照。名前空間の寿命を延ばさない。
#[derive(Clone)]
pub(crate) struct WeakNamespace(Weak<Bindings>);

impl WeakNamespace {
    pub(crate) fn upgrade(&self) -> Option<Namespace> {
        self.0.upgrade().map(|inner| Namespace { inner })
    }
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.inner.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().contains_key(name)
    }

    /// 利用者による束縛。既存の束縛は置き換え、旧値を返す。
    pub fn insert(&self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.inner.write().insert(name.into(), value)
    }

    pub fn remove(&self, name: &str) -> Option<Value> {
        self.inner.write().remove(name)
    }

    /// 未束縛のときだけ束縛する。束縛したら `true`。
    pub fn bind_if_absent(&self, name: &str, value: Value) -> bool {
        let mut bindings = self.inner.write();
        if bindings.contains_key(name) {
            return false;
        }
        bindings.insert(name.to_string(), value);
        true
    }

    /// 束縛名の一覧（辞書順）。
    pub fn names(&self) -> Vec<String> {
        self.inner.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// 素の名前を引く。未束縛なら `NameNotDefined`。
    pub fn lookup(&self, name: &str) -> Result<Value, AccessError> {
        self.get(name)
            .ok_or_else(|| AccessError::NameNotDefined(name.to_string()))
    }

    /// `a.b.c` を先頭の束縛から属性参照で辿る。
    ///
    /// # Examples
    /// ```
    /// use autoimp::{Namespace, Value};
    /// let ns = Namespace::new();
    /// ns.insert("answer", Value::Int(42));
    /// assert_eq!(ns.lookup_path("answer").unwrap(), Value::Int(42));
    /// assert!(ns.lookup_path("missing.attr").is_err());
    /// ```
    pub fn lookup_path(&self, dotted: &str) -> Result<Value, AccessError> {
        let mut segments = dotted.split('.');
        let head = segments.next().unwrap_or_default();
        let mut value = self.lookup(head)?;
        for attr in segments {
            value = value.get_attr(attr)?;
        }
        Ok(value)
    }

    pub fn ptr_eq(&self, other: &Namespace) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn downgrade(&self) -> WeakNamespace {
        WeakNamespace(Arc::downgrade(&self.inner))
    }

    /// `name` がまだ `proxy` を指している場合に限り `value` へ差し替える。
    pub(crate) fn replace_proxy(&self, name: &str, proxy: &LazyModule, value: Value) -> bool {
        let mut bindings = self.inner.write();
        let still_proxy = matches!(
            bindings.get(name),
            Some(Value::Proxy(current)) if current.ptr_eq(proxy)
        );
        if still_proxy {
            bindings.insert(name.to_string(), value);
        }
        still_proxy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_if_absent_keeps_existing_value() {
        let ns = Namespace::new();
        ns.insert("os", Value::str("sentinel"));
        assert!(!ns.bind_if_absent("os", Value::Int(1)));
        assert_eq!(ns.get("os"), Some(Value::str("sentinel")));
        assert!(ns.bind_if_absent("sys", Value::Int(1)));
    }

    #[test]
    fn lookup_of_unbound_name_fails() {
        let ns = Namespace::new();
        let err = ns.lookup("nope").unwrap_err();
        assert_eq!(err.to_string(), "[ACCESS001] name 'nope' is not defined");
    }

    #[test]
    fn clones_share_bindings() {
        let a = Namespace::new();
        let b = a.clone();
        a.insert("x", Value::Int(1));
        assert_eq!(b.get("x"), Some(Value::Int(1)));
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn weak_handle_does_not_keep_namespace_alive() {
        let ns = Namespace::new();
        let weak = ns.downgrade();
        assert!(weak.upgrade().is_some());
        drop(ns);
        assert!(weak.upgrade().is_none());
    }
}
