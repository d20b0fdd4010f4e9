// パス: src/value.rs
// 役割: ホスト側オブジェクト（モジュール・関数・定数・遅延プロキシ）の値モデル
// 意図: 名前空間・プロキシ・ホスト実装が共通の値表現でやり取りできるようにする
// 関連ファイル: src/proxy.rs, src/namespace.rs, src/host/mod.rs
//! 値モデル。
//!
//! 仕様要点:
//! - `Module` と `Function` は同一性（`Arc` のポインタ）で比較する。
//! - それ以外の値は構造で比較する。
//! - `Proxy` に対する操作は必ず昇格（実 import）を経てから実モジュールへ転送される。

use std::collections::BTreeMap;
use std::fmt::{self, Debug, Display, Formatter};
use std::path::PathBuf;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::errors::{AccessError, ImportError};
use crate::host::Importer;
use crate::name::CanonicalName;
use crate::proxy::LazyModule;

/// モジュールの共有ハンドル。
pub type ModuleRef = Arc<Module>;

/// ネイティブ関数の本体。
pub type NativeFn = dyn Fn(&[Value]) -> Result<Value, AccessError> + Send + Sync;

#[derive(Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Module(ModuleRef),
    Function(NativeFunction),
    Proxy(LazyModule),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    /// 利用者向けの型名（エラーメッセージ用）。
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Module(_) | Value::Proxy(_) => "module",
            Value::Function(_) => "builtin_function_or_method",
        }
    }

    /// 属性参照。プロキシなら昇格してから転送する。
    pub fn get_attr(&self, attr: &str) -> Result<Value, AccessError> {
        match self {
            Value::Proxy(proxy) => proxy.get_attr(attr),
            Value::Module(module) => module
                .get_or_import(attr)?
                .ok_or_else(|| AccessError::no_attribute(module.describe(), attr)),
            Value::Function(func) if attr == "__name__" => Ok(Value::str(func.name())),
            other => Err(AccessError::no_attribute(
                format!("'{}' object", other.type_name()),
                attr,
            )),
        }
    }

    /// 属性代入。モジュール以外は受け付けない。
    pub fn set_attr(&self, attr: &str, value: Value) -> Result<(), AccessError> {
        match self {
            Value::Proxy(proxy) => proxy.set_attr(attr, value),
            Value::Module(module) => {
                module.set(attr, value);
                Ok(())
            }
            other => Err(AccessError::no_attribute(
                format!("'{}' object", other.type_name()),
                attr,
            )),
        }
    }

    /// 呼び出し。関数以外（モジュールを含む）は `NotCallable`。
    pub fn call(&self, args: &[Value]) -> Result<Value, AccessError> {
        match self {
            Value::Function(func) => func.call(args),
            Value::Proxy(proxy) => proxy.call(args),
            other => Err(AccessError::NotCallable {
                type_name: other.type_name(),
            }),
        }
    }

    /// プロキシを剥がした実体を返す。プロキシ以外はそのまま複製する。
    pub fn as_value(&self) -> Result<Value, AccessError> {
        match self {
            Value::Proxy(proxy) => Ok(Value::Module(proxy.resolve()?)),
            other => Ok(other.clone()),
        }
    }

    /// Python の `is` 相当。プロキシは昇格させてから比較する。
    pub fn same_object(&self, other: &Value) -> Result<bool, AccessError> {
        let (a, b) = (self.as_value()?, other.as_value()?);
        Ok(match (&a, &b) {
            (Value::Module(x), Value::Module(y)) => Arc::ptr_eq(x, y),
            (Value::Function(x), Value::Function(y)) => x.ptr_eq(y),
            _ => a == b,
        })
    }

    /// 文字列化。プロキシは昇格してから実モジュールの表現を返す。
    pub fn repr(&self) -> Result<String, AccessError> {
        Ok(self.as_value()?.to_string())
    }

    pub fn as_module(&self) -> Option<&ModuleRef> {
        match self {
            Value::Module(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_proxy(&self) -> Option<&LazyModule> {
        match self {
            Value::Proxy(p) => Some(p),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Int(x), Value::Int(y)) => x == y,
            (Value::Float(x), Value::Float(y)) => x == y,
            (Value::Int(x), Value::Float(y)) | (Value::Float(y), Value::Int(x)) => {
                (*x as f64) == *y
            }
            (Value::Str(x), Value::Str(y)) => x == y,
            (Value::List(xs), Value::List(ys)) => xs == ys,
            (Value::Module(x), Value::Module(y)) => Arc::ptr_eq(x, y),
            (Value::Function(x), Value::Function(y)) => x.ptr_eq(y),
            (Value::Proxy(x), Value::Proxy(y)) => x.ptr_eq(y),
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(d) if d.fract() == 0.0 && d.is_finite() => write!(f, "{d:.1}"),
            Value::Float(d) => write!(f, "{d}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Module(m) => Display::fmt(m.as_ref(), f),
            Value::Function(func) => write!(f, "<built-in function {}>", func.name()),
            Value::Proxy(p) => Display::fmt(p, f),
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

/// モジュールの出自。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModuleOrigin {
    /// ホストに組み込まれたモジュール。
    Builtin,
    /// ファイルから読み込まれたモジュール。
    File(PathBuf),
    /// zip アーカイブ内のエントリから読み込まれたモジュール。
    Archive { archive: PathBuf, entry: String },
}

/// 実モジュール。属性表はスレッド間で共有される。
pub struct Module {
    name: CanonicalName,
    origin: ModuleOrigin,
    attrs: RwLock<BTreeMap<String, Value>>,
    // 属性が見つからないときにサブモジュールを import するホスト。
    importer: RwLock<Option<Weak<dyn Importer>>>,
}

impl Module {
    /// `__name__` を設定した空のモジュールを作る。
    pub fn new(name: CanonicalName, origin: ModuleOrigin) -> ModuleRef {
        let mut attrs = BTreeMap::new();
        attrs.insert("__name__".to_string(), Value::str(name.to_string()));
        Arc::new(Self {
            name,
            origin,
            attrs: RwLock::new(attrs),
            importer: RwLock::new(None),
        })
    }

    pub fn name(&self) -> &CanonicalName {
        &self.name
    }

    pub fn origin(&self) -> &ModuleOrigin {
        &self.origin
    }

    pub fn get(&self, attr: &str) -> Option<Value> {
        self.attrs.read().get(attr).cloned()
    }

    /// 属性を引く。無ければ紐付いたホストで `name.attr` の import を試みる。
    ///
    /// 該当するサブモジュールが存在しなければ `Ok(None)`。
    pub fn get_or_import(&self, attr: &str) -> Result<Option<Value>, ImportError> {
        if let Some(value) = self.get(attr) {
            if let Value::Module(sub) = &value {
                self.share_importer(sub);
            }
            return Ok(Some(value));
        }
        let Some(importer) = self.importer.read().as_ref().and_then(Weak::upgrade) else {
            return Ok(None);
        };
        let Ok(sub_name) = self.name.child(attr) else {
            return Ok(None);
        };
        match importer.import(&sub_name) {
            Ok(sub) => {
                self.share_importer(&sub);
                Ok(Some(Value::Module(sub)))
            }
            Err(ImportError::NotFound { name }) if name == sub_name => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// サブモジュール import に使うホストを紐付ける。
    pub(crate) fn attach_importer(&self, importer: &Arc<dyn Importer>) {
        *self.importer.write() = Some(Arc::downgrade(importer));
    }

    fn share_importer(&self, sub: &Module) {
        if sub.importer.read().is_some() {
            return;
        }
        let own = self.importer.read().clone();
        if own.is_some() {
            *sub.importer.write() = own;
        }
    }

    pub fn contains(&self, attr: &str) -> bool {
        self.attrs.read().contains_key(attr)
    }

    pub fn set(&self, attr: &str, value: Value) {
        self.attrs.write().insert(attr.to_string(), value);
    }

    pub fn remove(&self, attr: &str) -> Option<Value> {
        self.attrs.write().remove(attr)
    }

    /// ネイティブ関数を属性として登録する。
    pub fn define_fn<F>(&self, name: &str, f: F)
    where
        F: Fn(&[Value]) -> Result<Value, AccessError> + Send + Sync + 'static,
    {
        self.set(name, Value::Function(NativeFunction::new(name, f)));
    }

    /// 属性名の一覧（辞書順）。
    pub fn attribute_names(&self) -> Vec<String> {
        self.attrs.read().keys().cloned().collect()
    }

    /// `__doc__` が文字列なら返す。
    pub fn doc(&self) -> Option<String> {
        match self.get("__doc__") {
            Some(Value::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// エラーメッセージ用の表記（`module 'os'`）。
    pub fn describe(&self) -> String {
        format!("module '{}'", self.name)
    }
}

impl Display for Module {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.origin {
            ModuleOrigin::Builtin => write!(f, "<module '{}' (built-in)>", self.name),
            ModuleOrigin::File(path) => {
                write!(f, "<module '{}' from '{}'>", self.name, path.display())
            }
            ModuleOrigin::Archive { archive, entry } => write!(
                f,
                "<module '{}' from '{}/{}'>",
                self.name,
                archive.display(),
                entry
            ),
        }
    }
}

impl Debug for Module {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// ホストが提供するネイティブ関数。
#[derive(Clone)]
pub struct NativeFunction {
    name: Arc<str>,
    func: Arc<NativeFn>,
}

impl NativeFunction {
    pub fn new<F>(name: &str, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, AccessError> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name),
            func: Arc::new(f),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, AccessError> {
        (self.func)(args)
    }

    pub fn ptr_eq(&self, other: &NativeFunction) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(name: &str) -> ModuleRef {
        Module::new(CanonicalName::parse(name).unwrap(), ModuleOrigin::Builtin)
    }

    #[test]
    fn module_has_dunder_name() {
        let m = module("os.path");
        assert_eq!(m.get("__name__"), Some(Value::str("os.path")));
    }

    #[test]
    fn modules_compare_by_identity() {
        let a = module("os");
        let b = module("os");
        assert_eq!(Value::Module(a.clone()), Value::Module(a.clone()));
        assert_ne!(Value::Module(a), Value::Module(b));
    }

    #[test]
    fn calling_a_module_is_a_type_mismatch() {
        let err = Value::Module(module("os")).call(&[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "[ACCESS003] 'module' object is not callable"
        );
    }

    #[test]
    fn missing_module_attribute_names_the_module() {
        let err = Value::Module(module("os")).get_attr("nope").unwrap_err();
        assert_eq!(
            err.to_string(),
            "[ACCESS002] module 'os' has no attribute 'nope'"
        );
    }

    #[test]
    fn native_function_forwards_arguments() {
        let m = module("operator");
        m.define_fn("add", |args| match args {
            [Value::Int(a), Value::Int(b)] => Ok(Value::Int(a + b)),
            _ => Err(AccessError::call("add", "int が 2 つ必要です")),
        });
        let add = m.get("add").unwrap();
        assert_eq!(add.call(&[Value::Int(1), Value::Int(2)]).unwrap(), Value::Int(3));
        assert!(add.call(&[]).is_err());
        assert_eq!(add.get_attr("__name__").unwrap(), Value::str("add"));
    }

    #[test]
    fn display_forms() {
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::Float(0.5).to_string(), "0.5");
        assert_eq!(
            Value::List(vec![Value::Int(1), Value::str("a"), Value::None]).to_string(),
            "[1, \"a\", None]"
        );
        assert_eq!(
            Value::Module(module("os")).to_string(),
            "<module 'os' (built-in)>"
        );
    }
}
