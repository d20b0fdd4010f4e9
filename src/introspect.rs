// パス: src/introspect.rs
// 役割: プロキシを意識した dir / reload / help 相当の補助関数
// 意図: 未解決のプロキシに対しても実モジュールと同じ結果を返す
// 関連ファイル: src/proxy.rs, src/value.rs, src/repl/cmd.rs

use std::fmt::Write as _;

use crate::errors::AccessError;
use crate::host::Importer;
use crate::value::{ModuleOrigin, Value};

/// 属性名の一覧。プロキシは昇格させてから列挙する。
pub fn dir(value: &Value) -> Result<Vec<String>, AccessError> {
    match value {
        Value::Proxy(proxy) => Ok(proxy.dir()?),
        Value::Module(module) => Ok(module.attribute_names()),
        Value::Function(_) => Ok(vec!["__name__".to_string()]),
        _ => Ok(Vec::new()),
    }
}

/// 再読み込み。プロキシは未解決なら 1 回読み込むだけ、解決済みならホストへ再読み込みを依頼する。
///
/// 昇格後に名前空間へ差し替わった実モジュールは `importer` で再読み込みする。
pub fn reload(value: &Value, importer: &dyn Importer) -> Result<Value, AccessError> {
    match value {
        Value::Proxy(proxy) => {
            proxy.reload()?;
            Ok(value.clone())
        }
        Value::Module(module) => Ok(Value::Module(importer.reload(module)?)),
        other => Err(AccessError::call(
            "reload",
            format!("'{}' はモジュールではありません", other.type_name()),
        )),
    }
}

/// 簡易ヘルプ文字列（名前・出自・`__doc__`・公開属性）。
pub fn help(value: &Value) -> Result<String, AccessError> {
    let resolved = value.as_value()?;
    let mut out = String::new();
    match &resolved {
        Value::Module(module) => {
            let _ = writeln!(out, "モジュール {}", module.name());
            let origin = match module.origin() {
                ModuleOrigin::Builtin => "(built-in)".to_string(),
                ModuleOrigin::File(path) => path.display().to_string(),
                ModuleOrigin::Archive { archive, entry } => {
                    format!("{}/{}", archive.display(), entry)
                }
            };
            let _ = writeln!(out, "  出自: {origin}");
            if let Some(doc) = module.doc() {
                let _ = writeln!(out, "  説明: {doc}");
            }
            let public: Vec<String> = dir(value)?
                .into_iter()
                .filter(|name| !name.starts_with('_'))
                .collect();
            let _ = write!(out, "  属性: {}", public.join(", "));
        }
        Value::Function(func) => {
            let _ = write!(out, "組み込み関数 {}", func.name());
        }
        other => {
            let _ = write!(out, "{} の値 {}", other.type_name(), other);
        }
    }
    Ok(out)
}
