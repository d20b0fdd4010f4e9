// パス: tests/test_support.rs
// 役割: 統合テスト共通のホスト・名前空間フィクスチャを提供する
// 意図: 科学計算系パッケージ風のモジュール群を毎回同じ形で用意しテストを簡潔に保つ
// 関連ファイル: tests/proxy_promotion.rs, tests/injector.rs, tests/scanner_fs.rs
#![allow(dead_code)]
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use autoimp::{
    default_table, AliasTable, CanonicalName, InjectOptions, InjectReport, Injector,
    ModuleRegistry, Namespace, RebindPolicy, Value,
};

/// numpy / scipy / os / matplotlib 風のモジュールを登録したホスト。
pub fn science_registry() -> Arc<ModuleRegistry> {
    let host = Arc::new(ModuleRegistry::new());
    host.define("numpy", |m| {
        m.set("__doc__", Value::str("array computing"));
        m.set("pi", Value::Float(std::f64::consts::PI));
        m.define_fn("zeros", |args| match args {
            [Value::Int(n)] => Ok(Value::List(vec![Value::Float(0.0); *n as usize])),
            _ => Err(autoimp::AccessError::call("zeros", "expected one int")),
        });
        Ok(())
    })
    .expect("define numpy");
    host.define("scipy", |m| {
        m.set("__version__", Value::str("1.0"));
        Ok(())
    })
    .expect("define scipy");
    host.define("scipy.linalg", |m| {
        m.define_fn("eig", |_args| Ok(Value::str("eigenvalues")));
        Ok(())
    })
    .expect("define scipy.linalg");
    host.define("os", |m| {
        m.set("sep", Value::str("/"));
        Ok(())
    })
    .expect("define os");
    host.define("os.path", |m| {
        m.define_fn("join", |args| {
            let parts: Vec<String> = args
                .iter()
                .map(|a| match a {
                    Value::Str(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            Ok(Value::str(parts.join("/")))
        });
        Ok(())
    })
    .expect("define os.path");
    host.define("matplotlib", |_| Ok(()))
        .expect("define matplotlib");
    host.define("matplotlib.pylab", |m| {
        m.define_fn("plot", |_args| Ok(Value::None));
        Ok(())
    })
    .expect("define matplotlib.pylab");
    host
}

pub fn names(list: &[&str]) -> BTreeSet<CanonicalName> {
    list.iter()
        .map(|s| CanonicalName::parse(s).expect("valid name"))
        .collect()
}

/// 登録済みのトップレベル名と同梱の別名表で名前空間を活性化する。
pub fn activated(
    host: &Arc<ModuleRegistry>,
    rebind: RebindPolicy,
) -> (Namespace, InjectReport) {
    activated_with(host, rebind, default_table())
}

pub fn activated_with(
    host: &Arc<ModuleRegistry>,
    rebind: RebindPolicy,
    aliases: &AliasTable,
) -> (Namespace, InjectReport) {
    let ns = Namespace::new();
    let report = Injector::new(host.clone(), InjectOptions::default().with_rebind(rebind))
        .inject(&ns, &names(&["numpy", "scipy", "os", "matplotlib"]), aliases);
    (ns, report)
}

/// 相対パスでファイルを書き込む（親ディレクトリも作る）。
pub fn write_file(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(&path, contents).expect("write fixture file");
}

/// (エントリ名, 内容) の組から無圧縮の zip を作る。
pub fn write_zip(path: &Path, entries: &[(&str, &str)]) {
    let file = fs::File::create(path).expect("create zip");
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);
    for (name, contents) in entries {
        writer.start_file(*name, options).expect("start zip entry");
        writer
            .write_all(contents.as_bytes())
            .expect("write zip entry");
    }
    writer.finish().expect("finish zip");
}
