// パス: tests/proxy_promotion.rs
// 役割: 遅延プロキシの昇格・束縛差し替え・サブモジュール連鎖の統合テスト
// 意図: 素の名前での参照が明示的な import と同じ結果になり、import が高々 1 回であることを保証する
// 関連ファイル: src/proxy.rs, src/namespace.rs, tests/test_support.rs
#[path = "test_support.rs"]
mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use autoimp::{
    activate, AccessError, ActivationConfig, AliasTable, Namespace, CanonicalName, ImportError, Importer, LazyModule, ModuleRegistry,
    RebindPolicy, Value,
};
use support::{activated, activated_with, science_registry};

#[test]
fn attribute_access_matches_explicit_import() {
    let host = science_registry();
    let (ns, _) = activated(&host, RebindPolicy::Promote);
    assert_eq!(host.import_count("numpy"), 0);

    let via_proxy = ns.lookup_path("numpy.pi").expect("numpy.pi");
    let explicit = host
        .import(&CanonicalName::parse("numpy").unwrap())
        .unwrap()
        .get("pi")
        .unwrap();
    assert_eq!(via_proxy, explicit);
    assert_eq!(host.import_count("numpy"), 1);
}

#[test]
fn promotion_rebinds_the_namespace_entry() {
    let host = science_registry();
    let (ns, _) = activated(&host, RebindPolicy::Promote);
    assert!(matches!(ns.get("numpy"), Some(Value::Proxy(_))));

    ns.lookup_path("numpy.pi").unwrap();
    let bound = ns.get("numpy").unwrap();
    let module = bound.as_module().expect("rebound to the real module");
    assert_eq!(module.name().to_string(), "numpy");

    // 2 回目以降の参照はプロキシを経由しない
    ns.lookup_path("numpy.pi").unwrap();
    assert_eq!(host.import_count("numpy"), 1);
}

#[test]
fn keep_proxy_policy_leaves_proxy_bound() {
    let host = science_registry();
    let (ns, _) = activated(&host, RebindPolicy::KeepProxy);
    ns.lookup_path("numpy.pi").unwrap();
    let bound = ns.get("numpy").unwrap();
    let proxy = bound.as_proxy().expect("still a proxy");
    assert!(proxy.is_resolved());
    assert_eq!(host.import_count("numpy"), 1);
}

#[test]
fn concurrent_first_access_imports_once() {
    let host = science_registry();
    let (ns, _) = activated(&host, RebindPolicy::KeepProxy);
    let proxy = ns.get("numpy").unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let proxy = proxy.clone();
            thread::spawn(move || proxy.get_attr("pi").map(|_| ()))
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread").expect("attribute access");
    }
    assert_eq!(host.import_count("numpy"), 1);
}

#[test]
fn concurrent_first_access_imports_once_with_default_config() {
    let host = science_registry();
    let ns = Namespace::new();
    activate(&ns, host.clone(), &ActivationConfig::default());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ns = ns.clone();
            thread::spawn(move || ns.lookup_path("numpy.pi").map(|_| ()))
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread").expect("attribute access");
    }
    assert_eq!(host.import_count("numpy"), 1);
    assert!(ns.get("numpy").unwrap().as_module().is_some());
}

#[test]
fn promoted_module_still_imports_new_submodules() {
    let host = science_registry();
    let ns = Namespace::new();
    activate(&ns, host.clone(), &ActivationConfig::default());

    ns.lookup_path("scipy.__version__").unwrap();
    assert!(ns.get("scipy").unwrap().as_module().is_some());
    assert_eq!(host.import_count("scipy.linalg"), 0);

    let eig = ns.lookup_path("scipy.linalg.eig").unwrap();
    assert_eq!(eig.call(&[]).unwrap(), Value::str("eigenvalues"));
    assert_eq!(host.import_count("scipy"), 1);
    assert_eq!(host.import_count("scipy.linalg"), 1);

    // 存在しない属性は従来どおり属性エラー
    let err = ns.lookup_path("scipy.not_a_submodule").unwrap_err();
    assert_eq!(err.code(), "ACCESS002");
}

#[test]
fn promoted_alias_still_imports_new_submodules() {
    let host = science_registry();
    let ns = Namespace::new();
    activate(&ns, host.clone(), &ActivationConfig::default());

    ns.lookup_path("sp.__version__").unwrap();
    ns.lookup_path("os.sep").unwrap();
    assert!(ns.get("sp").unwrap().as_module().is_some());

    let eig = ns.lookup_path("sp.linalg.eig").unwrap();
    assert_eq!(eig.call(&[]).unwrap(), Value::str("eigenvalues"));
    let joined = ns
        .lookup_path("os.path.join")
        .unwrap()
        .call(&[Value::str("x"), Value::str("y")])
        .unwrap();
    assert_eq!(joined, Value::str("x/y"));
    assert_eq!(host.import_count("scipy.linalg"), 1);
}

#[test]
fn alias_and_canonical_name_reach_the_same_module() {
    let host = science_registry();
    let (ns, report) = activated(&host, RebindPolicy::Promote);
    assert!(report.aliases_bound.contains(&"np".to_string()));

    let np = ns.get("np").unwrap();
    let numpy = ns.get("numpy").unwrap();
    assert!(np.same_object(&numpy).unwrap());
    assert_eq!(host.import_count("numpy"), 1);
}

#[test]
fn submodules_chain_through_attribute_access() {
    let host = science_registry();
    let (ns, _) = activated(&host, RebindPolicy::KeepProxy);

    let eig = ns.lookup_path("scipy.linalg.eig").unwrap();
    assert_eq!(eig.call(&[]).unwrap(), Value::str("eigenvalues"));
    assert_eq!(host.import_count("scipy"), 1);
    assert_eq!(host.import_count("scipy.linalg"), 1);

    let joined = ns
        .lookup_path("os.path.join")
        .unwrap()
        .call(&[Value::str("a"), Value::str("b")])
        .unwrap();
    assert_eq!(joined, Value::str("a/b"));
}

#[test]
fn dotted_alias_imports_its_parent_package() {
    let host = science_registry();
    let (ns, _) = activated(&host, RebindPolicy::Promote);
    let plot = ns.lookup_path("pylab.plot").unwrap();
    assert_eq!(plot.call(&[]).unwrap(), Value::None);
    assert_eq!(host.import_count("matplotlib"), 1);
    assert_eq!(host.import_count("matplotlib.pylab"), 1);
}

#[test]
fn missing_attribute_on_real_module_is_attribute_error() {
    let host = science_registry();
    let (ns, _) = activated(&host, RebindPolicy::KeepProxy);
    let err = ns.lookup_path("numpy.not_there").unwrap_err();
    assert!(matches!(err, AccessError::NoAttribute { ref attr, .. } if attr == "not_there"));
    assert_eq!(err.code(), "ACCESS002");
}

#[test]
fn alias_to_missing_module_fails_only_on_use() {
    let host = science_registry();
    let aliases = AliasTable::from_pairs([("fake", "totallynotareal_module")]).unwrap();
    let (ns, report) = activated_with(&host, RebindPolicy::Promote, &aliases);
    assert!(report.aliases_bound.contains(&"fake".to_string()));

    let err = ns.lookup_path("fake.anything").unwrap_err();
    assert_eq!(err.code(), "IMPORT001");
    // 失敗は他の名前に波及しない
    assert!(ns.lookup_path("numpy.pi").is_ok());
    // 失敗は記憶されず、次のアクセスでも同じ失敗になる
    assert_eq!(ns.lookup_path("fake.anything").unwrap_err().code(), "IMPORT001");
}

#[test]
fn initialization_failure_is_retried_on_next_access() {
    let host = Arc::new(ModuleRegistry::new());
    let attempts = Arc::new(AtomicUsize::new(0));
    let seen = attempts.clone();
    host.define("flaky", move |m| {
        if seen.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err("first attempt fails".to_string());
        }
        m.set("ok", Value::Bool(true));
        Ok(())
    })
    .unwrap();
    let proxy = LazyModule::new(CanonicalName::parse("flaky").unwrap(), host.clone());

    let err = proxy.get_attr("ok").unwrap_err();
    assert!(matches!(
        err,
        AccessError::Import(ImportError::Initialization { .. })
    ));
    assert!(!proxy.is_resolved());

    assert_eq!(proxy.get_attr("ok").unwrap(), Value::Bool(true));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn calling_a_module_is_not_callable() {
    let host = science_registry();
    let (ns, _) = activated(&host, RebindPolicy::Promote);
    let err = ns.get("os").unwrap().call(&[]).unwrap_err();
    assert_eq!(err.to_string(), "[ACCESS003] 'module' object is not callable");
    // 呼び出しの失敗でも import 自体は済んでいる
    assert_eq!(host.import_count("os"), 1);
}

#[test]
fn repr_forwards_to_the_real_module() {
    let host = science_registry();
    let (ns, _) = activated(&host, RebindPolicy::KeepProxy);
    let proxy = ns.get("scipy").unwrap();
    assert_eq!(proxy.to_string(), "<lazy module 'scipy'>");
    assert_eq!(proxy.repr().unwrap(), "<module 'scipy' (built-in)>");
    assert_eq!(proxy.to_string(), "<module 'scipy' (built-in)>");
}

#[test]
fn attribute_assignment_writes_through() {
    let host = science_registry();
    let (ns, _) = activated(&host, RebindPolicy::KeepProxy);
    let np = ns.get("np").unwrap();
    np.set_attr("answer", Value::Int(42)).unwrap();
    assert_eq!(ns.lookup_path("numpy.answer").unwrap(), Value::Int(42));
}
