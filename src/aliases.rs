// パス: src/aliases.rs
// 役割: 短い別名（np など）から正式なモジュール名への静的対応表
// 意図: 別名を名前空間へ束縛する際の唯一の参照元を提供する
// 関連ファイル: src/inject.rs, src/name.rs, src/bin/autoimp.rs

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::AliasError;
use crate::name::{is_identifier, CanonicalName};

/// 同梱の別名一覧（別名, 正式名）。
pub const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("np", "numpy"),
    ("pd", "pandas"),
    ("sp", "scipy"),
    ("mpl", "matplotlib"),
    ("plt", "matplotlib.pyplot"),
    ("pylab", "matplotlib.pylab"),
    ("sns", "seaborn"),
    ("nx", "networkx"),
    ("tf", "tensorflow"),
    ("sk", "sklearn"),
    ("ski", "skimage"),
];

static DEFAULT_TABLE: Lazy<AliasTable> = Lazy::new(|| {
    let mut map = BTreeMap::new();
    for (alias, canonical) in DEFAULT_ALIASES {
        if let Ok(name) = CanonicalName::parse(canonical) {
            map.insert(alias.to_string(), name);
        }
    }
    AliasTable { map }
});

/// 同梱の別名表。
pub fn default_table() -> &'static AliasTable {
    &DEFAULT_TABLE
}

/// 別名 → 正式名の一対一対応。照合は完全一致・大文字小文字区別。
///
/// JSON では `[["np", "numpy"], ...]` の組のリストとして表現する。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(String, String)>", into = "Vec<(String, String)>")]
pub struct AliasTable {
    map: BTreeMap<String, CanonicalName>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 組のリストから表を作る。別名の重複や不正な名前はエラー。
    ///
    /// # Examples
    /// ```
    /// use autoimp::AliasTable;
    /// let table = AliasTable::from_pairs([("np", "numpy")]).unwrap();
    /// assert_eq!(table.resolve("np").unwrap().to_string(), "numpy");
    /// assert!(table.resolve("NP").is_none());
    /// assert!(AliasTable::from_pairs([("np", "numpy"), ("np", "numeric")]).is_err());
    /// ```
    pub fn from_pairs<I, A, C>(pairs: I) -> Result<Self, AliasError>
    where
        I: IntoIterator<Item = (A, C)>,
        A: AsRef<str>,
        C: AsRef<str>,
    {
        let mut table = Self::new();
        for (alias, canonical) in pairs {
            table.insert(alias.as_ref(), CanonicalName::parse(canonical.as_ref())?)?;
        }
        Ok(table)
    }

    /// JSON（組のリスト）から読み込む。
    pub fn from_json(src: &str) -> Result<Self, AliasError> {
        let pairs: Vec<(String, String)> = serde_json::from_str(src)?;
        Self::from_pairs(pairs)
    }

    pub fn to_json(&self) -> String {
        let pairs: Vec<(String, String)> = self.clone().into();
        serde_json::to_string_pretty(&pairs).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn insert(&mut self, alias: &str, canonical: CanonicalName) -> Result<(), AliasError> {
        if !is_identifier(alias) {
            return Err(AliasError::InvalidAlias(alias.to_string()));
        }
        if let Some(first) = self.map.get(alias) {
            return Err(AliasError::Duplicate {
                alias: alias.to_string(),
                first: first.clone(),
                second: canonical,
            });
        }
        self.map.insert(alias.to_string(), canonical);
        Ok(())
    }

    pub fn resolve(&self, alias: &str) -> Option<&CanonicalName> {
        self.map.get(alias)
    }

    pub fn aliases(&self) -> &BTreeMap<String, CanonicalName> {
        &self.map
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl TryFrom<Vec<(String, String)>> for AliasTable {
    type Error = AliasError;

    fn try_from(pairs: Vec<(String, String)>) -> Result<Self, Self::Error> {
        Self::from_pairs(pairs)
    }
}

impl From<AliasTable> for Vec<(String, String)> {
    fn from(table: AliasTable) -> Self {
        table
            .map
            .into_iter()
            .map(|(alias, canonical)| (alias, canonical.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_contains_every_bundled_pair() {
        let table = default_table();
        assert_eq!(table.len(), DEFAULT_ALIASES.len());
        assert_eq!(table.resolve("np").unwrap().to_string(), "numpy");
        assert_eq!(
            table.resolve("pylab").unwrap().to_string(),
            "matplotlib.pylab"
        );
    }

    #[test]
    fn lookup_is_exact_and_case_sensitive() {
        let table = default_table();
        assert!(table.resolve("Np").is_none());
        assert!(table.resolve("np ").is_none());
        assert!(table.resolve("numpy").is_none());
    }

    #[test]
    fn dotted_alias_is_rejected() {
        let err = AliasTable::from_pairs([("n.p", "numpy")]).unwrap_err();
        assert!(matches!(err, AliasError::InvalidAlias(_)));
    }

    #[test]
    fn json_pair_list_roundtrip() {
        let table = AliasTable::from_json(r#"[["la", "scipy.linalg"], ["o", "os"]]"#).unwrap();
        assert_eq!(table.resolve("la").unwrap().to_string(), "scipy.linalg");
        let back = AliasTable::from_json(&table.to_json()).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn json_with_duplicate_alias_fails() {
        let err = AliasTable::from_json(r#"[["o", "os"], ["o", "operator"]]"#).unwrap_err();
        assert!(err.to_string().contains("ALIAS002"));
    }
}
