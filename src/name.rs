// パス: src/name.rs
// 役割: ドット区切りのモジュール名（CanonicalName）を表現する
// 意図: 走査・別名・プロキシ間で同じ検証済みの名前型を共有する
// 関連ファイル: src/scanner.rs, src/aliases.rs, src/proxy.rs
//! モジュール名の値型。
//!
//! `scipy.linalg` のようなドット区切り名をセグメント列として保持する。
//! 生成時に各セグメントが識別子として妥当かを検証するため、
//! 一度作られた `CanonicalName` は常に import 可能な形をしている。

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::NameError;

/// 検証済みの絶対モジュール名。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CanonicalName(Vec<String>);

impl CanonicalName {
    /// ドット区切り文字列を検証して名前を作る。
    ///
    /// # Examples
    /// ```
    /// use autoimp::CanonicalName;
    /// let name = CanonicalName::parse("scipy.linalg").unwrap();
    /// assert_eq!(name.head(), "scipy");
    /// assert_eq!(name.tail(), "linalg");
    /// assert!(CanonicalName::parse("9lives").is_err());
    /// ```
    pub fn parse(dotted: &str) -> Result<Self, NameError> {
        if dotted.is_empty() {
            return Err(NameError::invalid(dotted, "空の名前"));
        }
        let mut segments = Vec::new();
        for segment in dotted.split('.') {
            if !is_identifier(segment) {
                return Err(NameError::invalid(
                    dotted,
                    format!("`{segment}` は識別子ではありません"),
                ));
            }
            segments.push(segment.to_string());
        }
        Ok(Self(segments))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// 先頭セグメント（トップレベルのパッケージ名）。
    pub fn head(&self) -> &str {
        &self.0[0]
    }

    /// 末尾セグメント。
    pub fn tail(&self) -> &str {
        &self.0[self.0.len() - 1]
    }

    pub fn is_top_level(&self) -> bool {
        self.0.len() == 1
    }

    /// 親パッケージ名。トップレベルなら `None`。
    pub fn parent(&self) -> Option<CanonicalName> {
        if self.is_top_level() {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    /// `self` の直下にサブモジュール名を連結する。
    pub fn child(&self, segment: &str) -> Result<CanonicalName, NameError> {
        if !is_identifier(segment) {
            return Err(NameError::invalid(
                format!("{self}.{segment}"),
                format!("`{segment}` は識別子ではありません"),
            ));
        }
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        Ok(Self(segments))
    }

    pub fn as_dotted(&self) -> String {
        self.0.join(".")
    }
}

/// ASCII 識別子かどうか（先頭は英字か `_`、以降は英数字か `_`）。
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Display for CanonicalName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_dotted())
    }
}

impl FromStr for CanonicalName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CanonicalName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CanonicalName> for String {
    fn from(value: CanonicalName) -> Self {
        value.as_dotted()
    }
}
