//! エラー型の定義（共通フォーマット: \[CODE\] メッセージ）。
//!
//! - `ImportError`: ホストの import 機構が返す失敗（未発見・初期化失敗）。
//! - `AccessError`: 属性参照・呼び出し時に利用者へ見える失敗。
//! - `ScanIssue`: 検索パスの一部が走査できなかった記録（走査全体は継続）。
//! - `NameError` / `AliasError`: 構築時の検証エラー。
//! - `ParseError`: REPL 入力の構文エラー（位置付き）。

use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

use thiserror::Error;

use crate::name::CanonicalName;

/// ホストの import 機構が返す失敗。
///
/// どちらもキャッシュされない。未解決プロキシは次のアクセスで再試行する。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("[IMPORT001] No module named '{name}'")]
    NotFound { name: CanonicalName },
    #[error("[IMPORT002] module '{name}' failed during initialization: {message}")]
    Initialization {
        name: CanonicalName,
        message: String,
    },
}

impl ImportError {
    pub fn not_found(name: &CanonicalName) -> Self {
        Self::NotFound { name: name.clone() }
    }

    pub fn initialization(name: &CanonicalName, message: impl Into<String>) -> Self {
        Self::Initialization {
            name: name.clone(),
            message: message.into(),
        }
    }

    /// 失敗の対象となったモジュール名。
    pub fn name(&self) -> &CanonicalName {
        match self {
            Self::NotFound { name } | Self::Initialization { name, .. } => name,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "IMPORT001",
            Self::Initialization { .. } => "IMPORT002",
        }
    }
}

/// 値への操作（属性参照・代入・呼び出し）で発生する失敗。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AccessError {
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error("[ACCESS001] name '{0}' is not defined")]
    NameNotDefined(String),
    #[error("[ACCESS002] {owner} has no attribute '{attr}'")]
    NoAttribute { owner: String, attr: String },
    #[error("[ACCESS003] '{type_name}' object is not callable")]
    NotCallable { type_name: &'static str },
    #[error("[ACCESS004] {function}: {message}")]
    Call { function: String, message: String },
}

impl AccessError {
    pub fn no_attribute(owner: impl Into<String>, attr: impl Into<String>) -> Self {
        Self::NoAttribute {
            owner: owner.into(),
            attr: attr.into(),
        }
    }

    pub fn call(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Call {
            function: function.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Import(e) => e.code(),
            Self::NameNotDefined(_) => "ACCESS001",
            Self::NoAttribute { .. } => "ACCESS002",
            Self::NotCallable { .. } => "ACCESS003",
            Self::Call { .. } => "ACCESS004",
        }
    }
}

/// 検索パスの 1 エントリを走査できなかった記録。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanIssue {
    pub path: PathBuf,
    pub kind: ScanIssueKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanIssueKind {
    /// ディレクトリ列挙などの I/O 失敗。
    Unreadable(String),
    /// zip として開けなかった。
    InvalidArchive(String),
}

impl ScanIssue {
    pub fn unreadable(path: impl Into<PathBuf>, reason: impl Display) -> Self {
        Self {
            path: path.into(),
            kind: ScanIssueKind::Unreadable(reason.to_string()),
        }
    }

    pub fn invalid_archive(path: impl Into<PathBuf>, reason: impl Display) -> Self {
        Self {
            path: path.into(),
            kind: ScanIssueKind::InvalidArchive(reason.to_string()),
        }
    }

    pub fn code(&self) -> &'static str {
        match self.kind {
            ScanIssueKind::Unreadable(_) => "SCAN001",
            ScanIssueKind::InvalidArchive(_) => "SCAN002",
        }
    }
}

impl Display for ScanIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ScanIssueKind::Unreadable(reason) => write!(
                f,
                "[{}] 検索パスを読めません: {} ({})",
                self.code(),
                self.path.display(),
                reason
            ),
            ScanIssueKind::InvalidArchive(reason) => write!(
                f,
                "[{}] zip アーカイブとして開けません: {} ({})",
                self.code(),
                self.path.display(),
                reason
            ),
        }
    }
}

impl std::error::Error for ScanIssue {}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("[NAME001] 不正なモジュール名 `{input}`: {reason}")]
    Invalid { input: String, reason: String },
}

impl NameError {
    pub fn invalid(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AliasError {
    #[error("[ALIAS001] 別名 `{0}` は単一の識別子でなければなりません")]
    InvalidAlias(String),
    #[error("[ALIAS002] 別名 `{alias}` が重複しています（{first} と {second}）")]
    Duplicate {
        alias: String,
        first: CanonicalName,
        second: CanonicalName,
    },
    #[error(transparent)]
    Name(#[from] NameError),
    #[error("別名テーブルの JSON を解釈できません: {0}")]
    Json(#[from] serde_json::Error),
}

/// 位置情報付きのエラー本体。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub msg: String,
    pub pos: Option<usize>, // バイトオフセット（任意）
}

impl ErrorInfo {
    pub fn new(code: &'static str, msg: impl Into<String>, pos: Option<usize>) -> Self {
        Self {
            code,
            msg: msg.into(),
            pos,
        }
    }
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.pos {
            Some(p) => write!(f, "[{}] {} @pos={}", self.code, self.msg, p),
            None => write!(f, "[{}] {}", self.code, self.msg),
        }
    }
}

/// REPL 入力の構文エラー。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError(pub ErrorInfo);

impl ParseError {
    pub fn new(code: &'static str, msg: impl Into<String>, pos: Option<usize>) -> Self {
        Self(ErrorInfo::new(code, msg, pos))
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ParseError {}
