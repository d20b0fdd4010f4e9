// パス: src/repl/cmd.rs
// 役割: REPL のメインループ、コマンド解釈、式評価
// 意図: 活性化済みの名前空間に対して素の名前・属性参照・呼び出しを試せるようにする
// 関連ファイル: src/repl/parse.rs, src/repl/printer.rs, src/introspect.rs, src/bin/autoimp.rs
//! autoimp REPL におけるコマンド処理と評価を担当するモジュール。
//! 入力をコマンドか文として解釈し、名前空間への参照・束縛へ橋渡しする。

use std::io::{self, Write};
use std::sync::Arc;

use tracing::debug;

use super::input::{BufReadSource, ReadResult, ReplLineSource};
use super::parse::{parse_expr, parse_statement, Expr, Statement};
use super::printer::{render_aliases, render_help, render_names, write_value, BANNER};
use crate::aliases::AliasTable;
use crate::errors::AccessError;
use crate::host::Importer;
use crate::introspect;
use crate::namespace::Namespace;
use crate::value::Value;

/// 直近の評価結果を束縛する名前。
pub const LAST_RESULT: &str = "_";

/// 標準入出力で対話セッションを開始する。
///
/// # Examples
/// ```no_run
/// use std::sync::Arc;
/// use autoimp::repl::{run_repl, ReplSession};
/// use autoimp::{activate, ActivationConfig, FsImporter, Namespace, SearchPath};
///
/// let host = Arc::new(FsImporter::new(SearchPath::new(["."])));
/// let ns = Namespace::new();
/// let config = ActivationConfig::default();
/// activate(&ns, host.clone(), &config);
/// run_repl(ReplSession::new(ns, host, config.aliases));
/// ```
pub fn run_repl(mut session: ReplSession) {
    let mut source = BufReadSource::stdin();
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    if let Err(err) = run_repl_with(&mut session, &mut source, &mut stdout, &mut stderr) {
        let _ = writeln!(stderr, "REPL 実行中にエラーが発生しました: {}", err);
    }
}

pub(crate) fn run_repl_with<S, W, E>(
    session: &mut ReplSession,
    source: &mut S,
    out: &mut W,
    err: &mut E,
) -> io::Result<()>
where
    S: ReplLineSource,
    W: Write,
    E: Write,
{
    writeln!(out, "{}", BANNER)?;
    loop {
        let line = match source.read_line("> ") {
            Ok(ReadResult::Line(line)) => line,
            Ok(ReadResult::Eof) => break,
            Err(e) => {
                writeln!(err, "入力エラー: {}", e)?;
                break;
            }
        };
        let input = line.trim();
        if input.is_empty() || input.starts_with('#') {
            continue;
        }
        source.add_history(input);

        match parse_repl_command(input) {
            ReplCommand::Help => render_help(out)?,
            ReplCommand::Quit => break,
            other => {
                let msgs = session.execute(other);
                dispatch_messages(msgs, out, err)?;
            }
        }
    }
    Ok(())
}

fn dispatch_messages<W: Write, E: Write>(
    msgs: Vec<ReplMsg>,
    out: &mut W,
    err: &mut E,
) -> io::Result<()> {
    for msg in msgs {
        match msg {
            ReplMsg::Out(s) => writeln!(out, "{}", s)?,
            ReplMsg::Err(s) => writeln!(err, "{}", s)?,
            ReplMsg::Value(v) => write_value(out, &v)?,
        }
    }
    Ok(())
}

/// 名前空間・ホスト・別名表をまとめて保持する対話セッション。
pub struct ReplSession {
    namespace: Namespace,
    importer: Arc<dyn Importer>,
    aliases: AliasTable,
}

impl ReplSession {
    /// 活性化済みの名前空間を引き継いでセッションを構築する。
    pub fn new(namespace: Namespace, importer: Arc<dyn Importer>, aliases: AliasTable) -> Self {
        Self {
            namespace,
            importer,
            aliases,
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// 解釈済みコマンドを実行し、出力メッセージを返す。
    pub(crate) fn execute(&mut self, cmd: ReplCommand) -> Vec<ReplMsg> {
        use ReplCommand::*;
        match cmd {
            Names(prefix) => self.exec_names(prefix.as_deref()),
            Dir(src) => self.exec_dir(&src),
            Info(src) => self.exec_info(&src),
            Reload(src) => self.exec_reload(&src),
            Aliases => self.exec_aliases(),
            Eval(src) => self.exec_eval(&src),
            Help | Quit => Vec::new(),
            Invalid(s) => vec![ReplMsg::Err(format!(
                "エラー: コマンド形式が不正です: {}",
                s
            ))],
        }
    }

    fn exec_names(&self, prefix: Option<&str>) -> Vec<ReplMsg> {
        let entries: Vec<(String, bool)> = self
            .namespace
            .names()
            .into_iter()
            .filter(|name| match prefix {
                Some(p) => name.starts_with(p),
                None => !name.starts_with('_'),
            })
            .map(|name| {
                let lazy = matches!(
                    self.namespace.get(&name),
                    Some(Value::Proxy(ref p)) if !p.is_resolved()
                );
                (name, lazy)
            })
            .collect();
        if entries.is_empty() {
            return vec![ReplMsg::Out("(該当なし)".into())];
        }
        vec![ReplMsg::Out(render_names(&entries))]
    }

    fn exec_dir(&self, src: &str) -> Vec<ReplMsg> {
        match self
            .eval_source(src)
            .and_then(|v| introspect::dir(&v).map_err(ReplError::from))
        {
            Ok(names) => vec![ReplMsg::Out(names.join(" "))],
            Err(e) => vec![e.into_msg()],
        }
    }

    fn exec_info(&self, src: &str) -> Vec<ReplMsg> {
        match self
            .eval_source(src)
            .and_then(|v| introspect::help(&v).map_err(ReplError::from))
        {
            Ok(text) => vec![ReplMsg::Out(text)],
            Err(e) => vec![e.into_msg()],
        }
    }

    fn exec_reload(&self, src: &str) -> Vec<ReplMsg> {
        let reloaded = self.eval_source(src).and_then(|v| {
            introspect::reload(&v, self.importer.as_ref()).map_err(ReplError::from)
        });
        match reloaded.and_then(|v| v.repr().map_err(ReplError::from)) {
            Ok(repr) => vec![ReplMsg::Out(format!("再読み込みしました: {}", repr))],
            Err(e) => vec![e.into_msg()],
        }
    }

    fn exec_aliases(&self) -> Vec<ReplMsg> {
        if self.aliases.is_empty() {
            return vec![ReplMsg::Out("(別名なし)".into())];
        }
        vec![ReplMsg::Out(render_aliases(&self.aliases))]
    }

    fn exec_eval(&mut self, src: &str) -> Vec<ReplMsg> {
        let stmt = match parse_statement(src) {
            Ok(stmt) => stmt,
            Err(e) => return vec![ReplMsg::Err(format!("構文エラー: {}", e))],
        };
        match stmt {
            Statement::Assign { name, value } => match self.eval(&value) {
                Ok(v) => {
                    debug!(%name, "repl binding");
                    self.namespace.insert(name, v);
                    Vec::new()
                }
                Err(e) => vec![ReplError::from(e).into_msg()],
            },
            Statement::Expr(expr) => match self.eval(&expr).and_then(|v| v.as_value()) {
                Ok(v) => {
                    if v != Value::None {
                        self.namespace.insert(LAST_RESULT, v.clone());
                    }
                    vec![ReplMsg::Value(v)]
                }
                Err(e) => vec![ReplError::from(e).into_msg()],
            },
        }
    }

    fn eval_source(&self, src: &str) -> Result<Value, ReplError> {
        let expr = parse_expr(src).map_err(|e| ReplError::Syntax(e.to_string()))?;
        Ok(self.eval(&expr)?)
    }

    /// 式を評価する。名前の参照はすべて名前空間経由で行う。
    pub(crate) fn eval(&self, expr: &Expr) -> Result<Value, AccessError> {
        match expr {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Path(segments) => self.eval_path(segments),
            Expr::Call { callee, args } => {
                let func = self.eval_path(callee)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                func.call(&args)
            }
        }
    }

    fn eval_path(&self, segments: &[String]) -> Result<Value, AccessError> {
        let Some((head, attrs)) = segments.split_first() else {
            return Err(AccessError::NameNotDefined(String::new()));
        };
        let mut value = self.namespace.lookup(head)?;
        for attr in attrs {
            value = value.get_attr(attr)?;
        }
        Ok(value)
    }
}

/// REPL 内部でのみ使う失敗の分類。
enum ReplError {
    Syntax(String),
    Access(AccessError),
}

impl From<AccessError> for ReplError {
    fn from(e: AccessError) -> Self {
        ReplError::Access(e)
    }
}

impl ReplError {
    fn into_msg(self) -> ReplMsg {
        match self {
            ReplError::Syntax(e) => ReplMsg::Err(format!("構文エラー: {}", e)),
            ReplError::Access(e) => ReplMsg::Err(format!("エラー: {}", e)),
        }
    }
}

/// 対話セッションがユーザーへ返す応答メッセージのカテゴリ。
pub(crate) enum ReplMsg {
    Out(String),
    Err(String),
    Value(Value),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// REPL が解釈できるトップレベルコマンドの集合。
pub(crate) enum ReplCommand {
    /// `:help` / `:h` でヘルプメッセージを表示する。
    Help,
    /// `:quit` / `:q` でセッションを終了する。
    Quit,
    /// `:names [PFX]` で束縛済みの名前を列挙する。
    Names(Option<String>),
    /// `:dir EXPR` で属性一覧を表示する。
    Dir(String),
    /// `:info EXPR` で説明を表示する。
    Info(String),
    /// `:reload EXPR` でモジュールを再読み込みする。
    Reload(String),
    /// `:aliases` で別名表を表示する。
    Aliases,
    /// コマンド以外の入力は文として評価する。
    Eval(String),
    /// 認識できなかったコマンド入力。
    Invalid(String),
}

/// 生の入力文字列を `ReplCommand` 列挙に解析する。
pub(crate) fn parse_repl_command(input: &str) -> ReplCommand {
    let s = input.trim();
    if !s.starts_with(':') {
        return ReplCommand::Eval(s.to_string());
    }
    let (head, rest) = match s.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (s, ""),
    };
    let operand = |make: fn(String) -> ReplCommand| {
        if rest.is_empty() {
            ReplCommand::Invalid(s.to_string())
        } else {
            make(rest.to_string())
        }
    };
    match head {
        ":help" | ":h" if rest.is_empty() => ReplCommand::Help,
        ":quit" | ":q" if rest.is_empty() => ReplCommand::Quit,
        ":aliases" if rest.is_empty() => ReplCommand::Aliases,
        ":names" => ReplCommand::Names((!rest.is_empty()).then(|| rest.to_string())),
        ":dir" => operand(ReplCommand::Dir),
        ":info" => operand(ReplCommand::Info),
        ":reload" => operand(ReplCommand::Reload),
        _ => ReplCommand::Invalid(s.to_string()),
    }
}
