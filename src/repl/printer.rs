// パス: src/repl/printer.rs
// 役割: REPL のヘルプ・値・一覧表示の描画
// 意図: 対話出力の書式を一箇所にまとめ、テストから文字列で検証できるようにする
// 関連ファイル: src/repl/cmd.rs, src/value.rs, src/aliases.rs
//! REPL で用いるヘルプメッセージと値出力を集約したモジュール。

use std::io::{self, Write};

use crate::aliases::AliasTable;
use crate::value::Value;

pub(crate) const BANNER: &str = "autoimp REPL (Rust) :: 素の名前でモジュールを参照 :: :help でヘルプ";

pub(crate) const HELP_TEXT: &str = concat!(
    "利用可能なコマンド:\n",
    "  :help              ヘルプ（本メッセージ）\n",
    "  :names [PFX]       束縛済みの名前一覧（接頭辞フィルタ、未読み込みは * 付き）\n",
    "  :dir EXPR          属性一覧（未読み込みならここで読み込む）\n",
    "  :info EXPR         モジュールの説明を表示\n",
    "  :reload EXPR       モジュールを再読み込み\n",
    "  :aliases           別名表を表示\n",
    "  :quit              終了\n",
    "\n",
    "例:\n",
    "  > np.pi                 -- numpy を初回参照時に読み込む\n",
    "  > os.path.join('a', 'b')\n",
    "  > e = scipy.linalg.eig  -- 名前を束縛\n",
    "  > _                     -- 直近の結果\n",
);

/// ヘルプメッセージを任意のライターへ描画する。
pub(crate) fn render_help<W: Write>(out: &mut W) -> io::Result<()> {
    out.write_all(HELP_TEXT.as_bytes())
}

/// 値出力を任意のライターへ書き出す。
pub(crate) fn write_value<W: Write>(out: &mut W, v: &Value) -> io::Result<()> {
    match v {
        // 式文としての None は何も表示しない
        Value::None => Ok(()),
        other => writeln!(out, "{}", other),
    }
}

/// 別名表を `alias -> canonical` 形式で描画する。
pub(crate) fn render_aliases(table: &AliasTable) -> String {
    let width = table.aliases().keys().map(String::len).max().unwrap_or(0);
    table
        .aliases()
        .iter()
        .map(|(alias, canonical)| format!("  {alias:<width$} -> {canonical}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 名前一覧を 1 行に並べる。未解決プロキシには `*` を付ける。
pub(crate) fn render_names(entries: &[(String, bool)]) -> String {
    entries
        .iter()
        .map(|(name, lazy)| {
            if *lazy {
                format!("{name}*")
            } else {
                name.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
