// パス: src/repl/mod.rs
// 役割: REPL モジュールのファサードと再公開
// 意図: 対話エントリポイントだけを公開し、解析・表示の内部は隠す
// 関連ファイル: src/repl/cmd.rs, src/repl/parse.rs, src/bin/autoimp.rs
//! autoimp の対話環境を構成するモジュール群をまとめたファサード。
//!
//! - `cmd`: メインループとコマンド解釈
//! - `input`: 行入力源
//! - `parse`: 入力文の構文解析
//! - `printer`: ユーザー向けの表示ロジック

pub mod cmd;
mod input;
mod parse;
mod printer;

pub use cmd::{run_repl, ReplSession, LAST_RESULT};
