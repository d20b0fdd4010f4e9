// パス: src/repl/input.rs
// 役割: REPL の行入力源（標準入力など BufRead ベース）
// 意図: 対話端末でもパイプ入力でも同じループを回せるようにする
// 関連ファイル: src/repl/cmd.rs
use std::io::{self, BufRead, IsTerminal, Write};

/// 行入力が返す結果。
pub(crate) enum ReadResult {
    Line(String),
    Eof,
}

/// REPL ループが必要とする最小限の入力インターフェース。
pub(crate) trait ReplLineSource {
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadResult>;
    fn add_history(&mut self, entry: &str);
}

/// `BufRead` から 1 行ずつ読む入力源。履歴はセッション内だけで保持する。
pub(crate) struct BufReadSource<R> {
    reader: R,
    show_prompt: bool,
    history: Vec<String>,
}

impl<R: BufRead> BufReadSource<R> {
    pub(crate) fn new(reader: R, show_prompt: bool) -> Self {
        Self {
            reader,
            show_prompt,
            history: Vec::new(),
        }
    }
}

impl BufReadSource<io::StdinLock<'static>> {
    /// 標準入力。端末のときだけプロンプトを出す。
    pub(crate) fn stdin() -> Self {
        let stdin = io::stdin();
        let interactive = stdin.is_terminal();
        Self::new(stdin.lock(), interactive)
    }
}

impl<R: BufRead> ReplLineSource for BufReadSource<R> {
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadResult> {
        if self.show_prompt {
            let mut stdout = io::stdout();
            stdout.write_all(prompt.as_bytes())?;
            stdout.flush()?;
        }
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(ReadResult::Eof);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(ReadResult::Line(line))
    }

    fn add_history(&mut self, entry: &str) {
        if self.history.last().map(String::as_str) != Some(entry) {
            self.history.push(entry.to_string());
        }
    }
}
