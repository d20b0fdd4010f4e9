// パス: src/literal.rs
// 役割: リテラル値（数値・文字列・真偽値・None・リスト）と識別子を読むカーソル
// 意図: ファイルホストのモジュール読み込みと REPL 入力解析で同じ字句規則を共有する
// 関連ファイル: src/host/fs.rs, src/repl/parse.rs, src/errors.rs
//! リテラル解析。
//!
//! - 文字列は `"..."` / `'...'` / `"""..."""`（1 行内）を受け付ける。
//! - エスケープは `\n` `\t` `\\` `\"` `\'` のみ。
//! - 数値は符号付き整数、小数、指数表記。
//! - 正規表現ライブラリを使わず、バイト位置を保持して診断に使う。

use crate::errors::ParseError;
use crate::value::Value;

/// リストの入れ子の上限。
pub const MAX_NESTING: usize = 64;

/// 入力上の読み取り位置。
pub struct Cursor<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            depth: 0,
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    pub fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    /// 空白を読み飛ばしてから `ch` があれば消費する。
    pub fn eat(&mut self, ch: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(ch) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, ch: char) -> Result<(), ParseError> {
        if self.eat(ch) {
            Ok(())
        } else {
            Err(self.error("LIT001", format!("`{ch}` が必要です")))
        }
    }

    pub fn at_end(&mut self) -> bool {
        self.skip_ws();
        self.pos >= self.src.len()
    }

    pub fn error(&self, code: &'static str, msg: impl Into<String>) -> ParseError {
        ParseError::new(code, msg, Some(self.pos))
    }

    /// 識別子を読む。識別子でなければ何も消費せず `None`。
    pub fn identifier(&mut self) -> Option<&'a str> {
        self.skip_ws();
        let rest = self.rest();
        let mut end = 0;
        for (idx, ch) in rest.char_indices() {
            let ok = if idx == 0 {
                ch.is_ascii_alphabetic() || ch == '_'
            } else {
                ch.is_ascii_alphanumeric() || ch == '_'
            };
            if !ok {
                break;
            }
            end = idx + ch.len_utf8();
        }
        if end == 0 {
            return None;
        }
        self.pos += end;
        Some(&rest[..end])
    }

    /// 次がリテラルの開始かどうか。
    pub fn starts_literal(&mut self) -> bool {
        self.skip_ws();
        match self.peek() {
            Some(c) if c.is_ascii_digit() || matches!(c, '"' | '\'' | '[' | '-' | '+' | '.') => {
                true
            }
            _ => ["True", "False", "None"]
                .iter()
                .any(|kw| self.keyword_ahead(kw)),
        }
    }

    fn keyword_ahead(&self, kw: &str) -> bool {
        let rest = self.rest();
        rest.starts_with(kw)
            && !rest[kw.len()..]
                .chars()
                .next()
                .map(|c| c.is_ascii_alphanumeric() || c == '_')
                .unwrap_or(false)
    }

    /// リテラル 1 個を読む。
    pub fn literal(&mut self) -> Result<Value, ParseError> {
        self.skip_ws();
        match self.peek() {
            Some('"') | Some('\'') => self.string().map(Value::Str),
            Some('[') => self.list(),
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.number(),
            _ => {
                for (kw, value) in [
                    ("True", Value::Bool(true)),
                    ("False", Value::Bool(false)),
                    ("None", Value::None),
                ] {
                    if self.keyword_ahead(kw) {
                        self.pos += kw.len();
                        return Ok(value);
                    }
                }
                Err(self.error("LIT002", "リテラルではありません"))
            }
        }
    }

    fn string(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        let quote = self.bump().unwrap_or('"');
        let triple = self.rest().starts_with(&format!("{quote}{quote}"));
        if triple {
            self.pos += 2 * quote.len_utf8();
        }
        let mut out = String::new();
        loop {
            let Some(ch) = self.bump() else {
                return Err(ParseError::new(
                    "LIT003",
                    "文字列が閉じられていません",
                    Some(start),
                ));
            };
            match ch {
                '\\' => {
                    let escaped = match self.bump() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some('\'') => '\'',
                        _ => return Err(self.error("LIT004", "未対応のエスケープです")),
                    };
                    out.push(escaped);
                }
                c if c == quote => {
                    if !triple {
                        return Ok(out);
                    }
                    if self.rest().starts_with(&format!("{quote}{quote}")) {
                        self.pos += 2 * quote.len_utf8();
                        return Ok(out);
                    }
                    out.push(c);
                }
                c => out.push(c),
            }
        }
    }

    fn number(&mut self) -> Result<Value, ParseError> {
        let start = self.pos;
        let rest = self.rest();
        let mut end = 0;
        let mut is_float = false;
        let mut prev = None;
        for (idx, ch) in rest.char_indices() {
            let ok = match ch {
                '0'..='9' | '_' => true,
                '+' | '-' => idx == 0 || matches!(prev, Some('e') | Some('E')),
                '.' | 'e' | 'E' => {
                    is_float = true;
                    true
                }
                _ => false,
            };
            if !ok {
                break;
            }
            prev = Some(ch);
            end = idx + ch.len_utf8();
        }
        let text: String = rest[..end].chars().filter(|c| *c != '_').collect();
        self.pos += end;
        let parsed = if is_float {
            text.parse::<f64>().ok().map(Value::Float)
        } else {
            text.parse::<i64>().ok().map(Value::Int)
        };
        parsed.ok_or_else(|| {
            ParseError::new("LIT005", format!("数値として読めません: `{text}`"), Some(start))
        })
    }

    fn list(&mut self) -> Result<Value, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error(
                "LIT007",
                format!("リストの入れ子が深すぎます（上限 {MAX_NESTING}）"),
            ));
        }
        self.depth += 1;
        let items = self.list_items();
        self.depth -= 1;
        items
    }

    fn list_items(&mut self) -> Result<Value, ParseError> {
        self.expect('[')?;
        let mut items = Vec::new();
        if self.eat(']') {
            return Ok(Value::List(items));
        }
        loop {
            items.push(self.literal()?);
            if self.eat(',') {
                if self.eat(']') {
                    break;
                }
                continue;
            }
            self.expect(']')?;
            break;
        }
        Ok(Value::List(items))
    }
}

/// 文字列全体が 1 個のリテラルであるときに限り値を返す。
pub fn parse_literal(src: &str) -> Result<Value, ParseError> {
    let mut cursor = Cursor::new(src);
    let value = cursor.literal()?;
    if !cursor.at_end() {
        return Err(cursor.error("LIT006", "リテラルの後ろに余分な入力があります"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_literals() {
        assert_eq!(parse_literal("42").unwrap(), Value::Int(42));
        assert_eq!(parse_literal("-7").unwrap(), Value::Int(-7));
        assert_eq!(parse_literal("1_000").unwrap(), Value::Int(1000));
        assert_eq!(parse_literal("2.5").unwrap(), Value::Float(2.5));
        assert_eq!(parse_literal("1e3").unwrap(), Value::Float(1000.0));
        assert_eq!(parse_literal("True").unwrap(), Value::Bool(true));
        assert_eq!(parse_literal(" None ").unwrap(), Value::None);
    }

    #[test]
    fn string_literals_with_escapes() {
        assert_eq!(parse_literal(r#""a\"b""#).unwrap(), Value::str("a\"b"));
        assert_eq!(parse_literal("'x\\ny'").unwrap(), Value::str("x\ny"));
        assert_eq!(
            parse_literal(r#""""doc "quoted" text""""#).unwrap(),
            Value::str("doc \"quoted\" text")
        );
    }

    #[test]
    fn nested_lists() {
        assert_eq!(
            parse_literal("[1, [2.0, 'a'], ]").unwrap(),
            Value::List(vec![
                Value::Int(1),
                Value::List(vec![Value::Float(2.0), Value::str("a")]),
            ])
        );
    }

    #[test]
    fn errors_carry_codes_and_positions() {
        let err = parse_literal("\"open").unwrap_err();
        assert_eq!(err.0.code, "LIT003");
        assert_eq!(err.0.pos, Some(0));
        assert_eq!(parse_literal("1 2").unwrap_err().0.code, "LIT006");
        assert_eq!(parse_literal("Truth").unwrap_err().0.code, "LIT002");
        assert_eq!(parse_literal("--1").unwrap_err().0.code, "LIT005");
    }

    #[test]
    fn deeply_nested_lists_are_rejected() {
        let nested = format!("{}1{}", "[".repeat(MAX_NESTING), "]".repeat(MAX_NESTING));
        assert!(parse_literal(&nested).is_ok());

        let too_deep = "[".repeat(100_000);
        let err = parse_literal(&too_deep).unwrap_err();
        assert_eq!(err.0.code, "LIT007");
        assert_eq!(err.0.pos, Some(MAX_NESTING));
    }

    #[test]
    fn identifier_stops_at_dot() {
        let mut c = Cursor::new("  scipy.linalg");
        assert_eq!(c.identifier(), Some("scipy"));
        assert!(c.eat('.'));
        assert_eq!(c.identifier(), Some("linalg"));
        assert!(c.at_end());
    }
}
