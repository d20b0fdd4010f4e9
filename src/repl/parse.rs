// パス: src/repl/parse.rs
// 役割: REPL 入力（ドット付き名前・呼び出し・代入）の構文解析
// 意図: リテラル字句規則を `literal::Cursor` と共有し、評価器を小さく保つ
// 関連ファイル: src/repl/cmd.rs, src/literal.rs, src/errors.rs
//! REPL 入力の文法:
//!
//! ```text
//! stmt  := NAME '=' expr | expr
//! expr  := literal | path [ '(' [ expr (',' expr)* [','] ] ')' ]
//! path  := NAME ('.' NAME)*
//! ```

use crate::errors::ParseError;
use crate::literal::Cursor;
use crate::value::Value;

/// 評価対象の式。
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Expr {
    Literal(Value),
    /// `a.b.c`。先頭は名前空間の素の名前。
    Path(Vec<String>),
    Call {
        callee: Vec<String>,
        args: Vec<Expr>,
    },
}

/// 1 行分の入力。
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Statement {
    Expr(Expr),
    Assign { name: String, value: Expr },
}

const KEYWORDS: [&str; 3] = ["True", "False", "None"];

/// 1 行を文として解析する。
pub(crate) fn parse_statement(src: &str) -> Result<Statement, ParseError> {
    let mut probe = Cursor::new(src);
    if let Some(name) = probe.identifier() {
        probe.skip_ws();
        let rest = probe.rest();
        if rest.starts_with('=') && !rest.starts_with("==") {
            if KEYWORDS.contains(&name) {
                return Err(probe.error("EXPR003", format!("`{name}` には代入できません")));
            }
            probe.bump();
            let value = expr(&mut probe)?;
            finish(&mut probe)?;
            return Ok(Statement::Assign {
                name: name.to_string(),
                value,
            });
        }
    }
    parse_expr(src).map(Statement::Expr)
}

/// 文字列全体を 1 個の式として解析する。
pub(crate) fn parse_expr(src: &str) -> Result<Expr, ParseError> {
    let mut cursor = Cursor::new(src);
    let parsed = expr(&mut cursor)?;
    finish(&mut cursor)?;
    Ok(parsed)
}

fn finish(cursor: &mut Cursor<'_>) -> Result<(), ParseError> {
    if cursor.at_end() {
        Ok(())
    } else {
        Err(cursor.error("EXPR002", "式の後ろに余分な入力があります"))
    }
}

fn expr(cursor: &mut Cursor<'_>) -> Result<Expr, ParseError> {
    if cursor.starts_literal() {
        return cursor.literal().map(Expr::Literal);
    }
    let path = path(cursor)?;
    if !cursor.eat('(') {
        return Ok(Expr::Path(path));
    }
    let mut args = Vec::new();
    if !cursor.eat(')') {
        loop {
            args.push(expr(cursor)?);
            if cursor.eat(',') {
                if cursor.eat(')') {
                    break;
                }
                continue;
            }
            cursor.expect(')')?;
            break;
        }
    }
    Ok(Expr::Call { callee: path, args })
}

fn path(cursor: &mut Cursor<'_>) -> Result<Vec<String>, ParseError> {
    let mut segments = Vec::new();
    loop {
        let Some(segment) = cursor.identifier() else {
            return Err(cursor.error("EXPR001", "名前が必要です"));
        };
        segments.push(segment.to_string());
        // `.` の前後に空白は置けない
        if cursor.peek() != Some('.') {
            break;
        }
        cursor.bump();
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(dotted: &str) -> Vec<String> {
        dotted.split('.').map(str::to_string).collect()
    }

    #[test]
    fn dotted_paths_and_literals() {
        assert_eq!(
            parse_expr("scipy.linalg.eig").unwrap(),
            Expr::Path(path("scipy.linalg.eig"))
        );
        assert_eq!(parse_expr(" 42 ").unwrap(), Expr::Literal(Value::Int(42)));
        assert_eq!(parse_expr("None").unwrap(), Expr::Literal(Value::None));
        assert_eq!(parse_expr("Nonesuch").unwrap(), Expr::Path(path("Nonesuch")));
    }

    #[test]
    fn calls_take_nested_arguments() {
        assert_eq!(
            parse_expr("os.path.join('a', b, f(1,),)").unwrap(),
            Expr::Call {
                callee: path("os.path.join"),
                args: vec![
                    Expr::Literal(Value::str("a")),
                    Expr::Path(path("b")),
                    Expr::Call {
                        callee: path("f"),
                        args: vec![Expr::Literal(Value::Int(1))],
                    },
                ],
            }
        );
        assert_eq!(
            parse_expr("f()").unwrap(),
            Expr::Call {
                callee: path("f"),
                args: Vec::new()
            }
        );
    }

    #[test]
    fn assignment_versus_comparison() {
        assert_eq!(
            parse_statement("x = np.pi").unwrap(),
            Statement::Assign {
                name: "x".into(),
                value: Expr::Path(path("np.pi")),
            }
        );
        assert_eq!(parse_statement("x == 1").unwrap_err().0.code, "EXPR002");
        assert_eq!(parse_statement("True = 1").unwrap_err().0.code, "EXPR003");
    }

    #[test]
    fn malformed_input_reports_codes() {
        assert_eq!(parse_expr("np.").unwrap_err().0.code, "EXPR001");
        assert_eq!(parse_expr("f(1").unwrap_err().0.code, "LIT001");
        assert_eq!(parse_expr("a b").unwrap_err().0.code, "EXPR002");
        assert_eq!(parse_expr("").unwrap_err().0.code, "EXPR001");
    }
}
