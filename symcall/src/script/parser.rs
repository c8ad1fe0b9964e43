//!
//! Script Parser
//!
//! nom combinators over the raw source text. Token-level pieces (comments,
//! identifiers, numbers) are plain nom parsers; statements and expressions
//! are methods on `ScriptParser` so they can turn positions into spans.
//!
//! Grammar:
//!
//! ```text
//! script    := (stmt | ';')*
//! stmt      := ident '=' expr | call
//! call      := ident '(' [expr (',' expr)*] ')' | ident string
//! expr      := primary ('..' primary)*
//! primary   := nil | true | false | number | string | table
//!            | call | ident | '(' expr ')'
//! table     := '{' [expr (',' expr)*] '}'
//! ```
//!
//! `--` starts a comment running to the end of the line.
//!

use nom::branch::alt;
use nom::bytes::complete::{tag, tag_no_case, take_while, take_while1};
use nom::character::complete::{char, digit1, hex_digit1, multispace1, not_line_ending, one_of};
use nom::combinator::{cut, opt, recognize};
use nom::error::{ErrorKind, ParseError};
use nom::multi::many0_count;
use nom::sequence::{pair, tuple};
use nom::IResult;

use crate::value::{ScriptValue, parse_number};

use super::ast::{Call, Expr, Span, Stmt};
use super::error::ScriptError;

pub type PResult<'a, O> = IResult<&'a str, O, PError<'a>>;

#[derive(Debug, Clone, PartialEq)]
pub struct PError<'a> {
    pub input: &'a str,
    pub kind: PErrorKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PErrorKind {
    Expected(char),
    ExpectedExpr,
    ExpectedStatement,
    UnterminatedString,
    InvalidEscape(char),
    Nom(ErrorKind),
}

impl PErrorKind {
    fn describe(&self) -> String {
        match self {
            PErrorKind::Expected(c) => format!("expected '{}'", c),
            PErrorKind::ExpectedExpr => "expected expression".to_string(),
            PErrorKind::ExpectedStatement => "expected statement (assignment or call)".to_string(),
            PErrorKind::UnterminatedString => "unterminated string".to_string(),
            PErrorKind::InvalidEscape(c) => format!("invalid escape sequence '\\{}'", c),
            PErrorKind::Nom(kind) => format!("unexpected input ({:?})", kind),
        }
    }
}

impl<'a> ParseError<&'a str> for PError<'a> {
    fn from_error_kind(input: &'a str, kind: ErrorKind) -> Self {
        PError {
            input,
            kind: PErrorKind::Nom(kind),
        }
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

fn error<'a, O>(input: &'a str, kind: PErrorKind) -> PResult<'a, O> {
    Err(nom::Err::Error(PError { input, kind }))
}

fn failure<'a, O>(input: &'a str, kind: PErrorKind) -> PResult<'a, O> {
    Err(nom::Err::Failure(PError { input, kind }))
}

fn comment(input: &str) -> PResult<'_, &str> {
    recognize(pair(tag("--"), not_line_ending))(input)
}

/// Whitespace, comments and statement separators.
fn skip(input: &str) -> PResult<'_, ()> {
    let skipped: PResult<'_, usize> = many0_count(alt((multispace1, comment, tag(";"))))(input);
    let (input, _) = skipped?;
    Ok((input, ()))
}

fn identifier(input: &str) -> PResult<'_, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn number(input: &str) -> PResult<'_, Expr> {
    let recognized: PResult<'_, &str> = recognize(pair(
        opt(char('-')),
        alt((
            recognize(pair(tag_no_case("0x"), hex_digit1)),
            recognize(tuple((
                digit1,
                opt(pair(char('.'), digit1)),
                opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
            ))),
        )),
    ))(input);
    let (rest, text) = recognized?;

    match parse_number(text) {
        Some(ScriptValue::Int(n)) => Ok((rest, Expr::Int(n))),
        Some(ScriptValue::Float(f)) => Ok((rest, Expr::Float(f))),
        _ => error(input, PErrorKind::ExpectedExpr),
    }
}

fn string_lit(input: &str) -> PResult<'_, String> {
    let quote = match input.chars().next() {
        Some(q @ ('"' | '\'')) => q,
        _ => return error(input, PErrorKind::Expected('"')),
    };
    let body = &input[1..];
    let mut out = String::new();
    let mut chars = body.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            c if c == quote => return Ok((&body[i + 1..], out)),
            '\\' => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, 'r')) => out.push('\r'),
                Some((_, '0')) => out.push('\0'),
                Some((_, e @ ('\\' | '"' | '\''))) => out.push(e),
                Some((j, other)) => return failure(&body[j..], PErrorKind::InvalidEscape(other)),
                None => break,
            },
            '\n' => break,
            c => out.push(c),
        }
    }
    failure(input, PErrorKind::UnterminatedString)
}

struct ScriptParser<'a> {
    src: &'a str,
}

impl<'a> ScriptParser<'a> {
    /// Every input handed around is a suffix of `src`.
    fn offset(&self, rest: &'a str) -> usize {
        self.src.len() - rest.len()
    }

    fn span(&self, from: &'a str, to: &'a str) -> Span {
        Span::new(self.offset(from), self.offset(to))
    }

    fn statement(&self, input: &'a str) -> PResult<'a, Stmt> {
        let Ok((rest, name)) = identifier(input) else {
            return failure(input, PErrorKind::ExpectedStatement);
        };
        let (after_ws, _) = skip(rest)?;

        if let Some(after_eq) = after_ws.strip_prefix('=') {
            let (rest, value) = cut(|i| self.expr(i))(after_eq)?;
            return Ok((
                rest,
                Stmt::Assign {
                    name: name.to_string(),
                    value,
                    span: self.span(input, rest),
                },
            ));
        }

        match self.call_suffix(input, name, rest)? {
            Some((rest, call)) => Ok((rest, Stmt::Call(call))),
            None => failure(input, PErrorKind::ExpectedStatement),
        }
    }

    /// Argument list or string sugar following `name`, if there is one.
    fn call_suffix(
        &self,
        start: &'a str,
        name: &'a str,
        rest: &'a str,
    ) -> Result<Option<(&'a str, Call)>, nom::Err<PError<'a>>> {
        let (after_ws, _) = skip(rest)?;
        let (rest, args) = match after_ws.chars().next() {
            Some('(') => self.list(after_ws, '(', ')')?,
            Some('"' | '\'') => {
                let (rest, text) = string_lit(after_ws)?;
                (rest, vec![Expr::Str(text)])
            }
            _ => return Ok(None),
        };
        Ok(Some((
            rest,
            Call {
                callee: name.to_string(),
                args,
                span: self.span(start, rest),
            },
        )))
    }

    /// `open expr (',' expr)* close`, where `input` starts at `open`.
    fn list(&self, input: &'a str, open: char, close: char) -> PResult<'a, Vec<Expr>> {
        let opened: PResult<'a, char> = char(open)(input);
        let (mut input, _) = opened?;
        let mut items = Vec::new();

        let (after_ws, _) = skip(input)?;
        if let Some(rest) = after_ws.strip_prefix(close) {
            return Ok((rest, items));
        }

        loop {
            let (rest, item) = cut(|i| self.expr(i))(input)?;
            items.push(item);
            let (rest, _) = skip(rest)?;
            if let Some(rest) = rest.strip_prefix(',') {
                input = rest;
            } else if let Some(rest) = rest.strip_prefix(close) {
                return Ok((rest, items));
            } else {
                return failure(rest, PErrorKind::Expected(close));
            }
        }
    }

    fn expr(&self, input: &'a str) -> PResult<'a, Expr> {
        let (input, _) = skip(input)?;
        let (mut rest, first) = self.primary(input)?;

        let mut tail = Vec::new();
        loop {
            let (after_ws, _) = skip(rest)?;
            let Some(after_op) = after_ws.strip_prefix("..") else {
                break;
            };
            let (r, operand) = cut(|i| self.primary(i))(after_op)?;
            tail.push(operand);
            rest = r;
        }

        // `..` is right associative
        let Some(mut acc) = tail.pop() else {
            return Ok((rest, first));
        };
        let span = self.span(input, rest);
        while let Some(left) = tail.pop() {
            acc = Expr::Concat { left: Box::new(left), right: Box::new(acc), span };
        }
        Ok((rest, Expr::Concat { left: Box::new(first), right: Box::new(acc), span }))
    }

    fn primary(&self, input: &'a str) -> PResult<'a, Expr> {
        let (input, _) = skip(input)?;

        if let Ok(parsed) = number(input) {
            return Ok(parsed);
        }

        match input.chars().next() {
            Some('"' | '\'') => {
                let (rest, text) = string_lit(input)?;
                return Ok((rest, Expr::Str(text)));
            }
            Some('{') => {
                let (rest, items) = self.list(input, '{', '}')?;
                return Ok((rest, Expr::Table(items)));
            }
            Some('(') => {
                let (rest, inner) = cut(|i| self.expr(i))(&input[1..])?;
                let (rest, _) = skip(rest)?;
                return match rest.strip_prefix(')') {
                    Some(rest) => Ok((rest, inner)),
                    None => failure(rest, PErrorKind::Expected(')')),
                };
            }
            _ => {}
        }

        let Ok((rest, name)) = identifier(input) else {
            return error(input, PErrorKind::ExpectedExpr);
        };
        match name {
            "nil" => return Ok((rest, Expr::Nil)),
            "true" => return Ok((rest, Expr::Bool(true))),
            "false" => return Ok((rest, Expr::Bool(false))),
            _ => {}
        }

        match self.call_suffix(input, name, rest)? {
            Some((rest, call)) => Ok((rest, Expr::Call(call))),
            None => Ok((
                rest,
                Expr::Var {
                    name: name.to_string(),
                    span: self.span(input, rest),
                },
            )),
        }
    }

    fn to_error(&self, err: nom::Err<PError<'a>>) -> ScriptError {
        match err {
            nom::Err::Error(e) | nom::Err::Failure(e) => {
                let at = self.offset(e.input);
                let width = e.input.chars().next().map(char::len_utf8).unwrap_or(0);
                ScriptError::parse(e.kind.describe(), Span::new(at, at + width))
            }
            nom::Err::Incomplete(_) => ScriptError::parse(
                "unexpected end of script",
                Span::new(self.src.len(), self.src.len()),
            ),
        }
    }
}

/// Parse a whole script.
pub fn parse_script(src: &str) -> Result<Vec<Stmt>, ScriptError> {
    let parser = ScriptParser { src };
    let mut statements = Vec::new();
    let mut input = src;

    loop {
        let (rest, _) = skip(input).map_err(|e| parser.to_error(e))?;
        if rest.is_empty() {
            return Ok(statements);
        }
        let (rest, stmt) = parser.statement(rest).map_err(|e| parser.to_error(e))?;
        statements.push(stmt);
        input = rest;
    }
}

/// Parse a single literal as given on a command line: numbers, `nil`,
/// `true`, `false`; anything else is taken as a string verbatim.
pub fn parse_literal(text: &str) -> ScriptValue {
    match text {
        "nil" => ScriptValue::Nil,
        "true" => ScriptValue::Bool(true),
        "false" => ScriptValue::Bool(false),
        _ => parse_number(text).unwrap_or_else(|| ScriptValue::Str(text.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call_of(stmt: &Stmt) -> &Call {
        match stmt {
            Stmt::Call(call) => call,
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_calls_and_assignments() {
        let src = r#"
-- sample
pointer = call("malloc", 100)
call("memcpy", pointer, "Just a string.", 15);
print "done"
"#;
        let stmts = parse_script(src).unwrap();
        assert_eq!(stmts.len(), 3);

        match &stmts[0] {
            Stmt::Assign { name, value: Expr::Call(call), .. } => {
                assert_eq!(name, "pointer");
                assert_eq!(call.callee, "call");
                assert_eq!(call.args, vec![Expr::Str("malloc".into()), Expr::Int(100)]);
            }
            other => panic!("unexpected {:?}", other),
        }

        let memcpy = call_of(&stmts[1]);
        assert_eq!(memcpy.args.len(), 4);
        assert!(matches!(&memcpy.args[1], Expr::Var { name, .. } if name == "pointer"));

        let print = call_of(&stmts[2]);
        assert_eq!(print.args, vec![Expr::Str("done".into())]);
    }

    #[test]
    fn test_parse_literals() {
        let stmts = parse_script("f(nil, true, false, -3, 0x10, 2.5, 'a\\tb', {}, {1, 2})").unwrap();
        let call = call_of(&stmts[0]);
        assert_eq!(
            call.args,
            vec![
                Expr::Nil,
                Expr::Bool(true),
                Expr::Bool(false),
                Expr::Int(-3),
                Expr::Int(16),
                Expr::Float(2.5),
                Expr::Str("a\tb".into()),
                Expr::Table(vec![]),
                Expr::Table(vec![Expr::Int(1), Expr::Int(2)]),
            ]
        );
    }

    #[test]
    fn test_parse_concat_chain() {
        let stmts = parse_script(r#"print("a" .. x .. 1)"#).unwrap();
        let call = call_of(&stmts[0]);
        match &call.args[0] {
            Expr::Concat { left, right, .. } => {
                assert_eq!(**left, Expr::Str("a".into()));
                assert!(matches!(**right, Expr::Concat { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_call_span_covers_call() {
        let src = "  print(1)\n";
        let stmts = parse_script(src).unwrap();
        let call = call_of(&stmts[0]);
        assert_eq!(&src[call.span.start..call.span.end], "print(1)");
    }

    #[test]
    fn test_parse_errors() {
        let err = parse_script("print(1").unwrap_err();
        assert_eq!(err.message(), "expected ')'");

        let err = parse_script("x = ").unwrap_err();
        assert_eq!(err.message(), "expected expression");

        let err = parse_script("print(\"open)").unwrap_err();
        assert_eq!(err.message(), "unterminated string");

        let err = parse_script("just_a_name").unwrap_err();
        assert_eq!(err.message(), "expected statement (assignment or call)");
        assert_eq!(err.span(), Some(Span::new(0, 1)));

        let err = parse_script("print('\\q')").unwrap_err();
        assert_eq!(err.message(), "invalid escape sequence '\\q'");
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(parse_literal("12"), ScriptValue::Int(12));
        assert_eq!(parse_literal("nil"), ScriptValue::Nil);
        assert_eq!(parse_literal("true"), ScriptValue::Bool(true));
        assert_eq!(parse_literal("hello world"), ScriptValue::Str("hello world".into()));
    }
}
