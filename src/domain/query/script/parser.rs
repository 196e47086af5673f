//! nom parser for the query language: a JavaScript-like subset made of
//! declarations, `return`, and expression statements over literals, member
//! access, calls, `new` and `await`.

use std::cell::Cell;

use nom::{
    bytes::complete::{tag, take_until, take_while},
    character::complete::{char, digit1, multispace0, one_of, satisfy},
    combinator::{cut, opt, recognize},
    error::{Error, ErrorKind},
    multi::separated_list0,
    sequence::{pair, preceded},
    IResult, Parser,
};

use crate::domain::query::script::ast::{
    ArrayItem, Expr, Literal, ObjectItem, Program, Statement, TemplatePart,
};
use crate::domain::query::script::script_error::ScriptError;

type PResult<'a, T> = IResult<&'a str, T>;

/// Deepest expression/statement nesting a script may use.
pub const MAX_NESTING: usize = 64;

thread_local! {
    static NESTING: Cell<usize> = const { Cell::new(0) };
}

/// Counts one level of parser recursion for as long as it lives.
struct NestingGuard;

impl NestingGuard {
    fn enter(input: &str) -> Result<Self, nom::Err<Error<&str>>> {
        let depth = NESTING.with(|d| {
            let next = d.get() + 1;
            d.set(next);
            next
        });
        let guard = NestingGuard;
        if depth > MAX_NESTING {
            return Err(nom::Err::Failure(Error::new(input, ErrorKind::TooLarge)));
        }
        Ok(guard)
    }
}

impl Drop for NestingGuard {
    fn drop(&mut self) {
        NESTING.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

/// Words that cannot start an expression.
const RESERVED: &[&str] = &[
    "async", "break", "case", "catch", "class", "const", "continue", "delete", "do", "else",
    "export", "finally", "for", "function", "if", "import", "in", "instanceof", "let", "return",
    "switch", "this", "throw", "try", "typeof", "var", "void", "while", "with", "yield",
];

fn fail<T>(input: &str, kind: ErrorKind) -> PResult<'_, T> {
    Err(nom::Err::Error(Error::new(input, kind)))
}

fn abort<T>(input: &str, kind: ErrorKind) -> PResult<'_, T> {
    Err(nom::Err::Failure(Error::new(input, kind)))
}

fn line_comment(input: &str) -> PResult<'_, &str> {
    recognize(pair(tag("//"), take_while(|c: char| c != '\n'))).parse(input)
}

fn block_comment(input: &str) -> PResult<'_, &str> {
    recognize((tag("/*"), take_until("*/"), tag("*/"))).parse(input)
}

/// Whitespace and comments.
fn ws(input: &str) -> PResult<'_, ()> {
    let mut input = input;
    loop {
        let spaced: PResult<'_, &str> = multispace0(input);
        let (rest, _) = spaced?;
        if let Ok((rest, _)) = line_comment(rest) {
            input = rest;
        } else if rest.starts_with("/*") {
            let (rest, _) = block_comment(rest).map_err(|_| nom::Err::Failure(Error::new(rest, ErrorKind::TakeUntil)))?;
            input = rest;
        } else {
            return Ok((rest, ()));
        }
    }
}

fn lit<'a>(input: &'a str, token: &'static str) -> PResult<'a, &'a str> {
    tag(token).parse(input)
}

/// A token preceded by optional whitespace.
fn sym<'a>(input: &'a str, token: &'static str) -> PResult<'a, &'a str> {
    let (input, _) = ws(input)?;
    lit(input, token)
}

fn comma(input: &str) -> PResult<'_, &str> {
    sym(input, ",")
}

fn close_paren(input: &str) -> PResult<'_, &str> {
    sym(input, ")")
}

fn close_bracket(input: &str) -> PResult<'_, &str> {
    sym(input, "]")
}

fn close_brace(input: &str) -> PResult<'_, &str> {
    sym(input, "}")
}

fn assign(input: &str) -> PResult<'_, &str> {
    sym(input, "=")
}

fn identifier(input: &str) -> PResult<'_, &str> {
    recognize(pair(
        satisfy(|c: char| c.is_ascii_alphabetic() || c == '_' || c == '$'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '$'),
    ))
    .parse(input)
}

fn keyword<'a>(input: &'a str, word: &'static str) -> PResult<'a, &'a str> {
    let (rest, found) = identifier(input)?;
    if found == word {
        Ok((rest, found))
    } else {
        fail(input, ErrorKind::Tag)
    }
}

fn number_literal(input: &str) -> PResult<'_, f64> {
    let recognized: PResult<'_, &str> = recognize((
        opt(char('-')),
        digit1,
        opt((char('.'), digit1)),
        opt((one_of("eE"), opt(one_of("+-")), digit1)),
    ))
    .parse(input);
    let (rest, text) = recognized?;
    match text.parse::<f64>() {
        Ok(number) => Ok((rest, number)),
        Err(_) => fail(input, ErrorKind::Float),
    }
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        other => other,
    }
}

/// Single- or double-quoted string with backslash escapes.
fn string_literal(input: &str) -> PResult<'_, String> {
    let mut chars = input.char_indices();
    let quote = match chars.next() {
        Some((_, q @ ('\'' | '"'))) => q,
        _ => return fail(input, ErrorKind::Char),
    };

    let mut out = String::new();
    let mut escaped = false;
    for (idx, c) in chars {
        if escaped {
            out.push(unescape(c));
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return Ok((&input[idx + c.len_utf8()..], out));
        } else if c == '\n' {
            break;
        } else {
            out.push(c);
        }
    }
    abort(input, ErrorKind::Char)
}

/// Backtick string with `${expr}` interpolation.
fn template_literal(input: &str) -> PResult<'_, Expr> {
    let (mut rest, _) = lit(input, "`")?;
    let mut parts = Vec::new();
    let mut text = String::new();

    loop {
        let mut chars = rest.char_indices();
        match chars.next() {
            None => return abort(input, ErrorKind::Char),
            Some((_, '`')) => {
                if !text.is_empty() {
                    parts.push(TemplatePart::Text(text));
                }
                return Ok((&rest[1..], Expr::Template(parts)));
            }
            Some((_, '\\')) => match chars.next() {
                Some((idx, c)) => {
                    text.push(unescape(c));
                    rest = &rest[idx + c.len_utf8()..];
                }
                None => return abort(input, ErrorKind::Char),
            },
            Some((_, '$')) if rest.starts_with("${") => {
                if !text.is_empty() {
                    parts.push(TemplatePart::Text(std::mem::take(&mut text)));
                }
                let (after, expr) = cut(expression).parse(&rest[2..])?;
                let (after, _) = cut(close_brace).parse(after)?;
                parts.push(TemplatePart::Expr(expr));
                rest = after;
            }
            Some((_, c)) => {
                text.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
}

fn array_item(input: &str) -> PResult<'_, ArrayItem> {
    let (input, _) = ws(input)?;
    if let Some(rest) = input.strip_prefix("...") {
        let (rest, expr) = cut(expression).parse(rest)?;
        return Ok((rest, ArrayItem::Spread(expr)));
    }
    let (rest, expr) = expression(input)?;
    Ok((rest, ArrayItem::Item(expr)))
}

fn object_item(input: &str) -> PResult<'_, ObjectItem> {
    let (input, _) = ws(input)?;
    if let Some(rest) = input.strip_prefix("...") {
        let (rest, expr) = cut(expression).parse(rest)?;
        return Ok((rest, ObjectItem::Spread(expr)));
    }

    let (rest, key) = match input.chars().next() {
        Some('"' | '\'') => string_literal(input)?,
        _ => {
            let (rest, word) = identifier(input)?;
            (rest, word.to_string())
        }
    };

    match sym(rest, ":") {
        Ok((rest, _)) => {
            let (rest, value) = cut(expression).parse(rest)?;
            Ok((rest, ObjectItem::Field(key, value)))
        }
        // `{ name }` shorthand
        Err(_) => Ok((rest, ObjectItem::Field(key.clone(), Expr::Ident(key)))),
    }
}

/// `open item, item, ... [,] close`
fn delimited_list<'a, T, F>(
    input: &'a str,
    open: &'static str,
    close: &'static str,
    item: F,
) -> PResult<'a, Vec<T>>
where
    F: Parser<&'a str, Output = T, Error = Error<&'a str>>,
{
    let (input, _) = sym(input, open)?;
    let (input, items) = separated_list0(comma, item).parse(input)?;
    let (input, _) = opt(comma).parse(input)?;
    let (input, _) = cut(move |i: &'a str| sym(i, close)).parse(input)?;
    Ok((input, items))
}

fn call_args(input: &str) -> PResult<'_, Vec<Expr>> {
    delimited_list(input, "(", ")", expression)
}

fn word_expr(input: &str) -> PResult<'_, Expr> {
    let (rest, word) = identifier(input)?;
    match word {
        "true" => Ok((rest, Expr::Literal(Literal::Bool(true)))),
        "false" => Ok((rest, Expr::Literal(Literal::Bool(false)))),
        "null" => Ok((rest, Expr::Literal(Literal::Null))),
        "undefined" => Ok((rest, Expr::Literal(Literal::Undefined))),
        "await" => {
            let (rest, inner) = cut(postfix).parse(rest)?;
            Ok((rest, Expr::Await(Box::new(inner))))
        }
        "new" => {
            let (rest, _) = ws(rest)?;
            let (rest, class) = cut(identifier).parse(rest)?;
            let (rest, args) = match call_args(rest) {
                Ok(parsed) => parsed,
                Err(nom::Err::Error(_)) => (rest, Vec::new()),
                Err(other) => return Err(other),
            };
            Ok((rest, Expr::New { class: class.to_string(), args }))
        }
        w if RESERVED.contains(&w) => abort(input, ErrorKind::Tag),
        w => Ok((rest, Expr::Ident(w.to_string()))),
    }
}

fn primary(input: &str) -> PResult<'_, Expr> {
    let (input, _) = ws(input)?;
    match input.chars().next() {
        Some('(') => {
            let (rest, _) = lit(input, "(")?;
            let (rest, expr) = cut(expression).parse(rest)?;
            let (rest, _) = cut(close_paren).parse(rest)?;
            Ok((rest, expr))
        }
        Some('[') => {
            let (rest, items) = delimited_list(input, "[", "]", array_item)?;
            Ok((rest, Expr::Array(items)))
        }
        Some('{') => {
            let (rest, items) = delimited_list(input, "{", "}", object_item)?;
            Ok((rest, Expr::Object(items)))
        }
        Some('"' | '\'') => {
            let (rest, s) = string_literal(input)?;
            Ok((rest, Expr::Literal(Literal::String(s))))
        }
        Some('`') => template_literal(input),
        Some('!') => {
            let (rest, inner) = cut(postfix).parse(&input[1..])?;
            Ok((rest, Expr::Not(Box::new(inner))))
        }
        Some(c) if c == '-' || c.is_ascii_digit() => {
            let (rest, n) = number_literal(input)?;
            Ok((rest, Expr::Literal(Literal::Number(n))))
        }
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => word_expr(input),
        _ => fail(input, ErrorKind::Char),
    }
}

/// Primary expression followed by `.name`, `[index]` and `(args)` suffixes.
fn postfix(input: &str) -> PResult<'_, Expr> {
    let _nesting = NestingGuard::enter(input)?;
    let (mut input, mut expr) = primary(input)?;
    loop {
        let (rest, _) = ws(input)?;
        if rest.starts_with('.') && !rest.starts_with("...") {
            let (after, _) = ws(&rest[1..])?;
            let (after, name) = cut(identifier).parse(after)?;
            expr = Expr::Member {
                target: Box::new(expr),
                property: name.to_string(),
            };
            input = after;
        } else if rest.starts_with('[') {
            let (after, _) = lit(rest, "[")?;
            let (after, index) = cut(expression).parse(after)?;
            let (after, _) = cut(close_bracket).parse(after)?;
            expr = Expr::Index {
                target: Box::new(expr),
                index: Box::new(index),
            };
            input = after;
        } else if rest.starts_with('(') {
            let (after, args) = call_args(rest)?;
            expr = Expr::Call {
                callee: Box::new(expr),
                args,
            };
            input = after;
        } else {
            return Ok((input, expr));
        }
    }
}

pub(crate) fn expression(input: &str) -> PResult<'_, Expr> {
    postfix(input)
}

fn open_paren(input: &str) -> PResult<'_, &str> {
    sym(input, "(")
}

fn parenthesized(input: &str) -> PResult<'_, Expr> {
    let (input, _) = open_paren(input)?;
    let (input, expr) = cut(expression).parse(input)?;
    let (input, _) = cut(close_paren).parse(input)?;
    Ok((input, expr))
}

fn declaration_keyword(input: &str) -> PResult<'_, &str> {
    let (rest, word) = identifier(input)?;
    match word {
        "const" | "let" | "var" => Ok((rest, word)),
        _ => fail(input, ErrorKind::Tag),
    }
}

fn of_keyword(input: &str) -> PResult<'_, &str> {
    keyword(input, "of")
}

fn catch_keyword(input: &str) -> PResult<'_, &str> {
    keyword(input, "catch")
}

/// `{ statements }`
fn block(input: &str) -> PResult<'_, Vec<Statement>> {
    let (mut input, _) = sym(input, "{")?;
    let mut statements = Vec::new();
    loop {
        let (rest, _) = separators(input)?;
        if let Some(after) = rest.strip_prefix('}') {
            return Ok((after, statements));
        }
        if rest.is_empty() {
            return abort(rest, ErrorKind::Char);
        }
        let (rest, stmt) = statement(rest)?;
        statements.push(stmt);
        input = rest;
    }
}

/// A block, or a single statement as in `if (x) return y`.
fn body(input: &str) -> PResult<'_, Vec<Statement>> {
    let (input, _) = ws(input)?;
    if input.starts_with('{') {
        return block(input);
    }
    let (rest, stmt) = statement(input)?;
    Ok((rest, vec![stmt]))
}

fn if_statement(input: &str) -> PResult<'_, Statement> {
    let (rest, condition) = cut(parenthesized).parse(input)?;
    let (rest, then) = cut(body).parse(rest)?;

    let (after, _) = separators(rest)?;
    let (rest, otherwise) = match keyword(after, "else") {
        Ok((after_else, _)) => {
            let (after_else, _) = ws(after_else)?;
            if keyword(after_else, "if").is_ok() {
                let (rest, nested) = cut(statement).parse(after_else)?;
                (rest, vec![nested])
            } else {
                cut(body).parse(after_else)?
            }
        }
        Err(_) => (rest, Vec::new()),
    };

    Ok((rest, Statement::If { condition, then, otherwise }))
}

fn for_of_statement(input: &str) -> PResult<'_, Statement> {
    let (rest, _) = cut(open_paren).parse(input)?;
    let (rest, _) = ws(rest)?;
    let (rest, _) = cut(declaration_keyword).parse(rest)?;
    let (rest, binding) = cut(preceded(ws, identifier)).parse(rest)?;
    let (rest, _) = cut(preceded(ws, of_keyword)).parse(rest)?;
    let (rest, iterable) = cut(expression).parse(rest)?;
    let (rest, _) = cut(close_paren).parse(rest)?;
    let (rest, body) = cut(body).parse(rest)?;
    Ok((
        rest,
        Statement::ForOf {
            binding: binding.to_string(),
            iterable,
            body,
        },
    ))
}

fn try_statement(input: &str) -> PResult<'_, Statement> {
    let (rest, body) = cut(block).parse(input)?;
    let (rest, _) = ws(rest)?;
    let (rest, _) = cut(catch_keyword).parse(rest)?;

    let (rest, binding) = match open_paren(rest) {
        Ok((after, _)) => {
            let (after, name) = cut(preceded(ws, identifier)).parse(after)?;
            let (after, _) = cut(close_paren).parse(after)?;
            (after, Some(name.to_string()))
        }
        Err(_) => (rest, None),
    };
    let (rest, handler) = cut(block).parse(rest)?;
    Ok((rest, Statement::Try { body, binding, handler }))
}

fn statement(input: &str) -> PResult<'_, Statement> {
    let _nesting = NestingGuard::enter(input)?;
    let (input, _) = ws(input)?;

    if let Ok((rest, _)) = keyword(input, "if") {
        return if_statement(rest);
    }
    if let Ok((rest, _)) = keyword(input, "for") {
        return for_of_statement(rest);
    }
    if let Ok((rest, _)) = keyword(input, "try") {
        return try_statement(rest);
    }
    if let Ok((rest, _)) = keyword(input, "throw") {
        let (rest, value) = cut(expression).parse(rest)?;
        return Ok((rest, Statement::Throw(value)));
    }

    for decl in ["const", "let", "var"] {
        if let Ok((rest, _)) = keyword(input, decl) {
            let (rest, name) = cut(preceded(ws, identifier)).parse(rest)?;
            let (rest, _) = cut(assign).parse(rest)?;
            let (rest, value) = cut(expression).parse(rest)?;
            return Ok((
                rest,
                Statement::Declare {
                    name: name.to_string(),
                    value,
                },
            ));
        }
    }

    if let Ok((rest, _)) = keyword(input, "return") {
        let (after, _) = ws(rest)?;
        if after.is_empty() || after.starts_with(';') || after.starts_with('}') {
            return Ok((rest, Statement::Return(None)));
        }
        let (rest, value) = cut(expression).parse(rest)?;
        return Ok((rest, Statement::Return(Some(value))));
    }

    let (rest, expr) = expression(input)?;
    Ok((rest, Statement::Expr(expr)))
}

/// Skips whitespace, comments and `;` separators.
fn separators(input: &str) -> PResult<'_, ()> {
    let mut input = input;
    loop {
        let (rest, _) = ws(input)?;
        match rest.strip_prefix(';') {
            Some(after) => input = after,
            None => return Ok((rest, ())),
        }
    }
}

fn program(input: &str) -> PResult<'_, Program> {
    let mut statements = Vec::new();
    let mut input = input;
    loop {
        let (rest, _) = separators(input)?;
        if rest.is_empty() {
            return Ok((rest, Program { statements }));
        }
        let (rest, stmt) = statement(rest)?;
        statements.push(stmt);
        input = rest;
    }
}

fn syntax_error(source: &str, remaining: &str, kind: ErrorKind) -> ScriptError {
    let mut offset = source.len().saturating_sub(remaining.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    let consumed = &source[..offset];
    let line = consumed.matches('\n').count() + 1;
    let column = consumed.rsplit('\n').next().map(|l| l.chars().count()).unwrap_or(0) + 1;

    let near: String = source[offset..]
        .lines()
        .next()
        .unwrap_or_default()
        .chars()
        .take(32)
        .collect();
    let message = if kind == ErrorKind::TooLarge {
        "nesting too deep".to_string()
    } else if near.trim().is_empty() {
        "unexpected end of input".to_string()
    } else {
        format!("unexpected token near `{}`", near.trim())
    };

    ScriptError::Syntax { message, line, column }
}

/// Parses a full query script.
pub fn parse_program(source: &str) -> Result<Program, ScriptError> {
    match program(source) {
        Ok((_, program)) => Ok(program),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(syntax_error(source, e.input, e.code)),
        Err(nom::Err::Incomplete(_)) => Err(syntax_error(source, "", ErrorKind::Eof)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: Vec<Expr>) -> Expr {
        Expr::Call {
            callee: Box::new(Expr::Ident(name.into())),
            args,
        }
    }

    fn string(s: &str) -> Expr {
        Expr::Literal(Literal::String(s.into()))
    }

    #[test]
    fn parses_query_script() {
        let source = r#"
            // newest users
            const q = query(collection(db, "users"), where('age', '>=', 18), limit(5),);
            return await getDocs(q);
        "#;
        let program = parse_program(source).unwrap();
        assert_eq!(program.statements.len(), 2);

        let Statement::Declare { name, value } = &program.statements[0] else {
            panic!("expected declaration");
        };
        assert_eq!(name, "q");
        let Expr::Call { args, .. } = value else {
            panic!("expected call");
        };
        assert_eq!(args.len(), 3);
        assert_eq!(args[0], call("collection", vec![Expr::Ident("db".into()), string("users")]));
        assert_eq!(
            args[1],
            call("where", vec![string("age"), string(">="), Expr::Literal(Literal::Number(18.0))])
        );

        assert_eq!(
            program.statements[1],
            Statement::Return(Some(Expr::Await(Box::new(call("getDocs", vec![Expr::Ident("q".into())])))))
        );
    }

    #[test]
    fn parses_member_chains_and_new() {
        let program = parse_program("snap.docs[0].data().name; new Date('2024-01-01').getTime()").unwrap();
        assert_eq!(program.statements.len(), 2);

        let Statement::Expr(Expr::Member { property, target }) = &program.statements[0] else {
            panic!("expected member access");
        };
        assert_eq!(property, "name");
        assert!(matches!(target.as_ref(), Expr::Call { .. }));

        let Statement::Expr(Expr::Call { callee, .. }) = &program.statements[1] else {
            panic!("expected call");
        };
        let Expr::Member { target, property } = callee.as_ref() else {
            panic!("expected method");
        };
        assert_eq!(property, "getTime");
        assert_eq!(
            target.as_ref(),
            &Expr::New { class: "Date".into(), args: vec![string("2024-01-01")] }
        );
    }

    #[test]
    fn parses_literals_templates_and_spreads() {
        let program = parse_program(
            "return { ...base, count: -2.5e1, 'quoted key': [1, ...rest], label: `n=${n}!`, flag: true, shorthand }",
        )
        .unwrap();
        let Statement::Return(Some(Expr::Object(items))) = &program.statements[0] else {
            panic!("expected object");
        };
        assert_eq!(items.len(), 6);
        assert_eq!(items[0], ObjectItem::Spread(Expr::Ident("base".into())));
        assert_eq!(items[1], ObjectItem::Field("count".into(), Expr::Literal(Literal::Number(-25.0))));
        assert_eq!(
            items[3],
            ObjectItem::Field(
                "label".into(),
                Expr::Template(vec![
                    TemplatePart::Text("n=".into()),
                    TemplatePart::Expr(Expr::Ident("n".into())),
                    TemplatePart::Text("!".into()),
                ])
            )
        );
        assert_eq!(items[5], ObjectItem::Field("shorthand".into(), Expr::Ident("shorthand".into())));
    }

    #[test]
    fn block_comments_and_bare_return() {
        let program = parse_program("/* header */ const a = 1; return;").unwrap();
        assert_eq!(program.statements[1], Statement::Return(None));
    }

    #[test]
    fn reports_position_of_syntax_errors() {
        let err = parse_program("const a = 1;\nconst b = query(;").unwrap_err();
        match err {
            ScriptError::Syntax { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error {other:?}"),
        }

        assert!(matches!(parse_program("while (x) {}"), Err(ScriptError::Syntax { .. })));
        assert!(matches!(parse_program("for (const d in docs) {}"), Err(ScriptError::Syntax { .. })));
        assert!(matches!(parse_program("const s = 'unterminated"), Err(ScriptError::Syntax { .. })));
    }

    #[test]
    fn parses_control_flow() {
        let source = r#"
            const out = [];
            for (const d of snap.docs) {
                try {
                    const p = await getDoc(doc(db, 'users', d.id));
                    if (p.exists()) { out.push(p.data()) } else if (!d.id) return;
                } catch (err) {
                    console.warn(err)
                }
            }
            if (!out) throw new Error('none')
            return out;
        "#;
        let program = parse_program(source).unwrap();
        assert_eq!(program.statements.len(), 4);

        let Statement::ForOf { binding, body, .. } = &program.statements[1] else {
            panic!("expected for-of");
        };
        assert_eq!(binding, "d");
        let Statement::Try { body: tried, binding, handler } = &body[0] else {
            panic!("expected try");
        };
        assert_eq!(binding.as_deref(), Some("err"));
        assert_eq!(handler.len(), 1);
        let Statement::If { otherwise, .. } = &tried[1] else {
            panic!("expected if");
        };
        assert!(matches!(&otherwise[0], Statement::If { then, .. } if then == &vec![Statement::Return(None)]));

        let Statement::If { condition, then, otherwise } = &program.statements[2] else {
            panic!("expected if");
        };
        assert_eq!(condition, &Expr::Not(Box::new(Expr::Ident("out".into()))));
        assert!(matches!(&then[0], Statement::Throw(Expr::New { class, .. }) if class == "Error"));
        assert!(otherwise.is_empty());
    }

    #[test]
    fn deep_nesting_is_a_syntax_error() {
        let too_deep = |source: String| match parse_program(&source) {
            Err(ScriptError::Syntax { message, .. }) => message == "nesting too deep",
            _ => false,
        };

        assert!(too_deep(format!("return {}1{}", "(".repeat(1000), ")".repeat(1000))));
        assert!(too_deep(format!("return {}1{}", "[".repeat(1000), "]".repeat(1000))));
        assert!(too_deep(format!("return {}", "!".repeat(1000))));
        assert!(too_deep(format!("{}return 1", "if (x) ".repeat(1000))));

        // the depth counter is released after a failure
        let nested = format!("return {}1{}", "(".repeat(20), ")".repeat(20));
        assert_eq!(
            parse_program(&nested).unwrap().statements,
            vec![Statement::Return(Some(Expr::Literal(Literal::Number(1.0))))]
        );
    }

    #[test]
    fn empty_source_is_an_empty_program() {
        assert_eq!(parse_program("  // nothing\n").unwrap(), Program::default());
    }
}
