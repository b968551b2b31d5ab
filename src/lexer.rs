// ABOUTME: Character lexer producing the token stream consumed by parser.rs (§6)

use crate::error::HostError;
use nom::{
    bytes::complete::tag,
    character::complete::{char, multispace1, satisfy},
    combinator::recognize,
    multi::many0,
    IResult,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    LParen,
    RParen,
    Quote,
    Comma,
    Number(f64),
    Symbol(String),
}

#[derive(Debug, Clone)]
pub struct Token {
    pub tok: Tok,
    pub line: usize,
    pub column: usize,
}

/// Skips whitespace and `;`-to-end-of-line comments (§6 lexer contract).
fn ws_and_comments(mut input: &str) -> &str {
    loop {
        if let Ok((rest, _)) = multispace1::<_, nom::error::Error<&str>>(input) {
            input = rest;
            continue;
        }
        if let Some(after_semi) = input.strip_prefix(';') {
            input = match after_semi.find('\n') {
                Some(pos) => &after_semi[pos..],
                None => "",
            };
            continue;
        }
        break;
    }
    input
}

fn at_boundary(input: &str) -> bool {
    input
        .chars()
        .next()
        .map(|c| c.is_whitespace() || c == '(' || c == ')')
        .unwrap_or(true)
}

fn take_digits(input: &str) -> (&str, &str) {
    let end = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    input.split_at(end)
}

fn take_symbol_token(input: &str) -> (&str, &str) {
    let end = input
        .find(|c: char| c.is_whitespace() || c == '(' || c == ')')
        .unwrap_or(input.len());
    // A leading char that is itself a boundary would never reach here
    // (callers only call this once at least one non-boundary char is known
    // to exist), but guard against a degenerate zero-width token anyway.
    let end = end.max(1).min(input.len());
    input.split_at(end)
}

/// Numbers accept integer, ratio (`a/b`), fixed-point (`a.b`), and
/// scientific (`aeb`/`ae-b`) forms with an optional leading `-` (§6). A
/// candidate that isn't followed by whitespace/`(`/`)` falls back to a
/// Symbol covering the same raw span (so `1x` lexes as the symbol `1x`).
fn lex_number_or_symbol(input: &str) -> (Tok, &str) {
    let start = input;
    let fallback = |start: &str| -> (Tok, &str) {
        let (tok_str, after) = take_symbol_token(start);
        (Tok::Symbol(tok_str.to_string()), after)
    };

    let mut rest = input;
    let sign = if let Some(r) = rest.strip_prefix('-') {
        rest = r;
        -1.0
    } else {
        1.0
    };

    let (left_digits, after_left) = take_digits(rest);
    if left_digits.is_empty() {
        return fallback(start);
    }
    let mut value = sign * left_digits.parse::<f64>().unwrap();
    rest = after_left;

    if let Some(r) = rest.strip_prefix('/') {
        let (right_digits, after_right) = take_digits(r);
        if right_digits.is_empty() {
            return fallback(start);
        }
        value /= right_digits.parse::<f64>().unwrap();
        rest = after_right;
    } else if let Some(r) = rest.strip_prefix('.') {
        let (right_digits, after_right) = take_digits(r);
        if right_digits.is_empty() {
            return fallback(start);
        }
        value += sign * right_digits.parse::<f64>().unwrap() * 10f64.powi(-(right_digits.len() as i32));
        rest = after_right;
    }

    if let Some(r) = rest.strip_prefix('e') {
        let (r, exp_sign) = match r.strip_prefix('-') {
            Some(r2) => (r2, -1i32),
            None => (r, 1i32),
        };
        let (exp_digits, after_exp) = take_digits(r);
        if exp_digits.is_empty() {
            return fallback(start);
        }
        let exp: i32 = exp_digits.parse().unwrap();
        value *= 10f64.powi(exp_sign * exp);
        rest = after_exp;
    }

    if at_boundary(rest) {
        (Tok::Number(value), rest)
    } else {
        fallback(start)
    }
}

/// A symbol delimited by `|...|`, which may contain spaces and the escapes
/// `\|`, `\\`, `\n`, `\t` (§6).
fn lex_piped_symbol(input: &str) -> Result<(Tok, &str), HostError> {
    let mut rest = input.strip_prefix('|').expect("caller checked leading '|'");
    let mut out = String::new();
    loop {
        match rest.chars().next() {
            None | Some('\n') => {
                return Err(HostError::parse(0, 0, "unterminated |...| symbol"));
            }
            Some('|') => {
                rest = &rest[1..];
                break;
            }
            Some('\\') => {
                let after_backslash = &rest[1..];
                match after_backslash.chars().next() {
                    Some('|') => {
                        out.push('|');
                        rest = &after_backslash[1..];
                    }
                    Some('\\') => {
                        out.push('\\');
                        rest = &after_backslash[1..];
                    }
                    Some('n') => {
                        out.push('\n');
                        rest = &after_backslash[1..];
                    }
                    Some('t') => {
                        out.push('\t');
                        rest = &after_backslash[1..];
                    }
                    _ => return Err(HostError::parse(0, 0, "unexpected character after '\\'")),
                }
            }
            Some(c) => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    Ok((Tok::Symbol(out), rest))
}

fn lparen(input: &str) -> IResult<&str, char> {
    char('(')(input)
}
fn rparen(input: &str) -> IResult<&str, char> {
    char(')')(input)
}
fn quote_mark(input: &str) -> IResult<&str, char> {
    char('\'')(input)
}
fn comma_mark(input: &str) -> IResult<&str, char> {
    char(',')(input)
}

#[allow(dead_code)]
fn identifier_char(input: &str) -> IResult<&str, &str> {
    recognize(many0(satisfy(|c| !c.is_whitespace() && c != '(' && c != ')')))(input)
}

#[allow(dead_code)]
fn pipe_open(input: &str) -> IResult<&str, &str> {
    tag("|")(input)
}

fn advance_position(line: &mut usize, column: &mut usize, consumed: &str) {
    for c in consumed.chars() {
        if c == '\n' {
            *line += 1;
            *column = 1;
        } else {
            *column += 1;
        }
    }
}

/// Tokenizes an entire source string into the stream consumed by the
/// parser, tracking 1-based line/column for error reporting.
pub fn tokenize(src: &str) -> Result<Vec<Token>, HostError> {
    let mut tokens = Vec::new();
    let mut input = src;
    let mut line = 1usize;
    let mut column = 1usize;

    loop {
        let before = input;
        input = ws_and_comments(input);
        advance_position(&mut line, &mut column, &before[..before.len() - input.len()]);

        if input.is_empty() {
            break;
        }

        let tok_line = line;
        let tok_column = column;
        let before_tok = input;

        let (tok, rest) = match input.chars().next().unwrap() {
            '(' => {
                let (rest, _) = lparen(input).expect("checked '('");
                (Tok::LParen, rest)
            }
            ')' => {
                let (rest, _) = rparen(input).expect("checked ')'");
                (Tok::RParen, rest)
            }
            '\'' => {
                let (rest, _) = quote_mark(input).expect("checked '\\''");
                (Tok::Quote, rest)
            }
            ',' => {
                let (rest, _) = comma_mark(input).expect("checked ','");
                (Tok::Comma, rest)
            }
            '|' => {
                let (tok, rest) = lex_piped_symbol(input)
                    .map_err(|_| HostError::parse(tok_line, tok_column, "unterminated |...| symbol"))?;
                (tok, rest)
            }
            _ => lex_number_or_symbol(input),
        };

        input = rest;
        advance_position(&mut line, &mut column, &before_tok[..before_tok.len() - input.len()]);

        tokens.push(Token {
            tok,
            line: tok_line,
            column: tok_column,
        });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(src: &str) -> Vec<Tok> {
        tokenize(src).unwrap().into_iter().map(|t| t.tok).collect()
    }

    #[test]
    fn tokenizes_parens_and_atoms() {
        assert_eq!(
            toks("(+ 1 2)"),
            vec![
                Tok::LParen,
                Tok::Symbol("+".into()),
                Tok::Number(1.0),
                Tok::Number(2.0),
                Tok::RParen,
            ]
        );
    }

    #[test]
    fn tokenizes_quote_and_comma() {
        assert_eq!(
            toks("'(a ,b)"),
            vec![
                Tok::Quote,
                Tok::LParen,
                Tok::Symbol("a".into()),
                Tok::Comma,
                Tok::Symbol("b".into()),
                Tok::RParen,
            ]
        );
    }

    #[test]
    fn ratio_number_resolves_by_division() {
        assert_eq!(toks("6/12"), vec![Tok::Number(0.5)]);
    }

    #[test]
    fn fixed_point_number() {
        assert_eq!(toks("-3.25"), vec![Tok::Number(-3.25)]);
    }

    #[test]
    fn scientific_number_with_negative_exponent() {
        assert_eq!(toks("1e-2"), vec![Tok::Number(0.01)]);
    }

    #[test]
    fn malformed_number_falls_back_to_symbol() {
        assert_eq!(toks("1x"), vec![Tok::Symbol("1x".into())]);
    }

    #[test]
    fn piped_symbol_allows_spaces_and_escapes() {
        assert_eq!(
            toks(r"|Dont panic|"),
            vec![Tok::Symbol("Dont panic".into())]
        );
        assert_eq!(toks(r"|a\|b|"), vec![Tok::Symbol("a|b".into())]);
    }

    #[test]
    fn comment_runs_to_end_of_line() {
        assert_eq!(toks("1 ; a comment\n2"), vec![Tok::Number(1.0), Tok::Number(2.0)]);
    }
}
