// ABOUTME: Recursive-descent parser building Value trees from the token stream (§6)
//
// PROGRAM ::= INNER EOF
// LIST    ::= "(" INNER ")"
// INNER   ::= ELEM INNER | ε
// ELEM    ::= "'" ELEM | "," ELEM | NUMBER | SYMBOL | LIST

use crate::error::HostError;
use crate::lexer::{tokenize, Tok, Token};
use crate::value::Value;
use std::rc::Rc;

struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenStream {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos).map(|t| &t.tok)
    }

    fn peek_pos(&self) -> (usize, usize) {
        self.tokens
            .get(self.pos)
            .map(|t| (t.line, t.column))
            .unwrap_or((0, 0))
    }

    fn advance(&mut self) -> Option<Tok> {
        let tok = self.tokens.get(self.pos).map(|t| t.tok.clone());
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }
}

/// `INNER ::= ELEM INNER | ε`: collects elements until `)` or end of
/// stream, building a proper list terminated by Nil.
fn parse_inner(ts: &mut TokenStream) -> Result<Value, HostError> {
    let mut items = Vec::new();
    while !matches!(ts.peek(), None | Some(Tok::RParen)) {
        items.push(parse_elem(ts)?);
    }
    Ok(Value::list(items))
}

/// `ELEM ::= "'" ELEM | "," ELEM | NUMBER | SYMBOL | LIST`
fn parse_elem(ts: &mut TokenStream) -> Result<Value, HostError> {
    let (line, column) = ts.peek_pos();
    match ts.advance() {
        Some(Tok::Quote) => {
            let inner = parse_elem(ts)?;
            Ok(Value::list(vec![Value::symbol("quote"), inner]))
        }
        Some(Tok::Comma) => {
            let inner = parse_elem(ts)?;
            Ok(Value::Marked(Rc::new(inner)))
        }
        Some(Tok::Number(n)) => Ok(Value::Number(n)),
        Some(Tok::Symbol(s)) => Ok(Value::symbol(s)),
        Some(Tok::LParen) => {
            let list = parse_inner(ts)?;
            match ts.advance() {
                Some(Tok::RParen) => Ok(list),
                _ => Err(HostError::parse(line, column, "unclosed list")),
            }
        }
        Some(Tok::RParen) => Err(HostError::parse(line, column, "unexpected ')'")),
        None => Err(HostError::parse(line, column, "unexpected end of input")),
    }
}

/// Parses a full program: a sequence of top-level forms, returned as a
/// single proper list (the caller wraps it in `(begin ...)` per §4.1).
pub fn parse_program(src: &str) -> Result<Value, HostError> {
    let tokens = tokenize(src)?;
    let mut ts = TokenStream { tokens, pos: 0 };
    let program = parse_inner(&mut ts)?;
    if ts.pos != ts.tokens.len() {
        let (line, column) = ts.peek_pos();
        return Err(HostError::parse(line, column, "trailing input after program"));
    }
    Ok(program)
}

/// Parses exactly one top-level form, ignoring any trailing tokens. Used
/// by the `read` primitive (§4.4), which reads one form at a time from a
/// stream that may contain more input afterwards.
pub fn parse_single_element(src: &str) -> Result<Value, HostError> {
    let tokens = tokenize(src)?;
    let mut ts = TokenStream { tokens, pos: 0 };
    parse_elem(&mut ts)
}
