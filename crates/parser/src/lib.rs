//! Search-expression parser.
//!
//! Turns the free text typed into a search box (or passed by a hosted page)
//! into an `expr::Predicate` bound to one table's element keys.
//!
//! ```text
//! Region:East visits>=3 "north shore"
//! ```
//!
//! Terms are ANDed. `column:value`, `column=value` and `!=` compare exact
//! text; `<`, `<=`, `>`, `>=` compare numerically when both sides are finite
//! numbers. Column labels are case-sensitive display names or aliases. A
//! bare word or quoted phrase matches rows where any cell contains it. An
//! unquoted `null` after `:`, `=` or `!=` tests for a null cell.

mod ast;

pub use ast::*;

use catalog::TableMeta;
use common::{BridgeError, BridgeResult};
use expr::{CompareOp, Predicate};
use std::iter::Peekable;
use std::str::Chars;

/// Parse a search expression and bind it against `table`.
pub fn parse_query(text: &str, table: &TableMeta) -> BridgeResult<Predicate> {
    let terms = tokenize(text)?;
    bind(terms, table)
}

/// Split search text into unbound terms.
pub fn tokenize(text: &str) -> BridgeResult<Vec<Term>> {
    let mut chars = text.chars().peekable();
    let mut terms = Vec::new();

    loop {
        skip_whitespace(&mut chars);
        let Some(&next) = chars.peek() else {
            break;
        };
        if is_operator_start(next) {
            return Err(BridgeError::Query(format!(
                "operator '{next}' must follow a column name"
            )));
        }

        let (word, quoted) = read_word(&mut chars, true)?;
        match chars.peek() {
            Some(&c) if is_operator_start(c) => {
                let op = read_operator(&mut chars)?;
                let (value, value_quoted) = read_word(&mut chars, false)?;
                if value.is_empty() && !value_quoted {
                    return Err(BridgeError::Query(format!(
                        "missing value for column '{word}'"
                    )));
                }
                let is_null = !value_quoted && value.eq_ignore_ascii_case("null");
                match op {
                    CompareOp::Eq | CompareOp::Ne if is_null => terms.push(Term::Null {
                        column: word,
                        negated: op == CompareOp::Ne,
                    }),
                    _ => terms.push(Term::Constraint {
                        column: word,
                        op,
                        value,
                    }),
                }
            }
            _ => {
                if !word.is_empty() || quoted {
                    terms.push(Term::Keyword(word));
                }
            }
        }
    }

    Ok(terms)
}

/// Resolve user-typed column labels to element keys.
pub fn bind(terms: Vec<Term>, table: &TableMeta) -> BridgeResult<Predicate> {
    let predicates = terms
        .into_iter()
        .map(|term| match term {
            Term::Constraint { column, op, value } => {
                let key = resolve_column(&column, table)?;
                Ok(Predicate::Compare {
                    column: key,
                    op,
                    value,
                })
            }
            Term::Null { column, negated } => {
                let is_null = Predicate::IsNull(resolve_column(&column, table)?);
                Ok(if negated {
                    Predicate::Not(Box::new(is_null))
                } else {
                    is_null
                })
            }
            Term::Keyword(word) if word.is_empty() => Ok(Predicate::All),
            Term::Keyword(word) => Ok(Predicate::AnyContains(word)),
        })
        .collect::<BridgeResult<Vec<_>>>()?;
    Ok(Predicate::all_of(predicates))
}

/// Quote a literal so it survives `tokenize` unchanged.
///
/// ```
/// assert_eq!(parser::quote_value("East"), "\"East\"");
/// assert_eq!(parser::quote_value("a \"b\""), "\"a \\\"b\\\"\"");
/// ```
pub fn quote_value(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Display names and aliases match exactly; `region` does not find `Region`.
fn resolve_column(label: &str, table: &TableMeta) -> BridgeResult<String> {
    table
        .column_by_user_label(label)
        .map(|column| column.element_key.clone())
        .ok_or_else(|| {
            BridgeError::Query(format!(
                "unknown column '{label}' in '{}'",
                table.display_name
            ))
        })
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.next_if(|c| c.is_whitespace()).is_some() {}
}

fn is_operator_start(c: char) -> bool {
    matches!(c, ':' | '=' | '!' | '<' | '>')
}

/// Read a quoted phrase or a bare word. Column words stop at an operator;
/// values run to the next whitespace.
fn read_word(chars: &mut Peekable<Chars<'_>>, stop_at_operator: bool) -> BridgeResult<(String, bool)> {
    let mut word = String::new();
    if chars.next_if_eq(&'"').is_some() {
        loop {
            match chars.next() {
                Some('"') => return Ok((word, true)),
                Some('\\') => match chars.next() {
                    Some(escaped) => word.push(escaped),
                    None => break,
                },
                Some(c) => word.push(c),
                None => break,
            }
        }
        return Err(BridgeError::Query("unterminated quoted phrase".into()));
    }

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() || (stop_at_operator && is_operator_start(c)) {
            break;
        }
        word.push(c);
        chars.next();
    }
    Ok((word, false))
}

fn read_operator(chars: &mut Peekable<Chars<'_>>) -> BridgeResult<CompareOp> {
    let op = match chars.next() {
        Some(':') | Some('=') => CompareOp::Eq,
        Some('!') => {
            if chars.next_if_eq(&'=').is_none() {
                return Err(BridgeError::Query("expected '=' after '!'".into()));
            }
            CompareOp::Ne
        }
        Some('<') => {
            if chars.next_if_eq(&'=').is_some() {
                CompareOp::Le
            } else {
                CompareOp::Lt
            }
        }
        Some('>') => {
            if chars.next_if_eq(&'=').is_some() {
                CompareOp::Ge
            } else {
                CompareOp::Gt
            }
        }
        other => {
            return Err(BridgeError::Query(format!(
                "expected comparison operator, found {other:?}"
            )));
        }
    };
    Ok(op)
}
