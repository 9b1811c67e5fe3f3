#[cfg(test)]
mod tests;

use common::{BridgeError, BridgeResult, Row};
use std::cmp::Ordering;
use types::compare_cells;

/// Comparison operators available in search terms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    /// `Eq`/`Ne` compare exact text, so `"02134"` and `"2134"` differ;
    /// the ordering operators go through [`compare_cells`].
    fn holds(self, cell: &str, value: &str) -> bool {
        let ord = || compare_cells(cell, value);
        match self {
            CompareOp::Eq => cell == value,
            CompareOp::Ne => cell != value,
            CompareOp::Lt => ord() == Ordering::Less,
            CompareOp::Le => ord() != Ordering::Greater,
            CompareOp::Gt => ord() == Ordering::Greater,
            CompareOp::Ge => ord() != Ordering::Less,
        }
    }
}

/// Structured row filter produced by the query parser.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Predicate {
    /// Matches every row.
    All,
    /// Compare one column (by element key) against a literal.
    ///
    /// Examples:
    /// - `Compare { column: "region", op: Eq, value: "East" }` - from `Region:East`
    /// - `Compare { column: "visits", op: Ge, value: "3" }` - from `Visits>=3`
    Compare {
        column: String,
        op: CompareOp,
        value: String,
    },
    /// True when the column's cell is null.
    IsNull(String),
    /// Case-insensitive substring match against any cell of the row.
    AnyContains(String),
    And(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::Compare {
            column: column.into(),
            op: CompareOp::Eq,
            value: value.into(),
        }
    }

    /// Combine terms, collapsing the trivial cases.
    pub fn all_of(mut terms: Vec<Predicate>) -> Self {
        terms.retain(|t| *t != Predicate::All);
        match terms.len() {
            0 => Predicate::All,
            1 => terms.remove(0),
            _ => Predicate::And(terms),
        }
    }
}

/// Evaluation context consisting of the row schema (element keys in order).
pub struct EvalContext<'a> {
    pub schema: &'a [String],
}

impl<'a> EvalContext<'a> {
    /// Evaluate a predicate over a given row.
    pub fn eval(&self, predicate: &Predicate, row: &Row) -> BridgeResult<bool> {
        match predicate {
            Predicate::All => Ok(true),
            Predicate::Compare { column, op, value } => {
                let idx = self.find_column(column)?;
                Ok(match row.cell(idx) {
                    Some(cell) => op.holds(cell, value),
                    None => false,
                })
            }
            Predicate::IsNull(column) => {
                let idx = self.find_column(column)?;
                Ok(row.cell(idx).is_none())
            }
            Predicate::AnyContains(needle) => {
                let needle = needle.to_lowercase();
                Ok(row
                    .cells
                    .iter()
                    .flatten()
                    .any(|cell| cell.to_lowercase().contains(&needle)))
            }
            Predicate::And(terms) => {
                for term in terms {
                    if !self.eval(term, row)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Predicate::Not(inner) => Ok(!self.eval(inner, row)?),
        }
    }

    fn find_column(&self, key: &str) -> BridgeResult<usize> {
        self.schema
            .iter()
            .position(|c| c == key)
            .ok_or_else(|| BridgeError::Query(format!("unknown column '{key}'")))
    }
}
