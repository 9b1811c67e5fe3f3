use expr::CompareOp;

/// One whitespace-separated search term before column binding.
#[derive(Clone, Debug, PartialEq)]
pub enum Term {
    /// `column<op>value`, with the column still spelled as the user typed it.
    Constraint {
        column: String,
        op: CompareOp,
        value: String,
    },
    /// `column:null` or `column!=null`.
    Null { column: String, negated: bool },
    /// A bare word or quoted phrase, matched against every column.
    Keyword(String),
}
