use super::*;

fn schema(cols: &[&str]) -> Vec<String> {
    cols.iter().map(|s| s.to_string()).collect()
}

#[test]
fn eval_equality_on_columns() {
    let row = Row::from_strs(&["Ann", "East", "3"]);
    let schema = schema(&["name", "region", "visits"]);
    let ctx = EvalContext { schema: &schema };

    assert!(ctx.eval(&Predicate::eq("region", "East"), &row).unwrap());
    assert!(!ctx.eval(&Predicate::eq("region", "east"), &row).unwrap());
    assert!(ctx.eval(&Predicate::All, &row).unwrap());
}

#[test]
fn eval_numeric_comparisons() {
    let row = Row::from_strs(&["10"]);
    let schema = schema(&["visits"]);
    let ctx = EvalContext { schema: &schema };

    for (op, value, expected) in [
        (CompareOp::Gt, "9", true),
        (CompareOp::Lt, "9", false),
        (CompareOp::Ge, "10.0", true),
        (CompareOp::Le, "2", false),
        (CompareOp::Ne, "10", false),
        (CompareOp::Eq, "10", true),
    ] {
        let pred = Predicate::Compare {
            column: "visits".into(),
            op,
            value: value.into(),
        };
        assert_eq!(
            ctx.eval(&pred, &row).unwrap(),
            expected,
            "{op:?} {value} should yield {expected}"
        );
    }
}

#[test]
fn equality_is_exact_text() {
    let schema = schema(&["zip"]);
    let ctx = EvalContext { schema: &schema };
    for (cell, value, equal) in [
        ("02134", "2134", false),
        ("2134.0", "2134", false),
        ("NaN", "1", false),
        ("inf", "inf", true),
        ("2134", "2134", true),
    ] {
        let row = Row::from_strs(&[cell]);
        let eq = Predicate::eq("zip", value);
        let ne = Predicate::Compare {
            column: "zip".into(),
            op: CompareOp::Ne,
            value: value.into(),
        };
        assert_eq!(ctx.eval(&eq, &row).unwrap(), equal, "{cell} = {value}");
        assert_eq!(ctx.eval(&ne, &row).unwrap(), !equal, "{cell} != {value}");
    }
}

#[test]
fn null_cells_never_compare() {
    let row = Row::new(vec![None]);
    let schema = schema(&["region"]);
    let ctx = EvalContext { schema: &schema };

    assert!(!ctx.eval(&Predicate::eq("region", "East"), &row).unwrap());
    let ne = Predicate::Compare {
        column: "region".into(),
        op: CompareOp::Ne,
        value: "East".into(),
    };
    assert!(!ctx.eval(&ne, &row).unwrap());
    assert!(ctx.eval(&Predicate::IsNull("region".into()), &row).unwrap());
}

#[test]
fn any_contains_ignores_case() {
    let row = Row::new(vec![Some("North East".into()), None]);
    let schema = schema(&["region", "notes"]);
    let ctx = EvalContext { schema: &schema };

    assert!(ctx.eval(&Predicate::AnyContains("EAST".into()), &row).unwrap());
    assert!(!ctx.eval(&Predicate::AnyContains("west".into()), &row).unwrap());
}

#[test]
fn and_and_not_combine() {
    let row = Row::from_strs(&["Ann", "East"]);
    let schema = schema(&["name", "region"]);
    let ctx = EvalContext { schema: &schema };

    let both = Predicate::all_of(vec![
        Predicate::eq("name", "Ann"),
        Predicate::eq("region", "East"),
    ]);
    assert!(ctx.eval(&both, &row).unwrap());

    let negated = Predicate::Not(Box::new(both));
    assert!(!ctx.eval(&negated, &row).unwrap());
}

#[test]
fn all_of_collapses_trivial_terms() {
    assert_eq!(Predicate::all_of(vec![]), Predicate::All);
    assert_eq!(
        Predicate::all_of(vec![Predicate::All, Predicate::eq("a", "1")]),
        Predicate::eq("a", "1")
    );
}

#[test]
fn unknown_column_is_an_error() {
    let row = Row::from_strs(&["x"]);
    let schema = schema(&["a"]);
    let ctx = EvalContext { schema: &schema };

    let err = ctx.eval(&Predicate::eq("b", "x"), &row).unwrap_err();
    assert!(format!("{err}").contains("unknown column 'b'"));
}
