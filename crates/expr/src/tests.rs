use super::*;
use common::Row;

fn ctx(rng: &mut Lcg) -> EvalContext<'_> {
    EvalContext::new(
        rng,
        date::ParsedDate {
            year: 2026,
            month: 7,
            day: 28,
        },
    )
}

#[test]
fn column_lookup_reads_flattened_row() {
    let row = Row::new(vec![Value::Int(1), Value::Text("Ada".into())]);
    let mut rng = Lcg::new(1);
    let mut c = ctx(&mut rng);
    assert_eq!(
        c.eval(&Expr::Column(1), &row).unwrap(),
        Value::Text("Ada".into())
    );
}

#[test]
fn unary_not_requires_bool() {
    let row = Row::new(vec![Value::Bool(true)]);
    let mut rng = Lcg::new(1);
    let mut c = ctx(&mut rng);
    let expr = Expr::Unary {
        op: UnaryOp::Not,
        expr: Box::new(Expr::Column(0)),
    };
    assert_eq!(c.eval(&expr, &row).unwrap(), Value::Bool(false));
}

#[test]
fn is_null_reports_presence() {
    let row = Row::new(vec![Value::Null, Value::Int(1)]);
    let mut rng = Lcg::new(1);
    let mut c = ctx(&mut rng);
    assert_eq!(
        c.eval(
            &Expr::Unary {
                op: UnaryOp::IsNull,
                expr: Box::new(Expr::Column(0))
            },
            &row
        )
        .unwrap(),
        Value::Bool(true)
    );
    assert_eq!(
        c.eval(
            &Expr::Unary {
                op: UnaryOp::IsNotNull,
                expr: Box::new(Expr::Column(1))
            },
            &row
        )
        .unwrap(),
        Value::Bool(true)
    );
}

#[test]
fn concat_joins_displayed_forms() {
    let row = Row::new(vec![Value::Text("Ada".into()), Value::Int(1)]);
    let mut rng = Lcg::new(1);
    let mut c = ctx(&mut rng);
    let expr = Expr::Concat(vec![
        Expr::Column(0),
        Expr::Literal(Value::Text("-".into())),
        Expr::Column(1),
    ]);
    assert_eq!(c.eval(&expr, &row).unwrap(), Value::Text("Ada-1".into()));
}

#[test]
fn function_dispatch_runs_through_eval_context() {
    let row = Row::new(vec![Value::Text("hello".into())]);
    let mut rng = Lcg::new(1);
    let mut c = ctx(&mut rng);
    let expr = Expr::Function {
        func: ScalarFn::Length,
        args: vec![Expr::Column(0)],
    };
    assert_eq!(c.eval(&expr, &row).unwrap(), Value::Int(5));
}

#[test]
fn binary_and_requires_bools() {
    let row = Row::new(vec![Value::Bool(true), Value::Bool(false)]);
    let mut rng = Lcg::new(1);
    let mut c = ctx(&mut rng);
    let expr = Expr::Binary {
        left: Box::new(Expr::Column(0)),
        op: BinaryOp::And,
        right: Box::new(Expr::Column(1)),
    };
    assert_eq!(c.eval(&expr, &row).unwrap(), Value::Bool(false));
}

#[test]
fn mismatched_types_still_compare_lexicographically() {
    // Unlike the teacher's strict same-type comparator, csvql's predicate
    // rules (spec §4.8) always fall back to byte comparison rather than
    // erroring, since every driver value is fundamentally text.
    let row = Row::new(vec![Value::Int(1), Value::Text("1".into())]);
    let mut rng = Lcg::new(1);
    let mut c = ctx(&mut rng);
    let expr = Expr::Binary {
        left: Box::new(Expr::Column(0)),
        op: BinaryOp::Eq,
        right: Box::new(Expr::Column(1)),
    };
    assert_eq!(c.eval(&expr, &row).unwrap(), Value::Bool(true));
}

#[test]
fn aggregate_expr_cannot_be_evaluated_directly() {
    let row = Row::new(vec![Value::Int(1)]);
    let mut rng = Lcg::new(1);
    let mut c = ctx(&mut rng);
    let expr = Expr::Aggregate {
        kind: AggregateKind::Count,
        arg: None,
        star: true,
    };
    assert!(c.eval(&expr, &row).is_err());
}

#[test]
fn current_date_resolves_against_context_today() {
    let row = Row::new(vec![]);
    let mut rng = Lcg::new(1);
    let mut c = ctx(&mut rng);
    assert_eq!(
        c.eval(&Expr::CurrentDate, &row).unwrap(),
        Value::Text("2026-07-28".into())
    );
}
