//! Property-based round-trip tests over generated filter ASTs
//!
//! The generator only builds trees the parser itself can produce: logical
//! nodes never appear as bare children of other logical or negation nodes
//! (the parser always materializes the grouping parens as a `Parenthesized`
//! node), and arithmetic is left to the hand-written corpus in the printer
//! tests.

use chrono::{NaiveDate, NaiveTime};
use quickcheck::{Arbitrary, Gen, QuickCheck};
use rust_decimal::Decimal;
use siftql::{parse, stringify, ComparisonOperator, Expression, Literal, LogicalOperator};

const FIELDS: &[&str] = &["rate", "countryCode", "givenName", "address.city", "tag"];

// Plain words only: anything shaped like an ISO date or time would reparse
// as a typed temporal literal instead of a string.
const WORDS: &[&str] = &["alpha", "Beta", "gamma delta", "TR", "x"];

const PATTERNS: &[&str] = &["Jo%", "%mid%", "a_b", "%"];

#[derive(Clone, Debug)]
struct GeneratedFilter(Expression);

fn gen_scalar(g: &mut Gen) -> Expression {
    let literal = match u8::arbitrary(g) % 7 {
        0 => Literal::Number(Decimal::from(i16::arbitrary(g))),
        1 => Literal::Number(Decimal::new(i16::arbitrary(g) as i64, 2)),
        2 => Literal::String((*g.choose(WORDS).unwrap()).to_string()),
        3 => Literal::Boolean(bool::arbitrary(g)),
        4 => Literal::Date(
            NaiveDate::from_ymd_opt(
                2000 + (u8::arbitrary(g) % 30) as i32,
                1 + (u8::arbitrary(g) % 12) as u32,
                1 + (u8::arbitrary(g) % 28) as u32,
            )
            .unwrap(),
        ),
        5 => Literal::Time(
            NaiveTime::from_hms_milli_opt(
                (u8::arbitrary(g) % 24) as u32,
                (u8::arbitrary(g) % 60) as u32,
                (u8::arbitrary(g) % 60) as u32,
                (u16::arbitrary(g) % 1000) as u32,
            )
            .unwrap(),
        ),
        _ => Literal::Null,
    };
    Expression::Literal(literal)
}

fn gen_comparison(g: &mut Gen) -> Expression {
    use ComparisonOperator::*;

    let field = Expression::identifier(*g.choose(FIELDS).unwrap());
    let op = *g
        .choose(&[
            Eq, Ne, Gt, Ge, Lt, Le, In, NotIn, Like, NotLike, ILike, NotILike,
        ])
        .unwrap();
    let right = match op {
        In | NotIn => {
            let count = u8::arbitrary(g) % 4;
            Expression::Array {
                items: (0..count).map(|_| gen_scalar(g)).collect(),
            }
        }
        Like | NotLike | ILike | NotILike => {
            Expression::Literal(Literal::String((*g.choose(PATTERNS).unwrap()).to_string()))
        }
        _ => gen_scalar(g),
    };
    Expression::comparison(field, op, right)
}

fn gen_expr(g: &mut Gen, depth: usize) -> Expression {
    if depth == 0 {
        return gen_comparison(g);
    }
    match u8::arbitrary(g) % 6 {
        0 | 1 => gen_comparison(g),
        2 => Expression::negative(gen_comparison(g)),
        3 => Expression::parenthesized(gen_expr(g, depth - 1)),
        4 => Expression::negative(Expression::parenthesized(gen_expr(g, depth - 1))),
        _ => {
            let op = if bool::arbitrary(g) {
                LogicalOperator::And
            } else {
                LogicalOperator::Or
            };
            let count = 2 + (u8::arbitrary(g) % 2) as usize;
            let items = (0..count)
                .map(|_| {
                    let child = gen_expr(g, depth - 1);
                    if matches!(child, Expression::Logical { .. }) {
                        Expression::parenthesized(child)
                    } else {
                        child
                    }
                })
                .collect();
            Expression::Logical { op, items }
        }
    }
}

impl Arbitrary for GeneratedFilter {
    fn arbitrary(g: &mut Gen) -> Self {
        GeneratedFilter(gen_expr(g, 3))
    }
}

#[test]
fn prop_print_parse_round_trip() {
    fn prop(filter: GeneratedFilter) -> bool {
        let printed = stringify(&filter.0);
        match parse(&printed) {
            Ok(reparsed) => reparsed == filter.0,
            Err(_) => false,
        }
    }
    QuickCheck::new()
        .tests(500)
        .quickcheck(prop as fn(GeneratedFilter) -> bool);
}

#[test]
fn prop_stringify_is_a_fixpoint() {
    fn prop(filter: GeneratedFilter) -> bool {
        let once = stringify(&filter.0);
        match parse(&once) {
            Ok(reparsed) => stringify(&reparsed) == once,
            Err(_) => false,
        }
    }
    QuickCheck::new()
        .tests(500)
        .quickcheck(prop as fn(GeneratedFilter) -> bool);
}
