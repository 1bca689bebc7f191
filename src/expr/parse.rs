use chumsky::{prelude::*, regex::regex, text::ascii::ident};

use super::Expr;
use crate::record::{Schema, Value};

/// Comparison spellings accepted by the parser. `!=` and `>` are sugar:
/// the expression tree only carries `Eq` and `Lt`.
#[derive(Debug, Clone, Copy, PartialEq)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Gt,
}

/// Parse a predicate string into an expression tree.
///
/// Grammar, loosest first:
///
/// ```text
/// predicate  := conjunction ("||" conjunction)*
/// conjunction:= negation ("&&" negation)*
/// negation   := "!"* comparison
/// comparison := atom (("==" | "!=" | "<" | ">") atom)?
/// atom       := float | int | 'string' | true | false
///             | #<attr index> | <attr name> | "(" predicate ")"
/// ```
///
/// Attribute names resolve against `schema`; `#N` refers to attribute N
/// directly.
pub fn parse_predicate(input: &str, schema: &Schema) -> Result<Expr, String> {
    parser(schema)
        .then_ignore(end())
        .parse(input)
        .into_result()
        .map_err(|errs| format!("Predicate errors: {:?}", errs))
}

fn parser<'a>(schema: &'a Schema) -> impl Parser<'a, &'a str, Expr, extra::Err<Rich<'a, char>>> {
    let float = regex(r"-?\d+\.\d*")
        .try_map(|s: &str, span| {
            s.parse::<f32>()
                .map(|val| Expr::Const(Value::Float(val)))
                .map_err(|err| Rich::custom(span, err.to_string()))
        })
        .padded();

    let integer = regex(r"-?\d+")
        .try_map(|s: &str, span| {
            s.parse::<i32>()
                .map(|val| Expr::Const(Value::Int(val)))
                .map_err(|err| Rich::custom(span, err.to_string()))
        })
        .padded();

    let string = regex(r"'[^']*'")
        .map(|s: &str| Expr::Const(Value::String(s[1..s.len() - 1].to_string())))
        .padded();

    let attr_by_index = just('#')
        .ignore_then(regex(r"\d+"))
        .try_map(|s: &str, span| {
            s.parse::<usize>()
                .map(Expr::AttrRef)
                .map_err(|err| Rich::custom(span, err.to_string()))
        })
        .padded();

    // Bare identifiers are boolean literals or schema attribute names
    let word = ident()
        .try_map(move |name: &str, span| match name {
            "true" => Ok(Expr::Const(Value::Bool(true))),
            "false" => Ok(Expr::Const(Value::Bool(false))),
            _ => schema
                .attr_index(name)
                .map(Expr::AttrRef)
                .ok_or_else(|| Rich::custom(span, format!("unknown attribute: {}", name))),
        })
        .padded();

    recursive(|expr| {
        let atom = choice((
            float,
            integer,
            string,
            attr_by_index,
            word,
            expr.delimited_by(just('(').padded(), just(')').padded()),
        ));

        let comparison = atom
            .clone()
            .then(
                choice((
                    just("==").to(CmpOp::Eq),
                    just("!=").to(CmpOp::Ne),
                    just("<").to(CmpOp::Lt),
                    just(">").to(CmpOp::Gt),
                ))
                .padded()
                .then(atom)
                .or_not(),
            )
            .map(|(lhs, rest)| match rest {
                None => lhs,
                Some((CmpOp::Eq, rhs)) => Expr::eq(lhs, rhs),
                Some((CmpOp::Ne, rhs)) => Expr::not(Expr::eq(lhs, rhs)),
                Some((CmpOp::Lt, rhs)) => Expr::lt(lhs, rhs),
                Some((CmpOp::Gt, rhs)) => Expr::lt(rhs, lhs),
            });

        let negation = just('!')
            .padded()
            .repeated()
            .foldr(comparison, |_, arg| Expr::not(arg));

        let conjunction = negation.clone().foldl(
            just("&&").padded().ignore_then(negation).repeated(),
            Expr::and,
        );

        conjunction.clone().foldl(
            just("||").padded().ignore_then(conjunction).repeated(),
            Expr::or,
        )
    })
}
