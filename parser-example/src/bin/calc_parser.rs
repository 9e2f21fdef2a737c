//! Calculator example.
//!
//! A lexer parser turns text into `CalcToken`s, `tokenize` exposes them as a
//! stream, and a grammar parser builds an `Expr` tree from that stream.
//!
//! Supported syntax:
//! - numbers (integers and decimals)
//! - `+ - * /` (left associative) and `^` (right associative)
//! - parentheses and unary minus
//!
//! Usage: `calc-parser [EXPR]...`; without arguments a few samples are run.

use clap::Parser as ClapParser;
use lazyparse_core::{
    chain_left1, chain_right1, end, fix, float, one_of_str, satisfy, spaces, token, Parser, TextStream,
    Token,
};
use lazyparse_pipeline::Pipeline;
use lazyparse_stream::Stream;
use std::process::ExitCode;

#[derive(Debug, Clone, PartialEq)]
enum CalcToken {
    Number(f64),
    Plus,
    Minus,
    Multiply,
    Divide,
    Power,
    LeftParen,
    RightParen,
}

impl Token for CalcToken {
    fn describe(&self) -> String {
        match self {
            CalcToken::Number(value) => value.to_string(),
            CalcToken::Plus => "+".into(),
            CalcToken::Minus => "-".into(),
            CalcToken::Multiply => "*".into(),
            CalcToken::Divide => "/".into(),
            CalcToken::Power => "^".into(),
            CalcToken::LeftParen => "(".into(),
            CalcToken::RightParen => ")".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f64),
    Negate(Box<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    fn eval(&self) -> f64 {
        match self {
            Expr::Number(value) => *value,
            Expr::Negate(inner) => -inner.eval(),
            Expr::Binary { op, left, right } => {
                let (l, r) = (left.eval(), right.eval());
                match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Subtract => l - r,
                    BinaryOp::Multiply => l * r,
                    BinaryOp::Divide => l / r,
                    BinaryOp::Power => l.powf(r),
                }
            }
        }
    }
}

type Tokens = Stream<CalcToken>;

fn lexer() -> Parser<TextStream, CalcToken> {
    let number = satisfy::<TextStream>(|c: &char| c.is_ascii_digit())
        .look_ahead()
        .then(&float::<TextStream, f64>())
        .map(CalcToken::Number);
    let operator = one_of_str::<TextStream>("+-*/^()").map(|c| match c {
        '+' => CalcToken::Plus,
        '-' => CalcToken::Minus,
        '*' => CalcToken::Multiply,
        '/' => CalcToken::Divide,
        '^' => CalcToken::Power,
        '(' => CalcToken::LeftParen,
        _ => CalcToken::RightParen,
    });
    spaces::<TextStream>().then(&number.or(&operator)).skip(&spaces())
}

fn binary(op: BinaryOp) -> impl Fn(Expr, Expr) -> Expr {
    move |left, right| Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn operator(tok: CalcToken, op: BinaryOp) -> Parser<Tokens, impl Fn(Expr, Expr) -> Expr> {
    token::<Tokens>(tok).map(move |_| binary(op))
}

fn grammar() -> Parser<Tokens, Expr> {
    let expr = fix(|expr: Parser<Tokens, Expr>| {
        let number = satisfy::<Tokens>(|tok: &CalcToken| matches!(tok, CalcToken::Number(_))).map(|tok| match tok {
            CalcToken::Number(value) => Expr::Number(value),
            _ => Expr::Number(f64::NAN),
        });
        let close = token(CalcToken::RightParen).label("expected ')'").abort_on_failure();
        let group = expr.between(&token(CalcToken::LeftParen), &close);
        let atom = fix(|atom: Parser<Tokens, Expr>| {
            let negated = token(CalcToken::Minus)
                .then(&atom)
                .map(|inner| Expr::Negate(Box::new(inner)));
            number.or(&group).or(&negated).label("expected a number, '(' or '-'")
        });
        let power = chain_right1(&atom, &operator(CalcToken::Power, BinaryOp::Power));
        let product = chain_left1(
            &power,
            &operator(CalcToken::Multiply, BinaryOp::Multiply).or(&operator(CalcToken::Divide, BinaryOp::Divide)),
        );
        chain_left1(
            &product,
            &operator(CalcToken::Plus, BinaryOp::Add).or(&operator(CalcToken::Minus, BinaryOp::Subtract)),
        )
    });
    expr.skip(&end())
}

fn print_ast_tree(expr: &Expr, depth: usize) {
    let indent = "  ".repeat(depth);
    match expr {
        Expr::Number(value) => println!("{indent}{value}"),
        Expr::Negate(inner) => {
            println!("{indent}Negate");
            print_ast_tree(inner, depth + 1);
        }
        Expr::Binary { op, left, right } => {
            println!("{indent}{op:?}");
            print_ast_tree(left, depth + 1);
            print_ast_tree(right, depth + 1);
        }
    }
}

/// Parse and evaluate arithmetic expressions.
#[derive(Debug, ClapParser)]
#[command(name = "calc-parser")]
struct Args {
    /// Expressions to evaluate; a built-in sample set when omitted
    expressions: Vec<String>,
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();
    let expressions = if args.expressions.is_empty() {
        vec![
            "3 + 4".to_string(),
            "2 * 3.14".to_string(),
            "(1 + 2) * 3".to_string(),
            "2 ^ 3 ^ 2".to_string(),
            "10 / 2.5 - -1".to_string(),
            "3 + 4 * 5".to_string(),
            "(1 + 2".to_string(),
        ]
    } else {
        args.expressions
    };
    log::debug!("{} expression(s) to evaluate", expressions.len());

    let pipeline = Pipeline::new(lexer().label("invalid character"), grammar());
    let mut failed = false;
    for expr in &expressions {
        println!("Expression: {expr}");
        match pipeline.run(TextStream::from_text(expr)) {
            Ok(reply) => match reply.value() {
                Ok(ast) => {
                    print_ast_tree(&ast, 1);
                    println!("  = {}", ast.eval());
                }
                Err(err) => {
                    failed = true;
                    println!("  {err}");
                }
            },
            Err(err) => {
                failed = true;
                eprintln!("  Error: {err}");
            }
        }
        println!("{}", "-".repeat(50));
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluate(expr: &str) -> Result<f64, String> {
        let pipeline = Pipeline::new(lexer(), grammar());
        let reply = pipeline.run(TextStream::from_text(expr)).map_err(|err| err.to_string())?;
        reply.value().map(|ast| ast.eval()).map_err(|err| err.to_string())
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(evaluate("3 + 4 * 5"), Ok(23.0));
        assert_eq!(evaluate("(1 + 2) * 3"), Ok(9.0));
        assert_eq!(evaluate("2 ^ 3 ^ 2"), Ok(512.0));
        assert_eq!(evaluate("10 - 4 - 3"), Ok(3.0));
        assert_eq!(evaluate("10 / 2.5 - -1"), Ok(5.0));
    }

    #[test]
    fn test_unclosed_group_aborts() {
        let err = evaluate("(1 + 2").unwrap_err();
        assert!(err.starts_with("Abort"), "{err}");
        assert!(err.contains("expected ')'"), "{err}");
    }

    #[test]
    fn test_args() {
        let args = Args::try_parse_from(["calc-parser", "1 + 1", "2"]).unwrap();
        assert_eq!(args.expressions, vec!["1 + 1", "2"]);
    }
}
