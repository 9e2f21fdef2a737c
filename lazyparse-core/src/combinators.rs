//! Free-standing constructors for primitive and composite parsers.

use crate::node::{erase, pure_node, update, LazyNode, Node, Repeat, Value};
use crate::parser::Parser;
use lazyparse_stream::Input;
use std::sync::Arc;

/// Succeeds with `value` without consuming input.
pub fn pure<I: Input, T: Clone + Send + Sync + 'static>(value: T) -> Parser<I, T> {
    Parser::from_node(pure_node(move || erase(value.clone())))
}

/// Consumes one token if `predicate` holds for it.
pub fn satisfy<I: Input>(predicate: impl Fn(&I::Token) -> bool + Send + Sync + 'static) -> Parser<I, I::Token> {
    Parser::from_node(Arc::new(Node::Satisfy(Arc::new(predicate))))
}

/// Consumes any one token. Fails only at end of input.
pub fn any<I: Input>() -> Parser<I, I::Token> {
    satisfy(|_| true)
}

/// Consumes one token equal to `expected`.
pub fn token<I: Input>(expected: I::Token) -> Parser<I, I::Token>
where
    I::Token: PartialEq + Send + Sync,
{
    satisfy(move |token| *token == expected)
}

/// Consumes one token contained in `set`.
pub fn one_of<I: Input>(set: impl IntoIterator<Item = I::Token>) -> Parser<I, I::Token>
where
    I::Token: PartialEq + Send + Sync,
{
    let set: Vec<I::Token> = set.into_iter().collect();
    satisfy(move |token| set.contains(token))
}

/// Consumes one token not contained in `set`.
pub fn none_of<I: Input>(set: impl IntoIterator<Item = I::Token>) -> Parser<I, I::Token>
where
    I::Token: PartialEq + Send + Sync,
{
    let set: Vec<I::Token> = set.into_iter().collect();
    satisfy(move |token| !set.contains(token))
}

/// Consumes exactly `count` tokens. With fewer available it fails and the
/// caller's state is untouched; `take(0)` always succeeds.
pub fn take<I: Input>(count: usize) -> Parser<I, Vec<I::Token>> {
    any().times(count)
}

/// Succeeds only when no tokens remain.
pub fn end<I: Input>() -> Parser<I, ()> {
    Parser::from_node(Arc::new(Node::End))
}

/// Always fails with the default `Unexpected '...'` message.
pub fn fail<I: Input, T: 'static>() -> Parser<I, T> {
    Parser::from_node(Arc::new(Node::Fail(None)))
}

/// Always fails with `message`.
pub fn fail_with<I: Input, T: 'static>(message: impl Into<String>) -> Parser<I, T> {
    Parser::from_node(Arc::new(Node::Fail(Some(message.into()))))
}

/// Always aborts. No enclosing alternative can recover from it.
pub fn abort<I: Input, T: 'static>(message: impl Into<String>) -> Parser<I, T> {
    Parser::from_node(Arc::new(Node::Abort(message.into())))
}

/// Tries each parser in order and returns the first success.
///
/// An empty list fails.
pub fn choice<I: Input, T: 'static>(parsers: impl IntoIterator<Item = Parser<I, T>>) -> Parser<I, T> {
    let parsers: Vec<Parser<I, T>> = parsers.into_iter().collect();
    let mut rest = parsers.into_iter().rev();
    match rest.next() {
        Some(last) => rest.fold(last, |tail, head| head.or(&tail)),
        None => fail(),
    }
}

/// Runs each parser in order and collects their values.
pub fn sequence<I: Input, T: 'static>(parsers: impl IntoIterator<Item = Parser<I, T>>) -> Parser<I, Vec<T>> {
    parsers.into_iter().fold(
        Parser::from_node(pure_node(|| erase(Vec::<T>::new()))),
        |acc, parser| {
            acc.zip_with(&parser, |mut items, item| {
                items.push(item);
                items
            })
        },
    )
}

/// See [`Parser::look_ahead`].
pub fn look_ahead<I: Input, T: 'static>(parser: &Parser<I, T>) -> Parser<I, T> {
    parser.look_ahead()
}

/// See [`Parser::not`].
pub fn not<I: Input, T: 'static>(parser: &Parser<I, T>) -> Parser<I, ()> {
    parser.not()
}

/// Builds a self-referential parser.
///
/// `f` receives a handle to the parser being defined and returns its body.
/// The handle is resolved when the engine reaches it, so `f` runs once and
/// the grammar is never unrolled. The handle holds only a weak reference to
/// the definition; it must not outlive the parser `fix` returns.
pub fn fix<I: Input, T: 'static>(f: impl FnOnce(Parser<I, T>) -> Parser<I, T>) -> Parser<I, T> {
    let lazy = Arc::new(LazyNode::unbound());
    let handle = Parser::from_node(Arc::new(Node::Recur(Arc::downgrade(&lazy))));
    let body = f(handle);
    lazy.bind(Arc::clone(body.node()));
    Parser::from_node(Arc::new(Node::Lazy(lazy)))
}

/// Defers building a parser until the first time it runs.
pub fn delay<I: Input, T: 'static>(build: impl Fn() -> Parser<I, T> + Send + Sync + 'static) -> Parser<I, T> {
    let lazy = LazyNode::deferred(Box::new(move || Arc::clone(build().node())));
    Parser::from_node(Arc::new(Node::Lazy(Arc::new(lazy))))
}

/// Yields the current position without consuming.
pub fn position<I: Input>() -> Parser<I, I::Position> {
    Parser::from_node(Arc::new(Node::Peek(Arc::new(|state: &I| erase(state.position())))))
}

/// Yields the current state without consuming.
pub fn state<I: Input>() -> Parser<I, I> {
    Parser::from_node(Arc::new(Node::Peek(Arc::new(|state: &I| erase(state.clone())))))
}

/// One or more operands separated by operators, folded left-associatively.
///
/// `op` yields the function that combines its two neighbours. The chain is
/// evaluated as a loop, so its length is not bounded by the call stack.
pub fn chain_left1<I, T, F>(operand: &Parser<I, T>, op: &Parser<I, F>) -> Parser<I, T>
where
    I: Input,
    T: 'static,
    F: Fn(T, T) -> T + 'static,
{
    let pair = op.and(operand);
    Parser::from_node(Arc::new(Node::Repeat(Arc::new(Repeat {
        seed: Arc::clone(operand.node()),
        item: Arc::clone(pair.node()),
        until: None,
        step: Arc::new(|acc: &mut Value, value: Value| {
            let (f, right) = crate::node::unerase::<(F, T)>(value);
            update::<T>(acc, |left| f(left, right));
        }),
        min: 0,
        max: None,
    }))))
}

/// One or more operands separated by operators, folded right-associatively.
pub fn chain_right1<I, T, F>(operand: &Parser<I, T>, op: &Parser<I, F>) -> Parser<I, T>
where
    I: Input,
    T: 'static,
    F: Fn(T, T) -> T + 'static,
{
    operand.and(&op.and(operand).many()).map(|(first, rest)| {
        let mut operands = Vec::with_capacity(rest.len() + 1);
        let mut ops = Vec::with_capacity(rest.len());
        operands.push(first);
        for (f, operand) in rest {
            ops.push(f);
            operands.push(operand);
        }
        let mut acc = match operands.pop() {
            Some(last) => last,
            None => unreachable!("chain always holds its first operand"),
        };
        while let (Some(f), Some(left)) = (ops.pop(), operands.pop()) {
            acc = f(left, acc);
        }
        acc
    })
}

/// Like [`chain_left1`], succeeding with `default` when no operand matches.
pub fn chain_left<I, T, F>(operand: &Parser<I, T>, op: &Parser<I, F>, default: T) -> Parser<I, T>
where
    I: Input,
    T: Clone + Send + Sync + 'static,
    F: Fn(T, T) -> T + 'static,
{
    chain_left1(operand, op).with_default(default)
}

/// Like [`chain_right1`], succeeding with `default` when no operand matches.
pub fn chain_right<I, T, F>(operand: &Parser<I, T>, op: &Parser<I, F>, default: T) -> Parser<I, T>
where
    I: Input,
    T: Clone + Send + Sync + 'static,
    F: Fn(T, T) -> T + 'static,
{
    chain_right1(operand, op).with_default(default)
}
