use crate::engine;
use crate::node::{erase, pure_node, unerase, unerase_mut, update, Node, NodeRef, Repeat, Value};
use crate::reply::{Cause, Fault, Reply};
use lazyparse_stream::{Input, StreamError};
use std::error::Error;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

const NO_PROGRESS_MESSAGE: &str = "parser succeeded without consuming input";

/// A parser over input `I` producing values of type `T`.
///
/// Parsers are immutable descriptions. Cloning one is cheap and a parser can
/// be reused across any number of parses, including from several threads at
/// once. Running it is the job of the engine; see [`Parser::parse`] and
/// [`Parser::parse_partially`].
pub struct Parser<I: Input, T> {
    node: NodeRef<I>,
    _marker: PhantomData<fn() -> T>,
}

impl<I: Input, T: 'static> Parser<I, T> {
    pub(crate) fn from_node(node: NodeRef<I>) -> Self {
        Self {
            node,
            _marker: PhantomData,
        }
    }

    pub(crate) fn node(&self) -> &NodeRef<I> {
        &self.node
    }

    /// Runs the parser once at `input` without releasing anything.
    pub fn run(&self, input: I) -> Result<Reply<T, I>, StreamError> {
        Ok(engine::run(&self.node, input)?.map(unerase::<T>))
    }

    /// Reinterprets the node as producing `U`. The node must actually produce `U`.
    fn retyped<U: 'static>(node: Node<I>) -> Parser<I, U> {
        Parser::from_node(Arc::new(node))
    }

    fn hooked<U: 'static>(&self, hook: impl Fn(&I, Reply<Value, I>) -> Reply<Value, I> + Send + Sync + 'static) -> Parser<I, U> {
        Self::retyped(Node::Modify(Arc::clone(&self.node), Arc::new(hook)))
    }

    fn repeat<A: 'static>(
        &self,
        seed: NodeRef<I>,
        until: Option<NodeRef<I>>,
        min: usize,
        max: Option<usize>,
        step: impl Fn(&mut A, T) + Send + Sync + 'static,
    ) -> Parser<I, A> {
        let spec = Repeat {
            seed,
            item: Arc::clone(&self.node),
            until,
            step: Arc::new(move |acc: &mut Value, value: Value| step(unerase_mut::<A>(acc), unerase::<T>(value))),
            min,
            max,
        };
        Self::retyped(Node::Repeat(Arc::new(spec)))
    }

    fn collect(&self, min: usize, max: Option<usize>) -> Parser<I, Vec<T>> {
        self.repeat(pure_node(|| erase(Vec::<T>::new())), None, min, max, |items: &mut Vec<T>, item| {
            items.push(item)
        })
    }

    // --- value transforms ---

    /// Transforms the value of a success.
    ///
    /// `f` must not fail: a panic inside it unwinds through the parse. Use
    /// [`Parser::try_map`] for conversions that can fail.
    pub fn map<U: 'static>(&self, f: impl Fn(T) -> U + Send + Sync + 'static) -> Parser<I, U> {
        Self::retyped(Node::Map(
            Arc::clone(&self.node),
            Arc::new(move |value| Ok(erase(f(unerase::<T>(value))))),
        ))
    }

    /// Maps with a fallible function. An `Err` becomes a failure at the
    /// position this parser started from, carrying the error as its cause.
    pub fn try_map<U, E>(&self, f: impl Fn(T) -> Result<U, E> + Send + Sync + 'static) -> Parser<I, U>
    where
        U: 'static,
        E: Error + Send + Sync + 'static,
    {
        Self::retyped(Node::Map(
            Arc::clone(&self.node),
            Arc::new(move |value| match f(unerase::<T>(value)) {
                Ok(value) => Ok(erase(value)),
                Err(error) => Err(Arc::new(error) as Cause),
            }),
        ))
    }

    /// Replaces the value with a copy of `value`.
    pub fn map_to<U: Clone + Send + Sync + 'static>(&self, value: U) -> Parser<I, U> {
        self.map(move |_| value.clone())
    }

    /// Runs the parser that `f` builds from this parser's value.
    pub fn and_then<U: 'static>(&self, f: impl Fn(T) -> Parser<I, U> + Send + Sync + 'static) -> Parser<I, U> {
        Self::retyped(Node::Bind(
            Arc::clone(&self.node),
            Arc::new(move |value| Ok(f(unerase::<T>(value)).node)),
        ))
    }

    /// Like [`Parser::and_then`] with a fallible continuation. An `Err`
    /// becomes a failure at the position this parser started from.
    pub fn try_bind<U, E>(&self, f: impl Fn(T) -> Result<Parser<I, U>, E> + Send + Sync + 'static) -> Parser<I, U>
    where
        U: 'static,
        E: Error + Send + Sync + 'static,
    {
        Self::retyped(Node::Bind(
            Arc::clone(&self.node),
            Arc::new(move |value| match f(unerase::<T>(value)) {
                Ok(parser) => Ok(parser.node),
                Err(error) => Err(Arc::new(error) as Cause),
            }),
        ))
    }

    /// Runs `self` then `other`, combining both values.
    pub fn zip_with<U: 'static, V: 'static>(
        &self,
        other: &Parser<I, U>,
        f: impl Fn(T, U) -> V + Send + Sync + 'static,
    ) -> Parser<I, V> {
        Self::retyped(Node::Zip(
            Arc::clone(&self.node),
            Arc::clone(&other.node),
            Arc::new(move |first, second| erase(f(unerase::<T>(first), unerase::<U>(second)))),
        ))
    }

    // --- sequencing and choice ---

    /// Runs `self` then `other`, keeping both values.
    pub fn and<U: 'static>(&self, other: &Parser<I, U>) -> Parser<I, (T, U)> {
        self.zip_with(other, |first, second| (first, second))
    }

    /// Runs `self` then `other`, keeping the value of `other`.
    pub fn then<U: 'static>(&self, other: &Parser<I, U>) -> Parser<I, U> {
        self.zip_with(other, |_, second| second)
    }

    /// Runs `self` then `other`, keeping the value of `self`.
    pub fn skip<U: 'static>(&self, other: &Parser<I, U>) -> Parser<I, T> {
        self.zip_with(other, |first, _| first)
    }

    /// Tries `self`, and on failure tries `other` from the same state.
    /// An abort from `self` is final.
    pub fn or(&self, other: &Parser<I, T>) -> Parser<I, T> {
        Self::retyped(Node::Alt(Arc::clone(&self.node), Arc::clone(&other.node)))
    }

    /// Yields `Some` on a match and `None`, consuming nothing, otherwise.
    pub fn optional(&self) -> Parser<I, Option<T>> {
        let none: Parser<I, Option<T>> = Parser::from_node(pure_node(|| erase(None::<T>)));
        self.map(Some).or(&none)
    }

    /// Yields a copy of `value` when `self` fails.
    pub fn with_default(&self, value: T) -> Parser<I, T>
    where
        T: Clone + Send + Sync,
    {
        let fallback: Parser<I, T> = Parser::from_node(pure_node(move || erase(value.clone())));
        self.or(&fallback)
    }

    // --- repetition ---

    /// Zero or more matches. Never fails, but an abort from an item propagates.
    pub fn many(&self) -> Parser<I, Vec<T>> {
        self.collect(0, None)
    }

    /// One or more matches.
    pub fn many1(&self) -> Parser<I, Vec<T>> {
        self.collect(1, None)
    }

    /// Exactly `count` matches. Fails without consuming when fewer are available.
    pub fn times(&self, count: usize) -> Parser<I, Vec<T>> {
        self.collect(count, Some(count))
    }

    /// At least `min` matches.
    pub fn at_least(&self, min: usize) -> Parser<I, Vec<T>> {
        self.collect(min, None)
    }

    /// Between `min` and `max` matches, inclusive.
    pub fn repeat_range(&self, min: usize, max: usize) -> Parser<I, Vec<T>> {
        self.collect(min, Some(max.max(min)))
    }

    /// Like [`Parser::many`], discarding values as they arrive.
    pub fn skip_many(&self) -> Parser<I, ()> {
        self.repeat(pure_node(|| erase(())), None, 0, None, |_: &mut (), _| {})
    }

    /// Like [`Parser::many1`], discarding values.
    pub fn skip_many1(&self) -> Parser<I, ()> {
        self.repeat(pure_node(|| erase(())), None, 1, None, |_: &mut (), _| {})
    }

    /// Repeats `self` until `terminator` matches. The terminator is consumed
    /// and its value dropped.
    pub fn many_till<U: 'static>(&self, terminator: &Parser<I, U>) -> Parser<I, Vec<T>> {
        self.repeat(
            pure_node(|| erase(Vec::<T>::new())),
            Some(Arc::clone(&terminator.node)),
            0,
            None,
            |items: &mut Vec<T>, item| items.push(item),
        )
    }

    // --- folds ---

    /// Folds zero or more matches from the left, starting at `seed`.
    pub fn fold_left<A>(&self, seed: A, op: impl Fn(A, T) -> A + Send + Sync + 'static) -> Parser<I, A>
    where
        A: Clone + Send + Sync + 'static,
    {
        let seed = pure_node(move || erase(seed.clone()));
        let op = Arc::new(op);
        Self::retyped(Node::Repeat(Arc::new(Repeat {
            seed,
            item: Arc::clone(&self.node),
            until: None,
            step: Arc::new(move |acc: &mut Value, value: Value| {
                let item = unerase::<T>(value);
                update::<A>(acc, |acc| op(acc, item));
            }),
            min: 0,
            max: None,
        })))
    }

    /// Folds zero or more matches from the right: the last item meets `seed`
    /// first.
    pub fn fold_right<A>(&self, seed: A, op: impl Fn(T, A) -> A + Send + Sync + 'static) -> Parser<I, A>
    where
        A: Clone + Send + Sync + 'static,
    {
        self.many()
            .map(move |items| items.into_iter().rev().fold(seed.clone(), |acc, item| op(item, acc)))
    }

    // --- separators ---

    /// One or more matches separated by `separator`.
    pub fn sep_by1<U: 'static>(&self, separator: &Parser<I, U>) -> Parser<I, Vec<T>> {
        let first = self.map(|item| vec![item]);
        separator.then(self).repeat(Arc::clone(&first.node), None, 0, None, |items: &mut Vec<T>, item| {
            items.push(item)
        })
    }

    /// Zero or more matches separated by `separator`.
    pub fn sep_by<U: 'static>(&self, separator: &Parser<I, U>) -> Parser<I, Vec<T>> {
        let empty: Parser<I, Vec<T>> = Parser::from_node(pure_node(|| erase(Vec::<T>::new())));
        self.sep_by1(separator).or(&empty)
    }

    /// Zero or more matches, each followed by `separator`.
    pub fn end_by<U: 'static>(&self, separator: &Parser<I, U>) -> Parser<I, Vec<T>> {
        self.skip(separator).many()
    }

    /// Zero or more matches separated by `separator`, with an optional
    /// trailing separator.
    pub fn sep_end_by<U: 'static>(&self, separator: &Parser<I, U>) -> Parser<I, Vec<T>> {
        self.sep_by(separator).skip(&separator.optional())
    }

    /// Matches `self` between `open` and `close`, keeping only its value.
    pub fn between<A: 'static, B: 'static>(&self, open: &Parser<I, A>, close: &Parser<I, B>) -> Parser<I, T> {
        open.then(self).skip(close)
    }

    // --- result shaping ---

    /// Runs a hook over the reply, given the state this parser started at.
    pub fn modify_result<U: 'static>(
        &self,
        hook: impl Fn(&I, Reply<T, I>) -> Reply<U, I> + Send + Sync + 'static,
    ) -> Parser<I, U> {
        self.hooked(move |start, reply| hook(start, reply.map(unerase::<T>)).map(erase))
    }

    /// Matches without consuming: on success the state is reset to where
    /// this parser started.
    pub fn look_ahead(&self) -> Parser<I, T> {
        self.hooked(|start, reply| match reply {
            Reply::Success { value, .. } => Reply::success(value, start.clone()),
            other => other,
        })
    }

    /// Succeeds without consuming exactly when `self` fails.
    pub fn not(&self) -> Parser<I, ()> {
        self.hooked(|start, reply| match reply {
            Reply::Success { .. } => Reply::failure(Fault::unexpected(start.clone())),
            Reply::Failure(_) => Reply::success(erase(()), start.clone()),
            abort => abort,
        })
    }

    /// Fails at the starting state when the value does not satisfy `predicate`.
    pub fn guard(&self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Parser<I, T> {
        self.hooked(move |start, reply| match reply {
            Reply::Success { value, state } => {
                let accepted = value.downcast_ref::<T>().is_some_and(&predicate);
                if accepted {
                    Reply::success(value, state)
                } else {
                    Reply::failure(Fault::unexpected(start.clone()))
                }
            }
            other => other,
        })
    }

    /// Replaces the message of a failure.
    pub fn label(&self, message: impl Into<String>) -> Parser<I, T> {
        let message = message.into();
        self.hooked(move |_, reply| match reply {
            Reply::Failure(fault) => Reply::failure(fault.with_message(message.clone())),
            other => other,
        })
    }

    /// Turns every failure into an abort.
    pub fn abort_on_failure(&self) -> Parser<I, T> {
        self.hooked(|_, reply| match reply {
            Reply::Failure(fault) => Reply::abort(fault),
            other => other,
        })
    }

    /// Turns a failure into an abort once input has been consumed.
    ///
    /// A failure at the starting state stays recoverable, so alternatives
    /// that do not get past their first token still backtrack.
    pub fn commit(&self) -> Parser<I, T> {
        self.hooked(|start, reply| match reply {
            Reply::Failure(fault) if fault.state() != start => Reply::abort(fault),
            other => other,
        })
    }

    /// Turns an abort back into an ordinary failure.
    pub fn recover(&self) -> Parser<I, T> {
        self.hooked(|_, reply| match reply {
            Reply::Abort(fault) => Reply::failure(fault),
            other => other,
        })
    }

    /// Fails when `self` succeeds without consuming input.
    pub fn require_progress(&self) -> Parser<I, T> {
        self.hooked(|start, reply| match reply {
            Reply::Success { state, .. } if &state == start => {
                Reply::failure(Fault::new(NO_PROGRESS_MESSAGE, state))
            }
            other => other,
        })
    }

    /// Pairs the value with the position this parser started at.
    pub fn with_position(&self) -> Parser<I, (I::Position, T)> {
        let position: Parser<I, I::Position> = Parser::from_node(Arc::new(Node::Peek(Arc::new(|state: &I| erase(state.position())))));
        position.and(self)
    }
}

impl<I: Input> Parser<I, Vec<char>> {
    /// Joins matched characters into a `String`.
    pub fn collect_string(&self) -> Parser<I, String> {
        self.map(|chars| chars.into_iter().collect())
    }
}

impl<I: Input, T> Clone for Parser<I, T> {
    fn clone(&self) -> Self {
        Self {
            node: Arc::clone(&self.node),
            _marker: PhantomData,
        }
    }
}

impl<I: Input, T> fmt::Debug for Parser<I, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parser<{}>", std::any::type_name::<T>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::{any, fail, pure, token};
    use lazyparse_stream::TextStream;

    fn text(input: &str) -> TextStream {
        TextStream::from_text(input)
    }

    #[test]
    fn test_map_and_then() {
        let parser = any::<TextStream>()
            .map(|c| c.to_ascii_uppercase())
            .and_then(|c| token(c.to_ascii_lowercase()).map(move |_| c));
        let reply = parser.run(text("aa")).unwrap();
        assert_eq!(reply.as_value(), Some(&'A'));
        assert_eq!(reply.position().column, 3);
    }

    #[test]
    fn test_try_map_error_becomes_failure_with_cause() {
        let parser = any::<TextStream>().try_map(|c| c.to_string().parse::<u8>());
        let reply = parser.run(text("x")).unwrap();
        assert!(reply.is_failure());
        let fault = reply.fault().unwrap();
        assert!(fault.cause().is_some());
        assert_eq!(fault.position().column, 1);
    }

    #[test]
    #[should_panic(expected = "unrepresentable")]
    fn test_map_panic_propagates() {
        let parser = any::<TextStream>().map(|_| -> char { panic!("unrepresentable") });
        let _ = parser.run(text("x"));
    }

    #[test]
    fn test_optional_and_default() {
        let parser = token::<TextStream>('a').optional();
        assert_eq!(parser.run(text("b")).unwrap().as_value(), Some(&None));
        let parser = token::<TextStream>('a').with_default('z');
        assert_eq!(parser.run(text("b")).unwrap().as_value(), Some(&'z'));
    }

    #[test]
    fn test_commit_only_after_consumption() {
        let ab = token::<TextStream>('a').then(&token('b')).commit();
        let fallback = pure::<TextStream, char>('?');
        let parser = ab.or(&fallback);
        assert_eq!(parser.run(text("x")).unwrap().as_value(), Some(&'?'));
        assert!(parser.run(text("ax")).unwrap().is_abort());
    }

    #[test]
    fn test_recover_turns_abort_into_failure() {
        let parser = fail::<TextStream, char>().abort_on_failure().recover().or(&pure('k'));
        assert_eq!(parser.run(text("")).unwrap().as_value(), Some(&'k'));
    }

    #[test]
    fn test_require_progress() {
        let parser = pure::<TextStream, u8>(1).require_progress();
        let reply = parser.run(text("a")).unwrap();
        assert_eq!(reply.message().as_deref(), Some(NO_PROGRESS_MESSAGE));
    }

    #[test]
    fn test_guard() {
        let parser = any::<TextStream>().guard(|c| c.is_ascii_digit());
        assert!(parser.run(text("7")).unwrap().is_success());
        let reply = parser.run(text("x")).unwrap();
        assert!(reply.is_failure());
        assert_eq!(reply.position().column, 1);
    }

    #[test]
    fn test_sep_end_by_allows_trailing_separator() {
        let parser = any::<TextStream>().guard(|c| c.is_alphabetic()).sep_end_by(&token(','));
        let reply = parser.run(text("a,b,")).unwrap();
        assert_eq!(reply.as_value(), Some(&vec!['a', 'b']));
        assert!(reply.state().is_eof());
    }

    #[test]
    fn test_with_position() {
        let parser = token::<TextStream>('a').then(&any().with_position());
        let (position, c) = parser.run(text("ab")).unwrap().value().unwrap();
        assert_eq!(c, 'b');
        assert_eq!(position.column, 2);
    }

    #[test]
    fn test_parsers_are_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Parser<TextStream, Vec<char>>>();
    }
}
