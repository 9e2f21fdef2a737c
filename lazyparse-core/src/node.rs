//! Parsers as data.
//!
//! A parser is a graph of [`Node`]s with its values type-erased, so that the
//! engine can walk any composition with a single loop. The typed surface in
//! [`crate::parser`] is a thin wrapper that erases values on the way in and
//! recovers them on the way out.

use crate::reply::{Cause, Reply};
use lazyparse_stream::Input;
use std::any::Any;
use std::sync::{Arc, OnceLock, Weak};

pub(crate) type Value = Box<dyn Any>;
pub(crate) type NodeRef<I> = Arc<Node<I>>;

pub(crate) type MakeFn = Arc<dyn Fn() -> Value + Send + Sync>;
pub(crate) type PeekFn<I> = Arc<dyn Fn(&I) -> Value + Send + Sync>;
pub(crate) type TestFn<I> = Arc<dyn Fn(&<I as Input>::Token) -> bool + Send + Sync>;
pub(crate) type MapFn = Arc<dyn Fn(Value) -> Result<Value, Cause> + Send + Sync>;
pub(crate) type BindFn<I> = Arc<dyn Fn(Value) -> Result<NodeRef<I>, Cause> + Send + Sync>;
pub(crate) type ZipFn = Arc<dyn Fn(Value, Value) -> Value + Send + Sync>;
pub(crate) type HookFn<I> = Arc<dyn Fn(&I, Reply<Value, I>) -> Reply<Value, I> + Send + Sync>;
pub(crate) type StepFn = Arc<dyn Fn(&mut Value, Value) + Send + Sync>;

pub(crate) enum Node<I: Input> {
    /// Succeeds with a fresh copy of a value, consuming nothing.
    Pure(MakeFn),
    /// Succeeds with a value read off the current state, consuming nothing.
    Peek(PeekFn<I>),
    /// Consumes one token if the test holds.
    Satisfy(TestFn<I>),
    /// Succeeds only at end of input.
    End,
    Fail(Option<String>),
    Abort(String),
    Map(NodeRef<I>, MapFn),
    /// Runs the inner node, then the node the continuation builds from its value.
    Bind(NodeRef<I>, BindFn<I>),
    /// Runs two nodes in order and combines both values.
    Zip(NodeRef<I>, NodeRef<I>, ZipFn),
    Alt(NodeRef<I>, NodeRef<I>),
    /// Lets a hook rewrite the inner reply, given the state the inner node started at.
    Modify(NodeRef<I>, HookFn<I>),
    Repeat(Arc<Repeat<I>>),
    Lazy(Arc<LazyNode<I>>),
    /// Back-reference from inside a `fix` body to its own definition.
    Recur(Weak<LazyNode<I>>),
}

impl<I: Input> Node<I> {
    fn is_leaf(&self) -> bool {
        matches!(
            self,
            Node::Pure(_) | Node::Peek(_) | Node::Satisfy(_) | Node::End | Node::Fail(_) | Node::Abort(_) | Node::Recur(_)
        )
    }

    /// Moves every uniquely owned child out into `out`, leaving a shared
    /// placeholder behind.
    fn detach_children(&mut self, hole: &mut Option<NodeRef<I>>, out: &mut Vec<NodeRef<I>>) {
        match self {
            Node::Map(inner, _) | Node::Bind(inner, _) | Node::Modify(inner, _) => detach(inner, hole, out),
            Node::Zip(first, second, _) | Node::Alt(first, second) => {
                detach(first, hole, out);
                detach(second, hole, out);
            }
            Node::Repeat(spec) => {
                if let Some(spec) = Arc::get_mut(spec) {
                    detach(&mut spec.seed, hole, out);
                    detach(&mut spec.item, hole, out);
                    if let Some(until) = spec.until.as_mut() {
                        detach(until, hole, out);
                    }
                }
            }
            Node::Lazy(lazy) => {
                if let Some(node) = Arc::get_mut(lazy).and_then(|lazy| lazy.cell.take()) {
                    out.push(node);
                }
            }
            _ => {}
        }
    }
}

fn detach<I: Input>(slot: &mut NodeRef<I>, hole: &mut Option<NodeRef<I>>, out: &mut Vec<NodeRef<I>>) {
    if slot.is_leaf() || Arc::get_mut(slot).is_none() {
        return;
    }
    let hole = hole.get_or_insert_with(|| Arc::new(Node::End));
    out.push(std::mem::replace(slot, Arc::clone(hole)));
}

// Unlink iteratively: long `sequence`/`choice`/`string` chains nest one node
// per part and would otherwise drop recursively.
impl<I: Input> Drop for Node<I> {
    fn drop(&mut self) {
        let mut hole = None;
        let mut pending = Vec::new();
        self.detach_children(&mut hole, &mut pending);
        while let Some(child) = pending.pop() {
            if let Ok(mut node) = Arc::try_unwrap(child) {
                node.detach_children(&mut hole, &mut pending);
            }
        }
    }
}

/// A loop: run `seed` once for the initial accumulator, then run `item`
/// repeatedly, folding each value in with `step`.
///
/// With `until`, the terminator is tried before every item and ends the loop
/// when it matches; an item failure is then a failure of the whole loop.
pub(crate) struct Repeat<I: Input> {
    pub(crate) seed: NodeRef<I>,
    pub(crate) item: NodeRef<I>,
    pub(crate) until: Option<NodeRef<I>>,
    pub(crate) step: StepFn,
    pub(crate) min: usize,
    pub(crate) max: Option<usize>,
}

type BuildFn<I> = Box<dyn Fn() -> NodeRef<I> + Send + Sync>;

/// A node built the first time the engine reaches it.
pub(crate) struct LazyNode<I: Input> {
    cell: OnceLock<NodeRef<I>>,
    build: Option<BuildFn<I>>,
}

impl<I: Input> LazyNode<I> {
    pub(crate) fn deferred(build: BuildFn<I>) -> Self {
        Self {
            cell: OnceLock::new(),
            build: Some(build),
        }
    }

    /// A node whose definition is supplied later through [`LazyNode::bind`].
    pub(crate) fn unbound() -> Self {
        Self {
            cell: OnceLock::new(),
            build: None,
        }
    }

    pub(crate) fn bind(&self, node: NodeRef<I>) {
        let _ = self.cell.set(node);
    }

    pub(crate) fn force(&self) -> Option<NodeRef<I>> {
        if let Some(node) = self.cell.get() {
            return Some(Arc::clone(node));
        }
        let build = self.build.as_ref()?;
        Some(Arc::clone(self.cell.get_or_init(|| build())))
    }
}

pub(crate) fn erase<T: 'static>(value: T) -> Value {
    Box::new(value)
}

pub(crate) fn unerase<T: 'static>(value: Value) -> T {
    match value.downcast::<T>() {
        Ok(value) => *value,
        Err(_) => unreachable!("node produced a value of an unexpected type"),
    }
}

pub(crate) fn unerase_mut<T: 'static>(value: &mut Value) -> &mut T {
    match value.downcast_mut::<T>() {
        Some(value) => value,
        None => unreachable!("accumulator holds a value of an unexpected type"),
    }
}

/// Replaces an erased accumulator with `f` applied to it.
pub(crate) fn update<A: 'static>(acc: &mut Value, f: impl FnOnce(A) -> A) {
    let current = std::mem::replace(acc, erase(()));
    *acc = erase(f(unerase::<A>(current)));
}

pub(crate) fn pure_node<I: Input>(make: impl Fn() -> Value + Send + Sync + 'static) -> NodeRef<I> {
    Arc::new(Node::Pure(Arc::new(make)))
}
