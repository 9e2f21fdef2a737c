//! The iterative interpreter.
//!
//! `run` walks the node graph with an explicit continuation stack instead of
//! host recursion. A node that needs "run this, then continue" pushes a frame
//! and hands its child back to the loop; a finished reply pops the next frame.
//! Host stack depth stays constant whatever the input length or the depth of
//! the composition. `Bind` pops its frame before evaluating the continuation's
//! parser, so right-nested chains run in constant frame space too, and
//! repetition keeps a single frame per active loop.

use crate::node::{
    erase, BindFn, HookFn, MapFn, Node, NodeRef, Repeat, Value, ZipFn,
};
use crate::reply::{Fault, Reply};
use lazyparse_stream::{Input, StreamError};
use std::sync::Arc;

const UNBOUND_MESSAGE: &str = "recursive parser used before its definition was bound";
const DANGLING_MESSAGE: &str = "recursive parser used after its definition was dropped";
const NO_PROGRESS_MESSAGE: &str = "repetition item succeeded without consuming input";

enum Frame<I: Input> {
    Map {
        f: MapFn,
        start: I,
    },
    Bind {
        f: BindFn<I>,
        start: I,
    },
    ZipFirst {
        second: NodeRef<I>,
        combine: ZipFn,
    },
    ZipSecond {
        first: Value,
        combine: ZipFn,
    },
    Alt {
        second: NodeRef<I>,
        start: I,
    },
    Modify {
        hook: HookFn<I>,
        start: I,
    },
    Seed {
        spec: Arc<Repeat<I>>,
    },
    Until {
        spec: Arc<Repeat<I>>,
        acc: Value,
        count: usize,
        before: I,
    },
    Item {
        spec: Arc<Repeat<I>>,
        acc: Value,
        count: usize,
        before: I,
    },
}

enum Step<I: Input> {
    Eval(NodeRef<I>, I),
    Return(Reply<Value, I>),
}

/// Runs `root` against `input` to a terminal reply.
///
/// Only a failing read of the underlying source escapes as an `Err`.
pub(crate) fn run<I: Input>(root: &NodeRef<I>, input: I) -> Result<Reply<Value, I>, StreamError> {
    let mut stack: Vec<Frame<I>> = Vec::new();
    let mut step = Step::Eval(Arc::clone(root), input);
    let mut steps: u64 = 0;

    loop {
        steps += 1;
        step = match step {
            Step::Eval(node, state) => eval(&node, state, &mut stack)?,
            Step::Return(reply) => match stack.pop() {
                Some(frame) => resume(frame, reply, &mut stack),
                None => {
                    log::trace!("engine finished after {steps} steps");
                    return Ok(reply);
                }
            },
        };
    }
}

fn eval<I: Input>(node: &Node<I>, state: I, stack: &mut Vec<Frame<I>>) -> Result<Step<I>, StreamError> {
    let step = match node {
        Node::Pure(make) => Step::Return(Reply::success(make(), state)),
        Node::Peek(read) => {
            let value = read(&state);
            Step::Return(Reply::success(value, state))
        }
        Node::Satisfy(test) => {
            let matched = state.current().filter(|token| test(token)).cloned();
            match matched {
                Some(token) => {
                    let next = state.advance()?;
                    Step::Return(Reply::success(erase(token), next))
                }
                None => Step::Return(Reply::failure(Fault::unexpected(state))),
            }
        }
        Node::End => {
            if state.has_value() {
                Step::Return(Reply::failure(Fault::unexpected(state)))
            } else {
                Step::Return(Reply::success(erase(()), state))
            }
        }
        Node::Fail(message) => {
            let fault = match message {
                Some(message) => Fault::new(message.clone(), state),
                None => Fault::unexpected(state),
            };
            Step::Return(Reply::failure(fault))
        }
        Node::Abort(message) => Step::Return(Reply::abort(Fault::new(message.clone(), state))),
        Node::Map(inner, f) => {
            stack.push(Frame::Map {
                f: Arc::clone(f),
                start: state.clone(),
            });
            Step::Eval(Arc::clone(inner), state)
        }
        Node::Bind(inner, f) => {
            stack.push(Frame::Bind {
                f: Arc::clone(f),
                start: state.clone(),
            });
            Step::Eval(Arc::clone(inner), state)
        }
        Node::Zip(first, second, combine) => {
            stack.push(Frame::ZipFirst {
                second: Arc::clone(second),
                combine: Arc::clone(combine),
            });
            Step::Eval(Arc::clone(first), state)
        }
        Node::Alt(first, second) => {
            stack.push(Frame::Alt {
                second: Arc::clone(second),
                start: state.clone(),
            });
            Step::Eval(Arc::clone(first), state)
        }
        Node::Modify(inner, hook) => {
            stack.push(Frame::Modify {
                hook: Arc::clone(hook),
                start: state.clone(),
            });
            Step::Eval(Arc::clone(inner), state)
        }
        Node::Repeat(spec) => {
            stack.push(Frame::Seed {
                spec: Arc::clone(spec),
            });
            Step::Eval(Arc::clone(&spec.seed), state)
        }
        Node::Lazy(lazy) => match lazy.force() {
            Some(node) => Step::Eval(node, state),
            None => Step::Return(Reply::abort(Fault::new(UNBOUND_MESSAGE, state))),
        },
        Node::Recur(weak) => match weak.upgrade().and_then(|lazy| lazy.force()) {
            Some(node) => Step::Eval(node, state),
            None => {
                log::warn!("{DANGLING_MESSAGE} at {}", state.position());
                Step::Return(Reply::abort(Fault::new(DANGLING_MESSAGE, state)))
            }
        },
    };
    Ok(step)
}

fn resume<I: Input>(frame: Frame<I>, reply: Reply<Value, I>, stack: &mut Vec<Frame<I>>) -> Step<I> {
    match frame {
        Frame::Map { f, start } => match reply {
            Reply::Success { value, state } => match f(value) {
                Ok(value) => Step::Return(Reply::success(value, state)),
                Err(cause) => Step::Return(Reply::failure(Fault::caused_by(cause, start))),
            },
            other => Step::Return(other),
        },
        Frame::Bind { f, start } => match reply {
            Reply::Success { value, state } => match f(value) {
                Ok(next) => Step::Eval(next, state),
                Err(cause) => Step::Return(Reply::failure(Fault::caused_by(cause, start))),
            },
            other => Step::Return(other),
        },
        Frame::ZipFirst { second, combine } => match reply {
            Reply::Success { value, state } => {
                stack.push(Frame::ZipSecond {
                    first: value,
                    combine,
                });
                Step::Eval(second, state)
            }
            other => Step::Return(other),
        },
        Frame::ZipSecond { first, combine } => {
            Step::Return(reply.map(|second| combine(first, second)))
        }
        Frame::Alt { second, start } => match reply {
            Reply::Failure(_) => Step::Eval(second, start),
            other => Step::Return(other),
        },
        Frame::Modify { hook, start } => Step::Return(hook(&start, reply)),
        Frame::Seed { spec } => match reply {
            Reply::Success { value, state } => next_iteration(spec, value, 0, state, stack),
            other => Step::Return(other),
        },
        Frame::Until {
            spec,
            acc,
            count,
            before,
        } => match reply {
            Reply::Success { state, .. } => Step::Return(Reply::success(acc, state)),
            Reply::Failure(_) => {
                let item = Arc::clone(&spec.item);
                stack.push(Frame::Item {
                    spec,
                    acc,
                    count,
                    before: before.clone(),
                });
                Step::Eval(item, before)
            }
            abort => Step::Return(abort),
        },
        Frame::Item {
            spec,
            mut acc,
            count,
            before,
        } => match reply {
            Reply::Success { value, state } => {
                (spec.step)(&mut acc, value);
                let count = count + 1;
                if state == before && spec.max.is_none() && count >= spec.min {
                    if spec.until.is_some() {
                        return Step::Return(Reply::failure(Fault::new(NO_PROGRESS_MESSAGE, state)));
                    }
                    log::debug!("repetition stopped at {}: item consumed nothing", state.position());
                    return Step::Return(Reply::success(acc, state));
                }
                next_iteration(spec, acc, count, state, stack)
            }
            Reply::Failure(fault) => {
                if spec.until.is_some() || count < spec.min {
                    Step::Return(Reply::failure(fault))
                } else {
                    Step::Return(Reply::success(acc, before))
                }
            }
            abort => Step::Return(abort),
        },
    }
}

fn next_iteration<I: Input>(
    spec: Arc<Repeat<I>>,
    acc: Value,
    count: usize,
    state: I,
    stack: &mut Vec<Frame<I>>,
) -> Step<I> {
    if spec.max.is_some_and(|max| count >= max) {
        return Step::Return(Reply::success(acc, state));
    }
    let (next, frame) = match &spec.until {
        Some(until) => (
            Arc::clone(until),
            Frame::Until {
                spec: Arc::clone(&spec),
                acc,
                count,
                before: state.clone(),
            },
        ),
        None => (
            Arc::clone(&spec.item),
            Frame::Item {
                spec: Arc::clone(&spec),
                acc,
                count,
                before: state.clone(),
            },
        ),
    };
    stack.push(frame);
    Step::Eval(next, state)
}
