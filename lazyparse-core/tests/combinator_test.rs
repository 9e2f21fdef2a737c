use lazyparse_core::{
    abort, any, digit, end, fail, look_ahead, not, pure, sequence, take, token, ErrorKind, Parser, TextStream,
};

fn text(input: &str) -> TextStream {
    TextStream::from_text(input)
}

fn digit_value() -> Parser<TextStream, i64> {
    digit().map(|c| c.to_digit(10).map_or(0, i64::from))
}

#[test]
fn test_fold_left_and_right() {
    let left = digit_value().fold_left(10, |acc, d| acc - d);
    assert_eq!(left.parse_text("12345").unwrap().value().unwrap(), -5);

    // 1 - (2 - (3 - (4 - (5 - 10))))
    let right = digit_value().fold_right(10, |d, acc| d - acc);
    assert_eq!(right.parse_text("12345").unwrap().value().unwrap(), -7);
}

#[test]
fn test_literal_mismatch_position() {
    let parser = sequence("abcd".chars().map(token::<TextStream>));
    let reply = parser.parse_text("abCDEF").unwrap();
    let position = reply.position();
    assert_eq!((position.line, position.column), (1, 3));

    let error = reply.value().unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Failure);
    assert_eq!(error.to_string(), "Failure (Line: 1, Column: 3): Unexpected 'C'");
}

#[test]
fn test_take_exactness() {
    let start = text("abc");

    let reply = take::<TextStream>(2).run(start.clone()).unwrap();
    assert_eq!(reply.as_value(), Some(&vec!['a', 'b']));
    assert_eq!(reply.position().column, 3);

    let reply = take::<TextStream>(0).run(start.clone()).unwrap();
    assert_eq!(reply.as_value(), Some(&Vec::new()));
    assert_eq!(reply.state(), &start);

    let reply = take::<TextStream>(4).run(start.clone()).unwrap();
    assert!(reply.is_failure());
    assert_eq!(start.current(), Some(&'a'));

    let rest = take::<TextStream>(4).or(&take(1)).run(start).unwrap();
    assert_eq!(rest.as_value(), Some(&vec!['a']));
}

#[test]
fn test_many_boundary() {
    let start = text("xyz");
    let reply = digit::<TextStream>().many().run(start.clone()).unwrap();
    assert_eq!(reply.as_value(), Some(&Vec::new()));
    assert_eq!(reply.state(), &start);

    let many1 = digit::<TextStream>().many1().run(start.clone()).unwrap();
    let single = digit::<TextStream>().run(start).unwrap();
    assert!(many1.is_failure());
    assert_eq!(many1.message(), single.message());
    assert_eq!(many1.position(), single.position());
}

#[test]
fn test_many_till_drops_terminator() {
    let parser = any::<TextStream>().many_till(&token(';')).collect_string();
    let reply = parser.parse_text("abc;def").unwrap();
    assert_eq!(reply.as_value().map(String::as_str), Some("abc"));
    assert_eq!(reply.position().column, 5);

    assert!(parser.parse_text("abc").unwrap().is_failure());
}

#[test]
fn test_abort_bypasses_alternation() {
    let parser = abort::<TextStream, i32>("x").or(&pure(1));
    let reply = parser.parse_text("anything").unwrap();
    assert!(reply.is_abort());
    assert_eq!(reply.message().as_deref(), Some("x"));
}

#[test]
fn test_alternative_resets_after_consumption() {
    let ab = token::<TextStream>('a').then(&token('b'));
    let ac = token('a').then(&token('c'));
    let reply = ab.or(&ac).parse_text("ac").unwrap();
    assert_eq!(reply.as_value(), Some(&'c'));
}

#[test]
fn test_both_alternatives_fail_reports_second() {
    let parser = token::<TextStream>('a').then(&token('b')).or(&token('x'));
    let reply = parser.parse_text("ac").unwrap();
    assert_eq!(reply.position().column, 1);
    assert_eq!(reply.message().as_deref(), Some("Unexpected 'a'"));
}

#[test]
fn test_look_ahead_and_not_consume_nothing() {
    let start = text("abc");

    let reply = look_ahead(&token::<TextStream>('a').then(&token('b'))).run(start.clone()).unwrap();
    assert_eq!(reply.as_value(), Some(&'b'));
    assert_eq!(reply.state(), &start);

    let reply = not(&token::<TextStream>('z')).run(start.clone()).unwrap();
    assert!(reply.is_success());
    assert_eq!(reply.state(), &start);

    let reply = not(&token::<TextStream>('a')).run(start).unwrap();
    assert!(reply.is_failure());
}

#[test]
fn test_end() {
    assert!(end::<TextStream>().parse_text("").unwrap().is_success());
    let reply = end::<TextStream>().parse_text("q").unwrap();
    assert_eq!(reply.message().as_deref(), Some("Unexpected 'q'"));
}

#[test]
fn test_failure_at_end_of_stream_message() {
    let reply = token::<TextStream>('a').parse_text("").unwrap();
    assert_eq!(reply.to_string(), "Failure (Line: 1, Column: 1): Unexpected '<EndOfStream>'");
}

#[test]
fn test_label_overrides_message() {
    let parser = digit::<TextStream>().label("expected a digit");
    let reply = parser.parse_text("a").unwrap();
    assert_eq!(reply.message().as_deref(), Some("expected a digit"));

    let untouched = fail::<TextStream, ()>().abort_on_failure().label("ignored");
    let reply = untouched.parse_text("a").unwrap();
    assert_eq!(reply.message().as_deref(), Some("Unexpected 'a'"));
}

#[test]
fn test_repetition_bounds() {
    let parser = digit::<TextStream>().repeat_range(2, 3).collect_string();
    assert!(parser.parse_text("1").unwrap().is_failure());
    assert_eq!(parser.parse_text("12").unwrap().value().unwrap(), "12");
    assert_eq!(parser.parse_text("12345").unwrap().value().unwrap(), "123");

    let parser = digit::<TextStream>().at_least(2);
    assert!(parser.parse_text("1x").unwrap().is_failure());
}

#[test]
fn test_zero_progress_item_stops_repetition() {
    let parser = pure::<TextStream, u8>(1).many();
    let reply = parser.parse_text("abc").unwrap();
    assert_eq!(reply.as_value(), Some(&vec![1]));

    let guarded = pure::<TextStream, u8>(1).require_progress().many();
    assert_eq!(guarded.parse_text("abc").unwrap().as_value(), Some(&Vec::new()));
}
