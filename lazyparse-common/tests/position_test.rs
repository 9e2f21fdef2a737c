use lazyparse_common::{LinearPosition, Position, TextPosition};

#[test]
fn test_position_equality() {
    let pos1 = TextPosition::new();
    let pos2 = TextPosition::new();
    assert_eq!(pos1, pos2);

    let pos3 = TextPosition {
        line: 2,
        column: 3,
        offset: 10,
    };
    assert_ne!(pos1, pos3);
}

#[test]
fn test_position_copy() {
    let pos1 = TextPosition::at(2, 3, 10);
    let pos2 = pos1;
    assert_eq!(pos1, pos2);
}

#[test]
fn test_text_position_walk() {
    let text = "ab\ncd\n\ne";
    let mut pos = <TextPosition as Position<char>>::start();
    for ch in text.chars() {
        pos = pos.advance(&ch);
    }
    assert_eq!(pos.line, 4);
    assert_eq!(pos.column, 2);
    assert_eq!(pos.offset, text.len());
}

#[test]
fn test_linear_position_ignores_token_kind() {
    let start = <LinearPosition as Position<&str>>::start();
    let next = start.advance(&"\n");
    assert_eq!(next.index(), 1);
}
