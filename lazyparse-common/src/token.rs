use std::fmt;

/// A value that can flow through a stream as a single token.
///
/// `describe` is what failure messages show between the quotes of
/// `Unexpected '...'`.
pub trait Token: Clone + fmt::Debug + 'static {
    fn describe(&self) -> String {
        format!("{self:?}")
    }
}

impl Token for char {
    fn describe(&self) -> String {
        self.escape_debug().to_string()
    }
}

impl Token for u8 {
    fn describe(&self) -> String {
        if self.is_ascii_graphic() || *self == b' ' {
            char::from(*self).to_string()
        } else {
            format!("0x{self:02X}")
        }
    }
}

impl Token for String {
    fn describe(&self) -> String {
        self.clone()
    }
}

impl Token for &'static str {
    fn describe(&self) -> String {
        (*self).to_string()
    }
}

macro_rules! display_tokens {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Token for $ty {
                fn describe(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

display_tokens!(bool, i8, i16, i32, i64, i128, isize, u16, u32, u64, u128, usize, f32, f64);
