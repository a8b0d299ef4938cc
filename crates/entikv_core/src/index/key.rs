//! Key segment rendering.

/// A value that can appear in a storage key.
///
/// Primary keys and indexed field values are rendered to text and spliced
/// into keys (`<prefix><id>`, `<prefix>idx_<field>:<value>`). Two values
/// that render the same share a key.
pub trait KeyPart: Sync {
    /// Renders the value as a key segment.
    fn to_key_part(&self) -> String;
}

impl KeyPart for str {
    fn to_key_part(&self) -> String {
        self.to_owned()
    }
}

impl KeyPart for String {
    fn to_key_part(&self) -> String {
        self.clone()
    }
}

impl KeyPart for bool {
    fn to_key_part(&self) -> String {
        self.to_string()
    }
}

impl KeyPart for char {
    fn to_key_part(&self) -> String {
        self.to_string()
    }
}

impl<T: KeyPart + ?Sized> KeyPart for &T {
    fn to_key_part(&self) -> String {
        (**self).to_key_part()
    }
}

macro_rules! integer_key_part {
    ($($ty:ty),*) => {
        $(
            impl KeyPart for $ty {
                fn to_key_part(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

integer_key_part!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_render_verbatim() {
        assert_eq!("c1".to_key_part(), "c1");
        assert_eq!(String::from("cus_123").to_key_part(), "cus_123");
        assert_eq!((&"nested").to_key_part(), "nested");
    }

    #[test]
    fn integers_render_as_decimal() {
        assert_eq!(42i64.to_key_part(), "42");
        assert_eq!((-7i32).to_key_part(), "-7");
        assert_eq!(u64::MAX.to_key_part(), "18446744073709551615");
    }

    #[test]
    fn integer_and_string_share_a_key() {
        assert_eq!(5u32.to_key_part(), "5".to_key_part());
    }

    #[test]
    fn bools_render_as_words() {
        assert_eq!(true.to_key_part(), "true");
    }
}
