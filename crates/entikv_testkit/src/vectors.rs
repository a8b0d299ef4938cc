//! Known-answer vectors for the cipher codec.
//!
//! Tokens were produced independently with OpenSSL
//! (`openssl enc -aes-256-cbc -K <key> -iv <iv> -base64 -A`), so they pin
//! the wire format other clients of the same store must agree on.

/// Hex key shared by most vectors.
pub const VECTOR_KEY_HEX: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

/// Hex IV shared by most vectors.
pub const VECTOR_IV_HEX: &str = "f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff";

/// One plaintext/token pair.
#[derive(Debug, Clone, Copy)]
pub struct CipherVector {
    /// Unique identifier for this vector.
    pub id: &'static str,
    /// Key material as accepted by `CipherSecret::parse`.
    pub key: &'static str,
    /// IV material as accepted by `CipherSecret::parse`.
    pub iv: &'static str,
    /// JSON text that is encrypted.
    pub plaintext: &'static str,
    /// Expected base64 token.
    pub token: &'static str,
}

/// Tokens that must decode to the given plaintext, and encode back.
pub fn cipher_vectors() -> Vec<CipherVector> {
    vec![
        CipherVector {
            id: "customer_c1",
            key: VECTOR_KEY_HEX,
            iv: VECTOR_IV_HEX,
            plaintext: r#"{"id":"c1","stripeCustomerId":"s1"}"#,
            token: "pt3SnRUySXAjOnwjxJdmUAf4JRE62H5xkMk7kv/jT9nndYKUz5vdf3jYzdIF2Cfj",
        },
        CipherVector {
            id: "customer_with_email",
            key: VECTOR_KEY_HEX,
            iv: VECTOR_IV_HEX,
            plaintext: r#"{"id":"c2","stripeCustomerId":"s2","email":"ada@example.com"}"#,
            token: "iIL0NS9klJWToRL6c3utWmEbyKga1zWAHMZtw5yWbllrhVyerIACDTAEAUc4FDAFcu4AtIhbBFgPWFGIx+BTmw==",
        },
        CipherVector {
            id: "empty_object",
            key: VECTOR_KEY_HEX,
            iv: VECTOR_IV_HEX,
            plaintext: "{}",
            token: "L5k6EHreCTpNxC95m9hKJA==",
        },
        CipherVector {
            id: "bare_string",
            key: VECTOR_KEY_HEX,
            iv: VECTOR_IV_HEX,
            plaintext: r#""hello""#,
            token: "zPa3Bo5HbyFum0242VkleQ==",
        },
        CipherVector {
            id: "raw_text_key",
            key: "an example very very secret key.",
            iv: "sixteen byte iv!",
            plaintext: r#"{"id":"c1"}"#,
            token: "W6Wej4GtK81kqXfm00u3BA==",
        },
    ]
}

/// Tokens that must fail to decode under [`VECTOR_KEY_HEX`] and
/// [`VECTOR_IV_HEX`], with the reason.
pub fn invalid_tokens() -> Vec<(&'static str, &'static str)> {
    vec![
        ("not base64", "%%%not-base64%%%"),
        ("truncated block", "pt3SnRUySXAjOnwjxJdm"),
        (
            "last byte flipped",
            "pt3SnRUySXAjOnwjxJdmUAf4JRE62H5xkMk7kv/jT9nndYKUz5vdf3jYzdIF2Cfi",
        ),
        ("other key", "W6Wej4GtK81kqXfm00u3BA=="),
        ("plain json", r#"{"id":"c1"}"#),
    ]
}
