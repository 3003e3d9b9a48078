use bitspan::{parse, Dtype, Error, Token, TokenLength};
use rstest::rstest;

fn single(format: &str) -> Token {
    let tokens = parse(format).unwrap();
    assert_eq!(1, tokens.len(), "expected one token from {format:?}");
    tokens.into_iter().next().unwrap()
}

#[rstest]
#[case("uint:12", Dtype::Uint, Some(12))]
#[case("int:3", Dtype::Int, Some(3))]
#[case("uintle:16", Dtype::UintLe, Some(16))]
#[case("floatbe:32", Dtype::FloatBe, Some(32))]
#[case("bfloat", Dtype::Bfloat, None)]
#[case("hex:8", Dtype::Hex, Some(8))]
#[case("bytes:3", Dtype::Bytes, Some(3))]
#[case("bool", Dtype::Bool, None)]
#[case("ue", Dtype::Ue, None)]
#[case("pad:5", Dtype::Pad, Some(5))]
#[case(" bin : 6 ", Dtype::Bin, Some(6))]
fn typed_tokens_parse(#[case] format: &str, #[case] dtype: Dtype, #[case] units: Option<u64>) {
    let token = single(format);
    assert_eq!(dtype, token.dtype);
    match units {
        Some(u) => assert_eq!(Some(TokenLength::Units(u)), token.length),
        None => assert_eq!(None, token.length),
    }
}

#[test]
fn empty_name_defaults_to_uint() {
    let token = single(":12=100");
    assert_eq!(Dtype::Uint, token.dtype);
    assert_eq!(Some(TokenLength::Units(12)), token.length);
    assert_eq!(Some("100".to_string()), token.value);
}

#[test]
fn literal_lengths_come_from_their_digits() {
    assert_eq!(Some(TokenLength::Units(8)), single("0xff").length);
    assert_eq!(Some(TokenLength::Units(6)), single("0o65").length);
    assert_eq!(Some(TokenLength::Units(3)), single("0b101").length);
    assert_eq!(Dtype::Oct, single("0o65").dtype);
}

#[test]
fn keyword_lengths_stay_symbolic() {
    let token = single("uint:width");
    assert_eq!(Some(TokenLength::Keyword("width".to_string())), token.length);
}

#[test]
fn factors_and_groups_expand() {
    assert_eq!(3, parse("3*uint:8").unwrap().len());
    let tokens = parse("2*(uint:8, 0b1)").unwrap();
    assert_eq!(4, tokens.len());
    assert_eq!(Dtype::Uint, tokens[0].dtype);
    assert_eq!(Dtype::Bin, tokens[1].dtype);
    assert_eq!(Dtype::Uint, tokens[2].dtype);
    // zero repetitions vanish
    assert!(parse("0*uint:8").unwrap().is_empty());
}

#[test]
fn struct_codes_expand_with_counts() {
    let tokens = parse("<4h").unwrap();
    assert_eq!(4, tokens.len());
    for token in &tokens {
        assert_eq!(Dtype::IntLe, token.dtype);
        assert_eq!(Some(TokenLength::Units(16)), token.length);
    }
    let tokens = parse(">2Hd").unwrap();
    assert_eq!(3, tokens.len());
    assert_eq!(Dtype::UintBe, tokens[0].dtype);
    assert_eq!(Dtype::FloatBe, tokens[2].dtype);
    assert_eq!(Some(TokenLength::Units(64)), tokens[2].length);

    let native = parse("@l").unwrap();
    assert_eq!(Dtype::IntNe, native[0].dtype);
}

#[rstest]
#[case("wibble:8")]
#[case("uint:")]
#[case("uint:8:9")]
#[case("2*(uint:8")]
#[case("uint:8)")]
#[case("ue:4")]
#[case("pad")]
#[case("float")]
#[case("<4x")]
#[case("<4")]
#[case("bin, hex")]
#[case("bin, ue")]
#[case(",")]
#[case("3*")]
fn bad_formats_are_syntax_errors(#[case] format: &str) {
    assert!(matches!(parse(format), Err(Error::Syntax(_))), "{format:?}");
}

#[test]
fn one_stretchy_token_is_allowed() {
    let tokens = parse("uint:8, bin").unwrap();
    assert_eq!(2, tokens.len());
    assert!(tokens[1].length.is_none());
}

#[test]
fn whitespace_and_empty_formats() {
    assert!(parse("").unwrap().is_empty());
    assert!(parse("   ").unwrap().is_empty());
    let tokens = parse("uint:8 , uint:4").unwrap();
    assert_eq!(2, tokens.len());
}

#[test]
fn dtype_names_roundtrip_through_strum() {
    assert_eq!("uintle", Dtype::UintLe.to_string());
    assert_eq!("bfloatne", Dtype::BfloatNe.to_string());
    assert_eq!(Ok(Dtype::Sie), "sie".parse());
}
