use chrono::NaiveDate;
use playlist_porter::error::ClientError;
use playlist_porter::utils::*;
use proptest::prelude::*;

#[test]
fn test_generate_code_verifier() {
    let verifier = generate_code_verifier();

    assert_eq!(verifier.len(), CODE_VERIFIER_LEN);

    // URL-safe base64 alphabet only
    assert!(
        verifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    );

    let verifier2 = generate_code_verifier();
    assert_ne!(verifier, verifier2);
}

#[test]
fn test_generate_code_challenge() {
    let verifier = "test_verifier_123";
    let challenge = generate_code_challenge(verifier);

    // SHA-256 is 32 bytes, 43 characters unpadded
    assert_eq!(challenge.len(), 43);

    // Should be deterministic - same input produces same output
    assert_eq!(challenge, generate_code_challenge(verifier));
    assert_ne!(challenge, generate_code_challenge("different_verifier"));

    assert!(!challenge.contains('='));
    assert!(
        challenge
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    );
}

#[test]
fn test_code_challenge_known_vector() {
    // RFC 7636, appendix B
    let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    assert_eq!(
        generate_code_challenge(verifier),
        "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
    );
}

#[test]
fn test_generate_state() {
    let state = generate_state();
    assert_eq!(state.len(), 32);
    assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_ne!(state, generate_state());
}

#[test]
fn test_release_precision_tags() {
    assert_eq!("year".parse::<ReleasePrecision>().unwrap(), ReleasePrecision::Year);
    assert_eq!("month".parse::<ReleasePrecision>().unwrap(), ReleasePrecision::Month);
    assert_eq!("day".parse::<ReleasePrecision>().unwrap(), ReleasePrecision::Day);

    let err = "week".parse::<ReleasePrecision>().unwrap_err();
    assert!(matches!(err, ClientError::Mapping(_)));
}

#[test]
fn test_parse_release_date_pads_to_period_start() {
    assert_eq!(
        parse_release_date("1977", ReleasePrecision::Year).unwrap(),
        NaiveDate::from_ymd_opt(1977, 1, 1).unwrap()
    );
    assert_eq!(
        parse_release_date("1983-03", ReleasePrecision::Month).unwrap(),
        NaiveDate::from_ymd_opt(1983, 3, 1).unwrap()
    );
    assert_eq!(
        parse_release_date("1996-02-12", ReleasePrecision::Day).unwrap(),
        NaiveDate::from_ymd_opt(1996, 2, 12).unwrap()
    );
}

#[test]
fn test_parse_release_date_rejects_mismatched_shape() {
    // a full date tagged as year precision does not parse
    assert!(parse_release_date("1977-10-14", ReleasePrecision::Year).is_err());
    assert!(parse_release_date("1977", ReleasePrecision::Day).is_err());
    assert!(parse_release_date("2023-02-30", ReleasePrecision::Day).is_err());
    assert!(parse_release_date("", ReleasePrecision::Month).is_err());
}

#[test]
fn test_release_date_error_names_precision() {
    let err = parse_release_date("1977-10", ReleasePrecision::Year).unwrap_err();
    assert!(matches!(err, ClientError::Mapping(_)));
    assert!(err.to_string().contains("year precision"));

    for precision in [ReleasePrecision::Year, ReleasePrecision::Month, ReleasePrecision::Day] {
        assert_eq!(precision.as_str().parse::<ReleasePrecision>().unwrap(), precision);
    }
}

proptest! {
    #[test]
    fn prop_day_precision_round_trips(days in 0i64..60_000) {
        let date = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap() + chrono::Duration::days(days);
        let text = date.format("%Y-%m-%d").to_string();
        prop_assert_eq!(parse_release_date(&text, ReleasePrecision::Day).unwrap(), date);
    }

    #[test]
    fn prop_verifier_challenge_pair_is_well_formed(_seed in 0u8..16) {
        let verifier = generate_code_verifier();
        prop_assert_eq!(verifier.len(), CODE_VERIFIER_LEN);
        prop_assert_eq!(generate_code_challenge(&verifier).len(), 43);
    }
}
