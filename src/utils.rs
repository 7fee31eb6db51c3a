use std::str::FromStr;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::NaiveDate;
use rand::{Rng, RngCore, distr::Alphanumeric};
use sha2::{Digest, Sha256};

use crate::error::ClientError;

/// Length of the PKCE code verifier sent to the token endpoint.
pub const CODE_VERIFIER_LEN: usize = 64;

pub fn generate_code_verifier() -> String {
    let mut bytes = [0u8; 100];
    rand::rng().fill_bytes(&mut bytes);

    let mut verifier = URL_SAFE_NO_PAD.encode(bytes);
    verifier.truncate(CODE_VERIFIER_LEN);
    verifier
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Random value for the OAuth `state` parameter.
pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// How much of a release date the platform actually knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleasePrecision {
    Year,
    Month,
    Day,
}

impl ReleasePrecision {
    /// Tag used by the platform for this precision.
    pub fn as_str(self) -> &'static str {
        match self {
            ReleasePrecision::Year => "year",
            ReleasePrecision::Month => "month",
            ReleasePrecision::Day => "day",
        }
    }
}

impl FromStr for ReleasePrecision {
    type Err = ClientError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "year" => Ok(ReleasePrecision::Year),
            "month" => Ok(ReleasePrecision::Month),
            "day" => Ok(ReleasePrecision::Day),
            other => Err(ClientError::Mapping(format!(
                "unknown release date precision '{other}'"
            ))),
        }
    }
}

/// Parses a release date string according to its precision tag.
///
/// Year and month precision resolve to the first day of the period, e.g.
/// `"1977"` / `year` becomes 1977-01-01.
pub fn parse_release_date(date: &str, precision: ReleasePrecision) -> Result<NaiveDate, ClientError> {
    // chrono needs a full date, so pad the missing components before parsing
    let padded = match precision {
        ReleasePrecision::Year => format!("{date}-01-01"),
        ReleasePrecision::Month => format!("{date}-01"),
        ReleasePrecision::Day => date.to_string(),
    };

    NaiveDate::parse_from_str(&padded, "%Y-%m-%d").map_err(|e| {
        ClientError::Mapping(format!(
            "release date '{date}' is not a valid {} precision date: {e}",
            precision.as_str()
        ))
    })
}
