//! # Credential Generation
//!
//! Random principal names, passwords, and access-key material. Uniqueness
//! is probabilistic only; a collision surfaces as a create-principal
//! failure on the backend rather than being checked up front.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::{Rng, RngCore};
use regex::Regex;
use std::sync::LazyLock;

use crate::constants::{PASSWORD_LEN, PRINCIPAL_SUFFIX_LEN, SECRET_ACCESS_KEY_LEN};

static SPECIAL_CHARACTERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^a-zA-Z0-9]+").expect("static pattern"));

/// Random alphanumeric string of the given length.
pub fn random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Strip everything outside `[a-zA-Z0-9]`.
pub fn remove_special_characters(input: &str) -> String {
    SPECIAL_CHARACTERS.replace_all(input, "").into_owned()
}

/// Backend principal name derived from a resource name: sanitized,
/// lower-cased, with a random suffix to dodge collisions across resources
/// that share a base name.
pub fn principal_name(base: &str) -> String {
    let suffixed = format!("{base}{}", random_string(PRINCIPAL_SUFFIX_LEN));
    remove_special_characters(&suffixed).to_lowercase()
}

/// Generated password for relational principals.
pub fn password() -> String {
    random_string(PASSWORD_LEN)
}

/// Object-store secret key: 40 cryptographically random bytes, URL-safe
/// base64 encoded.
pub fn secret_access_key() -> String {
    let mut bytes = [0u8; SECRET_ACCESS_KEY_LEN];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE.encode(bytes)
}
