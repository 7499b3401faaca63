//! `seal` command.

use std::io::Read;

use zeroize::Zeroizing;

use crate::core::cipher::{self, RecipientKey};
use crate::error::{Result, ValidationError};

/// Seal a value against a base64 public key and print the sealed value.
///
/// The value comes from `value_env` when given, otherwise from stdin with
/// one trailing newline removed.
pub fn execute(key: &str, value_env: Option<&str>) -> Result<()> {
    let recipient = RecipientKey::from_base64(String::new(), key.trim())?;
    let value = read_value(value_env)?;
    if value.is_empty() {
        return Err(ValidationError::MissingField("value").into());
    }

    let sealed = cipher::seal(value.as_bytes(), recipient.as_bytes())?;
    println!("{}", sealed);
    Ok(())
}

fn read_value(value_env: Option<&str>) -> Result<Zeroizing<String>> {
    if let Some(var) = value_env {
        return std::env::var(var)
            .map(Zeroizing::new)
            .map_err(|_| {
                ValidationError::InvalidField {
                    field: "value-env",
                    reason: format!("{} is not set", var),
                }
                .into()
            });
    }

    let mut value = Zeroizing::new(String::new());
    std::io::stdin().read_to_string(&mut value)?;
    if value.ends_with('\n') {
        value.pop();
        if value.ends_with('\r') {
            value.pop();
        }
    }
    Ok(value)
}
