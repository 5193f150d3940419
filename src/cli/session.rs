//! Interactive input and session setup shared by the export commands

use std::io::{self, BufRead, Write};

use crate::api::HttpOpenSpecimenClient;
use crate::config::Settings;
use crate::error::{ExportError, ExportResult};

/// Validate a collection protocol id
pub fn parse_cp_id(input: &str) -> ExportResult<String> {
    let cp_id = input.trim();
    if cp_id.is_empty() {
        return Err(ExportError::Validation(
            "Collection Protocol ID must not be empty".into(),
        ));
    }
    if !cp_id.chars().all(|c| c.is_ascii_digit()) {
        return Err(ExportError::Validation(format!(
            "Invalid Collection Protocol ID: '{}'",
            cp_id
        )));
    }
    Ok(cp_id.to_string())
}

/// Ask for a collection protocol id on `output`, reading the answer from `input`
pub fn prompt_cp_id<R: BufRead, W: Write>(mut input: R, mut output: W) -> ExportResult<String> {
    write!(output, "Enter Collection Protocol ID: ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    parse_cp_id(&line)
}

/// Use the id given on the command line, or prompt for one
pub fn resolve_cp_id(arg: Option<&str>) -> ExportResult<String> {
    match arg {
        Some(cp_id) => parse_cp_id(cp_id),
        None => prompt_cp_id(io::stdin().lock(), io::stdout()),
    }
}

/// Password from settings/environment, or prompted with hidden input
pub fn resolve_password(settings: &Settings) -> ExportResult<String> {
    if let Some(password) = settings.password.as_ref().filter(|p| !p.is_empty()) {
        return Ok(password.clone());
    }
    rpassword::prompt_password(format!("Password for {}: ", settings.login_name))
        .map_err(|e| ExportError::Io(format!("Failed to read password: {}", e)))
}

/// Validate settings and open an authenticated session
pub fn open_session(settings: &Settings) -> ExportResult<HttpOpenSpecimenClient> {
    settings.validate()?;
    let password = resolve_password(settings)?;
    HttpOpenSpecimenClient::login(settings, &password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cp_id() {
        assert_eq!(parse_cp_id(" 42 \n").unwrap(), "42");
        assert!(parse_cp_id("").is_err());
        assert!(parse_cp_id("4a").is_err());
        assert!(parse_cp_id("-1").is_err());
    }

    #[test]
    fn test_prompt_cp_id() {
        let mut output = Vec::new();
        let cp_id = prompt_cp_id("17\n".as_bytes(), &mut output).unwrap();

        assert_eq!(cp_id, "17");
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Enter Collection Protocol ID: "
        );
    }

    #[test]
    fn test_prompt_cp_id_eof() {
        let err = prompt_cp_id("".as_bytes(), Vec::new()).unwrap_err();
        assert!(matches!(err, ExportError::Validation(_)));
    }

    #[test]
    fn test_resolve_password_from_settings() {
        let mut settings = Settings::default();
        settings.password = Some("pw".into());
        assert_eq!(resolve_password(&settings).unwrap(), "pw");
    }
}
