//! Shared helpers for command handlers.

use std::io::{BufRead, IsTerminal};

use taskboard_core::{ApiResponse, CoreError, SubmitOutcome};

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}

/// Prompt for a line of text.
pub fn prompt(label: &str) -> Result<String, CliError> {
    dialoguer::Input::<String>::new()
        .with_prompt(label)
        .interact_text()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}

/// Read a password from the terminal, or the first stdin line with `from_stdin`.
pub fn read_password(label: &str, from_stdin: bool) -> Result<String, CliError> {
    if from_stdin {
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        return Ok(line.trim_end_matches(['\r', '\n']).to_owned());
    }
    Ok(rpassword::prompt_password(format!("{label}: "))?)
}

/// Turn a submit outcome into the response, or the error to report.
///
/// Abort and cancellation yield `Ok(None)`. Validation failures list the
/// per-field messages; everything else goes through the core error mapping.
pub fn into_response(outcome: SubmitOutcome) -> Result<Option<ApiResponse>, CliError> {
    match outcome {
        SubmitOutcome::Succeeded(response) => Ok(Some(response)),
        SubmitOutcome::Aborted | SubmitOutcome::Cancelled => Ok(None),
        SubmitOutcome::Failed { errors, error } => {
            if error.is_validation() && !errors.is_empty() {
                Err(CliError::rejected(&errors))
            } else {
                Err(CoreError::from(error).into())
            }
        }
    }
}
