//! Interactive prompt grammar for `blelink connect`

use crate::error::{CliError, Result};

/// One line typed at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptCommand {
    /// Send the rest of the line as UTF-8
    Send(Vec<u8>),
    /// Send hex-decoded bytes
    Hex(Vec<u8>),
    Reconnect,
    Disconnect,
    State,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  send <text>     write text to the output characteristic
  hex <bytes>     write hex bytes (spaces allowed), e.g. hex 01 ff 7e
  reconnect       reconnect with the current session
  disconnect      cancel the connection
  state           print the connection state
  help            show this help
  quit            disconnect and exit";

/// Parse a prompt line; blank lines yield `None`
pub fn parse_line(line: &str) -> Result<Option<PromptCommand>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "send" | "s" => {
            if rest.is_empty() {
                return Err(CliError::InvalidInput("send needs a message".to_string()));
            }
            PromptCommand::Send(rest.as_bytes().to_vec())
        }
        "hex" | "x" => {
            let digits: String = rest.split_whitespace().collect();
            if digits.is_empty() {
                return Err(CliError::InvalidInput("hex needs bytes".to_string()));
            }
            PromptCommand::Hex(hex::decode(digits)?)
        }
        "reconnect" | "r" => PromptCommand::Reconnect,
        "disconnect" | "d" => PromptCommand::Disconnect,
        "state" => PromptCommand::State,
        "help" | "?" => PromptCommand::Help,
        "quit" | "exit" | "q" => PromptCommand::Quit,
        other => {
            return Err(CliError::InvalidInput(format!(
                "unknown command '{}', try 'help'",
                other
            )))
        }
    };
    Ok(Some(command))
}

/// Render an inbound message: hex, plus the text when it is printable UTF-8
pub fn format_message(message: &[u8]) -> String {
    match std::str::from_utf8(message) {
        Ok(text) if !text.is_empty() && !text.chars().any(char::is_control) => {
            format!("{} \"{}\"", hex::encode(message), text)
        }
        _ => hex::encode(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_keeps_inner_whitespace() {
        assert_eq!(
            parse_line("send hello  world ").unwrap(),
            Some(PromptCommand::Send(b"hello  world".to_vec()))
        );
    }

    #[test]
    fn test_hex_accepts_spaced_bytes() {
        assert_eq!(
            parse_line("hex 01 ff 7E").unwrap(),
            Some(PromptCommand::Hex(vec![0x01, 0xFF, 0x7E]))
        );
        assert!(parse_line("hex 0").is_err());
        assert!(parse_line("hex").is_err());
    }

    #[test]
    fn test_keywords() {
        assert_eq!(parse_line("   ").unwrap(), None);
        assert_eq!(parse_line("Reconnect").unwrap(), Some(PromptCommand::Reconnect));
        assert_eq!(parse_line("q").unwrap(), Some(PromptCommand::Quit));
        assert!(parse_line("send").is_err());
        assert!(parse_line("launch").is_err());
    }

    #[test]
    fn test_format_message() {
        assert_eq!(format_message(b"ok"), "6f6b \"ok\"");
        assert_eq!(format_message(&[0x00, 0xFF]), "00ff");
        assert_eq!(format_message(&[]), "");
    }
}
