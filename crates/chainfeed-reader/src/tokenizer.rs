//! Protocol line tokenizer.
//!
//! Wire format, one record per line:
//! ```text
//! <TAG> <COMMAND> <arg1> <arg2> ...
//! ```
//! Tokens are separated by exactly one space; a doubled space yields an
//! empty token and therefore a different argument count.

use chainfeed_core::error::DecodeError;

/// Commands understood by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// `BLOCK <HEIGHT> <ENCODED_BLOCK>`
    Block,
}

impl CommandKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "BLOCK" => Some(Self::Block),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Block => "BLOCK",
        }
    }
}

/// A tokenized protocol line, borrowing from the raw line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command<'a> {
    pub name: &'a str,
    pub args: Vec<&'a str>,
}

impl Command<'_> {
    pub fn kind(&self) -> Option<CommandKind> {
        CommandKind::from_name(self.name)
    }
}

/// Tokenize `line` if it carries `prefix`.
///
/// Returns `Ok(None)` for lines that are not protocol lines. The tag must be
/// a whole token: `DMLOGGER x` is ordinary output, not a protocol line.
pub fn tokenize<'a>(line: &'a str, prefix: &str) -> Result<Option<Command<'a>>, DecodeError> {
    let Some(rest) = line.strip_prefix(prefix) else {
        return Ok(None);
    };
    let body = match rest.strip_prefix(' ') {
        Some(body) => body,
        None if rest.is_empty() => rest,
        None => return Ok(None),
    };

    let mut tokens = body.split(' ');
    let name = tokens.next().unwrap_or_default();
    let args: Vec<&str> = tokens.collect();
    if args.is_empty() {
        return Err(DecodeError::MalformedLine {
            line: line.to_string(),
        });
    }
    Ok(Some(Command { name, args }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAG: &str = "DMLOG";

    #[test]
    fn non_protocol_lines_are_skipped() {
        for line in ["", "INFO starting node", "dmlog BLOCK 1 00", "DMLOGGER BLOCK 1 00", " DMLOG BLOCK 1 00"] {
            assert_eq!(tokenize(line, TAG).unwrap(), None, "{line:?}");
        }
    }

    #[test]
    fn splits_command_and_args() {
        let cmd = tokenize("DMLOG BLOCK 100 0a0208c8", TAG).unwrap().unwrap();
        assert_eq!(cmd.name, "BLOCK");
        assert_eq!(cmd.args, vec!["100", "0a0208c8"]);
        assert_eq!(cmd.kind(), Some(CommandKind::Block));
    }

    #[test]
    fn single_token_is_malformed() {
        for line in ["DMLOG", "DMLOG ", "DMLOG BLOCK"] {
            match tokenize(line, TAG) {
                Err(DecodeError::MalformedLine { line: l }) => assert_eq!(l, line),
                other => panic!("{line:?}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn doubled_space_keeps_empty_token() {
        let cmd = tokenize("DMLOG BLOCK  100 00", TAG).unwrap().unwrap();
        assert_eq!(cmd.args, vec!["", "100", "00"]);
    }

    #[test]
    fn unknown_command_is_not_an_error() {
        let cmd = tokenize("DMLOG TRX_BEGIN abc def", TAG).unwrap().unwrap();
        assert_eq!(cmd.name, "TRX_BEGIN");
        assert_eq!(cmd.kind(), None);
    }

    #[test]
    fn custom_prefix() {
        let cmd = tokenize("FIRE BLOCK 1 00", "FIRE").unwrap().unwrap();
        assert_eq!(cmd.kind(), Some(CommandKind::Block));
        assert_eq!(tokenize("DMLOG BLOCK 1 00", "FIRE").unwrap(), None);
    }
}
