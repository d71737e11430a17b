//! SMTP command parser.

use crate::error::{Error, Result};
use crate::types::{Address, BodyType, parse_path};

/// SMTP command received from a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// HELO - Simple greeting
    Helo {
        /// Client hostname
        hostname: String,
    },
    /// EHLO - Extended greeting
    Ehlo {
        /// Client hostname
        hostname: String,
    },
    /// STARTTLS - Upgrade to TLS
    StartTls,
    /// AUTH - Begin authentication
    Auth {
        /// Requested mechanism
        mechanism: String,
    },
    /// MAIL FROM - Start mail transaction
    MailFrom {
        /// Sender address, `None` for the null reverse-path
        from: Option<Address>,
        /// BODY parameter
        body: Option<BodyType>,
        /// SIZE parameter
        size: Option<usize>,
    },
    /// RCPT TO - Add recipient
    RcptTo {
        /// Recipient address
        to: Address,
    },
    /// DATA - Begin message data
    Data,
    /// RSET - Reset transaction
    Rset,
    /// VRFY - Verify address
    Vrfy {
        /// Address to verify
        address: String,
    },
    /// NOOP - No operation
    Noop,
    /// QUIT - Close connection
    Quit,
}

impl Command {
    /// Parses a command line (without its trailing CRLF).
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownCommand`] for unrecognized verbs and
    /// [`Error::Syntax`] or [`Error::InvalidAddress`] for malformed
    /// arguments.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (verb, arg) = line
            .split_once(' ')
            .map_or((line, ""), |(verb, arg)| (verb, arg.trim()));

        match verb.to_uppercase().as_str() {
            "HELO" => Ok(Self::Helo {
                hostname: required(arg, "HELO requires a hostname")?,
            }),
            "EHLO" => Ok(Self::Ehlo {
                hostname: required(arg, "EHLO requires a hostname")?,
            }),
            "STARTTLS" => Ok(Self::StartTls),
            "AUTH" => Ok(Self::Auth {
                mechanism: arg.split_whitespace().next().unwrap_or_default().to_uppercase(),
            }),
            "MAIL" => parse_mail(arg),
            "RCPT" => parse_rcpt(arg),
            "DATA" => no_argument(arg, Self::Data),
            "RSET" => no_argument(arg, Self::Rset),
            "VRFY" => Ok(Self::Vrfy {
                address: required(arg, "VRFY requires an argument")?,
            }),
            "NOOP" => Ok(Self::Noop),
            "QUIT" => no_argument(arg, Self::Quit),
            _ if verb.is_empty() => Err(Error::UnknownCommand(String::new())),
            _ => Err(Error::UnknownCommand(verb.to_string())),
        }
    }

    /// Returns the command verb.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Helo { .. } => "HELO",
            Self::Ehlo { .. } => "EHLO",
            Self::StartTls => "STARTTLS",
            Self::Auth { .. } => "AUTH",
            Self::MailFrom { .. } => "MAIL",
            Self::RcptTo { .. } => "RCPT",
            Self::Data => "DATA",
            Self::Rset => "RSET",
            Self::Vrfy { .. } => "VRFY",
            Self::Noop => "NOOP",
            Self::Quit => "QUIT",
        }
    }
}

fn required(arg: &str, message: &str) -> Result<String> {
    if arg.is_empty() {
        Err(Error::Syntax(message.to_string()))
    } else {
        Ok(arg.to_string())
    }
}

fn no_argument(arg: &str, command: Command) -> Result<Command> {
    if arg.is_empty() {
        Ok(command)
    } else {
        Err(Error::Syntax(format!("{} takes no arguments", command.verb())))
    }
}

/// Strips a case-insensitive keyword such as `FROM:`.
fn strip_keyword<'a>(arg: &'a str, keyword: &str) -> Option<&'a str> {
    let head = arg.get(..keyword.len())?;
    head.eq_ignore_ascii_case(keyword)
        .then(|| &arg[keyword.len()..])
}

fn parse_mail(arg: &str) -> Result<Command> {
    let rest = strip_keyword(arg, "FROM:")
        .ok_or_else(|| Error::Syntax("Expected MAIL FROM:<address>".into()))?;
    let (from, params) = parse_path(rest)?;

    let mut body = None;
    let mut size = None;
    for param in params.split_whitespace() {
        let (key, value) = param.split_once('=').unwrap_or((param, ""));
        match key.to_uppercase().as_str() {
            "SIZE" => {
                size = Some(
                    value
                        .parse()
                        .map_err(|_| Error::Syntax(format!("Invalid SIZE value: {value}")))?,
                );
            }
            "BODY" => {
                body = Some(
                    BodyType::parse(value)
                        .ok_or_else(|| Error::Syntax(format!("Unsupported BODY value: {value}")))?,
                );
            }
            _ => {
                return Err(Error::Syntax(format!("Unsupported parameter: {param}")));
            }
        }
    }

    Ok(Command::MailFrom { from, body, size })
}

fn parse_rcpt(arg: &str) -> Result<Command> {
    let rest = strip_keyword(arg, "TO:")
        .ok_or_else(|| Error::Syntax("Expected RCPT TO:<address>".into()))?;
    match parse_path(rest)? {
        (Some(to), _) => Ok(Command::RcptTo { to }),
        (None, _) => Err(Error::Syntax("Recipient cannot be empty".into())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_helo_ehlo() {
        assert_eq!(
            Command::parse("HELO client.example.com\r\n").unwrap(),
            Command::Helo {
                hostname: "client.example.com".to_string()
            }
        );
        assert_eq!(
            Command::parse("ehlo client.example.com").unwrap(),
            Command::Ehlo {
                hostname: "client.example.com".to_string()
            }
        );
        assert!(matches!(Command::parse("EHLO"), Err(Error::Syntax(_))));
    }

    #[test]
    fn test_mail_from_simple() {
        let cmd = Command::parse("MAIL FROM:<sender@example.com>").unwrap();
        assert_eq!(
            cmd,
            Command::MailFrom {
                from: Some(Address::new("sender@example.com").unwrap()),
                body: None,
                size: None,
            }
        );
    }

    #[test]
    fn test_mail_from_with_params() {
        let cmd = Command::parse("mail from: <sender@example.com> BODY=8BITMIME SIZE=12345")
            .unwrap();
        assert_eq!(
            cmd,
            Command::MailFrom {
                from: Some(Address::new("sender@example.com").unwrap()),
                body: Some(BodyType::EightBitMime),
                size: Some(12345),
            }
        );
    }

    #[test]
    fn test_mail_from_null_sender() {
        let cmd = Command::parse("MAIL FROM:<>").unwrap();
        assert!(matches!(cmd, Command::MailFrom { from: None, .. }));
    }

    #[test]
    fn test_mail_from_errors() {
        assert!(matches!(
            Command::parse("MAIL sender@example.com"),
            Err(Error::Syntax(_))
        ));
        assert!(matches!(
            Command::parse("MAIL FROM:<a@b.com> SIZE=big"),
            Err(Error::Syntax(_))
        ));
        assert!(matches!(
            Command::parse("MAIL FROM:<a@b.com> X-UNKNOWN=1"),
            Err(Error::Syntax(_))
        ));
    }

    #[test]
    fn test_rcpt_to() {
        assert_eq!(
            Command::parse("RCPT TO:<recipient@example.com>").unwrap(),
            Command::RcptTo {
                to: Address::new("recipient@example.com").unwrap()
            }
        );
        assert!(matches!(Command::parse("RCPT TO:<>"), Err(Error::Syntax(_))));
        assert!(matches!(
            Command::parse("RCPT TO:<nobody>"),
            Err(Error::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(Command::parse("DATA").unwrap(), Command::Data);
        assert_eq!(Command::parse("rset").unwrap(), Command::Rset);
        assert_eq!(Command::parse("NOOP anything").unwrap(), Command::Noop);
        assert_eq!(Command::parse("QUIT").unwrap(), Command::Quit);
        assert_eq!(Command::parse("STARTTLS").unwrap(), Command::StartTls);
        assert!(matches!(Command::parse("DATA now"), Err(Error::Syntax(_))));
    }

    #[test]
    fn test_auth_and_vrfy() {
        assert_eq!(
            Command::parse("AUTH plain AHVzZXIAcGFzcw==").unwrap(),
            Command::Auth {
                mechanism: "PLAIN".to_string()
            }
        );
        assert_eq!(
            Command::parse("VRFY postmaster").unwrap(),
            Command::Vrfy {
                address: "postmaster".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_command() {
        assert!(matches!(
            Command::parse("XYZZY"),
            Err(Error::UnknownCommand(verb)) if verb == "XYZZY"
        ));
        assert!(matches!(Command::parse(""), Err(Error::UnknownCommand(_))));
    }
}
