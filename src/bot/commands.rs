//! Chat command parsing.

/// A parsed chat command. Arguments stay raw; validation happens on execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Price,
    Opportunity,
    AddId(Option<String>),
    ListIds,
    Config,
    Set {
        name: Option<String>,
        value: Option<String>,
    },
    SetPrice(Option<String>),
    Help,
    /// Slash-prefixed text that matches no command.
    Unknown(String),
}

impl Command {
    /// Parse chat text. Matching is case-insensitive and a trailing
    /// `@botname` on the command word is ignored. Without the leading `/`,
    /// only a message consisting of the bare command word is accepted.
    ///
    /// Returns `None` for plain text that is not a command.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let slashed = text.starts_with('/');
        if !slashed && text.split_whitespace().nth(1).is_some() {
            return None;
        }
        let mut words = text.trim_start_matches('/').split_whitespace();

        let word = words.next()?;
        let name = word.split('@').next().unwrap_or(word).to_lowercase();
        let mut arg = || words.next().map(str::to_string);

        let command = match name.as_str() {
            "price" | "p" => Command::Price,
            "opportunity" | "o" => Command::Opportunity,
            "addid" => Command::AddId(arg()),
            "listids" => Command::ListIds,
            "config" | "c" => Command::Config,
            "set" | "s" => {
                let name = arg();
                let value = arg();
                Command::Set { name, value }
            }
            "setprice" => Command::SetPrice(arg()),
            "help" | "h" | "start" => Command::Help,
            _ if slashed => Command::Unknown(name),
            _ => return None,
        };
        Some(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!(Command::parse("/price"), Some(Command::Price));
        assert_eq!(Command::parse("/p"), Some(Command::Price));
        assert_eq!(Command::parse("/o"), Some(Command::Opportunity));
        assert_eq!(Command::parse("/c"), Some(Command::Config));
        assert_eq!(Command::parse("/start"), Some(Command::Help));
        assert_eq!(Command::parse("/h"), Some(Command::Help));
    }

    #[test]
    fn test_parse_tolerates_case_and_suffix() {
        assert_eq!(Command::parse("/PRICE@GoldSignalBot"), Some(Command::Price));
        assert_eq!(Command::parse("  listids "), Some(Command::ListIds));
        assert_eq!(Command::parse("Opportunity"), Some(Command::Opportunity));
    }

    #[test]
    fn test_plain_sentences_are_not_commands() {
        assert_eq!(Command::parse("set me up later"), None);
        assert_eq!(Command::parse("Price looks wild today"), None);
        assert_eq!(Command::parse("o really"), None);
        assert_eq!(Command::parse("addid 12345"), None);
    }

    #[test]
    fn test_parse_arguments() {
        assert_eq!(
            Command::parse("/addid 12345"),
            Some(Command::AddId(Some("12345".to_string())))
        );
        assert_eq!(Command::parse("/addid"), Some(Command::AddId(None)));
        assert_eq!(
            Command::parse("/s rsi_high 75"),
            Some(Command::Set {
                name: Some("rsi_high".to_string()),
                value: Some("75".to_string()),
            })
        );
        assert_eq!(
            Command::parse("/set rsi_high"),
            Some(Command::Set {
                name: Some("rsi_high".to_string()),
                value: None,
            })
        );
        assert_eq!(
            Command::parse("/setprice 2351.4"),
            Some(Command::SetPrice(Some("2351.4".to_string())))
        );
    }

    #[test]
    fn test_parse_unknown_and_plain_text() {
        assert_eq!(
            Command::parse("/moon"),
            Some(Command::Unknown("moon".to_string()))
        );
        assert_eq!(Command::parse("good morning"), None);
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("/"), None);
    }
}
