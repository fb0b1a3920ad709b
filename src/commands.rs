use std::str::FromStr;

use crowdwork_core::RequestStatus;

pub const HELP: &str = "Commands: /request <song>, /like <id>, /status <id> <status>, /reload, /show, /quit. Anything else is sent as a chat message.";

/// A line typed into the terminal
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Say(String),
    Request(String),
    Like(String),
    Status(String, RequestStatus),
    Reload,
    Show,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();

        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Self::Say(line.to_string()));
        };

        let (name, args) = rest.split_once(' ').unwrap_or((rest, ""));
        let args = args.trim();

        match name {
            "request" => Ok(Self::Request(args.to_string())),
            "like" => match args {
                "" => Err("Usage: /like <id>".to_string()),
                id => Ok(Self::Like(id.to_string())),
            },
            "status" => {
                let (id, status) = args
                    .split_once(' ')
                    .ok_or_else(|| "Usage: /status <id> <status>".to_string())?;

                Ok(Self::Status(id.to_string(), status.trim().parse()?))
            }
            "reload" => Ok(Self::Reload),
            "show" => Ok(Self::Show),
            "help" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(format!("Unknown command /{}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!("hello there".parse::<Command>(), Ok(Command::Say("hello there".to_string())));
        assert_eq!(
            "/request Daft Punk - One More Time".parse::<Command>(),
            Ok(Command::Request("Daft Punk - One More Time".to_string()))
        );
        assert_eq!("/like r1".parse::<Command>(), Ok(Command::Like("r1".to_string())));
        assert_eq!(
            "/status r1 playing".parse::<Command>(),
            Ok(Command::Status("r1".to_string(), RequestStatus::Playing))
        );
        assert_eq!("/quit".parse::<Command>(), Ok(Command::Quit));
    }

    #[test]
    fn rejects_malformed_commands() {
        assert!("/like".parse::<Command>().is_err());
        assert!("/status r1".parse::<Command>().is_err());
        assert!("/status r1 loud".parse::<Command>().is_err());
        assert!("/dance".parse::<Command>().is_err());
    }
}
