//! One command per player action, parsed from short text lines such as
//! `buy militia 2` or `attack Spain`.

use serde::{Deserialize, Serialize};
use sim_core::{AssetId, CountryId, MissionId, TechId};
use std::str::FromStr;
use thiserror::Error;

/// A player action handled by [`crate::Session::dispatch`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Choose the player's country.
    SelectCountry {
        /// Country code.
        country: CountryId,
    },
    /// Buy units of an asset.
    Buy {
        /// Asset id.
        asset: AssetId,
        /// Requested quantity, clamped by the rules.
        quantity: u32,
    },
    /// Research a technology.
    Research {
        /// Technology id.
        tech: TechId,
    },
    /// Collect income if the cooldown has elapsed.
    CollectIncome,
    /// Fight an abstract battle.
    Battle,
    /// Place the command post on a territory, by id or display name.
    PlaceCommandPost {
        /// Territory id or name.
        territory: String,
    },
    /// Attack a territory, by id or display name.
    Attack {
        /// Territory id or name.
        territory: String,
    },
    /// Claim a completed daily mission.
    ClaimMission {
        /// Mission id.
        mission: MissionId,
    },
    /// Record a sent message.
    Message,
    /// Show the player's standing.
    Status,
    /// Show mission progress.
    Missions,
    /// List territories that can be attacked.
    Targets,
    /// Show recent battles.
    History,
}

impl Command {
    /// Whether the command can change player state.
    pub fn mutates(&self) -> bool {
        !matches!(
            self,
            Command::Status | Command::Missions | Command::Targets | Command::History
        )
    }
}

/// Text that does not name a command.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseCommandError {
    /// Blank input.
    #[error("empty command")]
    Empty,
    /// First word is not a known verb.
    #[error("unknown command: {0}")]
    Unknown(String),
    /// A required argument is missing.
    #[error("{command} needs {argument}")]
    MissingArgument {
        /// Verb that was given.
        command: &'static str,
        /// What it expects.
        argument: &'static str,
    },
    /// Quantity is not a positive integer.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let verb = words.next().ok_or(ParseCommandError::Empty)?.to_lowercase();
        let rest: Vec<&str> = words.collect();
        let first = |command: &'static str, argument: &'static str| {
            rest.first()
                .map(|w| w.to_lowercase())
                .ok_or(ParseCommandError::MissingArgument { command, argument })
        };
        // Territory names may contain spaces and keep their case.
        let phrase = |command: &'static str| {
            if rest.is_empty() {
                Err(ParseCommandError::MissingArgument {
                    command,
                    argument: "a territory",
                })
            } else {
                Ok(rest.join(" "))
            }
        };

        let command = match verb.as_str() {
            "country" | "select" => Command::SelectCountry {
                country: CountryId(first("country", "a country code")?),
            },
            "buy" => {
                let asset = AssetId(first("buy", "an asset id")?);
                let quantity = match rest.get(1) {
                    Some(q) => q
                        .parse::<u32>()
                        .map_err(|_| ParseCommandError::InvalidQuantity((*q).to_string()))?,
                    None => 1,
                };
                Command::Buy { asset, quantity }
            }
            "research" => Command::Research {
                tech: TechId(first("research", "a technology id")?),
            },
            "income" | "collect" => Command::CollectIncome,
            "battle" | "fight" => Command::Battle,
            "base" | "post" => Command::PlaceCommandPost {
                territory: phrase("base")?,
            },
            "attack" => Command::Attack {
                territory: phrase("attack")?,
            },
            "claim" => Command::ClaimMission {
                mission: MissionId(first("claim", "a mission id")?),
            },
            "message" | "msg" => Command::Message,
            "status" => Command::Status,
            "missions" => Command::Missions,
            "targets" => Command::Targets,
            "history" => Command::History,
            _ => return Err(ParseCommandError::Unknown(verb)),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Result<Command, ParseCommandError> {
        s.parse()
    }

    #[test]
    fn parses_player_actions() {
        assert_eq!(
            parse("buy militia 2").unwrap(),
            Command::Buy {
                asset: "militia".into(),
                quantity: 2
            }
        );
        assert_eq!(
            parse("BUY Infantry").unwrap(),
            Command::Buy {
                asset: "infantry".into(),
                quantity: 1
            }
        );
        assert_eq!(
            parse("research aerodynamics").unwrap(),
            Command::Research {
                tech: "aerodynamics".into()
            }
        );
        assert_eq!(parse("income").unwrap(), Command::CollectIncome);
        assert_eq!(parse("  battle ").unwrap(), Command::Battle);
        assert_eq!(
            parse("base United Kingdom").unwrap(),
            Command::PlaceCommandPost {
                territory: "United Kingdom".into()
            }
        );
        assert_eq!(
            parse("attack Spain").unwrap(),
            Command::Attack {
                territory: "Spain".into()
            }
        );
        assert_eq!(
            parse("claim purchases").unwrap(),
            Command::ClaimMission {
                mission: "purchases".into()
            }
        );
        assert_eq!(parse("message").unwrap(), Command::Message);
        assert_eq!(parse("status").unwrap(), Command::Status);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(parse("   "), Err(ParseCommandError::Empty));
        assert_eq!(parse("dance"), Err(ParseCommandError::Unknown("dance".into())));
        assert!(matches!(
            parse("attack"),
            Err(ParseCommandError::MissingArgument { command: "attack", .. })
        ));
        assert_eq!(
            parse("buy militia lots"),
            Err(ParseCommandError::InvalidQuantity("lots".into()))
        );
    }

    #[test]
    fn read_only_commands_do_not_mutate() {
        assert!(!Command::Status.mutates());
        assert!(!Command::History.mutates());
        assert!(Command::Message.mutates());
        assert!(Command::Battle.mutates());
    }
}
