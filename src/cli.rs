//! Command line interface

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "nabo", version, about = "Terminal client for the Nabo map-guessing game")]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Create a new match and host it
    Create {
        /// Nickname shown to the other players
        #[arg(long)]
        nickname: String,

        /// City to play in
        #[arg(long, default_value = "stockholm")]
        city: String,

        /// Number of rounds
        #[arg(long, default_value_t = 5)]
        rounds: u32,

        #[command(flatten)]
        bot: BotArgs,
    },

    /// Join an existing match by code
    Join {
        /// Match code from the host
        code: String,

        /// Nickname shown to the other players
        #[arg(long)]
        nickname: String,

        #[command(flatten)]
        bot: BotArgs,
    },

    /// List the playable cities
    Cities,

    /// Show the global top scores
    Top {
        /// Restrict to one city
        #[arg(long)]
        city: Option<String>,

        /// Number of rows
        #[arg(long, default_value_t = 10)]
        limit: u32,

        /// Sort order
        #[arg(long, default_value = "best", value_parser = ["best", "latest"])]
        order: String,
    },
}

/// Flags for the automated player
#[derive(Debug, Args, Clone, Copy)]
pub struct BotArgs {
    /// Play automatically instead of reading terminal commands
    #[arg(long)]
    pub bot: bool,

    /// Seed for the bot's guess jitter
    #[arg(long, default_value_t = 0)]
    pub bot_seed: u64,

    /// How long the bot pretends to think before guessing, in milliseconds
    #[arg(long, default_value_t = 1500)]
    pub bot_think_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_parses_code_and_bot_flags() {
        let cli = Cli::parse_from([
            "nabo", "join", "XK3P", "--nickname", "anna", "--bot", "--bot-seed", "7",
        ]);
        match cli.command {
            CliCommand::Join {
                code,
                nickname,
                bot,
            } => {
                assert_eq!(code, "XK3P");
                assert_eq!(nickname, "anna");
                assert!(bot.bot);
                assert_eq!(bot.bot_seed, 7);
                assert_eq!(bot.bot_think_ms, 1500);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn create_defaults_to_five_rounds_in_stockholm() {
        let cli = Cli::parse_from(["nabo", "create", "--nickname", "anna"]);
        match cli.command {
            CliCommand::Create {
                city,
                rounds,
                bot,
                ..
            } => {
                assert_eq!(city, "stockholm");
                assert_eq!(rounds, 5);
                assert!(!bot.bot);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn top_rejects_unknown_order() {
        assert!(Cli::try_parse_from(["nabo", "top", "--order", "worst"]).is_err());
    }
}
