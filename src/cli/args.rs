//! Command-line argument parsing for the tarot-stream binary.
//!
//! This module handles parsing command-line arguments and determining
//! which CLI command to execute.

use color_eyre::eyre::{bail, eyre, WrapErr};
use color_eyre::Result;

use crate::models::{Card, ReadingRequest};

/// Spread used when `--spread` is not given.
pub const DEFAULT_SPREAD: &str = "single";

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Stream a reading for these cards
    Read(ReadingRequest),
}

/// Usage text printed for `--help` and argument errors.
pub const USAGE: &str = "\
Usage: tarot-stream [--version] [--spread <id>] <card>...

Each card is card_id:name:cname:type:orientation, e.g.
    tarot-stream \"16:The Tower:塔:major:reversed\"

Orientation is upright or reversed. Settings come from TAROT_BASE_URL,
TAROT_AUTH_TOKEN, TAROT_RETRY_DELAY_MS, TAROT_MAX_RETRIES, TAROT_STORE_PATH;
log filtering from TAROT_LOG.";

/// Parse command-line arguments and return the appropriate command.
///
/// # Arguments
///
/// * `args` - Iterator of command-line arguments (typically `std::env::args()`)
///
/// # Examples
///
/// ```
/// use tarot_stream::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["tarot-stream".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()).unwrap(), CliCommand::Version);
/// ```
pub fn parse_args<I>(args: I) -> Result<CliCommand>
where
    I: Iterator<Item = String>,
{
    let mut spread_id = DEFAULT_SPREAD.to_string();
    let mut cards = Vec::new();

    // Skip the program name
    let mut args = args.skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => return Ok(CliCommand::Version),
            "--help" | "-h" => return Ok(CliCommand::Help),
            "--spread" | "-s" => {
                spread_id = args
                    .next()
                    .ok_or_else(|| eyre!("--spread needs a value"))?;
            }
            flag if flag.starts_with("--") => bail!("Unknown option: {}", flag),
            card => cards.push(parse_card(card)?),
        }
    }

    if cards.is_empty() {
        return Ok(CliCommand::Help);
    }

    let request = if cards.len() == 1 {
        let card = cards.remove(0);
        ReadingRequest::single(card, spread_id)
    } else {
        let names = position_names(cards.len());
        cards
            .into_iter()
            .zip(names)
            .enumerate()
            .fold(ReadingRequest::new(spread_id), |request, (i, (card, name))| {
                request.with_card(card, i as u32 + 1, name)
            })
    };
    Ok(CliCommand::Read(request))
}

/// Parse `card_id:name:cname:type:orientation`.
pub fn parse_card(arg: &str) -> Result<Card> {
    let parts: Vec<&str> = arg.split(':').map(str::trim).collect();
    let [id, name, cname, card_type, orientation] = parts.as_slice() else {
        bail!(
            "Card {:?} must look like card_id:name:cname:type:orientation",
            arg
        );
    };

    let card_id = id
        .parse()
        .wrap_err_with(|| format!("Card id {:?} is not a number", id))?;
    let orientation = orientation.parse().map_err(|e: String| eyre!(e))?;

    Ok(Card {
        card_id,
        card_name: name.to_string(),
        card_cname: cname.to_string(),
        card_type: card_type.to_string(),
        orientation,
    })
}

fn position_names(count: usize) -> Vec<String> {
    if count == 3 {
        return ["Past", "Present", "Future"]
            .iter()
            .map(|s| s.to_string())
            .collect();
    }
    (1..=count).map(|n| format!("Position {}", n)).collect()
}
