// File: ./src/cli.rs
//! Command-line parsing and help text for the `minutes` binary.
use chrono::NaiveDate;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Convert {
        file: PathBuf,
    },
    Count {
        file: PathBuf,
    },
    /// Action items given as JSON, printed as checkbox lines.
    Items {
        file: PathBuf,
    },
    Publish {
        file: PathBuf,
        title: Option<String>,
        date: Option<NaiveDate>,
        channel: Option<String>,
        /// The file holds raw notes to structure with the language model.
        raw: bool,
        attendees: Option<String>,
    },
    Remind {
        dry_run: bool,
        date: Option<NaiveDate>,
    },
    Check,
    Init,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cli {
    pub root: Option<PathBuf>,
    pub verbose: bool,
    pub command: Command,
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", value))
}

fn take_value<'a, I>(flag: &str, iter: &mut I) -> Result<String, String>
where
    I: Iterator<Item = &'a String>,
{
    iter.next()
        .cloned()
        .ok_or_else(|| format!("Missing value for {}", flag))
}

/// Parses the arguments after the binary name.
pub fn parse_args(args: &[String]) -> Result<Cli, String> {
    let mut root = None;
    let mut verbose = false;
    let mut positional: Vec<String> = Vec::new();
    let mut title = None;
    let mut date = None;
    let mut channel = None;
    let mut dry_run = false;
    let mut raw = false;
    let mut attendees = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                return Ok(Cli {
                    root,
                    verbose,
                    command: Command::Help,
                });
            }
            "-r" | "--root" => root = Some(PathBuf::from(take_value(arg, &mut iter)?)),
            "-v" | "--verbose" => verbose = true,
            "-t" | "--title" => title = Some(take_value(arg, &mut iter)?),
            "-d" | "--date" => date = Some(parse_date(&take_value(arg, &mut iter)?)?),
            "-c" | "--channel" => channel = Some(take_value(arg, &mut iter)?),
            "-a" | "--attendees" => attendees = Some(take_value(arg, &mut iter)?),
            "--dry-run" => dry_run = true,
            "--raw" => raw = true,
            other if other.starts_with('-') => return Err(format!("Unknown option '{}'", other)),
            _ => positional.push(arg.clone()),
        }
    }

    let mut positional = positional.into_iter();
    let command = match positional.next().as_deref() {
        None | Some("help") => Command::Help,
        Some("convert") => Command::Convert {
            file: positional
                .next()
                .map(PathBuf::from)
                .ok_or("convert needs a markdown file")?,
        },
        Some("count") => Command::Count {
            file: positional
                .next()
                .map(PathBuf::from)
                .ok_or("count needs a markdown file")?,
        },
        Some("items") => Command::Items {
            file: positional
                .next()
                .map(PathBuf::from)
                .ok_or("items needs a JSON file")?,
        },
        Some("publish") => Command::Publish {
            file: positional
                .next()
                .map(PathBuf::from)
                .ok_or("publish needs a markdown file")?,
            title,
            date,
            channel,
            raw,
            attendees,
        },
        Some("remind") => Command::Remind { dry_run, date },
        Some("check") => Command::Check,
        Some("init") => Command::Init,
        Some(other) => return Err(format!("Unknown command '{}'", other)),
    };

    if let Some(extra) = positional.next() {
        return Err(format!("Unexpected argument '{}'", extra));
    }

    Ok(Cli {
        root,
        verbose,
        command,
    })
}

pub fn print_help(binary_name: &str) {
    println!(
        "Minutes v{} - Publish meeting minutes and remind owners of due action items",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("USAGE:");
    println!("    {} [OPTIONS] <COMMAND>", binary_name);
    println!();
    println!("COMMANDS:");
    println!("    convert <file.md>       Print the wiki storage markup for a minutes file");
    println!("    count <file.md>         Print open / done action item counts");
    println!("    items <file.json>       Print JSON action items as checkbox lines");
    println!("    publish <file.md>       Publish minutes to the wiki and post a summary");
    println!("    remind                  Send due-date reminders to every recipient");
    println!("    check                   Verify wiki and chat settings");
    println!("    init                    Write a config file template");
    println!();
    println!("OPTIONS:");
    println!("    -r, --root <path>       Use a different directory for config.");
    println!("    -v, --verbose           Debug logging.");
    println!("    -t, --title <title>     Meeting title (publish).");
    println!("    -d, --date <date>       Meeting date for publish, reference day for remind.");
    println!("    -c, --channel <name>    Summary channel, overrides the configured one.");
    println!("        --raw               Structure raw notes with the language model first.");
    println!("    -a, --attendees <list>  Attendees passed along with raw notes.");
    println!("        --dry-run           Print reminders instead of sending them.");
    println!("    -h, --help              Show this help message.");
    println!();
    println!("MINUTES SYNTAX:");
    println!("    # / ## / ###            Headings");
    println!("    - [ ] task              Open action item");
    println!("    - [x] task              Done action item");
    println!("    - item                  Plain list item");
    println!();
    println!("EXAMPLES:");
    println!("    - [ ] Fix login bug — @alice — Due: 2025-10-27");
    println!("    {} publish notes.md --title \"Coupon sync\" --date 2025-10-20", binary_name);
    println!("    {} publish raw.txt --raw --attendees \"Kim, Lee\"", binary_name);
    println!("    {} remind --dry-run", binary_name);
    println!();
    println!("ENVIRONMENT:");
    println!("    SLACK_BOT_TOKEN         Overrides chat_token from the config file.");
    println!("    OPENAI_API_KEY          Overrides llm_api_key from the config file.");
}
