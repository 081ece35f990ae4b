use anyhow::{Context, Result, anyhow, bail};
use chrono::{Local, NaiveDate};
use minutes::cli::{self, Cli, Command};
use minutes::client::{
    ChatClient, DocumentPublisher, MessageSender, NotesClient, Unavailable, WikiClient,
};
use minutes::config::{Config, Recipient};
use minutes::context::{AppContext, StandardContext};
use minutes::controller::{
    MeetingNotes, PublishRequest, ReminderOutcome, prepare_minutes, publish_minutes,
    run_reminders,
};
use minutes::extract::extract_action_items_count;
use minutes::markup;
use minutes::model::intake::{fallback_title, page_title, parse_action_items_json};
use simplelog::{ColorChoice, TermLogger, TerminalMode};
use std::env;
use std::fs;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let cli = match cli::parse_args(&args) {
        Ok(cli) => cli,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            eprintln!("Run 'minutes --help' for usage.");
            std::process::exit(2);
        }
    };

    if cli.command == Command::Help {
        cli::print_help("minutes");
        return Ok(());
    }

    let ctx = StandardContext::new(cli.root.clone());
    let config = Config::load(&ctx);

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        config
            .as_ref()
            .map(Config::log_level_filter)
            .unwrap_or(log::LevelFilter::Info)
    };
    let _ = TermLogger::init(
        level,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );

    run(cli, &ctx, config).await
}

async fn run(cli: Cli, ctx: &dyn AppContext, config: Result<Config>) -> Result<()> {
    match cli.command {
        Command::Help => {
            cli::print_help("minutes");
            Ok(())
        }
        Command::Convert { file } => {
            let markdown = read_text(&file)?;
            println!("{}", markup::convert(&markdown));
            Ok(())
        }
        Command::Count { file } => {
            let markdown = read_text(&file)?;
            let (complete, incomplete) = extract_action_items_count(&markdown);
            println!("open: {}, done: {}", incomplete, complete);
            Ok(())
        }
        Command::Items { file } => {
            let reply = read_text(&file)?;
            let items = parse_action_items_json(&reply);
            if items.is_empty() {
                bail!("No action items found in {}", file.display());
            }
            println!("## Action items");
            for item in &items {
                println!("{}", item.to_markdown_line());
            }
            Ok(())
        }
        Command::Init => init_config(ctx, config),
        Command::Publish {
            file,
            title,
            date,
            channel,
            raw,
            attendees,
        } => {
            let options = PublishOptions {
                title,
                date,
                channel,
                raw,
                attendees,
            };
            publish(&require_config(ctx, config)?, &file, options).await
        }
        Command::Remind { dry_run, date } => {
            remind(&require_config(ctx, config)?, date, dry_run).await
        }
        Command::Check => check(&require_config(ctx, config)?).await,
    }
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn require_config(ctx: &dyn AppContext, config: Result<Config>) -> Result<Config> {
    config.map_err(|e| {
        if Config::is_missing_config_error(&e) {
            let path = ctx
                .get_config_file_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "config.toml".to_string());
            anyhow!(
                "No configuration found at {}. Run 'minutes init' and fill it in.",
                path
            )
        } else {
            e
        }
    })
}

fn init_config(ctx: &dyn AppContext, existing: Result<Config>) -> Result<()> {
    let path = ctx.get_config_file_path()?;
    match existing {
        Ok(_) => bail!("{} already exists", path.display()),
        Err(e) if !Config::is_missing_config_error(&e) => {
            bail!("{} exists but is invalid: {}", path.display(), e)
        }
        Err(_) => {}
    }

    let template = Config {
        wiki_url: "https://your-site.atlassian.net".to_string(),
        wiki_username: "you@example.com".to_string(),
        wiki_token: "api-token".to_string(),
        wiki_space: "TEAM".to_string(),
        chat_channel: "#general".to_string(),
        recipients: vec![Recipient {
            name: "Your Name".to_string(),
            chat_id: "U00000000".to_string(),
            ..Recipient::default()
        }],
        ..Config::default()
    };
    template.save(ctx)?;
    println!("Wrote {}", path.display());
    Ok(())
}

struct PublishOptions {
    title: Option<String>,
    date: Option<NaiveDate>,
    channel: Option<String>,
    raw: bool,
    attendees: Option<String>,
}

fn wiki_publisher(config: &Config) -> Box<dyn DocumentPublisher> {
    match WikiClient::new(&config.wiki_url, &config.wiki_username, &config.wiki_token) {
        Ok(client) => Box::new(client),
        Err(e) => Box::new(Unavailable(e)),
    }
}

fn chat_sender(config: &Config) -> Box<dyn MessageSender> {
    match ChatClient::new(&config.chat_token().unwrap_or_default()) {
        Ok(client) => Box::new(client),
        Err(e) => Box::new(Unavailable(e)),
    }
}

async fn publish(config: &Config, file: &Path, options: PublishOptions) -> Result<()> {
    let text = read_text(file)?;
    let date = options.date.unwrap_or_else(|| Local::now().date_naive());
    let topic = options
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());
    let channel = options
        .channel
        .unwrap_or_else(|| config.chat_channel.clone());
    if channel.trim().is_empty() {
        bail!("No chat channel configured, set chat_channel or pass --channel");
    }

    let (title, markdown, summary) = if options.raw {
        let key = config
            .llm_api_key()
            .ok_or_else(|| anyhow!("--raw needs llm_api_key in the config or OPENAI_API_KEY"))?;
        let model = NotesClient::with_api_base(&key, &config.llm_model, &config.llm_api_base)?;
        let meeting = MeetingNotes {
            notes: &text,
            topic,
            date,
            attendees: options.attendees.as_deref().unwrap_or_default(),
        };
        let prepared = prepare_minutes(&model, &meeting).await?;
        println!(
            "Structured '{}' with {} action item(s)",
            prepared.page_title,
            prepared.action_items.len()
        );
        (prepared.page_title, prepared.markdown, prepared.summary)
    } else {
        let title = match topic {
            Some(topic) => page_title(date, topic),
            None => fallback_title(&text, date).ok_or_else(|| {
                anyhow!("A meeting title is required, pass --title or use --raw")
            })?,
        };
        (title, text, None)
    };

    let wiki = wiki_publisher(config);
    let chat = chat_sender(config);

    let request = PublishRequest {
        page_title: &title,
        markdown: &markdown,
        target: config.publish_target(),
        channel: &channel,
        summary: summary.as_deref(),
    };
    let report = publish_minutes(wiki.as_ref(), chat.as_ref(), &request).await;

    match &report.page {
        Ok(page) => println!("Published '{}': {}", report.page_title, page.page_url),
        Err(e) => eprintln!("Wiki publish failed ({})", e),
    }
    match &report.message {
        Ok(()) => println!("Summary posted to {}", channel),
        Err(e) => eprintln!("Chat summary failed ({})", e),
    }

    if report.is_success() {
        Ok(())
    } else {
        bail!("Publishing '{}' did not fully succeed", report.page_title)
    }
}

async fn remind(config: &Config, date: Option<NaiveDate>, dry_run: bool) -> Result<()> {
    if config.recipients.is_empty() {
        log::warn!("No recipients configured, nothing to do");
        return Ok(());
    }

    let today = date.unwrap_or_else(|| Local::now().date_naive());
    let chat = if dry_run {
        None
    } else {
        Some(ChatClient::new(&config.chat_token().unwrap_or_default())?)
    };
    let sender = chat.as_ref().map(|c| c as &dyn MessageSender);

    let outcomes = run_reminders(config, today, sender, |access| {
        WikiClient::new(&config.wiki_url, &access.username, &access.token)
    })
    .await;

    let mut failures = 0;
    for (name, outcome) in &outcomes {
        match outcome {
            ReminderOutcome::Sent { items } => {
                println!("{}: sent reminder for {} item(s)", name, items)
            }
            ReminderOutcome::NothingToSend => println!("{}: nothing due", name),
            ReminderOutcome::DryRun { message } => {
                println!("--- {} ---", name);
                println!("{}", message);
            }
            ReminderOutcome::Failed(e) => {
                eprintln!("{}: failed ({})", name, e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!(
            "{} of {} recipient(s) could not be reminded",
            failures,
            outcomes.len()
        );
    }
    Ok(())
}

async fn check(config: &Config) -> Result<()> {
    let mut ok = true;

    let wiki = WikiClient::new(&config.wiki_url, &config.wiki_username, &config.wiki_token)?;
    match wiki.check_space(&config.wiki_space).await {
        Ok(name) => println!("Wiki: space '{}' ({}) is reachable", config.wiki_space, name),
        Err(e) => {
            println!("Wiki: {}", e);
            ok = false;
        }
    }

    match ChatClient::new(&config.chat_token().unwrap_or_default()) {
        Ok(chat) if !config.chat_channel.trim().is_empty() => {
            match chat.find_channel(&config.chat_channel).await {
                Ok(info) => println!("Chat: bot can post to #{} ({})", info.name, info.id),
                Err(e) => {
                    println!("Chat: {}", e);
                    ok = false;
                }
            }
        }
        Ok(_) => println!("Chat: token set, no summary channel configured"),
        Err(e) => {
            println!("Chat: {}", e);
            ok = false;
        }
    }

    println!("Recipients: {}", config.recipients.len());

    if ok {
        Ok(())
    } else {
        bail!("Configuration check failed")
    }
}
