//! `bacheca` - CLI for the document and news board
//!
//! This binary logs officers in, lists and edits documents and news, exports
//! them to text files, and lets administrators manage accounts.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::fs;
use std::path::Path;

use chrono::Utc;
use clap::Parser;
use dialoguer::Password;
use tracing::info;

use bacheca::cli::{
    output, Cli, Command, ConfigCommand, DocumentCommand, ExportArgs, ListArgs, LoginCommand,
    NewsCommand, OutputFormat, ShowArgs, UsersCommand,
};
use bacheca::{export, init_logging, Board, BoardRecord, Config, Document, NewsItem, Record};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> CliResult {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Execute the command; configuration commands never open storage
    match cli.command {
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
        Command::Login(login) => handle_login(&mut Board::open(&config)?, login).await,
        Command::Logout => handle_logout(&mut Board::open(&config)?),
        Command::Whoami { json } => handle_whoami(&Board::open(&config)?, json),
        Command::Documents(cmd) => handle_documents(&mut Board::open(&config)?, cmd),
        Command::News(cmd) => handle_news(&mut Board::open(&config)?, cmd),
        Command::Users(cmd) => {
            let board = Board::open(&config)?;
            handle_users(&board, cmd).await
        }
        Command::Overview { json } => handle_overview(&Board::open(&config)?, json),
    }
}

async fn handle_login(board: &mut Board, login: LoginCommand) -> CliResult {
    let password = match login.password {
        Some(password) => password,
        None => Password::new()
            .with_prompt(format!("Password for {}", login.email.trim()))
            .interact()?,
    };
    let session = board.login(&login.email, &password).await?;
    println!(
        "Logged in as {} <{}> ({})",
        session.user.full_name,
        session.user.email,
        session.role()
    );
    Ok(())
}

fn handle_logout(board: &mut Board) -> CliResult {
    board.logout()?;
    println!("Logged out.");
    Ok(())
}

fn handle_whoami(board: &Board, json: bool) -> CliResult {
    let Some(session) = board.auth().session() else {
        println!("Not logged in.");
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(session)?);
    } else {
        let user = &session.user;
        println!("Name:        {}", user.full_name);
        println!("Email:       {}", user.email);
        println!("Role:        {}", user.role);
        println!("Department:  {}", user.department);
        println!("Badge:       {}", user.badge_number);
        let permissions: Vec<String> = session
            .permissions
            .iter()
            .map(ToString::to_string)
            .collect();
        println!("Permissions: {}", permissions.join(", "));
    }
    Ok(())
}

fn handle_documents(board: &mut Board, cmd: DocumentCommand) -> CliResult {
    match cmd {
        DocumentCommand::List(args) => {
            print_records::<Document>(args.select(board.documents()?), &args.list)
        }
        DocumentCommand::Show(args) => show_record::<Document>(board, &args),
        DocumentCommand::Add(args) => {
            let author = session_name(board)?;
            let draft = args.into_draft(&author)?;
            add_record::<Document>(board, draft)
        }
        DocumentCommand::Edit(args) => {
            let patch = args.to_patch();
            if patch.is_empty() {
                println!("Nothing to change.");
                return Ok(());
            }
            edit_record::<Document>(board, &args.entry.id, patch)
        }
        DocumentCommand::Delete(args) => delete_record::<Document>(board, &args.id),
        DocumentCommand::Export(args) => export_records::<Document>(board, &args.export, |board| {
            Ok(args.select(board.documents()?))
        }),
    }
}

fn handle_news(board: &mut Board, cmd: NewsCommand) -> CliResult {
    match cmd {
        NewsCommand::List(args) => {
            print_records::<NewsItem>(args.filter.select(board.news()?), &args)
        }
        NewsCommand::Show(args) => show_record::<NewsItem>(board, &args),
        NewsCommand::Add(args) => {
            let author = session_name(board)?;
            let draft = args.into_draft(&author)?;
            add_record::<NewsItem>(board, draft)
        }
        NewsCommand::Edit(args) => {
            let patch = args.to_patch();
            if patch.is_empty() {
                println!("Nothing to change.");
                return Ok(());
            }
            edit_record::<NewsItem>(board, &args.id, patch)
        }
        NewsCommand::Delete(args) => delete_record::<NewsItem>(board, &args.id),
        NewsCommand::Export(args) => export_records::<NewsItem>(board, &args, |board| {
            Ok(args.filter.select(board.news()?))
        }),
    }
}

/// Name of the logged-in user, used as the default author.
fn session_name(board: &Board) -> Result<String, Box<dyn std::error::Error>> {
    Ok(board.auth().require_session()?.user.full_name.clone())
}

fn print_records<R: BoardRecord>(mut found: Vec<&R>, args: &ListArgs) -> CliResult {
    if let Some(limit) = args.limit {
        found.truncate(limit);
    }

    if found.is_empty() && args.format != OutputFormat::Json {
        println!("No {} records found.", R::KIND);
    } else {
        println!("{}", output::records(&found, args.format)?);
    }
    Ok(())
}

fn show_record<R: BoardRecord>(board: &Board, args: &ShowArgs) -> CliResult {
    let record = board.get::<R>(&args.id)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(record)?);
    } else {
        print!("{}", export::render(record));
    }
    Ok(())
}

fn add_record<R: BoardRecord>(board: &mut Board, draft: R::Draft) -> CliResult {
    let record = board.add::<R>(draft)?;
    println!("Added {} {}: {}", R::KIND, record.id(), record.entry().title);
    Ok(())
}

fn edit_record<R: BoardRecord>(board: &mut Board, id: &str, patch: R::Patch) -> CliResult {
    let record = board.update::<R>(id, patch)?;
    println!("Updated {} {}: {}", R::KIND, record.id(), record.entry().title);
    Ok(())
}

fn delete_record<R: BoardRecord>(board: &mut Board, id: &str) -> CliResult {
    if board.remove::<R>(id)? {
        println!("Deleted {} {id}.", R::KIND);
    } else {
        println!("No {} with id {id}.", R::KIND);
    }
    Ok(())
}

fn export_records<R: BoardRecord>(
    board: &Board,
    args: &ExportArgs,
    select: impl FnOnce(&Board) -> bacheca::Result<Vec<&R>>,
) -> CliResult {
    let (name, text) = if let Some(id) = &args.id {
        let record = board.get::<R>(id)?;
        (export::file_name(&record.entry().title), export::render(record))
    } else {
        let records = select(board)?;
        if records.is_empty() {
            println!("No {} records to export.", R::KIND);
            return Ok(());
        }
        (
            export::batch_file_name(R::SLOT.name(), Utc::now().date_naive()),
            export::render_batch(records),
        )
    };

    let path = write_export(&args.output, &name, &text)?;
    println!("Exported to {}", path.display());
    Ok(())
}

fn write_export(
    dir: &Path,
    name: &str,
    text: &str,
) -> Result<std::path::PathBuf, Box<dyn std::error::Error>> {
    fs::create_dir_all(dir)?;
    let path = dir.join(name);
    fs::write(&path, text)?;
    info!("Wrote export to {}", path.display());
    Ok(path)
}

async fn handle_users(board: &Board, cmd: UsersCommand) -> CliResult {
    let auth = board.auth();
    match cmd {
        UsersCommand::List { format } => {
            let users = auth.list_users().await?;
            println!("{}", output::users(&users, format)?);
        }
        UsersCommand::Create(args) => {
            let user = auth.create_user(args.into()).await?;
            println!(
                "Created account {} for {} <{}> ({})",
                user.id, user.full_name, user.email, user.role
            );
        }
        UsersCommand::SetRole { id, role } => {
            let role = role.into();
            auth.set_role(&id, role).await?;
            println!("Account {id} is now {role}.");
        }
        UsersCommand::Delete { id } => {
            auth.delete_user(&id).await?;
            println!("Deleted account {id}.");
        }
    }
    Ok(())
}

fn handle_overview(board: &Board, json: bool) -> CliResult {
    let overview = board.overview()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&overview)?);
    } else {
        print!("{}", output::overview(&overview));
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> CliResult {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Backend:            {:?}", config.storage.backend);
                println!("  Data directory:     {}", config.data_dir().display());
                println!("  Database path:      {}", config.database_path().display());
                println!("  Seed samples:       {}", config.storage.seed_samples);
                println!();
                println!("[Users]");
                println!("  Source:             {:?}", config.users.source);
                println!(
                    "  Database path:      {}",
                    config.users_database_path().display()
                );
                println!("  Demo accounts:      {}", config.users.demo_accounts);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
