use std::{
    error::Error,
    io::{Stderr, Write},
};

use clap::{Args, Parser, Subcommand, ValueEnum};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal::{self, ClearType},
};
use engine::{Engine, EngineError, LabelKind};
use migration::MigratorTrait;
use sea_orm::Database;

type CliResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(name = "slots_tracker_admin")]
#[command(about = "Admin utilities for slots_tracker (users, pay methods, categories)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./slots_tracker.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage API users.
    #[command(subcommand)]
    User(UserCommand),
    /// Seed pay methods and categories.
    #[command(subcommand)]
    Label(LabelCommand),
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Create a user, prompting for the password.
    Create(EmailArgs),
    /// Check a user's password without logging in through the API.
    Check(EmailArgs),
}

#[derive(Args, Debug)]
struct EmailArgs {
    #[arg(long)]
    email: String,
}

#[derive(Subcommand, Debug)]
enum LabelCommand {
    Add(LabelAddArgs),
}

#[derive(Args, Debug)]
struct LabelAddArgs {
    #[arg(long, value_enum)]
    kind: Kind,
    /// May be repeated.
    #[arg(long = "name", required = true)]
    names: Vec<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    PayMethod,
    Category,
}

impl From<Kind> for LabelKind {
    fn from(value: Kind) -> Self {
        match value {
            Kind::PayMethod => LabelKind::PayMethod,
            Kind::Category => LabelKind::Category,
        }
    }
}

/// Masked terminal input on stderr. Raw mode lasts as long as the value.
struct PasswordPrompt {
    out: Stderr,
}

impl PasswordPrompt {
    fn open() -> CliResult<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self {
            out: std::io::stderr(),
        })
    }

    fn say(&mut self, text: &str) -> CliResult<()> {
        execute!(
            self.out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print(text)
        )?;
        self.out.flush()?;
        Ok(())
    }

    fn read(&mut self, label: &str) -> CliResult<String> {
        self.say(label)?;

        let mut secret = String::new();
        loop {
            let Event::Key(KeyEvent {
                code, modifiers, ..
            }) = event::read()?
            else {
                continue;
            };

            match code {
                KeyCode::Enter => {
                    self.say("\r\n")?;
                    return Ok(secret);
                }
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                    self.say("\r\n")?;
                    return Err("interrupted".into());
                }
                KeyCode::Backspace => {
                    if secret.pop().is_some() {
                        execute!(self.out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                        self.out.flush()?;
                    }
                }
                KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                    secret.push(ch);
                    execute!(self.out, Print("*"))?;
                    self.out.flush()?;
                }
                _ => {}
            }
        }
    }

    /// Asks until two entries match, three attempts at most.
    fn new_password(&mut self) -> CliResult<String> {
        for _ in 0..3 {
            let first = self.read("Password: ")?;
            if first.is_empty() {
                self.say("Password must not be empty.\r\n")?;
                continue;
            }
            if self.read("Confirm password: ")? == first {
                return Ok(first);
            }
            self.say("Passwords do not match. Try again.\r\n")?;
        }
        Err("too many attempts".into())
    }
}

impl Drop for PasswordPrompt {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

async fn connect_engine(database_url: &str) -> CliResult<Engine> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(Engine::builder().database(db).build().await?)
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();
    let engine = connect_engine(&cli.database_url).await?;

    match cli.command {
        Command::User(UserCommand::Create(args)) => {
            let password = PasswordPrompt::open()?.new_password()?;
            match engine.create_user(&args.email, &password).await {
                Ok(user) => println!("created user: {} ({})", user.email, user.id),
                Err(EngineError::ExistingKey(email)) => {
                    eprintln!("user already exists: {email}");
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::User(UserCommand::Check(args)) => {
            let password = PasswordPrompt::open()?.read("Password: ")?;
            match engine.authenticate(&args.email, &password).await? {
                Some(user) => println!("ok: {} ({})", user.email, user.id),
                None => {
                    eprintln!("bad login");
                    std::process::exit(1);
                }
            }
        }
        Command::Label(LabelCommand::Add(args)) => {
            let kind = LabelKind::from(args.kind);
            for name in &args.names {
                match engine.create_label(kind, name, true).await {
                    Ok(label) => println!("created {}: {} ({})", kind.as_str(), label.name, label.id),
                    Err(EngineError::ExistingKey(name)) => {
                        eprintln!("{} already exists: {name}", kind.as_str());
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        }
    }

    Ok(())
}
