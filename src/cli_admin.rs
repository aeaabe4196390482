use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wedding_party_server::hotel::{HotelRoomManager, SqliteHotelRoomStore};
use wedding_party_server::open_database;
use wedding_party_server::user::{SqliteUserStore, UserManager};

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite party database file, created if missing.
    pub db_path: PathBuf,
}

#[derive(Parser)]
struct InnerCli {
    #[command(subcommand)]
    command: InnerCommand,
}

#[derive(Subcommand)]
enum InnerCommand {
    /// Creates a new party.
    AddParty { name: String },
    /// Lists all parties.
    Parties,
    /// Creates a user in an existing party.
    AddUser { handle: String, party: String },
    AddLogin { handle: String, password: String },
    UpdateLogin { handle: String, password: String },
    DeleteLogin { handle: String },
    /// Shows the auth tokens of a user.
    Tokens { handle: String },
    /// Adds a hotel room to a party.
    AddHotelRoom {
        party: String,
        name: String,
        capacity: usize,
        #[arg(long)]
        description: Option<String>,
    },
    Exit,
}

struct Admin {
    user_manager: UserManager,
    hotel_room_manager: HotelRoomManager,
}

impl Admin {
    fn party_id(&self, name: &str) -> Result<usize> {
        match self.user_manager.get_party_by_name(name)? {
            Some(party) => Ok(party.id),
            None => bail!("Party {} not found.", name),
        }
    }

    fn run(&self, command: InnerCommand) -> Result<()> {
        match command {
            InnerCommand::AddParty { name } => {
                let id = self.user_manager.add_party(&name)?;
                println!("Party {} has id {}.", name, id);
            }
            InnerCommand::Parties => {
                for party in self.user_manager.get_parties()? {
                    println!("{}\t{}", party.id, party.name);
                }
            }
            InnerCommand::AddUser { handle, party } => {
                let party_id = self.party_id(&party)?;
                let id = self.user_manager.add_user(&handle, party_id)?;
                println!("User {} has id {}.", handle, id);
            }
            InnerCommand::AddLogin { handle, password } => {
                self.user_manager
                    .create_password_credentials(&handle, &password)?;
            }
            InnerCommand::UpdateLogin { handle, password } => {
                self.user_manager
                    .update_password_credentials(&handle, &password)?;
            }
            InnerCommand::DeleteLogin { handle } => {
                self.user_manager.delete_password_credentials(&handle)?;
            }
            InnerCommand::Tokens { handle } => {
                for token in self.user_manager.get_user_tokens(&handle)? {
                    println!(
                        "{}\tcreated {:?}\tlast used {:?}",
                        token.value.0, token.created, token.last_used
                    );
                }
            }
            InnerCommand::AddHotelRoom {
                party,
                name,
                capacity,
                description,
            } => {
                let party_id = self.party_id(&party)?;
                let id = self.hotel_room_manager.add_room(
                    party_id,
                    &name,
                    description.as_deref(),
                    capacity,
                )?;
                println!("Room {} has id {}.", name, id);
            }
            InnerCommand::Exit => {}
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let conn = open_database(&cli_args.db_path)?;
    let admin = Admin {
        user_manager: UserManager::new(Box::new(SqliteUserStore::new(conn.clone()))),
        hotel_room_manager: HotelRoomManager::new(Box::new(SqliteHotelRoomStore::new(conn))),
    };

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut line = String::new();
        if reader.read_line(&mut line).context("Failed to read line")? == 0 {
            break;
        }
        let line = line.trim();

        if line.is_empty() {
            continue;
        }

        let args = shlex::split(line)
            .unwrap_or_else(|| line.split_whitespace().map(String::from).collect());
        let cli = InnerCli::try_parse_from(
            std::iter::once(" ").chain(args.iter().map(String::as_str)),
        );

        match cli {
            Ok(InnerCli {
                command: InnerCommand::Exit,
            }) => break,
            Ok(cli) => {
                if let Err(err) = admin.run(cli.command) {
                    eprintln!("Something went wrong: {:#}", err);
                    continue;
                }
            }
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        }
        println!("Done.");
    }
    Ok(())
}
