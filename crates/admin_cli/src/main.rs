use std::error::Error;

use clap::{Args, Parser, Subcommand};
use engine::{BalanceView, Direction, Engine, MemberInclusion, MemberRef, Money};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "splitledger_admin")]
#[command(about = "Admin utilities for Splitledger (bootstrap users/groups, inspect balances)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./splitledger.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Group(Group),
    Member(Member),
    /// Print a group's balances, optionally from one member's point of view.
    Balances(BalancesArgs),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
    List,
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    name: String,
}

#[derive(Args, Debug)]
struct Group {
    #[command(subcommand)]
    command: GroupCommand,
}

#[derive(Subcommand, Debug)]
enum GroupCommand {
    Create(GroupCreateArgs),
}

#[derive(Args, Debug)]
struct GroupCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    description: Option<String>,
    /// Id of the creating user; they become the first member.
    #[arg(long)]
    creator: i64,
}

#[derive(Args, Debug)]
struct Member {
    #[command(subcommand)]
    command: MemberCommand,
}

#[derive(Subcommand, Debug)]
enum MemberCommand {
    Add(MemberAddArgs),
}

#[derive(Args, Debug)]
struct MemberAddArgs {
    #[arg(long)]
    group: i64,
    #[arg(long)]
    email: String,
}

#[derive(Args, Debug)]
struct BalancesArgs {
    #[arg(long)]
    group: i64,
    /// Show balances relative to this user.
    #[arg(long)]
    viewer: Option<i64>,
    /// Hide members without any expense or split.
    #[arg(long)]
    active_only: bool,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn print_balances(view: BalanceView) {
    let skipped = match view {
        BalanceView::Absolute(balances) => {
            for entry in &balances.entries {
                println!("{:>6}  {:<24} {:>12}", entry.user_id, entry.user_name, entry.amount);
            }
            balances.skipped_user_ids
        }
        BalanceView::Relative { balances, .. } => {
            if balances.entries.is_empty() {
                println!("all settled up");
            }
            for entry in &balances.entries {
                match entry.direction {
                    Direction::YouOwe => {
                        println!("you owe {} {}", entry.counterparty_name, entry.amount)
                    }
                    Direction::OwesYou => {
                        println!("{} owes you {}", entry.counterparty_name, entry.amount)
                    }
                }
            }
            balances.skipped_user_ids
        }
    };
    if !skipped.is_empty() {
        eprintln!("skipped users without a resolvable name: {skipped:?}");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let inclusion = match &cli.command {
        Command::Balances(args) if args.active_only => MemberInclusion::ActiveOnly,
        _ => MemberInclusion::AllMembers,
    };
    let engine = Engine::builder()
        .database(db)
        .member_inclusion(inclusion)
        .build()
        .await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let user = engine.register_user(&args.email, &args.name).await?;
            println!("created user: {} ({})", user.name, user.id);
        }
        Command::User(User {
            command: UserCommand::List,
        }) => {
            for user in engine.users().await? {
                println!("{:>6}  {:<24} {}", user.id, user.name, user.email);
            }
        }
        Command::Group(Group {
            command: GroupCommand::Create(args),
        }) => {
            let group = engine
                .create_group(&args.name, args.description.as_deref(), args.creator)
                .await?;
            println!("created group: {} ({})", group.name, group.id);
        }
        Command::Member(Member {
            command: MemberCommand::Add(args),
        }) => {
            let member = engine
                .add_member(args.group, MemberRef::Email(args.email))
                .await?;
            println!("added {} to group {}", member.user_name, member.group_id);
        }
        Command::Balances(args) => {
            let view = engine.group_balance_view(args.group, args.viewer).await?;
            let balances = engine.group_balances(args.group).await?;
            print_balances(view);
            match Money::checked_sum(balances.values().copied()) {
                Some(total) if total.is_zero() => {}
                Some(total) => eprintln!("warning: group balances do not sum to zero ({total})"),
                None => eprintln!("warning: group balances overflow"),
            }
        }
    }

    Ok(())
}
