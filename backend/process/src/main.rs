use std::fs;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use directory::{Actor, Criteria, Field, MemberForm};
use process::{
    ListQuery,
    models::{DEFAULT_SERVER, HttpStore},
};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Base URL of the alumni server
    #[arg(long, env = "ALUMNI_SERVER", default_value = DEFAULT_SERVER)]
    server: String,

    #[arg(long, env = "ALUMNI_UID")]
    uid: Option<String>,

    #[arg(long, env = "ALUMNI_ROLE", default_value = "")]
    role: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search, filter and sort the directory
    List {
        #[arg(long, default_value = "")]
        search: String,

        #[arg(long = "member-role")]
        member_role: Option<String>,

        #[arg(long)]
        profession: Option<String>,

        #[arg(long)]
        college: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        company: Option<String>,

        /// Column to sort by; repeat to toggle direction
        #[arg(long, value_parser = parse_field)]
        sort: Vec<Field>,

        /// Print the filter option lists instead of rows
        #[arg(long)]
        options: bool,
    },

    /// Add a member (admin)
    Add(FormArgs),

    /// Update a member in place (admin)
    Update {
        id: String,

        #[command(flatten)]
        form: FormArgs,
    },

    /// Delete a member (admin)
    Delete { id: String },

    /// Bulk create members from a JSON array (admin)
    Import { file: String },

    /// Ask the alumni assistant
    Ask { message: String },
}

#[derive(Args, Debug)]
struct FormArgs {
    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    email: Option<String>,

    #[arg(long = "member-role")]
    member_role: Option<String>,

    #[arg(long)]
    profession: Option<String>,

    #[arg(long)]
    college: Option<String>,

    #[arg(long)]
    batch: Option<String>,

    #[arg(long)]
    grad_year: Option<String>,

    #[arg(long)]
    location: Option<String>,

    #[arg(long)]
    company: Option<String>,
}

impl From<FormArgs> for MemberForm {
    fn from(args: FormArgs) -> Self {
        MemberForm {
            name: args.name,
            email: args.email,
            role: args.member_role,
            profession: args.profession,
            college: args.college,
            batch: args.batch,
            grad_year: args.grad_year,
            location: args.location,
            company: args.company,
        }
    }
}

fn parse_field(s: &str) -> Result<Field, String> {
    s.parse()
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let actor = cli.uid.map(|uid| Actor::new(uid, cli.role));
    let store = HttpStore::new(&cli.server, actor.clone());
    let actor = actor.as_ref();

    match cli.command {
        Command::List {
            search,
            member_role,
            profession,
            college,
            location,
            company,
            sort,
            options,
        } => {
            let mut criteria = Criteria::search(search);
            criteria.set(Field::Role, member_role);
            criteria.set(Field::Profession, profession);
            criteria.set(Field::College, college);
            criteria.set(Field::Location, location);
            criteria.set(Field::Company, company);

            let output = process::list(
                &store,
                ListQuery {
                    criteria,
                    sort,
                    options,
                },
            )
            .await?;

            println!("{output}");
        }
        Command::Add(form) => {
            let id = process::add(&store, actor, form.into()).await?;
            println!("Created member {id}");
        }
        Command::Update { id, form } => {
            process::update(&store, actor, &id, form.into()).await?;
            println!("Updated member {id}");
        }
        Command::Delete { id } => {
            process::delete(&store, actor, &id).await?;
            println!("Deleted member {id}");
        }
        Command::Import { file } => {
            let raw = fs::read_to_string(&file).with_context(|| format!("Failed to read {file}"))?;
            let (created, failed) = process::import(&store, actor, &raw).await?;

            println!("\nImported: {created}");
            println!("Failed: {failed}");
        }
        Command::Ask { message } => {
            println!("{}", process::ask(&store, &message).await?);
        }
    }

    Ok(())
}
