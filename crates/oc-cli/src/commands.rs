use std::path::PathBuf;

use anyhow::Context;
use colored::Colorize;
use oc_db::{Actor, AnyActor, Database, DbConfig, UserUpdate};
use oc_types::{ConnectRequest, Pledge, User};
use serde::Serialize;

use crate::cli::*;

/// Log file used when neither `--data` nor the configuration names one.
const DEFAULT_DATA_PATH: &str = "oc.log";

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let db = open_database(&cli)?;
    let out = Output { format: cli.format };
    let result = dispatch(&db, &out, cli.command);
    db.close()?;
    result
}

fn dispatch(db: &Database, out: &Output, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Add(args) => cmd_add(db, out, args),
        Command::Get(args) => {
            let actor = db.retrieve_actor(args.kind, args.id)?;
            out.emit(&actor, print_actor)
        }
        Command::List(args) => {
            let actors = db.retrieve_all_actors(args.kind)?;
            out.emit_all(&actors, print_actor, &format!("No {} records.", args.kind))
        }
        Command::Search(args) => cmd_search(db, out, args),
        Command::Pledge(args) => cmd_pledge(db, out, args.action),
        Command::Mrv(args) => {
            let mut actor = db.retrieve_actor(args.kind, args.id)?;
            actor.update_mrv(db, &args.mrv)?;
            out.emit(&actor, print_actor)
        }
        Command::User(args) => cmd_user(db, out, args.action),
        Command::Request(args) => cmd_request(db, out, args.action),
    }
}

fn open_database(cli: &Cli) -> anyhow::Result<Database> {
    let mut config = match &cli.config {
        Some(path) => DbConfig::load(path)?,
        None => DbConfig::default(),
    };
    if let Some(data) = &cli.data {
        config.data_path = Some(data.clone());
    }
    if config.data_path.is_none() {
        config.data_path = Some(PathBuf::from(DEFAULT_DATA_PATH));
    }
    Database::open(&config).context("could not open database")
}

struct Output {
    format: OutputFormat,
}

impl Output {
    fn emit<T: Serialize>(&self, value: &T, text: fn(&T)) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Text => text(value),
        }
        Ok(())
    }

    fn emit_all<T: Serialize>(
        &self,
        values: &[T],
        text: fn(&T),
        empty: &str,
    ) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(values)?),
            OutputFormat::Text if values.is_empty() => println!("{empty}"),
            OutputFormat::Text => values.iter().for_each(text),
        }
        Ok(())
    }
}

fn print_actor(actor: &AnyActor) {
    let parent = actor
        .parent_name()
        .map(|p| format!(" ({p})"))
        .unwrap_or_default();
    println!(
        "{} {}{}",
        format!("{}#{}", actor.kind(), actor.actor_id()).yellow(),
        actor.name().bold(),
        parent.dimmed()
    );
    if !actor.mrv().is_empty() {
        println!("  MRV: {}", actor.mrv().cyan());
    }
    if !actor.pledge_ids().is_empty() {
        println!("  Pledges: {:?}", actor.pledge_ids());
    }
}

fn print_pledge(pledge: &Pledge) {
    println!(
        "{} {} {} -> {}, goal {}{}",
        format!("pledge#{}", pledge.id).yellow(),
        pledge.pledge_type.bold(),
        pledge.base_year,
        pledge.target_year,
        pledge.goal,
        if pledge.regulatory { " (regulatory)" } else { "" }
    );
}

fn print_user(user: &User) {
    let badge = match (user.admin, user.verified) {
        (true, _) => "admin".red(),
        (false, true) => "verified".green(),
        (false, false) => "unverified".dimmed(),
    };
    println!(
        "{} {} [{}] -> {}#{}",
        format!("user#{}", user.index).yellow(),
        user.username.bold(),
        badge,
        user.entity_type,
        user.entity_id
    );
}

fn print_request(request: &ConnectRequest) {
    let state = if request.approved {
        "approved".green()
    } else {
        "pending".yellow()
    };
    println!(
        "{} user#{} -> {}#{} [{}]",
        format!("request#{}", request.index).yellow(),
        request.user_id,
        request.actor_kind,
        request.actor_id,
        state
    );
}

fn cmd_add(db: &Database, out: &Output, args: AddArgs) -> anyhow::Result<()> {
    if args.kind.parent_kind().is_some() && args.parent.is_none() {
        anyhow::bail!("a {} needs --parent", args.kind);
    }
    let mut actor = AnyActor::new(args.kind, args.name, args.parent.as_deref());
    db.save_actor(&mut actor)?;
    if matches!(out.format, OutputFormat::Text) {
        print!("{} ", "✓".green().bold());
    }
    out.emit(&actor, print_actor)
}

fn cmd_search(db: &Database, out: &Output, args: SearchArgs) -> anyhow::Result<()> {
    let kind = args.kind.as_str();
    match &args.parent {
        Some(parent) => {
            let actor = db.resolve_actor_by_name(kind, &args.name, Some(parent))?;
            out.emit(&actor, print_actor)
        }
        None => {
            let actors = db.search_actors(kind, &args.name)?;
            out.emit_all(&actors, print_actor, "No matches.")
        }
    }
}

fn cmd_pledge(db: &Database, out: &Output, action: PledgeAction) -> anyhow::Result<()> {
    match action {
        PledgeAction::Add {
            kind,
            id,
            pledge_type,
            base_year,
            target_year,
            goal,
            regulatory,
        } => {
            let mut actor = db.retrieve_actor(kind, id)?;
            let mut draft = Pledge::new(kind, id, pledge_type)
                .years(base_year, target_year)
                .goal(goal);
            draft.regulatory = regulatory;
            let pledge = db.add_pledge(&mut actor, draft)?;
            out.emit(&pledge, print_pledge)
        }
        PledgeAction::List { kind, id } => {
            let pledges = db.retrieve_actor(kind, id)?.get_pledges(db)?;
            out.emit_all(&pledges, print_pledge, "No pledges.")
        }
    }
}

fn cmd_user(db: &Database, out: &Output, action: UserAction) -> anyhow::Result<()> {
    match action {
        UserAction::Add {
            username,
            pwhash,
            email,
            entity_type,
            entity_name,
            entity_parent,
        } => {
            let user = db.new_user(
                &username,
                &pwhash,
                &email,
                &entity_type,
                &entity_name,
                entity_parent.as_deref(),
            )?;
            out.emit(&user, print_user)
        }
        UserAction::Show { username } => {
            let user = db.retrieve_user_by_username(&username)?;
            out.emit(&user, print_user)?;
            let actor = db.user_actor(&user)?;
            out.emit(&actor, print_actor)
        }
        UserAction::Validate { username, pwhash } => {
            let user = db.validate_user(&username, &pwhash)?;
            out.emit(&user, print_user)
        }
        UserAction::Update(args) => {
            let update = match (args.email, args.new_pwhash, args.new_username) {
                (Some(email), _, _) => UserUpdate::Email(email),
                (_, Some(pwhash), _) => UserUpdate::Pwhash(pwhash),
                (_, _, Some(username)) => UserUpdate::Username(username),
                (None, None, None) => anyhow::bail!("nothing to update"),
            };
            let user = db.update_user(&args.username, &args.pwhash, update)?;
            out.emit(&user, print_user)
        }
        UserAction::Delete { id } => {
            db.delete_user(id)?;
            println!("Deleted user {}", id.to_string().yellow());
            Ok(())
        }
    }
}

fn cmd_request(db: &Database, out: &Output, action: RequestAction) -> anyhow::Result<()> {
    match action {
        RequestAction::New { username, kind, id } => {
            let user = db.retrieve_user_by_username(&username)?;
            let request = db.request_connection(&user, kind, id)?;
            out.emit(&request, print_request)
        }
        RequestAction::Approve { id } => {
            let request = db.approve_request(id)?;
            out.emit(&request, print_request)
        }
        RequestAction::Pending => {
            let pending = db.pending_requests()?;
            out.emit_all(&pending, print_request, "No pending requests.")
        }
    }
}
