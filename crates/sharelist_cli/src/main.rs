//! Smoke-test CLI for the shared-list core.
//!
//! # Usage
//! - `sharelist_cli` prints ping and version.
//! - `sharelist_cli create <user_id> <email> <title>` creates a list.
//! - `sharelist_cli lists <user_id> <email>` prints every visible list.
//!
//! The database comes from `SHARELIST_DB_PATH` (in-memory when unset).

use log::info;
use sharelist_core::{
    CoreConfig, ListService, Notice, SessionUser, SqliteListRepository, UserAction,
};
use std::process::ExitCode;
use std::sync::mpsc;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), String> {
    let Some(command) = args.first() else {
        println!("sharelist_core ping={}", sharelist_core::ping());
        println!("sharelist_core version={}", sharelist_core::core_version());
        return Ok(());
    };

    let config = CoreConfig::from_env();
    config.init_logging().map_err(|err| err.to_string())?;
    let store = config.open_store().map_err(|err| err.to_string())?;
    let service = ListService::new(SqliteListRepository::new(store));
    info!("event=cli_command module=cli status=start command={command}");

    match (command.as_str(), &args[1..]) {
        ("create", [user_id, email, title]) => {
            let user = session(user_id, email)?;
            let result = service.create_list(&user, title);
            let notice = Notice::for_outcome(UserAction::CreateList, &result);
            println!("{}", notice.message);
            let list_id = result.map_err(|err| err.to_string())?;
            println!("{list_id}");
            Ok(())
        }
        ("lists", [user_id, email]) => {
            let user = session(user_id, email)?;
            let (sender, receiver) = mpsc::channel();
            let subscription = service
                .watch_lists(&user, move |lists| {
                    let _ = sender.send(lists);
                })
                .map_err(|err| err.to_string())?;
            // Every source tick emits; the last one holds the complete set.
            let lists = receiver
                .try_iter()
                .last()
                .ok_or_else(|| "no snapshot delivered".to_string())?;
            subscription.cancel();
            for list in lists {
                let role = if list.owner_id == user.id {
                    "owner"
                } else {
                    list.role_of(&user.email).map_or("-", |role| role.as_str())
                };
                println!("{}\t{}\t{}", list.id, role, list.title);
            }
            Ok(())
        }
        _ => Err(format!("unknown command or arguments: {}", args.join(" "))),
    }
}

fn session(user_id: &str, email: &str) -> Result<SessionUser, String> {
    SessionUser::new(user_id, email).map_err(|err| err.to_string())
}
