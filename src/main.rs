//! Registry administration tool
//!
//! Runs one registry operation in its own transaction and prints the result
//! as JSON:
//!
//! ```text
//! registry_admin [--env dev] merge-contact SRC DST REGISTRAR [--dry-run] [--poll]
//! registry_admin [--env dev] transfer-domain ID REGISTRAR AUTHINFO [--poll]
//! registry_admin [--env dev] transfer-contact|transfer-nsset|transfer-keyset ...
//! registry_admin [--env dev] update-states [OBJECT_ID]
//! ```
//!
//! The transaction commits on success and rolls back on failure or dry run.

use std::sync::Arc;

use anyhow::{Context, bail};
use serde_json::{Value, json};

use registry_ops::config::AppConfig;
use registry_ops::db::{Database, OperationContext};
use registry_ops::merge_contact::{DefaultDiffContacts, MergeContact, create_poll_messages};
use registry_ops::object_state::PerformObjectStateRequest;
use registry_ops::poll::{CreatePollMessage, PollMessageType};
use registry_ops::transfer::{
    TransferContact, TransferDomain, TransferError, TransferKeyset, TransferNsset,
};
use registry_ops::{HistoryId, ObjectId, ObjectType};

// ============================================================
// ARGUMENTS
// ============================================================

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

fn has_flag(flag: &str) -> bool {
    std::env::args().any(|a| a == flag)
}

/// Command line arguments without the program name, flags and `--env` value
fn positional_args() -> Vec<String> {
    let mut positional = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--env" || arg == "-e" {
            args.next();
        } else if !arg.starts_with("--") {
            positional.push(arg);
        }
    }
    positional
}

#[derive(Debug)]
enum Command {
    MergeContact {
        src: String,
        dst: String,
        registrar: String,
        dry_run: bool,
        poll: bool,
    },
    Transfer {
        object_type: ObjectType,
        id: ObjectId,
        registrar: String,
        authinfo: String,
        poll: bool,
    },
    UpdateStates {
        object_id: Option<ObjectId>,
    },
}

fn parse_command(args: &[String]) -> anyhow::Result<Command> {
    let Some((name, rest)) = args.split_first() else {
        bail!("missing command");
    };

    match (name.as_str(), rest) {
        ("merge-contact", [src, dst, registrar]) => Ok(Command::MergeContact {
            src: src.clone(),
            dst: dst.clone(),
            registrar: registrar.clone(),
            dry_run: has_flag("--dry-run"),
            poll: has_flag("--poll"),
        }),
        ("update-states", []) => Ok(Command::UpdateStates { object_id: None }),
        ("update-states", [id]) => Ok(Command::UpdateStates {
            object_id: Some(id.parse().context("invalid object id")?),
        }),
        (cmd, [id, registrar, authinfo]) if cmd.starts_with("transfer-") => {
            let object_type: ObjectType = cmd["transfer-".len()..]
                .parse()
                .map_err(|_| anyhow::anyhow!("unknown object type in {}", cmd))?;
            Ok(Command::Transfer {
                object_type,
                id: id.parse().context("invalid object id")?,
                registrar: registrar.clone(),
                authinfo: authinfo.clone(),
                poll: has_flag("--poll"),
            })
        }
        (cmd, _) => bail!("unknown command or wrong arguments: {}", cmd),
    }
}

// ============================================================
// EXECUTION
// ============================================================

async fn transfer(
    ctx: &mut OperationContext,
    object_type: ObjectType,
    id: ObjectId,
    registrar: &str,
    authinfo: &str,
) -> Result<HistoryId, TransferError> {
    match object_type {
        ObjectType::Domain => TransferDomain::new(id, registrar, authinfo).exec(ctx).await,
        ObjectType::Contact => TransferContact::new(id, registrar, authinfo).exec(ctx).await,
        ObjectType::Nsset => TransferNsset::new(id, registrar, authinfo).exec(ctx).await,
        ObjectType::Keyset => TransferKeyset::new(id, registrar, authinfo).exec(ctx).await,
    }
}

/// Run the command; `Ok((output, commit))`
async fn run(ctx: &mut OperationContext, command: Command) -> anyhow::Result<(Value, bool)> {
    match command {
        Command::MergeContact {
            src,
            dst,
            registrar,
            dry_run,
            poll,
        } => {
            let merge =
                MergeContact::new(src, dst, registrar, Some(Arc::new(DefaultDiffContacts)))?;
            if dry_run {
                let output = merge.exec_dry_run(ctx).await?;
                return Ok((serde_json::to_value(&output)?, false));
            }

            let output = merge.exec(ctx).await?;
            let messages = if poll {
                create_poll_messages(&output, ctx).await?
            } else {
                Vec::new()
            };
            Ok((
                json!({ "merge": output, "poll_messages": messages }),
                true,
            ))
        }
        Command::Transfer {
            object_type,
            id,
            registrar,
            authinfo,
            poll,
        } => {
            let history_id = transfer(ctx, object_type, id, &registrar, &authinfo).await?;
            let message = if poll {
                Some(
                    CreatePollMessage::new(PollMessageType::transfer_of(object_type))
                        .exec(ctx, history_id)
                        .await?,
                )
            } else {
                None
            };
            Ok((
                json!({
                    "object_type": object_type,
                    "id": id,
                    "history_id": history_id,
                    "poll_message": message,
                }),
                true,
            ))
        }
        Command::UpdateStates { object_id } => {
            PerformObjectStateRequest::new(object_id).exec(ctx).await?;
            Ok((json!({ "object_id": object_id }), true))
        }
    }
}

// ============================================================
// MAIN
// ============================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let app_config = AppConfig::load(&env)?;
    let _log_guard = registry_ops::logging::init_logging(&app_config);

    let command = parse_command(&positional_args())?;
    tracing::info!(env = %env, command = ?command, "Starting registry_admin");

    let db = Database::connect(&app_config.postgres_url, &app_config.database)
        .await
        .context("Failed to connect to PostgreSQL")?;
    db.health_check()
        .await
        .context("PostgreSQL health check failed")?;
    let mut ctx = OperationContext::begin(&db).await?;

    match run(&mut ctx, command).await {
        Ok((output, commit)) => {
            if commit {
                ctx.commit().await?;
            } else {
                ctx.rollback().await?;
            }
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(e) => {
            ctx.rollback().await?;
            tracing::error!(error = %e, "Command failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_transfer() {
        match parse_command(&args(&["transfer-nsset", "42", "REG-B", "pw"])).unwrap() {
            Command::Transfer {
                object_type, id, ..
            } => {
                assert_eq!(object_type, ObjectType::Nsset);
                assert_eq!(id, 42);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_update_states() {
        assert!(matches!(
            parse_command(&args(&["update-states"])).unwrap(),
            Command::UpdateStates { object_id: None }
        ));
        assert!(matches!(
            parse_command(&args(&["update-states", "7"])).unwrap(),
            Command::UpdateStates {
                object_id: Some(7)
            }
        ));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_command(&args(&[])).is_err());
        assert!(parse_command(&args(&["transfer-zone", "1", "R", "pw"])).is_err());
        assert!(parse_command(&args(&["merge-contact", "A"])).is_err());
        assert!(parse_command(&args(&["update-states", "x"])).is_err());
    }
}
