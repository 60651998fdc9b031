//! The `types` subcommands: catalog administration against the store.
//!
//! These act on the database file directly; the running appliance sees
//! catalog changes on its next analyzer tick. Display-bus bookkeeping is
//! an in-process concern of the REST collaborator, not of this offline
//! admin path.

use std::path::PathBuf;

use loadscope_core::{DataType, TrafficStore};

use crate::cli::{TypesArgs, TypesCommand};
use crate::error::CliError;

pub async fn execute(config_path: Option<PathBuf>, args: TypesArgs) -> Result<(), CliError> {
    let app = loadscope_config::load(config_path.as_deref())?;
    let store = TrafficStore::open(&app.store_path)?;

    match args.command {
        TypesCommand::List => {
            let types = store.list_data_types().await?;
            print_json(&types)?;
        }

        TypesCommand::Show { id } => {
            let data_type = store.get_data_type(id).await?;
            print_json(&data_type)?;
        }

        TypesCommand::Create {
            name,
            network_protocol,
            transport_protocol,
            port,
            forecasting,
        } => {
            let created = store
                .create_data_type(&DataType {
                    id: 0,
                    name,
                    forecasting,
                    network_protocol,
                    transport_protocol,
                    port,
                })
                .await?;
            print_json(&created)?;
        }

        TypesCommand::Set {
            id,
            name,
            network_protocol,
            transport_protocol,
            port,
            forecasting,
        } => {
            let mut spec = store.get_data_type(id).await?;
            if let Some(name) = name {
                spec.name = name;
            }
            if let Some(network_protocol) = network_protocol {
                spec.network_protocol = network_protocol;
            }
            if let Some(transport_protocol) = transport_protocol {
                spec.transport_protocol = transport_protocol;
            }
            if let Some(port) = port {
                spec.port = port;
            }
            if let Some(forecasting) = forecasting {
                spec.forecasting = forecasting;
            }
            let updated = store.update_data_type(id, &spec).await?;
            print_json(&updated)?;
        }

        TypesCommand::Rm { id } => {
            let removed = store.delete_data_type(id).await?;
            print_json(&removed)?;
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|error| CliError::Core(error.to_string()))?;
    println!("{json}");
    Ok(())
}
