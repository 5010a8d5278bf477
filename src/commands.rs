use crate::configuration::get_configuration;
use crate::database::configure_database;

#[tracing::instrument(name = "Run custom command")]
pub async fn run_custom_commands(args: Vec<String>) -> Result<(), anyhow::Error> {
    if args.len() < 2 {
        eprintln!("Invalid command. Please provide a valid command.");
        return Ok(());
    }
    let command = args[1].as_str();

    match command {
        "migrate" => {
            let configuration = get_configuration()?;
            configure_database(&configuration.database).await?;
        }
        _ => {
            eprintln!("Unknown command: {}. Please use a valid command.", command);
        }
    }

    Ok(())
}
