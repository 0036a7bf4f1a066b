//! flintdb - CLI client

use std::sync::Arc;

use anyhow::Result;
use flintdb::catalog::Registry;
use flintdb::executor;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

/// Print welcome banner
fn print_banner() {
    println!(
        r#"
  __ _ _       _      _ _
 / _| (_)_ __ | |_ __| | |__
| |_| | | '_ \| __/ _` | '_ \
|  _| | | | | | || (_| | |_) |
|_| |_|_|_| |_|\__\__,_|_.__/

 A minimal relational data engine
 Type '.help' for help, '.quit' to exit
"#
    );
}

/// Print help message
fn print_help() {
    println!(
        r#"
Commands:
  .help              Show this help message
  .quit              Exit flintdb
  .dbs               List databases
  .createdb <name>   Create a database
  .use <name>        Switch current database
  .tables            List tables in the current database

Statements:
  CREATE TABLE ...   Create a new table
  DROP TABLE ...     Drop a table
  INSERT INTO ...    Insert a row
  SELECT ...         Query data
  UPDATE ...         Update a row
  DELETE FROM ...    Delete a row

Examples:
  CREATE TABLE users (id int, username string UNIQUE, age int);
  INSERT INTO users VALUES (1, 'alice', 30);
  SELECT * FROM users WHERE id = 1;
  SELECT * FROM users JOIN orders ON users.id = orders.user_id;
"#
    );
}

/// Handle a dot command. Returns `false` when the user asked to quit.
fn handle_special_command(cmd: &str, registry: &Registry, current_db: &mut String) -> bool {
    let parts: Vec<&str> = cmd.split_whitespace().collect();

    match parts.first().copied() {
        Some(".help") => print_help(),
        Some(".quit") | Some(".exit") => {
            println!("Goodbye!");
            return false;
        }
        Some(".dbs") => {
            for name in registry.database_names() {
                let marker = if name == *current_db { "*" } else { " " };
                println!("{} {}", marker, name);
            }
        }
        Some(".createdb") => {
            if let Some(name) = parts.get(1) {
                match registry.create_database(name) {
                    Ok(_) => println!("Database '{}' created.", name),
                    Err(e) => eprintln!("Error: {}", e),
                }
            } else {
                eprintln!("Usage: .createdb <name>");
            }
        }
        Some(".use") => {
            if let Some(name) = parts.get(1) {
                match registry.database(name) {
                    Ok(_) => {
                        *current_db = name.to_string();
                        println!("Using database '{}'.", name);
                    }
                    Err(e) => eprintln!("Error: {}", e),
                }
            } else {
                eprintln!("Usage: .use <name>");
            }
        }
        Some(".tables") => match registry.database(current_db) {
            Ok(db) => {
                let names = db.table_names();
                if names.is_empty() {
                    println!("No tables.");
                } else {
                    for name in names {
                        println!("  {}", name);
                    }
                }
            }
            Err(e) => eprintln!("Error: {}", e),
        },
        Some(cmd) => {
            eprintln!("Unknown command: {}", cmd);
            eprintln!("Type '.help' for available commands.");
        }
        None => {}
    }

    true
}

/// Main REPL loop
fn run_repl(registry: Arc<Registry>) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    let mut current_db = "default".to_string();

    print_banner();

    loop {
        let prompt = format!("{}> ", current_db);
        match editor.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                editor.add_history_entry(trimmed)?;

                if trimmed.starts_with('.') {
                    if !handle_special_command(trimmed, &registry, &mut current_db) {
                        break;
                    }
                    continue;
                }

                match registry.database(&current_db) {
                    Ok(db) => println!("{}", executor::run_to_text(&db, trimmed)),
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(e) => {
                eprintln!("Error reading input: {}", e);
                break;
            }
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let data_dir = std::env::args()
        .skip_while(|a| a != "--data-dir")
        .nth(1)
        .unwrap_or_else(|| "data".to_string());

    let registry = Arc::new(Registry::new(&data_dir)?);
    registry.bootstrap_default()?;

    run_repl(registry)
}
