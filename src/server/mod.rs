//! TCP server for flintdb
//!
//! This module implements a simple line-oriented TCP server. Each client
//! connection gets its own thread and its own current-database selection;
//! dot-commands manage databases, everything else is executed as a command
//! against the selected database.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use tracing::{error, info};

use crate::catalog::Registry;
use crate::error::Result;
use crate::executor;

/// Default server port
pub const DEFAULT_PORT: u16 = 7171;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// Create a new server config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the host address
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Get the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// flintdb TCP server
pub struct Server {
    config: ServerConfig,
    registry: Arc<Registry>,
}

impl Server {
    /// Create a new server over an existing registry
    pub fn new(config: ServerConfig, registry: Arc<Registry>) -> Self {
        Self { config, registry }
    }

    /// Start the server and listen for connections
    pub fn start(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_address())?;
        info!(addr = self.config.bind_address(), "server listening");

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let registry = self.registry.clone();
                    thread::spawn(move || {
                        if let Err(e) = handle_connection(stream, registry) {
                            error!(error = %e, "connection error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                }
            }
        }

        Ok(())
    }
}

/// Handle a client connection. Each connection tracks its own current
/// database, starting at `default`.
fn handle_connection(stream: TcpStream, registry: Arc<Registry>) -> Result<()> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    info!(peer = peer_addr, "client connected");

    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = stream;
    let mut current_db = "default".to_string();

    send_response(
        &mut writer,
        "flintdb server\nType .help for commands.\n",
    )?;

    let mut line = String::new();
    loop {
        line.clear();

        match reader.read_line(&mut line) {
            Ok(0) => {
                info!(peer = peer_addr, "client disconnected");
                break;
            }
            Ok(_) => {
                let command = line.trim();

                if command.is_empty() {
                    continue;
                }

                if command.starts_with('.') {
                    if !handle_dot_command(&mut writer, &registry, &mut current_db, command)? {
                        break;
                    }
                    continue;
                }

                let response = match registry.database(&current_db) {
                    Ok(db) => executor::run_to_text(&db, command),
                    Err(e) => format!("Error: {}", e),
                };
                send_response(&mut writer, &format!("{}\n", response))?;
            }
            Err(e) => {
                error!(peer = peer_addr, error = %e, "read error");
                break;
            }
        }
    }

    Ok(())
}

/// Handle a dot-command. Returns `false` when the client asked to quit.
fn handle_dot_command(
    writer: &mut TcpStream,
    registry: &Registry,
    current_db: &mut String,
    command: &str,
) -> Result<bool> {
    let mut parts = command.split_whitespace();
    let head = parts.next().unwrap_or("");
    let arg = parts.next();

    match (head, arg) {
        (".quit", _) | (".exit", _) => {
            send_response(writer, "Goodbye!\n")?;
            return Ok(false);
        }
        (".help", _) => {
            send_response(
                writer,
                "Commands:\n  \
                 .dbs              list databases\n  \
                 .createdb <name>  create a database\n  \
                 .use <name>       switch current database\n  \
                 .tables           list tables in the current database\n  \
                 .quit             disconnect\n",
            )?;
        }
        (".dbs", _) => {
            let names = registry.database_names();
            if names.is_empty() {
                send_response(writer, "No databases.\n")?;
            } else {
                send_response(writer, &format!("{}\n", names.join("\n")))?;
            }
        }
        (".createdb", Some(name)) => {
            let response = match registry.create_database(name) {
                Ok(_) => format!("Database '{}' created.\n", name),
                Err(e) => format!("Error: {}\n", e),
            };
            send_response(writer, &response)?;
        }
        (".createdb", None) => {
            send_response(writer, "Usage: .createdb <name>\n")?;
        }
        (".use", Some(name)) => {
            let response = match registry.database(name) {
                Ok(_) => {
                    *current_db = name.to_string();
                    format!("Using database '{}'.\n", name)
                }
                Err(e) => format!("Error: {}\n", e),
            };
            send_response(writer, &response)?;
        }
        (".use", None) => {
            send_response(writer, "Usage: .use <name>\n")?;
        }
        (".tables", _) => {
            let response = match registry.database(current_db) {
                Ok(db) => {
                    let names = db.table_names();
                    if names.is_empty() {
                        "No tables.\n".to_string()
                    } else {
                        format!("{}\n", names.join("\n"))
                    }
                }
                Err(e) => format!("Error: {}\n", e),
            };
            send_response(writer, &response)?;
        }
        _ => {
            send_response(writer, &format!("Unknown command: {}\n", command))?;
        }
    }

    Ok(true)
}

/// Send a response to the client
fn send_response(writer: &mut TcpStream, message: &str) -> Result<()> {
    writer.write_all(message.as_bytes())?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config() {
        let config = ServerConfig::new().host("0.0.0.0").port(5500);

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 5500);
        assert_eq!(config.bind_address(), "0.0.0.0:5500");
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address(), format!("127.0.0.1:{}", DEFAULT_PORT));
    }
}
