//! Command execution.

use crate::Commands;
use colored::Colorize;
use kafkalink_client::{ClientError, Connection, ConnectionConfig};
use kafkalink_protocol::{error_string, ApiKey, Compression, ErrorCode, API_VERSION};
use serde_json::{json, Value};

/// Executes a command and returns the formatted output.
pub fn execute(
    config: &ConnectionConfig,
    as_json: bool,
    cmd: Commands,
) -> Result<String, Box<dyn std::error::Error>> {
    match cmd {
        Commands::Probe => {
            let mut conn = Connection::with_config(config.clone());
            let handle = conn.open()?;
            let peer = conn.peer_addr()?;
            let local = conn.local_addr()?;
            let candidates = conn.addresses().map(|a| a.len()).unwrap_or(0);
            conn.close();

            if as_json {
                return Ok(format_json(&json!({
                    "target": conn.to_string(),
                    "handle": handle,
                    "peer": peer.to_string(),
                    "local": local.to_string(),
                    "candidates": candidates,
                })));
            }
            Ok(format!(
                "{} {} via {} (handle {}, local {}, {} candidate address(es))",
                "Connected".green(),
                conn.to_string().cyan(),
                peer,
                handle,
                local,
                candidates
            ))
        }

        Commands::Send {
            payload,
            hex: is_hex,
            read,
        } => {
            let bytes = if is_hex {
                hex::decode(payload.trim())?
            } else {
                payload.into_bytes()
            };

            let mut conn = Connection::with_config(config.clone());
            conn.open()?;
            let sent = conn.write(&bytes)?;
            let response = if read > 0 {
                Some(read_response(&mut conn, read)?)
            } else {
                None
            };
            conn.close();

            if as_json {
                return Ok(format_json(&json!({
                    "sent": sent,
                    "received": response.as_ref().map(hex::encode),
                })));
            }
            let mut out = format!("{} {} bytes to {}", "Sent".green(), sent, conn);
            if let Some(data) = response {
                out.push_str(&format!(
                    "\n{} {} bytes: {}",
                    "Received".green(),
                    data.len(),
                    hex::encode(&data)
                ));
            }
            Ok(out)
        }

        Commands::ErrorCode { code } => {
            let description = error_string(code);
            let known = ErrorCode::from_code(code);

            if as_json {
                return Ok(format_json(&json!({
                    "code": code,
                    "name": known,
                    "description": description,
                    "retryable": known.map(|c| c.is_retryable()).unwrap_or(false),
                })));
            }
            match known {
                Some(c) if c.is_ok() => Ok(format!("{}: {}", code, description.green())),
                Some(c) if c.is_retryable() => Ok(format!(
                    "{}: {} {}",
                    code,
                    description.yellow(),
                    "(retryable)".dimmed()
                )),
                Some(_) => Ok(format!("{}: {}", code, description.red())),
                None => Ok(format!("{}: {}", code, description.dimmed())),
            }
        }

        Commands::ApiKeys => {
            if as_json {
                let keys: Vec<Value> = ApiKey::ALL
                    .iter()
                    .map(|k| json!({ "key": k.key(), "name": k.name() }))
                    .collect();
                let compression: Vec<Value> =
                    [Compression::None, Compression::Gzip, Compression::Snappy]
                        .iter()
                        .map(|c| json!({ "attribute": c.attribute(), "name": c.to_string() }))
                        .collect();
                return Ok(format_json(&json!({
                    "api_version": API_VERSION,
                    "api_keys": keys,
                    "compression": compression,
                })));
            }

            let mut out = format!("{} {}\n", "API version".bold(), API_VERSION);
            out.push_str(&format!("{}\n", "Request types".bold()));
            for key in ApiKey::ALL {
                out.push_str(&format!("  {:>2}  {}\n", key.key(), key.name().cyan()));
            }
            out.push_str(&format!("{}", "Compression".bold()));
            for c in [Compression::None, Compression::Gzip, Compression::Snappy] {
                out.push_str(&format!("\n  {:#04x}  {}", c.attribute(), c.to_string().cyan()));
            }
            Ok(out)
        }
    }
}

/// Reads exactly `len` bytes, keeping whatever arrived if the peer hangs up early.
fn read_response(conn: &mut Connection, len: usize) -> Result<Vec<u8>, ClientError> {
    let mut buf = vec![0u8; len];
    match conn.read(&mut buf) {
        Ok(_) => Ok(buf),
        Err(ClientError::ShortRead { read, source: None, .. }) => {
            tracing::warn!("Peer closed after {} of {} bytes", read, len);
            buf.truncate(read);
            Ok(buf)
        }
        Err(e) => Err(e),
    }
}

fn format_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
