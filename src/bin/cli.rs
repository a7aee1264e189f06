//! StreamKV CLI Client
//!
//! Command-line interface for interacting with StreamKV.

use std::io::BufReader;
use std::net::TcpStream;
use std::process::ExitCode;

use bytes::Bytes;
use clap::{Parser, Subcommand};
use streamkv::protocol::{read_value, write_value, Value};

/// StreamKV CLI
#[derive(Parser, Debug)]
#[command(name = "streamkv-cli")]
#[command(about = "CLI for the StreamKV stream store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:6380")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ping the server
    Ping {
        /// Optional message to echo back
        message: Option<String>,
    },

    /// Echo text back
    Echo {
        #[arg(required = true)]
        words: Vec<String>,
    },

    /// Append an entry to a stream
    Xadd {
        /// Stream name
        key: String,

        /// Entry id (`*` for auto)
        id: String,

        /// Field/value pairs
        #[arg(required = true, num_args = 2..)]
        fields: Vec<String>,
    },

    /// Number of entries in a stream
    Xlen {
        /// Stream name
        key: String,
    },

    /// Entries in an id range
    Xrange {
        /// Stream name
        key: String,

        /// Start id (`-` for the beginning)
        #[arg(default_value = "-", allow_hyphen_values = true)]
        start: String,

        /// End id (`+` for the end)
        #[arg(default_value = "+")]
        end: String,

        /// Maximum number of entries
        #[arg(short, long)]
        count: Option<u64>,
    },

    /// Delete entries by id
    Xdel {
        /// Stream name
        key: String,

        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Trim a stream to its newest entries
    Xtrim {
        /// Stream name
        key: String,

        /// Entries to keep
        maxlen: u64,
    },

    /// Read entries newer than the given ids
    Xread {
        /// Stream names followed by the same number of ids
        #[arg(required = true)]
        streams: Vec<String>,
    },

    /// Send arbitrary tokens as a command
    Raw {
        #[arg(required = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

impl Commands {
    /// Command line as sent on the wire
    fn into_args(self) -> Vec<String> {
        let mut args = Vec::new();
        match self {
            Commands::Ping { message } => {
                args.push("PING".to_string());
                args.extend(message);
            }
            Commands::Echo { words } => {
                args.push("ECHO".to_string());
                args.extend(words);
            }
            Commands::Xadd { key, id, fields } => {
                args.extend(["XADD".to_string(), key, id]);
                args.extend(fields);
            }
            Commands::Xlen { key } => args.extend(["XLEN".to_string(), key]),
            Commands::Xrange {
                key,
                start,
                end,
                count,
            } => {
                args.extend(["XRANGE".to_string(), key, start, end]);
                if let Some(count) = count {
                    args.extend(["COUNT".to_string(), count.to_string()]);
                }
            }
            Commands::Xdel { key, ids } => {
                args.extend(["XDEL".to_string(), key]);
                args.extend(ids);
            }
            Commands::Xtrim { key, maxlen } => {
                args.extend(["XTRIM".to_string(), key, "MAXLEN".to_string(), maxlen.to_string()]);
            }
            Commands::Xread { streams } => {
                args.extend(["XREAD".to_string(), "STREAMS".to_string()]);
                args.extend(streams);
            }
            Commands::Raw { args: raw } => args.extend(raw),
        }
        args
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(&args.server, args.command.into_args()) {
        Ok(reply) => {
            println!("{}", render(&reply, 0));
            if reply.is_error() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Could not talk to {}: {}", args.server, e);
            ExitCode::FAILURE
        }
    }
}

/// Send one command and wait for its reply
fn run(server: &str, args: Vec<String>) -> streamkv::Result<Value> {
    let stream = TcpStream::connect(server)?;
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = stream;

    let request = Value::array(
        args.into_iter()
            .map(|arg| Value::bulk(Bytes::from(arg)))
            .collect(),
    );
    write_value(&mut writer, &request)?;
    read_value(&mut reader)
}

/// Format a reply the way redis-cli does
fn render(value: &Value, indent: usize) -> String {
    match value {
        Value::SimpleString(text) => text.clone(),
        Value::Error(text) => format!("(error) {}", text),
        Value::Integer(n) => format!("(integer) {}", n),
        Value::BulkString(Some(data)) => format!("\"{}\"", String::from_utf8_lossy(data)),
        Value::BulkString(None) | Value::Array(None) => "(nil)".to_string(),
        Value::Array(Some(items)) if items.is_empty() => "(empty array)".to_string(),
        Value::Array(Some(items)) => {
            let width = items.len().to_string().len();
            let separator = format!("\n{}", " ".repeat(indent));
            items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let prefix = format!("{:>width$}) ", i + 1, width = width);
                    let body = render(item, indent + prefix.len());
                    format!("{}{}", prefix, body)
                })
                .collect::<Vec<_>>()
                .join(&separator)
        }
    }
}
