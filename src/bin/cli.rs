//! respkv CLI Client
//!
//! Command-line interface for interacting with a respkv server.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use respkv::protocol::{write_value, Decoder, Value};

/// respkv CLI
#[derive(Parser, Debug)]
#[command(name = "respkv-cli")]
#[command(about = "CLI for the respkv key-value server")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ping the server, optionally with a message to echo
    Ping {
        message: Option<String>,
    },

    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Get one field of a hash
    Hget {
        hash: String,
        field: String,
    },

    /// Set one field of a hash
    Hset {
        hash: String,
        field: String,
        value: String,
    },

    /// Get all fields of a hash
    Hgetall {
        hash: String,
    },
}

impl Commands {
    fn to_request(&self) -> Value {
        match self {
            Commands::Ping { message: None } => Value::command(&["PING"]),
            Commands::Ping {
                message: Some(message),
            } => Value::command(&["PING", message.as_str()]),
            Commands::Get { key } => Value::command(&["GET", key.as_str()]),
            Commands::Set { key, value } => Value::command(&["SET", key.as_str(), value.as_str()]),
            Commands::Hget { hash, field } => {
                Value::command(&["HGET", hash.as_str(), field.as_str()])
            }
            Commands::Hset { hash, field, value } => {
                Value::command(&["HSET", hash.as_str(), field.as_str(), value.as_str()])
            }
            Commands::Hgetall { hash } => Value::command(&["HGETALL", hash.as_str()]),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(&args) {
        Ok(reply) => {
            print_reply(&reply, 0);
            if reply.is_error() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("(error) {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> respkv::Result<Value> {
    let stream = TcpStream::connect(&args.server)?;
    let mut writer = BufWriter::new(stream.try_clone()?);
    let mut decoder = Decoder::new(BufReader::new(stream));

    write_value(&mut writer, &args.command.to_request())?;
    decoder.read_value()
}

/// Print a reply in redis-cli style
fn print_reply(reply: &Value, indent: usize) {
    let pad = " ".repeat(indent);
    match reply {
        Value::Simple(text) => println!("{}{}", pad, text),
        Value::Error(text) => println!("{}(error) {}", pad, text),
        Value::Integer(n) => println!("{}(integer) {}", pad, n),
        Value::Bulk(data) => println!("{}\"{}\"", pad, String::from_utf8_lossy(data)),
        Value::Null => println!("{}(nil)", pad),
        Value::Array(items) if items.is_empty() => println!("{}(empty array)", pad),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                print!("{}{}) ", pad, i + 1);
                match item {
                    Value::Array(_) => {
                        println!();
                        print_reply(item, indent + 3);
                    }
                    _ => print_reply(item, 0),
                }
            }
        }
    }
}
