//! Protocol Module
//!
//! Defines the textual wire protocol shared by clients, the server and the
//! append-only file.
//!
//! ## Wire Format
//!
//! Every value starts with a one-byte type marker:
//!
//! | Marker | Meaning       | Payload                                   |
//! |--------|---------------|-------------------------------------------|
//! | `*`    | Array         | decimal count `\r\n`, then count values   |
//! | `$`    | Bulk string   | decimal byte length `\r\n`, bytes, `\r\n` |
//! | `+`    | Simple string | text `\r\n`                               |
//! | `-`    | Error         | text `\r\n`                               |
//! | `:`    | Integer       | decimal `\r\n`                            |
//! | fixed  | Null bulk     | `$-1\r\n`                                 |
//!
//! ### Requests
//! A request is an array of bulk strings: the command name followed by its
//! arguments, e.g. `*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n`.

mod value;
mod decoder;
mod encoder;
mod command;

pub use value::{Value, ValueKind, CRLF, NULL_BULK};
pub use decoder::{decode, read_value, Decoder};
pub use encoder::{encode, encode_into, write_value};
pub use command::{Command, CommandType};
