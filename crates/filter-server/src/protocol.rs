//! Wire protocol
//!
//! Requests are newline-terminated ASCII lines of exactly two
//! whitespace-separated fields, `COMMAND TARGET_URL`. Every request gets one
//! status reply:
//!
//! | Request        | Reply                                               |
//! |----------------|-----------------------------------------------------|
//! | `POST <url>`   | `201 Created`                                       |
//! | `GET <url>`    | `200 Ok`, blank line, `true true`/`true false`/`false` |
//! | `DELETE <url>` | `204 No Content` or `404 Not Found`                 |
//! | anything else  | `400 Bad Request`                                   |

use url_filter::{Command, Presence, Reply};

use crate::error::ProtocolError;

pub const CREATED: &str = "201 Created\n";
pub const NO_CONTENT: &str = "204 No Content\n";
pub const NOT_FOUND: &str = "404 Not Found\n";
pub const BAD_REQUEST: &str = "400 Bad Request\n";
pub const OK_CONFIRMED: &str = "200 Ok\n\ntrue true\n";
pub const OK_UNCONFIRMED: &str = "200 Ok\n\ntrue false\n";
pub const OK_ABSENT: &str = "200 Ok\n\nfalse\n";

/// Parse one request line (without its newline)
pub fn parse_line(line: &str) -> Result<Command, ProtocolError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    match fields.as_slice() {
        [] => Err(ProtocolError::Empty),
        [command, url] => {
            let url = url.to_string();
            match *command {
                "POST" => Ok(Command::Post(url)),
                "GET" => Ok(Command::Get(url)),
                "DELETE" => Ok(Command::Delete(url)),
                other => Err(ProtocolError::UnknownCommand(other.to_string())),
            }
        }
        _ => Err(ProtocolError::FieldCount(fields.len())),
    }
}

/// Status text for a reply
pub fn render(reply: Reply) -> &'static str {
    match reply {
        Reply::Created { .. } => CREATED,
        Reply::Presence(Presence::Confirmed) => OK_CONFIRMED,
        Reply::Presence(Presence::Unconfirmed) => OK_UNCONFIRMED,
        Reply::Presence(Presence::Absent) => OK_ABSENT,
        Reply::NoContent => NO_CONTENT,
        Reply::NotFound => NOT_FOUND,
        Reply::BadRequest => BAD_REQUEST,
    }
}
