//! Line-oriented command encoding for the interpreter gateway.
//!
//! Only method calls with string arguments are emitted, and only the scalar
//! reply kinds the entry point can return are decoded.

use super::GatewayError;

pub const CALL_COMMAND: &str = "c";
pub const END_COMMAND: &str = "e";

const REPLY_PREFIX: char = '!';
const SUCCESS: char = 'y';
const ERROR: char = 'x';

/// Decoded reply payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyValue {
    Void,
    Null,
    Str(String),
    Int(i64),
    Double(f64),
    Bool(bool),
}

impl ReplyValue {
    /// Textual form used when the caller wants a string.
    pub fn into_text(self) -> String {
        match self {
            ReplyValue::Void | ReplyValue::Null => String::new(),
            ReplyValue::Str(s) => s,
            ReplyValue::Int(i) => i.to_string(),
            ReplyValue::Double(d) => d.to_string(),
            ReplyValue::Bool(b) => b.to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ReplyValue::Void => "void",
            ReplyValue::Null => "null",
            ReplyValue::Str(_) => "string",
            ReplyValue::Int(_) => "integer",
            ReplyValue::Double(_) => "double",
            ReplyValue::Bool(_) => "boolean",
        }
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Encode a call of `method` on `target` with string arguments.
pub fn encode_call(target: &str, method: &str, args: &[&str]) -> String {
    let mut cmd = String::new();
    cmd.push_str(CALL_COMMAND);
    cmd.push('\n');
    cmd.push_str(target);
    cmd.push('\n');
    cmd.push_str(method);
    cmd.push('\n');
    for arg in args {
        cmd.push('s');
        cmd.push_str(&escape(arg));
        cmd.push('\n');
    }
    cmd.push_str(END_COMMAND);
    cmd.push('\n');
    cmd
}

/// Decode one reply line (trailing newline optional).
pub fn decode_reply(line: &str) -> Result<ReplyValue, GatewayError> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let line = line.strip_suffix('\r').unwrap_or(line);

    let mut chars = line.chars();
    if chars.next() != Some(REPLY_PREFIX) {
        return Err(GatewayError::MalformedReply(line.to_string()));
    }
    let status = chars
        .next()
        .ok_or_else(|| GatewayError::MalformedReply(line.to_string()))?;
    let rest = chars.as_str();

    match status {
        SUCCESS => decode_value(rest, line),
        ERROR => {
            // Error payloads are usually an escaped message string; anything
            // else (e.g. a reference to a remote exception) is reported verbatim.
            let message = match rest.strip_prefix('s') {
                Some(msg) => unescape(msg),
                None => rest.to_string(),
            };
            Err(GatewayError::Remote(message))
        }
        _ => Err(GatewayError::MalformedReply(line.to_string())),
    }
}

fn decode_value(payload: &str, line: &str) -> Result<ReplyValue, GatewayError> {
    let mut chars = payload.chars();
    let tag = chars
        .next()
        .ok_or_else(|| GatewayError::MalformedReply(line.to_string()))?;
    let body = chars.as_str();
    let malformed = || GatewayError::MalformedReply(line.to_string());

    match tag {
        'v' => Ok(ReplyValue::Void),
        'n' => Ok(ReplyValue::Null),
        's' => Ok(ReplyValue::Str(unescape(body))),
        'i' | 'L' => body.parse().map(ReplyValue::Int).map_err(|_| malformed()),
        'd' => body.parse().map(ReplyValue::Double).map_err(|_| malformed()),
        'b' => match body {
            "true" => Ok(ReplyValue::Bool(true)),
            "false" => Ok(ReplyValue::Bool(false)),
            _ => Err(malformed()),
        },
        other => Err(GatewayError::UnsupportedReply(other)),
    }
}
