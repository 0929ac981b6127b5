//! Hand-rolled parser for the fixed command grammar (SPEC_FULL.md §6).
//!
//! The grammar has six shapes total, so this is a handful of prefix/suffix
//! checks rather than a combinator pipeline or a generated parser.

use std::fmt;

use availdb_concurrency::Command;
use availdb_core::{SiteId, TxnId, VarId};

/// A line that didn't match any recognized command shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError(String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parse one already-trimmed, non-blank, non-comment line into a `Command`.
///
/// Blank lines and `//`-comment lines are the caller's concern: skipping
/// them must not advance the logical clock, so this function never sees
/// them.
pub fn parse_line(line: &str) -> Result<Command, ParseError> {
    let line = line.trim();
    let (head, args) = split_call(line)
        .ok_or_else(|| ParseError(format!("not a recognized command shape: {line}")))?;

    match head {
        "begin" => Ok(Command::Begin(one_txn(&args, line)?)),
        "end" => Ok(Command::End(one_txn(&args, line)?)),
        "R" => {
            let (txn, var) = two(&args, line)?;
            Ok(Command::Read(parse_txn(txn, line)?, parse_var(var, line)?))
        }
        "W" => {
            let (txn, var, value) = three(&args, line)?;
            Ok(Command::Write(
                parse_txn(txn, line)?,
                parse_var(var, line)?,
                parse_value(value, line)?,
            ))
        }
        "fail" => Ok(Command::Fail(one_site(&args, line)?)),
        "recover" => Ok(Command::Recover(one_site(&args, line)?)),
        "dump" => {
            if args.is_empty() {
                Ok(Command::Dump)
            } else {
                Err(ParseError(format!("dump() takes no arguments: {line}")))
            }
        }
        _ => Err(ParseError(format!("not a recognized command shape: {line}"))),
    }
}

/// Split `name(a, b, c)` into `("name", ["a", "b", "c"])`. Whitespace
/// around the parens and between arguments is insignificant.
fn split_call(line: &str) -> Option<(&str, Vec<&str>)> {
    let open = line.find('(')?;
    if !line.ends_with(')') {
        return None;
    }
    let head = line[..open].trim();
    if head.is_empty() || head.chars().any(char::is_whitespace) {
        return None;
    }
    let inner = line[open + 1..line.len() - 1].trim();
    let args = if inner.is_empty() {
        Vec::new()
    } else {
        inner.split(',').map(str::trim).collect()
    };
    Some((head, args))
}

fn one_txn(args: &[&str], line: &str) -> Result<TxnId, ParseError> {
    match args {
        [txn] => parse_txn(txn, line),
        _ => Err(ParseError(format!("expected exactly one argument: {line}"))),
    }
}

fn one_site(args: &[&str], line: &str) -> Result<SiteId, ParseError> {
    match args {
        [site] => parse_site(site, line),
        _ => Err(ParseError(format!("expected exactly one argument: {line}"))),
    }
}

fn two<'a>(args: &[&'a str], line: &str) -> Result<(&'a str, &'a str), ParseError> {
    match args {
        [a, b] => Ok((a, b)),
        _ => Err(ParseError(format!("expected exactly two arguments: {line}"))),
    }
}

fn three<'a>(args: &[&'a str], line: &str) -> Result<(&'a str, &'a str, &'a str), ParseError> {
    match args {
        [a, b, c] => Ok((a, b, c)),
        _ => Err(ParseError(format!("expected exactly three arguments: {line}"))),
    }
}

fn parse_txn(token: &str, line: &str) -> Result<TxnId, ParseError> {
    if token.is_empty() || token.chars().any(char::is_whitespace) {
        return Err(ParseError(format!("invalid transaction id {token:?}: {line}")));
    }
    Ok(TxnId::new(token))
}

fn parse_var(token: &str, line: &str) -> Result<VarId, ParseError> {
    VarId::parse(token).map_err(|e| ParseError(format!("{e}: {line}")))
}

fn parse_site(token: &str, line: &str) -> Result<SiteId, ParseError> {
    let n: u8 = token
        .parse()
        .map_err(|_| ParseError(format!("invalid site id {token:?}: {line}")))?;
    SiteId::new(n).map_err(|e| ParseError(format!("{e}: {line}")))
}

fn parse_value(token: &str, line: &str) -> Result<i64, ParseError> {
    token
        .parse()
        .map_err(|_| ParseError(format!("invalid value {token:?}: {line}")))
}
