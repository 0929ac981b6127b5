//! `Output` → line-shape formatting (SPEC_FULL.md §6).
//!
//! The engine crate is deliberately free of string formatting; this module
//! is the only place that knows the textual shapes printed to stdout/stderr.

use availdb_concurrency::Output;
use availdb_sites::SiteDump;
use availdb_core::{SiteId, VarId};
use std::collections::BTreeMap;

/// Format a successful (stdout-bound) output line. Returns `None` for
/// outputs that print nothing (`Ack`) or that are routed to stderr
/// instead (`ProtocolError`, handled by [`format_stderr`]).
///
/// `quiet` suppresses the `dump()` header line naming every variable in
/// order; it has no effect on any other output shape.
pub fn format_stdout(output: &Output, quiet: bool) -> Option<String> {
    match output {
        Output::Read { var, value } => Some(format!("{var}: {value}")),
        Output::Waiting { txn, var } => Some(format!("{txn} waits on {var}")),
        Output::Written { var, sites } => Some(format!("{var} written to sites {}", join_sites(sites))),
        Output::Committed { txn } => Some(format!("{txn} commits")),
        Output::Aborted { txn, reason } => Some(format!("{txn} aborts: {}", reason.tag())),
        Output::Dump(snapshot) => Some(format_dump(snapshot, quiet)),
        Output::Ack | Output::ProtocolError(_) => None,
    }
}

/// Format a stderr-bound output line, if this output is one.
pub fn format_stderr(output: &Output) -> Option<String> {
    match output {
        Output::ProtocolError(msg) => Some(format!("error: {msg}")),
        _ => None,
    }
}

fn join_sites(sites: &[SiteId]) -> String {
    sites
        .iter()
        .map(SiteId::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_dump(snapshot: &BTreeMap<SiteId, SiteDump>, quiet: bool) -> String {
    let header = if quiet {
        None
    } else {
        Some(
            VarId::all()
                .map(|var| var.to_string())
                .collect::<Vec<_>>()
                .join(" "),
        )
    };
    let lines = snapshot.iter().map(|(id, dump)| format_site_dump(*id, dump));
    header.into_iter().chain(lines).collect::<Vec<_>>().join("\n")
}

fn format_site_dump(id: SiteId, dump: &SiteDump) -> String {
    let state = if dump.up { "up" } else { "down" };
    let values = dump
        .values
        .iter()
        .map(|(var, value)| format!("{var}={value}"))
        .collect::<Vec<_>>()
        .join(" ");
    format!("site {id} [{state}]: {values}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use availdb_core::{AbortReason, TxnId};

    fn var(n: u8) -> VarId {
        VarId::new(n).unwrap()
    }

    fn site(n: u8) -> SiteId {
        SiteId::new(n).unwrap()
    }

    #[test]
    fn formats_read() {
        assert_eq!(
            format_stdout(&Output::Read { var: var(3), value: 99 }, false).unwrap(),
            "x3: 99"
        );
    }

    #[test]
    fn formats_waiting() {
        assert_eq!(
            format_stdout(&Output::Waiting { txn: TxnId::new("T1"), var: var(3) }, false).unwrap(),
            "T1 waits on x3"
        );
    }

    #[test]
    fn formats_written_with_multiple_sites() {
        assert_eq!(
            format_stdout(&Output::Written { var: var(2), sites: vec![site(1), site(2)] }, false).unwrap(),
            "x2 written to sites 1, 2"
        );
    }

    #[test]
    fn formats_committed_and_aborted() {
        assert_eq!(
            format_stdout(&Output::Committed { txn: TxnId::new("T1") }, false).unwrap(),
            "T1 commits"
        );
        assert_eq!(
            format_stdout(
                &Output::Aborted { txn: TxnId::new("T2"), reason: AbortReason::DangerousCycle },
                false
            )
            .unwrap(),
            "T2 aborts: dangerous-cycle"
        );
    }

    #[test]
    fn ack_and_protocol_error_produce_no_stdout_line() {
        assert_eq!(format_stdout(&Output::Ack, false), None);
        assert_eq!(format_stdout(&Output::ProtocolError("boom".to_string()), false), None);
    }

    #[test]
    fn protocol_error_formats_to_stderr() {
        assert_eq!(
            format_stderr(&Output::ProtocolError("unknown transaction T9".to_string())).unwrap(),
            "error: unknown transaction T9"
        );
        assert_eq!(format_stderr(&Output::Committed { txn: TxnId::new("T1") }), None);
    }

    #[test]
    fn quiet_dump_omits_the_variable_header_line() {
        let mut values = BTreeMap::new();
        values.insert(var(3), 30);
        let mut snapshot = BTreeMap::new();
        snapshot.insert(site(4), SiteDump { up: true, values });
        assert_eq!(format_dump(&snapshot, true), "site 4 [up]: x3=30");
    }

    #[test]
    fn dump_header_lists_every_variable_in_order() {
        let mut values = BTreeMap::new();
        values.insert(var(3), 30);
        let mut snapshot = BTreeMap::new();
        snapshot.insert(site(4), SiteDump { up: true, values });
        let rendered = format_dump(&snapshot, false);
        let mut lines = rendered.lines();
        assert_eq!(lines.next().unwrap(), "x1 x2 x3 x4 x5 x6 x7 x8 x9 x10 x11 x12 x13 x14 x15 x16 x17 x18 x19 x20");
        assert_eq!(lines.next().unwrap(), "site 4 [up]: x3=30");
    }
}
