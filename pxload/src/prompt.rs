use std::io::{self, BufRead, Write};

use pxload_core::RunConfigInput;

/// Asks, in order, for every value still missing from `input`.
///
/// Proxy credentials are only asked for when a proxy was given. A blank proxy answer
/// means a direct connection; blank answers elsewhere are left for validation to reject.
pub(crate) fn fill_missing(
    input: &mut RunConfigInput,
    reader: &mut impl BufRead,
    out: &mut impl Write,
) -> io::Result<()> {
    if input.proxy.is_none() {
        input.proxy = Some(ask(
            "Enter proxy address (host:port, empty for none):",
            reader,
            out,
        )?);
    }

    let has_proxy = input.proxy.as_deref().is_some_and(|p| !p.trim().is_empty());
    if has_proxy {
        if input.proxy_username.is_none() {
            input.proxy_username = Some(ask("Enter proxy username:", reader, out)?);
        }
        let has_user = input
            .proxy_username
            .as_deref()
            .is_some_and(|u| !u.is_empty());
        if has_user && input.proxy_password.is_none() {
            input.proxy_password = Some(ask("Enter proxy password:", reader, out)?);
        }
    }

    if input.concurrency.is_none() {
        input.concurrency = Some(ask("Enter number of simultaneous requests:", reader, out)?);
    }
    if input.duration.is_none() {
        input.duration = Some(ask("Enter test duration in seconds:", reader, out)?);
    }
    if input.url.is_none() {
        input.url = Some(ask("Enter website URL to make requests to:", reader, out)?);
    }

    Ok(())
}

fn ask(question: &str, reader: &mut impl BufRead, out: &mut impl Write) -> io::Result<String> {
    writeln!(out, "{question}")?;
    out.flush()?;

    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "stdin closed while waiting for input",
        ));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
