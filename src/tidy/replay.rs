use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

use crate::file;
use crate::tidy::output::filter_output;
use crate::tidy::{ForwardingDescriptor, STAMP_MARKER, TidyConfig, compdb};
use crate::{ToolError, ToolResult};

pub(super) fn replay(
    config: &TidyConfig,
    descriptor: &ForwardingDescriptor,
    args: &[String],
) -> ToolResult<i32> {
    if args.iter().any(|arg| arg == "-E") {
        preprocess(config, descriptor, preprocess_output(args))
    } else {
        analyze(config, descriptor)
    }
}

/// Finds where ccache wants the preprocessed text; `None` means stdout.
fn preprocess_output(args: &[String]) -> Option<PathBuf> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "-o" {
            return iter.next().map(PathBuf::from);
        }
        if let Some(path) = arg.strip_prefix("-o=") {
            return Some(PathBuf::from(path));
        }
        if let Some(path) = arg.strip_prefix("-o") {
            return Some(PathBuf::from(path));
        }
    }
    None
}

/// Produces the text ccache hashes: the source, the effective clang-tidy
/// configuration and the compile database lines for the source.
fn preprocess(
    config: &TidyConfig,
    descriptor: &ForwardingDescriptor,
    output: Option<PathBuf>,
) -> ToolResult<i32> {
    let source = file::read_to_string(&descriptor.source)?;
    let flags = match &descriptor.compile_db {
        Some(db) => compdb::filter(db, &descriptor.source)?,
        None => String::new(),
    };
    let dump = config.run_clang_tidy(
        std::iter::once("--dump-config").chain(descriptor.tool_args.iter().map(String::as_str)),
    )?;
    let effective = filter_output(&dump.output);
    if !dump.success() {
        eprint!("{effective}");
        return Ok(dump.code);
    }
    debug!(
        "Preprocessing '{}' to {}:\n{:?}\n{}",
        descriptor.source.display(),
        output
            .as_deref()
            .map_or_else(|| "<stdout>".to_string(), |p| p.display().to_string()),
        descriptor.tool_args,
        flags,
    );

    let content = format!("{source}{effective}{flags}");
    match output {
        Some(path) => file::write(path, &content)?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(content.as_bytes())
                .and_then(|()| stdout.flush())
                .map_err(|err| ToolError::FileError(err, PathBuf::from("<stdout>")))?;
        }
    }
    Ok(0)
}

/// The real compile step: run clang-tidy and touch the stamp on success.
fn analyze(config: &TidyConfig, descriptor: &ForwardingDescriptor) -> ToolResult<i32> {
    let out = config.run_clang_tidy(
        descriptor
            .tool_args
            .iter()
            .map(OsString::from)
            .chain(std::iter::once(descriptor.source.clone().into_os_string())),
    )?;
    eprint!("{}", filter_output(&out.output));
    if out.success() {
        file::write(&descriptor.object, STAMP_MARKER)?;
        debug!("Wrote result to {}", descriptor.object.display());
    } else {
        debug!("clang-tidy failed with {}", out.code);
    }
    Ok(out.code)
}
