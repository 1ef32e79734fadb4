use std::ffi::OsString;
use std::path::Path;

use crate::process::{self, run_tool};
use crate::tidy::output::filter_output;
use crate::tidy::{
    CCACHE_ENV, CLANG_TIDY_ENV, ENV_PREFIX, EXTRAFILES_ENV, FORWARD_ENV, ForwardingDescriptor,
    STAMP_EXTENSION, StampGuard, TidyArgs, TidyConfig,
};
use crate::{ToolError, ToolResult, usage};

pub(super) fn dispatch(config: &TidyConfig, args: &[String]) -> ToolResult<i32> {
    let parsed = TidyArgs::parse(args)?;
    let config = config.with_overrides(&parsed);
    if parsed.help {
        return show_help(&config);
    }
    if let Some(compdb) = &parsed.compdb {
        debug!("Using compile database at {}", compdb.display());
    }
    if parsed.sources.is_empty() {
        usage!("Missing source input file(s)");
    }
    config.ccache_path()?;

    for source in &parsed.sources {
        let code = dispatch_source(&config, &parsed, source)?;
        if code != 0 {
            debug!("{} failed with {code}, skipping remaining sources", source.display());
            return Ok(code);
        }
    }
    Ok(0)
}

/// One round trip through ccache for `source`.
fn dispatch_source(config: &TidyConfig, parsed: &TidyArgs, source: &Path) -> ToolResult<i32> {
    let object = parsed
        .object_file
        .clone()
        .unwrap_or_else(|| source.with_extension(STAMP_EXTENSION));
    let descriptor = ForwardingDescriptor {
        source: source.to_path_buf(),
        object: object.clone(),
        compile_db: parsed.compdb.clone(),
        tool_args: parsed.tidy_args.clone(),
    };
    let mut stamp = StampGuard::new(object);

    let ccache = config.ccache_path()?;
    // ccache wants a plain compiler call; the real arguments travel in the env.
    let cc_args: Vec<OsString> = vec![
        config.self_exe.clone().into(),
        "-o".into(),
        stamp.path().into(),
        "-c".into(),
        source.into(),
    ];
    let cmd = process::cmd(ccache, cc_args).envs(cache_env(config, &descriptor)?);
    let code = run_tool(cmd, ccache, CCACHE_ENV)?.code;

    if code == 0 && parsed.object_file.is_some() {
        stamp.keep();
    }
    Ok(code)
}

/// Environment handed to ccache and through it to the replay phase.
pub(super) fn cache_env(
    config: &TidyConfig,
    descriptor: &ForwardingDescriptor,
) -> ToolResult<Vec<(&'static str, OsString)>> {
    let mut env: Vec<(&'static str, OsString)> = vec![
        (FORWARD_ENV, descriptor.encode()?.into()),
        // clang-tidy behaves like clang
        ("CCACHE_COMPILERTYPE", "clang".into()),
        // there are no real includes to track, hash our synthetic preprocessor output
        ("CCACHE_NODEPEND", "1".into()),
        ("CCACHE_NODIRECT", "1".into()),
    ];

    let mut extrafiles = config.extrafiles.clone();
    if let Some(clang_tidy) = &config.clang_tidy {
        env.push((CLANG_TIDY_ENV, clang_tidy.clone().into()));
        // ccache only sees us as the compiler, so hash clang-tidy explicitly
        if clang_tidy.is_file() {
            extrafiles.push(clang_tidy.clone());
        }
    }
    if !extrafiles.is_empty() {
        let joined = std::env::join_paths(&extrafiles)
            .map_err(|err| ToolError::Usage(format!("invalid {EXTRAFILES_ENV} entry: {err}")))?;
        env.push((EXTRAFILES_ENV, joined));
    }
    Ok(env)
}

fn show_help(config: &TidyConfig) -> ToolResult<i32> {
    println!(
        "
    Wrapper to invoke clang-tidy through ccache to accelerate analysis as
    part of a regular compile job. Use as if running clang-tidy directly.

    Environment variables supported for configuration:
        {CLANG_TIDY_ENV}: Sets the clang-tidy executable.
        {CCACHE_ENV}: Sets the ccache executable.
        {ENV_PREFIX}_VERBOSE: Enables debug messages.
        {ENV_PREFIX}_LOGFILE: Logs to the given file (implies {ENV_PREFIX}_VERBOSE)

    Special flags supported to override configuration:
        --cache-tidy-o=<location of a stamp file to be touched on success>
        --cache-tidy-{CCACHE_ENV}=<location of the ccache executable>
        --cache-tidy-{CLANG_TIDY_ENV}=<location of the clang-tidy executable>
"
    );
    let out = config.run_clang_tidy(["-h"])?;
    eprint!("{}", filter_output(&out.output));
    Ok(out.code)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;

    use crate::test;

    use super::*;

    fn descriptor() -> ForwardingDescriptor {
        ForwardingDescriptor {
            source: PathBuf::from("a.cpp"),
            object: PathBuf::from("a.cache-tidy"),
            compile_db: None,
            tool_args: vec!["--quiet".into()],
        }
    }

    fn as_map(env: Vec<(&'static str, OsString)>) -> HashMap<&'static str, String> {
        env.into_iter()
            .map(|(k, v)| (k, v.to_string_lossy().into_owned()))
            .collect()
    }

    #[test]
    fn test_cache_env_forces_compiler_mode() {
        let config = TidyConfig {
            clang_tidy: Some(PathBuf::from("/does/not/exist/clang-tidy")),
            ..Default::default()
        };
        let env = as_map(cache_env(&config, &descriptor()).unwrap());
        assert_eq!(env["CCACHE_COMPILERTYPE"], "clang");
        assert_eq!(env["CCACHE_NODEPEND"], "1");
        assert_eq!(env["CCACHE_NODIRECT"], "1");
        assert_eq!(env["CLANG_TIDY"], "/does/not/exist/clang-tidy");
        assert!(!env.contains_key("CCACHE_EXTRAFILES"));
        assert_eq!(
            ForwardingDescriptor::decode(&env[FORWARD_ENV]).unwrap(),
            descriptor()
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_cache_env_hashes_existing_clang_tidy() {
        let tmpdir = test::tempdir();
        let tool = test::script(tmpdir.path(), "clang-tidy", "exit 0");
        let config = TidyConfig {
            clang_tidy: Some(tool.clone()),
            extrafiles: vec![PathBuf::from("/etc/.clang-tidy")],
            ..Default::default()
        };
        let env = as_map(cache_env(&config, &descriptor()).unwrap());
        assert_eq!(
            env["CCACHE_EXTRAFILES"],
            format!("/etc/.clang-tidy:{}", tool.display())
        );
    }

    #[test]
    fn test_no_sources_is_usage_error() {
        let config = TidyConfig::default();
        let err = dispatch(&config, &["--quiet".to_string()]).unwrap_err();
        assert_eq!(err.to_string(), "Missing source input file(s)");
    }

    #[test]
    fn test_missing_ccache_fails_before_spawning() {
        let tmpdir = test::tempdir();
        let source = tmpdir.path().join("a.cpp");
        std::fs::write(&source, "").unwrap();
        let config = TidyConfig::default();
        let err = dispatch(&config, &[source.to_string_lossy().to_string()]).unwrap_err();
        assert!(matches!(err, ToolError::ToolNotFound { env: "CCACHE", .. }));
    }

    /// ccache stand-in that runs the "compiler" and then records whether the
    /// stamp it was asked for exists.
    #[cfg(unix)]
    fn fake_ccache(dir: &Path) -> PathBuf {
        test::script(
            dir,
            "ccache",
            r#""$@"
code=$?
if [ -f "$3" ]; then echo present >> "$3.witness"; fi
exit $code"#,
        )
    }

    #[cfg(unix)]
    #[test]
    fn test_derived_stamp_is_cleaned_up() {
        let tmpdir = test::tempdir();
        let dir = tmpdir.path();
        let source = dir.join("a.cpp");
        std::fs::write(&source, "").unwrap();
        let config = TidyConfig {
            ccache: Some(fake_ccache(dir)),
            self_exe: test::script(dir, "compiler", r#"echo Success > "$2""#),
            ..Default::default()
        };

        let code = dispatch(&config, &[source.to_string_lossy().to_string()]).unwrap();
        assert_eq!(code, 0);
        assert!(dir.join("a.cache-tidy.witness").exists());
        assert!(!dir.join("a.cache-tidy").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_explicit_stamp_is_kept_only_on_success() {
        let tmpdir = test::tempdir();
        let dir = tmpdir.path();
        let source = dir.join("a.cpp");
        std::fs::write(&source, "").unwrap();
        let stamp = dir.join("out.stamp");
        let args = vec![
            format!("--cache-tidy-o={}", stamp.display()),
            source.to_string_lossy().to_string(),
        ];

        let config = TidyConfig {
            ccache: Some(fake_ccache(dir)),
            self_exe: test::script(dir, "compiler", r#"printf Success > "$2""#),
            ..Default::default()
        };
        assert_eq!(dispatch(&config, &args).unwrap(), 0);
        assert_eq!(std::fs::read_to_string(&stamp).unwrap(), "Success");

        let failing = TidyConfig {
            self_exe: test::script(dir, "broken", r#"printf Success > "$2"; exit 4"#),
            ..config
        };
        assert_eq!(dispatch(&failing, &args).unwrap(), 4);
        assert!(!stamp.exists());
    }
}
