//! Tests, creates and uploads conan packages.
//!
//! Invoked from the root of a project holding a `conanfile.py`. Profiles are
//! discovered below `build/` unless given explicitly, and the package version
//! is computed by `build/semver.cmake` unless passed with `--version`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::Parser;

use crate::env::{self, EnvLookup};
use crate::process::{self, run_tool};
use crate::{ToolError, ToolResult, file, regex, usage};

/// Prefix of the logging variables (`CONAN_PACKAGE_LOGFILE`, `CONAN_PACKAGE_VERBOSE`).
pub const ENV_PREFIX: &str = "CONAN_PACKAGE";
/// Enables debug messages as well.
pub const VERBOSE_ENV: &str = "VERBOSE";
/// Overrides the conan executable.
pub const CONAN_ENV: &str = "CONAN";
/// Overrides the cmake executable.
pub const CMAKE_ENV: &str = "CMAKE";
/// Remote packages get uploaded to when `--remote` is not given.
pub const REMOTE_ENV: &str = "MZ_CONAN_REMOTE_NAME";
pub const DEFAULT_REMOTE: &str = "emzeat";
pub const DEFAULT_CHANNEL: &str = "emzeat/oss";
pub const DEFAULT_RECIPE: &str = "conanfile.py";

const BUILD_DIR: &str = "build";
const SEMVER_SCRIPT: &str = "build/semver.cmake";
const PROFILE: &str = "profile.conan";
const BUILD_PROFILE: &str = "build_profile.conan";

macro_rules! os_args {
    ( $( $arg:expr ),* $(,)? ) => {
        vec![ $( OsString::from($arg) ),* ]
    };
}

#[derive(Parser, Debug)]
#[command(name = "conan-package")]
#[command(about = "Helper to test and deploy conan packages", long_about = None)]
pub struct ConanArgs {
    /// Test the conan recipe step-by-step
    #[arg(long)]
    pub test: bool,

    /// Create the conan package including a build for the given profile
    #[arg(long)]
    pub create: bool,

    /// Create a build for the given profile using the previously created package
    #[arg(long)]
    pub build: bool,

    /// Upload the conan package
    #[arg(long)]
    pub upload: bool,

    /// Enable verbose logging
    #[arg(long)]
    pub verbose: bool,

    /// Conan recipe to be processed
    #[arg(long, value_name = "FILE", default_value = DEFAULT_RECIPE)]
    pub recipe: PathBuf,

    /// Conan profile to be used, defaults to the first build/*/profile.conan
    #[arg(long, value_name = "FILE")]
    pub profile: Option<PathBuf>,

    /// Conan build profile for cross building, defaults to the first build/*/build_profile.conan
    #[arg(long = "build-profile", value_name = "FILE")]
    pub build_profile: Option<PathBuf>,

    /// Override an option in the conan recipe, e.g. backend_qt5=False
    #[arg(short = 'o', long = "option", value_name = "OPTION", num_args = 1..)]
    pub options: Vec<String>,

    /// Directory to test the package in, defaults to conan_package next to the profile
    #[arg(long = "test-dir", value_name = "DIR")]
    pub test_dir: Option<PathBuf>,

    /// Package version, computed by build/semver.cmake when not given
    #[arg(long, value_name = "VERSION")]
    pub version: Option<String>,

    /// Channel of the package reference
    #[arg(long, value_name = "USER/CHANNEL", default_value = DEFAULT_CHANNEL)]
    pub channel: String,

    /// Remote to upload to, defaults to $MZ_CONAN_REMOTE_NAME or emzeat
    #[arg(long, value_name = "NAME")]
    pub remote: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Test,
    Create,
    Build,
}

impl ConanArgs {
    /// `--test` wins over `--create`, which wins over `--build`.
    pub fn mode(&self) -> Option<Mode> {
        if self.test {
            Some(Mode::Test)
        } else if self.create {
            Some(Mode::Create)
        } else if self.build {
            Some(Mode::Build)
        } else {
            None
        }
    }
}

/// The conan and cmake executables.
#[derive(Debug, Clone)]
pub struct Tools {
    pub conan: PathBuf,
    pub cmake: PathBuf,
}

impl Tools {
    pub fn from_env(env: &impl EnvLookup) -> Self {
        Self {
            conan: env::var_path(env, CONAN_ENV).unwrap_or_else(|| PathBuf::from("conan")),
            cmake: env::var_path(env, CMAKE_ENV).unwrap_or_else(|| PathBuf::from("cmake")),
        }
    }

    fn conan(&self, args: Vec<OsString>, failure_ok: bool) -> ToolResult<()> {
        let out = run_tool(process::cmd(&self.conan, args), &self.conan, CONAN_ENV)?;
        if out.success() {
            return Ok(());
        }
        if failure_ok {
            info!("conan failed but not fatal: exit code {}", out.code);
            return Ok(());
        }
        Err(ToolError::ToolFailed {
            tool: "conan".into(),
            code: out.code,
        })
    }

    fn cmake(&self, args: Vec<OsString>) -> ToolResult<()> {
        let out = run_tool(process::cmd(&self.cmake, args), &self.cmake, CMAKE_ENV)?;
        if out.success() {
            Ok(())
        } else {
            Err(ToolError::ToolFailed {
                tool: "cmake".into(),
                code: out.code,
            })
        }
    }
}

pub fn run(args: &ConanArgs, env: &impl EnvLookup) -> ToolResult<()> {
    let Some(mode) = args.mode() else {
        usage!("Please pass --test, --create or --build");
    };
    let tools = Tools::from_env(env);

    if !args.recipe.is_file() {
        usage!("No such recipe: {}", args.recipe.display());
    }
    info!("Processing '{}'", args.recipe.display());

    let build_dir = Path::new(BUILD_DIR);
    let Some(profile) = args
        .profile
        .clone()
        .or_else(|| discover_profile(build_dir, PROFILE))
    else {
        usage!("No {PROFILE} found below {BUILD_DIR}/, pass --profile");
    };
    let build_profile = args
        .build_profile
        .clone()
        .or_else(|| discover_profile(build_dir, BUILD_PROFILE));
    let test_dir = args.test_dir.clone().unwrap_or_else(|| {
        profile
            .parent()
            .unwrap_or(Path::new(""))
            .join("conan_package")
    });

    file::remove_all(&test_dir)?;
    file::mkdirp(&test_dir)?;
    debug!("Testing below '{}'", test_dir.display());

    let Some(name) = recipe_name(&file::read_to_string(&args.recipe)?) else {
        usage!("Failed to match name from recipe");
    };
    info!("Package name '{name}'");

    let version = match &args.version {
        Some(version) => version.clone(),
        None => {
            let version_txt = test_dir.join("version.txt");
            let mut semver = OsString::from("-DMZ_SEMVER_TO_FILE=");
            semver.push(&version_txt);
            tools.cmake(os_args![semver, "-P", SEMVER_SCRIPT])?;
            file::read_to_string(&version_txt)?.trim().to_string()
        }
    };
    info!("Package version '{version}'");

    let package = Package {
        tools,
        recipe: args.recipe.clone(),
        reference: format!("{name}/{version}@{}", args.channel),
        name,
        profile_args: profile_args(&profile, build_profile.as_deref(), &args.options),
        test_dir,
    };

    match mode {
        Mode::Test => package.test(),
        Mode::Create => {
            package.create()?;
            if args.upload {
                package.upload(&remote(args, env))?;
            }
            Ok(())
        }
        Mode::Build => {
            package.build()?;
            if args.upload {
                package.upload(&remote(args, env))?;
            }
            Ok(())
        }
    }
}

fn remote(args: &ConanArgs, env: &impl EnvLookup) -> String {
    args.remote
        .clone()
        .or_else(|| env::var_non_empty(env, REMOTE_ENV))
        .unwrap_or_else(|| DEFAULT_REMOTE.to_string())
}

/// The first `<dir>/*/<name>` in sorted order.
pub fn discover_profile(dir: &Path, name: &str) -> Option<PathBuf> {
    file::ls(dir)
        .ok()?
        .into_iter()
        .map(|entry| entry.join(name))
        .find(|candidate| candidate.is_file())
}

/// The value of the first `name = "..."` assignment in a recipe.
pub fn recipe_name(recipe: &str) -> Option<String> {
    let re = regex!(r#"name\s*=\s*['"]([^'"]+)"#);
    re.captures(recipe)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Profile and option arguments, using host qualified flags when cross building.
pub fn profile_args(profile: &Path, build_profile: Option<&Path>, options: &[String]) -> Vec<OsString> {
    let (mut args, option_flag) = match build_profile {
        Some(build_profile) => (os_args!["-pr:h", profile, "-pr:b", build_profile], "-o:h"),
        None => (os_args!["-pr", profile], "-o"),
    };
    for option in options {
        args.extend(os_args![option_flag, option]);
    }
    args
}

struct Package {
    tools: Tools,
    recipe: PathBuf,
    name: String,
    /// `name/version@user/channel`
    reference: String,
    profile_args: Vec<OsString>,
    test_dir: PathBuf,
}

impl Package {
    fn subdir(&self, name: &str) -> ToolResult<PathBuf> {
        let dir = self.test_dir.join(name);
        file::mkdirp(&dir)?;
        Ok(dir)
    }

    /// Runs source, install, build and package one after another.
    fn test(&self) -> ToolResult<()> {
        let source = self.subdir("source")?;
        let build = self.subdir("build")?;
        let install = self.subdir("install")?;
        let package = self.subdir("package")?;
        let recipe = &self.recipe;

        self.tools
            .conan(os_args!["source", "-sf", &source, recipe], false)?;
        let mut args = os_args!["install", "-if", &install];
        args.extend(self.profile_args.iter().cloned());
        args.push(recipe.into());
        self.tools.conan(args, false)?;
        for step in ["build", "package"] {
            let args = os_args![
                step, "-bf", &build, "-if", &install, "-pf", &package, "-sf", &source, recipe,
            ];
            self.tools.conan(args, false)?;
        }
        Ok(())
    }

    fn clean_cache(&self) -> ToolResult<()> {
        info!("Cleaning local cache");
        self.tools
            .conan(os_args!["remove", "--force", &self.reference], true)
    }

    fn create(&self) -> ToolResult<()> {
        let test_package = self
            .recipe
            .parent()
            .unwrap_or(Path::new(""))
            .join("test_package");
        if !test_package.is_dir() {
            usage!(
                "Missing 'test_package' dir at '{}' - cannot verify recipe so aborting",
                test_package.display()
            );
        }
        self.clean_cache()?;

        info!("Creating package as '{}'", self.reference);
        let mut args = os_args!["create", "-tbf", &self.test_dir];
        args.extend(self.profile_args.iter().cloned());
        args.extend(os_args![&self.recipe, &self.reference]);
        self.tools.conan(args, false)
    }

    fn build(&self) -> ToolResult<()> {
        let out = self.subdir("out")?;
        let install = self.subdir("install")?;
        self.clean_cache()?;

        info!("Building package '{}'", self.reference);
        let mut args = os_args!["install", "-if", &install, "-of", &out];
        args.extend(self.profile_args.iter().cloned());
        args.extend(os_args!["-b", &self.name, &self.reference]);
        self.tools.conan(args, false)
    }

    fn upload(&self, remote: &str) -> ToolResult<()> {
        info!("Uploading to '{remote}'");
        let args = os_args![
            "upload", "-r", remote, "--all", "--check", "--confirm", &self.reference,
        ];
        self.tools.conan(args, false)
    }
}
