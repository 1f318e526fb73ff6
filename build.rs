
use std::error::Error;
use vergen_gitcl::{Emitter, GitclBuilder};

/// Environment variable that overrides the git description when no git data is available
const DESCRIBE_OVERRIDE: &str = "CUSTOM_VERGEN_GIT_DESCRIBE";

/// Emits the git describe instructions used in the version string.
/// # Errors
/// * if `git` is not installed
/// * if the source was unpacked from an archive without a .git folder
fn emit_git() -> Result<(), Box<dyn Error>> {
    let gitcl = GitclBuilder::default()
        .describe(true, true, None)
        .sha(true)
        .build()?;

    Emitter::default()
        .fail_on_error()
        .add_instructions(&gitcl)?
        .emit()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    if emit_git().is_err() {
        let git_desc = option_env!("CUSTOM_VERGEN_GIT_DESCRIBE").unwrap_or("unknown");
        println!("cargo:rustc-env=VERGEN_GIT_DESCRIBE={git_desc}");
    }

    println!("cargo:rerun-if-env-changed={DESCRIBE_OVERRIDE}");
    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-changed=src");
    Ok(())
}
