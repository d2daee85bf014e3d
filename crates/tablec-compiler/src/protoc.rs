//! External process helpers: protoc invocations and run hooks

use std::path::Path;
use std::process::Command;

use tracing::info;

use crate::config::HookConfig;
use crate::error::{CompileError, Result};

/// Run a program to completion, failing on a nonzero exit status.
pub fn run_program(program: &Path, args: &[String]) -> Result<()> {
    info!(program = %program.display(), ?args, "running external program");
    let output = Command::new(program).args(args).output()?;
    if !output.status.success() {
        return Err(CompileError::Subprocess {
            program: program.display().to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(())
}

/// Run a configured pre/post hook.
pub fn run_hook(hook: &HookConfig) -> Result<()> {
    run_program(&hook.program, &hook.args)
}

/// Compile one schema file to C# source with protoc.
///
/// The schema's own directory is the import search path, so sibling
/// `.pbmeta` imports resolve without further flags.
pub fn run_protoc(protoc: &Path, meta_file: &Path, out_dir: &Path) -> Result<()> {
    let proto_dir = meta_file.parent().unwrap_or_else(|| Path::new("."));
    let file_name = meta_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let args = vec![
        format!("--proto_path={}", proto_dir.display()),
        format!("--csharp_out={}", out_dir.display()),
        file_name,
    ];
    run_program(protoc, &args)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn nonzero_exit_reports_stderr() {
        let err = run_program(
            Path::new("sh"),
            &["-c".to_string(), "echo bad schema >&2; exit 3".to_string()],
        )
        .unwrap_err();
        match err {
            CompileError::Subprocess { program, stderr, .. } => {
                assert_eq!(program, "sh");
                assert!(stderr.contains("bad schema"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn successful_program_is_ok() {
        run_program(Path::new("true"), &[]).unwrap();
    }

    #[test]
    fn missing_program_is_an_io_error() {
        let err = run_program(&PathBuf::from("/nonexistent/protoc"), &[]).unwrap_err();
        assert!(matches!(err, CompileError::Io(_)));
    }
}
