use std::env;
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use anyhow::Result;
use uid::Id;

use crate::ode::PipelineOptions;

/// Environment variable naming the interpreter that runs analysis jobs.
pub const INTERPRETER_ENV: &str = "NEURODE_PYTHON";

const INTERPRETERS: &[&str] = &["python3", "python"];

fn is_executable_on_path(executable_name: &str) -> bool {
    let Some(paths) = env::var_os("PATH") else {
        return false;
    };
    env::split_paths(&paths).any(|dir| {
        let candidate = dir.join(executable_name);
        candidate.is_file() || candidate.with_extension("exe").is_file()
    })
}

pub fn find_executable<'a>(varients: &[&'a str]) -> Result<&'a str> {
    varients
        .iter()
        .find(|varient| is_executable_on_path(varient))
        .copied()
        .ok_or_else(|| anyhow!("Could not find any of {:?} on path", varients))
}

/// The interpreter to run jobs with: the explicit option, then
/// `NEURODE_PYTHON`, then the first python found on `PATH`.
pub fn find_interpreter(options: &PipelineOptions) -> Result<String> {
    if let Some(interpreter) = &options.interpreter {
        return Ok(interpreter.clone());
    }
    if let Ok(interpreter) = env::var(INTERPRETER_ENV) {
        if !interpreter.is_empty() {
            return Ok(interpreter);
        }
    }
    find_executable(INTERPRETERS).map(str::to_owned)
}

/// A fresh directory `base/prefix_<pid>_<id>`.
pub fn unique_dir(base: &Path, prefix: &str) -> std::io::Result<PathBuf> {
    let uid = Id::<u32>::new();
    let dir = base.join(format!("{}_{}_{}", prefix, std::process::id(), uid));
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(test)]
pub fn scratch_dir(name: &str) -> std::io::Result<PathBuf> {
    unique_dir(Path::new("test_output"), name)
}

#[cfg(test)]
mod tests {
    use super::{find_executable, find_interpreter, unique_dir};
    use crate::ode::PipelineOptions;
    use std::path::Path;

    #[test]
    fn explicit_interpreter_wins() {
        let options = PipelineOptions {
            interpreter: Some("/opt/python/bin/python3".to_owned()),
            ..Default::default()
        };
        assert_eq!(find_interpreter(&options).unwrap(), "/opt/python/bin/python3");
    }

    #[test]
    fn missing_executable() {
        let err = find_executable(&["surely-not-an-executable-name"]).unwrap_err();
        assert!(err.to_string().contains("surely-not-an-executable-name"));
    }

    #[test]
    fn unique_dirs_differ() {
        let base = Path::new("test_output");
        let a = unique_dir(base, "unique").unwrap();
        let b = unique_dir(base, "unique").unwrap();
        assert_ne!(a, b);
        assert!(a.is_dir() && b.is_dir());
    }
}
