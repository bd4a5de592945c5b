//! MJML command line compiler.
//!
//! Pipes the template into `mjml -i -s` and reads HTML from stdout.
//! Validation findings arrive on stderr, one per line, in the form
//! `Line 12 of src/welcome.mjml (mj-text) — Attribute foo is illegal`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::{Compiled, Issue, TemplateCompiler};
use crate::config::{CompilerConfig, ValidationLevel};
use crate::utils::exec::Cmd;

/// Errors raised while setting up the external compiler.
#[derive(Debug, Error)]
pub enum CompilerError {
    #[error(
        "`{program}` not found on PATH. Install it with `npm install -g mjml`, \
         or set `command` under [compiler] in mjml-build.toml"
    )]
    NotFound {
        program: String,
        #[source]
        source: which::Error,
    },

    #[error("compiler command is empty")]
    EmptyCommand,
}

/// [`TemplateCompiler`] backed by the `mjml` CLI.
#[derive(Debug, Clone)]
pub struct MjmlCompiler {
    program: PathBuf,
    leading_args: Vec<String>,
    validation: ValidationLevel,
}

impl MjmlCompiler {
    /// Resolve the configured command on `PATH`.
    pub fn from_config(config: &CompilerConfig) -> Result<Self, CompilerError> {
        let (program, rest) = config
            .command
            .split_first()
            .ok_or(CompilerError::EmptyCommand)?;

        let program = which::which(program).map_err(|source| CompilerError::NotFound {
            program: program.clone(),
            source,
        })?;

        Ok(Self {
            program,
            leading_args: rest.to_vec(),
            validation: config.validation,
        })
    }

    /// Arguments for compiling the template originating at `path`.
    fn args_for(&self, path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.leading_args.iter().map(OsString::from).collect();
        args.push("-i".into());
        args.push("-s".into());
        args.push(format!("--config.validationLevel={}", self.validation.as_str()).into());

        let mut file_path = OsString::from("--config.filePath=");
        file_path.push(path.as_os_str());
        args.push(file_path);
        args
    }
}

impl TemplateCompiler for MjmlCompiler {
    fn compile(&self, template: &str, path: &Path) -> Result<Compiled> {
        let output = Cmd::new(&self.program)
            .args(self.args_for(path))
            .stdin(template)
            .run()?;

        let html = String::from_utf8(output.stdout)
            .with_context(|| format!("mjml produced non UTF-8 output for {}", path.display()))?;
        let issues = parse_issues(&String::from_utf8_lossy(&output.stderr));

        Ok(Compiled { html, issues })
    }
}

/// Separators mjml places between the location and the message.
const MESSAGE_SEPARATORS: [&str; 2] = [" — ", " - "];

/// Turn mjml's stderr into diagnostics.
///
/// `Line ...` entries keep the full line as the formatted message and the
/// text after the separator as the plain one. Any other non-blank line,
/// except the `File:` headers, becomes a plain issue.
pub(super) fn parse_issues(stderr: &str) -> Vec<Issue> {
    stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("File:"))
        .map(|line| {
            if !line.starts_with("Line ") {
                return Issue::new(line);
            }
            let message = MESSAGE_SEPARATORS
                .iter()
                .find_map(|sep| line.split_once(sep).map(|(_, msg)| msg.trim()))
                .unwrap_or(line);
            Issue::new(message).with_formatted(line)
        })
        .collect()
}
