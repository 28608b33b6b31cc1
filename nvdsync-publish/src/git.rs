//! `git` CLI publisher.
//!
//! Sequence, all inside the work directory:
//! 1. `git add <cves_dir>`
//! 2. `git status --porcelain -- <cves_dir>` to count changed records
//! 3. `git add <checkpoint_file>`
//! 4. `git diff --cached --quiet`; exit 0 means nothing is staged and the
//!    commit is skipped
//! 5. `git commit` with the configured author
//! 6. `git push <remote_url> HEAD`, even without a new commit, so commits
//!    from an earlier failed push still reach the remote
//!
//! The token never appears in arguments. When present it is passed to the
//! child through the environment and read back by an inline credential
//! helper.

use std::path::PathBuf;
use std::process::{Command, Output};

use nvdsync_core::Config;

use crate::error::{io_err, PublishError};
use crate::{PublishOutcome, Publisher};

const USERNAME_ENV: &str = "NVDSYNC_GIT_USERNAME";
const PASSWORD_ENV: &str = "NVDSYNC_GIT_PASSWORD";

/// Shell helper answering git's credential `get` request from the child env.
const CREDENTIAL_HELPER: &str = "!f() { test \"$1\" = get || exit 0; \
echo \"username=${NVDSYNC_GIT_USERNAME}\"; \
echo \"password=${NVDSYNC_GIT_PASSWORD}\"; }; f";

#[derive(Debug, Clone)]
pub struct GitPublisher {
    program: PathBuf,
    work_dir: PathBuf,
    cves_dir: String,
    checkpoint_file: String,
    remote_url: String,
    username: String,
    token: Option<String>,
    author_name: String,
    author_email: String,
    message: String,
}

impl GitPublisher {
    /// Build from configuration, reading the token from `publish.token_env`.
    pub fn from_config(work_dir: impl Into<PathBuf>, config: &Config) -> Self {
        let token = std::env::var(&config.publish.token_env)
            .ok()
            .filter(|t| !t.is_empty());
        if token.is_none() {
            tracing::warn!(
                "{} is not set; pushing with git's own credentials",
                config.publish.token_env
            );
        }
        Self {
            program: PathBuf::from("git"),
            work_dir: work_dir.into(),
            cves_dir: config.storage.cves_dir.clone(),
            checkpoint_file: config.storage.checkpoint_file.clone(),
            remote_url: config.publish.remote_url.clone(),
            username: config.publish.username.clone(),
            token,
            author_name: config.publish.author_name.clone(),
            author_email: config.publish.author_email.clone(),
            message: config.publish.commit_message.clone(),
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    fn commit_args(&self) -> Vec<String> {
        vec![
            "-c".to_string(),
            format!("user.name={}", self.author_name),
            "-c".to_string(),
            format!("user.email={}", self.author_email),
            "commit".to_string(),
            "--quiet".to_string(),
            "-m".to_string(),
            self.message.clone(),
            format!("--author={} <{}>", self.author_name, self.author_email),
        ]
    }

    fn push_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.token.is_some() {
            // Clear inherited helpers so only ours answers.
            args.extend([
                "-c".to_string(),
                "credential.helper=".to_string(),
                "-c".to_string(),
                format!("credential.helper={CREDENTIAL_HELPER}"),
            ]);
        }
        args.extend([
            "push".to_string(),
            "--porcelain".to_string(),
            self.remote_url.clone(),
            "HEAD".to_string(),
        ]);
        args
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.current_dir(&self.work_dir)
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0");
        cmd
    }

    fn output(&self, step: &'static str, args: &[String]) -> Result<Output, PublishError> {
        tracing::info!("git {step}");
        self.command(args)
            .output()
            .map_err(|e| io_err(&self.program, e))
    }

    fn run_git(&self, step: &'static str, args: &[String]) -> Result<String, PublishError> {
        let output = self.output(step, args)?;
        if !output.status.success() {
            return Err(git_failure(step, &output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn ensure_repository(&self) -> Result<(), PublishError> {
        let args = strings(&["rev-parse", "--is-inside-work-tree"]);
        let output = self.output("rev-parse", &args)?;
        let inside = String::from_utf8_lossy(&output.stdout).trim() == "true";
        if output.status.success() && inside {
            return Ok(());
        }
        Err(PublishError::NotARepository {
            path: self.work_dir.clone(),
        })
    }

    fn has_staged_changes(&self) -> Result<bool, PublishError> {
        let output = self.output("diff", &strings(&["diff", "--cached", "--quiet"]))?;
        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(git_failure("diff", &output)),
        }
    }

    fn has_head(&self) -> Result<bool, PublishError> {
        let args = strings(&["rev-parse", "--verify", "--quiet", "HEAD"]);
        let output = self.output("rev-parse", &args)?;
        Ok(output.status.success())
    }

    fn push(&self) -> Result<(), PublishError> {
        let mut cmd = self.command(&self.push_args());
        if let Some(token) = &self.token {
            cmd.env(USERNAME_ENV, &self.username).env(PASSWORD_ENV, token);
        }
        tracing::info!("git push");
        let output = cmd.output().map_err(|e| io_err(&self.program, e))?;
        if !output.status.success() {
            return Err(git_failure("push", &output));
        }
        if String::from_utf8_lossy(&output.stdout).contains("[up to date]") {
            tracing::info!("remote already up to date");
        }
        Ok(())
    }
}

impl Publisher for GitPublisher {
    fn publish(&self) -> Result<PublishOutcome, PublishError> {
        self.ensure_repository()?;

        self.run_git("add", &strings(&["add", "--", self.cves_dir.as_str()]))?;
        let status = self.run_git(
            "status",
            &strings(&["status", "--porcelain", "--", self.cves_dir.as_str()]),
        )?;
        let changed = count_changed(&status);
        tracing::info!("changed: {changed}");

        self.run_git("add", &strings(&["add", "--", self.checkpoint_file.as_str()]))?;

        let outcome = if self.has_staged_changes()? {
            self.run_git("commit", &self.commit_args())?;
            PublishOutcome::Pushed { changed }
        } else if self.has_head()? {
            tracing::info!("nothing staged; pushing existing commits only");
            PublishOutcome::NothingToCommit
        } else {
            tracing::info!("nothing staged and no commits yet; skipping push");
            return Ok(PublishOutcome::NothingToCommit);
        };

        // Always push: a commit left behind by an earlier failed push goes out here.
        self.push()?;
        Ok(outcome)
    }
}

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| a.to_string()).collect()
}

fn count_changed(porcelain: &str) -> usize {
    porcelain.lines().filter(|l| !l.trim().is_empty()).count()
}

fn git_failure(step: &'static str, output: &Output) -> PublishError {
    PublishError::Git {
        step,
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}
