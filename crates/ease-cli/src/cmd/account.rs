use crate::context::Context;
use crate::output::{CliError, fail, render};
use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use ease_core::sync::RemoteSync;
use ease_core::sync::api::{RegisterRequest, RegisteredAccount};
use std::io::BufRead;

#[derive(Subcommand, Debug)]
pub enum AccountCommand {
    #[command(
        about = "Create an account on the web app",
        after_help = "EXAMPLES:\n    # Pipe the password in\n    printf '%s\\n' \"$PASSWORD\" | ease account register me@example.com --password-stdin\n\n    # Sign in through the web app afterwards and export EASE_SESSION"
    )]
    Register(RegisterArgs),
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Account email.
    pub email: String,

    /// Display name.
    #[arg(long)]
    pub name: Option<String>,

    /// Password (prefer --password-stdin; arguments show up in shell history).
    #[arg(long, required_unless_present = "password_stdin", conflicts_with = "password_stdin")]
    pub password: Option<String>,

    /// Read the password from the first line of stdin.
    #[arg(long)]
    pub password_stdin: bool,
}

pub fn run(command: &AccountCommand, ctx: &Context) -> Result<()> {
    match command {
        AccountCommand::Register(args) => run_register(args, ctx),
    }
}

fn run_register(args: &RegisterArgs, ctx: &Context) -> Result<()> {
    let password = match &args.password {
        Some(password) => password.clone(),
        None => read_password(std::io::stdin().lock())?,
    };
    let request = RegisterRequest {
        email: args.email.trim().to_string(),
        password,
        name: args.name.clone(),
    };
    request
        .validate()
        .map_err(|err| fail(ctx.output, &CliError::from(&err)))?;

    let client = ctx.require_client()?;
    let account: RegisteredAccount = client
        .register(&request)
        .map_err(|err| fail(ctx.output, &CliError::from(&err)))?;
    tracing::info!(account = %account.id, "account registered");

    render(ctx.output, &account, |a, w| {
        writeln!(w, "✓ Registered {} ({})", a.email, a.id)?;
        writeln!(w)?;
        writeln!(w, "Sign in on the web app, then export EASE_SESSION=<session token>")
    })
}

fn read_password(mut input: impl BufRead) -> Result<String> {
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(subcommand)]
        command: AccountCommand,
    }

    #[test]
    fn register_needs_a_password_source() {
        assert!(Wrapper::try_parse_from(["test", "register", "me@example.com"]).is_err());
        assert!(
            Wrapper::try_parse_from([
                "test",
                "register",
                "me@example.com",
                "--password",
                "x",
                "--password-stdin"
            ])
            .is_err()
        );
        let w = Wrapper::parse_from(["test", "register", "me@example.com", "--password-stdin"]);
        let AccountCommand::Register(args) = w.command;
        assert!(args.password_stdin);
        assert!(args.password.is_none());
    }

    #[test]
    fn password_line_keeps_inner_whitespace() {
        let password = read_password(&b"  secret pass \r\nignored\n"[..]).unwrap();
        assert_eq!(password, "  secret pass ");
    }
}
