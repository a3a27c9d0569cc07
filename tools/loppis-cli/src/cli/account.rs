use anyhow::Context;
use clap::{Args, Subcommand};
use loppis_client::auth::{Credentials, EmailVerification, Registration};

use super::GlobalArgs;

#[derive(Debug, Args)]
pub(crate) struct AccountCommand {
    #[command(subcommand)]
    command: AccountSubcommand,
}

#[derive(Debug, Subcommand)]
enum AccountSubcommand {
    /// Create an account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "LOPPIS_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        city: String,
    },
    /// Log in and print an access token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "LOPPIS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Show the account behind a token
    Me {
        #[arg(long, env = "LOPPIS_TOKEN", hide_env_values = true)]
        token: String,
    },
    /// Confirm an email address with the emailed token
    VerifyEmail {
        #[arg(long)]
        email: String,
        #[arg(long)]
        token: String,
    },
}

pub(crate) async fn run(global: &GlobalArgs, command: AccountCommand) -> anyhow::Result<()> {
    let service = global.service()?;
    match command.command {
        AccountSubcommand::Register {
            email,
            password,
            name,
            city,
        } => {
            let receipt = service
                .register(&Registration {
                    email,
                    password,
                    name,
                    city,
                })
                .await
                .context("registration failed")?;
            println!("{}", receipt.msg);
            if let Some(token) = receipt.verification_token {
                println!("verification_token: {token}");
            }
        }
        AccountSubcommand::Login { email, password } => {
            let token = service
                .login(&Credentials { email, password })
                .await
                .context("login failed")?;
            println!("access_token: {}", token.access_token);
            println!("token_type: {}", token.token_type);
        }
        AccountSubcommand::Me { token } => {
            let profile = service.me(&token).await.context("could not fetch account")?;
            println!("user_id:  {}", profile.id);
            println!("email:    {}", profile.email);
            println!("name:     {}", profile.name.as_deref().unwrap_or("-"));
            println!("city:     {}", profile.city.as_deref().unwrap_or("-"));
            println!("verified: {}", profile.email_verified);
        }
        AccountSubcommand::VerifyEmail { email, token } => {
            let response = service
                .verify_email(&EmailVerification { email, token })
                .await
                .context("email verification failed")?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }
    Ok(())
}
