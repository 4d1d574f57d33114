use std::process::ExitCode;

use carenet_auth::{create_access_token, create_refresh_token};
use carenet_config::JwtConfig;
use carenet_core::Role;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "carenet-cli")]
#[command(about = "CareNet CLI - Developer tools for the CareNet API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign an access token for local testing
    IssueToken {
        /// Subject user ID; must exist in the store for requests to succeed
        #[arg(short = 'u', long)]
        user_id: Uuid,

        /// Role embedded in the token (SUPER_ADMIN, MODERATOR, COMPANY, GUARDIAN, CAREGIVER, PATIENT)
        #[arg(short = 'r', long)]
        role: Role,

        /// Company for COMPANY accounts and employed caregivers
        #[arg(short = 'c', long)]
        company_id: Option<Uuid>,

        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Also print a refresh token
        #[arg(long)]
        with_refresh: bool,
    },
}

fn main() -> ExitCode {
    dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::IssueToken {
            user_id,
            role,
            company_id,
            email,
            with_refresh,
        } => {
            let config = JwtConfig::from_env();

            let access = match create_access_token(
                user_id,
                role,
                company_id,
                email.as_deref(),
                &config,
            ) {
                Ok(token) => token,
                Err(e) => {
                    eprintln!("Error issuing token: {}", e.error);
                    return ExitCode::FAILURE;
                }
            };
            eprintln!("Issued access token for {role} ({})", role.description());
            println!("{access}");

            if with_refresh {
                match create_refresh_token(user_id, &config) {
                    Ok(token) => println!("{token}"),
                    Err(e) => {
                        eprintln!("Error issuing refresh token: {}", e.error);
                        return ExitCode::FAILURE;
                    }
                }
            }

            ExitCode::SUCCESS
        }
    }
}
