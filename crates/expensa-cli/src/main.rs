//! Expensa CLI: mint and inspect bearer tokens, upload bills.
//!
//! Set EXPENSA_API_URL (default http://localhost:3000) and, for uploads,
//! EXPENSA_TOKEN or pass --token.

use anyhow::Context;
use clap::{Parser, Subcommand};
use expensa_cli::{
    expires_in_ms, init_tracing, parse_field, UploadClient, DEFAULT_API_URL,
};
use expensa_core::{token::now_epoch_ms, TokenCodec};

#[derive(Parser)]
#[command(name = "expensa", about = "Expense tracker bill upload CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mint a bearer token for a user (development only; tokens are not signed)
    MintToken {
        /// User id the token asserts
        user_id: String,
        /// Display name
        #[arg(long, default_value = "dev")]
        username: String,
    },
    /// Decode a token and report whether it is still accepted
    InspectToken { token: String },
    /// Upload a bill (JPG, PNG or PDF)
    ///
    /// With an object-store backend the returned URL resolves only if the
    /// bucket allows public reads (Azure: container access level `blob`).
    Upload {
        /// Path to the file to upload
        file: std::path::PathBuf,
        /// Bearer token; falls back to EXPENSA_TOKEN
        #[arg(long, env = "EXPENSA_TOKEN")]
        token: String,
        /// Extra form fields, e.g. --field category=Food
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
        /// API base URL
        #[arg(long, env = "EXPENSA_API_URL", default_value = DEFAULT_API_URL)]
        api_url: String,
    },
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let codec = TokenCodec::new();

    match cli.command {
        Commands::MintToken { user_id, username } => {
            let token = codec
                .issue(&user_id, &username)
                .context("Failed to encode token")?;
            println!("{}", token);
        }
        Commands::InspectToken { token } => {
            let now = now_epoch_ms();
            match codec.decode_at(&token, now) {
                Ok(claim) => {
                    let remaining_ms =
                        expires_in_ms(claim.issued_at_epoch_ms, codec.ttl_ms(), now);
                    print_json(&serde_json::json!({
                        "valid": true,
                        "claim": claim,
                        "expires_in_ms": remaining_ms,
                    }))?
                }
                Err(rejection) => print_json(&serde_json::json!({
                    "valid": false,
                    "reason": rejection.to_string(),
                }))?,
            }
        }
        Commands::Upload {
            file,
            token,
            fields,
            api_url,
        } => {
            let client = UploadClient::new(api_url);
            let response = client.upload_bill(&token, &file, &fields).await?;
            print_json(&response)?;
        }
    }

    Ok(())
}
