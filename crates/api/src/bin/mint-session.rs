//! Session token utility for OrgPress
//!
//! Issues a session token for local development, signed with the same
//! secret the API verifies tokens with.
//!
//! Usage:
//!   cargo run --bin mint-session -- <user_id> [ttl_minutes]
//!
//! Reads SESSION_JWT_SECRET from the environment (or .env).
//!
//! Example:
//!   curl -H "Authorization: Bearer $(cargo run -q --bin mint-session -- user_123)" \
//!        http://acme.localhost:3000/create

use orgpress_api::auth::JwtManager;
use orgpress_shared::UserId;
use std::env;
use time::Duration;

const DEFAULT_TTL_MINUTES: i64 = 60;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut args = env::args().skip(1);
    let user_id = match args.next() {
        Some(user_id) if !user_id.trim().is_empty() => user_id,
        _ => {
            eprintln!("Usage: mint-session <user_id> [ttl_minutes]");
            std::process::exit(1);
        }
    };
    let ttl_minutes: i64 = match args.next() {
        Some(ttl) => ttl.parse()?,
        None => DEFAULT_TTL_MINUTES,
    };

    let secret = env::var("SESSION_JWT_SECRET")
        .map_err(|_| anyhow::anyhow!("SESSION_JWT_SECRET must be set"))?;
    if secret.len() < 32 {
        eprintln!("Warning: SESSION_JWT_SECRET is shorter than 32 characters; the API will refuse to start with it.");
    }

    let token = JwtManager::new(&secret).generate_session_token(
        &UserId(user_id),
        None,
        Duration::minutes(ttl_minutes),
    )?;

    println!("{}", token);
    Ok(())
}
