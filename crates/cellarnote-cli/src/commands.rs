//! Subcommand handlers.

use anyhow::{Context, Result};
use cellarnote_core::api::WineSearch;
use cellarnote_core::{ApiError, ApiRequest, SessionClient};
use serde::Serialize;
use serde_json::Value;

use crate::{Commands, LoginProvider, OutputFormat};

#[derive(Serialize)]
struct StatusReport {
    session: String,
    storage: String,
    api_url: String,
    config_source: String,
    signed_in_at: Option<String>,
}

pub async fn run(client: &SessionClient, command: Commands, format: OutputFormat) -> Result<()> {
    match command {
        Commands::Login { provider } => login(client, provider, format).await,
        Commands::Logout => {
            client.logout().await.map_err(with_login_hint)?;
            println!("Signed out");
            Ok(())
        }
        Commands::Status => status(client, format),
        Commands::Whoami => {
            let info = client.member_info().await.map_err(with_login_hint)?;
            match format {
                OutputFormat::Json => print_json(&info),
                OutputFormat::Text => {
                    println!("{} ({})", info.username, info.auth_type);
                    if let Some(email) = info.email.as_deref() {
                        println!("Email: {}", email);
                    }
                    if !info.has_taste_profile() {
                        println!("Taste profile not set up yet");
                    }
                    Ok(())
                }
            }
        }
        Commands::Search { name, page } => {
            let search = WineSearch {
                page: Some(page),
                ..WineSearch::by_name(name)
            };
            let results = client.search_wines(&search).await.map_err(with_login_hint)?;
            match format {
                OutputFormat::Json => print_json(&results),
                OutputFormat::Text => {
                    for wine in &results.content {
                        let vintage = wine.vintage_year.map(|y| y.to_string()).unwrap_or_default();
                        println!(
                            "{:>6}  {} {} ({}, {})",
                            wine.wine_id, wine.name, vintage, wine.variety, wine.country
                        );
                    }
                    println!(
                        "Page {} of {}",
                        results.page_number + 1,
                        results.total_pages.max(1)
                    );
                    Ok(())
                }
            }
        }
        Commands::Cellar => {
            let cellar = client.my_wines().await.map_err(with_login_hint)?;
            match format {
                OutputFormat::Json => print_json(&cellar),
                OutputFormat::Text => {
                    if cellar.is_empty() {
                        println!("Your cellar is empty");
                    }
                    for bottle in &cellar {
                        let vintage = bottle.vintage_year.map(|y| y.to_string()).unwrap_or_default();
                        println!(
                            "{} {}  bought {} for {} ({} days ago)",
                            bottle.wine_name,
                            vintage,
                            bottle.purchase_date,
                            bottle.purchase_price,
                            bottle.period
                        );
                    }
                    Ok(())
                }
            }
        }
        Commands::Get { path } => {
            let response = client
                .request(ApiRequest::get(path))
                .await
                .map_err(with_login_hint)?;
            let body = response.text().await.context("Failed to read response body")?;
            match serde_json::from_str::<Value>(&body) {
                Ok(value) => print_json(&value),
                Err(_) => {
                    println!("{}", body);
                    Ok(())
                }
            }
        }
    }
}

async fn login(client: &SessionClient, provider: LoginProvider, format: OutputFormat) -> Result<()> {
    let result = match provider {
        LoginProvider::Apple { identity_token } => {
            let token = match identity_token {
                Some(token) => token,
                None => rpassword::prompt_password("Apple identity token: ")
                    .context("Failed to read identity token")?,
            };
            client.login_with_apple(token.trim()).await?
        }
        LoginProvider::Kakao {
            name,
            email,
            social_id,
        } => client.login_with_kakao(&name, &email, &social_id).await?,
    };

    match format {
        OutputFormat::Json => print_json(&result),
        OutputFormat::Text => {
            println!("Signed in as {} ({})", result.username, result.role);
            if result.is_first {
                println!("Welcome! Finish the taste questionnaire in the app to get recommendations.");
            }
            Ok(())
        }
    }
}

fn status(client: &SessionClient, format: OutputFormat) -> Result<()> {
    let config = client.config();
    let signed_in_at = client
        .stored_credentials()?
        .and_then(|pair| pair.issued_at)
        .map(|at| at.to_rfc3339());

    let report = StatusReport {
        session: format!("{:?}", client.session_state()),
        storage: client.storage_description(),
        api_url: config.base_url.clone(),
        config_source: config.source.to_string(),
        signed_in_at,
    };

    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Text => {
            println!("Session:  {}", report.session);
            if let Some(ref at) = report.signed_in_at {
                println!("Since:    {}", at);
            }
            println!("Storage:  {}", report.storage);
            println!("API:      {} ({})", report.api_url, report.config_source);
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Point the user at `login` when the session is gone.
fn with_login_hint(err: ApiError) -> anyhow::Error {
    if err.is_session_terminal() {
        anyhow::Error::new(err).context("Session expired - run `cellarnote login` to sign in again")
    } else {
        err.into()
    }
}
