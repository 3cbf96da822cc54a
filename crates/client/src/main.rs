//! Interactive terminal client
//!
//! Two screens: a login form and a query loop. The bearer token is the only
//! session state; a 401 drops back to the login screen.

mod api;

use std::io::{self, Write};

use api::{ApiClient, AskOutcome, LoginOutcome};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let base_url = std::env::var("MEDISECURE_API_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:8000".to_string());
    let client = ApiClient::new(&base_url)?;

    println!("MediSecure AI -- secure medical RAG ({base_url})");

    let mut token: Option<String> = None;

    loop {
        let Some(current) = token.clone() else {
            match login_screen(&client).await? {
                Some(fresh) => {
                    token = Some(fresh);
                    continue;
                }
                None => break,
            }
        };

        if !query_screen(&client, &current, &mut token).await? {
            break;
        }
    }

    Ok(())
}

/// Prompt for credentials until login succeeds.
///
/// Returns `None` on EOF or an explicit quit.
async fn login_screen(client: &ApiClient) -> anyhow::Result<Option<String>> {
    loop {
        println!("\n-- Doctor Login (type 'quit' to exit) --");

        let username = match prompt("Username: ")? {
            Some(value) if value != "quit" => value,
            _ => return Ok(None),
        };
        let password = match prompt("Password: ")? {
            Some(value) if value != "quit" => value,
            _ => return Ok(None),
        };

        match client.login(&username, &password).await? {
            LoginOutcome::Success(token) => {
                println!("Login successful");
                return Ok(Some(token));
            }
            LoginOutcome::Rejected(detail) => println!("{detail}"),
        }
    }
}

/// One round of the query screen.
///
/// Returns false when the user quits; clears the token on session expiry.
async fn query_screen(
    client: &ApiClient,
    current: &str,
    token: &mut Option<String>,
) -> anyhow::Result<bool> {
    println!("\n-- Secure Medical RAG (type 'logout' or 'quit') --");

    let question = match prompt("Enter patient symptoms: ")? {
        Some(value) => value,
        None => return Ok(false),
    };

    match question.as_str() {
        "quit" => return Ok(false),
        "logout" => {
            *token = None;
            return Ok(true);
        }
        "" => return Ok(true),
        _ => {}
    }

    match client.ask(current, &question).await? {
        AskOutcome::Answer(answer) => println!("\n{answer}"),
        AskOutcome::SessionExpired => {
            println!("Session expired");
            *token = None;
        }
        AskOutcome::Failed(detail) => println!("{detail}"),
    }

    Ok(true)
}

/// Read one trimmed line from stdin; `None` on EOF.
fn prompt(label: &str) -> anyhow::Result<Option<String>> {
    print!("{label}");
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
