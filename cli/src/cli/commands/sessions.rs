use unicorn_core::config::Config;
use unicorn_core::session::SessionRecord;

use super::local_base_url;

pub async fn run(config: &Config) -> anyhow::Result<()> {
    let url = format!("{}/api/sessions", local_base_url(config));
    let response = reqwest::get(&url).await?;

    if !response.status().is_success() {
        anyhow::bail!("{} returned {}", url, response.status());
    }

    let sessions: Vec<SessionRecord> = response.json().await?;
    if sessions.is_empty() {
        println!("No sessions tracked");
        return Ok(());
    }

    println!("{:<34} {:<24} {:<28} {:<28}", "UNICORN", "SESSION", "SESSION IDENTIFIER", "CLIENT IDENTIFIER");
    for s in &sessions {
        println!(
            "{:<34} {:<24} {:<28} {:<28}",
            s.id, s.session, s.session_identifier, s.client_identifier
        );
    }
    println!();
    println!("{} session(s)", sessions.len());

    Ok(())
}
