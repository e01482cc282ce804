use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use vscompare::api::ChatMessage;
use vscompare::{Config, StreamId, SummaryTracker};

pub async fn cmd_upload(config: &Config, file: &Path) -> Result<()> {
    let client = config.backend_client()?;
    eprintln!("⬆️  Uploading {}", file.display());

    let info = client
        .upload_file(file, |percent| {
            eprint!("\r   {percent:>5.1}%");
            let _ = std::io::stderr().flush();
        })
        .await
        .with_context(|| format!("upload of {} failed", file.display()))?;
    eprintln!();

    println!("✅ Uploaded {} as {}", info.name, info.id);
    Ok(())
}

pub async fn cmd_files(config: &Config) -> Result<()> {
    let files = config.backend_client()?.list_files().await?;
    if files.is_empty() {
        println!("No files uploaded");
        return Ok(());
    }

    for f in &files {
        let status = f
            .status
            .map(|s| format!("{s:?}").to_lowercase())
            .unwrap_or_default();
        println!(
            "{:<24} {:<32} {:>10} {:<19} {status}",
            f.id,
            f.name,
            human_size(f.size),
            f.upload_time
        );
    }
    println!("\n({} files)", files.len());
    Ok(())
}

pub async fn cmd_delete(config: &Config, id: &str) -> Result<()> {
    config.backend_client()?.delete_file(id).await?;
    println!("🗑️  Deleted {id}");
    Ok(())
}

pub async fn cmd_chat(config: &Config, message: &str, file_id: Option<&str>) -> Result<()> {
    let client = config.backend_client()?;
    let mut messages = Vec::with_capacity(2);
    if !config.summarization.system_prompt.is_empty() {
        messages.push(ChatMessage::system(&config.summarization.system_prompt));
    }
    messages.push(ChatMessage::user(message));

    let answer = client.chat(&messages, file_id).await?;
    println!("{answer}");
    Ok(())
}

/// Stream a summary to stdout; Ctrl-C aborts the in-flight request
pub async fn cmd_summarize(
    config: &Config,
    file_id: &str,
    slot: u32,
    model: Option<String>,
    prompt: Option<String>,
    chunk_duration: Option<u32>,
) -> Result<()> {
    let client = config.backend_client()?;
    let mut params = config.summarize_params(file_id);
    if let Some(model) = model {
        params.model = model;
    }
    if let Some(prompt) = prompt {
        params.prompt = Some(prompt);
    }
    if let Some(secs) = chunk_duration {
        params.chunk_duration = Some(secs);
    }

    eprintln!("📝 Summarizing {file_id} with {}", params.model);
    let mut tracker = SummaryTracker::new();
    let job = tracker.start(StreamId(slot), client, params, |chunk| {
        print!("{chunk}");
        let _ = std::io::stdout().flush();
    });

    tokio::select! {
        result = job.wait() => {
            let summary = result?;
            if !summary.ends_with('\n') {
                println!();
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracker.cancel();
            eprintln!("\n⏹  Summary cancelled");
        }
    }
    Ok(())
}

pub async fn cmd_models(config: &Config) -> Result<()> {
    let models = config.backend_client()?.models().await?;
    for m in &models {
        match &m.description {
            Some(desc) => println!("{:<24} {}  ({desc})", m.id, m.name),
            None => println!("{:<24} {}", m.id, m.name),
        }
    }
    Ok(())
}

pub async fn cmd_alerts(config: &Config) -> Result<()> {
    let alerts = config.backend_client()?.recent_alerts().await?;
    if alerts.is_empty() {
        println!("No recent alerts");
        return Ok(());
    }

    for a in &alerts {
        let severity = format!("{:?}", a.severity).to_uppercase();
        println!(
            "[{severity}] {} {}: {} (file {})",
            a.timestamp, a.alert_type, a.description, a.file_id
        );
    }
    Ok(())
}

pub async fn cmd_health(config: &Config) -> Result<()> {
    let client = config.backend_client()?;
    let models = client
        .health()
        .await
        .with_context(|| format!("backend at {} is not healthy", client.base_url()))?;
    println!(
        "✅ Backend at {} is healthy ({models} models)",
        client.base_url()
    );
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_are_humanized() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(1536), "1.5 KB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MB");
    }
}
