use crate::commands::Commands;
use crate::formatters;
use bytes::Bytes;
use cachectl_config::Config;
use cachectl_core::StreamContent;
use cachectl_dispatch::{CacheTarget, CacheTool};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

impl Commands {
    pub async fn execute(self, config: &Config) -> eyre::Result<()> {
        let tool = CacheTool::from_config(config);
        let target = CacheTarget::new(self.cache());

        match self {
            Commands::DeleteKey { key, .. } => {
                tool.delete_key(&target, &key).await?;
                tracing::info!(key = %key, "deleted key");
            }
            Commands::DeleteStream { key, index, .. } => {
                tool.delete_stream(&target, &key, index).await?;
                tracing::info!(key = %key, index = index.unwrap_or(0), "deleted stream");
            }
            Commands::Size { .. } => {
                let size = tool.get_size(&target).await?;
                tracing::info!("cache size: {}", formatters::human_size(size));
                write_stdout(format!("{size}\n").as_bytes()).await?;
            }
            Commands::GetStream { key, index, .. } => {
                match tool.get_stream(&target, &key, index).await? {
                    StreamContent::Text(text) => {
                        write_stdout(format!("{text}\n").as_bytes()).await?;
                    }
                    StreamContent::Binary(chunks) => {
                        let mut stdout = tokio::io::stdout();
                        for chunk in chunks {
                            stdout.write_all(&chunk).await?;
                        }
                        stdout.flush().await?;
                    }
                }
            }
            Commands::Keys { .. } => {
                let keys = tool.list_keys(&target).await?;
                let mut out = String::new();
                for key in keys {
                    out.push_str(&key);
                    out.push('\n');
                }
                write_stdout(out.as_bytes()).await?;
            }
            Commands::Dups { json, .. } => {
                let records = tool.list_dups(&target).await?;
                let rendered = if json {
                    let mut rendered = formatters::duplicates_as_json(&records)?;
                    rendered.push('\n');
                    rendered
                } else {
                    formatters::duplicates_as_text(&records)
                };
                write_stdout(rendered.as_bytes()).await?;
            }
            Commands::UpdateHeaders { key, .. } => {
                let headers = read_stdin().await?;
                tool.update_raw_headers(&target, &key, headers).await?;
                tracing::info!(key = %key, "updated raw headers");
            }
            Commands::Verify { .. } => {
                tool.verify(&target).await?;
                tracing::info!(cache = %target.path(), "cache opened successfully");
            }
            Commands::Batch { .. } => {
                let script = read_stdin().await?;
                let mut out = String::new();
                for line in tool.batch(&target, script).await? {
                    out.push_str(&line);
                    out.push('\n');
                }
                write_stdout(out.as_bytes()).await?;
            }
        }

        Ok(())
    }
}

async fn write_stdout(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(bytes).await?;
    stdout.flush().await
}

async fn read_stdin() -> std::io::Result<Bytes> {
    let mut buf = Vec::new();
    tokio::io::stdin().read_to_end(&mut buf).await?;
    Ok(Bytes::from(buf))
}
