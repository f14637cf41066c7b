use clap::Subcommand;

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Delete a key and all of its streams
    DeleteKey {
        /// Path to the cache directory
        cache: String,
        /// Cache key to delete
        key: String,
    },

    /// Delete one stream of a key
    DeleteStream {
        cache: String,
        key: String,
        /// Stream index, 0 (raw headers) by default
        #[arg(short, long)]
        index: Option<u32>,
    },

    /// Print the total size of the cache in bytes
    #[command(visible_alias = "get-size")]
    Size { cache: String },

    /// Print one stream of a key; stream 0 is written raw
    GetStream {
        cache: String,
        key: String,
        /// Stream index, 0 (raw headers) by default
        #[arg(short, long)]
        index: Option<u32>,
    },

    /// List every key in the cache
    #[command(visible_alias = "list-keys")]
    Keys { cache: String },

    /// List entries whose bodies are duplicated
    #[command(visible_alias = "list-dups")]
    Dups {
        cache: String,
        /// Emit JSON instead of one record per line
        #[arg(long)]
        json: bool,
    },

    /// Replace the raw response headers of a key with stdin
    UpdateHeaders { cache: String, key: String },

    /// Check that the cache opens with the selected backend
    Verify { cache: String },

    /// Run serialized commands read from stdin in cachetool's batch mode
    Batch { cache: String },
}

impl Commands {
    /// The cache directory every subcommand targets
    pub fn cache(&self) -> &str {
        match self {
            Commands::DeleteKey { cache, .. }
            | Commands::DeleteStream { cache, .. }
            | Commands::Size { cache }
            | Commands::GetStream { cache, .. }
            | Commands::Keys { cache }
            | Commands::Dups { cache, .. }
            | Commands::UpdateHeaders { cache, .. }
            | Commands::Verify { cache }
            | Commands::Batch { cache } => cache,
        }
    }
}
