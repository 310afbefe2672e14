//! Command-line and environment configuration
//!
//! Every flag can also be set through the environment variable named next to
//! it; a `.env` file in the working directory is loaded first.

use analysis_core::Settings;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "backend", version, about = "Stockfish-powered chess move analysis API")]
pub struct Args {
    /// Address the HTTP server binds to
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    #[arg(long, env = "STOCKFISH_PATH", default_value = "/usr/games/stockfish")]
    pub stockfish_path: PathBuf,

    /// Extra arguments passed to the engine binary
    #[arg(long = "stockfish-arg", env = "STOCKFISH_ARGS", value_delimiter = ' ')]
    pub stockfish_args: Vec<String>,

    /// Search depth when a request omits it
    #[arg(long, env = "STOCKFISH_DEPTH", default_value_t = 20)]
    pub stockfish_depth: u32,

    #[arg(long, env = "STOCKFISH_THREADS", default_value_t = 2)]
    pub stockfish_threads: u32,

    #[arg(long, env = "STOCKFISH_HASH_MB", default_value_t = 128)]
    pub stockfish_hash_mb: u32,

    /// Candidate moves when a request omits `breadth`
    #[arg(long, env = "STOCKFISH_TOP_MOVES", default_value_t = 3)]
    pub stockfish_top_moves: u32,

    /// Wall-clock cap per engine query; unset means depth is the only bound
    #[arg(long, env = "STOCKFISH_TIMEOUT_SECONDS")]
    pub stockfish_timeout_seconds: Option<u64>,

    #[arg(long, env = "REDIS_URL", default_value = "redis://localhost:6379")]
    pub redis_url: String,

    /// Keep results in process memory instead of Redis
    #[arg(long, env = "MEMORY_CACHE")]
    pub memory_cache: bool,

    #[arg(long, env = "CACHE_TTL_SECONDS", default_value_t = 60)]
    pub cache_ttl_seconds: u64,

    /// Comma-separated CORS origins, `*` for any
    #[arg(long, env = "ALLOWED_ORIGINS", value_delimiter = ',', default_value = "*")]
    pub allowed_origins: Vec<String>,
}

impl Args {
    pub fn settings(&self) -> Settings {
        Settings {
            engine_path: self.stockfish_path.clone(),
            engine_args: self
                .stockfish_args
                .iter()
                .filter(|arg| !arg.is_empty())
                .cloned()
                .collect(),
            engine_threads: self.stockfish_threads,
            engine_hash_mb: self.stockfish_hash_mb,
            engine_timeout_secs: self.stockfish_timeout_seconds,
            default_depth: self.stockfish_depth,
            default_breadth: self.stockfish_top_moves,
            cache_url: (!self.memory_cache).then(|| self.redis_url.clone()),
            cache_ttl_secs: self.cache_ttl_seconds,
        }
    }
}
