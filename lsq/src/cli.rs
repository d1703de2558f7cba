use clap::Parser;
use post_cache::PostStatus;
use std::path::PathBuf;

#[derive(Parser)]
pub struct Cli {
    #[clap(long)]
    /// Post cache database. Without it queries are only translated.
    pub db: Option<PathBuf>,
    #[clap(long)]
    /// Restrict to `pending` or `saved` posts.
    pub status: Option<PostStatus>,
    #[clap(long, default_value_t = post_cache::DEFAULT_PAGE_SIZE)]
    pub limit: u32,
    #[clap(long, default_value = "false")]
    /// Print JSON instead of plain lines.
    pub json: bool,
}
