mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use post_cache::{PostCache, SearchPage, SearchRequest};
use serde_json::json;
use stash_sql::{Translation, Translator};
use std::io::{BufRead, Write};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cache = cli
        .db
        .as_deref()
        .map(PostCache::open)
        .transpose()
        .context("Failed to open post cache")?;
    let translator = Translator::new();

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        stdout.flush().context("Failed to flush stdout")?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("Failed to read stdin")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        } else if line == "/bye" {
            break;
        }

        let status = cli.status.map(|status| status.as_str());
        match &cache {
            Some(cache) => {
                let request = SearchRequest {
                    status: cli.status,
                    limit: cli.limit,
                    ..SearchRequest::new(line)
                };
                match cache.search(&request) {
                    Ok(page) => print_page(&page, cli.json)?,
                    Err(e) => eprintln!("Failed to search: {e:?}"),
                }
            }
            None => print_translation(&translator.translate(line, status), cli.json)?,
        }
    }

    Ok(())
}

fn print_translation(translation: &Translation, as_json: bool) -> Result<()> {
    let reason = translation.fallback.as_ref().map(ToString::to_string);
    if as_json {
        let value = json!({
            "sql": translation.sql,
            "params": translation.params,
            "metadata": translation.metadata,
            "fallback": reason,
        });
        println!("{}", serde_json::to_string(&value).context("Failed to encode translation")?);
        return Ok(());
    }

    println!("sql:      {}", translation.sql);
    println!("params:   {:?}", translation.params);
    let metadata = &translation.metadata;
    if let Some(sort_by) = &metadata.sort_by {
        let order = metadata.sort_order.map(|order| order.as_sql()).unwrap_or("-");
        println!("sort:     {sort_by} {order}");
    }
    if let Some(per_page) = metadata.per_page {
        println!("per-page: {per_page}");
    }
    if let Some(reason) = reason {
        println!("fallback: {reason}");
    }
    Ok(())
}

fn print_page(page: &SearchPage, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string(page).context("Failed to encode results")?);
        return Ok(());
    }
    if page.fell_back {
        println!("(query ignored, showing status filter only)");
    }
    for (i, post) in page.posts.iter().enumerate() {
        println!(
            "[{}] #{} score={} {}x{} {}",
            page.offset as usize + i,
            post.post_id,
            post.score,
            post.width,
            post.height,
            post.tags.join(" ")
        );
    }
    println!("{} of {} matches", page.posts.len(), page.total);
    Ok(())
}
