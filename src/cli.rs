//! Command-line interface and environment configuration.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Every option can also be supplied through an environment variable, and a
//! `.env` file in the working directory is loaded before parsing.

use crate::error::{Result, ScrapeError};
use crate::fetch::{DEFAULT_PROXY_ENDPOINT, FetchStrategy};
use crate::headers::{HEADERS_FILE_NAME, HeaderDefaults};
use crate::store::{DbSettings, TableNames};
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the profile harvester.
///
/// # Examples
///
/// ```sh
/// # Harvest the pending worklist into Postgres
/// DB_HOST=db.internal DB_USER=scraper podcast_profiles
///
/// # Try two pages without touching the database
/// podcast_profiles --dry-run --url https://podcasts.apple.com/us/podcast/id1
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory holding headers.json and dry-run output
    #[arg(long, env = "DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Harvest these URLs instead of the database worklist (repeatable)
    #[arg(long = "url", value_name = "URL")]
    pub urls: Vec<String>,

    /// Write records as JSON lines in the data directory instead of inserting them
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long, env = "DB_HOST")]
    pub db_host: Option<String>,

    #[arg(long, env = "DB_PORT")]
    pub db_port: Option<u16>,

    #[arg(long, env = "DB_USER")]
    pub db_user: Option<String>,

    #[arg(long, env = "DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    #[arg(long, env = "DB_NAME")]
    pub db_name: Option<String>,

    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 5)]
    pub db_max_connections: u32,

    /// Schema holding the worklist view and the profile table
    #[arg(long, env = "DB_SCHEMA", default_value = "apple_podcasts")]
    pub db_schema: String,

    #[arg(long, env = "DB_WORKLIST_VIEW", default_value = "not_scraped_profiles_vw")]
    pub db_worklist_view: String,

    #[arg(long, env = "DB_PROFILE_TABLE", default_value = "profiles")]
    pub db_profile_table: String,

    /// Fetch pages through the rendering proxy instead of directly
    #[arg(
        long,
        env = "SCRAPE_NINJA_ENABLED",
        default_value_t = false,
        action = clap::ArgAction::Set,
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub scrape_ninja_enabled: bool,

    #[arg(long, env = "SCRAPE_NINJA_API_KEY", hide_env_values = true)]
    pub scrape_ninja_api_key: Option<String>,

    #[arg(long, env = "SCRAPE_NINJA_ENDPOINT", default_value = DEFAULT_PROXY_ENDPOINT)]
    pub scrape_ninja_endpoint: String,

    #[arg(
        long,
        env = "USER_AGENT",
        default_value = "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:145.0) Gecko/20100101 Firefox/145.0"
    )]
    pub user_agent: String,

    #[arg(
        long,
        env = "REQUEST_ACCEPT",
        default_value = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
    )]
    pub accept: String,

    #[arg(long, env = "REQUEST_ACCEPT_LANGUAGE", default_value = "en-US,en;q=0.5")]
    pub accept_language: String,

    #[arg(long, env = "REQUEST_ACCEPT_ENCODING", default_value = "deflate")]
    pub accept_encoding: String,

    #[arg(long, env = "REQUEST_COOKIE", default_value = "", hide_env_values = true)]
    pub cookie: String,
}

impl Cli {
    pub fn headers_file(&self) -> PathBuf {
        self.data_dir.join(HEADERS_FILE_NAME)
    }

    /// Whether the run needs a database connection at all.
    pub fn needs_database(&self) -> bool {
        !(self.dry_run && !self.urls.is_empty())
    }

    pub fn header_defaults(&self) -> HeaderDefaults {
        HeaderDefaults {
            accept: self.accept.clone(),
            accept_language: self.accept_language.clone(),
            accept_encoding: self.accept_encoding.clone(),
            cookie: self.cookie.clone(),
            user_agent: self.user_agent.clone(),
        }
    }

    /// Pick the fetch strategy; the proxy requires an API key.
    pub fn fetch_strategy(&self) -> Result<FetchStrategy> {
        if !self.scrape_ninja_enabled {
            return Ok(FetchStrategy::Direct);
        }
        let api_key = self
            .scrape_ninja_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                ScrapeError::Config(
                    "SCRAPE_NINJA_API_KEY is required when SCRAPE_NINJA_ENABLED is true".to_string(),
                )
            })?;
        Ok(FetchStrategy::Proxied {
            endpoint: self.scrape_ninja_endpoint.clone(),
            api_key: api_key.to_string(),
        })
    }

    pub fn db_settings(&self) -> DbSettings {
        DbSettings {
            host: self.db_host.clone(),
            port: self.db_port,
            user: self.db_user.clone(),
            password: self.db_password.clone(),
            database: self.db_name.clone(),
            max_connections: self.db_max_connections,
        }
    }

    pub fn table_names(&self) -> TableNames {
        TableNames {
            schema: self.db_schema.clone(),
            worklist_view: self.db_worklist_view.clone(),
            profile_table: self.db_profile_table.clone(),
        }
    }
}
