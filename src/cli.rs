use std::net::SocketAddr;

use clap::{Args, Parser, Subcommand};

use crate::styles::StyleTopic;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Remote site root or REST API root (default: $WORDPRESS_API_URL, then the built-in host).
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the header/footer/styles endpoints over HTTP.
    Serve(ServeArgs),
    /// Print the composed header fragment as JSON.
    Header,
    /// Print the composed footer fragment as JSON.
    Footer,
    /// Print the composed style bundle as JSON.
    Styles(StylesArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Listen address.
    #[arg(long, default_value = "127.0.0.1:3006")]
    pub addr: SocketAddr,
}

#[derive(Debug, Args)]
pub struct StylesArgs {
    /// Which fragment the styles are collected for.
    #[arg(long, value_enum, default_value_t = StyleTopic::Global)]
    pub topic: StyleTopic,
}
