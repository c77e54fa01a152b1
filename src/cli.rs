use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "apollo")]
#[command(about = "Chat with the Apollo assistant engine", long_about = None)]
pub struct Args {
    #[arg(
        short = 'c',
        long = "conversation",
        help = "Conversation id to continue (defaults to a fresh id per session)"
    )]
    pub conversation: Option<String>,

    #[arg(long = "no-stream", help = "Wait for complete replies instead of streaming")]
    pub no_stream: bool,

    #[arg(long = "model", help = "Override the configured model")]
    pub model: Option<String>,

    #[arg(
        long = "api-endpoint",
        help = "Custom API base URL (e.g., http://localhost:11434/v1)"
    )]
    pub api_endpoint: Option<String>,

    #[arg(
        long = "plugins-dir",
        help = "Directory of tool plugin manifests to load at startup"
    )]
    pub plugins_dir: Option<PathBuf>,

    #[arg(long = "list-tools", help = "Print the registered tools and exit")]
    pub list_tools: bool,

    #[arg(help = "Message to send; starts an interactive session when omitted")]
    pub message: Vec<String>,
}
