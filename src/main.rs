use apollo_assistant::cli::Args;
use apollo_assistant::{Assistant, Config, StreamEvent, TurnOptions};
use clap::Parser;
use colored::*;
use std::io::{self, BufRead, Write};
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let config = match Config::from_env_and_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            process::exit(1);
        }
    };

    let assistant = match Assistant::new(config) {
        Ok(assistant) => assistant,
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            process::exit(1);
        }
    };

    if args.list_tools {
        for tool in assistant.tools() {
            println!("{}  {}", tool.name.cyan(), tool.description);
        }
        return Ok(());
    }

    let conversation_id = args
        .conversation
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let options = TurnOptions::default();
    let streaming = !args.no_stream;

    if !args.message.is_empty() {
        let message = args.message.join(" ");
        run_turn(&assistant, &message, &conversation_id, &options, streaming).await;
        return Ok(());
    }

    // Interactive session
    println!(
        "{}",
        format!("Apollo ready (conversation {}). /tools, /clear, /quit.", conversation_id).dimmed()
    );
    let stdin = io::stdin();
    loop {
        print!("{} ", ">".green());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            "/quit" | "/exit" => break,
            "/clear" => {
                assistant.clear_conversation(&conversation_id);
                println!("{}", "Conversation cleared.".green());
            }
            "/tools" => {
                for tool in assistant.tools() {
                    println!("{}  {}", tool.name.cyan(), tool.description);
                }
            }
            _ => run_turn(&assistant, line, &conversation_id, &options, streaming).await,
        }
    }

    Ok(())
}

async fn run_turn(
    assistant: &Assistant,
    message: &str,
    conversation_id: &str,
    options: &TurnOptions,
    streaming: bool,
) {
    if streaming {
        let result = assistant
            .stream_message(
                message,
                |event| match event {
                    StreamEvent::Content { content, done } => {
                        print!("{}", content);
                        let _ = io::stdout().flush();
                        if done {
                            println!();
                        }
                    }
                    StreamEvent::ToolExecutionStart { tool_name, .. } => {
                        println!("{}", format!("Calling tool: {}...", tool_name).cyan());
                    }
                    StreamEvent::ToolError { tool_name, error, .. } => {
                        eprintln!("{}", format!("Tool {} failed: {}", tool_name, error).yellow());
                    }
                    StreamEvent::Error { error, .. } => {
                        eprintln!("{}", error.red());
                    }
                    _ => {}
                },
                Some(conversation_id),
                options,
            )
            .await;

        if let Err(e) = result {
            eprintln!("{} {}", "Error:".red(), e);
        }
    } else {
        match assistant
            .send_message(message, Some(conversation_id), options)
            .await
        {
            Ok(outcome) => {
                if !outcome.tool_calls.is_empty() {
                    let names: Vec<&str> = outcome
                        .tool_calls
                        .iter()
                        .map(|c| c.function.name.as_str())
                        .collect();
                    println!("{}", format!("Tools used: {}", names.join(", ")).cyan());
                }
                println!("{}", outcome.message.unwrap_or_default());
            }
            Err(e) => eprintln!("{} {}", "Error:".red(), e),
        }
    }
}
