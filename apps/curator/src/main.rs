mod config;
mod export;
mod files;
mod input;
mod render;

use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::Parser;
use client_core::{spawn_session, Command, HttpContentBackend, Session, SessionHandle, SessionView};
use shared::domain::AccountName;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::watch,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    config::{load_settings, Settings},
    export::CliExport,
    files::read_media_files,
    input::{parse_line, Input, HELP},
    render::render,
};

#[derive(Parser, Debug)]
#[command(about = "Curate per-account media queues from the terminal")]
struct Args {
    /// Backend host. The API listens on the port base, the media host one port above.
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port_base: Option<u16>,
    /// Account to open once connected.
    #[arg(long)]
    account: Option<String>,
    /// Directory downloads are written to.
    #[arg(long)]
    out: Option<PathBuf>,
}

impl Args {
    fn apply(&self, settings: &mut Settings) {
        if let Some(host) = &self.host {
            settings.backend_host = Some(host.clone());
        }
        if let Some(port_base) = self.port_base {
            settings.backend_port_base = port_base;
        }
        if let Some(out) = &self.out {
            settings.download_dir = out.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut settings = load_settings();
    args.apply(&mut settings);
    info!(download_dir = %settings.download_dir.display(), "curator starting");

    let handle = spawn_session(
        Session::new(settings.session_settings()),
        Arc::new(HttpContentBackend::new()),
        Arc::new(CliExport::new(settings.download_dir.clone())),
    );
    let printer = tokio::spawn(print_views(handle.subscribe()));

    if let Some(host) = settings.backend_host.clone() {
        handle.send(Command::Connect { host }).await?;
        if let Some(account) = &args.account {
            handle
                .send(Command::SelectAccount(Some(AccountName::new(account.as_str()))))
                .await?;
        }
    }

    let result = read_commands(&handle).await;
    printer.abort();
    handle.shutdown().await?;
    result
}

async fn read_commands(handle: &SessionHandle) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Ok(Input::Command(command)) => handle.send(command).await?,
            Ok(Input::Upload(paths)) => match read_media_files(&paths).await {
                Ok(files) => handle.send(Command::Upload(files)).await?,
                Err(err) => {
                    warn!("upload aborted: {err:#}");
                    println!("{err:#}");
                }
            },
            Ok(Input::Show) => print!("{}", render(&handle.current())),
            Ok(Input::Help) => println!("{HELP}"),
            Ok(Input::Quit) => break,
            Ok(Input::Nothing) => {}
            Err(err) => println!("{err}"),
        }
    }
    Ok(())
}

async fn print_views(mut views: watch::Receiver<SessionView>) {
    while views.changed().await.is_ok() {
        let text = render(&views.borrow_and_update());
        print!("{text}");
    }
}
