use std::{thread, time::Duration};

use colored::Colorize;
use commands::{Command, HELP};
use config::ClientConfig;
use crowdwork_collab::{EventReceiver, SubscriptionHandle, SyncEvent, Synchronizer};
use crowdwork_core::{Config, GuardStoreError};
use crowdwork_impls::{FileGuardStore, HttpBackend, WebSocketTransport};
use log::{error, info, warn};
use thiserror::Error;
use tokio::{
    io::{stdin, AsyncBufReadExt, BufReader},
    runtime::{self, Runtime},
    sync::mpsc::{unbounded_channel, UnboundedSender},
};

mod commands;
mod config;
mod logging;
mod render;

/// How long to wait before resubscribing after the channel dropped
const RECONNECT_DELAY: Duration = Duration::from_secs(2);

type Client = Synchronizer<HttpBackend, WebSocketTransport>;
type Handle = SubscriptionHandle<HttpBackend, WebSocketTransport>;

pub struct Crowdwork {
    config: ClientConfig,
    client: Client,
    runtime: Runtime,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("No session id was given")]
    MissingSession,

    #[error("{variable} is not a valid url: {reason}")]
    InvalidUrl {
        variable: &'static str,
        reason: String,
    },

    #[error("Could not open the vote guard: {0}")]
    Guard(#[from] GuardStoreError),

    #[error("Fatal error: {0}")]
    Fatal(String),
}

impl Crowdwork {
    fn new() -> Result<Self, ClientError> {
        let config = ClientConfig::from_env()?;

        info!("Building async runtime...");
        let runtime = runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("crowdwork-async")
            .build()
            .map_err(|e| ClientError::Fatal(e.to_string()))?;

        let backend = match &config.token {
            Some(token) => HttpBackend::new(config.api_url.clone()).with_token(token),
            None => HttpBackend::new(config.api_url.clone()),
        };
        let transport = WebSocketTransport::new(config.socket_url.clone());
        let guard_store = FileGuardStore::new(&config.guard_file);
        info!("Remembering votes in {}", guard_store.path().display());

        let client = Synchronizer::new(Config::default(), backend, transport, guard_store)?;

        Ok(Self {
            config,
            client,
            runtime,
        })
    }

    fn run(self) {
        let Self {
            config,
            client,
            runtime,
        } = self;

        runtime.block_on(run_session(config, client));
    }
}

impl ClientError {
    fn hint(&self) -> String {
        match self {
            ClientError::MissingSession => "Pass the id of the dancefloor to join, for example: crowdwork 6650c1f2".to_string(),
            ClientError::InvalidUrl { .. } => "Make sure CROWDWORK_API_URL and CROWDWORK_SOCKET_URL are absolute urls, like http://localhost:8080.".to_string(),
            ClientError::Guard(_) => "The vote guard file could not be read. Fix or delete the file set in CROWDWORK_GUARD_FILE, then try again.".to_string(),
            ClientError::Fatal(_) => "This error is fatal, and should not happen.".to_string(),
        }
    }
}

async fn run_session(config: ClientConfig, client: Client) {
    let session_id = config.session_id.as_str();

    match client.check_auth().await {
        Ok(auth) if auth.is_logged_in => info!("Logged in"),
        Ok(_) => info!("Not logged in, joining as a guest"),
        Err(e) => warn!("Could not check login status: {}", e),
    }

    info!("Loading session {}...", session_id);
    if let Err(e) = client.load_initial_state(session_id).await {
        warn!("Could not load session {}: {}", session_id, e);
    }

    info!("Joined as {:?}", client.role());

    let (reconnect_sender, mut reconnect_receiver) = unbounded_channel();
    watch_events(client.events(), reconnect_sender.clone());

    let mut subscription = connect(&client, session_id, &reconnect_sender).await;
    let mut lines = BufReader::new(stdin()).lines();

    println!("{}", HELP.dimmed());

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        error!("Could not read input: {}", e);
                        break;
                    }
                };

                if line.trim().is_empty() {
                    continue;
                }

                match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(command) => handle_command(&client, session_id, command).await,
                    Err(message) => println!("{}", message.yellow()),
                }
            }
            Some(()) = reconnect_receiver.recv() => {
                drop(subscription.take());
                tokio::time::sleep(RECONNECT_DELAY).await;

                subscription = connect(&client, session_id, &reconnect_sender).await;

                // Events pushed while offline are only recovered by a reload
                if subscription.is_some() {
                    if let Err(e) = client.load_initial_state(session_id).await {
                        warn!("Could not reload session {}: {}", session_id, e);
                    }
                }
            }
        }
    }

    drop(subscription);
    client.close();
}

/// Subscribes to the session, scheduling another attempt if that fails
async fn connect(
    client: &Client,
    session_id: &str,
    retry: &UnboundedSender<()>,
) -> Option<Handle> {
    match client.subscribe(session_id).await {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Could not subscribe to session {}: {}", session_id, e);
            let _ = retry.send(());
            None
        }
    }
}

async fn handle_command(client: &Client, session_id: &str, command: Command) {
    let result = match command {
        Command::Say(text) => client.send_message(&text),
        Command::Request(song) => client.submit_request(&song),
        Command::Like(id) => client
            .like_request(&id)
            .await
            .map(|likes| info!("Liked {}, it now has {} likes", id, likes)),
        Command::Status(id, status) => {
            if !client.role().is_host() {
                println!("{}", "Only the DJ of this dancefloor can change requests".yellow());
                return;
            }

            client.request_status_change(&id, status).await.map(|_| ())
        }
        Command::Reload => client.load_initial_state(session_id).await.map(|_| ()),
        Command::Show => {
            println!("{}", render::render(&client.view()));
            Ok(())
        }
        Command::Help => {
            println!("{}", HELP);
            Ok(())
        }
        Command::Quit => Ok(()),
    };

    match result {
        Err(e) if e.is_local() => println!("{}", e.to_string().yellow()),
        Err(e) => println!("{}", e.to_string().red()),
        Ok(()) => {}
    }
}

/// Prints every view update, and asks for a reconnect when the channel drops
fn watch_events(events: EventReceiver, reconnect: UnboundedSender<()>) {
    thread::spawn(move || {
        while let Ok(event) = events.recv() {
            match event {
                SyncEvent::ViewUpdated(view) => println!("\n{}", render::render(&view)),
                SyncEvent::Disconnected { session_id, reason } => {
                    warn!(
                        "Lost connection to session {} ({}), reconnecting...",
                        session_id,
                        reason.as_deref().unwrap_or("no reason given")
                    );

                    if reconnect.send(()).is_err() {
                        break;
                    }
                }
                SyncEvent::Closed { session_id } => {
                    info!("Left session {}", session_id);
                    break;
                }
            }
        }
    });
}

fn main() {
    logging::init_logger();

    match Crowdwork::new() {
        Ok(crowdwork) => {
            info!("Initialized successfully.");
            crowdwork.run();
        }
        Err(error) => {
            error!("{} Read the error below to troubleshoot the issue.", "Crowdwork failed to start!".bold().red());
            error!("{}", error);
            error!("{}", format!("Hint: {}", error.hint()).dimmed().italic());
        }
    }
}
