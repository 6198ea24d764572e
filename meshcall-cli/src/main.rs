use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use dialoguer::Input;
use meshcall_client::transport::opus_codec::pcm_from_s16le;
use meshcall_client::{
    CallState, CallStatus, ClientConfig, ClientHandle, LocalAudio, MeshClient, PeerState,
    RoomsClient, RtcConnectionFactory, opus_decoder_factory,
};
use meshcall_core::RoomId;
use meshcall_server::ServerConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "meshcall", about = "Mesh audio rooms for up to four people")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling server.
    Serve(ServeArgs),
    /// Join a room and print how the call evolves.
    Join(JoinArgs),
}

#[derive(Args)]
struct ServeArgs {
    #[command(flatten)]
    config: ServerConfig,
}

#[derive(Args)]
struct JoinArgs {
    /// Room code; a fresh one is requested from the server when omitted.
    room: Option<String>,

    /// Join a random public room with a free seat instead.
    #[arg(long, conflicts_with = "room")]
    quick: bool,

    /// Raw 48 kHz mono s16le PCM to send as the microphone.
    #[arg(long)]
    input: Option<PathBuf>,

    #[arg(long, env = "MESHCALL_SERVER", default_value = "ws://127.0.0.1:8080")]
    server: String,

    /// Display name; prompted for when omitted.
    #[arg(long)]
    name: Option<String>,

    /// Keep a newly created room out of quick-join.
    #[arg(long)]
    private: bool,

    #[arg(long, default_value_t = meshcall_client::speaking::DEFAULT_SPEAKING_THRESHOLD)]
    threshold: f32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Commands::Serve(args) => meshcall_server::serve(args.config).await,
        Commands::Join(args) => join(args).await,
    }
}

async fn join(args: JoinArgs) -> Result<()> {
    let name = match args.name {
        Some(name) => name,
        None => Input::<String>::new()
            .with_prompt("Display name")
            .default("guest".to_owned())
            .interact_text()
            .context("Failed to read display name")?,
    };
    let mut config = ClientConfig::new(args.server, RoomId::from(""), name);
    config.public = !args.private;
    config.speaking_threshold = args.threshold;
    config.room_id = pick_room(&config, args.room, args.quick).await?;

    println!("{} {}", "📞 Joining room".green().bold(), config.room_id.to_string().bold());
    debug!("Signaling endpoint {}", config.signaling_url()?);

    let local_audio = LocalAudio::new(format!("meshcall-{}", config.room_id));
    let factory = RtcConnectionFactory::new(local_audio).with_decoder(opus_decoder_factory());

    let microphone = match args.input {
        Some(path) => {
            let raw = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let audio = factory.local_audio().clone();
            Some(tokio::spawn(async move {
                if let Err(e) = audio.stream_pcm(pcm_from_s16le(&raw)).await {
                    warn!("Audio input stopped: {:?}", e);
                }
            }))
        }
        None => None,
    };

    let handle = MeshClient::connect(config, Arc::new(factory)).await?;
    println!("{}", "Type 'm' + enter to toggle mute, 'q' to leave.".dimmed());

    let mut state = handle.subscribe();
    let printer = tokio::spawn(async move {
        let mut last = state.borrow().clone();
        while state.changed().await.is_ok() {
            let next = state.borrow_and_update().clone();
            print_changes(&last, &next);
            last = next;
        }
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = read_commands(&handle) => {}
        _ = wait_disconnected(handle.subscribe()) => {}
    }
    println!("{}", "👋 Leaving...".yellow());
    if let Err(e) = handle.leave() {
        warn!("Session already over: {}", e);
    }

    let result = handle.join().await;
    printer.abort();
    if let Some(microphone) = microphone {
        microphone.abort();
    }
    result
}

/// Explicit code, else quick-join (with `--quick`), else a fresh room.
async fn pick_room(config: &ClientConfig, room: Option<String>, quick: bool) -> Result<RoomId> {
    if let Some(room) = room {
        return Ok(RoomId::from(room));
    }

    let rooms = RoomsClient::new(config)?;
    if quick {
        if let Some(room_id) = rooms.quick_join().await? {
            return Ok(room_id);
        }
        println!("{}", "No public room has a free seat, creating one".yellow());
    }
    rooms.create_room().await
}

/// Returns when the user asks to leave. A closed stdin just stops reading.
async fn read_commands(handle: &ClientHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        match line.trim() {
            "m" | "mute" => {
                let muted = !handle.state().muted;
                if handle.set_muted(muted).is_err() {
                    return;
                }
            }
            "q" | "quit" | "leave" => return,
            "" => {}
            other => println!("unknown command '{}'", other),
        }
    }
    std::future::pending::<()>().await
}

async fn wait_disconnected(mut state: tokio::sync::watch::Receiver<CallState>) {
    let _ = state.wait_for(|s| s.status == CallStatus::Disconnected).await;
}

fn print_changes(before: &CallState, after: &CallState) {
    if before.status != after.status {
        let status = format!("{:?}", after.status).to_lowercase();
        let status = match after.status {
            CallStatus::Connected => status.green(),
            CallStatus::Muted => status.yellow(),
            CallStatus::Disconnected => status.red(),
            _ => status.cyan(),
        };
        println!("{} {}", "status:".bold(), status);
    }

    for (id, peer) in &after.peers {
        let previous = before.peers.get(id).map(|p| p.state);
        if previous == Some(peer.state) {
            continue;
        }
        let label = match peer.state {
            PeerState::Connected => "connected".green(),
            PeerState::Closed => "left".red(),
            PeerState::Offering | PeerState::Answering => "negotiating".cyan(),
            PeerState::New => "new".normal(),
        };
        println!("   {} ({}) {}", peer.name.bold(), id, label);
    }

    for (slot_before, slot) in before.slots.iter().zip(&after.slots) {
        if slot.speaking && !slot_before.speaking {
            if let Some(occupant) = &slot.occupant {
                println!("   🔊 {} is speaking", occupant.name);
            }
        }
    }
}
