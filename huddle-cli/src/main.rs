mod args;
mod input;

use anyhow::{Context, Result};
use args::CliArgs;
use clap::Parser;
use colored::*;
use dialoguer::Input as Prompt;
use huddle_client::{
    ClientConfig, ClientEvent, ClientHandle, HuddleClient, NegotiationState, SignalingConnection,
    SilentCapture, WebRtcTransportFactory,
};
use huddle_core::{ParticipantId, RoomId};
use input::{HELP, Input};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&args.log))
        .init();

    let room = match &args.room {
        Some(room) => room.clone(),
        None => Prompt::<String>::new()
            .with_prompt("Room")
            .interact_text()
            .context("Failed to read room name")?,
    };
    let participant_id = args
        .user
        .clone()
        .map(ParticipantId::from)
        .unwrap_or_else(ParticipantId::random);

    println!("{}", format!("📡 Connecting to {}...", args.server).cyan());
    let (outbound, inbound) = SignalingConnection::connect(&args.server).await?.split();

    let config = ClientConfig {
        participant_id: participant_id.clone(),
        transport: args.transport_config(),
        ..Default::default()
    };
    let (client, handle, events) = HuddleClient::new(
        config,
        Arc::new(SilentCapture),
        Arc::new(WebRtcTransportFactory),
        outbound,
    );
    let client_task = tokio::spawn(client.run(inbound));
    tokio::spawn(print_events(events));

    handle
        .join(RoomId::from(room.as_str()))
        .await
        .context("Failed to join")?;
    println!(
        "{}",
        format!("✨ Joined '{}' as {}. Type /help for commands.", room, participant_id)
            .green()
            .bold()
    );

    read_input(&handle).await?;

    let _ = handle.hangup().await;
    let _ = client_task.await;
    println!("{}", "👋 Bye".green());
    Ok(())
}

async fn read_input(handle: &ClientHandle) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let outcome = match Input::parse(&line) {
            Input::Empty => continue,
            Input::Quit => break,
            Input::Help => {
                println!("{HELP}");
                continue;
            }
            Input::Unknown(text) => {
                println!("{}", format!("Unknown command: {text}").yellow());
                continue;
            }
            Input::Chat(text) => handle
                .send_chat(text.clone())
                .await
                .map(|n| format!("{} {} ({} delivered)", "You:".bold(), text, n)),
            Input::Mic => handle
                .toggle_mic()
                .await
                .map(|on| format!("🎙  microphone {}", on_off(on))),
            Input::Camera => handle
                .toggle_camera()
                .await
                .map(|on| format!("📷 camera {}", on_off(on))),
            Input::Screen => handle
                .toggle_screen_share()
                .await
                .map(|on| format!("🖥  screen share {}", on_off(on))),
            Input::Pixelate => handle
                .toggle_pixelation()
                .await
                .map(|s| format!("pixelation {}", on_off(s.pixelation))),
            Input::Glitch => handle
                .toggle_glitch()
                .await
                .map(|s| format!("glitch {}", on_off(s.glitch))),
            Input::Level(level) => handle
                .set_pixelation_level(level)
                .await
                .map(|level| format!("pixelation level {level}")),
            Input::Peers => handle.peers().await.map(|peers| {
                if peers.is_empty() {
                    return "nobody else here".to_owned();
                }
                peers
                    .iter()
                    .map(|p| format!("  {} {:?} {}", p.peer_id, p.role, p.state))
                    .collect::<Vec<_>>()
                    .join("\n")
            }),
        };

        match outcome {
            Ok(text) => println!("{text}"),
            Err(e) => println!("{}", format!("❌ {e}").red()),
        }
    }
    Ok(())
}

async fn print_events(mut events: mpsc::UnboundedReceiver<ClientEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            ClientEvent::PeerState { peer_id, state } => match state {
                NegotiationState::Connected => {
                    println!("{}", format!("🔗 {peer_id} connected").green())
                }
                NegotiationState::Closed => println!("{}", format!("{peer_id} left").dimmed()),
                _ => {}
            },
            ClientEvent::RemoteMediaAttached { peer_id, track_id } => {
                println!("{}", format!("📺 receiving {track_id} from {peer_id}").cyan())
            }
            ClientEvent::Chat { from, text } => println!("{} {}", format!("{from}:").bold(), text),
            ClientEvent::Left => {
                println!("{}", "Left the room".dimmed());
                break;
            }
            _ => {}
        }
    }
}

fn on_off(on: bool) -> ColoredString {
    if on { "on".green() } else { "off".red() }
}
