//! Command handlers for the blelink CLI

use std::io::Write;

use blelink_ble::BtleplugAdapter;
use blelink_core::{ConnectionState, DeviceRecord, LinkConfig, SessionConfig, WriteKind};
use blelink_runtime::{AppEvent, LinkHandle, LinkRuntime, LinkRuntimeBuilder, RuntimeLink};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cli::Commands;
use crate::config::{AppConfig, SessionSection};
use crate::error::{CliError, Result};
use crate::prompt::{self, PromptCommand};

/// Command dispatcher for handling CLI commands
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Execute a CLI command
    pub async fn execute(command: Commands, config: AppConfig) -> Result<()> {
        match command {
            Commands::Config => {
                println!("{}", AppConfig::example_config());
                Ok(())
            }
            Commands::State => {
                let runtime = Self::start(&config, config.link_config()).await?;
                let state = runtime.handle.state().await?;
                println!("Radio state: {}", state);
                Self::stop(runtime.handle, runtime.join).await
            }
            Commands::Scan { timeout } => {
                let mut link = config.link_config();
                if let Some(secs) = timeout.filter(|s| *s > 0) {
                    link = link.with_scan_timeout(std::time::Duration::from_secs(secs));
                }
                let runtime = Self::start(&config, link).await?;
                Self::handle_scan(runtime).await
            }
            Commands::Connect {
                peripheral,
                service,
                output,
                input,
                without_response,
            } => {
                let overrides = SessionSection {
                    peripheral,
                    service,
                    output,
                    input,
                };
                let session = config
                    .session_config(&overrides)?
                    .ok_or(CliError::MissingSession)?;

                let mut link = config.link_config();
                if without_response {
                    link = link.with_write_kind(WriteKind::WithoutResponse);
                }
                let runtime = Self::start(&config, link).await?;
                Self::handle_connect(runtime, session, &config.cli.prompt).await
            }
        }
    }

    /// Open the Bluetooth adapter and spawn the link task
    async fn start(config: &AppConfig, link: LinkConfig) -> Result<LinkRuntime<BtleplugAdapter>> {
        let (adapter, adapter_events) = BtleplugAdapter::open(config.ble_config()?).await?;
        Ok(LinkRuntimeBuilder::new()
            .with_link_config(link)
            .spawn(adapter, adapter_events))
    }

    async fn stop(
        handle: LinkHandle,
        join: JoinHandle<RuntimeLink<BtleplugAdapter>>,
    ) -> Result<()> {
        handle.shutdown().await?;
        match join.await {
            // Waits for the final disconnect to reach the radio
            Ok(link) => link.into_adapter().close().await,
            Err(e) => warn!("Link task ended abnormally: {}", e),
        }
        Ok(())
    }

    /// Handle the scan command
    async fn handle_scan(runtime: LinkRuntime<BtleplugAdapter>) -> Result<()> {
        let LinkRuntime {
            handle,
            mut app_events,
            join,
        } = runtime;

        handle.scan().await?;
        let mut printed = 0;

        loop {
            tokio::select! {
                event = app_events.recv() => match event {
                    Some(AppEvent::DevicesChanged(devices)) => {
                        for device in devices.iter().skip(printed) {
                            print_device(device);
                        }
                        printed = devices.len();
                    }
                    Some(AppEvent::StateChanged(ConnectionState::Scanning)) => {
                        println!("Scanning... press Ctrl+C to stop");
                    }
                    Some(AppEvent::StateChanged(state)) => {
                        println!("Scan ended: {} ({} peripherals)", state, printed);
                        break;
                    }
                    Some(AppEvent::MessageReceived(_)) => {}
                    None => break,
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("Stopping scan");
                    handle.stop_scan().await?;
                }
            }
        }

        Self::stop(handle, join).await
    }

    /// Handle the connect command with an interactive prompt
    async fn handle_connect(
        runtime: LinkRuntime<BtleplugAdapter>,
        session: SessionConfig,
        prompt_text: &str,
    ) -> Result<()> {
        let LinkRuntime {
            handle,
            mut app_events,
            join,
        } = runtime;

        println!(
            "Connecting to {} (service {}, output {}, input {})",
            session.peripheral, session.service_uuid, session.output_uuid, session.input_uuid
        );
        handle.connect_session(session).await?;

        let mut state = handle.state().await?;
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        show_prompt(prompt_text);

        loop {
            tokio::select! {
                event = app_events.recv() => match event {
                    Some(AppEvent::StateChanged(next)) => {
                        state = next;
                        println!("\n[state] {}", state);
                        if state.is_ready() {
                            println!("Ready. Type 'help' for commands.");
                        } else if let Some(failure) = state.failure() {
                            println!("{}; 'reconnect' to try again", failure);
                        }
                        show_prompt(prompt_text);
                    }
                    Some(AppEvent::MessageReceived(message)) => {
                        println!("\n<- {}", prompt::format_message(&message));
                        show_prompt(prompt_text);
                    }
                    Some(AppEvent::DevicesChanged(_)) => {}
                    None => break,
                },
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        debug!("stdin closed");
                        break;
                    };
                    match prompt::parse_line(&line) {
                        Ok(Some(PromptCommand::Quit)) => break,
                        Ok(Some(command)) => {
                            Self::run_prompt_command(&handle, command, state).await?;
                        }
                        Ok(None) => {}
                        Err(e) => println!("{}", e),
                    }
                    show_prompt(prompt_text);
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }

        Self::stop(handle, join).await
    }

    async fn run_prompt_command(
        handle: &LinkHandle,
        command: PromptCommand,
        state: ConnectionState,
    ) -> Result<()> {
        match command {
            PromptCommand::Send(bytes) | PromptCommand::Hex(bytes) => {
                if !state.is_ready() {
                    println!("Not ready ({}); message dropped", state);
                    return Ok(());
                }
                println!("-> {}", hex::encode(&bytes));
                handle.send(bytes).await?;
            }
            PromptCommand::Reconnect => handle.reconnect().await?,
            PromptCommand::Disconnect => handle.disconnect().await?,
            PromptCommand::State => println!("{}", handle.state().await?),
            PromptCommand::Help => println!("{}", prompt::HELP),
            PromptCommand::Quit => {}
        }
        Ok(())
    }
}

fn print_device(device: &DeviceRecord) {
    let rssi = device
        .advertisement
        .rssi
        .map(|r| format!("{} dBm", r))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "  {:<40} {:>8}  {}",
        device.id,
        rssi,
        device.name().unwrap_or("(unnamed)")
    );
}

fn show_prompt(prompt_text: &str) {
    print!("{}", prompt_text);
    let _ = std::io::stdout().flush();
}
