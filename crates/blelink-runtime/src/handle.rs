//! Cloneable async front-end to the link task

use blelink_core::{ConnectionState, DeviceRecord, PeripheralId, SessionConfig};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::channels::{Command, CommandSender};
use crate::error::{RuntimeError, RuntimeResult};

/// Sends [`Command`]s to a running [`LinkTask`](crate::LinkTask)
///
/// Every method returns once the command is queued; the outcome arrives as
/// [`AppEvent`](crate::AppEvent)s.
#[derive(Debug, Clone)]
pub struct LinkHandle {
    command_sender: CommandSender,
}

impl LinkHandle {
    pub fn new(command_sender: CommandSender) -> Self {
        Self { command_sender }
    }

    async fn send_command(&self, command: Command) -> RuntimeResult<()> {
        self.command_sender
            .send(command)
            .await
            .map_err(|_| RuntimeError::ChannelClosed)
    }

    pub async fn scan(&self) -> RuntimeResult<()> {
        self.send_command(Command::Scan).await
    }

    pub async fn stop_scan(&self) -> RuntimeResult<()> {
        self.send_command(Command::StopScan).await
    }

    pub async fn connect(
        &self,
        peripheral: PeripheralId,
        service_uuid: Uuid,
        output_uuid: Uuid,
        input_uuid: Uuid,
    ) -> RuntimeResult<()> {
        self.connect_session(SessionConfig::new(
            peripheral,
            service_uuid,
            output_uuid,
            input_uuid,
        ))
        .await
    }

    pub async fn connect_session(&self, session: SessionConfig) -> RuntimeResult<()> {
        self.send_command(Command::Connect { session }).await
    }

    /// Reconnect with the stored session; without one the task logs and
    /// ignores the request
    pub async fn reconnect(&self) -> RuntimeResult<()> {
        self.send_command(Command::Reconnect).await
    }

    pub async fn disconnect(&self) -> RuntimeResult<()> {
        self.send_command(Command::Disconnect).await
    }

    pub async fn send(&self, message: impl Into<Vec<u8>>) -> RuntimeResult<()> {
        self.send_command(Command::Send(message.into())).await
    }

    pub async fn state(&self) -> RuntimeResult<ConnectionState> {
        let (reply, rx) = oneshot::channel();
        self.send_command(Command::GetState { reply }).await?;
        rx.await
            .map_err(|_| RuntimeError::ReplyDropped { request: "state" })
    }

    pub async fn discovered_devices(&self) -> RuntimeResult<Vec<DeviceRecord>> {
        let (reply, rx) = oneshot::channel();
        self.send_command(Command::GetDevices { reply }).await?;
        rx.await
            .map_err(|_| RuntimeError::ReplyDropped { request: "devices" })
    }

    pub async fn shutdown(&self) -> RuntimeResult<()> {
        self.send_command(Command::Shutdown).await
    }

    /// Task has stopped and no further commands will be accepted
    pub fn is_closed(&self) -> bool {
        self.command_sender.is_closed()
    }
}
