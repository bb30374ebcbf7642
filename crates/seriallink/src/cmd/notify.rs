use seriallink_frame::{LineWriter, Message};
use seriallink_transport::LinkTransport;

use crate::cmd::{connect, NotifyArgs};
use crate::exit::{frame_error, CliResult, SUCCESS};

/// Writes the line directly; a link would abandon it on immediate shutdown.
pub async fn run(args: NotifyArgs) -> CliResult<i32> {
    let connection = connect(&args.endpoint).await?;
    let (_read, write) = connection.into_split();

    let mut writer = LineWriter::new(write);
    writer
        .send(Message::notification(args.command))
        .await
        .map_err(|err| frame_error("notify failed", err))?;

    tracing::debug!(endpoint = %args.endpoint, "notification sent");
    Ok(SUCCESS)
}
