use std::collections::HashMap;
use std::sync::Arc;

use seriallink_frame::Message;
use seriallink_link::Link;

use crate::cmd::{connect, serve, RespondArgs};
use crate::exit::{link_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_message, OutputFormat};

/// Reply to `request`, or `None` to leave it unanswered.
fn answer(rules: &HashMap<String, String>, echo: bool, request: &Message) -> Option<String> {
    match rules.get(&request.command) {
        Some(reply) => Some(reply.clone()),
        None if echo => Some(request.command.clone()),
        None => None,
    }
}

pub async fn run(args: RespondArgs, format: OutputFormat) -> CliResult<i32> {
    let rules: HashMap<String, String> = args.rules.into_iter().collect();
    let connection = connect(&args.endpoint).await?;
    let endpoint = args.endpoint.to_string();
    let link = Arc::new(Link::new());
    let (_id, mut incoming) = link.register();
    let mut serving = serve(&link, connection);

    let outcome = loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                break signal.map_err(|err| {
                    CliError::new(INTERNAL, format!("signal handler setup failed: {err}"))
                });
            }
            joined = &mut serving => {
                return match joined {
                    Ok(Ok(())) => Ok(SUCCESS),
                    Ok(Err(err)) => Err(link_error("link failed", err)),
                    Err(err) => Err(CliError::new(INTERNAL, format!("link task failed: {err}"))),
                };
            }
            Some(message) = incoming.recv() => {
                if !message.is_request() {
                    continue;
                }
                print_message(&message, &endpoint, format);
                let Some(reply) = answer(&rules, args.echo, &message) else {
                    tracing::info!(id = message.id, command = %message.command, "no rule for request");
                    continue;
                };
                if let Err(err) = link.reply(&message, reply) {
                    break Err(link_error("reply failed", err));
                }
            }
        }
    };

    link.shutdown();
    let _ = serving.await;
    outcome.map(|()| SUCCESS)
}
