use std::sync::Arc;

use seriallink_link::Link;

use crate::cmd::{connect, serve, ListenArgs};
use crate::exit::{link_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub async fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let connection = connect(&args.endpoint).await?;
    let endpoint = args.endpoint.to_string();
    let link = Arc::new(Link::new());
    let (_id, mut incoming) = link.register();
    let mut serving = serve(&link, connection);

    let mut printed = 0usize;
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
                if args.kind.is_some_and(|kind| !kind.matches(message.kind)) {
                    continue;
                }
                print_message(&message, &endpoint, format);
                printed = printed.saturating_add(1);
                if args.count.is_some_and(|count| printed >= count) {
                    break Ok(());
                }
            }
        }
    };

    link.shutdown();
    let _ = serving.await;
    outcome.map(|()| SUCCESS)
}
