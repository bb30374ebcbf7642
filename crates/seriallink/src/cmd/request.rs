use std::sync::Arc;

use seriallink_link::{Link, LinkConfig};

use crate::cmd::{connect, serve, RequestArgs};
use crate::exit::{link_error, CliResult, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub async fn run(args: RequestArgs, format: OutputFormat) -> CliResult<i32> {
    let connection = connect(&args.endpoint).await?;
    let link = Arc::new(Link::with_config(LinkConfig {
        request_timeout: args.timeout,
        ..LinkConfig::default()
    }));
    let serving = serve(&link, connection);

    tracing::debug!(
        command = %args.command,
        timeout = ?link.config().request_timeout,
        "sending request"
    );
    let result = link.request(args.command.as_str()).await;

    link.shutdown();
    match serving.await {
        Ok(Err(err)) => tracing::warn!(error = %err, "link stopped with error"),
        Err(err) => tracing::warn!(error = %err, "link task failed"),
        Ok(Ok(())) => {}
    }

    let response = result.map_err(|err| link_error("request failed", err))?;
    print_message(&response, &args.endpoint.to_string(), format);
    Ok(SUCCESS)
}
