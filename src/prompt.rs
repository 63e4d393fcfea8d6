//! Interactive command-line front end.
//!
//! Asks for the game type, event key and API key, prints the report, and
//! gives up after three failed attempts.

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tracing::warn;

use crate::opr::WeightingPolicy;
use crate::pipeline::{OprCalculator, OprRequest};
use crate::providers::Provider;

pub const MAX_ATTEMPTS: usize = 3;

/// Run the prompt loop. Returns `true` once a report has been printed.
pub async fn run<R, W>(
    calculator: &OprCalculator,
    weighting: WeightingPolicy,
    input: R,
    mut out: W,
) -> Result<bool>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(input).lines();
    let mut failures = 0;

    while failures < MAX_ATTEMPTS {
        let Some(answer) = ask(&mut lines, &mut out, "Calculating for FRC or FTC: ").await? else {
            return Ok(false);
        };

        let provider = match Provider::from_game_type(&answer) {
            Ok(p) => p,
            Err(_) => {
                say(&mut out, "Please make sure you specify which game your are checking.").await?;
                failures += 1;
                continue;
            }
        };

        let Some(event_key) = ask(&mut lines, &mut out, "Enter the Event Key: ").await? else {
            return Ok(false);
        };
        let Some(api_key) = ask(&mut lines, &mut out, "Enter the API Key: ").await? else {
            return Ok(false);
        };

        let req = OprRequest {
            provider,
            event_key,
            api_key: Some(api_key),
            weighting,
        };
        match calculator.calculate(&req).await {
            Ok(ratings) => {
                say(&mut out, &ratings.report()).await?;
                return Ok(true);
            }
            Err(e) => {
                warn!("OPR calculation failed: {:#}", e);
                say(&mut out, &format!("An unexpected error occurred: {:#}", e)).await?;
                failures += 1;
            }
        }
    }

    say(&mut out, "Wrong for too many times, exiting ...").await?;
    Ok(false)
}

/// Print a prompt and read one trimmed line; `None` at end of input.
async fn ask<R, W>(lines: &mut Lines<BufReader<R>>, out: &mut W, prompt: &str) -> Result<Option<String>>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    out.write_all(prompt.as_bytes()).await?;
    out.flush().await?;
    Ok(lines.next_line().await?.map(|l| l.trim().to_string()))
}

async fn say<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> Result<()> {
    out.write_all(text.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await?;
    Ok(())
}
