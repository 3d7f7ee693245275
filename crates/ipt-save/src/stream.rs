use ipt_core::{SaveError, SaveParser, Tables};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Parse save output as it arrives on an async reader.
///
/// Lines are consumed one at a time, so a producer writing into a bounded
/// pipe is never left blocked on a full buffer. A read error ends the parse
/// immediately and wins over any parse errors already recorded.
pub async fn parse_stream<R>(reader: R) -> Result<Tables, SaveError>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut parser = SaveParser::new();

    while let Some(line) = lines.next_line().await? {
        parser.handle_line(&line);
    }

    Ok(parser.finish()?)
}
