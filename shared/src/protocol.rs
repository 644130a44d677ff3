//! Wire protocol shared by the server and the terminal client
//!
//! Every request and every response is one UTF-8 text frame terminated by a
//! single NUL byte. Requests are a command name followed by space separated
//! arguments, with no quoting or escaping.

use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const FRAME_DELIMITER: u8 = b'\0';
pub const DEFAULT_PORT: u16 = 8088;
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Identity of a connection that has not logged in
pub const ANONYMOUS_USER: &str = "none";

pub const CMD_REGISTER: &str = "register";
pub const CMD_LOGIN: &str = "login";
pub const CMD_ADD: &str = "add";
pub const CMD_START: &str = "start";
pub const CMD_RESUME: &str = "resume";
pub const CMD_STOP: &str = "stop";
pub const CMD_KILL: &str = "kill";
pub const CMD_WATCH: &str = "watch";
pub const CMD_LIST: &str = "list";

/// Splits a request line into its command name and arguments
pub fn split_request(line: &str) -> (&str, Vec<&str>) {
    let mut tokens = line.split(' ');
    let command = tokens.next().unwrap_or_default();
    (command, tokens.collect())
}

pub fn join_request(command: &str, args: &[&str]) -> String {
    let mut request = String::from(command);
    for arg in args {
        request.push(' ');
        request.push_str(arg);
    }
    request
}

pub fn encode_frame(text: &str) -> Vec<u8> {
    let mut frame = Vec::with_capacity(text.len() + 1);
    frame.extend_from_slice(text.as_bytes());
    frame.push(FRAME_DELIMITER);
    frame
}

/// Reads the next frame, without its terminating NUL
///
/// Returns `Ok(None)` once the peer has closed the stream, including when it
/// closes in the middle of a frame.
pub async fn read_frame<R>(reader: &mut R) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buffer = Vec::new();
    let limit = (MAX_FRAME_LEN + 1) as u64;
    let read = reader.take(limit).read_until(FRAME_DELIMITER, &mut buffer).await?;

    if read == 0 || buffer.last() != Some(&FRAME_DELIMITER) {
        if buffer.len() > MAX_FRAME_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("frame exceeds {} bytes", MAX_FRAME_LEN),
            ));
        }
        return Ok(None);
    }

    buffer.pop();
    String::from_utf8(buffer)
        .map(Some)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

pub async fn write_frame<W>(writer: &mut W, text: &str) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&encode_frame(text)).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[test]
    fn test_split_request() {
        assert_eq!(split_request("start s1 pulsar"), ("start", vec!["s1", "pulsar"]));
        assert_eq!(split_request("list"), ("list", vec![]));
        assert_eq!(split_request(""), ("", vec![]));
        // single-space splitting keeps empty tokens
        assert_eq!(split_request("add  x"), ("add", vec!["", "x"]));
    }

    #[test]
    fn test_join_request() {
        assert_eq!(join_request(CMD_START, &["s1", "pulsar"]), "start s1 pulsar");
        assert_eq!(join_request(CMD_LIST, &[]), "list");
    }

    #[test]
    fn test_encode_frame_appends_single_nul() {
        assert_eq!(encode_frame("list"), b"list\0".to_vec());
        assert_eq!(encode_frame(""), vec![0u8]);
    }

    #[tokio::test]
    async fn test_read_consecutive_frames() {
        let mock = tokio_test::io::Builder::new()
            .read(b"login alice se")
            .read(b"cret\0list\0")
            .build();
        let mut reader = BufReader::new(mock);

        assert_eq!(
            read_frame(&mut reader).await.unwrap(),
            Some("login alice secret".to_string())
        );
        assert_eq!(read_frame(&mut reader).await.unwrap(), Some("list".to_string()));
        assert_eq!(read_frame(&mut reader).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unterminated_frame_is_eof() {
        let mock = tokio_test::io::Builder::new().read(b"list").build();
        let mut reader = BufReader::new(mock);
        assert_eq!(read_frame(&mut reader).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_rejected() {
        let mock = tokio_test::io::Builder::new().read(&[0xff, 0xfe, 0]).build();
        let mut reader = BufReader::new(mock);
        let err = read_frame(&mut reader).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_oversized_frame_is_rejected() {
        let payload = vec![b'a'; MAX_FRAME_LEN + 10];
        let mut reader = BufReader::new(&payload[..]);
        let err = read_frame(&mut reader).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_frame_at_limit_is_accepted() {
        let mut payload = vec![b'a'; MAX_FRAME_LEN];
        payload.push(FRAME_DELIMITER);
        let mut reader = BufReader::new(&payload[..]);
        let frame = read_frame(&mut reader).await.unwrap().unwrap();
        assert_eq!(frame.len(), MAX_FRAME_LEN);
    }

    #[tokio::test]
    async fn test_write_frame() {
        let mock = tokio_test::io::Builder::new().write(b"registered user bob\0").build();
        let mut writer = mock;
        write_frame(&mut writer, "registered user bob").await.unwrap();
    }
}
