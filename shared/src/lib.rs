//! Types shared by the session server and the terminal client: the framed
//! text protocol and the Game of Life engine that sessions run.

pub mod life;
pub mod protocol;

pub use life::{ConfigError, Life};
pub use protocol::{
    encode_frame, join_request, read_frame, split_request, write_frame, ANONYMOUS_USER,
    DEFAULT_PORT, FRAME_DELIMITER, MAX_FRAME_LEN,
};
