//! Terminal presentation of watched boards

/// Clears the terminal and moves the cursor to the top left corner
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// One refresh of the watch view
pub fn watch_frame(session: &str, board: &str) -> String {
    let mut frame = String::with_capacity(CLEAR_SCREEN.len() + session.len() + board.len() + 2);
    frame.push_str(CLEAR_SCREEN);
    frame.push_str(session);
    frame.push('\n');
    frame.push_str(board);
    if !board.ends_with('\n') {
        frame.push('\n');
    }
    frame
}

/// Live cells on a rendered board
pub fn population(board: &str) -> usize {
    board.matches('*').count()
}
