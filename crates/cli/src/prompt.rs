use std::io::{self, BufRead, Write};

/// Asks a yes/no question on the terminal. Anything but `y`/`yes` is a no.
pub fn confirm(message: &str) -> bool {
    print!("{message} [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(_) => is_yes(&line),
        Err(_) => false,
    }
}

/// [`confirm`] on the blocking pool, so stdin reads never stall a runtime worker.
pub async fn confirm_off_runtime(message: String) -> bool {
    tokio::task::spawn_blocking(move || confirm(&message))
        .await
        .unwrap_or(false)
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
