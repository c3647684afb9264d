use std::io::{self, BufRead, Write};

use colored::Colorize;

use crate::adapters::http::session_service::HttpSessionService;
use crate::cli::commands::api_helpers;
use crate::cli::output;
use crate::config::app_config::AppConfig;
use crate::core::errors::{HsmError, Result};
use crate::core::traits::session::SessionService;

/// Execute the `hsmctl login` command.
pub fn execute_login(config: &AppConfig, username: &str, password: Option<&str>) -> Result<()> {
    let password = match password {
        Some(p) => p.to_string(),
        None => prompt_password()?,
    };
    if username.is_empty() || password.is_empty() {
        return Err(HsmError::ValidationError {
            detail: "Username and password are required".into(),
        });
    }

    let client = api_helpers::anonymous_client(config)?;
    let service = HttpSessionService::new(&client, api_helpers::session_store());

    let sp = output::spinner("Authenticating with the HSM...");
    let result = service.login(username, &password);
    output::clear_spinner(sp);
    let resp = result?;

    output::success(&resp.message);
    if let Some(expires) = &resp.session_expires {
        println!("  Session expires: {}", expires.cyan());
    }
    Ok(())
}

/// Execute the `hsmctl logout` command.
pub fn execute_logout(config: &AppConfig) -> Result<()> {
    let client = api_helpers::client(config)?;
    let service = HttpSessionService::new(&client, api_helpers::session_store());
    let resp = service.logout()?;
    output::success(&resp.message);
    Ok(())
}

/// Execute the `hsmctl whoami` command.
pub fn execute_whoami(config: &AppConfig) -> Result<()> {
    let client = api_helpers::authenticated_client(config)?;
    let service = HttpSessionService::new(&client, api_helpers::session_store());
    let user = service.current_user()?;

    output::header(&format!("Logged in as {}", user.username));
    println!("  Session: {}", user.session_id.dimmed());
    match user.expires_at() {
        Some(at) => {
            let remaining = at - chrono::Utc::now().naive_utc();
            let minutes = remaining.num_minutes().max(0);
            println!(
                "  Expires: {} UTC ({}h {}m left)",
                at.format("%Y-%m-%d %H:%M:%S"),
                minutes / 60,
                minutes % 60
            );
        }
        None => println!("  Expires: {}", user.expires),
    }
    Ok(())
}

fn prompt_password() -> Result<String> {
    print!("  Password: ");
    io::stdout().flush()?;
    let input = read_hidden_line()?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

/// Read one line with terminal echo turned off. Falls back to a plain read
/// when stdin is not a terminal.
#[cfg(unix)]
fn read_hidden_line() -> Result<String> {
    use libc::{ECHO, STDIN_FILENO, TCSANOW, tcgetattr, tcsetattr};
    use std::mem::MaybeUninit;

    struct EchoGuard {
        original: libc::termios,
    }

    impl Drop for EchoGuard {
        fn drop(&mut self) {
            // SAFETY: restores attributes read from the same descriptor.
            if unsafe { tcsetattr(STDIN_FILENO, TCSANOW, &self.original) } != 0 {
                tracing::warn!("failed to restore terminal echo after password prompt");
            }
        }
    }

    let mut termios = MaybeUninit::<libc::termios>::uninit();
    // SAFETY: tcgetattr initialises `termios` when it returns 0.
    if unsafe { tcgetattr(STDIN_FILENO, termios.as_mut_ptr()) } != 0 {
        return read_line();
    }
    // SAFETY: initialised by the successful tcgetattr above.
    let original = unsafe { termios.assume_init() };
    let mut hidden = original;
    hidden.c_lflag &= !ECHO;
    // SAFETY: `hidden` is a valid termios copied from the terminal.
    if unsafe { tcsetattr(STDIN_FILENO, TCSANOW, &hidden) } != 0 {
        return read_line();
    }

    let guard = EchoGuard { original };
    let input = read_line();
    drop(guard);
    // The newline was not echoed.
    println!();
    input
}

#[cfg(not(unix))]
fn read_hidden_line() -> Result<String> {
    read_line()
}

fn read_line() -> Result<String> {
    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input)
}
